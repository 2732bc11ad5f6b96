//! Sequencing of the animation: loading, title, then one reveal per period.
//!
//! ```text
//! Loading -> MainTitle -> NextPeriod -> Playing --timer--> NextPeriod ...
//!                                  \-> Idle (feed exhausted, absorbing)
//! ```
//!
//! `MainTitle` and `NextPeriod` are transient: their entry work runs on the
//! first update after they are entered, then the machine settles in
//! `Playing` (or `Idle`).

use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::{
    assets::manifest_names,
    behavior::{random_curve, random_on_circle, AlphaDeath, Breathe, CurveTo, Decay, Fade, FadeOut},
    config::AppConfig,
    easing::Easing,
    entity::{Entity, EntityId, Signal},
    feed::{DataFeed, DataPoint},
    loader::{LoadRequest, LoadTicket, Loader},
    mapping::{LaunchPlan, Tally},
    render::{Point, Sprite, Visual},
    scene::Layer,
    timeline::TimerQueue,
    world::World,
    CodeFreqError, Result,
};

const PLUS_TINT: u32 = 0xb5d79d;
const MINUS_TINT: u32 = 0xff9a00;
const PLUS_RADIUS: f64 = 10.0;
const MINUS_RADIUS: f64 = 100.0;
const ARRIVAL_FADE_MS: f64 = 100.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Loading,
    MainTitle,
    NextPeriod,
    Playing,
    Idle,
}

#[derive(Debug)]
enum LoadState {
    NotStarted,
    Waiting(LoadTicket),
    Loaded,
    Failed,
}

#[derive(Debug, Clone, Copy)]
struct Gauge {
    band: Point,
    bar: EntityId,
    label: EntityId,
}

#[derive(Debug, Clone, Copy)]
struct Hud {
    plus: Gauge,
    minus: Gauge,
}

/// Session state driven by the frame scheduler.
pub struct PhaseMachine {
    phase: Phase,
    load: LoadState,
    loader: Box<dyn Loader>,
    feed: DataFeed,
    tally: Tally,
    hud: Option<Hud>,
    rockets: Vec<(EntityId, Layer)>,
    periods_revealed: usize,
    config: AppConfig,
    rng: StdRng,
}

impl PhaseMachine {
    pub fn new(config: AppConfig, loader: Box<dyn Loader>) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            phase: Phase::Loading,
            load: LoadState::NotStarted,
            loader,
            feed: DataFeed::default(),
            tally: Tally::default(),
            hud: None,
            rockets: Vec::new(),
            periods_revealed: 0,
            config,
            rng,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn tally(&self) -> Tally {
        self.tally
    }

    /// Periods still waiting in the feed.
    pub fn remaining(&self) -> usize {
        self.feed.len()
    }

    pub fn periods_revealed(&self) -> usize {
        self.periods_revealed
    }

    pub fn has_failed(&self) -> bool {
        matches!(self.load, LoadState::Failed)
    }

    /// Applies a transition request. `Idle` absorbs every request.
    pub fn handle(&mut self, signal: Signal) {
        match signal {
            Signal::Enter(next) if self.phase != Phase::Idle => {
                if next != self.phase {
                    debug!(from = ?self.phase, to = ?next, "phase transition");
                }
                self.phase = next;
            }
            Signal::Enter(next) => debug!(?next, "sequence is idle, ignoring transition"),
        }
    }

    /// Runs the work of the current phase for this frame.
    pub fn update(&mut self, world: &mut World, timers: &mut TimerQueue) -> Result<()> {
        if self.config.trails.enabled {
            self.emit_trails(world)?;
        }

        match self.phase {
            Phase::Loading => self.poll_load(world),
            Phase::MainTitle => {
                self.show_title(world)?;
                self.phase = Phase::Playing;
                Ok(())
            }
            Phase::NextPeriod => self.next_period(world, timers),
            Phase::Playing | Phase::Idle => Ok(()),
        }
    }

    fn poll_load(&mut self, world: &mut World) -> Result<()> {
        if matches!(self.load, LoadState::NotStarted) {
            info!("loading code frequency data and textures");
            let ticket = self.loader.begin(LoadRequest {
                textures: manifest_names(),
            });
            self.load = LoadState::Waiting(ticket);
        }

        let LoadState::Waiting(ticket) = &mut self.load else {
            return Ok(());
        };
        let Some(outcome) = ticket.poll() else {
            return Ok(());
        };

        let content = outcome.and_then(|content| {
            content
                .assets
                .ensure(&manifest_names())
                .map_err(|err| CodeFreqError::load(err.to_string()))?;
            Ok(content)
        });
        match content {
            Ok(content) => {
                world.install_assets(content.assets);
                self.feed = DataFeed::new(content.feed);
                self.tally = Tally::new(self.feed.total_churn());
                self.load = LoadState::Loaded;
                self.phase = Phase::MainTitle;
                info!(periods = self.feed.len(), total = self.tally.total, "content loaded");
                Ok(())
            }
            Err(err) => {
                self.load = LoadState::Failed;
                error!(%err, "loading failed, animation stalled");
                Err(err)
            }
        }
    }

    fn show_title(&mut self, world: &mut World) -> Result<()> {
        let center = world.layout().center;

        let background = world.texture_sprite("background")?.with_alpha(0.6);
        world.place(Layer::Background, background);

        let planet = world
            .texture_sprite("planet")?
            .anchored(0.5, 0.5)
            .at(center.x, center.y)
            .with_alpha(0.0);
        world.spawn(
            Layer::Planet,
            planet,
            [
                FadeOut::new(Easing::OutCubic, 3000.0).into(),
                Breathe::new(0.05, 0.022).into(),
            ],
        );

        let title = world
            .texture_sprite("title2")?
            .anchored(0.5, 0.0)
            .at(center.x, center.y + 50.0)
            .with_alpha(0.0);
        let subtitle_y = title.position.y + title.height() + 5.0;
        world.spawn(
            Layer::Planet,
            title,
            [FadeOut::new(Easing::OutCubic, 3300.0)
                .on_complete(|entity| debug!(entity = %entity.id(), "title revealed"))
                .into()],
        );

        // The subtitle is the only thing allowed to start the first period.
        let subtitle = world
            .texture_sprite("githubsmall")?
            .anchored(0.5, 0.0)
            .at(center.x, subtitle_y)
            .with_alpha(0.0);
        world.spawn(
            Layer::Planet,
            subtitle,
            [FadeOut::new(Easing::OutCubic, 3600.0)
                .on_complete(|entity| entity.emit(Signal::Enter(Phase::NextPeriod)))
                .into()],
        );

        self.show_hud(world)
    }

    fn show_hud(&mut self, world: &mut World) -> Result<()> {
        let layout = *world.layout();
        let width = self.config.launch.gauge_width;

        let plus = self.spawn_gauge(
            world,
            layout.plus_band,
            ("plusband", "plus", 40.0),
            PLUS_TINT,
            self.tally.plus_gauge(width),
            self.tally.plus_label(),
        )?;
        let minus = self.spawn_gauge(
            world,
            layout.minus_band,
            ("minusband", "minus", 42.0),
            MINUS_TINT,
            self.tally.minus_gauge(width),
            self.tally.minus_label(),
        )?;
        self.hud = Some(Hud { plus, minus });
        Ok(())
    }

    fn spawn_gauge(
        &self,
        world: &mut World,
        band: Point,
        (band_texture, icon_texture, icon_offset): (&str, &str, f64),
        tint: u32,
        gauge: f64,
        label: String,
    ) -> Result<Gauge> {
        let track = world
            .texture_sprite(band_texture)?
            .anchored(0.0, 0.5)
            .at(band.x, band.y)
            .with_alpha(0.25);
        world.place(Layer::Planet, track);

        let icon = world
            .texture_sprite(icon_texture)?
            .anchored(0.0, 0.5)
            .at(band.x - icon_offset, band.y);
        world.place(Layer::Planet, icon);

        let bar = Sprite::new(Visual::Rect {
            width: 1.0,
            height: 20.0,
            color: tint,
        })
        .at(band.x, band.y - 10.0)
        .scaled(gauge, 1.0);
        let bar = world.place(Layer::Planet, bar);

        let position = world.layout().label_position(band, gauge);
        let label = Sprite::new(Visual::text(label, 20.0, tint)).at(position.x, position.y);
        let label = world.place(Layer::Planet, label);

        Ok(Gauge { band, bar, label })
    }

    fn refresh_hud(&self, world: &mut World) {
        let Some(hud) = self.hud else {
            return;
        };
        let width = self.config.launch.gauge_width;
        let layout = *world.layout();
        for (gauge, value, text) in [
            (hud.plus, self.tally.plus_gauge(width), self.tally.plus_label()),
            (hud.minus, self.tally.minus_gauge(width), self.tally.minus_label()),
        ] {
            if let Some(bar) = world.get_mut(gauge.bar) {
                bar.sprite.scale.x = value;
            }
            if let Some(label) = world.get_mut(gauge.label) {
                if let Visual::Text { text: current, .. } = &mut label.sprite.visual {
                    *current = text;
                }
                label.sprite.position = layout.label_position(gauge.band, value);
            }
        }
    }

    fn next_period(&mut self, world: &mut World, timers: &mut TimerQueue) -> Result<()> {
        world.clear_layer(Layer::PlusTrails);
        world.clear_layer(Layer::MinusTrails);
        self.rockets.clear();

        let Some(point) = self.feed.pop() else {
            info!(
                periods = self.periods_revealed,
                "code frequency sequence exhausted"
            );
            self.phase = Phase::Idle;
            return Ok(());
        };

        self.tally.record(&point);
        self.refresh_hud(world);

        let launch = &self.config.launch;
        let plan = LaunchPlan::for_point(&point, launch.density(), launch.window_ms);
        debug!(
            timestamp = point.timestamp,
            plus = plan.plus,
            minus = plan.minus,
            "launching period"
        );
        timers.schedule(launch.period_delay_ms, Signal::Enter(Phase::NextPeriod));

        self.launch_plus(world, &plan)?;
        self.launch_minus(world, &plan)?;
        let date = self.show_date(world, &point)?;

        self.periods_revealed += 1;
        info!(
            %date,
            plus_sum = self.tally.plus_sum,
            minus_sum = self.tally.minus_sum,
            remaining = self.feed.len(),
            "period revealed"
        );
        self.phase = Phase::Playing;
        Ok(())
    }

    /// Additions converge on the planet from the spawn circle.
    fn launch_plus(&mut self, world: &mut World, plan: &LaunchPlan) -> Result<()> {
        let center = world.layout().center;
        let launch = &self.config.launch;
        for i in 0..plan.plus {
            let from = random_on_circle(&mut self.rng, center, launch.spawn_radius);
            let flight = launch.base_flight_ms + plan.stagger(i, plan.plus);
            let sprite = world
                .texture_sprite("plus")?
                .anchored(0.5, 0.5)
                .at(from.x, from.y);
            let curve = CurveTo::new(Easing::Linear, flight, PLUS_RADIUS, center)
                .with_curve(random_curve(&mut self.rng))
                .on_complete(fade_on_arrival);
            let id = world.spawn(Layer::Plus, sprite, [curve.into(), AlphaDeath::new().into()]);
            self.rockets.push((id, Layer::Plus));
        }
        Ok(())
    }

    /// Deletions fly out of the planet, fading on the way.
    fn launch_minus(&mut self, world: &mut World, plan: &LaunchPlan) -> Result<()> {
        let center = world.layout().center;
        let launch = &self.config.launch;
        for i in 0..plan.minus {
            let to = random_on_circle(&mut self.rng, center, launch.spawn_radius);
            let flight = launch.base_flight_ms + plan.stagger(i, plan.minus);
            let sprite = world
                .texture_sprite("minus")?
                .anchored(0.5, 0.5)
                .at(center.x, center.y);
            let curve = CurveTo::new(Easing::InCubic, flight, MINUS_RADIUS, to)
                .with_curve(random_curve(&mut self.rng))
                .on_complete(fade_on_arrival);
            let id = world.spawn(
                Layer::Minus,
                sprite,
                [
                    curve.into(),
                    Fade::new(Easing::Linear, flight).into(),
                    AlphaDeath::new().into(),
                ],
            );
            self.rockets.push((id, Layer::Minus));
        }
        Ok(())
    }

    fn show_date(&self, world: &mut World, point: &DataPoint) -> Result<String> {
        let date = point.date_label()?;
        let at = world.layout().date_label;
        let sprite = Sprite::new(Visual::text(date.clone(), 25.0, 0xffffff))
            .anchored(0.5, 0.5)
            .at(at.x, at.y);
        world.spawn(
            Layer::Planet,
            sprite,
            [
                Fade::new(Easing::InCubic, self.config.launch.date_fade_ms).into(),
                AlphaDeath::new().into(),
            ],
        );
        Ok(date)
    }

    /// Leaves a decaying copy of every live particle behind.
    fn emit_trails(&mut self, world: &mut World) -> Result<()> {
        self.rockets.retain(|(id, _)| world.get(*id).is_some());

        let trails = &self.config.trails;
        let mut pending = Vec::with_capacity(self.rockets.len());
        for (id, layer) in &self.rockets {
            let Some(rocket) = world.get(*id) else {
                continue;
            };
            let Some(trail_layer) = layer.trail_layer() else {
                continue;
            };
            let (texture, scale_y) = match layer {
                Layer::Plus => ("plus", 0.2),
                _ => ("minus", 0.1),
            };
            let sprite = world
                .texture_sprite(texture)?
                .anchored(rocket.sprite.anchor.x, rocket.sprite.anchor.y)
                .at(rocket.sprite.position.x, rocket.sprite.position.y)
                .scaled(0.2, scale_y)
                .with_rotation(rocket.sprite.rotation)
                .with_alpha(trails.alpha);
            pending.push((trail_layer, sprite));
        }

        for (layer, sprite) in pending {
            world.spawn(
                layer,
                sprite,
                [Decay::new(trails.decay).into(), AlphaDeath::new().into()],
            );
        }
        Ok(())
    }
}

fn fade_on_arrival(entity: &mut Entity) {
    entity.attach_behavior(Fade::new(Easing::Linear, ARRIVAL_FADE_MS));
}

impl std::fmt::Debug for PhaseMachine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseMachine")
            .field("phase", &self.phase)
            .field("load", &self.load)
            .field("remaining", &self.feed.len())
            .field("tally", &self.tally)
            .field("rockets", &self.rockets.len())
            .finish()
    }
}
