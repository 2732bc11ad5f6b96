//! The per-frame loop.
//!
//! Each tick runs, in order: entity behaviors, due timers, the phase machine,
//! then the renderer. Nothing in a tick overlaps with the next one.

use crate::{
    config::AppConfig,
    loader::Loader,
    phase::{Phase, PhaseMachine},
    render::Renderer,
    scene::{Layer, SceneLayout},
    timeline::{FrameClock, TimerQueue},
    world::World,
    Result,
};

/// Host side of the animation-frame request: yields the timestamp (ms) of
/// the next frame, or `None` once the host stops asking for frames.
pub trait FrameSource {
    fn next_frame(&mut self) -> Option<f64>;
}

/// Fixed-step frames that do not wait for a wall clock.
#[derive(Debug, Clone)]
pub struct SimulatedFrames {
    step_ms: f64,
    next: f64,
    remaining: Option<u64>,
}

impl SimulatedFrames {
    pub fn new(fps: f64) -> Self {
        Self {
            step_ms: 1000.0 / fps,
            next: 0.0,
            remaining: None,
        }
    }

    pub fn limit(mut self, frames: u64) -> Self {
        self.remaining = Some(frames);
        self
    }
}

impl FrameSource for SimulatedFrames {
    fn next_frame(&mut self) -> Option<f64> {
        if let Some(remaining) = &mut self.remaining {
            if *remaining == 0 {
                return None;
            }
            *remaining -= 1;
        }
        let timestamp = self.next;
        self.next += self.step_ms;
        Some(timestamp)
    }
}

/// Owns the session and advances it one frame at a time.
#[derive(Debug)]
pub struct FrameScheduler<R> {
    clock: FrameClock,
    world: World,
    machine: PhaseMachine,
    timers: TimerQueue,
    renderer: R,
    frames: u64,
}

impl<R: Renderer> FrameScheduler<R> {
    pub fn new(config: AppConfig, loader: Box<dyn Loader>, renderer: R) -> Self {
        let layout = SceneLayout::new(config.stage.width, config.stage.height);
        Self {
            clock: FrameClock::new(),
            world: World::new(layout),
            machine: PhaseMachine::new(config, loader),
            timers: TimerQueue::new(),
            renderer,
            frames: 0,
        }
    }

    /// Runs one frame at host time `timestamp` (ms).
    ///
    /// A load failure is returned once, on the frame it is noticed; the
    /// session then stays in [`Phase::Loading`].
    pub fn tick(&mut self, timestamp: f64) -> Result<()> {
        let dt = self.clock.advance(timestamp);

        let mut signals = self.world.update(dt);
        signals.extend(self.timers.advance(dt));
        for signal in signals {
            self.machine.handle(signal);
        }

        self.machine.update(&mut self.world, &mut self.timers)?;
        self.renderer.render(&self.world)?;
        self.frames += 1;
        Ok(())
    }

    /// Ticks until the source runs dry or a tick fails.
    pub fn run<S: FrameSource + ?Sized>(&mut self, source: &mut S) -> Result<()> {
        while let Some(timestamp) = source.next_frame() {
            self.tick(timestamp)?;
        }
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    pub fn machine(&self) -> &PhaseMachine {
        &self.machine
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Session time in milliseconds.
    pub fn elapsed(&self) -> f64 {
        self.clock.elapsed()
    }

    /// True once the feed is exhausted and the last particles are gone.
    pub fn sequence_finished(&self) -> bool {
        self.phase() == Phase::Idle
            && self.world.count_in(Layer::Plus) == 0
            && self.world.count_in(Layer::Minus) == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        assets::AssetStore,
        feed::DataPoint,
        loader::{Content, LoadRequest, LoadTicket, StaticLoader},
        render::RecordingRenderer,
        CodeFreqError,
    };

    fn scheduler(feed: Vec<DataPoint>, trails: bool) -> FrameScheduler<RecordingRenderer> {
        let mut config = AppConfig {
            seed: Some(1),
            ..AppConfig::default()
        };
        config.trails.enabled = trails;
        let loader = StaticLoader::new(Content {
            feed,
            assets: AssetStore::builtin(),
        });
        FrameScheduler::new(config, Box::new(loader), RecordingRenderer::new())
    }

    fn feed() -> Vec<DataPoint> {
        vec![
            DataPoint::new(1_488_672_000, 1200, -600),
            DataPoint::new(1_489_276_800, 400, -100),
        ]
    }

    #[test]
    fn simulated_frames_step_and_stop() {
        let mut frames = SimulatedFrames::new(50.0).limit(3);
        assert_eq!(frames.next_frame(), Some(0.0));
        assert_eq!(frames.next_frame(), Some(20.0));
        assert_eq!(frames.next_frame(), Some(40.0));
        assert_eq!(frames.next_frame(), None);
    }

    #[test]
    fn first_tick_loads_and_renders() {
        let mut scheduler = scheduler(feed(), false);
        scheduler.tick(98_765.0).unwrap();

        assert_eq!(scheduler.phase(), Phase::MainTitle);
        assert_eq!(scheduler.elapsed(), 0.0);
        assert_eq!(scheduler.renderer().frames(), 1);

        scheduler.tick(98_781.0).unwrap();
        assert_eq!(scheduler.phase(), Phase::Playing);
        assert!(scheduler.renderer().count_in(Layer::Planet) > 0);
    }

    #[test]
    fn runs_the_whole_sequence() {
        let mut scheduler = scheduler(feed(), true);
        let mut frames = SimulatedFrames::new(60.0).limit(60 * 20);
        scheduler.run(&mut frames).unwrap();

        assert_eq!(scheduler.phase(), Phase::Idle);
        assert!(scheduler.sequence_finished());
        assert_eq!(scheduler.machine().periods_revealed(), 2);
        let tally = scheduler.machine().tally();
        assert_eq!((tally.plus_sum, tally.minus_sum), (1600, 700));
        assert_eq!(scheduler.frames(), 60 * 20);
    }

    #[test]
    fn particles_are_visible_mid_period() {
        let mut scheduler = scheduler(feed(), false);
        let mut frames = SimulatedFrames::new(60.0).limit(60 * 4 + 30);
        scheduler.run(&mut frames).unwrap();

        assert_eq!(scheduler.machine().periods_revealed(), 1);
        assert_eq!(scheduler.renderer().count_in(Layer::Plus), 6);
        assert_eq!(scheduler.renderer().count_in(Layer::Minus), 3);
    }

    struct Offline;

    impl Loader for Offline {
        fn begin(&mut self, _request: LoadRequest) -> LoadTicket {
            LoadTicket::ready(Err(CodeFreqError::load("network unreachable")))
        }
    }

    #[test]
    fn load_failure_stops_the_run_and_stalls() {
        let mut scheduler =
            FrameScheduler::new(AppConfig::default(), Box::new(Offline), RecordingRenderer::new());
        let mut frames = SimulatedFrames::new(60.0).limit(10);

        let err = scheduler.run(&mut frames).unwrap_err();
        assert!(format!("{err}").contains("network unreachable"));
        assert_eq!(scheduler.frames(), 0);

        scheduler.tick(1000.0).unwrap();
        assert_eq!(scheduler.phase(), Phase::Loading);
        assert!(scheduler.world().is_empty());
    }
}
