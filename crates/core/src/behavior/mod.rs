//! Per-frame behaviors attached to entities.
//!
//! A behavior is stepped once per frame with the owning entity and the frame's
//! delta time in milliseconds. It returns `true` on the single frame it
//! completes, after which the entity drops it. Timers start counting on the
//! first step, not at construction.

use std::{f64::consts::PI, fmt};

use rand::Rng;

use crate::{
    easing::Easing,
    entity::Entity,
    render::{Point, Rect},
};

/// Completion hook run on the frame a behavior finishes.
pub struct Callback(Box<dyn FnMut(&mut Entity)>);

impl Callback {
    pub fn new(f: impl FnMut(&mut Entity) + 'static) -> Self {
        Self(Box::new(f))
    }

    fn call(&mut self, entity: &mut Entity) {
        (self.0)(entity)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Callback")
    }
}

fn fire(callback: &mut Option<Callback>, entity: &mut Entity) {
    if let Some(callback) = callback {
        callback.call(entity);
    }
}

/// Raises alpha towards 1 and completes once it gets there.
#[derive(Debug)]
pub struct FadeOut {
    easing: Easing,
    duration: f64,
    elapsed: f64,
    from: Option<f64>,
    on_complete: Option<Callback>,
}

impl FadeOut {
    pub fn new(easing: Easing, duration: f64) -> Self {
        Self {
            easing,
            duration,
            elapsed: 0.0,
            from: None,
            on_complete: None,
        }
    }

    pub fn on_complete(mut self, f: impl FnMut(&mut Entity) + 'static) -> Self {
        self.on_complete = Some(Callback::new(f));
        self
    }

    fn step(&mut self, entity: &mut Entity, dt: f64) -> bool {
        let from = *self.from.get_or_insert(entity.sprite.alpha.clamp(0.0, 1.0));
        self.elapsed += dt;
        let alpha = self
            .easing
            .apply(self.elapsed, from, 1.0 - from, self.duration);
        if alpha >= 1.0 {
            entity.sprite.alpha = 1.0;
            fire(&mut self.on_complete, entity);
            true
        } else {
            entity.sprite.alpha = alpha;
            false
        }
    }
}

/// Lowers alpha towards 0 and completes once it gets there.
#[derive(Debug)]
pub struct Fade {
    easing: Easing,
    duration: f64,
    elapsed: f64,
    from: Option<f64>,
}

impl Fade {
    pub fn new(easing: Easing, duration: f64) -> Self {
        Self {
            easing,
            duration,
            elapsed: 0.0,
            from: None,
        }
    }

    fn step(&mut self, entity: &mut Entity, dt: f64) -> bool {
        if entity.sprite.alpha <= 0.0 {
            return true;
        }
        let from = *self.from.get_or_insert(entity.sprite.alpha.min(1.0));
        self.elapsed += dt;
        let alpha = self.easing.apply(self.elapsed, from, -from, self.duration);
        if alpha <= 0.0 {
            entity.sprite.alpha = 0.0;
            true
        } else {
            entity.sprite.alpha = alpha;
            false
        }
    }
}

/// Flies the entity to `target` on a slowly bending spiral.
///
/// The first step only measures the starting distance. Every later step
/// re-aims at the target from the current position, offset by `curve`
/// radians, and places the entity at the eased remaining distance. Completes
/// once that distance is within `radius`.
#[derive(Debug)]
pub struct CurveTo {
    easing: Easing,
    duration: f64,
    radius: f64,
    target: Point,
    curve: f64,
    elapsed: Option<f64>,
    distance: f64,
    on_complete: Option<Callback>,
}

impl CurveTo {
    pub fn new(easing: Easing, duration: f64, radius: f64, target: Point) -> Self {
        Self {
            easing,
            duration,
            radius,
            target,
            curve: 0.0,
            elapsed: None,
            distance: 0.0,
            on_complete: None,
        }
    }

    pub fn with_curve(mut self, curve: f64) -> Self {
        self.curve = curve;
        self
    }

    pub fn on_complete(mut self, f: impl FnMut(&mut Entity) + 'static) -> Self {
        self.on_complete = Some(Callback::new(f));
        self
    }

    pub fn target(&self) -> Point {
        self.target
    }

    /// Flight time in milliseconds.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    fn step(&mut self, entity: &mut Entity, dt: f64) -> bool {
        let position = entity.sprite.position;
        let heading =
            (self.target.y - position.y).atan2(self.target.x - position.x) + self.curve;

        let Some(elapsed) = self.elapsed else {
            self.distance = position.distance_to(self.target);
            self.elapsed = Some(0.0);
            return false;
        };

        let elapsed = elapsed + dt;
        self.elapsed = Some(elapsed);
        let remaining = self.distance * (1.0 - self.easing.progress(elapsed, self.duration));
        if remaining > self.radius {
            entity.sprite.rotation = heading;
            entity.sprite.position = Point::new(
                self.target.x - remaining * heading.cos(),
                self.target.y - remaining * heading.sin(),
            );
            false
        } else {
            fire(&mut self.on_complete, entity);
            true
        }
    }
}

/// Random spiral bend in `(-0.01, 0.01)` radians per frame, either direction.
pub fn random_curve<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    let direction = if rng.gen::<f64>() > 0.5 { 1.0 } else { -1.0 };
    rng.gen::<f64>() * 5.0 / 500.0 * direction
}

/// Random point on a circle of `radius` around `center`.
pub fn random_on_circle<R: Rng + ?Sized>(rng: &mut R, center: Point, radius: f64) -> Point {
    let angle = (rng.gen::<f64>() + 0.01) * 2.0 * PI;
    Point::new(
        center.x + angle.cos() * radius,
        center.y + angle.sin() * radius,
    )
}

/// Pulses the scale around the value it had on the first step. Never
/// completes; pair it with something that disposes the entity.
#[derive(Debug)]
pub struct Breathe {
    amplitude: f64,
    speed: f64,
    base: Option<Point>,
    angle: f64,
}

impl Breathe {
    pub fn new(amplitude: f64, speed: f64) -> Self {
        Self {
            amplitude,
            speed,
            base: None,
            angle: 0.0,
        }
    }

    fn step(&mut self, entity: &mut Entity, _dt: f64) -> bool {
        match self.base {
            None => self.base = Some(entity.sprite.scale),
            Some(base) => {
                self.angle += self.speed;
                let swing = self.angle.cos() * self.amplitude;
                entity.sprite.scale = Point::new(base.x + swing, base.y + swing);
            }
        }
        false
    }
}

/// Disposes the entity once it is fully transparent.
#[derive(Debug, Default)]
pub struct AlphaDeath {
    on_complete: Option<Callback>,
}

impl AlphaDeath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_complete(mut self, f: impl FnMut(&mut Entity) + 'static) -> Self {
        self.on_complete = Some(Callback::new(f));
        self
    }

    fn step(&mut self, entity: &mut Entity, _dt: f64) -> bool {
        if entity.sprite.alpha > 0.0 {
            return false;
        }
        entity.dispose();
        fire(&mut self.on_complete, entity);
        true
    }
}

/// Disposes the entity once its box stops touching `bounds`.
#[derive(Debug)]
pub struct KillOffScreen {
    bounds: Rect,
    on_complete: Option<Callback>,
}

impl KillOffScreen {
    pub fn new(bounds: Rect) -> Self {
        Self {
            bounds,
            on_complete: None,
        }
    }

    pub fn on_complete(mut self, f: impl FnMut(&mut Entity) + 'static) -> Self {
        self.on_complete = Some(Callback::new(f));
        self
    }

    fn step(&mut self, entity: &mut Entity, _dt: f64) -> bool {
        if entity.sprite.bounds().intersects(&self.bounds) {
            return false;
        }
        fire(&mut self.on_complete, entity);
        entity.dispose();
        true
    }
}

/// Eases a uniform scale from `min` up to `max`, then stops.
#[derive(Debug)]
pub struct Grow {
    easing: Easing,
    duration: f64,
    min: f64,
    max: f64,
    elapsed: f64,
}

impl Grow {
    pub fn new(easing: Easing, duration: f64, min: f64, max: f64) -> Self {
        Self {
            easing,
            duration,
            min,
            max,
            elapsed: 0.0,
        }
    }

    fn step(&mut self, entity: &mut Entity, dt: f64) -> bool {
        self.elapsed += dt;
        let scale = self
            .easing
            .apply(self.elapsed, self.min, self.max - self.min, self.duration);
        let done = scale >= self.max;
        let scale = if done { self.max } else { scale };
        entity.sprite.scale = Point::new(scale, scale);
        done
    }
}

/// Frame-rate bound alpha decay used by particle trails.
#[derive(Debug)]
pub struct Decay {
    per_frame: f64,
}

impl Decay {
    pub fn new(per_frame: f64) -> Self {
        Self { per_frame }
    }

    fn step(&mut self, entity: &mut Entity, _dt: f64) -> bool {
        entity.sprite.alpha -= self.per_frame;
        if entity.sprite.alpha <= 0.0 {
            entity.sprite.alpha = 0.0;
            true
        } else {
            false
        }
    }
}

/// Discriminant of a [`Behavior`], for inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorKind {
    FadeOut,
    Fade,
    CurveTo,
    Breathe,
    AlphaDeath,
    KillOffScreen,
    Grow,
    Decay,
    Custom,
}

/// A unit of per-frame logic owned by exactly one entity.
pub enum Behavior {
    FadeOut(FadeOut),
    Fade(Fade),
    CurveTo(CurveTo),
    Breathe(Breathe),
    AlphaDeath(AlphaDeath),
    KillOffScreen(KillOffScreen),
    Grow(Grow),
    Decay(Decay),
    Custom(Box<dyn FnMut(&mut Entity, f64) -> bool>),
}

impl Behavior {
    pub fn from_fn(f: impl FnMut(&mut Entity, f64) -> bool + 'static) -> Self {
        Behavior::Custom(Box::new(f))
    }

    /// Advances the behavior by `dt` milliseconds. Returns `true` on the frame
    /// it completes.
    pub fn step(&mut self, entity: &mut Entity, dt: f64) -> bool {
        match self {
            Behavior::FadeOut(b) => b.step(entity, dt),
            Behavior::Fade(b) => b.step(entity, dt),
            Behavior::CurveTo(b) => b.step(entity, dt),
            Behavior::Breathe(b) => b.step(entity, dt),
            Behavior::AlphaDeath(b) => b.step(entity, dt),
            Behavior::KillOffScreen(b) => b.step(entity, dt),
            Behavior::Grow(b) => b.step(entity, dt),
            Behavior::Decay(b) => b.step(entity, dt),
            Behavior::Custom(f) => f(entity, dt),
        }
    }

    pub fn kind(&self) -> BehaviorKind {
        match self {
            Behavior::FadeOut(_) => BehaviorKind::FadeOut,
            Behavior::Fade(_) => BehaviorKind::Fade,
            Behavior::CurveTo(_) => BehaviorKind::CurveTo,
            Behavior::Breathe(_) => BehaviorKind::Breathe,
            Behavior::AlphaDeath(_) => BehaviorKind::AlphaDeath,
            Behavior::KillOffScreen(_) => BehaviorKind::KillOffScreen,
            Behavior::Grow(_) => BehaviorKind::Grow,
            Behavior::Decay(_) => BehaviorKind::Decay,
            Behavior::Custom(_) => BehaviorKind::Custom,
        }
    }
}

impl fmt::Debug for Behavior {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Behavior::FadeOut(b) => b.fmt(f),
            Behavior::Fade(b) => b.fmt(f),
            Behavior::CurveTo(b) => b.fmt(f),
            Behavior::Breathe(b) => b.fmt(f),
            Behavior::AlphaDeath(b) => b.fmt(f),
            Behavior::KillOffScreen(b) => b.fmt(f),
            Behavior::Grow(b) => b.fmt(f),
            Behavior::Decay(b) => b.fmt(f),
            Behavior::Custom(_) => f.write_str("Custom"),
        }
    }
}

macro_rules! impl_from_behavior {
    ($($kind:ident),* $(,)?) => {
        $(
            impl From<$kind> for Behavior {
                fn from(behavior: $kind) -> Self {
                    Behavior::$kind(behavior)
                }
            }
        )*
    };
}

impl_from_behavior!(FadeOut, Fade, CurveTo, Breathe, AlphaDeath, KillOffScreen, Grow, Decay);
