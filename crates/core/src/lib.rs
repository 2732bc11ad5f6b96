//! Core library for the code frequency animation.
//!
//! A repository's weekly additions and deletions are replayed as waves of
//! particles. Lightweight [`Entity`] wrappers around sprites carry
//! [`Behavior`]s that are stepped once per frame by the [`FrameScheduler`],
//! while the [`PhaseMachine`] sequences loading, the title and one reveal per
//! [`DataPoint`]. Drawing, asset decoding and data fetching stay behind the
//! [`Renderer`] and [`Loader`] seams.

pub mod assets;
pub mod behavior;
pub mod config;
pub mod easing;
pub mod entity;
pub mod error;
pub mod feed;
pub mod loader;
pub mod mapping;
pub mod phase;
pub mod render;
pub mod scene;
pub mod scheduler;
pub mod timeline;
pub mod world;

pub use assets::{AssetStore, Texture};
pub use behavior::{
    AlphaDeath, Behavior, BehaviorKind, Breathe, CurveTo, Decay, Fade, FadeOut, Grow,
    KillOffScreen,
};
pub use config::{AppConfig, LaunchConfig, StageConfig, TrailConfig};
pub use easing::Easing;
pub use entity::{Entity, EntityId, Signal};
pub use error::{CodeFreqError, Result};
pub use feed::{parse_feed, DataFeed, DataPoint};
pub use loader::{Completer, Content, LoadRequest, LoadTicket, Loader, StaticLoader};
pub use mapping::{LaunchPlan, Tally};
pub use phase::{Phase, PhaseMachine};
pub use render::{Container, DrawCall, Point, RecordingRenderer, Rect, Renderer, Sprite, Stage, Visual};
pub use scene::{Layer, SceneLayout};
pub use scheduler::{FrameScheduler, FrameSource, SimulatedFrames};
pub use timeline::{FrameClock, TimerQueue};
pub use world::World;
