//! Renderable entities and their per-frame behavior pass.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{behavior::Behavior, phase::Phase, render::Container, render::Sprite};

/// Stable entity identifier, allocated in spawn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Request raised from inside a behavior for the session to act on after the
/// entity pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Enter(Phase),
}

/// A sprite plus the behaviors that animate it.
pub struct Entity {
    id: EntityId,
    pub sprite: Sprite,
    behaviors: Vec<Behavior>,
    parent: Option<Container>,
    disposed: bool,
    signals: Vec<Signal>,
}

impl Entity {
    pub fn new(id: EntityId, sprite: Sprite) -> Self {
        Self {
            id,
            sprite,
            behaviors: Vec::new(),
            parent: None,
            disposed: false,
            signals: Vec::new(),
        }
    }

    pub fn id(&self) -> EntityId {
        self.id
    }

    pub fn behaviors(&self) -> &[Behavior] {
        &self.behaviors
    }

    /// Queues a behavior. It first runs on the next [`Entity::update`], even
    /// when attached from inside a running behavior.
    pub fn attach_behavior(&mut self, behavior: impl Into<Behavior>) {
        self.behaviors.push(behavior.into());
    }

    pub fn with_behavior(mut self, behavior: impl Into<Behavior>) -> Self {
        self.attach_behavior(behavior);
        self
    }

    pub fn attach_to(&mut self, container: &Container) {
        if let Some(previous) = self.parent.take() {
            previous.remove_child(self.id);
        }
        container.add_child(self.id);
        self.parent = Some(container.clone());
    }

    pub fn parent(&self) -> Option<&Container> {
        self.parent.as_ref()
    }

    /// Runs every attached behavior once, in attachment order, and drops the
    /// ones that report completion.
    ///
    /// The pass stops as soon as a behavior disposes the entity. Behaviors
    /// that had not stepped yet are dropped with it.
    pub fn update(&mut self, dt: f64) {
        let current = std::mem::take(&mut self.behaviors);
        let mut running = Vec::with_capacity(current.len());
        for mut behavior in current {
            if self.disposed {
                break;
            }
            if !behavior.step(self, dt) {
                running.push(behavior);
            }
        }
        // Whatever sits in `self.behaviors` now was attached during the pass.
        let attached = std::mem::replace(&mut self.behaviors, running);
        self.behaviors.extend(attached);
    }

    /// Detaches the entity from its container. Only the first call has any
    /// effect; it returns `true` when it did the detaching.
    pub fn dispose(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.disposed = true;
        if let Some(parent) = self.parent.take() {
            parent.remove_child(self.id);
        }
        true
    }

    /// Disposes an entity its container has already let go of, without
    /// touching the container again.
    pub(crate) fn release(&mut self) {
        self.disposed = true;
        self.parent = None;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn emit(&mut self, signal: Signal) {
        self.signals.push(signal);
    }

    pub fn drain_signals(&mut self) -> impl Iterator<Item = Signal> + '_ {
        self.signals.drain(..)
    }
}

impl fmt::Debug for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Entity")
            .field("id", &self.id)
            .field("sprite", &self.sprite)
            .field("behaviors", &self.behaviors)
            .field("disposed", &self.disposed)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, rc::Rc};

    use super::*;
    use crate::{
        behavior::{AlphaDeath, Behavior, BehaviorKind},
        render::Visual,
    };

    fn entity() -> Entity {
        Entity::new(EntityId(1), Sprite::new(Visual::text("x", 10.0, 0xffffff)))
    }

    #[test]
    fn dispose_detaches_exactly_once() {
        let container = Container::new("planet");
        let mut entity = entity();
        entity.attach_to(&container);
        assert_eq!(container.len(), 1);

        assert!(entity.dispose());
        assert!(container.is_empty());
        assert!(entity.parent().is_none());

        container.add_child(EntityId(1));
        assert!(!entity.dispose());
        assert_eq!(container.len(), 1, "second dispose must not touch the parent");
        assert!(entity.is_disposed());
    }

    #[test]
    fn behaviors_attached_mid_pass_wait_for_next_update() {
        let runs = Rc::new(Cell::new(0));
        let counter = runs.clone();
        let mut entity = entity().with_behavior(Behavior::from_fn(move |entity, _| {
            let counter = counter.clone();
            entity.attach_behavior(Behavior::from_fn(move |_, _| {
                counter.set(counter.get() + 1);
                false
            }));
            true
        }));

        entity.update(16.0);
        assert_eq!(runs.get(), 0);
        assert_eq!(entity.behaviors().len(), 1);

        entity.update(16.0);
        assert_eq!(runs.get(), 1);
    }

    #[test]
    fn completed_behaviors_are_removed_and_order_is_kept() {
        let mut entity = entity()
            .with_behavior(Behavior::from_fn(|_, _| false))
            .with_behavior(Behavior::from_fn(|_, _| true))
            .with_behavior(AlphaDeath::new());

        entity.update(16.0);

        let kinds: Vec<_> = entity.behaviors().iter().map(Behavior::kind).collect();
        assert_eq!(kinds, vec![BehaviorKind::Custom, BehaviorKind::AlphaDeath]);
    }

    #[test]
    fn disposal_ends_the_pass() {
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();
        let mut entity = entity()
            .with_behavior(AlphaDeath::new())
            .with_behavior(Behavior::from_fn(move |entity, _| {
                flag.set(true);
                entity.emit(Signal::Enter(Phase::NextPeriod));
                false
            }));
        entity.sprite.alpha = 0.0;

        entity.update(16.0);

        assert!(entity.is_disposed());
        assert!(!ran.get());
        assert_eq!(entity.drain_signals().count(), 0);
        assert!(entity.behaviors().is_empty());
    }

    #[test]
    fn signals_are_drained_once() {
        let mut entity = entity();
        entity.emit(Signal::Enter(Phase::NextPeriod));
        assert_eq!(
            entity.drain_signals().collect::<Vec<_>>(),
            vec![Signal::Enter(Phase::NextPeriod)]
        );
        assert_eq!(entity.drain_signals().count(), 0);
    }
}
