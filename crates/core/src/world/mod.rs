//! The live entity collection and the stage they are drawn on.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::{
    assets::AssetStore,
    behavior::Behavior,
    entity::{Entity, EntityId, Signal},
    render::{Sprite, Stage},
    scene::{Layer, SceneLayout},
    Result,
};

#[derive(Debug)]
pub struct World {
    stage: Stage,
    layout: SceneLayout,
    assets: AssetStore,
    entities: IndexMap<EntityId, Entity>,
    next_id: u64,
}

impl World {
    pub fn new(layout: SceneLayout) -> Self {
        Self {
            stage: Stage::new(),
            layout,
            assets: AssetStore::new(),
            entities: IndexMap::new(),
            next_id: 0,
        }
    }

    pub fn install_assets(&mut self, assets: AssetStore) {
        self.assets = assets;
    }

    pub fn assets(&self) -> &AssetStore {
        &self.assets
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn layout(&self) -> &SceneLayout {
        &self.layout
    }

    /// Fresh sprite showing the named texture.
    pub fn texture_sprite(&self, name: &str) -> Result<Sprite> {
        Ok(Sprite::new(self.assets.texture(name)?.visual()))
    }

    /// Adds an entity to `layer`. Its behaviors first run on the next frame.
    pub fn spawn(
        &mut self,
        layer: Layer,
        sprite: Sprite,
        behaviors: impl IntoIterator<Item = Behavior>,
    ) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;

        let mut entity = Entity::new(id, sprite);
        for behavior in behaviors {
            entity.attach_behavior(behavior);
        }
        entity.attach_to(self.stage.layer(layer));
        self.entities.insert(id, entity);
        id
    }

    /// Adds a static entity with no behaviors.
    pub fn place(&mut self, layer: Layer, sprite: Sprite) -> EntityId {
        self.spawn(layer, sprite, std::iter::empty())
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn count_in(&self, layer: Layer) -> usize {
        self.stage.layer(layer).len()
    }

    /// Updates every live entity in spawn order, then drops the disposed
    /// ones. Returns the signals raised along the way.
    ///
    /// An entity whose sprite ends up with non-finite numbers is disposed on
    /// the spot and the pass carries on.
    pub fn update(&mut self, dt: f64) -> Vec<Signal> {
        let mut signals = Vec::new();
        for entity in self.entities.values_mut() {
            if entity.is_disposed() {
                continue;
            }
            entity.update(dt);
            if !entity.sprite.is_finite() {
                tracing::warn!(entity = %entity.id(), sprite = ?entity.sprite, "behavior produced a non-finite sprite, disposing entity");
                entity.dispose();
            }
            signals.extend(entity.drain_signals());
        }
        self.entities.retain(|_, entity| !entity.is_disposed());
        signals
    }

    /// Disposes everything in `layer` and returns how many entities went.
    pub fn clear_layer(&mut self, layer: Layer) -> usize {
        let cleared: HashSet<EntityId> = self
            .stage
            .layer(layer)
            .remove_children()
            .into_iter()
            .collect();
        for id in &cleared {
            if let Some(entity) = self.entities.get_mut(id) {
                entity.release();
            }
        }
        self.entities.retain(|id, _| !cleared.contains(id));
        cleared.len()
    }

    /// Entities in draw order: layer by layer, children in insertion order.
    pub fn draw_list(&self) -> impl Iterator<Item = (Layer, &Entity)> + '_ {
        self.stage.layers().flat_map(move |(layer, container)| {
            container
                .children()
                .into_iter()
                .filter_map(move |id| self.entities.get(&id).map(|entity| (layer, entity)))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        behavior::{AlphaDeath, Fade},
        easing::Easing,
        phase::Phase,
        render::{Point, Visual},
    };

    fn world() -> World {
        let mut world = World::new(SceneLayout::new(1024.0, 600.0));
        world.install_assets(AssetStore::builtin());
        world
    }

    #[test]
    fn spawn_attaches_to_the_layer() {
        let mut world = world();
        let sprite = world.texture_sprite("plus").unwrap();
        let id = world.spawn(Layer::Plus, sprite, [AlphaDeath::new().into()]);

        assert_eq!(world.count_in(Layer::Plus), 1);
        assert_eq!(world.get(id).unwrap().behaviors().len(), 1);
        assert!(world.texture_sprite("unknown").is_err());
    }

    #[test]
    fn disposed_entities_leave_the_world() {
        let mut world = world();
        let sprite = world.texture_sprite("plus").unwrap().with_alpha(1.0);
        world.spawn(
            Layer::Plus,
            sprite,
            [
                Fade::new(Easing::Linear, 100.0).into(),
                AlphaDeath::new().into(),
            ],
        );

        world.update(50.0);
        assert_eq!(world.len(), 1);
        world.update(50.0);
        assert!(world.is_empty());
        assert_eq!(world.count_in(Layer::Plus), 0);
    }

    #[test]
    fn corrupt_entities_are_isolated() {
        let mut world = world();
        let healthy = world.spawn(
            Layer::Planet,
            Sprite::new(Visual::text("ok", 10.0, 0)),
            [Behavior::from_fn(|entity, dt| {
                entity.sprite.position.x += dt;
                false
            })],
        );
        world.spawn(
            Layer::Planet,
            Sprite::new(Visual::text("bad", 10.0, 0)),
            [Behavior::from_fn(|entity, _| {
                entity.sprite.position = Point::new(f64::NAN, 0.0);
                false
            })],
        );

        world.update(16.0);
        assert_eq!(world.len(), 1);
        assert_eq!(world.get(healthy).unwrap().sprite.position.x, 16.0);
    }

    #[test]
    fn signals_are_collected_from_all_entities() {
        let mut world = world();
        world.spawn(
            Layer::Planet,
            Sprite::new(Visual::text("title", 10.0, 0)),
            [Behavior::from_fn(|entity, _| {
                entity.emit(Signal::Enter(Phase::NextPeriod));
                true
            })],
        );

        assert_eq!(world.update(16.0), vec![Signal::Enter(Phase::NextPeriod)]);
        assert!(world.update(16.0).is_empty());
    }

    #[test]
    fn draw_list_follows_layer_order() {
        let mut world = world();
        let top = world.place(Layer::Planet, Sprite::new(Visual::text("a", 1.0, 0)));
        let bottom = world.place(Layer::Background, Sprite::new(Visual::text("b", 1.0, 0)));

        let order: Vec<_> = world.draw_list().map(|(_, entity)| entity.id()).collect();
        assert_eq!(order, vec![bottom, top]);

        assert_eq!(world.clear_layer(Layer::Planet), 1);
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn clearing_a_busy_layer_keeps_the_rest() {
        let mut world = world();
        let first = world.place(Layer::Plus, Sprite::new(Visual::text("p", 1.0, 0)));
        for _ in 0..50_000 {
            world.place(Layer::PlusTrails, Sprite::new(Visual::text("t", 1.0, 0)));
        }
        let last = world.place(Layer::Plus, Sprite::new(Visual::text("q", 1.0, 0)));

        assert_eq!(world.clear_layer(Layer::PlusTrails), 50_000);
        assert_eq!(world.count_in(Layer::PlusTrails), 0);
        let order: Vec<_> = world.entities().map(Entity::id).collect();
        assert_eq!(order, vec![first, last]);
        assert_eq!(world.count_in(Layer::Plus), 2);

        assert_eq!(world.clear_layer(Layer::PlusTrails), 0);
    }
}
