//! Scene-graph primitives shared by the engine and rendering backends.
//!
//! The engine never draws anything itself. It keeps sprites in draw-ordered
//! containers and hands the whole world to a [`Renderer`] once per frame.

use std::{cell::RefCell, fmt, rc::Rc};

use serde::{Deserialize, Serialize};

use crate::{entity::EntityId, scene::Layer, world::World, Result};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance_to(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Axis-aligned rectangle in stage pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Touching edges count as an intersection.
    pub fn intersects(&self, other: &Rect) -> bool {
        !(self.right() < other.x
            || self.bottom() < other.y
            || self.x > other.right()
            || self.y > other.bottom())
    }
}

/// What a sprite shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Visual {
    Texture {
        name: String,
        width: f64,
        height: f64,
    },
    Text {
        text: String,
        size: f64,
        tint: u32,
    },
    Rect {
        width: f64,
        height: f64,
        color: u32,
    },
}

impl Visual {
    pub fn text(text: impl Into<String>, size: f64, tint: u32) -> Self {
        Visual::Text {
            text: text.into(),
            size,
            tint,
        }
    }

    /// Unscaled size in pixels. Text is measured with a fixed half-em advance,
    /// close enough for layout of the bitmap font the HUD uses.
    pub fn size(&self) -> (f64, f64) {
        match self {
            Visual::Texture { width, height, .. } | Visual::Rect { width, height, .. } => {
                (*width, *height)
            }
            Visual::Text { text, size, .. } => (text.chars().count() as f64 * size * 0.5, *size),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Visual::Texture { name, .. } => name,
            Visual::Text { text, .. } => text,
            Visual::Rect { .. } => "rect",
        }
    }
}

/// Renderable primitive wrapped by every entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sprite {
    pub visual: Visual,
    pub position: Point,
    pub anchor: Point,
    pub scale: Point,
    pub rotation: f64,
    pub alpha: f64,
}

impl Sprite {
    pub fn new(visual: Visual) -> Self {
        Self {
            visual,
            position: Point::default(),
            anchor: Point::default(),
            scale: Point::new(1.0, 1.0),
            rotation: 0.0,
            alpha: 1.0,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Point::new(x, y);
        self
    }

    pub fn anchored(mut self, x: f64, y: f64) -> Self {
        self.anchor = Point::new(x, y);
        self
    }

    pub fn scaled(mut self, x: f64, y: f64) -> Self {
        self.scale = Point::new(x, y);
        self
    }

    pub fn with_alpha(mut self, alpha: f64) -> Self {
        self.alpha = alpha;
        self
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn width(&self) -> f64 {
        self.visual.size().0 * self.scale.x.abs()
    }

    pub fn height(&self) -> f64 {
        self.visual.size().1 * self.scale.y.abs()
    }

    /// Screen-space box, ignoring rotation.
    pub fn bounds(&self) -> Rect {
        let width = self.width();
        let height = self.height();
        Rect::new(
            self.position.x - self.anchor.x * width,
            self.position.y - self.anchor.y * height,
            width,
            height,
        )
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.scale.is_finite()
            && self.rotation.is_finite()
            && self.alpha.is_finite()
    }
}

/// Shared handle to a scene-graph container.
///
/// Children are referenced by entity id. Clones point at the same node, so an
/// entity can keep a handle to its parent and detach itself on dispose.
#[derive(Clone)]
pub struct Container {
    node: Rc<RefCell<ContainerNode>>,
}

struct ContainerNode {
    name: String,
    children: Vec<EntityId>,
}

impl Container {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            node: Rc::new(RefCell::new(ContainerNode {
                name: name.into(),
                children: Vec::new(),
            })),
        }
    }

    pub fn name(&self) -> String {
        self.node.borrow().name.clone()
    }

    pub fn add_child(&self, child: EntityId) {
        self.node.borrow_mut().children.push(child);
    }

    /// Returns whether `child` was attached to this container.
    pub fn remove_child(&self, child: EntityId) -> bool {
        let mut node = self.node.borrow_mut();
        match node.children.iter().position(|id| *id == child) {
            Some(index) => {
                node.children.remove(index);
                true
            }
            None => false,
        }
    }

    /// Detaches every child and returns them in draw order.
    pub fn remove_children(&self) -> Vec<EntityId> {
        std::mem::take(&mut self.node.borrow_mut().children)
    }

    pub fn children(&self) -> Vec<EntityId> {
        self.node.borrow().children.clone()
    }

    pub fn len(&self) -> usize {
        self.node.borrow().children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let node = self.node.borrow();
        f.debug_struct("Container")
            .field("name", &node.name)
            .field("children", &node.children.len())
            .finish()
    }
}

/// Root of the scene graph: one container per [`Layer`], drawn in order.
#[derive(Debug)]
pub struct Stage {
    layers: Vec<(Layer, Container)>,
}

impl Stage {
    pub fn new() -> Self {
        let layers = Layer::DRAW_ORDER
            .iter()
            .map(|layer| (*layer, Self::create_container(layer.name())))
            .collect();
        Self { layers }
    }

    pub fn create_container(name: &str) -> Container {
        Container::new(name)
    }

    pub fn layer(&self, layer: Layer) -> &Container {
        // Every layer is created in `new`.
        &self.layers[layer.index()].1
    }

    pub fn layers(&self) -> impl Iterator<Item = (Layer, &Container)> {
        self.layers.iter().map(|(layer, container)| (*layer, container))
    }
}

impl Default for Stage {
    fn default() -> Self {
        Self::new()
    }
}

/// Rendering backend abstraction. Called once per frame after all updates.
pub trait Renderer {
    fn render(&mut self, world: &World) -> Result<()>;
}

/// One sprite as submitted to the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DrawCall {
    pub layer: Layer,
    pub entity: EntityId,
    pub sprite: Sprite,
}

/// Backend that keeps the most recent frame's draw list instead of drawing.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    frames: u64,
    last_frame: Vec<DrawCall>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn last_frame(&self) -> &[DrawCall] {
        &self.last_frame
    }

    pub fn count_in(&self, layer: Layer) -> usize {
        self.last_frame
            .iter()
            .filter(|call| call.layer == layer)
            .count()
    }
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, world: &World) -> Result<()> {
        self.frames += 1;
        self.last_frame = world
            .draw_list()
            .map(|(layer, entity)| DrawCall {
                layer,
                entity: entity.id(),
                sprite: entity.sprite.clone(),
            })
            .collect();
        Ok(())
    }
}
