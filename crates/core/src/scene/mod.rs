use serde::{Deserialize, Serialize};

use crate::render::Point;

/// Scene layers, bottom to top.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    Background,
    MinusTrails,
    Minus,
    PlusTrails,
    Plus,
    Planet,
}

impl Layer {
    pub const DRAW_ORDER: [Layer; 6] = [
        Layer::Background,
        Layer::MinusTrails,
        Layer::Minus,
        Layer::PlusTrails,
        Layer::Plus,
        Layer::Planet,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Layer::Background => "background",
            Layer::MinusTrails => "minus-trails",
            Layer::Minus => "minus",
            Layer::PlusTrails => "plus-trails",
            Layer::Plus => "plus",
            Layer::Planet => "planet",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }

    /// Layer that holds the trails left by particles of this layer.
    pub fn trail_layer(self) -> Option<Layer> {
        match self {
            Layer::Plus => Some(Layer::PlusTrails),
            Layer::Minus => Some(Layer::MinusTrails),
            _ => None,
        }
    }
}

const BAND_MARGIN: f64 = 480.0;

/// Fixed positions of the scene's furniture for a given stage size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SceneLayout {
    pub width: f64,
    pub height: f64,
    pub center: Point,
    pub plus_band: Point,
    pub minus_band: Point,
    pub date_label: Point,
}

impl SceneLayout {
    pub fn new(width: f64, height: f64) -> Self {
        let center = Point::new(width * 0.5, height * 0.5);
        let plus_band = Point::new(center.x - BAND_MARGIN, height - 50.0);
        let minus_band = Point::new(center.x - BAND_MARGIN, height - 20.0);
        Self {
            width,
            height,
            center,
            plus_band,
            minus_band,
            date_label: Point::new(130.0, plus_band.y - 30.0),
        }
    }

    /// Where a gauge label sits once its gauge is `gauge` pixels wide.
    pub fn label_position(&self, band: Point, gauge: f64) -> Point {
        Point::new(self.plus_band.x + gauge + 10.0, band.y - 10.0)
    }
}
