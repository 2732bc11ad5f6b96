//! Robert Penner style easing curves.
//!
//! Every curve takes the elapsed time `t`, the start value `b`, the total
//! change `c` and the duration `d`, and returns the value reached at `t`.
//! Callers guarantee `d != 0`.

use serde::{Deserialize, Serialize};

/// Named easing curve shared by behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Easing {
    #[default]
    Linear,
    InCubic,
    OutCubic,
    InOutCubic,
}

impl Easing {
    pub fn apply(self, t: f64, b: f64, c: f64, d: f64) -> f64 {
        match self {
            Easing::Linear => linear(t, b, c, d),
            Easing::InCubic => in_cubic(t, b, c, d),
            Easing::OutCubic => out_cubic(t, b, c, d),
            Easing::InOutCubic => in_out_cubic(t, b, c, d),
        }
    }

    /// Progress in `[0, 1]` terms: `apply(t, 0, 1, d)`.
    pub fn progress(self, t: f64, d: f64) -> f64 {
        self.apply(t, 0.0, 1.0, d)
    }
}

pub fn linear(t: f64, b: f64, c: f64, d: f64) -> f64 {
    c * t / d + b
}

pub fn in_cubic(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d;
    c * t.powi(3) + b
}

pub fn out_cubic(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / d - 1.0;
    c * (t.powi(3) + 1.0) + b
}

pub fn in_out_cubic(t: f64, b: f64, c: f64, d: f64) -> f64 {
    let t = t / (d / 2.0);
    if t < 1.0 {
        c / 2.0 * t.powi(3) + b
    } else {
        let t = t - 2.0;
        c / 2.0 * (t.powi(3) + 2.0) + b
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 4] = [
        Easing::Linear,
        Easing::InCubic,
        Easing::OutCubic,
        Easing::InOutCubic,
    ];

    #[test]
    fn curves_hit_both_endpoints() {
        for easing in ALL {
            for (b, c, d) in [(0.0, 1.0, 100.0), (3.0, -7.5, 2500.0), (-1.0, 40.0, 0.5)] {
                assert!(
                    (easing.apply(0.0, b, c, d) - b).abs() < 1e-9,
                    "{easing:?} start"
                );
                assert!(
                    (easing.apply(d, b, c, d) - (b + c)).abs() < 1e-9,
                    "{easing:?} end"
                );
            }
        }
    }

    #[test]
    fn cubic_curves_bend_the_right_way() {
        assert!(Easing::InCubic.progress(50.0, 100.0) < 0.5);
        assert!(Easing::OutCubic.progress(50.0, 100.0) > 0.5);
        assert!((Easing::Linear.progress(50.0, 100.0) - 0.5).abs() < 1e-12);
        assert!((Easing::InOutCubic.progress(50.0, 100.0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn curves_keep_going_past_the_duration() {
        assert!(Easing::Linear.progress(150.0, 100.0) > 1.0);
        assert!(Easing::OutCubic.progress(150.0, 100.0) > 1.0);
    }
}
