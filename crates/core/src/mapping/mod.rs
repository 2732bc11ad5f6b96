use serde::{Deserialize, Serialize};

use crate::feed::DataPoint;

/// Running totals across the periods revealed so far.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    pub plus_sum: i64,
    pub minus_sum: i64,
    /// Session-wide additions plus deletions; the gauges' denominator.
    pub total: i64,
}

impl Tally {
    pub fn new(total: i64) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    pub fn record(&mut self, point: &DataPoint) {
        self.plus_sum = self.plus_sum.saturating_add(point.additions.max(0));
        self.minus_sum = self.minus_sum.saturating_add(point.removed());
    }

    pub fn plus_gauge(&self, width: f64) -> f64 {
        self.gauge(self.plus_sum, width)
    }

    pub fn minus_gauge(&self, width: f64) -> f64 {
        self.gauge(self.minus_sum, width)
    }

    fn gauge(&self, cumulative: i64, width: f64) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            cumulative as f64 / self.total as f64 * width
        }
    }

    pub fn plus_label(&self) -> String {
        format!("[ + ] {}", self.plus_sum)
    }

    pub fn minus_label(&self) -> String {
        format!("[ - ] {}", self.minus_sum)
    }
}

/// How many particles one period launches, and how they are spread.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LaunchPlan {
    pub timestamp: i64,
    pub plus: usize,
    pub minus: usize,
    pub window_ms: f64,
}

impl LaunchPlan {
    pub fn for_point(point: &DataPoint, density: f64, window_ms: f64) -> Self {
        Self {
            timestamp: point.timestamp,
            plus: launch_count(point.additions.max(0), density),
            minus: launch_count(point.removed(), density),
            window_ms,
        }
    }

    /// Offset of particle `index` out of `count`, spread linearly over the
    /// window.
    pub fn stagger(&self, index: usize, count: usize) -> f64 {
        if count == 0 {
            0.0
        } else {
            index as f64 * (self.window_ms / count as f64)
        }
    }

    pub fn total(&self) -> usize {
        self.plus + self.minus
    }
}

fn launch_count(amount: i64, density: f64) -> usize {
    (amount as f64 * density).ceil().max(0.0) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    const DENSITY: f64 = 300.0 / 60.0 / 1000.0;

    #[test]
    fn counts_round_up() {
        let plan = LaunchPlan::for_point(&DataPoint::new(0, 500, -1001), DENSITY, 2000.0);
        assert_eq!(plan.plus, (500.0 * DENSITY).ceil() as usize);
        assert_eq!(plan.plus, 3);
        assert_eq!(plan.minus, 6);
        assert_eq!(plan.total(), 9);
    }

    #[test]
    fn quiet_periods_launch_nothing() {
        let plan = LaunchPlan::for_point(&DataPoint::new(0, 0, 0), DENSITY, 2000.0);
        assert_eq!(plan.total(), 0);
        assert_eq!(plan.stagger(0, 0), 0.0);
    }

    #[test]
    fn stagger_is_linear_over_the_window() {
        let plan = LaunchPlan::for_point(&DataPoint::new(0, 800, 0), DENSITY, 2000.0);
        assert_eq!(plan.plus, 4);
        let offsets: Vec<_> = (0..plan.plus).map(|i| plan.stagger(i, plan.plus)).collect();
        assert_eq!(offsets, vec![0.0, 500.0, 1000.0, 1500.0]);
    }

    #[test]
    fn gauges_are_fractions_of_the_session_total() {
        let mut tally = Tally::new(400);
        tally.record(&DataPoint::new(0, 100, -50));
        tally.record(&DataPoint::new(1, 100, -50));

        assert_eq!(tally.plus_sum, 200);
        assert_eq!(tally.minus_sum, 100);
        assert!((tally.plus_gauge(1000.0) - 500.0).abs() < 1e-9);
        assert!((tally.minus_gauge(1000.0) - 250.0).abs() < 1e-9);
        assert_eq!(tally.plus_label(), "[ + ] 200");
        assert_eq!(tally.minus_label(), "[ - ] 100");
    }

    #[test]
    fn empty_session_has_flat_gauges() {
        let tally = Tally::new(0);
        assert_eq!(tally.plus_gauge(1000.0), 0.0);
    }

    #[test]
    fn extreme_counts_saturate_instead_of_overflowing() {
        let mut tally = Tally::new(i64::MAX);
        tally.record(&DataPoint::new(0, -40, i64::MIN));
        tally.record(&DataPoint::new(1, 10, -1));

        assert_eq!(tally.plus_sum, 10);
        assert_eq!(tally.minus_sum, i64::MAX);
    }
}
