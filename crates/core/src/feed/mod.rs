//! Code frequency records and the queue the phase machine consumes.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use time::{macros::format_description, OffsetDateTime};

use crate::{CodeFreqError, Result};

/// Additions and deletions committed during the week starting at `timestamp`
/// (unix seconds). Deletions are usually reported as negative numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(i64, i64, i64)")]
pub struct DataPoint {
    pub timestamp: i64,
    pub additions: i64,
    pub deletions: i64,
}

impl From<(i64, i64, i64)> for DataPoint {
    fn from((timestamp, additions, deletions): (i64, i64, i64)) -> Self {
        Self {
            timestamp,
            additions,
            deletions,
        }
    }
}

impl DataPoint {
    pub fn new(timestamp: i64, additions: i64, deletions: i64) -> Self {
        Self {
            timestamp,
            additions,
            deletions,
        }
    }

    pub fn removed(&self) -> i64 {
        self.deletions.saturating_abs()
    }

    pub fn churn(&self) -> i64 {
        self.additions.max(0).saturating_add(self.removed())
    }

    fn checked_churn(&self) -> Option<i64> {
        self.deletions
            .checked_abs()
            .and_then(|removed| self.additions.max(0).checked_add(removed))
    }

    pub fn date(&self) -> Result<OffsetDateTime> {
        OffsetDateTime::from_unix_timestamp(self.timestamp)
            .map_err(|err| CodeFreqError::msg(format!("timestamp {}: {err}", self.timestamp)))
    }

    /// Long form date such as `Sunday, March 5, 2017`.
    pub fn date_label(&self) -> Result<String> {
        let format =
            format_description!("[weekday], [month repr:long] [day padding:none], [year]");
        self.date()?
            .format(&format)
            .map_err(|err| CodeFreqError::msg(err.to_string()))
    }
}

/// Parses a `[[timestamp, additions, deletions], ...]` document.
pub fn parse_feed(json: &str) -> Result<Vec<DataPoint>> {
    let points: Vec<DataPoint> = serde_json::from_str(json)
        .map_err(|err| CodeFreqError::load(format!("malformed code frequency data: {err}")))?;

    for pair in points.windows(2) {
        if pair[1].timestamp < pair[0].timestamp {
            return Err(CodeFreqError::load(format!(
                "timestamps go backwards: {} after {}",
                pair[1].timestamp, pair[0].timestamp
            )));
        }
    }
    if let Some(point) = points
        .iter()
        .find(|point| OffsetDateTime::from_unix_timestamp(point.timestamp).is_err())
    {
        return Err(CodeFreqError::load(format!(
            "timestamp {} is out of range",
            point.timestamp
        )));
    }

    let mut total: i64 = 0;
    for point in &points {
        total = point
            .checked_churn()
            .and_then(|churn| total.checked_add(churn))
            .ok_or_else(|| {
                CodeFreqError::load(format!(
                    "line counts overflow at timestamp {}",
                    point.timestamp
                ))
            })?;
    }

    Ok(points)
}

/// FIFO queue of the periods still to reveal.
#[derive(Debug, Clone, Default)]
pub struct DataFeed {
    points: VecDeque<DataPoint>,
    total_churn: i64,
}

impl DataFeed {
    pub fn new(points: Vec<DataPoint>) -> Self {
        let total_churn = points
            .iter()
            .fold(0i64, |total, point| total.saturating_add(point.churn()));
        Self {
            points: points.into(),
            total_churn,
        }
    }

    pub fn pop(&mut self) -> Option<DataPoint> {
        self.points.pop_front()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Session-wide additions plus deletions, fixed at construction.
    pub fn total_churn(&self) -> i64 {
        self.total_churn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_github_style_tuples() {
        let points = parse_feed("[[1488672000, 120, -45], [1489276800, 0, 0]]").unwrap();
        assert_eq!(
            points,
            vec![
                DataPoint::new(1_488_672_000, 120, -45),
                DataPoint::new(1_489_276_800, 0, 0),
            ]
        );
        assert_eq!(points[0].removed(), 45);
        assert_eq!(points[0].churn(), 165);
    }

    #[test]
    fn rejects_malformed_documents() {
        for doc in ["{}", "[[1, 2]]", "[[1, 2, \"x\"]]", "not json"] {
            let err = parse_feed(doc).unwrap_err();
            assert!(matches!(err, CodeFreqError::LoadFailure(_)), "{doc}");
        }
    }

    #[test]
    fn rejects_out_of_order_timestamps() {
        let err = parse_feed("[[20, 1, -1], [10, 1, -1]]").unwrap_err();
        assert!(format!("{err}").contains("backwards"));
    }

    #[test]
    fn rejects_line_counts_that_overflow() {
        for doc in [
            "[[0, 1, -9223372036854775808]]",
            "[[0, 9223372036854775807, -1]]",
            "[[0, 5000000000000000000, 0], [1, 5000000000000000000, 0]]",
        ] {
            let err = parse_feed(doc).unwrap_err();
            assert!(format!("{err}").contains("overflow"), "{doc}");
        }

        let extreme = DataPoint::new(0, 1, i64::MIN);
        assert_eq!(extreme.removed(), i64::MAX);
        assert_eq!(DataFeed::new(vec![extreme, extreme]).total_churn(), i64::MAX);
    }

    #[test]
    fn formats_long_dates() {
        let point = DataPoint::new(1_488_672_000, 0, 0);
        assert_eq!(point.date_label().unwrap(), "Sunday, March 5, 2017");
    }

    #[test]
    fn feed_is_first_in_first_out() {
        let mut feed = DataFeed::new(vec![
            DataPoint::new(1, 10, -5),
            DataPoint::new(2, 20, -1),
        ]);
        assert_eq!(feed.total_churn(), 36);
        assert_eq!(feed.pop().map(|p| p.timestamp), Some(1));
        assert_eq!(feed.pop().map(|p| p.timestamp), Some(2));
        assert!(feed.pop().is_none());
        assert!(feed.is_empty());
        assert_eq!(feed.total_churn(), 36);
    }
}
