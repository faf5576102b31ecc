// [libs/domain/models/src/window.rs]
//! Half-open time intervals and their intersection. The rating engine's
//! effective window is the intersection of up to four of these.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `[start, end)`. `end` is exclusive and may be absent (open-ended).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Window {
    pub start: DateTime<Utc>,
    pub end: Option<DateTime<Utc>>,
}

impl Window {
    pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Self {
        Self { start, end }
    }

    pub fn closed(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end: Some(end) }
    }

    /// Intersects this window with another half-open window. Returns `None`
    /// when the intersection is empty (including degenerate zero-length
    /// results, since `[x, x)` contains nothing).
    pub fn intersect(&self, other: &Window) -> Option<Window> {
        let start = self.start.max(other.start);
        let end = match (self.end, other.end) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, Some(b)) => Some(b),
            (None, None) => None,
        };
        match end {
            Some(e) if e <= start => None,
            _ => Some(Window { start, end }),
        }
    }

    /// Folds `intersect` over a sequence of windows, short-circuiting to
    /// `None` as soon as the running intersection is empty.
    pub fn intersect_all<'a>(windows: impl IntoIterator<Item = &'a Window>) -> Option<Window> {
        let mut iter = windows.into_iter();
        let first = *iter.next()?;
        iter.try_fold(first, |acc, w| acc.intersect(w))
    }

    pub fn duration(&self) -> Option<chrono::Duration> {
        self.end.map(|e| e - self.start)
    }

    pub fn contains_instant(&self, at: DateTime<Utc>) -> bool {
        at >= self.start && self.end.map(|e| at < e).unwrap_or(true)
    }
}
