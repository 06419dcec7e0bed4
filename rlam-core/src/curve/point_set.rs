use crate::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// A curve defined by explicit `(x, y)` points.
///
/// Points are stored in insertion order. Lookups go through a sorted view so
/// the order in which points were added never affects results.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PointSet {
    #[serde(default)]
    points: Vec<(FloatValue, FloatValue)>,
}

impl PointSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs(pairs: &[(FloatValue, FloatValue)]) -> Self {
        let mut set = Self::new();
        for (x, y) in pairs {
            set.add_point(*x, *y);
        }
        set
    }

    /// Add a point. Returns `false` and leaves the set unchanged if a point
    /// already exists at `x`.
    pub fn add_point(&mut self, x: FloatValue, y: FloatValue) -> bool {
        if self.points.iter().any(|(px, _)| *px == x) {
            return false;
        }
        self.points.push((x, y));
        true
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn sorted_pairs(&self) -> Vec<(FloatValue, FloatValue)> {
        let mut pairs = self.points.clone();
        pairs.sort_by(|a, b| a.0.total_cmp(&b.0));
        pairs
    }

    /// Linearly interpolated y value at `x`.
    ///
    /// Outside of the defined range the first or last segment is extended.
    /// A single point defines a constant curve and an empty set is zero.
    pub fn get_y(&self, x: FloatValue) -> FloatValue {
        let pairs = self.sorted_pairs();
        match pairs.len() {
            0 => 0.0,
            1 => pairs[0].1,
            n => {
                let upper = pairs
                    .iter()
                    .position(|(px, _)| *px >= x)
                    .unwrap_or(n - 1)
                    .max(1);
                let (x0, y0) = pairs[upper - 1];
                let (x1, y1) = pairs[upper];
                y0 + (y1 - y0) * (x - x0) / (x1 - x0)
            }
        }
    }
}
