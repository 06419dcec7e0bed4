//! Curves used to compare model trajectories.
//!
//! A [`Curve`] carries descriptive metadata (title, labels, units) and a data
//! variant selected by a type tag when it is constructed. Only point-set data
//! is currently defined.
//!
//! ```rust
//! use rlam_core::curve::Curve;
//!
//! let a = Curve::point_set(&[(0.0, 0.0), (1.0, 2.0), (2.0, 4.0)]);
//! let b = Curve::point_set(&[(0.0, 1.0), (2.0, 5.0)]);
//! assert_eq!(a.get_y(1.5), 3.0);
//! assert_eq!(a.hamming_distance(&b, 0.0, 2.0, 1.0).unwrap(), 3.0);
//! ```

mod point_set;

pub use point_set::PointSet;

use crate::errors::{RLAMError, RLAMResult};
use crate::timeseries::FloatValue;
use serde::{Deserialize, Serialize};

/// Type tag of point-set curves
pub const POINT_SET_CURVE: &str = "PointSetCurve";

/// Data behind a curve
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CurveData {
    #[serde(rename = "PointSetCurve")]
    PointSet(PointSet),
}

impl CurveData {
    pub fn type_tag(&self) -> &'static str {
        match self {
            CurveData::PointSet(_) => POINT_SET_CURVE,
        }
    }
}

/// A named `(x, y)` curve with axis metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Curve {
    #[serde(default)]
    name: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    numerical_label: FloatValue,
    #[serde(default)]
    x_axis_label: String,
    #[serde(default)]
    y_axis_label: String,
    #[serde(default)]
    x_axis_units: String,
    #[serde(default)]
    y_axis_units: String,
    data: CurveData,
}

impl Curve {
    /// Create an empty curve of the variant named by `type_tag`
    pub fn from_type_tag(type_tag: &str) -> RLAMResult<Self> {
        let data = match type_tag {
            POINT_SET_CURVE => CurveData::PointSet(PointSet::new()),
            other => return Err(RLAMError::UnknownCurveType(other.to_string())),
        };
        Ok(Self::from_data(data))
    }

    pub fn from_data(data: CurveData) -> Self {
        Self {
            name: String::new(),
            title: String::new(),
            numerical_label: 0.0,
            x_axis_label: String::new(),
            y_axis_label: String::new(),
            x_axis_units: String::new(),
            y_axis_units: String::new(),
            data,
        }
    }

    /// Point-set curve through `pairs`
    pub fn point_set(pairs: &[(FloatValue, FloatValue)]) -> Self {
        Self::from_data(CurveData::PointSet(PointSet::from_pairs(pairs)))
    }

    pub fn data(&self) -> &CurveData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut CurveData {
        &mut self.data
    }

    /// Points ordered by ascending x
    pub fn sorted_pairs(&self) -> Vec<(FloatValue, FloatValue)> {
        match &self.data {
            CurveData::PointSet(points) => points.sorted_pairs(),
        }
    }

    pub fn get_y(&self, x: FloatValue) -> FloatValue {
        match &self.data {
            CurveData::PointSet(points) => points.get_y(x),
        }
    }

    /// Sum of `|self(x) - other(x)|` sampled from `x_start` to `x_end` (inclusive)
    /// every `x_interval`.
    pub fn hamming_distance(
        &self,
        other: &Curve,
        x_start: FloatValue,
        x_end: FloatValue,
        x_interval: FloatValue,
    ) -> RLAMResult<FloatValue> {
        if x_interval <= 0.0 || !x_interval.is_finite() {
            return Err(RLAMError::NonPositiveStep(x_interval));
        }

        let mut sum = 0.0;
        let mut x = x_start;
        while x <= x_end {
            sum += (self.get_y(x) - other.get_y(x)).abs();
            x += x_interval;
        }
        Ok(sum)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = name.to_string();
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    pub fn numerical_label(&self) -> FloatValue {
        self.numerical_label
    }

    pub fn set_numerical_label(&mut self, label: FloatValue) {
        self.numerical_label = label;
    }

    pub fn x_axis_label(&self) -> &str {
        &self.x_axis_label
    }

    pub fn set_x_axis_label(&mut self, label: &str) {
        self.x_axis_label = label.to_string();
    }

    pub fn y_axis_label(&self) -> &str {
        &self.y_axis_label
    }

    pub fn set_y_axis_label(&mut self, label: &str) {
        self.y_axis_label = label.to_string();
    }

    pub fn x_axis_units(&self) -> &str {
        &self.x_axis_units
    }

    pub fn set_x_axis_units(&mut self, units: &str) {
        self.x_axis_units = units.to_string();
    }

    pub fn y_axis_units(&self) -> &str {
        &self.y_axis_units
    }

    pub fn set_y_axis_units(&mut self, units: &str) {
        self.y_axis_units = units.to_string();
    }
}

/// Curves are equal when their sorted points are equal
impl PartialEq for Curve {
    fn eq(&self, other: &Self) -> bool {
        self.sorted_pairs() == other.sorted_pairs()
    }
}
