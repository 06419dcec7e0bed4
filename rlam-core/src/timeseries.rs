//! Dense containers indexed by model period or by calendar year.
//!
//! Land allocation state is held per model period (a handful of entries),
//! while carbon accounting is resolved annually between a start and end year.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

pub type FloatValue = f64;
/// Index of a model period, starting at zero for the base year
pub type Period = usize;
/// Calendar year
pub type Year = i32;

/// Values indexed by model period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PeriodVector<T> {
    values: Vec<T>,
}

impl<T: Clone + Default> PeriodVector<T> {
    /// Create a vector of `periods` default values
    pub fn new(periods: usize) -> Self {
        Self::filled(periods, T::default())
    }

    /// Build a vector of length `periods` from read-in values.
    ///
    /// Shorter inputs are extended by repeating their last value.
    /// An empty input gives default values.
    pub fn fill_forward(values: &[T], periods: usize) -> Self {
        let mut result = Self::new(periods);
        let mut last = None;
        for period in 0..periods {
            if let Some(value) = values.get(period) {
                last = Some(value.clone());
            }
            if let Some(value) = &last {
                result.values[period] = value.clone();
            }
        }
        result
    }
}

impl<T: Clone> PeriodVector<T> {
    pub fn filled(periods: usize, value: T) -> Self {
        Self {
            values: vec![value; periods],
        }
    }

    /// Set the value for `period` and every later period
    pub fn set_from(&mut self, period: Period, value: T) {
        for item in self.values.iter_mut().skip(period) {
            *item = value.clone();
        }
    }
}

impl<T> PeriodVector<T> {
    pub fn from_values(values: Vec<T>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, period: Period) -> Option<&T> {
        self.values.get(period)
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.values.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.values
    }

    /// Append a period. Used when a description is shorter than the model horizon
    pub fn push(&mut self, value: T) {
        self.values.push(value)
    }
}

impl PeriodVector<FloatValue> {
    /// The most recent strictly positive value at or before `period`, or zero.
    pub fn latest_positive(&self, period: Period) -> FloatValue {
        self.values
            .iter()
            .take(period + 1)
            .rev()
            .find(|v| **v > 0.0)
            .copied()
            .unwrap_or(0.0)
    }
}

impl<T: Copy> PeriodVector<Option<T>> {
    /// The most recent value that was set at or before `period`
    pub fn latest_set(&self, period: Period) -> Option<T> {
        self.values.iter().take(period + 1).rev().find_map(|v| *v)
    }
}

impl<T> Index<Period> for PeriodVector<T> {
    type Output = T;

    fn index(&self, period: Period) -> &Self::Output {
        &self.values[period]
    }
}

impl<T> IndexMut<Period> for PeriodVector<T> {
    fn index_mut(&mut self, period: Period) -> &mut Self::Output {
        &mut self.values[period]
    }
}

/// Values for every calendar year in an inclusive range.
///
/// Indexing with a year outside of the range panics, mirroring slice indexing.
/// Use [`YearVector::get`] for checked access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearVector<T> {
    start_year: Year,
    values: Vec<T>,
}

impl<T: Clone + Default> YearVector<T> {
    /// Create a vector covering `start_year..=end_year`.
    ///
    /// An end year before the start year gives an empty vector.
    pub fn new(start_year: Year, end_year: Year) -> Self {
        let size = (end_year - start_year + 1).max(0) as usize;
        Self {
            start_year,
            values: vec![T::default(); size],
        }
    }
}

impl<T> YearVector<T> {
    pub fn start_year(&self) -> Year {
        self.start_year
    }

    pub fn end_year(&self) -> Year {
        self.start_year + self.values.len() as Year - 1
    }

    pub fn contains(&self, year: Year) -> bool {
        year >= self.start_year && year <= self.end_year()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, year: Year) -> Option<&T> {
        self.offset(year).and_then(|i| self.values.get(i))
    }

    pub fn get_mut(&mut self, year: Year) -> Option<&mut T> {
        self.offset(year).and_then(|i| self.values.get_mut(i))
    }

    /// Iterate over `(year, value)` pairs in ascending year order
    pub fn iter(&self) -> impl Iterator<Item = (Year, &T)> {
        let start = self.start_year;
        self.values
            .iter()
            .enumerate()
            .map(move |(i, v)| (start + i as Year, v))
    }

    fn offset(&self, year: Year) -> Option<usize> {
        if year < self.start_year {
            None
        } else {
            Some((year - self.start_year) as usize)
        }
    }
}

impl<T> Index<Year> for YearVector<T> {
    type Output = T;

    fn index(&self, year: Year) -> &Self::Output {
        let (start, end) = (self.start_year, self.end_year());
        self.get(year)
            .unwrap_or_else(|| panic!("year {} outside of {}..={}", year, start, end))
    }
}

impl<T> IndexMut<Year> for YearVector<T> {
    fn index_mut(&mut self, year: Year) -> &mut Self::Output {
        let (start, end) = (self.start_year, self.end_year());
        self.get_mut(year)
            .unwrap_or_else(|| panic!("year {} outside of {}..={}", year, start, end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_forward_repeats_last_value() {
        let v = PeriodVector::fill_forward(&[1.0, 2.0], 4);
        assert_eq!(v.as_slice(), &[1.0, 2.0, 2.0, 2.0]);

        let empty: PeriodVector<FloatValue> = PeriodVector::fill_forward(&[], 3);
        assert_eq!(empty.as_slice(), &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn latest_positive_skips_unset_periods() {
        let v = PeriodVector::from_values(vec![0.5, 0.0, 0.7, 0.0, 0.0]);
        assert_eq!(v.latest_positive(0), 0.5);
        assert_eq!(v.latest_positive(1), 0.5);
        assert_eq!(v.latest_positive(4), 0.7);

        let zeros = PeriodVector::<FloatValue>::new(3);
        assert_eq!(zeros.latest_positive(2), 0.0);
    }

    #[test]
    fn latest_set() {
        let v = PeriodVector::from_values(vec![None, Some(2.0), None]);
        assert_eq!(v.latest_set(0), None);
        assert_eq!(v.latest_set(2), Some(2.0));
    }

    #[test]
    fn year_vector_range() {
        let mut v: YearVector<bool> = YearVector::new(1990, 2000);
        assert_eq!(v.len(), 11);
        assert_eq!(v.end_year(), 2000);
        assert!(v.contains(1990));
        assert!(!v.contains(2001));
        assert!(v.get(1989).is_none());

        v[1995] = true;
        assert!(v[1995]);
        assert_eq!(v.iter().filter(|(_, x)| **x).count(), 1);
    }

    #[test]
    #[should_panic(expected = "outside of")]
    fn year_vector_out_of_range() {
        let v: YearVector<f64> = YearVector::new(1990, 2000);
        let _ = v[2001];
    }
}
