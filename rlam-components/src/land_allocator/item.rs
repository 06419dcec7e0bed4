//! Items of the land allocation tree.
//!
//! Every item holds the per-period allocation state shared by nodes and leaves.
//! What differs between a grouping node and a product leaf is carried by
//! [`ItemRole`], so code walking the tree matches on the role instead of
//! asking the item what it is.

use super::carbon::LandCarbon;
use super::history::LandUseHistory;
use rlam_core::modeltime::ModelTime;
use rlam_core::timeseries::{FloatValue, Period, PeriodVector, Year};
use serde::{Deserialize, Serialize};

/// Kind of land use a leaf represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafKind {
    #[default]
    Crop,
    Forest,
    Unmanaged,
}

impl LeafKind {
    pub fn is_managed(&self) -> bool {
        !matches!(self, LeafKind::Unmanaged)
    }
}

/// Matching policy used when searching the tree by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemKind {
    Node,
    Leaf,
    Any,
}

/// Selects the leaves included in a land total
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LandType {
    Managed,
    Unmanaged,
    Any,
}

/// Type of production added to a land type at configuration time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandUsageType {
    Crop,
    Forest,
}

impl From<LandUsageType> for LeafKind {
    fn from(value: LandUsageType) -> Self {
        match value {
            LandUsageType::Crop => LeafKind::Crop,
            LandUsageType::Forest => LeafKind::Forest,
        }
    }
}

/// Grouping of competing land uses
#[derive(Debug, Clone)]
pub struct LandNode {
    pub(crate) sigma: FloatValue,
    /// Value of a unit of unmanaged land. A positive value marks an unmanaged nest.
    pub(crate) unmanaged_land_value: FloatValue,
    pub(crate) land_use_history: Option<LandUseHistory>,
}

impl LandNode {
    pub fn new(sigma: FloatValue) -> Self {
        Self {
            sigma,
            unmanaged_land_value: 0.0,
            land_use_history: None,
        }
    }

    pub fn sigma(&self) -> FloatValue {
        self.sigma
    }

    pub fn unmanaged_land_value(&self) -> FloatValue {
        self.unmanaged_land_value
    }

    pub fn is_unmanaged_nest(&self) -> bool {
        self.unmanaged_land_value > 0.0
    }

    pub fn land_use_history(&self) -> Option<&LandUseHistory> {
        self.land_use_history.as_ref()
    }
}

/// Land-use history handed down from an ancestor node
#[derive(Debug, Clone)]
pub struct InheritedHistory {
    pub history: LandUseHistory,
    /// Fraction of the historical allocation belonging to this leaf
    pub share: FloatValue,
    /// Period the share was derived in
    pub period: Period,
}

/// Land used by a single product
#[derive(Debug, Clone)]
pub struct LandLeaf {
    pub(crate) kind: LeafKind,
    pub(crate) cal_land_allocation: PeriodVector<Option<FloatValue>>,
    pub(crate) cal_observed_yield: PeriodVector<Option<FloatValue>>,
    pub(crate) yields: PeriodVector<FloatValue>,
    /// Cumulative agricultural productivity change
    pub(crate) ag_prod_multiplier: PeriodVector<FloatValue>,
    /// Read-in allocation of unmanaged land, used as reallocation weights
    pub(crate) base_land_allocation: PeriodVector<FloatValue>,
    pub(crate) land_use_history: Option<LandUseHistory>,
    pub(crate) inherited_history: Option<InheritedHistory>,
    pub(crate) carbon: LandCarbon,
}

impl LandLeaf {
    pub fn new(kind: LeafKind, periods: usize, carbon: LandCarbon) -> Self {
        Self {
            kind,
            cal_land_allocation: PeriodVector::new(periods),
            cal_observed_yield: PeriodVector::new(periods),
            yields: PeriodVector::new(periods),
            ag_prod_multiplier: PeriodVector::filled(periods, 1.0),
            base_land_allocation: PeriodVector::new(periods),
            land_use_history: None,
            inherited_history: None,
            carbon,
        }
    }

    pub fn kind(&self) -> LeafKind {
        self.kind
    }

    pub fn cal_land_allocation(&self, period: Period) -> Option<FloatValue> {
        self.cal_land_allocation[period]
    }

    pub fn cal_observed_yield(&self, period: Period) -> Option<FloatValue> {
        self.cal_observed_yield[period]
    }

    pub fn yield_value(&self, period: Period) -> FloatValue {
        self.yields[period]
    }

    pub fn ag_prod_multiplier(&self, period: Period) -> FloatValue {
        self.ag_prod_multiplier[period]
    }

    pub fn base_land_allocation(&self, period: Period) -> FloatValue {
        self.base_land_allocation[period]
    }

    pub fn carbon(&self) -> &LandCarbon {
        &self.carbon
    }

    pub fn inherited_history(&self) -> Option<&InheritedHistory> {
        self.inherited_history.as_ref()
    }

    /// History describing this leaf before the first model year and the
    /// fraction of it that belongs to the leaf
    pub fn history(&self) -> Option<(&LandUseHistory, FloatValue)> {
        match (&self.land_use_history, &self.inherited_history) {
            (Some(own), _) => Some((own, 1.0)),
            (None, Some(inherited)) => Some((&inherited.history, inherited.share)),
            (None, None) => None,
        }
    }

    pub fn matches(&self, land_type: LandType) -> bool {
        match land_type {
            LandType::Any => true,
            LandType::Managed => self.kind.is_managed(),
            LandType::Unmanaged => !self.kind.is_managed(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ItemRole {
    Node(LandNode),
    Leaf(LandLeaf),
}

/// A node or leaf of the land allocation tree
#[derive(Debug, Clone)]
pub struct LandItem {
    pub(crate) name: String,
    pub(crate) land_allocation: PeriodVector<FloatValue>,
    /// Share of the parent's land
    pub(crate) share: PeriodVector<FloatValue>,
    pub(crate) intrinsic_rate: PeriodVector<FloatValue>,
    pub(crate) intrinsic_yield_mode: PeriodVector<FloatValue>,
    pub(crate) role: ItemRole,
}

impl LandItem {
    pub fn new(name: &str, periods: usize, role: ItemRole) -> Self {
        Self {
            name: name.to_string(),
            land_allocation: PeriodVector::new(periods),
            share: PeriodVector::new(periods),
            intrinsic_rate: PeriodVector::new(periods),
            intrinsic_yield_mode: PeriodVector::new(periods),
            role,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn role(&self) -> &ItemRole {
        &self.role
    }

    pub fn land_allocation(&self, period: Period) -> FloatValue {
        self.land_allocation[period]
    }

    pub fn share(&self, period: Period) -> FloatValue {
        self.share[period]
    }

    pub fn intrinsic_rate(&self, period: Period) -> FloatValue {
        self.intrinsic_rate[period]
    }

    pub fn intrinsic_yield_mode(&self, period: Period) -> FloatValue {
        self.intrinsic_yield_mode[period]
    }

    pub fn as_node(&self) -> Option<&LandNode> {
        match &self.role {
            ItemRole::Node(node) => Some(node),
            ItemRole::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&LandLeaf> {
        match &self.role {
            ItemRole::Leaf(leaf) => Some(leaf),
            ItemRole::Node(_) => None,
        }
    }

    pub(crate) fn as_node_mut(&mut self) -> Option<&mut LandNode> {
        match &mut self.role {
            ItemRole::Node(node) => Some(node),
            ItemRole::Leaf(_) => None,
        }
    }

    pub(crate) fn as_leaf_mut(&mut self) -> Option<&mut LandLeaf> {
        match &mut self.role {
            ItemRole::Leaf(leaf) => Some(leaf),
            ItemRole::Node(_) => None,
        }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self.role, ItemRole::Leaf(_))
    }

    pub fn matches(&self, kind: ItemKind) -> bool {
        match kind {
            ItemKind::Any => true,
            ItemKind::Node => !self.is_leaf(),
            ItemKind::Leaf => self.is_leaf(),
        }
    }

    /// Logit dispersion of the item's children. Leaves have none.
    pub fn sigma(&self) -> FloatValue {
        self.as_node().map(LandNode::sigma).unwrap_or(0.0)
    }

    pub fn is_unmanaged_nest(&self) -> bool {
        self.as_node().is_some_and(LandNode::is_unmanaged_nest)
    }

    /// Land occupied by the item in a calendar year.
    ///
    /// Years before the first model year follow the land-use history (joined
    /// linearly to the first period's allocation), years between model periods
    /// are interpolated and years after the last period keep its allocation.
    pub fn land_in_year(&self, year: Year, modeltime: &dyn ModelTime) -> FloatValue {
        let first_year = modeltime.start_year();
        if year < first_year {
            return self.historical_land(year, first_year);
        }

        let period = modeltime.year_to_period(year);
        let period_year = modeltime.period_to_year(period);
        if year >= period_year || period == 0 {
            return self.land_allocation[period];
        }

        let previous_year = modeltime.period_to_year(period - 1);
        let previous = self.land_allocation[period - 1];
        let current = self.land_allocation[period];
        previous
            + (current - previous) * (year - previous_year) as FloatValue
                / (period_year - previous_year) as FloatValue
    }

    fn historical_land(&self, year: Year, first_year: Year) -> FloatValue {
        let first = self.land_allocation[0];
        let Some((history, share)) = self.as_leaf().and_then(LandLeaf::history) else {
            return first;
        };
        let Some(last_year) = history.last_year() else {
            return first;
        };
        let last = history.allocation(last_year).unwrap_or(0.0) * share;
        if year <= last_year || last_year >= first_year {
            return history.allocation(year).unwrap_or(0.0) * share;
        }
        last + (first - last) * (year - last_year) as FloatValue
            / (first_year - last_year) as FloatValue
    }
}
