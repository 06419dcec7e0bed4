//! Declarative description of a land allocation tree.
//!
//! A [`LandAllocatorInput`] is what a scenario file contains. It builds a
//! [`LandAllocator`] and can be recovered from one with
//! [`LandAllocator::to_input`]. [`LandAllocator::to_debug`] produces a
//! snapshot of the per-period state of every item.

use super::carbon::{CarbonParameters, LandCarbon};
use super::history::LandUseHistory;
use super::item::{ItemRole, LandItem, LandLeaf, LandNode, LeafKind};
use super::tree::LandAllocator;
use petgraph::graph::NodeIndex;
use rlam_core::errors::{RLAMError, RLAMResult};
use rlam_core::modeltime::ModelTime;
use rlam_core::timeseries::{FloatValue, Period, PeriodVector, Year};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandAllocatorInput {
    pub name: String,
    #[serde(default)]
    pub sigma: FloatValue,
    /// Total land per period. Missing periods repeat the last value.
    pub land_allocation: Vec<FloatValue>,
    #[serde(default)]
    pub land_use_history: Option<LandUseHistory>,
    /// First year of the land-use-change carbon calculation
    pub carbon_start_year: Year,
    #[serde(default)]
    pub children: Vec<LandItemInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LandItemInput {
    Node(LandNodeInput),
    Leaf(LandLeafInput),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandNodeInput {
    pub name: String,
    #[serde(default)]
    pub sigma: FloatValue,
    #[serde(default)]
    pub unmanaged_land_value: FloatValue,
    #[serde(default)]
    pub land_use_history: Option<LandUseHistory>,
    #[serde(default)]
    pub children: Vec<LandItemInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandLeafInput {
    pub name: String,
    #[serde(default)]
    pub kind: LeafKind,
    /// Calibrated allocations for the leading periods of managed leaves.
    /// Unmanaged leaves use it as their read-in allocation for every period.
    #[serde(default)]
    pub land_allocation: Vec<FloatValue>,
    #[serde(default)]
    pub observed_yield: Vec<FloatValue>,
    /// Carbon per unit land, repeated forward
    #[serde(default)]
    pub above_ground_carbon: Vec<FloatValue>,
    #[serde(default)]
    pub below_ground_carbon: Vec<FloatValue>,
    #[serde(default)]
    pub carbon: CarbonParameters,
    #[serde(default)]
    pub land_use_history: Option<LandUseHistory>,
}

/// Per-period state of an item and its children
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemDebug {
    pub name: String,
    pub kind: String,
    pub land_allocation: FloatValue,
    pub share: FloatValue,
    pub intrinsic_rate: FloatValue,
    pub intrinsic_yield_mode: FloatValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sigma: Option<FloatValue>,
    #[serde(rename = "yield", skip_serializing_if = "Option::is_none")]
    pub crop_yield: Option<FloatValue>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ItemDebug>,
}

fn leading_values(values: &[FloatValue], periods: usize) -> PeriodVector<Option<FloatValue>> {
    let mut result = PeriodVector::new(periods);
    for (period, value) in values.iter().take(periods).enumerate() {
        result[period] = Some(*value);
    }
    result
}

fn leading_prefix(values: &PeriodVector<Option<FloatValue>>) -> Vec<FloatValue> {
    values.iter().map_while(|v| *v).collect()
}

impl LandAllocator {
    /// Build the tree described by `input` for the periods of `modeltime`
    pub fn from_input(input: &LandAllocatorInput, modeltime: &dyn ModelTime) -> RLAMResult<Self> {
        let periods = modeltime.max_period();
        let end_year = modeltime.end_year();
        if input.land_allocation.is_empty() {
            return Err(RLAMError::InvalidDescription(format!(
                "land allocator {} has no total land",
                input.name
            )));
        }
        if input.carbon_start_year > end_year {
            return Err(RLAMError::InvalidDescription(format!(
                "carbon start year {} is after the last model year {}",
                input.carbon_start_year, end_year
            )));
        }

        let mut root_node = LandNode::new(input.sigma);
        root_node.land_use_history = input.land_use_history.clone();
        let mut root = LandItem::new(&input.name, periods, ItemRole::Node(root_node));
        root.land_allocation = PeriodVector::fill_forward(&input.land_allocation, periods);

        let mut allocator = LandAllocator::new(root, periods, input.carbon_start_year, end_year);
        let root = allocator.root();
        for child in &input.children {
            allocator.add_input(root, child, periods, end_year);
        }
        allocator.rebuild_index();
        Ok(allocator)
    }

    fn add_input(
        &mut self,
        parent: NodeIndex,
        input: &LandItemInput,
        periods: usize,
        end_year: Year,
    ) {
        match input {
            LandItemInput::Node(node_input) => {
                let node = LandNode {
                    sigma: node_input.sigma,
                    unmanaged_land_value: node_input.unmanaged_land_value,
                    land_use_history: node_input.land_use_history.clone(),
                };
                let item = LandItem::new(&node_input.name, periods, ItemRole::Node(node));
                let idx = self.add_item(parent, item);
                for child in &node_input.children {
                    self.add_input(idx, child, periods, end_year);
                }
            }
            LandItemInput::Leaf(leaf_input) => {
                let carbon = LandCarbon::new(
                    leaf_input.carbon.clone(),
                    PeriodVector::fill_forward(&leaf_input.above_ground_carbon, periods),
                    PeriodVector::fill_forward(&leaf_input.below_ground_carbon, periods),
                    self.carbon_start_year(),
                    end_year,
                );
                let mut leaf = LandLeaf::new(leaf_input.kind, periods, carbon);
                leaf.cal_observed_yield = leading_values(&leaf_input.observed_yield, periods);
                leaf.land_use_history = leaf_input.land_use_history.clone();

                let mut item_allocation = PeriodVector::new(periods);
                if leaf_input.kind == LeafKind::Unmanaged {
                    leaf.base_land_allocation =
                        PeriodVector::fill_forward(&leaf_input.land_allocation, periods);
                    item_allocation = leaf.base_land_allocation.clone();
                } else {
                    leaf.cal_land_allocation = leading_values(&leaf_input.land_allocation, periods);
                    for period in 0..leaf_input.land_allocation.len().min(periods) {
                        item_allocation[period] = leaf_input.land_allocation[period];
                        self.set_cal_data_exists(period);
                    }
                }

                let mut item = LandItem::new(&leaf_input.name, periods, ItemRole::Leaf(leaf));
                item.land_allocation = item_allocation;
                self.add_item(parent, item);
            }
        }
    }

    /// Description of the tree in its current state
    pub fn to_input(&self) -> LandAllocatorInput {
        let root = self.item(self.root());
        LandAllocatorInput {
            name: root.name().to_string(),
            sigma: root.sigma(),
            land_allocation: root.land_allocation.as_slice().to_vec(),
            land_use_history: root.as_node().and_then(|n| n.land_use_history.clone()),
            carbon_start_year: self.carbon_start_year(),
            children: self
                .children(self.root())
                .into_iter()
                .map(|child| self.item_to_input(child))
                .collect(),
        }
    }

    fn item_to_input(&self, idx: NodeIndex) -> LandItemInput {
        let item = self.item(idx);
        match item.role() {
            ItemRole::Node(node) => LandItemInput::Node(LandNodeInput {
                name: item.name().to_string(),
                sigma: node.sigma,
                unmanaged_land_value: node.unmanaged_land_value,
                land_use_history: node.land_use_history.clone(),
                children: self
                    .children(idx)
                    .into_iter()
                    .map(|child| self.item_to_input(child))
                    .collect(),
            }),
            ItemRole::Leaf(leaf) => {
                let carbon = leaf.carbon();
                let periods = self.periods();
                let land_allocation = match leaf.kind {
                    LeafKind::Unmanaged => leaf.base_land_allocation.as_slice().to_vec(),
                    _ => leading_prefix(&leaf.cal_land_allocation),
                };
                LandItemInput::Leaf(LandLeafInput {
                    name: item.name().to_string(),
                    kind: leaf.kind,
                    land_allocation,
                    observed_yield: leading_prefix(&leaf.cal_observed_yield),
                    above_ground_carbon: (0..periods)
                        .map(|p| carbon.above_ground_density(p))
                        .collect(),
                    below_ground_carbon: (0..periods)
                        .map(|p| carbon.below_ground_density(p))
                        .collect(),
                    carbon: carbon.parameters().clone(),
                    land_use_history: leaf.land_use_history.clone(),
                })
            }
        }
    }

    /// Snapshot of every item in `period`
    pub fn to_debug(&self, period: Period) -> ItemDebug {
        self.item_to_debug(self.root(), period)
    }

    fn item_to_debug(&self, idx: NodeIndex, period: Period) -> ItemDebug {
        let item = self.item(idx);
        let (kind, sigma, crop_yield) = match item.role() {
            ItemRole::Node(node) if idx == self.root() => {
                ("root".to_string(), Some(node.sigma), None)
            }
            ItemRole::Node(node) => ("node".to_string(), Some(node.sigma), None),
            ItemRole::Leaf(leaf) => (
                format!("{:?}", leaf.kind).to_lowercase(),
                None,
                Some(leaf.yields[period]),
            ),
        };
        ItemDebug {
            name: item.name().to_string(),
            kind,
            land_allocation: item.land_allocation(period),
            share: item.share(period),
            intrinsic_rate: item.intrinsic_rate(period),
            intrinsic_yield_mode: item.intrinsic_yield_mode(period),
            sigma,
            crop_yield,
            children: self
                .children(idx)
                .into_iter()
                .map(|child| self.item_to_debug(child, period))
                .collect(),
        }
    }
}
