//! The land allocation tree and its per-period calculations.
//!
//! Items live in a [`petgraph::Graph`] with an edge from each parent to its
//! children. Children are visited in the order they were added, which is the
//! order of their node indices.

use super::carbon::{CarbonParameters, LandCarbon};
use super::history::LandUseHistory;
use super::item::{
    InheritedHistory, ItemKind, ItemRole, LandItem, LandLeaf, LandType, LandUsageType, LeafKind,
};
use super::ledger::CarbonFlowLedger;
use super::shares::{logit_shares, normalize_shares};
use super::{SMALL_NUMBER, TOTAL_LAND_INFLATION, UNMANAGED_LAND_CHANGE_TOLERANCE};
use is_close::is_close;
use petgraph::graph::NodeIndex;
use petgraph::{Direction, Graph};
use rlam_core::errors::RLAMResult;
use rlam_core::info::RegionInfo;
use rlam_core::modeltime::ModelTime;
use rlam_core::timeseries::{FloatValue, Period, PeriodVector, Year, YearVector};
use std::collections::{HashMap, VecDeque};
use tracing::{debug, error, warn};

/// Correction applied when calibrated managed land exceeds the declared total
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TotalLandAdjustment {
    /// Declared total before the correction
    pub previous: FloatValue,
    pub managed: FloatValue,
    /// New total land
    pub adjusted: FloatValue,
}

/// Root of the land allocation tree.
///
/// Owns every land item, the declared total land per period and the record
/// of which years have had their land-use-change carbon calculated.
#[derive(Debug, Clone)]
pub struct LandAllocator {
    graph: Graph<LandItem, ()>,
    root: NodeIndex,
    /// Items by name in breadth-first order
    index: HashMap<String, Vec<NodeIndex>>,
    periods: usize,
    cal_data_exists: PeriodVector<bool>,
    carbon_start_year: Year,
    calculated: YearVector<bool>,
    luc_emissions: YearVector<FloatValue>,
}

impl LandAllocator {
    pub(crate) fn new(
        root: LandItem,
        periods: usize,
        carbon_start_year: Year,
        end_year: Year,
    ) -> Self {
        let mut graph = Graph::new();
        let root = graph.add_node(root);
        let mut allocator = Self {
            graph,
            root,
            index: HashMap::new(),
            periods,
            cal_data_exists: PeriodVector::new(periods),
            carbon_start_year,
            calculated: YearVector::new(carbon_start_year, end_year),
            luc_emissions: YearVector::new(carbon_start_year, end_year),
        };
        allocator.rebuild_index();
        allocator
    }

    pub(crate) fn add_item(&mut self, parent: NodeIndex, item: LandItem) -> NodeIndex {
        let name = item.name.clone();
        let idx = self.graph.add_node(item);
        self.graph.add_edge(parent, idx, ());
        self.index.entry(name).or_default().push(idx);
        idx
    }

    pub(crate) fn rebuild_index(&mut self) {
        let mut index: HashMap<String, Vec<NodeIndex>> = HashMap::new();
        for idx in self.bfs(self.root) {
            index
                .entry(self.graph[idx].name.clone())
                .or_default()
                .push(idx);
        }
        self.index = index;
    }

    pub(crate) fn set_cal_data_exists(&mut self, period: Period) {
        self.cal_data_exists[period] = true;
    }

    pub fn name(&self) -> &str {
        &self.graph[self.root].name
    }

    pub fn root(&self) -> NodeIndex {
        self.root
    }

    pub fn item(&self, idx: NodeIndex) -> &LandItem {
        &self.graph[idx]
    }

    pub fn periods(&self) -> usize {
        self.periods
    }

    pub fn carbon_start_year(&self) -> Year {
        self.carbon_start_year
    }

    pub fn cal_data_exists(&self, period: Period) -> bool {
        self.cal_data_exists[period]
    }

    /// Total land of the region in `period`
    pub fn declared_total_land(&self, period: Period) -> FloatValue {
        self.graph[self.root].land_allocation[period]
    }

    /// Whether the carbon flows of `year` are final
    pub fn is_calculated(&self, year: Year) -> bool {
        self.calculated.get(year).copied().unwrap_or(false)
    }

    /// Net land-use-change emission of the region in `year`
    pub fn luc_emissions(&self, year: Year) -> Option<FloatValue> {
        self.luc_emissions.get(year).copied()
    }

    /// Children of an item in the order they were added
    pub fn children(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut children: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .collect();
        children.sort();
        children
    }

    pub fn parent(&self, idx: NodeIndex) -> Option<NodeIndex> {
        self.graph
            .neighbors_directed(idx, Direction::Incoming)
            .next()
    }

    /// Breadth-first order of the subtree starting at `start`.
    ///
    /// Siblings are visited in insertion order, which `petgraph::visit::Bfs`
    /// does not guarantee as it walks the adjacency list newest first.
    pub fn bfs(&self, start: NodeIndex) -> Vec<NodeIndex> {
        let mut order = Vec::new();
        let mut queue = VecDeque::from([start]);
        while let Some(idx) = queue.pop_front() {
            order.push(idx);
            queue.extend(self.children(idx));
        }
        order
    }

    pub fn leaves(&self) -> Vec<NodeIndex> {
        self.bfs(self.root)
            .into_iter()
            .filter(|idx| self.graph[*idx].is_leaf())
            .collect()
    }

    fn find_in_subtree(
        &self,
        start: NodeIndex,
        predicate: impl Fn(&LandItem) -> bool,
    ) -> Option<NodeIndex> {
        self.bfs(start)
            .into_iter()
            .find(|idx| predicate(&self.graph[*idx]))
    }

    /// First item named `name` matching `kind`, in breadth-first order
    pub fn find_child(&self, name: &str, kind: ItemKind) -> Option<NodeIndex> {
        self.index
            .get(name)?
            .iter()
            .copied()
            .find(|idx| self.graph[*idx].matches(kind))
    }

    /// Leaf holding `product` within the node of `land_type`.
    ///
    /// A leaf named like the land type itself is used when there is no such node.
    pub fn find_product(&self, land_type: &str, product: &str) -> Option<NodeIndex> {
        let Some(node) = self.find_child(land_type, ItemKind::Node) else {
            return self.find_child(land_type, ItemKind::Leaf);
        };
        self.index
            .get(product)?
            .iter()
            .copied()
            .filter(|idx| self.graph[*idx].is_leaf())
            .find(|idx| self.is_below(*idx, node))
    }

    /// Whether `ancestor` is on the path from `idx` to the root
    fn is_below(&self, idx: NodeIndex, ancestor: NodeIndex) -> bool {
        let mut current = idx;
        while let Some(parent) = self.parent(current) {
            if parent == ancestor {
                return true;
            }
            current = parent;
        }
        false
    }

    fn find_product_or_warn(&self, land_type: &str, product: &str) -> Option<NodeIndex> {
        let found = self.find_product(land_type, product);
        if found.is_none() {
            warn!(land_type, product, "Land type or product does not exist");
        }
        found
    }

    /// Conceptual root of the nest containing `land_type`.
    ///
    /// Walks upward from the item until its parent has a sigma of zero or the
    /// root is reached.
    pub fn find_parent_of_type(&self, land_type: &str) -> Option<NodeIndex> {
        let mut item = self.find_child(land_type, ItemKind::Any)?;
        while let Some(parent) = self.parent(item) {
            if self.graph[parent].sigma() <= SMALL_NUMBER {
                break;
            }
            item = parent;
        }
        Some(item)
    }

    /// Sum of leaf allocations of the given type
    pub fn total_land_allocation(&self, land_type: LandType, period: Period) -> FloatValue {
        let is_type = |item: &LandItem| item.as_leaf().is_some_and(|leaf| leaf.matches(land_type));
        self.leaves()
            .into_iter()
            .map(|idx| &self.graph[idx])
            .filter(|item| is_type(item))
            .map(|item| item.land_allocation[period])
            .sum()
    }

    /// Validate the tree and calibrate every period.
    ///
    /// Configuration problems are logged and never abort the run.
    pub fn complete_init(
        &mut self,
        region: &str,
        info: &dyn RegionInfo,
        modeltime: &dyn ModelTime,
    ) {
        self.check_rotation_period(info, modeltime);

        for idx in self.bfs(self.root) {
            let has_children = !self.children(idx).is_empty();
            let item = &mut self.graph[idx];
            let name = item.name.clone();
            if let Some(node) = item.as_node_mut() {
                if !has_children {
                    warn!(region, node = %name, "Land node has no children");
                }
                if node.sigma < 0.0 {
                    warn!(region, node = %name, sigma = node.sigma, "Negative sigma set to zero");
                    node.sigma = 0.0;
                }
            }
        }

        for period in 0..self.periods {
            self.reset_to_calibration_data(region, period);
        }
    }

    fn check_rotation_period(&self, info: &dyn RegionInfo, modeltime: &dyn ModelTime) {
        let periods = modeltime.max_period();
        for period in 1..periods {
            if modeltime.timestep(period) != modeltime.timestep(period - 1) {
                warn!("All time steps are not constant.");
            }
        }

        let rotation_period = info.get_integer("rotationPeriod", true);
        for period in 0..periods {
            let timestep = modeltime.timestep(period);
            if timestep != 0 && rotation_period % timestep != 0 {
                debug!(
                    period,
                    rotation_period, "Rotation period is not evenly divisible by time step"
                );
            }
        }
    }

    pub fn init_calc(&mut self, region: &str, period: Period) {
        self.reset_to_calibration_data(region, period);
    }

    /// Reset allocations, shares and yield modes to the calibration data of
    /// `period`. Periods without calibration data are left untouched.
    pub fn reset_to_calibration_data(&mut self, region: &str, period: Period) {
        if !self.cal_data_exists[period] {
            return;
        }
        self.reset_to_cal_land_allocation(period);
        self.adjust_total_land(period);

        // Unmanaged land in the base period is taken as read in
        if period > 0 {
            let total = self.declared_total_land(period);
            let unmanaged = total - self.total_land_allocation(LandType::Managed, period);
            let previous = self.total_land_allocation(LandType::Unmanaged, period);
            let reduction = previous - unmanaged;
            if reduction.abs() > UNMANAGED_LAND_CHANGE_TOLERANCE * unmanaged {
                warn!(
                    region,
                    period,
                    reduction,
                    fraction = reduction / unmanaged,
                    "Unmanaged land was reduced"
                );
            }

            if self.set_unmanaged_land_allocation(region, unmanaged, period) {
                debug_assert!(is_close!(
                    self.total_land_allocation(LandType::Any, period),
                    total,
                    abs_tol = SMALL_NUMBER
                ));
                debug_assert!(is_close!(
                    self.total_land_allocation(LandType::Unmanaged, period),
                    unmanaged,
                    abs_tol = SMALL_NUMBER
                ));
                debug_assert!(is_close!(
                    self.total_land_allocation(LandType::Managed, period),
                    total - unmanaged,
                    abs_tol = SMALL_NUMBER
                ));
            }
        }

        self.set_init_shares(period);
        self.set_intrinsic_yield_mode(period);
    }

    /// Calibrated leaves take their calibrated allocation and unmanaged leaves
    /// their read-in allocation. Node totals are re-summed.
    pub fn reset_to_cal_land_allocation(&mut self, period: Period) {
        for idx in self.leaves() {
            let item = &mut self.graph[idx];
            let value = item.as_leaf().and_then(|leaf| match leaf.kind {
                LeafKind::Unmanaged => Some(leaf.base_land_allocation[period]),
                _ => leaf.cal_land_allocation[period],
            });
            if let Some(value) = value {
                item.land_allocation[period] = value;
            }
        }
        self.sum_node_allocations(self.root, period);
    }

    /// Raise the total land to the managed land plus 20% when calibrated
    /// managed land exceeds it.
    pub fn adjust_total_land(&mut self, period: Period) -> Option<TotalLandAdjustment> {
        let managed = self.total_land_allocation(LandType::Managed, period);
        let total = self.declared_total_land(period);
        let overrun = managed - total;
        if overrun <= SMALL_NUMBER {
            return None;
        }

        debug!(
            period,
            total,
            overrun,
            percent = 100.0 * overrun / total,
            "The total managed land allocated is greater than the total land value"
        );
        warn!(
            period,
            "Total land value set to total managed land plus 20%"
        );

        let adjusted = managed * TOTAL_LAND_INFLATION;
        self.graph[self.root].land_allocation[period] = adjusted;
        Some(TotalLandAdjustment {
            previous: total,
            managed,
            adjusted,
        })
    }

    /// Distribute `unmanaged_land` over the unmanaged leaves weighted by their
    /// read-in allocations.
    ///
    /// Returns false when the tree has no unmanaged land.
    fn set_unmanaged_land_allocation(
        &mut self,
        region: &str,
        unmanaged_land: FloatValue,
        period: Period,
    ) -> bool {
        let leaves: Vec<NodeIndex> = self
            .leaves()
            .into_iter()
            .filter(|idx| {
                self.graph[*idx]
                    .as_leaf()
                    .is_some_and(|leaf| leaf.kind == LeafKind::Unmanaged)
            })
            .collect();
        if leaves.is_empty() {
            warn!(region, period, "No unmanaged land to reallocate");
            return false;
        }

        let weights: Vec<FloatValue> = leaves
            .iter()
            .map(|idx| {
                self.graph[*idx]
                    .as_leaf()
                    .map_or(0.0, |leaf| leaf.base_land_allocation[period])
            })
            .collect();
        let total_weight: FloatValue = weights.iter().sum();
        let count = leaves.len() as FloatValue;

        for (idx, weight) in leaves.into_iter().zip(weights) {
            self.graph[idx].land_allocation[period] = if total_weight > 0.0 {
                unmanaged_land * weight / total_weight
            } else {
                unmanaged_land / count
            };
        }
        self.sum_node_allocations(self.root, period);
        true
    }

    /// Re-sum node allocations from their leaves. The root keeps its declared total.
    fn sum_node_allocations(&mut self, idx: NodeIndex, period: Period) -> FloatValue {
        if self.graph[idx].is_leaf() {
            return self.graph[idx].land_allocation[period];
        }
        let total: FloatValue = self
            .children(idx)
            .into_iter()
            .map(|child| self.sum_node_allocations(child, period))
            .sum();
        if idx != self.root {
            self.graph[idx].land_allocation[period] = total;
        }
        total
    }

    /// Shares from the current allocations, with land-use history handed down
    /// to the leaves. The root's share is 1.
    pub fn set_init_shares(&mut self, period: Period) {
        self.set_unmanaged_land_values(period);

        let root = self.root;
        let total = self.graph[root].land_allocation[period];
        let history = self.graph[root]
            .as_node()
            .and_then(|node| node.land_use_history.clone());
        for child in self.children(root) {
            self.set_item_init_shares(child, total, 1.0, history.as_ref(), period);
        }
        self.graph[root].share[period] = 1.0;
    }

    fn set_item_init_shares(
        &mut self,
        idx: NodeIndex,
        land_above: FloatValue,
        parent_history_share: FloatValue,
        parent_history: Option<&LandUseHistory>,
        period: Period,
    ) {
        let item = &mut self.graph[idx];
        let allocation = item.land_allocation[period];
        let share = if land_above > 0.0 {
            allocation / land_above
        } else {
            0.0
        };
        item.share[period] = share;

        if let Some(leaf) = item.as_leaf_mut() {
            let Some(history) = parent_history else {
                return;
            };
            let first_seen = leaf
                .inherited_history
                .as_ref()
                .map_or(true, |inherited| period <= inherited.period);
            if leaf.land_use_history.is_none() && first_seen {
                leaf.inherited_history = Some(InheritedHistory {
                    history: history.clone(),
                    share: parent_history_share * share,
                    period,
                });
            }
            return;
        }

        let own_history = item
            .as_node()
            .and_then(|node| node.land_use_history.clone());
        let (history_share, history) = match own_history {
            Some(own) => (1.0, Some(own)),
            None => (parent_history_share * share, parent_history.cloned()),
        };
        for child in self.children(idx) {
            self.set_item_init_shares(child, allocation, history_share, history.as_ref(), period);
        }
    }

    /// Derive intrinsic yield modes from the calibrated shares, starting from a
    /// rate of 1 at the root
    pub fn set_intrinsic_yield_mode(&mut self, period: Period) {
        let root = self.root;
        let sigma = self.graph[root].sigma();
        self.graph[root].intrinsic_yield_mode[period] = 1.0;
        for child in self.children(root) {
            self.set_item_intrinsic_yield_mode(child, 1.0, sigma, period);
        }
    }

    fn set_item_intrinsic_yield_mode(
        &mut self,
        idx: NodeIndex,
        rate_above: FloatValue,
        sigma_above: FloatValue,
        period: Period,
    ) {
        let item = &mut self.graph[idx];
        let mut rate = rate_above;
        if sigma_above > 0.0 {
            rate *= item.share[period].powf(sigma_above);
        }

        let mode = match &item.role {
            ItemRole::Node(_) => rate,
            ItemRole::Leaf(leaf) if leaf.kind == LeafKind::Unmanaged => rate,
            ItemRole::Leaf(leaf) => match leaf.cal_observed_yield[period] {
                Some(observed) if rate > 0.0 => observed / rate,
                _ => 0.0,
            },
        };
        item.intrinsic_yield_mode[period] = mode;

        if let Some(sigma) = item.as_node().map(|node| node.sigma) {
            for child in self.children(idx) {
                self.set_item_intrinsic_yield_mode(child, rate, sigma, period);
            }
        }
    }

    /// Intrinsic rates of unmanaged leaves from the value of their nest
    pub fn set_unmanaged_land_values(&mut self, period: Period) {
        let nests: Vec<NodeIndex> = self
            .bfs(self.root)
            .into_iter()
            .filter(|idx| self.graph[*idx].is_unmanaged_nest())
            .collect();

        for nest in nests {
            let value = self.graph[nest]
                .as_node()
                .map_or(0.0, |node| node.unmanaged_land_value);
            for child in self.children(nest) {
                let item = &mut self.graph[child];
                let unmanaged = item
                    .as_leaf()
                    .is_some_and(|leaf| leaf.kind == LeafKind::Unmanaged);
                if unmanaged {
                    item.intrinsic_rate[period] =
                        value * item.intrinsic_yield_mode.latest_positive(period);
                }
            }
        }
    }

    /// Compute the share of every item in `period`. Returns the root share of 1.
    pub fn calc_land_shares(&mut self, region: &str, period: Period) -> FloatValue {
        self.set_unmanaged_land_values(period);
        self.calc_node_shares(self.root, region, period);
        self.graph[self.root].share[period] = 1.0;
        1.0
    }

    /// Set the shares of a node's children and return the node's aggregate rate
    fn calc_node_shares(&mut self, idx: NodeIndex, region: &str, period: Period) -> FloatValue {
        let children = self.children(idx);
        let mut rates = Vec::with_capacity(children.len());
        for child in &children {
            let rate = if self.graph[*child].is_leaf() {
                self.graph[*child].intrinsic_rate[period]
            } else {
                self.calc_node_shares(*child, region, period)
            };
            rates.push(rate);
        }

        let sigma = self.graph[idx].sigma();
        if sigma > SMALL_NUMBER {
            if let Some((shares, rate)) = logit_shares(&rates, sigma) {
                for (child, share) in children.iter().zip(shares) {
                    self.graph[*child].share[period] = share;
                }
                self.graph[idx].intrinsic_rate[period] = rate;
                return rate;
            }
            if !children.is_empty() {
                let name = &self.graph[idx].name;
                warn!(
                    region,
                    period,
                    node = %name,
                    "All intrinsic rates are zero, keeping calibrated shares"
                );
            }
        }

        let shares = self.calibrated_shares(&children, period);
        let mut rate = 0.0;
        for ((child, share), child_rate) in children.iter().zip(shares).zip(&rates) {
            self.graph[*child].share[period] = share;
            rate += share * child_rate;
        }
        self.graph[idx].intrinsic_rate[period] = rate;
        rate
    }

    /// Shares of the most recent period at or before `period` that has any,
    /// normalized to sum to one
    fn calibrated_shares(&self, children: &[NodeIndex], period: Period) -> Vec<FloatValue> {
        for previous in (0..=period).rev() {
            let shares: Vec<FloatValue> = children
                .iter()
                .map(|child| self.graph[*child].share[previous])
                .collect();
            if let Some(shares) = normalize_shares(&shares) {
                return shares;
            }
        }
        vec![1.0 / children.len().max(1) as FloatValue; children.len()]
    }

    /// Convert shares into land areas, starting from the declared total
    pub fn calc_land_allocation(&mut self, period: Period) {
        let root = self.root;
        let total = self.graph[root].land_allocation[period];
        for child in self.children(root) {
            self.calc_item_land_allocation(child, total, period);
        }
    }

    fn calc_item_land_allocation(
        &mut self,
        idx: NodeIndex,
        land_above: FloatValue,
        period: Period,
    ) {
        let allocation = self.graph[idx].share[period] * land_above;
        self.graph[idx].land_allocation[period] = allocation;
        for child in self.children(idx) {
            self.calc_item_land_allocation(child, allocation, period);
        }
    }

    /// Final shares and allocations for `period`, followed by the land-use
    /// change carbon of every year that is due.
    ///
    /// Years up to the previous period are calculated once. The years of the
    /// current time step are recalculated on every call.
    pub fn calc_final_land_allocation(
        &mut self,
        region: &str,
        period: Period,
        modeltime: &dyn ModelTime,
        ledger: &mut CarbonFlowLedger,
    ) -> RLAMResult<()> {
        self.calc_land_shares(region, period);
        self.calc_land_allocation(period);

        let year = modeltime.period_to_year(period);
        let timestep = modeltime.timestep(period);
        for previous in self.carbon_start_year..=(year - timestep) {
            if !self.calculated[previous] {
                self.calc_carbon_year(previous, modeltime, ledger)?;
                self.calculated[previous] = true;
            }
        }

        let start = (year - modeltime.timestep(modeltime.year_to_period(year)) + 1)
            .max(self.carbon_start_year);
        for current in start..=year {
            self.calc_carbon_year(current, modeltime, ledger)?;
        }
        Ok(())
    }

    /// Run the carbon phases of one year. Every leaf completes a phase before
    /// the next phase starts.
    fn calc_carbon_year(
        &mut self,
        year: Year,
        modeltime: &dyn ModelTime,
        ledger: &mut CarbonFlowLedger,
    ) -> RLAMResult<FloatValue> {
        let leaves = self.leaves();
        let period = modeltime.year_to_period(year);
        ledger.reset(year);

        for idx in &leaves {
            let item = &mut self.graph[*idx];
            let land = item.land_in_year(year, modeltime);
            let previous_land = item.land_in_year(year - 1, modeltime);
            if let Some(leaf) = item.as_leaf_mut() {
                leaf.carbon
                    .calc_flows_out(year, land, previous_land, period, ledger);
            }
        }

        for idx in &leaves {
            if let Some(leaf) = self.graph[*idx].as_leaf_mut() {
                leaf.carbon.calc_flows_in(year, ledger);
            }
        }

        for idx in &leaves {
            let item = &mut self.graph[*idx];
            let land = item.land_in_year(year, modeltime);
            if let Some(leaf) = item.as_leaf_mut() {
                leaf.carbon.calc_box_model(year, land, period, ledger);
            }
        }

        let emission = ledger.net_emission(year)?;
        self.luc_emissions[year] = emission;
        Ok(emission)
    }

    /// Add a production leaf to the node of `land_type`.
    ///
    /// Returns the leaf, or `None` when the land type does not exist.
    pub fn add_land_usage(
        &mut self,
        land_type: &str,
        product: &str,
        usage_type: LandUsageType,
    ) -> Option<NodeIndex> {
        let Some(parent) = self.find_child(land_type, ItemKind::Node) else {
            warn!(
                land_type,
                product, "Cannot add a land usage as the land type does not exist"
            );
            return None;
        };
        if let Some(existing) = self.find_product(land_type, product) {
            return Some(existing);
        }

        let carbon = LandCarbon::new(
            CarbonParameters::default(),
            PeriodVector::new(self.periods),
            PeriodVector::new(self.periods),
            self.carbon_start_year,
            self.calculated.end_year(),
        );
        let leaf = LandLeaf::new(usage_type.into(), self.periods, carbon);
        let item = LandItem::new(product, self.periods, ItemRole::Leaf(leaf));
        Some(self.add_item(parent, item))
    }

    pub fn get_land_allocation(
        &self,
        land_type: &str,
        product: &str,
        period: Period,
    ) -> FloatValue {
        self.find_product_or_warn(land_type, product)
            .map_or(0.0, |idx| self.graph[idx].land_allocation[period])
    }

    /// Compound a productivity change over the time step of `harvest_period`
    pub fn apply_ag_prod_change(
        &mut self,
        land_type: &str,
        product: &str,
        ag_prod_change: FloatValue,
        harvest_period: Period,
        modeltime: &dyn ModelTime,
    ) {
        let Some(idx) = self.find_product_or_warn(land_type, product) else {
            return;
        };
        let timestep = modeltime.timestep(harvest_period);
        if let Some(leaf) = self.graph[idx].as_leaf_mut() {
            let previous = match harvest_period {
                0 => 1.0,
                p => leaf.ag_prod_multiplier[p - 1],
            };
            leaf.ag_prod_multiplier[harvest_period] =
                previous * (1.0 + ag_prod_change).powi(timestep);
        }
    }

    /// Set the intrinsic rate of a product from its profit and derive its yield
    pub fn calc_yield(
        &mut self,
        land_type: &str,
        product: &str,
        region: &str,
        profit_rate: FloatValue,
        harvest_period: Period,
        current_period: Period,
    ) {
        let Some(subtree_root) = self.find_parent_of_type(land_type) else {
            warn!(
                region,
                land_type, product, "Land type or product does not exist"
            );
            return;
        };
        let Some(idx) = self.find_product_or_warn(land_type, product) else {
            return;
        };

        let average_rate = self.graph[subtree_root].intrinsic_rate[current_period];
        let item = &mut self.graph[idx];
        item.intrinsic_rate[current_period] = profit_rate.max(0.0);
        let yield_mode = item.intrinsic_yield_mode.latest_positive(current_period);

        if let Some(leaf) = item.as_leaf_mut() {
            let crop_yield = match leaf.cal_observed_yield[current_period] {
                Some(observed) => observed,
                None => yield_mode * average_rate * leaf.ag_prod_multiplier[harvest_period],
            };
            leaf.yields[harvest_period] = crop_yield;
            debug!(region, land_type, product, crop_yield, "Calculated yield");
        }
    }

    pub fn get_yield(&self, land_type: &str, product: &str, period: Period) -> FloatValue {
        self.find_product_or_warn(land_type, product)
            .and_then(|idx| self.graph[idx].as_leaf())
            .map_or(0.0, |leaf| leaf.yields[period])
    }

    /// Record calibrated land for a product. Marks `current_period` as
    /// calibrated even when the product does not exist.
    pub fn set_cal_land_allocation(
        &mut self,
        land_type: &str,
        product: &str,
        cal_land_used: FloatValue,
        harvest_period: Period,
        current_period: Period,
    ) {
        self.cal_data_exists[current_period] = true;
        let Some(idx) = self.find_product_or_warn(land_type, product) else {
            return;
        };
        if let Some(leaf) = self.graph[idx].as_leaf_mut() {
            leaf.cal_land_allocation[harvest_period] = Some(cal_land_used);
        }
    }

    pub fn set_cal_observed_yield(
        &mut self,
        land_type: &str,
        product: &str,
        cal_observed_yield: FloatValue,
        period: Period,
    ) {
        let Some(idx) = self.find_product_or_warn(land_type, product) else {
            return;
        };
        if let Some(leaf) = self.graph[idx].as_leaf_mut() {
            leaf.cal_observed_yield[period] = Some(cal_observed_yield);
        }
    }

    pub fn set_intrinsic_rate(
        &mut self,
        land_type: &str,
        product: &str,
        intrinsic_rate: FloatValue,
        period: Period,
    ) {
        if let Some(idx) = self.find_product_or_warn(land_type, product) {
            self.graph[idx].intrinsic_rate[period] = intrinsic_rate;
        }
    }

    /// Carbon densities of a product from `period` onward
    pub fn set_carbon_content(
        &mut self,
        land_type: &str,
        product: &str,
        above_ground_carbon: FloatValue,
        below_ground_carbon: FloatValue,
        period: Period,
    ) {
        let Some(idx) = self.find_product_or_warn(land_type, product) else {
            return;
        };
        if let Some(leaf) = self.graph[idx].as_leaf_mut() {
            leaf.carbon
                .set_carbon_content(above_ground_carbon, below_ground_carbon, period);
        }
    }

    /// Calibrated average observed rate of the nest containing `land_type`,
    /// derived from the intrinsic rate of its unmanaged land nest.
    ///
    /// Returns 1 when the land type or the unmanaged nest does not exist.
    pub fn get_unmanaged_cal_ave_observed_rate(
        &self,
        period: Period,
        land_type: &str,
    ) -> FloatValue {
        let Some(subtree_root) = self.find_parent_of_type(land_type) else {
            return 1.0;
        };
        let Some(mut nest) = self.find_in_subtree(subtree_root, LandItem::is_unmanaged_nest)
        else {
            error!(
                land_type,
                "There was no unmanaged node in the subtree for land type"
            );
            return 1.0;
        };

        let mut rate = self.graph[nest].intrinsic_rate[period];
        while nest != subtree_root {
            let Some(parent) = self.parent(nest) else {
                break;
            };
            rate /= self.graph[nest].share[period].powf(self.graph[parent].sigma());
            nest = parent;
        }
        rate
    }
}
