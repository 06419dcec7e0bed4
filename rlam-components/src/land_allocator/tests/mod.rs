//! Tests of the land allocator against a small calibrated region.
//!
//! The region has 100 units of land over three periods (2000, 2005, 2010):
//! a cropland nest calibrated in the first two periods and an unmanaged nest
//! whose land is whatever cropland leaves over.


use super::*;
use approx::assert_relative_eq;
use rlam_core::info::Info;
use rlam_core::modeltime::Modeltime;
use rlam_core::timeseries::{FloatValue, Period};
use std::io;
use std::sync::{Arc, Mutex};

pub(super) const REGION: &str = "USA";

pub(super) fn modeltime() -> Modeltime {
    Modeltime::uniform(2000, 2010, 5).unwrap()
}

pub(super) fn info() -> Info {
    Info::new(REGION).with_integer("rotationPeriod", 30)
}

fn leaf(
    name: &str,
    kind: LeafKind,
    land_allocation: &[FloatValue],
    above_ground_carbon: FloatValue,
    below_ground_carbon: FloatValue,
) -> LandItemInput {
    LandItemInput::Leaf(LandLeafInput {
        name: name.to_string(),
        kind,
        land_allocation: land_allocation.to_vec(),
        observed_yield: vec![],
        above_ground_carbon: vec![above_ground_carbon],
        below_ground_carbon: vec![below_ground_carbon],
        carbon: CarbonParameters::default(),
        land_use_history: None,
    })
}

pub(super) fn input_with_sigmas(
    root_sigma: FloatValue,
    cropland_sigma: FloatValue,
) -> LandAllocatorInput {
    LandAllocatorInput {
        name: "root".to_string(),
        sigma: root_sigma,
        land_allocation: vec![100.0],
        land_use_history: None,
        carbon_start_year: 1995,
        children: vec![
            LandItemInput::Node(LandNodeInput {
                name: "Cropland".to_string(),
                sigma: cropland_sigma,
                unmanaged_land_value: 0.0,
                land_use_history: None,
                children: vec![
                    leaf("Corn", LeafKind::Crop, &[20.0, 22.0], 5.0, 80.0),
                    leaf("Wheat", LeafKind::Crop, &[10.0, 12.0], 5.0, 80.0),
                ],
            }),
            LandItemInput::Node(LandNodeInput {
                name: "UnmanagedLand".to_string(),
                sigma: 0.5,
                unmanaged_land_value: 1.0,
                land_use_history: None,
                children: vec![
                    leaf("Forest", LeafKind::Unmanaged, &[42.0], 150.0, 100.0),
                    leaf("Grassland", LeafKind::Unmanaged, &[28.0], 20.0, 120.0),
                ],
            }),
        ],
    }
}

pub(super) fn input() -> LandAllocatorInput {
    input_with_sigmas(0.0, 0.5)
}

pub(super) fn build(input: &LandAllocatorInput) -> LandAllocator {
    let modeltime = modeltime();
    let mut allocator = LandAllocator::from_input(input, &modeltime).unwrap();
    allocator.complete_init(REGION, &info(), &modeltime);
    allocator
}

pub(super) fn allocator() -> LandAllocator {
    build(&input())
}

/// Calibrate and solve `periods` in order
pub(super) fn run(
    allocator: &mut LandAllocator,
    periods: std::ops::Range<Period>,
    ledger: &mut CarbonFlowLedger,
) {
    let modeltime = modeltime();
    for period in periods {
        allocator.init_calc(REGION, period);
        allocator
            .calc_final_land_allocation(REGION, period, &modeltime, ledger)
            .unwrap();
    }
}

/// Every node's allocation equals the sum of its children's
pub(super) fn assert_conserved(allocator: &LandAllocator, period: Period) {
    for idx in allocator.bfs(allocator.root()) {
        let children = allocator.children(idx);
        if children.is_empty() {
            continue;
        }
        let total: FloatValue = children
            .iter()
            .map(|child| allocator.item(*child).land_allocation(period))
            .sum();
        assert_relative_eq!(
            total,
            allocator.item(idx).land_allocation(period),
            epsilon = 1e-9
        );
    }
}

pub(super) fn allocation(
    allocator: &LandAllocator,
    land_type: &str,
    product: &str,
    period: Period,
) -> FloatValue {
    allocator.get_land_allocation(land_type, product, period)
}

struct LogWriter(Arc<Mutex<Vec<u8>>>);

impl io::Write for LogWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a subscriber that records every event down to debug level
pub(super) fn capture_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let buffer = Arc::new(Mutex::new(Vec::new()));
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_ansi(false)
        .with_writer(move || LogWriter(writer.clone()))
        .finish();

    let result = tracing::subscriber::with_default(subscriber, f);
    let logs = String::from_utf8_lossy(&buffer.lock().unwrap()).into_owned();
    (result, logs)
}
