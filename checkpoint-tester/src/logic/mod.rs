pub mod policy;
pub mod reports;
pub mod scenarios;
pub mod seeds;
pub mod shift_runner;
pub mod tester;

pub use scenarios::{find_scenario, list_scenarios};
pub use seeds::{SeedInfo, resolve_seed_inputs};
pub use shift_runner::ShiftRunner;
pub use tester::*;
