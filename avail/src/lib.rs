// The simulator as a program: configuration, the standard site layout, and a
// runner that feeds a parsed command script to the transaction manager one
// tick at a time. The binary in bin.rs is a thin shell over this.

mod config;
mod runner;
mod wiring;


pub use config::SimConfig;
pub use runner::{Simulation, Tally};
pub use wiring::{build_manager, build_sites, home_site, resource_name, specs_for};
