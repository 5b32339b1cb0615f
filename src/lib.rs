// Library exports for launch-planner
// This allows the modules to be imported in tests and by the binary

pub mod config;
pub mod planner;
pub mod record;
pub mod workers;
