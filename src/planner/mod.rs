//! Goal planning and sequential plan execution
//!
//! The parser turns a free-text goal into an ordered list of workers using a
//! fixed keyword table; the executor runs those workers one after another
//! over a shared [`Record`](crate::record::Record).

pub mod error;
pub mod executor;
pub mod parser;
pub mod types;

pub use error::PlanError;
pub use executor::{execute_plan, PlanExecutor};
pub use parser::{matched_triggers, parse_goal, trigger_phrases};
pub use types::{Plan, PlanEvent, WorkerId};
