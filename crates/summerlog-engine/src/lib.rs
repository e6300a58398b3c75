pub mod orchestrator;

pub use orchestrator::{Orchestrator, RunMode, RunReport};
