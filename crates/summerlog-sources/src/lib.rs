pub mod collector;
pub mod docker;
pub mod runtime;

pub use collector::LogCollector;
pub use docker::DockerCli;
pub use runtime::{ContainerRuntime, RuntimeError};
