//! Configuration: file/env settings and the resolved run environment

pub mod defaults;
mod environment;
mod settings;

pub use environment::{EnvironmentResolver, RunConfiguration};
pub use settings::HarnessConfig;
