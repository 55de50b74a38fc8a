//! Warmup traffic generation: configuration resolution, the rate-controlled
//! HTTP engine and the executor abstraction the controller talks to.

pub mod config;
pub mod context;
pub mod duration;
pub mod engine;
pub mod executor;
pub mod result;
pub mod stats;

pub use config::{WarmupConfig, WarmupConfigError, WarmupConfigResult};
pub use context::{CancelCause, CancelHandle, WarmupContext};
pub use engine::HttpWarmupExecutor;
pub use executor::{MockExecutor, NoopExecutor, WarmupExecutor};
pub use result::{WarmupError, WarmupResult};
