//! 共享基础设施
//!
//! 提供配置加载与日志初始化。

pub mod config;
pub mod observability;

pub use config::{AppConfig, ObservabilityConfig, SequenceConfig};
