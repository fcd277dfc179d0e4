//! # Gateway Runtime Library
//!
//! Wiring for the TutorQ gateway process. The entry point is the
//! `tutorq-gateway` binary; the modules are exposed for integration tests.
//!
//! ## Components
//!
//! - `config` - environment configuration and validation
//! - `container` - shared components (registry, stores, broker, name index)
//! - `queue_ops` - queue mutations that announce themselves on the broker
//! - `observer` - notifier hooks backed by Prometheus metrics
//! - `runtime` - startup, HTTP surface, graceful shutdown

#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod config;
pub mod container;
pub mod observer;
pub mod queue_ops;
pub mod runtime;

pub use config::{ConfigError, GatewayConfig, DEFAULT_ADDR, DEFAULT_BROKER_CAPACITY, DEFAULT_WS_PATH};
pub use container::{GatewayContainer, GatewayNameIndex};
pub use observer::MetricsObserver;
pub use queue_ops::QueueWriter;
pub use runtime::{GatewayRuntime, SHUTDOWN_GRACE};
