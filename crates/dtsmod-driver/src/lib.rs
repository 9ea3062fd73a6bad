//! dtsmod driver library
//!
//! Plumbing around `dtsmod-core`: configuration loading, package root
//! discovery, declaration tree traversal, and the concurrent
//! clean → rewrite → write → manifest pipeline.

pub mod error;
pub mod package_json;
pub mod config;
pub mod walk;
pub mod build;

pub use error::{ConfigError, DriverError};
pub use config::{BuildConfig, PackageSpec};
pub use build::{BuildReport, Builder};
