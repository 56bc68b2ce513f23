#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

pub mod builder;
pub mod compressor;
pub mod config;
pub mod css;
pub mod error;
pub mod fileset;
pub mod manifest;
pub mod package;
pub mod registry;

pub use builder::{PackageBuilder, PackageOutcome};
pub use config::{AssetKind, PackageConfig, PartitionAssets};
pub use error::{PackageError, PackageResult};
pub use package::{Package, TargetOptions};
pub use registry::PackageRegistry;
