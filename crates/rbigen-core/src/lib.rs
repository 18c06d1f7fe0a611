//! # rbigen-core
//!
//! A library for deriving Sorbet RBI stubs from Protocol Buffer descriptors.
//!
//! `protoc --ruby_out` generates Ruby classes at runtime from embedded
//! descriptors, so Sorbet cannot see their accessors. This crate produces
//! the matching `.rbi` declarations:
//!
//! - [`naming`]: identifier casing and Ruby constant resolution
//! - [`types`]: field annotations per usage context and default literals
//! - [`render`]: walking a file and emitting `_pb.rbi`/`_services_pb.rbi`
//! - [`plugin`]: the protoc plugin request/response protocol
//! - [`config`]: generator options and protoc parameter parsing
//! - [`error`]: error types and handling
//!
//! ## Example
//!
//! ```no_run
//! use rbigen_core::{plugin, GeneratorConfig};
//! use prost_reflect::DescriptorPool;
//! use std::fs;
//!
//! // A descriptor set from `protoc --include_source_info -o set.pb ...`
//! let bytes = fs::read("set.pb")?;
//! let pool = DescriptorPool::decode(bytes.as_slice())?;
//!
//! let files = vec!["acme/widgets.proto".to_string()];
//! for generated in plugin::generate(&pool, &files, &GeneratorConfig::default())? {
//!     println!("{}:\n{}", generated.name, generated.content);
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Extensibility
//!
//! Implement [`StubWriter`] to emit something other than RBI from the same
//! descriptor walk.

#![deny(unsafe_code)]
#![warn(missing_docs, rust_2018_idioms, unreachable_pub)]

pub mod comments;
pub mod config;
pub mod error;
pub mod naming;
pub mod plugin;
pub mod render;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

// Re-export primary types for convenience
pub use config::GeneratorConfig;
pub use error::{Error, HazardReason, NamingHazard, Result};
pub use naming::{enclosing_modules, qualified_name, resolve_package, EntityParent, NamedEntity};
pub use render::{generate_file, GeneratedFile, StatsWriter, StubWriter};
pub use types::{
    default_value_for, method_param_type, method_return_type, type_for, FieldContext,
    MapperOptions,
};

/// Crate version for programmatic access
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
