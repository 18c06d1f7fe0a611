//! Generator configuration and protoc parameter parsing.

use crate::error::{Error, Result};
use crate::types::MapperOptions;

/// Configuration for stub generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorConfig {
    /// Annotate setter containers as `T::Hash`/`T::Array`
    pub generic_containers: bool,
    /// Omit `encode`/`decode`/`descriptor` and friends
    pub hide_common_methods: bool,
    /// Derive messages from `::Google::Protobuf::AbstractMessage`
    pub abstract_base: bool,
    /// Emit `_services_pb.rbi` files for gRPC services
    pub grpc: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            generic_containers: false,
            hide_common_methods: false,
            abstract_base: false,
            grpc: true,
        }
    }
}

impl GeneratorConfig {
    /// Creates a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether setter containers use generic annotations
    pub fn generic_containers(mut self, generic: bool) -> Self {
        self.generic_containers = generic;
        self
    }

    /// Sets whether the common class methods are omitted
    pub fn hide_common_methods(mut self, hide: bool) -> Self {
        self.hide_common_methods = hide;
        self
    }

    /// Sets whether messages derive from the abstract base class
    pub fn abstract_base(mut self, abstract_base: bool) -> Self {
        self.abstract_base = abstract_base;
        self
    }

    /// Sets whether service stubs are generated
    pub fn grpc(mut self, grpc: bool) -> Self {
        self.grpc = grpc;
        self
    }

    /// The subset of the config that affects type mapping
    pub fn mapper_options(&self) -> MapperOptions {
        MapperOptions::new().generic_containers(self.generic_containers)
    }

    /// Parses the comma-separated `key=value` parameter string protoc passes
    /// to plugins (`--rbi_opt=grpc=false,hide_common_methods=true`).
    ///
    /// A bare key means `key=true`. Unknown keys are rejected.
    pub fn from_parameter(parameter: &str) -> Result<Self> {
        let mut config = Self::default();

        for pair in parameter.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (key, value) = match pair.split_once('=') {
                Some((key, value)) => (key.trim(), value.trim()),
                None => (pair, "true"),
            };

            let flag = parse_bool(value).ok_or_else(|| {
                Error::invalid_parameter(key, format!("expected a boolean, got '{}'", value))
            })?;

            match key {
                "grpc" => config.grpc = flag,
                "hide_common_methods" => config.hide_common_methods = flag,
                "use_abstract_message" => config.abstract_base = flag,
                "use_generic_containers" => config.generic_containers = flag,
                _ => return Err(Error::invalid_parameter(key, "unknown parameter")),
            }
        }

        Ok(config)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = GeneratorConfig::from_parameter("").unwrap();
        assert_eq!(config, GeneratorConfig::default());
        assert!(config.grpc);
        assert!(!config.mapper_options().generic_containers);
    }

    #[test]
    fn test_parse_parameters() {
        let config = GeneratorConfig::from_parameter(
            "grpc=false, hide_common_methods=1,use_abstract_message,use_generic_containers=T",
        )
        .unwrap();
        assert_eq!(
            config,
            GeneratorConfig::new()
                .grpc(false)
                .hide_common_methods(true)
                .abstract_base(true)
                .generic_containers(true)
        );
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let err = GeneratorConfig::from_parameter("grpc=maybe").unwrap_err();
        assert!(err.to_string().contains("grpc"));

        let err = GeneratorConfig::from_parameter("paths=source_relative").unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { ref key, .. } if key == "paths"));
    }
}
