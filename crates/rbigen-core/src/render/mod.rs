//! RBI file rendering.
//!
//! ## Architecture
//!
//! Rendering walks each file with [`walk_file`] and hands every entity to a
//! [`StubWriter`]:
//!
//! 1. [`StatsWriter`] counts entities (for logging, and to decide whether a
//!    services file is needed)
//! 2. [`MessageStubWriter`] produces `<name>_pb.rbi`
//! 3. [`ServiceStubWriter`] produces `<name>_services_pb.rbi` when gRPC
//!    output is enabled and the file declares services

mod messages;
mod services;
mod writer;

use crate::config::GeneratorConfig;
use crate::error::Result;
use prost_reflect::FileDescriptor;
use std::fmt::Write as FmtWrite;
use tracing::debug;

pub use messages::MessageStubWriter;
pub use services::ServiceStubWriter;
pub use writer::{walk_file, StatsWriter, StubWriter};

/// Suffix of message stub files
pub const MESSAGES_SUFFIX: &str = "_pb.rbi";

/// Suffix of service stub files
pub const SERVICES_SUFFIX: &str = "_services_pb.rbi";

/// One rendered output file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Output path relative to the output root
    pub name: String,
    /// File contents
    pub content: String,
}

/// Renders the stub files for one proto file.
pub fn generate_file(file: &FileDescriptor, config: &GeneratorConfig) -> Result<Vec<GeneratedFile>> {
    let mut stats = StatsWriter::default();
    walk_file(file, &mut stats)?;
    debug!(
        "{}: {} messages, {} fields, {} enums, {} services, {} methods",
        file.name(),
        stats.message_count,
        stats.field_count,
        stats.enum_count,
        stats.service_count,
        stats.method_count
    );

    let mut content = String::new();
    walk_file(file, &mut MessageStubWriter::new(&mut content, config))?;
    let mut generated = vec![GeneratedFile {
        name: output_name(file.name(), MESSAGES_SUFFIX),
        content,
    }];

    if config.grpc && stats.service_count > 0 {
        let mut content = String::new();
        walk_file(file, &mut ServiceStubWriter::new(&mut content))?;
        generated.push(GeneratedFile {
            name: output_name(file.name(), SERVICES_SUFFIX),
            content,
        });
    }

    Ok(generated)
}

/// `foo/bar.proto` with suffix `_pb.rbi` becomes `foo/bar_pb.rbi`.
pub fn output_name(proto_name: &str, suffix: &str) -> String {
    let stem = proto_name.strip_suffix(".proto").unwrap_or(proto_name);
    format!("{}{}", stem, suffix)
}

pub(crate) fn write_header<W: FmtWrite + ?Sized>(writer: &mut W, source: &str) -> Result<()> {
    writeln!(writer, "# Code generated by protoc-gen-rbi. DO NOT EDIT.")?;
    writeln!(writer, "# source: {}", source)?;
    writeln!(writer, "# typed: strict")?;
    Ok(())
}

/// A group of lines rendered without blank lines between them
#[derive(Debug, Clone, Default)]
pub(crate) struct Block {
    lines: Vec<String>,
}

impl Block {
    pub(crate) fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }

    pub(crate) fn push(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub(crate) fn lines(&self) -> &[String] {
        &self.lines
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::*;

    fn service_pool() -> prost_reflect::DescriptorPool {
        let mut file = proto3_file("api/v1/echo.proto", "api.v1", vec![message("Ping", vec![])], vec![]);
        file.service.push(service(
            "Echo",
            vec![method("Ping", ".api.v1.Ping", ".api.v1.Ping", false, false)],
        ));
        pool(vec![file])
    }

    #[test]
    fn test_output_name() {
        assert_eq!(output_name("foo/bar.proto", MESSAGES_SUFFIX), "foo/bar_pb.rbi");
        assert_eq!(output_name("foo/bar.proto", SERVICES_SUFFIX), "foo/bar_services_pb.rbi");
        assert_eq!(output_name("odd", MESSAGES_SUFFIX), "odd_pb.rbi");
    }

    #[test]
    fn test_generate_file_with_services() {
        let pool = service_pool();
        let file = pool.get_file_by_name("api/v1/echo.proto").unwrap();

        let files = generate_file(&file, &GeneratorConfig::default()).unwrap();
        let names: Vec<_> = files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["api/v1/echo_pb.rbi", "api/v1/echo_services_pb.rbi"]);
        assert!(files[1].content.contains("module Api::V1::Echo\n"));

        let files = generate_file(&file, &GeneratorConfig::new().grpc(false)).unwrap();
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn test_generate_file_rejects_groups() {
        let pool = pool(vec![legacy_group_file()]);
        let file = pool.get_file_by_name("g.proto").unwrap();

        let err = generate_file(&file, &GeneratorConfig::default()).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(
            err,
            crate::Error::SchemaInvariantViolation { ref field, .. } if field == "g.Holder.legacy"
        ));
    }

    #[test]
    fn test_generate_file_without_services() {
        let pool = pool(vec![proto3_file("m.proto", "m", vec![message("Only", vec![])], vec![])]);
        let file = pool.get_file_by_name("m.proto").unwrap();
        let files = generate_file(&file, &GeneratorConfig::default()).unwrap();
        assert_eq!(files.len(), 1);
        assert!(files[0].content.starts_with("# Code generated by protoc-gen-rbi. DO NOT EDIT.\n"));
        assert!(!files[0].content.contains("def initialize"));
    }
}
