//! `_services_pb.rbi` output: gRPC service and client stub classes.

use super::writer::StubWriter;
use super::write_header;
use crate::comments::{ruby_comment_lines, CommentIndex};
use crate::error::Result;
use crate::naming::{lower_snake_case, resolve_package, title_case, NAMESPACE_SEPARATOR};
use crate::types::{method_param_type, method_return_type};
use prost_reflect::{FileDescriptor, ServiceDescriptor};
use std::fmt::Write as FmtWrite;

/// Writes the gRPC stubs of a file
pub struct ServiceStubWriter<'a, W: FmtWrite> {
    writer: &'a mut W,
    comments: CommentIndex,
}

impl<'a, W: FmtWrite> ServiceStubWriter<'a, W> {
    /// Creates a writer emitting into `writer`
    pub fn new(writer: &'a mut W) -> Self {
        Self {
            writer,
            comments: CommentIndex::default(),
        }
    }
}

impl<W: FmtWrite> StubWriter for ServiceStubWriter<'_, W> {
    fn write_file(&mut self, file: &FileDescriptor) -> Result<()> {
        self.comments = CommentIndex::from_file(file.file_descriptor_proto());
        write_header(self.writer, file.name())
    }

    fn write_service(&mut self, service: &ServiceDescriptor) -> Result<()> {
        let package = resolve_package(&service.parent_file());
        let module = if package.is_empty() {
            title_case(service.name())
        } else {
            format!("{}{}{}", package, NAMESPACE_SEPARATOR, title_case(service.name()))
        };

        let w = &mut *self.writer;
        writeln!(w)?;
        if let Some(comment) = self.comments.leading(service.full_name()) {
            for line in ruby_comment_lines(comment, "") {
                writeln!(w, "{}", line)?;
            }
        }
        writeln!(w, "module {}", module)?;
        writeln!(w, "  class Service")?;
        writeln!(w, "    include ::GRPC::GenericService")?;
        writeln!(w, "  end")?;
        writeln!(w)?;
        writeln!(w, "  class Stub")?;
        writeln!(w, "    sig do")?;
        writeln!(w, "      params(")?;
        writeln!(w, "        host: String,")?;
        writeln!(w, "        creds: T.any(::GRPC::Core::ChannelCredentials, Symbol),")?;
        writeln!(w, "        kw: T.untyped")?;
        writeln!(w, "      ).void")?;
        writeln!(w, "    end")?;
        writeln!(w, "    def initialize(host, creds, **kw)")?;
        writeln!(w, "    end")?;

        for method in service.methods() {
            writeln!(w)?;
            if let Some(comment) = self.comments.leading(method.full_name()) {
                for line in ruby_comment_lines(comment, "    ") {
                    writeln!(w, "{}", line)?;
                }
            }
            writeln!(w, "    sig do")?;
            writeln!(w, "      params(")?;
            writeln!(w, "        request: {}", method_param_type(&method))?;
            writeln!(w, "      ).returns({})", method_return_type(&method))?;
            writeln!(w, "    end")?;
            writeln!(w, "    def {}(request)", lower_snake_case(method.name()))?;
            writeln!(w, "    end")?;
        }

        writeln!(w, "  end")?;
        writeln!(w, "end")?;
        Ok(())
    }
}
