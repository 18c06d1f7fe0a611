//! `_pb.rbi` output: message classes and enum modules.

use super::writer::StubWriter;
use super::{write_header, Block};
use crate::comments::{ruby_comment_lines, CommentIndex};
use crate::config::GeneratorConfig;
use crate::error::Result;
use crate::naming::{enclosing_modules, qualified_name};
use crate::types::{
    constructor_shape, declared_fields, is_synthetic_oneof, type_for, ConstructorShape, FieldContext,
};
use prost_reflect::{EnumDescriptor, FieldDescriptor, FileDescriptor, MessageDescriptor};
use std::fmt::Write as FmtWrite;
use tracing::{debug, trace};

const INDENT: &str = "  ";

/// Writes the message and enum stubs of a file
pub struct MessageStubWriter<'a, W: FmtWrite> {
    writer: &'a mut W,
    config: &'a GeneratorConfig,
    comments: CommentIndex,
}

impl<'a, W: FmtWrite> MessageStubWriter<'a, W> {
    /// Creates a writer emitting into `writer`
    pub fn new(writer: &'a mut W, config: &'a GeneratorConfig) -> Self {
        Self {
            writer,
            config,
            comments: CommentIndex::default(),
        }
    }

    fn comment_lines(&self, full_name: &str, indent: &str) -> Vec<String> {
        self.comments
            .leading(full_name)
            .map(|comment| ruby_comment_lines(comment, indent))
            .unwrap_or_default()
    }

    fn class_methods(&self, class: &str) -> Vec<Block> {
        vec![
            Block::from_lines([
                format!("sig {{ params(str: String).returns({}) }}", class),
                "def self.decode(str)".to_string(),
                "end".to_string(),
            ]),
            Block::from_lines([
                format!("sig {{ params(str: String, kw: T.untyped).returns({}) }}", class),
                "def self.decode_json(str, **kw)".to_string(),
                "end".to_string(),
            ]),
            Block::from_lines([
                "sig { returns(::Google::Protobuf::Descriptor) }".to_string(),
                "def self.descriptor".to_string(),
                "end".to_string(),
            ]),
            Block::from_lines([
                format!("sig {{ params(msg: {}).returns(String) }}", class),
                "def self.encode(msg)".to_string(),
                "end".to_string(),
            ]),
            Block::from_lines([
                format!("sig {{ params(msg: {}, kw: T.untyped).returns(String) }}", class),
                "def self.encode_json(msg, **kw)".to_string(),
                "end".to_string(),
            ]),
        ]
    }

    fn initializer(&self, message: &MessageDescriptor) -> Result<Block> {
        let block = match constructor_shape(message, self.config.mapper_options())? {
            ConstructorShape::Typed(params) => {
                let mut block = Block::from_lines(["sig do".to_string(), "  params(".to_string()]);
                let last = params.len().saturating_sub(1);
                for (i, param) in params.iter().enumerate() {
                    let sep = if i == last { "" } else { "," };
                    block.push(format!("    {}: {}{}", param.name, param.annotation, sep));
                }
                block.push("  ).void");
                block.push("end");
                block.push("def initialize(");
                for (i, param) in params.iter().enumerate() {
                    let sep = if i == last { "" } else { "," };
                    block.push(format!("  {}: {}{}", param.name, param.default, sep));
                }
                block.push(")");
                block.push("end");
                block
            }
            ConstructorShape::Untyped(hazards) => {
                debug!(
                    "{}: {} field name(s) are not Ruby keywords, using untyped constructor",
                    message.full_name(),
                    hazards.len()
                );
                Block::from_lines([
                    "sig { params(fields: T.untyped).void }".to_string(),
                    "def initialize(fields = {})".to_string(),
                    "end".to_string(),
                ])
            }
        };
        Ok(block)
    }

    fn field_accessors(&self, field: &FieldDescriptor) -> Result<Vec<Block>> {
        let options = self.config.mapper_options();
        let name = field.name();
        let getter_type = type_for(field, FieldContext::Getter, options)?;
        let setter_type = type_for(field, FieldContext::Setter, options)?;

        let mut getter = Block::from_lines(self.comment_lines(field.full_name(), ""));
        getter.push(format!("sig {{ returns({}) }}", getter_type));
        getter.push(format!("def {}", name));
        getter.push("end");

        let mut blocks = vec![
            getter,
            Block::from_lines([
                format!("sig {{ params(value: {}).void }}", setter_type),
                format!("def {}=(value)", name),
                "end".to_string(),
            ]),
            Block::from_lines([
                "sig { void }".to_string(),
                format!("def clear_{}", name),
                "end".to_string(),
            ]),
        ];

        if field.supports_presence() && !field.is_list() && !field.is_map() {
            blocks.push(Block::from_lines([
                "sig { returns(T::Boolean) }".to_string(),
                format!("def has_{}?", name),
                "end".to_string(),
            ]));
        }

        Ok(blocks)
    }

    fn dynamic_accessors() -> Vec<Block> {
        vec![
            Block::from_lines([
                "sig { params(field: String).returns(T.untyped) }".to_string(),
                "def [](field)".to_string(),
                "end".to_string(),
            ]),
            Block::from_lines([
                "sig { params(field: String, value: T.untyped).void }".to_string(),
                "def []=(field, value)".to_string(),
                "end".to_string(),
            ]),
            Block::from_lines([
                "sig { returns(T::Hash[Symbol, T.untyped]) }".to_string(),
                "def to_h".to_string(),
                "end".to_string(),
            ]),
        ]
    }

    /// Writes `blocks` separated by blank lines, then closes the scope.
    ///
    /// `after_header` puts a blank line before the first block too, to set
    /// it apart from the `include`/`extend` lines of a class.
    fn write_body(&mut self, blocks: &[Block], after_header: bool) -> Result<()> {
        for (i, block) in blocks.iter().enumerate() {
            if i > 0 || after_header {
                writeln!(self.writer)?;
            }
            for line in block.lines() {
                writeln!(self.writer, "{}{}", INDENT, line)?;
            }
        }
        writeln!(self.writer, "end")?;
        Ok(())
    }
}

impl<W: FmtWrite> StubWriter for MessageStubWriter<'_, W> {
    fn write_file(&mut self, file: &FileDescriptor) -> Result<()> {
        self.comments = CommentIndex::from_file(file.file_descriptor_proto());
        write_header(self.writer, file.name())?;

        let modules = enclosing_modules(file);
        if !modules.is_empty() {
            writeln!(self.writer)?;
            for module in modules {
                writeln!(self.writer, "module {}; end", module)?;
            }
        }
        Ok(())
    }

    fn write_message(&mut self, message: &MessageDescriptor) -> Result<()> {
        let class = qualified_name(message);
        trace!("rendering message {} as {}", message.full_name(), class);

        let mut blocks = Vec::new();
        if !self.config.hide_common_methods {
            blocks.extend(self.class_methods(&class));
        }
        let fields = declared_fields(message);
        if !fields.is_empty() {
            blocks.push(self.initializer(message)?);
        }
        for field in &fields {
            blocks.extend(self.field_accessors(field)?);
        }
        for oneof in message.oneofs().filter(|oneof| !is_synthetic_oneof(oneof)) {
            blocks.push(Block::from_lines([
                "sig { returns(T.nilable(Symbol)) }".to_string(),
                format!("def {}", oneof.name()),
                "end".to_string(),
            ]));
        }
        blocks.extend(Self::dynamic_accessors());

        writeln!(self.writer)?;
        for line in self.comment_lines(message.full_name(), "") {
            writeln!(self.writer, "{}", line)?;
        }
        let after_header = !self.config.abstract_base;
        if self.config.abstract_base {
            writeln!(self.writer, "class {} < ::Google::Protobuf::AbstractMessage", class)?;
        } else {
            writeln!(self.writer, "class {}", class)?;
            writeln!(self.writer, "{}include ::Google::Protobuf", INDENT)?;
            writeln!(self.writer, "{}include ::Google::Protobuf::MessageExts", INDENT)?;
            writeln!(
                self.writer,
                "{}extend ::Google::Protobuf::MessageExts::ClassMethods",
                INDENT
            )?;
        }
        self.write_body(&blocks, after_header)
    }

    fn write_enum(&mut self, enum_type: &EnumDescriptor) -> Result<()> {
        let module = qualified_name(enum_type);
        trace!("rendering enum {} as {}", enum_type.full_name(), module);

        let mut blocks = Vec::new();
        if !self.config.hide_common_methods {
            blocks.push(Block::from_lines([
                "sig { params(value: Integer).returns(T.nilable(Symbol)) }".to_string(),
                "def self.lookup(value)".to_string(),
                "end".to_string(),
            ]));
            blocks.push(Block::from_lines([
                "sig { params(value: Symbol).returns(T.nilable(Integer)) }".to_string(),
                "def self.resolve(value)".to_string(),
                "end".to_string(),
            ]));
            blocks.push(Block::from_lines([
                "sig { returns(::Google::Protobuf::EnumDescriptor) }".to_string(),
                "def self.descriptor".to_string(),
                "end".to_string(),
            ]));
        }

        // Enum values are scoped next to their enum, not inside it.
        let scope = enum_type
            .full_name()
            .rsplit_once('.')
            .map(|(scope, _)| scope)
            .unwrap_or("");

        let mut constants = Block::default();
        // Declaration order; `EnumDescriptor::values` sorts by number.
        for value in &enum_type.enum_descriptor_proto().value {
            // The runtime only defines constants for upper-case names.
            if !value.name().starts_with(|c: char| c.is_ascii_uppercase()) {
                debug!("{}: skipping enum value {} (not a Ruby constant)", module, value.name());
                continue;
            }
            let key = if scope.is_empty() {
                value.name().to_string()
            } else {
                format!("{}.{}", scope, value.name())
            };
            for line in self.comment_lines(&key, "") {
                constants.push(line);
            }
            constants.push(format!("{} = T.let({}, Integer)", value.name(), value.number()));
        }
        if !constants.is_empty() {
            blocks.push(constants);
        }

        writeln!(self.writer)?;
        for line in self.comment_lines(enum_type.full_name(), "") {
            writeln!(self.writer, "{}", line)?;
        }
        writeln!(self.writer, "module {}", module)?;
        self.write_body(&blocks, false)
    }
}
