//! Closed classification of protobuf field kinds.

use crate::error::{Error, Result};
use prost_reflect::{EnumDescriptor, FieldDescriptor, Kind, MessageDescriptor};
use prost_types::field_descriptor_proto::Type;

/// Every field kind the generator knows how to map.
///
/// `prost_reflect::Kind` folds proto2 groups into messages; they are split
/// back out here so the mapping tables can reject them explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtoKind {
    /// `double`
    Double,
    /// `float`
    Float,
    /// `int32`
    Int32,
    /// `int64`
    Int64,
    /// `uint32`
    Uint32,
    /// `uint64`
    Uint64,
    /// `sint32`
    Sint32,
    /// `sint64`
    Sint64,
    /// `fixed32`
    Fixed32,
    /// `fixed64`
    Fixed64,
    /// `sfixed32`
    Sfixed32,
    /// `sfixed64`
    Sfixed64,
    /// `bool`
    Bool,
    /// `string`
    String,
    /// `bytes`
    Bytes,
    /// A reference to an enum
    Enum(EnumDescriptor),
    /// An embedded message
    Message(MessageDescriptor),
    /// A proto2 group; never mapped
    Group,
}

impl ProtoKind {
    /// Classifies the element kind of a field.
    ///
    /// For repeated fields this is the element; for map fields it is the
    /// synthetic entry message (use [`FieldShape`] to get key and value).
    pub fn of(field: &FieldDescriptor) -> Self {
        if field.field_descriptor_proto().r#type() == Type::Group {
            return ProtoKind::Group;
        }
        Self::from(field.kind())
    }

    /// True for every integer width and encoding
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ProtoKind::Int32
                | ProtoKind::Int64
                | ProtoKind::Uint32
                | ProtoKind::Uint64
                | ProtoKind::Sint32
                | ProtoKind::Sint64
                | ProtoKind::Fixed32
                | ProtoKind::Fixed64
                | ProtoKind::Sfixed32
                | ProtoKind::Sfixed64
        )
    }

    /// True for `float` and `double`
    pub fn is_float(&self) -> bool {
        matches!(self, ProtoKind::Double | ProtoKind::Float)
    }

    /// The proto keyword for this kind, used in diagnostics
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtoKind::Double => "double",
            ProtoKind::Float => "float",
            ProtoKind::Int32 => "int32",
            ProtoKind::Int64 => "int64",
            ProtoKind::Uint32 => "uint32",
            ProtoKind::Uint64 => "uint64",
            ProtoKind::Sint32 => "sint32",
            ProtoKind::Sint64 => "sint64",
            ProtoKind::Fixed32 => "fixed32",
            ProtoKind::Fixed64 => "fixed64",
            ProtoKind::Sfixed32 => "sfixed32",
            ProtoKind::Sfixed64 => "sfixed64",
            ProtoKind::Bool => "bool",
            ProtoKind::String => "string",
            ProtoKind::Bytes => "bytes",
            ProtoKind::Enum(_) => "enum",
            ProtoKind::Message(_) => "message",
            ProtoKind::Group => "group",
        }
    }

    /// The symbol `Google::Protobuf::Map.new` expects for this kind.
    ///
    /// Messages are passed as `:message` plus a class by the caller, so they
    /// are not part of this table; reaching it with a message or a group is
    /// a schema invariant violation reported against `field`.
    pub fn map_tag(&self, field: &str) -> Result<&'static str> {
        let tag = match self {
            ProtoKind::Double => ":double",
            ProtoKind::Float => ":float",
            ProtoKind::Int64 => ":int64",
            ProtoKind::Uint64 => ":uint64",
            ProtoKind::Int32 => ":int32",
            ProtoKind::Fixed64 => ":fixed64",
            ProtoKind::Fixed32 => ":fixed32",
            ProtoKind::Bool => ":bool",
            ProtoKind::String => ":string",
            ProtoKind::Bytes => ":bytes",
            ProtoKind::Uint32 => ":uint32",
            ProtoKind::Enum(_) => ":enum",
            ProtoKind::Sfixed32 => ":sfixed32",
            ProtoKind::Sfixed64 => ":sfixed64",
            ProtoKind::Sint32 => ":sint32",
            ProtoKind::Sint64 => ":sint64",
            ProtoKind::Message(_) | ProtoKind::Group => {
                return Err(Error::schema_invariant(field, self.as_str()))
            }
        };
        Ok(tag)
    }
}

impl From<Kind> for ProtoKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Double => ProtoKind::Double,
            Kind::Float => ProtoKind::Float,
            Kind::Int32 => ProtoKind::Int32,
            Kind::Int64 => ProtoKind::Int64,
            Kind::Uint32 => ProtoKind::Uint32,
            Kind::Uint64 => ProtoKind::Uint64,
            Kind::Sint32 => ProtoKind::Sint32,
            Kind::Sint64 => ProtoKind::Sint64,
            Kind::Fixed32 => ProtoKind::Fixed32,
            Kind::Fixed64 => ProtoKind::Fixed64,
            Kind::Sfixed32 => ProtoKind::Sfixed32,
            Kind::Sfixed64 => ProtoKind::Sfixed64,
            Kind::Bool => ProtoKind::Bool,
            Kind::String => ProtoKind::String,
            Kind::Bytes => ProtoKind::Bytes,
            Kind::Enum(enum_type) => ProtoKind::Enum(enum_type),
            Kind::Message(message) => ProtoKind::Message(message),
        }
    }
}

/// Cardinality of a field together with the kinds it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldShape {
    /// A single value
    Singular(ProtoKind),
    /// A `repeated` list of values
    Repeated(ProtoKind),
    /// A `map<key, value>`
    Map {
        /// Key kind (always scalar in a valid schema)
        key: ProtoKind,
        /// Value kind
        value: ProtoKind,
    },
}

impl FieldShape {
    /// Classifies a field. Map and repeated are mutually exclusive.
    pub fn of(field: &FieldDescriptor) -> Self {
        if field.is_map() {
            if let Kind::Message(entry) = field.kind() {
                return FieldShape::Map {
                    key: ProtoKind::of(&entry.map_entry_key_field()),
                    value: ProtoKind::of(&entry.map_entry_value_field()),
                };
            }
        }

        let kind = ProtoKind::of(field);
        if field.is_list() {
            FieldShape::Repeated(kind)
        } else {
            FieldShape::Singular(kind)
        }
    }

    /// True for map and repeated fields
    pub fn is_container(&self) -> bool {
        !matches!(self, FieldShape::Singular(_))
    }
}
