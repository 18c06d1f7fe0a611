//! Sorbet type annotations and default values for protobuf fields.
//!
//! ## Contexts
//!
//! The Ruby runtime is stricter about what a field returns than about what
//! it accepts, so every field is mapped per [`FieldContext`]:
//!
//! - [`FieldContext::Getter`]: the value the reader returns
//! - [`FieldContext::Setter`]: what the writer accepts; enums take strings
//!   too, and containers must be the runtime's wrapper classes unless
//!   generic containers are requested
//! - [`FieldContext::Initializer`]: a keyword argument to `new`; always
//!   nilable
//!
//! All functions here are pure. Configuration arrives as a
//! [`MapperOptions`] value on every call.

mod kind;

use crate::error::{Error, NamingHazard, Result};
use crate::naming::{naming_hazard, qualified_name};
use prost_reflect::{FieldDescriptor, MessageDescriptor, MethodDescriptor, OneofDescriptor};
use tracing::debug;

pub use kind::{FieldShape, ProtoKind};

/// Opaque map wrapper accepted by the runtime's setters
pub const MAP_WRAPPER: &str = "::Google::Protobuf::Map";

/// Opaque repeated wrapper accepted by the runtime's setters
pub const REPEATED_WRAPPER: &str = "::Google::Protobuf::RepeatedField";

/// Where a field annotation is going to be used
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldContext {
    /// Return type of the reader
    Getter,
    /// Parameter type of the writer
    Setter,
    /// Keyword argument type of the constructor
    Initializer,
}

/// Options that change type mapping
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MapperOptions {
    /// Annotate setter containers as `T::Hash`/`T::Array` instead of the
    /// runtime's wrapper classes
    pub generic_containers: bool,
}

impl MapperOptions {
    /// Creates options with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets whether setter containers use generic annotations
    pub fn generic_containers(mut self, generic: bool) -> Self {
        self.generic_containers = generic;
        self
    }
}

/// Computes the Sorbet annotation of `field` in `context`.
///
/// # Errors
///
/// Returns [`Error::SchemaInvariantViolation`] when the field (or a map key
/// or value) has a kind with no mapping rule.
pub fn type_for(
    field: &FieldDescriptor,
    context: FieldContext,
    options: MapperOptions,
) -> Result<String> {
    let shape = FieldShape::of(field);

    let annotation = match &shape {
        FieldShape::Map { key, value } => {
            if context == FieldContext::Setter && !options.generic_containers {
                MAP_WRAPPER.to_string()
            } else {
                format!(
                    "T::Hash[{}, {}]",
                    key_annotation(field, key, context)?,
                    element_annotation(field, value, context)?
                )
            }
        }
        FieldShape::Repeated(element) => {
            if context == FieldContext::Setter && !options.generic_containers {
                REPEATED_WRAPPER.to_string()
            } else {
                format!("T::Array[{}]", element_annotation(field, element, context)?)
            }
        }
        FieldShape::Singular(kind) => element_annotation(field, kind, context)?,
    };

    // Singular messages are nilable already.
    let already_nilable = matches!(shape, FieldShape::Singular(ProtoKind::Message(_)));
    if context == FieldContext::Initializer && !already_nilable {
        Ok(format!("T.nilable({})", annotation))
    } else {
        Ok(annotation)
    }
}

/// Annotation of a single value of `kind` (a singular field, a list
/// element or a map value).
pub fn element_annotation(
    field: &FieldDescriptor,
    kind: &ProtoKind,
    context: FieldContext,
) -> Result<String> {
    let annotation = match kind {
        k if k.is_integer() => "Integer".to_string(),
        k if k.is_float() => "Float".to_string(),
        ProtoKind::String | ProtoKind::Bytes => "String".to_string(),
        ProtoKind::Bool => "T::Boolean".to_string(),
        ProtoKind::Enum(_) => match context {
            FieldContext::Getter => "T.any(Symbol, Integer)".to_string(),
            FieldContext::Setter | FieldContext::Initializer => {
                "T.any(Symbol, String, Integer)".to_string()
            }
        },
        ProtoKind::Message(message) => format!("T.nilable({})", qualified_name(message)),
        _ => return Err(Error::schema_invariant(field.full_name(), kind.as_str())),
    };
    Ok(annotation)
}

fn key_annotation(field: &FieldDescriptor, key: &ProtoKind, context: FieldContext) -> Result<String> {
    if matches!(key, ProtoKind::Message(_) | ProtoKind::Group) {
        return Err(Error::schema_invariant(field.full_name(), key.as_str()));
    }
    element_annotation(field, key, context)
}

/// Computes the Ruby literal a freshly constructed message holds for
/// `field`.
///
/// Enums default to their first declared value, whatever its number.
pub fn default_value_for(field: &FieldDescriptor) -> Result<String> {
    match FieldShape::of(field) {
        FieldShape::Map { key, value } => {
            let key_tag = key.map_tag(field.full_name())?;
            match value {
                ProtoKind::Message(message) => Ok(format!(
                    "{}.new({}, :message, {})",
                    MAP_WRAPPER,
                    key_tag,
                    qualified_name(&message)
                )),
                other => Ok(format!(
                    "{}.new({}, {})",
                    MAP_WRAPPER,
                    key_tag,
                    other.map_tag(field.full_name())?
                )),
            }
        }
        FieldShape::Repeated(_) => Ok("[]".to_string()),
        FieldShape::Singular(kind) => scalar_default(field, &kind),
    }
}

fn scalar_default(field: &FieldDescriptor, kind: &ProtoKind) -> Result<String> {
    let literal = match kind {
        k if k.is_integer() => "0".to_string(),
        k if k.is_float() => "0.0".to_string(),
        ProtoKind::String | ProtoKind::Bytes => "\"\"".to_string(),
        ProtoKind::Bool => "false".to_string(),
        // `EnumDescriptor::values` is ordered by number, not declaration.
        ProtoKind::Enum(enum_type) => match enum_type.enum_descriptor_proto().value.first() {
            Some(first) => format!(":{}", first.name()),
            None => return Err(Error::schema_invariant(field.full_name(), "empty enum")),
        },
        ProtoKind::Message(_) => "nil".to_string(),
        _ => return Err(Error::schema_invariant(field.full_name(), kind.as_str())),
    };
    Ok(literal)
}

/// Parameter annotation of an RPC, `T::Enumerable[...]` when client
/// streaming.
pub fn method_param_type(method: &MethodDescriptor) -> String {
    method_type(&method.input(), method.is_client_streaming())
}

/// Return annotation of an RPC, `T::Enumerable[...]` when server
/// streaming.
pub fn method_return_type(method: &MethodDescriptor) -> String {
    method_type(&method.output(), method.is_server_streaming())
}

fn method_type(message: &MessageDescriptor, streaming: bool) -> String {
    let name = qualified_name(message);
    if streaming {
        format!("T::Enumerable[{}]", name)
    } else {
        name
    }
}

/// Fields of `message` in the order they are declared.
///
/// `MessageDescriptor::fields` yields fields by number; constructor keywords
/// and accessors follow the source order instead.
pub fn declared_fields(message: &MessageDescriptor) -> Vec<FieldDescriptor> {
    message
        .descriptor_proto()
        .field
        .iter()
        .filter_map(|field| message.get_field_by_name(field.name()))
        .collect()
}

/// True for the single-member oneof protoc synthesizes for a proto3
/// `optional` field. It has no Ruby accessor of its own.
pub fn is_synthetic_oneof(oneof: &OneofDescriptor) -> bool {
    let mut fields = oneof.fields();
    match (fields.next(), fields.next()) {
        (Some(field), None) => field.field_descriptor_proto().proto3_optional(),
        _ => false,
    }
}

/// One keyword argument of a typed constructor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstructorParam {
    /// Field name, used as the keyword
    pub name: String,
    /// Initializer-context annotation
    pub annotation: String,
    /// Default literal
    pub default: String,
}

/// How a message's `initialize` can be declared
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConstructorShape {
    /// One typed keyword argument per field, in declaration order
    Typed(Vec<ConstructorParam>),
    /// A single untyped hash argument, because some field names are not
    /// legal Ruby keywords
    Untyped(Vec<NamingHazard>),
}

/// Derives the constructor signature of a message.
///
/// Naming hazards degrade the whole constructor to [`ConstructorShape::Untyped`]
/// and are not errors; schema invariant violations still are.
pub fn constructor_shape(
    message: &MessageDescriptor,
    options: MapperOptions,
) -> Result<ConstructorShape> {
    let fields = declared_fields(message);
    let hazards: Vec<NamingHazard> = fields.iter().filter_map(naming_hazard).collect();
    if !hazards.is_empty() {
        for hazard in &hazards {
            debug!("untyped constructor for {}: {}", message.full_name(), hazard);
        }
        return Ok(ConstructorShape::Untyped(hazards));
    }

    let params = fields
        .iter()
        .map(|field| {
            Ok(ConstructorParam {
                name: field.name().to_string(),
                annotation: type_for(field, FieldContext::Initializer, options)?,
                default: default_value_for(field)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(ConstructorShape::Typed(params))
}
