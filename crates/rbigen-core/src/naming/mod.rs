//! Ruby namespace resolution for protobuf entities.
//!
//! `protoc --ruby_out` places every message and enum under a module path
//! derived from the file's `ruby_package` option or, failing that, its proto
//! package. This module computes the same constant paths so stubs line up
//! with the generated classes.
//!
//! ## Example
//!
//! A message `Inner` nested in `Outer`, declared in package `pkg.sub`,
//! resolves to `Pkg::Sub::Outer::Inner`, and the file needs the module
//! declarations `Pkg` and `Pkg::Sub` before it can be referenced.

mod caser;

use crate::error::{HazardReason, NamingHazard};
use prost_reflect::{EnumDescriptor, FieldDescriptor, FileDescriptor, MessageDescriptor};

pub use caser::{lower_snake_case, recombine, split_words, title_case, upper_camel_case};

/// Ruby namespace separator
pub const NAMESPACE_SEPARATOR: &str = "::";

/// The enclosing scope of a message or enum.
#[derive(Debug, Clone)]
pub enum EntityParent {
    /// Nested inside another message
    Message(MessageDescriptor),
    /// Declared at file scope
    File(FileDescriptor),
}

impl EntityParent {
    /// Narrows to the enclosing message, if there is one
    pub fn as_message(&self) -> Option<&MessageDescriptor> {
        match self {
            EntityParent::Message(message) => Some(message),
            EntityParent::File(_) => None,
        }
    }
}

/// A message or enum: something that owns a Ruby constant.
pub trait NamedEntity {
    /// The entity's own (unqualified) name
    fn entity_name(&self) -> &str;

    /// The enclosing scope
    fn entity_parent(&self) -> EntityParent;

    /// The file the entity is declared in
    fn entity_file(&self) -> FileDescriptor;
}

impl NamedEntity for MessageDescriptor {
    fn entity_name(&self) -> &str {
        self.name()
    }

    fn entity_parent(&self) -> EntityParent {
        match self.parent_message() {
            Some(parent) => EntityParent::Message(parent),
            None => EntityParent::File(self.parent_file()),
        }
    }

    fn entity_file(&self) -> FileDescriptor {
        self.parent_file()
    }
}

impl NamedEntity for EnumDescriptor {
    fn entity_name(&self) -> &str {
        self.name()
    }

    fn entity_parent(&self) -> EntityParent {
        match self.parent_message() {
            Some(parent) => EntityParent::Message(parent),
            None => EntityParent::File(self.parent_file()),
        }
    }

    fn entity_file(&self) -> FileDescriptor {
        self.parent_file()
    }
}

/// Resolves the Ruby module path for a file.
///
/// Uses the `ruby_package` option when it is set and non-empty, otherwise
/// the proto package. Every segment is recased, since `ruby_out` does not
/// capitalize `ruby_package` and a lower-case segment is not a valid Ruby
/// constant.
pub fn resolve_package(file: &FileDescriptor) -> String {
    let ruby_package = file
        .file_descriptor_proto()
        .options
        .as_ref()
        .and_then(|opts| opts.ruby_package.as_deref())
        .filter(|pkg| !pkg.is_empty());

    let package = ruby_package.unwrap_or_else(|| file.package_name());
    upper_camel_case(&package.replace('.', NAMESPACE_SEPARATOR))
}

/// Returns every module prefix of the file's package, shortest first.
///
/// `Pkg::Sub::Leaf` yields `Pkg`, `Pkg::Sub`, `Pkg::Sub::Leaf`. A file
/// without a package yields nothing.
pub fn enclosing_modules(file: &FileDescriptor) -> Vec<String> {
    let package = resolve_package(file);
    if package.is_empty() {
        return Vec::new();
    }

    let segments: Vec<&str> = package.split(NAMESPACE_SEPARATOR).collect();
    (1..=segments.len())
        .map(|depth| segments[..depth].join(NAMESPACE_SEPARATOR))
        .collect()
}

/// Computes the fully-qualified Ruby constant for a message or enum.
pub fn qualified_name<E: NamedEntity>(entity: &E) -> String {
    let mut names = vec![title_case(entity.entity_name())];

    let mut parent = entity.entity_parent();
    while let Some(message) = parent.as_message() {
        names.push(title_case(message.name()));
        let next = message.entity_parent();
        parent = next;
    }
    names.reverse();

    let package = resolve_package(&entity.entity_file());
    if package.is_empty() {
        names.join(NAMESPACE_SEPARATOR)
    } else {
        format!("{}{}{}", package, NAMESPACE_SEPARATOR, names.join(NAMESPACE_SEPARATOR))
    }
}

/// Checks whether a name can be used as a Ruby keyword argument.
pub fn check_ruby_identifier(name: &str) -> std::result::Result<(), HazardReason> {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return Err(HazardReason::Empty);
    };

    if first.is_ascii_digit() {
        return Err(HazardReason::LeadingDigit);
    }
    if first.is_uppercase() {
        return Err(HazardReason::LeadingUppercase);
    }
    if !(first.is_ascii_lowercase() || first == '_') {
        return Err(HazardReason::IllegalCharacter(first));
    }

    match chars.find(|c| !(c.is_ascii_alphanumeric() || *c == '_')) {
        Some(c) => Err(HazardReason::IllegalCharacter(c)),
        None => Ok(()),
    }
}

/// Reports a [`NamingHazard`] if the field's name is not a legal Ruby
/// keyword argument.
pub fn naming_hazard(field: &FieldDescriptor) -> Option<NamingHazard> {
    check_ruby_identifier(field.name())
        .err()
        .map(|reason| NamingHazard {
            field: field.full_name().to_string(),
            reason,
        })
}
