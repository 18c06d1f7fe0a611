//! Descriptor walking and the [`StubWriter`] trait.

use crate::error::Result;
use prost_reflect::{EnumDescriptor, FileDescriptor, MessageDescriptor, ServiceDescriptor};

/// Receives the entities of one file as they are walked.
///
/// Every hook defaults to a no-op so a writer only implements what it
/// emits. [`walk_file`] calls `write_file` first, then every message
/// (depth-first, map entries skipped), then every enum, then every service.
pub trait StubWriter {
    /// Called once before any entity of the file
    fn write_file(&mut self, file: &FileDescriptor) -> Result<()> {
        let _ = file;
        Ok(())
    }

    /// Called for every message, nested ones included
    fn write_message(&mut self, message: &MessageDescriptor) -> Result<()> {
        let _ = message;
        Ok(())
    }

    /// Called for every enum, nested ones included
    fn write_enum(&mut self, enum_type: &EnumDescriptor) -> Result<()> {
        let _ = enum_type;
        Ok(())
    }

    /// Called for every service
    fn write_service(&mut self, service: &ServiceDescriptor) -> Result<()> {
        let _ = service;
        Ok(())
    }
}

/// Walks `file`, feeding every entity to `writer`.
pub fn walk_file<W: StubWriter + ?Sized>(file: &FileDescriptor, writer: &mut W) -> Result<()> {
    writer.write_file(file)?;

    let messages = all_messages(file);
    for message in &messages {
        writer.write_message(message)?;
    }

    for enum_type in file.enums() {
        writer.write_enum(&enum_type)?;
    }
    for message in &messages {
        for enum_type in message.child_enums() {
            writer.write_enum(&enum_type)?;
        }
    }

    for service in file.services() {
        writer.write_service(&service)?;
    }

    Ok(())
}

/// All messages of a file in depth-first declaration order, excluding the
/// synthetic map entry types.
fn all_messages(file: &FileDescriptor) -> Vec<MessageDescriptor> {
    fn visit(message: MessageDescriptor, out: &mut Vec<MessageDescriptor>) {
        if message.is_map_entry() {
            return;
        }
        let children: Vec<_> = message.child_messages().collect();
        out.push(message);
        for child in children {
            visit(child, out);
        }
    }

    let mut out = Vec::new();
    for message in file.messages() {
        visit(message, &mut out);
    }
    out
}

/// A writer that collects statistics about a file
#[derive(Debug, Default)]
pub struct StatsWriter {
    /// Number of messages
    pub message_count: usize,
    /// Number of fields
    pub field_count: usize,
    /// Number of enums
    pub enum_count: usize,
    /// Number of services
    pub service_count: usize,
    /// Number of methods
    pub method_count: usize,
}

impl StubWriter for StatsWriter {
    fn write_message(&mut self, message: &MessageDescriptor) -> Result<()> {
        self.message_count += 1;
        self.field_count += message.fields().count();
        Ok(())
    }

    fn write_enum(&mut self, _enum_type: &EnumDescriptor) -> Result<()> {
        self.enum_count += 1;
        Ok(())
    }

    fn write_service(&mut self, service: &ServiceDescriptor) -> Result<()> {
        self.service_count += 1;
        self.method_count += service.methods().count();
        Ok(())
    }
}
