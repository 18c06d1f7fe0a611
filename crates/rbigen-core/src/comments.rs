//! Leading comments from `source_code_info`, keyed by fully-qualified name.
//!
//! protoc only attaches `source_code_info` when asked to (plugins always
//! receive it, `--descriptor_set_out` needs `--include_source_info`). When
//! it is missing the index is simply empty.

use prost_types::{DescriptorProto, EnumDescriptorProto, FileDescriptorProto};
use std::collections::HashMap;

// Field numbers inside descriptor.proto used to build location paths.
const FILE_MESSAGE_TYPE: i32 = 4;
const FILE_ENUM_TYPE: i32 = 5;
const FILE_SERVICE: i32 = 6;
const MESSAGE_FIELD: i32 = 2;
const MESSAGE_NESTED_TYPE: i32 = 3;
const MESSAGE_ENUM_TYPE: i32 = 4;
const ENUM_VALUE: i32 = 2;
const SERVICE_METHOD: i32 = 2;

/// Leading comments of one file's messages, fields, enums, enum values,
/// services and methods
#[derive(Debug, Clone, Default)]
pub struct CommentIndex {
    comments: HashMap<String, String>,
}

impl CommentIndex {
    /// Builds the index for one file
    pub fn from_file(file: &FileDescriptorProto) -> Self {
        let Some(info) = &file.source_code_info else {
            return Self::default();
        };

        let by_path: HashMap<&[i32], &str> = info
            .location
            .iter()
            .filter_map(|loc| {
                loc.leading_comments
                    .as_deref()
                    .map(|comment| (loc.path.as_slice(), comment))
            })
            .collect();

        let mut builder = IndexBuilder {
            by_path,
            comments: HashMap::new(),
        };

        let package = file.package();
        let mut path = Vec::new();

        for (i, message) in file.message_type.iter().enumerate() {
            path.extend([FILE_MESSAGE_TYPE, i as i32]);
            builder.message(package, message, &mut path);
            path.truncate(0);
        }
        for (i, enum_type) in file.enum_type.iter().enumerate() {
            path.extend([FILE_ENUM_TYPE, i as i32]);
            builder.enumeration(package, enum_type, &mut path);
            path.truncate(0);
        }
        for (i, service) in file.service.iter().enumerate() {
            path.extend([FILE_SERVICE, i as i32]);
            let service_name = qualify(package, service.name());
            builder.record(&path, &service_name);
            for (j, method) in service.method.iter().enumerate() {
                path.extend([SERVICE_METHOD, j as i32]);
                builder.record(&path, &qualify(&service_name, method.name()));
                path.truncate(2);
            }
            path.truncate(0);
        }

        Self {
            comments: builder.comments,
        }
    }

    /// The trimmed leading comment of the entity with this full name
    pub fn leading(&self, full_name: &str) -> Option<&str> {
        self.comments.get(full_name).map(String::as_str)
    }

    /// Number of commented entities
    pub fn len(&self) -> usize {
        self.comments.len()
    }

    /// True when no entity carries a comment
    pub fn is_empty(&self) -> bool {
        self.comments.is_empty()
    }
}

struct IndexBuilder<'a> {
    by_path: HashMap<&'a [i32], &'a str>,
    comments: HashMap<String, String>,
}

impl IndexBuilder<'_> {
    fn record(&mut self, path: &[i32], full_name: &str) {
        if let Some(comment) = self.by_path.get(path) {
            let trimmed = comment.trim();
            if !trimmed.is_empty() {
                self.comments.insert(full_name.to_string(), trimmed.to_string());
            }
        }
    }

    fn message(&mut self, scope: &str, message: &DescriptorProto, path: &mut Vec<i32>) {
        let full_name = qualify(scope, message.name());
        self.record(path, &full_name);
        let depth = path.len();

        for (i, field) in message.field.iter().enumerate() {
            path.extend([MESSAGE_FIELD, i as i32]);
            self.record(path, &qualify(&full_name, field.name()));
            path.truncate(depth);
        }
        for (i, nested) in message.nested_type.iter().enumerate() {
            path.extend([MESSAGE_NESTED_TYPE, i as i32]);
            self.message(&full_name, nested, path);
            path.truncate(depth);
        }
        for (i, enum_type) in message.enum_type.iter().enumerate() {
            path.extend([MESSAGE_ENUM_TYPE, i as i32]);
            self.enumeration(&full_name, enum_type, path);
            path.truncate(depth);
        }
    }

    fn enumeration(&mut self, scope: &str, enum_type: &EnumDescriptorProto, path: &mut Vec<i32>) {
        let full_name = qualify(scope, enum_type.name());
        self.record(path, &full_name);
        let depth = path.len();

        // Enum values live in the enum's parent scope.
        for (i, value) in enum_type.value.iter().enumerate() {
            path.extend([ENUM_VALUE, i as i32]);
            self.record(path, &qualify(scope, value.name()));
            path.truncate(depth);
        }
    }
}

fn qualify(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", scope, name)
    }
}

/// Formats a comment as Ruby `#` lines with the given indentation.
pub fn ruby_comment_lines(comment: &str, indent: &str) -> Vec<String> {
    comment
        .lines()
        .map(|line| {
            let line = line.trim_end();
            if line.is_empty() {
                format!("{}#", indent)
            } else {
                format!("{}# {}", indent, line.strip_prefix(' ').unwrap_or(line))
            }
        })
        .collect()
}
