//! Descriptor builders shared by unit tests.

use prost_reflect::DescriptorPool;
use prost_types::field_descriptor_proto::{Label, Type};
use prost_types::{
    DescriptorProto, EnumDescriptorProto, EnumValueDescriptorProto, FieldDescriptorProto,
    FileDescriptorProto, FileDescriptorSet, MessageOptions, MethodDescriptorProto,
    OneofDescriptorProto, ServiceDescriptorProto,
};

pub(crate) fn scalar(name: &str, number: i32, ty: Type) -> FieldDescriptorProto {
    FieldDescriptorProto {
        name: Some(name.to_string()),
        number: Some(number),
        label: Some(Label::Optional as i32),
        r#type: Some(ty as i32),
        ..Default::default()
    }
}

pub(crate) fn typed(name: &str, number: i32, ty: Type, type_name: &str) -> FieldDescriptorProto {
    FieldDescriptorProto {
        type_name: Some(type_name.to_string()),
        ..scalar(name, number, ty)
    }
}

pub(crate) fn repeated(mut field: FieldDescriptorProto) -> FieldDescriptorProto {
    field.label = Some(Label::Repeated as i32);
    field
}

/// Marks `field` as a proto3 `optional`, adding the synthetic oneof to `owner`.
pub(crate) fn proto3_optional(owner: &mut DescriptorProto, mut field: FieldDescriptorProto) {
    owner.oneof_decl.push(OneofDescriptorProto {
        name: Some(format!("_{}", field.name())),
        ..Default::default()
    });
    field.oneof_index = Some(owner.oneof_decl.len() as i32 - 1);
    field.proto3_optional = Some(true);
    owner.field.push(field);
}

/// Adds a real oneof containing `fields` to `owner`.
pub(crate) fn oneof(owner: &mut DescriptorProto, name: &str, fields: Vec<FieldDescriptorProto>) {
    owner.oneof_decl.push(OneofDescriptorProto {
        name: Some(name.to_string()),
        ..Default::default()
    });
    let index = owner.oneof_decl.len() as i32 - 1;
    for mut field in fields {
        field.oneof_index = Some(index);
        owner.field.push(field);
    }
}

/// Adds a `map<key, value>` field plus its synthetic entry message.
///
/// `owner_full_name` is the owning message's fully-qualified name without
/// the leading dot.
pub(crate) fn map_field(
    owner: &mut DescriptorProto,
    owner_full_name: &str,
    name: &str,
    number: i32,
    key: Type,
    value: FieldDescriptorProto,
) {
    let entry_name = format!("{}Entry", crate::naming::upper_camel_case(name));
    let mut value = value;
    value.name = Some("value".to_string());
    value.number = Some(2);

    owner.nested_type.push(DescriptorProto {
        name: Some(entry_name.clone()),
        field: vec![scalar("key", 1, key), value],
        options: Some(MessageOptions {
            map_entry: Some(true),
            ..Default::default()
        }),
        ..Default::default()
    });
    owner.field.push(repeated(typed(
        name,
        number,
        Type::Message,
        &format!(".{}.{}", owner_full_name, entry_name),
    )));
}

/// proto2 `g.proto` with `message Holder { optional group Legacy = 1 { optional int32 a = 1; } }`.
pub(crate) fn legacy_group_file() -> FileDescriptorProto {
    let mut holder = message("Holder", vec![typed("legacy", 1, Type::Group, ".g.Holder.Legacy")]);
    holder.nested_type.push(message("Legacy", vec![scalar("a", 1, Type::Int32)]));
    proto2_file("g.proto", "g", vec![holder], vec![])
}

pub(crate) fn message(name: &str, fields: Vec<FieldDescriptorProto>) -> DescriptorProto {
    DescriptorProto {
        name: Some(name.to_string()),
        field: fields,
        ..Default::default()
    }
}

pub(crate) fn enumeration(name: &str, values: &[(&str, i32)]) -> EnumDescriptorProto {
    EnumDescriptorProto {
        name: Some(name.to_string()),
        value: values
            .iter()
            .map(|(value, number)| EnumValueDescriptorProto {
                name: Some(value.to_string()),
                number: Some(*number),
                ..Default::default()
            })
            .collect(),
        ..Default::default()
    }
}

pub(crate) fn method(name: &str, input: &str, output: &str, client: bool, server: bool) -> MethodDescriptorProto {
    MethodDescriptorProto {
        name: Some(name.to_string()),
        input_type: Some(input.to_string()),
        output_type: Some(output.to_string()),
        client_streaming: Some(client),
        server_streaming: Some(server),
        ..Default::default()
    }
}

pub(crate) fn service(name: &str, methods: Vec<MethodDescriptorProto>) -> ServiceDescriptorProto {
    ServiceDescriptorProto {
        name: Some(name.to_string()),
        method: methods,
        ..Default::default()
    }
}

pub(crate) fn proto3_file(
    name: &str,
    package: &str,
    messages: Vec<DescriptorProto>,
    enums: Vec<EnumDescriptorProto>,
) -> FileDescriptorProto {
    FileDescriptorProto {
        name: Some(name.to_string()),
        package: Some(package.to_string()).filter(|p| !p.is_empty()),
        message_type: messages,
        enum_type: enums,
        syntax: Some("proto3".to_string()),
        ..Default::default()
    }
}

pub(crate) fn proto2_file(
    name: &str,
    package: &str,
    messages: Vec<DescriptorProto>,
    enums: Vec<EnumDescriptorProto>,
) -> FileDescriptorProto {
    FileDescriptorProto {
        syntax: Some("proto2".to_string()),
        ..proto3_file(name, package, messages, enums)
    }
}

pub(crate) fn pool(files: Vec<FileDescriptorProto>) -> DescriptorPool {
    DescriptorPool::from_file_descriptor_set(FileDescriptorSet { file: files })
        .expect("test descriptors should build")
}
