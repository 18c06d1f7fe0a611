//! protoc plugin protocol.
//!
//! protoc writes a `CodeGeneratorRequest` to the plugin's stdin and reads a
//! `CodeGeneratorResponse` from its stdout. Generation errors are reported
//! in `CodeGeneratorResponse.error` rather than through the exit status.

use crate::config::GeneratorConfig;
use crate::error::{Error, Result};
use crate::render::{generate_file, GeneratedFile};
use bytes::Buf;
use prost::Message;
use prost_reflect::DescriptorPool;
use prost_types::compiler::code_generator_response::{Feature, File};
use prost_types::compiler::{CodeGeneratorRequest, CodeGeneratorResponse};
use prost_types::FileDescriptorSet;
use tracing::{debug, error, info};

/// Renders stubs for each named file in `pool`.
///
/// Stops at the first error: a schema invariant violation in one file means
/// the generator's model is out of date and no output is trustworthy.
pub fn generate(
    pool: &DescriptorPool,
    files_to_generate: &[String],
    config: &GeneratorConfig,
) -> Result<Vec<GeneratedFile>> {
    let mut generated = Vec::new();
    for name in files_to_generate {
        let file = pool
            .get_file_by_name(name)
            .ok_or_else(|| Error::file_not_found(name))?;
        debug!("generating stubs for {}", name);
        generated.extend(generate_file(&file, config)?);
    }
    Ok(generated)
}

/// Builds a descriptor pool from raw descriptor protos.
pub fn build_pool(files: Vec<prost_types::FileDescriptorProto>) -> Result<DescriptorPool> {
    DescriptorPool::from_file_descriptor_set(FileDescriptorSet { file: files })
        .map_err(|e| Error::descriptor_build(e.to_string()))
}

/// Decodes a serialized `CodeGeneratorRequest`.
pub fn decode_request(input: impl Buf) -> Result<CodeGeneratorRequest> {
    Ok(CodeGeneratorRequest::decode(input)?)
}

/// Handles one plugin request.
pub fn run(request: CodeGeneratorRequest) -> CodeGeneratorResponse {
    let mut response = CodeGeneratorResponse {
        supported_features: Some(Feature::Proto3Optional as u64),
        ..Default::default()
    };

    match respond(request) {
        Ok(files) => {
            info!("generated {} file(s)", files.len());
            response.file = files
                .into_iter()
                .map(|f| File {
                    name: Some(f.name),
                    content: Some(f.content),
                    ..Default::default()
                })
                .collect();
        }
        Err(e) => {
            error!("{}", e);
            response.error = Some(e.to_string());
        }
    }

    response
}

fn respond(request: CodeGeneratorRequest) -> Result<Vec<GeneratedFile>> {
    let config = GeneratorConfig::from_parameter(request.parameter())?;
    debug!("plugin config: {:?}", config);

    let pool = build_pool(request.proto_file)?;
    generate(&pool, &request.file_to_generate, &config)
}

/// Decodes a request, runs it and encodes the response.
pub fn run_bytes(input: impl Buf) -> Result<Vec<u8>> {
    let request = decode_request(input)?;
    let response = run(request);
    Ok(response.encode_to_vec())
}
