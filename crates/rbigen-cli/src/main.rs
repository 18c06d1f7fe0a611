//! protoc-gen-rbi - Sorbet RBI stubs for Ruby protobuf classes
//!
//! Run without input flags, this is a protoc plugin: protoc sends a
//! `CodeGeneratorRequest` on stdin and reads the response from stdout.
//! Given compiled descriptor sets, it writes the same stubs to disk.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser};
use prost_reflect::DescriptorPool;
use rbigen_core::{plugin, Error, GeneratedFile, GeneratorConfig};
use std::collections::HashMap;
use std::fs;
use std::io::{Read, Write};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, error, info, trace, warn, Level};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

/// Extensions recognized as serialized `FileDescriptorSet`s in directory mode
const DESCRIPTOR_SET_EXTENSIONS: &[&str] = &["pb", "desc", "binpb"];

/// Generate Sorbet RBI stubs for Ruby protobuf classes
#[derive(Parser, Debug)]
#[command(name = "protoc-gen-rbi")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    input: InputMode,

    /// Output directory for generated .rbi files
    #[arg(short, long, default_value = ".")]
    output: PathBuf,

    /// Only generate stubs for these proto files (repeatable)
    #[arg(long = "file", value_name = "PROTO")]
    files: Vec<String>,

    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Do not generate `_services_pb.rbi` files
    #[arg(long)]
    no_grpc: bool,

    /// Omit decode/encode/descriptor class methods and enum helpers
    #[arg(long)]
    hide_common_methods: bool,

    /// Declare messages as subclasses of ::Google::Protobuf::AbstractMessage
    #[arg(long)]
    use_abstract_message: bool,

    /// Annotate setter containers as T::Hash/T::Array
    #[arg(long)]
    use_generic_containers: bool,

    /// Dry run - don't write files, just show what would be generated
    #[arg(long)]
    dry_run: bool,

    /// Overwrite existing files whose content differs
    #[arg(long)]
    force: bool,
}

#[derive(Args, Debug)]
#[group(required = false, multiple = false)]
struct InputMode {
    /// Path to a serialized FileDescriptorSet (protoc -o / buf build -o)
    #[arg(short = 's', long)]
    descriptor_set: Option<PathBuf>,

    /// Path to a directory of descriptor sets to process
    #[arg(short, long)]
    directory: Option<PathBuf>,
}

impl Cli {
    fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig::new()
            .grpc(!self.no_grpc)
            .hide_common_methods(self.hide_common_methods)
            .abstract_base(self.use_abstract_message)
            .generic_containers(self.use_generic_containers)
    }
}

/// What happened to one generated file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteOutcome {
    Written,
    Unchanged,
}

/// Tracks generated files across descriptor sets
#[derive(Default)]
struct OutputRegistry {
    /// Maps output name -> content hash of the first occurrence
    seen: HashMap<String, String>,
    /// Statistics
    stats: RegistryStats,
}

#[derive(Default)]
struct RegistryStats {
    generated: usize,
    duplicates_skipped: usize,
    conflicts_skipped: usize,
    written: usize,
    unchanged: usize,
    failed: usize,
}

impl OutputRegistry {
    fn new() -> Self {
        Self::default()
    }

    /// Compute a short hash of the content (first 8 chars of blake3)
    fn content_hash(content: &str) -> String {
        let hash = blake3::hash(content.as_bytes());
        hash.to_hex()[..8].to_string()
    }

    /// Registers an output name and returns whether it should be written.
    ///
    /// The same file can be generated from several descriptor sets. Exact
    /// duplicates are dropped; a differing one keeps the first occurrence.
    fn register(&mut self, name: &str, content_hash: &str) -> bool {
        self.stats.generated += 1;

        match self.seen.get(name) {
            None => {
                self.seen.insert(name.to_string(), content_hash.to_string());
                true
            }
            Some(first) if first == content_hash => {
                debug!("Skipping duplicate: {} (hash: {})", name, content_hash);
                self.stats.duplicates_skipped += 1;
                false
            }
            Some(first) => {
                warn!(
                    "Skipping conflict: {} (hash {} differs from first occurrence {})",
                    name, content_hash, first
                );
                self.stats.conflicts_skipped += 1;
                false
            }
        }
    }

    fn print_summary(&self) {
        info!(
            "Summary: {} generated, {} duplicates skipped, {} conflicts skipped, {} written, {} unchanged, {} failed",
            self.stats.generated,
            self.stats.duplicates_skipped,
            self.stats.conflicts_skipped,
            self.stats.written,
            self.stats.unchanged,
            self.stats.failed
        );
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    // stdout carries the plugin response, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Dispatch based on input mode
    if let Some(ref set) = cli.input.descriptor_set {
        process_single_set(&cli, set)
    } else if let Some(ref directory) = cli.input.directory {
        process_directory(&cli, directory)
    } else {
        run_plugin()
    }
}

/// Act as a protoc plugin on stdin/stdout
fn run_plugin() -> Result<()> {
    let mut input = Vec::new();
    std::io::stdin()
        .read_to_end(&mut input)
        .context("Failed to read CodeGeneratorRequest from stdin")?;
    trace!("Read {} byte request", input.len());

    let output = plugin::run_bytes(input.as_slice()).context("Failed to decode CodeGeneratorRequest")?;

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&output)
        .context("Failed to write CodeGeneratorResponse to stdout")?;
    stdout.flush()?;
    Ok(())
}

/// Process a single descriptor set
fn process_single_set(cli: &Cli, path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("Descriptor set does not exist: {}", path.display());
    }
    if !path.is_file() {
        bail!("Descriptor set path is not a file: {}", path.display());
    }

    let mut registry = OutputRegistry::new();
    process_descriptor_set(cli, path, true, &mut registry)?;

    if !cli.dry_run {
        registry.print_summary();
    }
    if registry.stats.failed > 0 {
        bail!("{} file(s) could not be written", registry.stats.failed);
    }

    Ok(())
}

/// Process a directory of descriptor sets recursively
fn process_directory(cli: &Cli, directory: &Path) -> Result<()> {
    if !directory.exists() {
        bail!("Directory does not exist: {}", directory.display());
    }
    if !directory.is_dir() {
        bail!("Path is not a directory: {}", directory.display());
    }

    info!("Scanning directory: {}", directory.display());

    let mut registry = OutputRegistry::new();
    let mut sets_processed = 0;

    for entry in WalkDir::new(directory)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() {
            continue;
        }

        // Skip hidden files
        if path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with('.'))
            .unwrap_or(false)
        {
            continue;
        }

        if !is_descriptor_set(path) {
            trace!("Skipping non-descriptor file: {}", path.display());
            continue;
        }

        debug!("Processing descriptor set: {}", path.display());
        if let Err(e) = process_descriptor_set(cli, path, false, &mut registry) {
            let fatal = e
                .downcast_ref::<Error>()
                .map(Error::is_fatal)
                .unwrap_or(false);
            if fatal {
                return Err(e.context(format!("Aborting at {}", path.display())));
            }
            // Log error but continue with other sets
            warn!("Error processing {}: {:#}", path.display(), e);
        }
        sets_processed += 1;
    }

    info!("Processed {} descriptor sets", sets_processed);

    if !cli.dry_run {
        registry.print_summary();
    }
    if registry.stats.failed > 0 {
        bail!("{} file(s) could not be written", registry.stats.failed);
    }

    Ok(())
}

fn is_descriptor_set(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| DESCRIPTOR_SET_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Picks the proto files of `pool` to generate.
///
/// Without a filter every file is generated except the well-known types,
/// whose stubs ship with the runtime. With a filter, only the named files
/// that are present in this pool.
fn select_files(pool: &DescriptorPool, requested: &[String]) -> Vec<String> {
    if requested.is_empty() {
        pool.files()
            .map(|file| file.name().to_string())
            .filter(|name| !name.starts_with("google/protobuf/"))
            .collect()
    } else {
        requested
            .iter()
            .filter(|name| pool.get_file_by_name(name).is_some())
            .cloned()
            .collect()
    }
}

/// Generate and write the stubs of one descriptor set.
///
/// `strict` makes a `--file` name missing from the set an error; in
/// directory mode each set only holds some of the requested files.
fn process_descriptor_set(
    cli: &Cli,
    set_path: &Path,
    strict: bool,
    registry: &mut OutputRegistry,
) -> Result<()> {
    trace!("Reading {}", set_path.display());
    let data = fs::read(set_path).map_err(|e| Error::file_read(set_path, e))?;

    let pool = DescriptorPool::decode(data.as_slice())
        .with_context(|| format!("Failed to decode descriptor set: {}", set_path.display()))?;

    let files = select_files(&pool, &cli.files);
    if strict && files.len() < cli.files.len() {
        let missing = cli
            .files
            .iter()
            .find(|name| !files.contains(name))
            .cloned()
            .unwrap_or_default();
        return Err(Error::file_not_found(missing).into());
    }
    if files.is_empty() {
        trace!("Nothing to generate in {}", set_path.display());
        return Ok(());
    }

    debug!("Generating {} file(s) from {}", files.len(), set_path.display());
    let generated = plugin::generate(&pool, &files, &cli.generator_config())?;

    for file in generated {
        emit(cli, &file, registry)?;
    }

    Ok(())
}

/// Write (or show) one generated file
fn emit(cli: &Cli, file: &GeneratedFile, registry: &mut OutputRegistry) -> Result<()> {
    let output_path = resolve_output_path(&cli.output, &file.name)?;
    let content_hash = OutputRegistry::content_hash(&file.content);

    if !registry.register(&file.name, &content_hash) {
        return Ok(());
    }

    if cli.dry_run {
        println!("Would write: {}", output_path.display());
        if cli.verbose > 0 {
            println!("---");
            println!("{}", file.content);
            println!("---");
        }
        return Ok(());
    }

    match write_stub_file(&output_path, &file.content, cli.force) {
        Ok(WriteOutcome::Written) => {
            println!("Wrote {}", output_path.display());
            registry.stats.written += 1;
        }
        Ok(WriteOutcome::Unchanged) => {
            debug!("Unchanged: {} (hash: {})", output_path.display(), content_hash);
            registry.stats.unchanged += 1;
        }
        Err(e) => {
            error!("Failed to write {}: {:#}", output_path.display(), e);
            registry.stats.failed += 1;
        }
    }

    Ok(())
}

/// Joins a generated file name onto the output directory.
///
/// Names come from the descriptor set, so anything that could leave the
/// output directory is rejected.
fn resolve_output_path(output_dir: &Path, name: &str) -> rbigen_core::Result<PathBuf> {
    let relative = Path::new(name);
    let escapes = relative.components().any(|c| {
        matches!(
            c,
            Component::ParentDir | Component::RootDir | Component::Prefix(_)
        )
    });
    if name.is_empty() || escapes {
        return Err(Error::path_traversal(relative));
    }
    Ok(output_dir.join(relative))
}

/// Write a stub file, leaving identical files untouched
fn write_stub_file(output_path: &Path, content: &str, force: bool) -> Result<WriteOutcome> {
    // Create parent directories
    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    if output_path.exists() {
        let existing = fs::read(output_path).map_err(|e| Error::file_read(output_path, e))?;
        if blake3::hash(&existing) == blake3::hash(content.as_bytes()) {
            return Ok(WriteOutcome::Unchanged);
        }
        if !force {
            bail!(
                "File already exists with different content: {} (use --force to overwrite)",
                output_path.display()
            );
        }
    }

    fs::write(output_path, content).map_err(|e| Error::file_write(output_path, e))?;

    Ok(WriteOutcome::Written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;
    use prost::Message;
    use prost_types::field_descriptor_proto::{Label, Type};
    use prost_types::{
        DescriptorProto, FieldDescriptorProto, FileDescriptorProto, FileDescriptorSet,
    };
    use tempfile::TempDir;

    fn descriptor_set() -> Vec<u8> {
        let file = |name: &str, package: &str, message: &str| FileDescriptorProto {
            name: Some(name.to_string()),
            package: Some(package.to_string()),
            message_type: vec![DescriptorProto {
                name: Some(message.to_string()),
                field: vec![FieldDescriptorProto {
                    name: Some("id".to_string()),
                    number: Some(1),
                    label: Some(Label::Optional as i32),
                    r#type: Some(Type::Int64 as i32),
                    ..Default::default()
                }],
                ..Default::default()
            }],
            syntax: Some("proto3".to_string()),
            ..Default::default()
        };
        FileDescriptorSet {
            file: vec![
                file("google/protobuf/empty.proto", "google.protobuf", "Empty"),
                file("shop/v1/order.proto", "shop.v1", "Order"),
            ],
        }
        .encode_to_vec()
    }

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["protoc-gen-rbi"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_output_registry_deduplication() {
        let mut registry = OutputRegistry::new();
        let hash = OutputRegistry::content_hash("# typed: strict\n");

        assert!(registry.register("a_pb.rbi", &hash));
        assert!(!registry.register("a_pb.rbi", &hash));
        assert_eq!(registry.stats.duplicates_skipped, 1);

        let other = OutputRegistry::content_hash("# typed: true\n");
        assert!(!registry.register("a_pb.rbi", &other));
        assert_eq!(registry.stats.conflicts_skipped, 1);
        assert_eq!(registry.stats.generated, 3);
    }

    #[test]
    fn test_content_hash() {
        let hash1 = OutputRegistry::content_hash("hello");
        let hash2 = OutputRegistry::content_hash("hello");
        let hash3 = OutputRegistry::content_hash("world");

        assert_eq!(hash1, hash2);
        assert_ne!(hash1, hash3);
        assert_eq!(hash1.len(), 8);
    }

    #[test]
    fn test_resolve_output_path() {
        let out = Path::new("/tmp/out");
        assert_eq!(
            resolve_output_path(out, "shop/v1/order_pb.rbi").unwrap(),
            PathBuf::from("/tmp/out/shop/v1/order_pb.rbi")
        );
        assert!(matches!(
            resolve_output_path(out, "../escape_pb.rbi"),
            Err(Error::PathTraversal { .. })
        ));
        assert!(matches!(
            resolve_output_path(out, "/etc/passwd"),
            Err(Error::PathTraversal { .. })
        ));
        assert!(resolve_output_path(out, "").is_err());
    }

    #[test]
    fn test_is_descriptor_set() {
        assert!(is_descriptor_set(Path::new("/tmp/api.pb")));
        assert!(is_descriptor_set(Path::new("/tmp/api.binpb")));
        assert!(is_descriptor_set(Path::new("/tmp/API.DESC")));
        assert!(!is_descriptor_set(Path::new("/tmp/api.proto")));
        assert!(!is_descriptor_set(Path::new("/tmp/api")));
    }

    #[test]
    fn test_select_files_skips_well_known_types() {
        let pool = DescriptorPool::decode(descriptor_set().as_slice()).unwrap();
        assert_eq!(select_files(&pool, &[]), vec!["shop/v1/order.proto"]);

        let requested = vec!["google/protobuf/empty.proto".to_string(), "missing.proto".to_string()];
        assert_eq!(select_files(&pool, &requested), vec!["google/protobuf/empty.proto"]);
    }

    #[test]
    fn test_write_stub_file_outcomes() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/dir/x_pb.rbi");

        assert_eq!(write_stub_file(&path, "one\n", false).unwrap(), WriteOutcome::Written);
        assert_eq!(write_stub_file(&path, "one\n", false).unwrap(), WriteOutcome::Unchanged);
        assert!(write_stub_file(&path, "two\n", false).is_err());
        assert_eq!(write_stub_file(&path, "two\n", true).unwrap(), WriteOutcome::Written);
        assert_eq!(fs::read_to_string(&path).unwrap(), "two\n");
    }

    #[test]
    fn test_process_descriptor_set_writes_stubs() {
        let temp_dir = TempDir::new().unwrap();
        let set_path = temp_dir.path().join("api.pb");
        fs::write(&set_path, descriptor_set()).unwrap();
        let out_dir = temp_dir.path().join("rbi");

        let cli = cli(&["-s", set_path.to_str().unwrap(), "-o", out_dir.to_str().unwrap()]);
        let mut registry = OutputRegistry::new();
        process_descriptor_set(&cli, &set_path, true, &mut registry).unwrap();

        let written = fs::read_to_string(out_dir.join("shop/v1/order_pb.rbi")).unwrap();
        assert!(written.contains("class Shop::V1::Order\n"));
        assert!(!out_dir.join("google/protobuf/empty_pb.rbi").exists());
        assert_eq!(registry.stats.written, 1);

        // A second run leaves the file alone.
        let mut registry = OutputRegistry::new();
        process_descriptor_set(&cli, &set_path, true, &mut registry).unwrap();
        assert_eq!(registry.stats.unchanged, 1);
        assert_eq!(registry.stats.written, 0);
    }

    #[test]
    fn test_process_descriptor_set_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let set_path = temp_dir.path().join("api.pb");
        fs::write(&set_path, descriptor_set()).unwrap();

        let cli = cli(&["-s", set_path.to_str().unwrap(), "--file", "nope.proto", "--dry-run"]);
        let err = process_descriptor_set(&cli, &set_path, true, &mut OutputRegistry::new()).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::FileNotFound { .. })
        ));

        // Directory mode tolerates sets that lack the file.
        process_descriptor_set(&cli, &set_path, false, &mut OutputRegistry::new()).unwrap();
    }

    #[test]
    fn test_generator_flags() {
        let cli = cli(&["--no-grpc", "--use-generic-containers"]);
        let config = cli.generator_config();
        assert!(!config.grpc);
        assert!(config.generic_containers);
        assert!(!config.hide_common_methods);
        assert!(cli.input.descriptor_set.is_none());
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
