use ariadne::{Color, Label, Report, ReportKind, Source};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use dtsmod_core::{resolve, DeclarationUnit, PatternRewriter};
use dtsmod_driver::config::{DEFAULT_CONFIG_FILE, DEFAULT_ROOT};
use dtsmod_driver::{BuildConfig, Builder, ConfigError, DriverError};

#[derive(Parser)]
#[command(
    name = "dtsmod",
    version,
    about = "Relocate TypeScript declaration trees under package namespaces",
    long_about = "Rewrites the module references of published .d.ts trees so they stay valid\nonce wrapped in `declare module` blocks, and emits an index of lazy loaders."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Clear the destination and relocate every configured package
    Build {
        /// Configuration file
        #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
        config: PathBuf,

        /// Override the destination directory
        #[arg(long)]
        destination: Option<PathBuf>,

        /// Override the manifest file name
        #[arg(long)]
        manifest: Option<String>,

        /// Enable verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Rewrite a single declaration file and print the result (debug)
    Rewrite {
        /// Input declaration file
        input: PathBuf,

        /// Namespace the file is relocated under
        #[arg(long)]
        namespace: String,

        /// Package root declaration file
        #[arg(long, default_value = DEFAULT_ROOT)]
        root: String,

        /// Path of the file inside its package (defaults to its file name)
        #[arg(long)]
        relative: Option<String>,
    },

    /// Resolve a module reference against a namespaced file path (debug)
    Resolve {
        /// Namespaced path of the referencing file, e.g. `three/src/core/Object3D`
        current: String,

        /// Module reference as written in the file
        reference: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            config,
            destination,
            manifest,
            verbose,
        } => {
            init_tracing(verbose);
            build_command(config, destination, manifest).await
        }
        Commands::Rewrite {
            input,
            namespace,
            root,
            relative,
        } => {
            init_tracing(false);
            rewrite_command(input, namespace, root, relative)
        }
        Commands::Resolve { current, reference } => {
            println!("{}", resolve(&current, &reference));
            ExitCode::SUCCESS
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

async fn build_command(config_path: PathBuf, destination: Option<PathBuf>, manifest: Option<String>) -> ExitCode {
    let mut config = match BuildConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            report_config_error(&e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(destination) = destination {
        config = config.with_destination(destination);
    }
    if let Some(manifest) = manifest {
        config = config.with_manifest(manifest);
    }

    match Builder::new(config).run().await {
        Ok(report) => {
            println!(
                "Relocated {} files from {} packages; manifest written to: {}",
                report.files,
                report.packages,
                report.manifest_path.display()
            );
            ExitCode::SUCCESS
        }
        Err(DriverError::Config(e)) => {
            report_config_error(&e);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn rewrite_command(input: PathBuf, namespace: String, root: String, relative: Option<String>) -> ExitCode {
    let source = match fs::read_to_string(&input) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Error reading file: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let relative = relative.unwrap_or_else(|| file_name(&input));

    match DeclarationUnit::rewrite(&namespace, &relative, &root, &source, &PatternRewriter::new()) {
        Ok(unit) => {
            println!("{}", unit.text());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

// Helper functions

fn report_config_error(err: &ConfigError) {
    match err {
        ConfigError::Parse {
            path,
            contents,
            source,
        } => {
            let filename = path.to_string_lossy().to_string();
            let start = char_offset(contents, source.line(), source.column());
            let end = (start + 1).min(contents.chars().count());
            report_error("E0001", "Invalid configuration", &source.to_string(), start, end, &filename, contents);
        }
        other => eprintln!("Error: {}", other),
    }
}

/// Byte offset of a 1-based line/column position, clamped to the source.
fn byte_offset(source: &str, line: usize, column: usize) -> usize {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(source.len())
}

/// Character offset of a 1-based line/column position, the unit ariadne
/// spans are measured in.
fn char_offset(source: &str, line: usize, column: usize) -> usize {
    let mut byte = byte_offset(source, line, column);
    while !source.is_char_boundary(byte) {
        byte -= 1;
    }
    source[..byte].chars().count()
}

fn report_error(code: &str, title: &str, message: &str, start: usize, end: usize, filename: &str, source: &str) {
    let span = (filename, start..end);
    let _ = Report::build(ReportKind::Error, span.clone())
        .with_code(code)
        .with_message(title)
        .with_label(
            Label::new(span)
                .with_message(message)
                .with_color(Color::Red),
        )
        .finish()
        .eprint((filename, Source::from(source)));
}
