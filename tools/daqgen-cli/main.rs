use clap::{Parser, Subcommand};
use daqgen::prelude::*;
use std::fs;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

/// Compiles visual DAQ programs into Python source
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to a JSON file with code generation options
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Write the output here instead of stdout
    #[arg(short, long, global = true)]
    output: Option<String>,

    /// Log compilation details to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile a `.daq` project document into a runnable program
    Graph { project_path: String },
    /// Compile a block-workspace state blob into a script
    Blocks { state_path: String },
    /// Compile a block definition into a schema and a rule stub
    Schema {
        definition_path: String,
        /// Emit only the rule stub
        #[arg(long)]
        stub_only: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let options = match &cli.config {
        Some(path) => CodegenOptions::from_file(path).unwrap_or_else(|e| {
            exit_with_error(&format!("Failed to load config '{}': {}", path, e))
        }),
        None => CodegenOptions::default(),
    };
    let toolchain = Toolchain::builder().with_options(options).build();

    let start = Instant::now();
    let (text, diagnostics) = match &cli.command {
        Command::Graph { project_path } => {
            let json = read_input(project_path);
            let program = GraphCompiler::new(&toolchain)
                .compile_document(&json)
                .unwrap_or_else(|e| exit_with_error(&format!("Invalid project: {}", e)));
            (program.source, program.diagnostics)
        }
        Command::Blocks { state_path } => {
            let workspace = Workspace::from_state(&read_input(state_path))
                .unwrap_or_else(|e| exit_with_error(&format!("Invalid block state: {}", e)));
            let output = BlockCompiler::new(&toolchain).compile_workspace(&workspace);
            (output.code, output.diagnostics)
        }
        Command::Schema {
            definition_path,
            stub_only,
        } => {
            let workspace = Workspace::from_state(&read_input(definition_path))
                .unwrap_or_else(|e| exit_with_error(&format!("Invalid definition: {}", e)));
            let output = SchemaCompiler::new().compile_workspace(&workspace);
            for warning in &output.warnings {
                eprintln!("warning: {}", warning);
            }
            let text = if *stub_only {
                output.stub
            } else {
                format!("{}\n\n{}", output.schema, output.stub)
            };
            (text, Vec::new())
        }
    };
    tracing::info!(elapsed = ?start.elapsed(), "compilation finished");

    for diagnostic in &diagnostics {
        eprintln!("warning: {}", diagnostic);
    }

    match &cli.output {
        Some(path) => fs::write(path, text)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to write '{}': {}", path, e))),
        None => print!("{}", text),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_input(path: &str) -> String {
    fs::read_to_string(path)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to read '{}': {}", path, e)))
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
