//! bcache-key CLI
//!
//! Entry point for the `bcache-key` command-line tool.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process;

use bcache_key::{
    derive_key, find_wrapper, logging, ArgList, KeyConfig, KeyDerivation, KeyError,
    ProgramWrapper, Wrapper, WrapperContext,
};

/// Exit code when the invocation cannot be keyed and should run uncached.
const EXIT_FALLBACK: i32 = 2;

#[derive(Parser)]
#[command(name = "bcache-key")]
#[command(about = "Deterministic cache keys for compiler invocations", version)]
struct Cli {
    /// Path to config file (default: $BCACHE_CONFIG)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Directory for temporary files (overrides config)
    #[arg(long, global = true)]
    temp_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the cache key and declared build files as JSON
    Key {
        /// The toolchain command (after --)
        #[arg(last = true, required = true)]
        cmd: Vec<String>,
    },

    /// Show the inputs that make up the cache key
    Explain {
        /// Output in human-readable format instead of JSON
        #[arg(long)]
        human: bool,

        /// The toolchain command (after --)
        #[arg(last = true, required = true)]
        cmd: Vec<String>,
    },

    /// Report which wrapper handles a command
    Detect {
        /// The toolchain command (after --)
        #[arg(last = true, required = true)]
        cmd: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config, cli.temp_dir) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(1);
        }
    };
    logging::initialize(&config);
    let ctx = WrapperContext::from_config(&config);

    match cli.command {
        Commands::Key { cmd } => run_key(&ctx, cmd),
        Commands::Explain { human, cmd } => run_explain(&ctx, human, cmd),
        Commands::Detect { cmd } => run_detect(&ctx, cmd),
    }
}

fn load_config(path: Option<PathBuf>, temp_dir: Option<PathBuf>) -> Result<KeyConfig, String> {
    let mut config = KeyConfig::load(path.as_deref()).map_err(|e| e.to_string())?;
    if temp_dir.is_some() {
        config.temp_dir = temp_dir;
        config.validate().map_err(|e| e.to_string())?;
    }
    Ok(config)
}

fn run_key(ctx: &WrapperContext, cmd: Vec<String>) {
    let derivation = derive_or_exit(ctx, cmd);
    let output = serde_json::json!({
        "key": derivation.key,
        "build_files": derivation.build_files,
    });
    print_json(&output);
}

fn run_explain(ctx: &WrapperContext, human: bool, cmd: Vec<String>) {
    let derivation = derive_or_exit(ctx, cmd);

    if human {
        println!("Key:        {}", derivation.key);
        println!("Wrapper:    {}", derivation.inputs.wrapper);
        println!("Mode:       {}", derivation.mode);
        println!("Program:    sha256:{}", derivation.inputs.program_id_sha256);
        println!("Content:    sha256:{}", derivation.inputs.content_sha256);
        println!("Arguments:  {}", derivation.inputs.relevant_args.join(" ", true));
        println!("Outputs:");
        for (role, file) in derivation.build_files.iter() {
            println!("  {:<10} {}", role, file.path);
        }
    } else {
        print_json(&derivation);
    }
}

fn run_detect(ctx: &WrapperContext, cmd: Vec<String>) {
    let wrapper = find_or_exit(ctx, cmd);
    println!("{}", wrapper.name());
}

fn find_or_exit(ctx: &WrapperContext, cmd: Vec<String>) -> Wrapper {
    match find_wrapper(&ArgList::from(cmd), ctx) {
        Some(wrapper) => wrapper,
        None => {
            eprintln!("No wrapper handles this command");
            process::exit(EXIT_FALLBACK);
        }
    }
}

fn derive_or_exit(ctx: &WrapperContext, cmd: Vec<String>) -> KeyDerivation {
    let wrapper = find_or_exit(ctx, cmd);
    match derive_key(&wrapper) {
        Ok(derivation) => derivation,
        Err(e) => {
            report_error(&e);
            let fallback = e.kind().map(|k| k.is_fallback()).unwrap_or(false);
            process::exit(if fallback { EXIT_FALLBACK } else { 1 });
        }
    }
}

fn report_error(e: &KeyError) {
    match e.kind() {
        Some(kind) => eprintln!("Error [{}]: {}", kind, e),
        None => eprintln!("Error: {}", e),
    }
    if let KeyError::Wrapper(
        bcache_key::WrapperError::PreprocessFailed { output, .. }
        | bcache_key::WrapperError::ToolchainProbeFailed { output, .. },
    ) = e
    {
        eprint!("{}", output);
    }
}

fn print_json<T: serde::Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}
