mod commands;
mod config;

use cid_schema::ChecksumVariant;
use clap::{Parser, Subcommand};
use clap_complete::Shell;
use commands::{EXIT_FAILURE, EXIT_MANIFEST_ERROR};
use config::CliConfig;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "cid",
    version,
    about = "Content-derived names and checksums for container image manifests"
)]
struct Cli {
    /// Path to a JSON config file (default: ~/.config/cid/config.json).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output results as structured JSON.
    #[arg(long, default_value_t = false, global = true)]
    json: bool,

    /// Enable verbose (debug) logging output.
    #[arg(short, long, default_value_t = false, global = true)]
    verbose: bool,

    /// Enable trace-level logging (more detailed than --verbose).
    #[arg(long, default_value_t = false, global = true)]
    trace: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print the normal form name (domain/path/os-arch-version).
    NormalForm {
        /// Path to manifest JSON file, or '-' for stdin.
        manifest: PathBuf,
    },
    /// Print a checksum of a manifest.
    Checksum {
        /// Path to manifest JSON file, or '-' for stdin.
        manifest: PathBuf,
        /// Checksum variant: 'manifest' or 'extended'.
        #[arg(long)]
        variant: Option<ChecksumVariant>,
        /// Shorthand for --variant extended.
        #[arg(long, default_value_t = false, conflicts_with = "variant")]
        extended: bool,
    },
    /// Show the normal form, short id, and both checksums.
    Inspect {
        /// Path to manifest JSON file, or '-' for stdin.
        manifest: PathBuf,
    },
    /// Print the canonical value sequence the manifest checksum is computed over.
    Canonical {
        /// Path to manifest JSON file, or '-' for stdin.
        manifest: PathBuf,
    },
    /// Verify a manifest against an expected checksum.
    Verify {
        /// Path to manifest JSON file, or '-' for stdin.
        manifest: PathBuf,
        /// Expected hex checksum.
        expected: String,
        /// Checksum variant: 'manifest' or 'extended'.
        #[arg(long)]
        variant: Option<ChecksumVariant>,
        /// Shorthand for --variant extended.
        #[arg(long, default_value_t = false, conflicts_with = "variant")]
        extended: bool,
    },
    /// Re-encode a manifest, refreshing its raw extended metadata.
    Encode {
        /// Path to manifest JSON file, or '-' for stdin.
        manifest: PathBuf,
        /// Write to this file instead of stdout.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Generate shell completions for bash, zsh, fish, elvish, or powershell.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
    /// Generate man pages in the specified directory.
    ManPages {
        /// Output directory for man pages.
        #[arg(default_value = "man")]
        dir: PathBuf,
    },
}

fn pick_variant(
    config: &CliConfig,
    variant: Option<ChecksumVariant>,
    extended: bool,
) -> ChecksumVariant {
    if extended {
        ChecksumVariant::Extended
    } else {
        variant.unwrap_or(config.variant)
    }
}

fn main() -> ExitCode {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let msg = info.to_string();
        if msg.contains("Broken pipe")
            || msg.contains("broken pipe")
            || msg.contains("os error 32")
            || msg.contains("failed printing to stdout")
        {
            std::process::exit(0);
        }
        default_hook(info);
    }));

    let cli = Cli::parse();

    let default_level = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else {
        "warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("CID_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let config = match CliConfig::resolve(cli.config.as_deref()) {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("error: {msg}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };
    let json_output = cli.json;

    let result = match cli.command {
        Commands::NormalForm { manifest } => commands::normal_form::run(&manifest, json_output),
        Commands::Checksum {
            manifest,
            variant,
            extended,
        } => commands::checksum::run(
            &manifest,
            pick_variant(&config, variant, extended),
            json_output,
        ),
        Commands::Inspect { manifest } => commands::inspect::run(&manifest, json_output),
        Commands::Canonical { manifest } => commands::canonical::run(&manifest, json_output),
        Commands::Verify {
            manifest,
            expected,
            variant,
            extended,
        } => commands::verify::run(
            &manifest,
            &expected,
            pick_variant(&config, variant, extended),
            json_output,
        ),
        Commands::Encode { manifest, output } => {
            commands::encode::run(&manifest, output.as_deref())
        }
        Commands::Completions { shell } => commands::completions::run::<Cli>(shell),
        Commands::ManPages { dir } => commands::man_pages::run::<Cli>(&dir),
    };

    match result {
        Ok(code) => ExitCode::from(code),
        Err(msg) => {
            eprintln!("error: {msg}");
            let code = if msg.starts_with("failed to read manifest")
                || msg.starts_with("failed to decode manifest")
                || msg.starts_with("failed to encode manifest")
            {
                EXIT_MANIFEST_ERROR
            } else {
                EXIT_FAILURE
            };
            ExitCode::from(code)
        }
    }
}
