//! pscheck CLI binary entry point.
//! Resolves configuration, runs validation and prints the report.

use clap::Parser;
use pscheck::cli::{Cli, Commands};
use pscheck::rules::Vocabulary;
use pscheck::validate::{self, Mode, Pipeline, ValidateOptions};
use pscheck::{config, output};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    // Logs go to stderr so `--output json` stays machine-readable.
    let filter = EnvFilter::try_from_env("PSCHECK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    match cli.cmd {
        Commands::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
        }
        Commands::Validate {
            target,
            repo_root,
            playbook_dir,
            syntax_only,
            cross_file,
            output,
        } => {
            let eff = config::resolve_effective(
                repo_root.as_deref(),
                playbook_dir.as_deref(),
                output.as_deref(),
            );
            tracing::debug!(
                repo_root = %eff.repo_root.display(),
                playbook_dir = %eff.playbook_dir.display(),
                config_found = eff.config_found,
                "resolved configuration"
            );
            if eff.output != "human" && eff.output != "json" {
                eprintln!(
                    "{} unknown output mode '{}' (expected human|json)",
                    output::error_prefix(),
                    eff.output
                );
                std::process::exit(2);
            }
            if !eff.playbook_dir.is_dir() {
                eprintln!(
                    "{} playbook directory not found: {}",
                    output::error_prefix(),
                    eff.playbook_dir.to_string_lossy()
                );
                std::process::exit(2);
            }
            if !eff.config_found && eff.output != "json" {
                eprintln!(
                    "{} No pscheck.toml found; using defaults.",
                    output::note_prefix()
                );
            }
            let mode = if syntax_only {
                Mode::SyntaxOnly
            } else if cross_file {
                Mode::CrossFileOnly
            } else {
                Mode::Full
            };
            let opts = ValidateOptions {
                playbook_dir: eff.playbook_dir.clone(),
                target: target.map(PathBuf::from),
                extension: eff.extension.clone(),
                exclude: eff.exclude.clone(),
                pipeline: Pipeline {
                    mode,
                    vocabulary: Vocabulary::extended(
                        &eff.extra_field_types,
                        &eff.extra_component_types,
                    ),
                    scope: None,
                },
            };
            let report = validate::run(&opts);
            output::print_report(&report, &eff.output);
            if report.has_errors() {
                std::process::exit(1);
            }
        }
    }
}
