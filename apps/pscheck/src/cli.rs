//! CLI argument parsing via `clap`.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "pscheck",
    version,
    about = "Static validator for PlayScript documents",
    long_about = "pscheck — checks PlayScript artifacts (actions, schemas, layouts, automations, integrations, forms, reports, embeddings, endpoints) for structural defects and dangling cross-file references.\n\nConfiguration precedence: CLI > pscheck.toml > defaults.",
    after_help = "Examples:\n  pscheck validate\n  pscheck validate actions/\n  pscheck validate schemas/contact.ps --output json\n  pscheck validate --syntax-only\n  pscheck validate --cross-file",
    arg_required_else_help = true
)]
/// Top-level CLI options and subcommands.
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show version
    #[command(about = "Show version", long_about = "Print the current pscheck version.")]
    Version,
    /// Validate documents
    #[command(
        about = "Validate PlayScript documents",
        long_about = "Load every document under the playbook directory, check each one, then resolve references across files. Errors fail the run; warnings do not.",
        after_help = "Examples:\n  pscheck validate\n  pscheck validate automations/welcome.ps\n  pscheck validate --playbook-dir playbook --output json"
    )]
    Validate {
        #[arg(help = "File or directory to report on (default: everything)")]
        target: Option<String>,
        #[arg(long, help = "Repository root (default: current dir)")]
        repo_root: Option<String>,
        #[arg(long, help = "Playbook directory containing the documents")]
        playbook_dir: Option<String>,
        #[arg(long, action = clap::ArgAction::SetTrue, conflicts_with = "cross_file", help = "Only run single-document checks")]
        syntax_only: bool,
        #[arg(long = "cross-file", action = clap::ArgAction::SetTrue, help = "Only run cross-file reference checks")]
        cross_file: bool,
        #[arg(long, help = "Output mode: human|json (default: human)")]
        output: Option<String>,
    },
}
