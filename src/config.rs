//! Command line configuration.

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

use crate::highlight::DEFAULT_THEME;
use crate::report::{DEFAULT_TITLE, ReportFormat, report_file_name};

/// Command line configuration for Redlines.
#[derive(Debug, Clone, Parser)]
#[command(name = "redlines", version, about, long_about = None)]
pub struct Config {
    #[command(subcommand)]
    pub command: Command,
}

/// Redlines subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Render a markdown note to an HTML fragment
    Render(RenderArgs),
    /// Build a report from notes in an export file
    Report(ReportArgs),
}

#[derive(Debug, Clone, Args)]
pub struct RenderArgs {
    /// Markdown file to render
    pub input: PathBuf,

    /// Output file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Notes export used to resolve [[note-id|text]] links
    #[arg(long)]
    pub notes: Option<PathBuf>,

    /// Highlight fenced code blocks
    #[arg(long)]
    pub highlight: bool,

    /// Syntax highlighting theme (InspiredGitHub, base16-ocean.dark, etc.)
    #[arg(long, default_value = DEFAULT_THEME)]
    pub theme: String,
}

#[derive(Debug, Clone, Args)]
pub struct ReportArgs {
    /// Notes export file
    pub notes: PathBuf,

    /// Note id to include, repeatable (all notes when omitted)
    #[arg(short = 'n', long = "note")]
    pub note_ids: Vec<String>,

    /// Report title
    #[arg(long, default_value = DEFAULT_TITLE)]
    pub title: String,

    /// Report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Markdown)]
    pub format: ReportFormat,

    /// Output file (derived from the title when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Highlight fenced code blocks in HTML reports
    #[arg(long)]
    pub highlight: bool,

    /// Syntax highlighting theme
    #[arg(long, default_value = DEFAULT_THEME)]
    pub theme: String,

    /// Do not open HTML reports in the browser
    #[arg(long)]
    pub no_open: bool,
}

impl Config {
    /// Parses configuration from command line arguments.
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }

    /// Validates configuration.
    ///
    /// # Errors
    ///
    /// Returns error if an input file does not exist or the report title is blank.
    pub fn validate(&self) -> Result<()> {
        match &self.command {
            Command::Render(args) => require_file(&args.input, "Input file")?,
            Command::Report(args) => {
                require_file(&args.notes, "Notes file")?;
                if args.title.trim().is_empty() {
                    bail!("Report title must not be empty");
                }
            }
        }

        Ok(())
    }
}

impl ReportArgs {
    /// Trimmed report title.
    pub fn title(&self) -> &str {
        self.title.trim()
    }

    /// Returns output path from configuration or derived from the title.
    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| PathBuf::from(report_file_name(self.title(), self.format)))
    }
}

fn require_file(path: &Path, what: &str) -> Result<()> {
    if !path.is_file() {
        bail!("{} does not exist: {}", what, path.display());
    }
    Ok(())
}
