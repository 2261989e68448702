//! hclspec cli interface

use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Formatter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Change the work directory
    ///
    /// Can be specified multiple times. Note that all
    /// paths on the way to the final path must exist.
    ///
    /// This is equivalent to running { cd <directory>; hclspec ... }
    #[clap(short = 'C', long = "directory", global(true))]
    pub directory: Vec<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load and decode files, print diagnostics
    Check(CheckCommand),

    /// Decode files and print the result
    ///
    /// `variables` and `locals` blocks are decoded first, everything
    /// else can refer to them as `var.<name>` and `local.<name>`.
    #[command(alias = "eval")]
    Evaluate(EvaluateCommand),

    /// List the files that would be loaded
    Files(FilesCommand),
}

#[derive(Parser, Debug)]
pub struct CheckCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub render: RenderArgs,
}

#[derive(Parser, Debug)]
pub struct EvaluateCommand {
    #[clap(flatten)]
    pub input: InputArgs,

    #[clap(flatten)]
    pub render: RenderArgs,

    #[clap(flatten)]
    pub output: OutputArgs,
}

#[derive(Parser, Debug)]
pub struct FilesCommand {
    #[clap(flatten)]
    pub input: InputArgs,
}

#[derive(Parser, Debug)]
pub struct InputArgs {
    /// Load *.hcl and *.json files from work directory
    #[clap(short = 'w', long = "input-workdir")]
    pub workdir: bool,

    /// Load a file (.hcl or .json)
    #[clap(short = 'f', long = "input-file")]
    pub files: Vec<PathBuf>,

    /// Load all files matching a glob pattern
    #[clap(short = 'g', long = "input-glob")]
    pub globs: Vec<String>,
}

#[derive(Parser, Debug)]
pub struct RenderArgs {
    /// Wrap diagnostic details at this width, 0 disables wrapping
    #[arg(long = "width", default_value_t = 0)]
    pub width: usize,

    /// Render diagnostics without colors
    #[arg(long = "no-color")]
    pub no_color: bool,
}

#[derive(Parser, Debug)]
pub struct OutputArgs {
    #[arg(short = 'F', long = "output-format", default_value_t)]
    pub format: OutputFormat,
}

#[derive(ValueEnum, Clone, Default, Debug)]
pub enum OutputFormat {
    Json,
    #[default]
    Yaml,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Json => f.write_str("json"),
            OutputFormat::Yaml => f.write_str("yaml"),
        }
    }
}
