use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "rulebook-extract",
    version,
    about = "Structural extraction and text repair for rulebook PDFs"
)]
pub struct Cli {
    /// Raise the default log filter to debug.
    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Extract(ExtractArgs),
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = "input")]
    pub input_dir: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ExtractArgs {
    /// Single input file; takes precedence over --input-dir.
    #[arg(long)]
    pub file: Option<PathBuf>,

    #[arg(long, default_value = "input")]
    pub input_dir: PathBuf,

    #[arg(long, default_value = "output")]
    pub output_dir: PathBuf,

    #[arg(long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub format: OutputFormat,

    #[arg(long, value_enum, default_value_t = OutputType::Chapters)]
    pub output_type: OutputType,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub max_pages_per_doc: Option<usize>,

    #[arg(long, value_enum, default_value_t = OcrMode::Off)]
    pub ocr_mode: OcrMode,

    #[arg(long, default_value = "eng")]
    pub ocr_lang: String,

    #[arg(long, default_value_t = 120)]
    pub ocr_min_text_chars: usize,

    #[arg(long, default_value_t = 2000)]
    pub max_line_length: usize,

    #[arg(long, value_enum, default_value_t = CleaningLevel::Light)]
    pub cleaning_level: CleaningLevel,

    /// Extra valid words, one per line.
    #[arg(long)]
    pub word_list: Option<PathBuf>,

    #[arg(long, default_value_t = 0.7)]
    pub min_confidence: f64,

    #[arg(long, default_value_t = 100)]
    pub validation_budget_ms: u64,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OcrMode {
    Off,
    Auto,
    Force,
}

impl OcrMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Auto => "auto",
            Self::Force => "force",
        }
    }
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, ValueEnum)]
pub enum CleaningLevel {
    #[default]
    Light,
    Advanced,
}

impl CleaningLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Advanced => "advanced",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
    Txt,
}

impl OutputFormat {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
            Self::Txt => "txt",
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum OutputType {
    /// Normalized extracted text.
    Raw,
    Lines,
    Chapters,
    /// Chapters plus the per-chapter validation report.
    Validated,
    Cleaned,
    /// Front matter, table of contents, chapters and appendices.
    Structured,
}

impl OutputType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Raw => "raw",
            Self::Lines => "lines",
            Self::Chapters => "chapters",
            Self::Validated => "validated",
            Self::Cleaned => "cleaned",
            Self::Structured => "structured",
        }
    }
}
