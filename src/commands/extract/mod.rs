use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use regex::Regex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cli::{CleaningLevel, ExtractArgs, OcrMode, OutputFormat, OutputType};
use crate::commands::inventory;
use crate::model::{
    Chapter, ChapterContent, ChapterProcessingResult, ExtractCounts, ExtractOutputRecord,
    ExtractRunManifest, LineOutput, SourceEntry, StructuredDocument, ToolVersions,
};
use crate::nlp::{
    Lexicon, PassthroughModel, TextCleaner, TextValidator, ValidatorConfig, WordCorrector, WordCorrectorConfig,
};
use crate::processing::{ChapterProcessor, LineProcessor, StructureProcessor};
use crate::util::{
    ensure_directory, now_utc_string, utc_compact_string, write_json_pretty, write_text_file,
    write_yaml,
};

mod output;
mod pipeline;
mod run;
mod source_text;

pub use run::run;

use output::*;
use pipeline::*;
use source_text::*;
