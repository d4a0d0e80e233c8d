use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::info;

use crate::cli::InventoryArgs;
use crate::model::{SourceEntry, SourceInventoryManifest};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

const SOURCE_EXTENSIONS: &[&str] = &["pdf", "txt", "text"];

pub fn run(args: InventoryArgs) -> Result<()> {
    let manifest = build_manifest(&args.input_dir)?;

    if args.dry_run {
        info!(
            source_count = manifest.source_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| args.input_dir.join("manifests").join("source_inventory.json"));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(source_count = manifest.source_count, "inventory completed");

    Ok(())
}

pub fn build_manifest(input_dir: &Path) -> Result<SourceInventoryManifest> {
    let mut paths = discover_sources(input_dir)?;
    paths.sort();

    if paths.is_empty() {
        bail!("no PDF or text sources found in {}", input_dir.display());
    }

    let sources = paths
        .iter()
        .map(|path| source_entry(path))
        .collect::<Result<Vec<SourceEntry>>>()?;

    Ok(SourceInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        source_directory: input_dir.display().to_string(),
        source_count: sources.len(),
        sources,
    })
}

pub fn source_entry(path: &Path) -> Result<SourceEntry> {
    let filename = path
        .file_name()
        .and_then(|name| name.to_str())
        .map(ToOwned::to_owned)
        .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;
    let size_bytes = fs::metadata(path)
        .with_context(|| format!("failed to stat {}", path.display()))?
        .len();

    Ok(SourceEntry {
        filename,
        kind: source_kind(path).to_string(),
        size_bytes,
        sha256: sha256_file(path)?,
    })
}

pub fn source_kind(path: &Path) -> &'static str {
    if has_extension(path, "pdf") {
        "pdf"
    } else {
        "text"
    }
}

pub fn is_source_file(path: &Path) -> bool {
    SOURCE_EXTENSIONS
        .iter()
        .any(|extension| has_extension(path, extension))
}

fn has_extension(path: &Path, expected: &str) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(expected))
}

pub fn discover_sources(input_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut sources = Vec::new();

    let entries = fs::read_dir(input_dir)
        .with_context(|| format!("failed to read {}", input_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", input_dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        if is_source_file(&path) {
            sources.push(path);
        }
    }

    Ok(sources)
}
