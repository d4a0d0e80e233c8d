use super::*;

pub fn run(args: ExtractArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let inputs = collect_inputs(&args)?;
    let manifest_path = args.manifest_path.clone().unwrap_or_else(|| {
        args.output_dir.join("manifests").join(format!(
            "extract_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });
    ensure_directory(&args.output_dir.join(args.output_type.as_str()))?;

    info!(
        inputs = inputs.len(),
        output_dir = %args.output_dir.display(),
        output_type = args.output_type.as_str(),
        run_id = %run_id,
        "starting extract"
    );

    let source = LocalTextSource::from_args(&args)?;
    let pipeline = Pipeline::new(&PipelineConfig::from_args(&args))?;
    let tool_versions = collect_tool_versions();

    let mut counts = ExtractCounts {
        input_count: inputs.len(),
        ..ExtractCounts::default()
    };
    let mut outputs = Vec::<ExtractOutputRecord>::new();
    let mut warnings = Vec::<String>::new();
    let mut last_error = None;

    for input in &inputs {
        match extract_one(input, &args, &source, &pipeline) {
            Ok(extracted) => {
                counts.processed_count += 1;
                counts.page_count += extracted.record.page_count;
                counts.ocr_page_count += extracted.record.ocr_page_count;
                counts.line_count += extracted.summary.line_count;
                counts.chapter_count += extracted.summary.chapter_count;
                counts.table_count += extracted.summary.table_count;
                counts.flagged_line_count += extracted.summary.flagged_line_count;
                counts.fallback_numbered_chapters += extracted.summary.fallback_numbered_chapters;
                warnings.extend(extracted.warnings);
                outputs.push(extracted.record);
            }
            Err(err) => {
                warn!(path = %input.display(), error = %err, "extraction failed");
                counts.failed_count += 1;
                warnings.push(format!("{}: {:#}", input.display(), err));
                last_error = Some(err);
            }
        }
    }

    let status = match (counts.processed_count, counts.failed_count) {
        (_, 0) => "completed",
        (0, _) => "failed",
        _ => "completed_with_errors",
    };

    let manifest = ExtractRunManifest {
        manifest_version: 1,
        run_id,
        status: status.to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_extract_command(&args),
        output_type: args.output_type.as_str().to_string(),
        format: args.format.as_str().to_string(),
        tool_versions,
        counts,
        outputs,
        warnings,
    };
    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote extract run manifest");

    if manifest.counts.processed_count == 0
        && let Some(err) = last_error
    {
        return Err(err).context("no inputs could be extracted");
    }

    info!(
        processed = manifest.counts.processed_count,
        failed = manifest.counts.failed_count,
        chapters = manifest.counts.chapter_count,
        "extract completed"
    );
    Ok(())
}

struct ExtractedInput {
    record: ExtractOutputRecord,
    summary: DocumentSummary,
    warnings: Vec<String>,
}

fn extract_one(
    input: &Path,
    args: &ExtractArgs,
    source: &dyn TextSource,
    pipeline: &Pipeline,
) -> Result<ExtractedInput> {
    let started = Instant::now();
    let entry: SourceEntry = inventory::source_entry(input)?;
    info!(path = %input.display(), kind = %entry.kind, "extracting");

    let extracted = source.extract(input)?;
    let output = pipeline.run(&extracted.text);

    let output_path = output_path_for(&args.output_dir, args.output_type, args.format, input);
    let envelope = OutputEnvelope {
        filename: &entry.filename,
        extraction_date: now_utc_string(),
        output_type: args.output_type.as_str(),
        source_sha256: &entry.sha256,
        content: &output.content,
    };
    write_output(&output_path, args.format, &envelope)?;

    let elapsed_ms = started.elapsed().as_millis();
    info!(
        path = %output_path.display(),
        chapters = output.summary.chapter_count,
        elapsed_ms,
        "wrote output"
    );

    Ok(ExtractedInput {
        record: ExtractOutputRecord {
            source: entry,
            output_path: output_path.display().to_string(),
            page_count: extracted.page_count,
            ocr_page_count: extracted.ocr_page_count,
            elapsed_ms,
        },
        summary: output.summary,
        warnings: extracted.warnings,
    })
}

/// `--file` wins over `--input-dir`; a missing explicit file is an error.
pub fn collect_inputs(args: &ExtractArgs) -> Result<Vec<PathBuf>> {
    if let Some(file) = &args.file {
        if !file.is_file() {
            bail!("input file does not exist: {}", file.display());
        }
        return Ok(vec![file.clone()]);
    }

    let mut inputs = inventory::discover_sources(&args.input_dir)?;
    inputs.sort();
    if inputs.is_empty() {
        bail!("no PDF or text sources found in {}", args.input_dir.display());
    }
    Ok(inputs)
}

pub fn render_extract_command(args: &ExtractArgs) -> String {
    let mut command = vec!["rulebook-extract".to_string(), "extract".to_string()];

    match &args.file {
        Some(file) => {
            command.push("--file".to_string());
            command.push(file.display().to_string());
        }
        None => {
            command.push("--input-dir".to_string());
            command.push(args.input_dir.display().to_string());
        }
    }
    command.push("--output-dir".to_string());
    command.push(args.output_dir.display().to_string());
    command.push("--format".to_string());
    command.push(args.format.as_str().to_string());
    command.push("--output-type".to_string());
    command.push(args.output_type.as_str().to_string());

    if let Some(max_pages) = args.max_pages_per_doc {
        command.push("--max-pages-per-doc".to_string());
        command.push(max_pages.to_string());
    }
    if args.ocr_mode != OcrMode::Off {
        command.push("--ocr-mode".to_string());
        command.push(args.ocr_mode.as_str().to_string());
        command.push("--ocr-lang".to_string());
        command.push(args.ocr_lang.clone());
        command.push("--ocr-min-text-chars".to_string());
        command.push(args.ocr_min_text_chars.to_string());
    }
    if args.cleaning_level != CleaningLevel::Light {
        command.push("--cleaning-level".to_string());
        command.push(args.cleaning_level.as_str().to_string());
    }
    if let Some(path) = &args.word_list {
        command.push("--word-list".to_string());
        command.push(path.display().to_string());
    }

    command.join(" ")
}
