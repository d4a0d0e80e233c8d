use super::*;

#[derive(Debug, Serialize)]
pub struct OutputEnvelope<'a> {
    pub filename: &'a str,
    pub extraction_date: String,
    pub output_type: &'static str,
    pub source_sha256: &'a str,
    pub content: &'a DocumentContent,
}

/// `<output-dir>/<output-type>/<stem>.<format>`
pub fn output_path_for(
    output_dir: &Path,
    output_type: OutputType,
    format: OutputFormat,
    source: &Path,
) -> PathBuf {
    let stem = source
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("document");

    output_dir
        .join(output_type.as_str())
        .join(format!("{stem}.{}", format.as_str()))
}

pub fn write_output(path: &Path, format: OutputFormat, envelope: &OutputEnvelope<'_>) -> Result<()> {
    match format {
        OutputFormat::Json => write_json_pretty(path, envelope),
        OutputFormat::Yaml => write_yaml(path, envelope),
        OutputFormat::Txt => write_text_file(path, &render_text(envelope.content)),
    }
}

/// Plain-text rendering: the body text for raw and line output, an outline
/// for chapter trees.
pub fn render_text(content: &DocumentContent) -> String {
    let mut out = Vec::<String>::new();

    match content {
        DocumentContent::Raw(text) => out.push(text.clone()),
        DocumentContent::Lines(lines) => out.extend(lines.lines.iter().cloned()),
        DocumentContent::Chapters(result) => {
            for chapter in &result.chapters {
                render_chapter(&mut out, chapter);
            }
        }
        DocumentContent::Structured(document) => {
            out.push(document.metadata.title.clone());
            out.push(String::new());
            out.extend(document.front_matter.iter().cloned());
            for chapter in &document.chapters {
                render_chapter(&mut out, chapter);
            }
            for appendix in &document.appendices {
                out.push(String::new());
                out.push(format!("Appendix {}: {}", appendix.letter, appendix.title));
                render_content(&mut out, &appendix.content);
            }
        }
    }

    let mut text = out.join("\n");
    text.push('\n');
    text
}

fn render_chapter(out: &mut Vec<String>, chapter: &Chapter) {
    out.push(String::new());
    out.push(format!("Chapter {}: {}", chapter.number, chapter.title));
    render_content(out, &chapter.content);
}

fn render_content(out: &mut Vec<String>, content: &ChapterContent) {
    out.extend(content.main_content.iter().cloned());
    for subchapter in &content.subchapters {
        out.push(String::new());
        out.push(format!("## {}", subchapter.title));
        out.extend(subchapter.lines.iter().cloned());
    }
    for table in &content.tables {
        out.push(String::new());
        out.push(table.columns.join(" | "));
        out.extend(table.rows.iter().map(|row| row.join(" | ")));
    }
}
