use super::*;

/// Flat text for one input plus how it was obtained.
#[derive(Debug, Clone, Default)]
pub struct ExtractedText {
    pub text: String,
    pub page_count: usize,
    pub ocr_page_count: usize,
    pub warnings: Vec<String>,
}

pub trait TextSource {
    fn extract(&self, path: &Path) -> Result<ExtractedText>;
}

/// Reads `.txt`/`.text` files verbatim and everything else through the
/// poppler text layer with optional tesseract OCR.
#[derive(Debug)]
pub struct LocalTextSource {
    ocr_mode: OcrMode,
    ocr_lang: String,
    ocr_min_text_chars: usize,
    max_pages_per_doc: Option<usize>,
    normalizer: TextNormalizer,
}

impl LocalTextSource {
    pub fn new(
        ocr_mode: OcrMode,
        ocr_lang: &str,
        ocr_min_text_chars: usize,
        max_pages_per_doc: Option<usize>,
    ) -> Result<Self> {
        Ok(Self {
            ocr_mode,
            ocr_lang: ocr_lang.to_string(),
            ocr_min_text_chars,
            max_pages_per_doc,
            normalizer: TextNormalizer::new()?,
        })
    }

    pub fn from_args(args: &ExtractArgs) -> Result<Self> {
        Self::new(
            args.ocr_mode,
            &args.ocr_lang,
            args.ocr_min_text_chars,
            args.max_pages_per_doc,
        )
    }

    fn extract_pdf(&self, pdf_path: &Path) -> Result<ExtractedText> {
        let mut pages = extract_pages_with_pdftotext(pdf_path, self.max_pages_per_doc)?;
        let mut extracted = ExtractedText {
            page_count: pages.len(),
            ..ExtractedText::default()
        };

        let candidate_pages = collect_ocr_candidates(&pages, self.ocr_mode, self.ocr_min_text_chars);
        if !candidate_pages.is_empty() {
            self.apply_ocr(pdf_path, &mut pages, &candidate_pages, &mut extracted)?;
        }

        extracted.text = self.normalizer.normalize(&pages.join("\n"));
        Ok(extracted)
    }

    fn apply_ocr(
        &self,
        pdf_path: &Path,
        pages: &mut [String],
        candidate_pages: &[usize],
        extracted: &mut ExtractedText,
    ) -> Result<()> {
        if !command_available("pdftoppm") || !command_available("tesseract") {
            let message = format!(
                "OCR mode '{}' requested for {} pages but pdftoppm/tesseract are unavailable",
                self.ocr_mode.as_str(),
                candidate_pages.len()
            );
            if matches!(self.ocr_mode, OcrMode::Force) {
                bail!(message);
            }
            warn!(path = %pdf_path.display(), "{message}");
            extracted.warnings.push(message);
            return Ok(());
        }

        for &page_number in candidate_pages {
            let page_index = page_number.saturating_sub(1);

            match extract_page_with_ocr(pdf_path, page_number, &self.ocr_lang) {
                Ok(ocr_text) => {
                    if non_whitespace_char_count(&ocr_text) == 0
                        && matches!(self.ocr_mode, OcrMode::Auto)
                    {
                        extracted.warnings.push(format!(
                            "OCR text was empty for {} page {} in auto mode",
                            pdf_path.display(),
                            page_number
                        ));
                        continue;
                    }

                    if let Some(page) = pages.get_mut(page_index) {
                        *page = ocr_text;
                    }
                    extracted.ocr_page_count += 1;
                    debug!(path = %pdf_path.display(), page = page_number, "replaced page with OCR text");
                }
                Err(error) => {
                    if matches!(self.ocr_mode, OcrMode::Force) {
                        return Err(error).with_context(|| {
                            format!(
                                "failed OCR extraction for {} page {}",
                                pdf_path.display(),
                                page_number
                            )
                        });
                    }

                    extracted.warnings.push(format!(
                        "OCR fallback failed for {} page {}: {}",
                        pdf_path.display(),
                        page_number,
                        error
                    ));
                }
            }
        }

        Ok(())
    }
}

impl TextSource for LocalTextSource {
    fn extract(&self, path: &Path) -> Result<ExtractedText> {
        if !path.is_file() {
            bail!("input file does not exist: {}", path.display());
        }

        if inventory::source_kind(path) == "text" {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read text input {}", path.display()))?;
            return Ok(ExtractedText {
                text,
                page_count: 1,
                ..ExtractedText::default()
            });
        }

        self.extract_pdf(path)
    }
}

/// Repairs layout artifacts common to extracted PDF text.
#[derive(Debug)]
pub struct TextNormalizer {
    line_breaks: Regex,
    blank_runs: Regex,
    space_runs: Regex,
    sentence_break: Regex,
}

impl TextNormalizer {
    pub fn new() -> Result<Self> {
        Ok(Self {
            line_breaks: Regex::new(r"\r\n|\r").context("failed to compile line break regex")?,
            blank_runs: Regex::new(r"\n{3,}").context("failed to compile blank run regex")?,
            space_runs: Regex::new(r" {2,}").context("failed to compile space run regex")?,
            sentence_break: Regex::new(r"([.!?])\s*([A-Z])")
                .context("failed to compile sentence break regex")?,
        })
    }

    pub fn normalize(&self, text: &str) -> String {
        let text = text.replace("\\n", "\n");
        let text = self.line_breaks.replace_all(&text, "\n");
        let text = self.blank_runs.replace_all(&text, "\n\n");
        let text = self.space_runs.replace_all(&text, " ");
        let text = text.replace('•', "\n•");
        let text = self.sentence_break.replace_all(&text, "$1\n$2");

        text.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect::<Vec<&str>>()
            .join("\n")
    }
}

pub fn non_whitespace_char_count(text: &str) -> usize {
    text.chars()
        .filter(|character| !character.is_whitespace())
        .count()
}

/// One-based page numbers that should be read with OCR.
pub fn collect_ocr_candidates(
    pages: &[String],
    ocr_mode: OcrMode,
    min_text_chars: usize,
) -> Vec<usize> {
    match ocr_mode {
        OcrMode::Off => Vec::new(),
        OcrMode::Force => (1..=pages.len()).collect(),
        OcrMode::Auto => pages
            .iter()
            .enumerate()
            .filter(|(_, page)| non_whitespace_char_count(page) < min_text_chars)
            .map(|(index, _)| index + 1)
            .collect(),
    }
}

fn command_available(program: &str) -> bool {
    Command::new(program).arg("--version").output().is_ok()
}

pub fn extract_pages_with_pdftotext(
    pdf_path: &Path,
    max_pages_per_doc: Option<usize>,
) -> Result<Vec<String>> {
    let mut command = Command::new("pdftotext");
    command.arg("-enc").arg("UTF-8").arg("-f").arg("1");
    if let Some(max_pages) = max_pages_per_doc {
        command.arg("-l").arg(max_pages.to_string());
    }
    command.arg(pdf_path).arg("-");

    let output = command
        .output()
        .with_context(|| format!("failed to execute pdftotext for {}", pdf_path.display()))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        bail!(
            "pdftotext returned non-zero exit status for {}: {}",
            pdf_path.display(),
            stderr.trim()
        );
    }

    Ok(split_pages(&String::from_utf8_lossy(&output.stdout)))
}

/// Splits pdftotext output on form feeds and drops trailing empty pages.
pub fn split_pages(raw: &str) -> Vec<String> {
    let mut pages = raw
        .split('\u{000C}')
        .map(|chunk| chunk.replace('\u{0000}', ""))
        .collect::<Vec<String>>();

    while pages.last().is_some_and(|page| page.trim().is_empty()) {
        pages.pop();
    }

    pages
}

fn extract_page_with_ocr(pdf_path: &Path, page_number: usize, ocr_lang: &str) -> Result<String> {
    let safe_stem = pdf_path
        .file_stem()
        .and_then(|value| value.to_str())
        .unwrap_or("pdf")
        .chars()
        .map(|character| {
            if character.is_ascii_alphanumeric() {
                character
            } else {
                '_'
            }
        })
        .collect::<String>();

    let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let output_root = std::env::temp_dir().join(format!(
        "rulebook_ocr_{}_{}_{}_{}",
        safe_stem,
        std::process::id(),
        page_number,
        stamp
    ));
    let png_path = PathBuf::from(format!("{}.png", output_root.display()));

    let rasterized = Command::new("pdftoppm")
        .arg("-f")
        .arg(page_number.to_string())
        .arg("-l")
        .arg(page_number.to_string())
        .arg("-singlefile")
        .arg("-png")
        .arg(pdf_path)
        .arg(&output_root)
        .output()
        .with_context(|| format!("failed to execute pdftoppm for {}", pdf_path.display()))?;

    if !rasterized.status.success() || !png_path.exists() {
        let stderr = String::from_utf8_lossy(&rasterized.stderr);
        bail!(
            "pdftoppm produced no image for {} page {}: {}",
            pdf_path.display(),
            page_number,
            stderr.trim()
        );
    }

    let recognized = Command::new("tesseract")
        .arg(&png_path)
        .arg("stdout")
        .arg("-l")
        .arg(ocr_lang)
        .output()
        .with_context(|| format!("failed to execute tesseract for {}", png_path.display()));

    let _ = fs::remove_file(&png_path);
    let recognized = recognized?;

    if !recognized.status.success() {
        let stderr = String::from_utf8_lossy(&recognized.stderr);
        bail!(
            "tesseract returned non-zero exit status for {} page {}: {}",
            pdf_path.display(),
            page_number,
            stderr.trim()
        );
    }

    Ok(String::from_utf8_lossy(&recognized.stdout)
        .replace('\u{0000}', "")
        .trim()
        .to_string())
}

pub fn collect_tool_versions() -> ToolVersions {
    ToolVersions {
        pdftotext: command_version_optional("pdftotext", &["-v"]),
        pdftoppm: command_version_optional("pdftoppm", &["-v"]),
        tesseract: command_version_optional("tesseract", &["--version"]),
    }
}

fn command_version_optional(program: &str, args: &[&str]) -> Option<String> {
    let output = Command::new(program).args(args).output().ok()?;

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    let source = if stdout.trim().is_empty() {
        stderr.trim()
    } else {
        stdout.trim()
    };

    source
        .lines()
        .next()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
}
