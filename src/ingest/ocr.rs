//! PDF text extraction through the `pdftoppm` and `tesseract` command-line tools.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tokio::process::Command;

pub const PAGE_SEPARATOR_WIDTH: usize = 50;

static PAGE_IMAGE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"-(\d+)\.png$").expect("page image pattern is valid"));
static HORIZONTAL_WS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\u{00A0}]+").expect("whitespace pattern is valid"));

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("{tool} not found in PATH: {source}")]
    ToolMissing {
        tool: &'static str,
        #[source]
        source: which::Error,
    },
    #[error("{tool} exited with {status}: {stderr}")]
    CommandFailed {
        tool: &'static str,
        status: std::process::ExitStatus,
        stderr: String,
    },
    #[error("no pages were rendered from {0}")]
    NoPages(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone)]
pub struct OcrOptions {
    /// Tesseract language code(s), e.g. `ben` or `ben+eng`.
    pub language: String,
    pub dpi: u32,
}

impl Default for OcrOptions {
    fn default() -> Self {
        Self {
            language: "ben".to_string(),
            dpi: 300,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OcrTools {
    pdftoppm: PathBuf,
    tesseract: PathBuf,
}

impl OcrTools {
    /// Finds both binaries on `PATH`.
    pub fn locate() -> Result<Self, OcrError> {
        let pdftoppm = which::which("pdftoppm").map_err(|source| OcrError::ToolMissing {
            tool: "pdftoppm",
            source,
        })?;
        let tesseract = which::which("tesseract").map_err(|source| OcrError::ToolMissing {
            tool: "tesseract",
            source,
        })?;
        Ok(Self {
            pdftoppm,
            tesseract,
        })
    }

    /// Rasterises every page of `pdf` and OCRs it, returning one string per page.
    pub async fn extract_pages(
        &self,
        pdf: &Path,
        options: &OcrOptions,
    ) -> Result<Vec<String>, OcrError> {
        let workdir = tempfile::tempdir()?;
        let prefix = workdir.path().join("page");

        tracing::info!("Rendering {} at {} dpi", pdf.display(), options.dpi);
        let output = Command::new(&self.pdftoppm)
            .arg("-r")
            .arg(options.dpi.to_string())
            .arg("-png")
            .arg(pdf)
            .arg(&prefix)
            .output()
            .await?;
        if !output.status.success() {
            return Err(OcrError::CommandFailed {
                tool: "pdftoppm",
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let images = rendered_pages(workdir.path())?;
        if images.is_empty() {
            return Err(OcrError::NoPages(pdf.to_path_buf()));
        }

        let mut pages = Vec::with_capacity(images.len());
        for (i, image) in images.iter().enumerate() {
            tracing::info!("OCR page {}/{}", i + 1, images.len());
            pages.push(self.ocr_image(image, &options.language).await?);
        }
        Ok(pages)
    }

    async fn ocr_image(&self, image: &Path, language: &str) -> Result<String, OcrError> {
        let output = Command::new(&self.tesseract)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(language)
            .output()
            .await?;
        if !output.status.success() {
            return Err(OcrError::CommandFailed {
                tool: "tesseract",
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(normalize_ocr_text(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Page images written by pdftoppm, ordered by page number.
fn rendered_pages(dir: &Path) -> Result<Vec<PathBuf>, OcrError> {
    let mut numbered = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if let Some(page) = page_number(name) {
            numbered.push((page, path));
        }
    }
    numbered.sort_by_key(|(page, _)| *page);
    Ok(numbered.into_iter().map(|(_, path)| path).collect())
}

fn page_number(file_name: &str) -> Option<u32> {
    PAGE_IMAGE
        .captures(file_name)
        .and_then(|caps| caps[1].parse().ok())
}

/// Drops form feeds, collapses runs of spaces/tabs and trims line ends.
pub fn normalize_ocr_text(raw: &str) -> String {
    raw.replace('\u{000C}', "")
        .lines()
        .map(|line| HORIZONTAL_WS.replace_all(line, " ").trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Joins pages as `Page N:` blocks separated by a rule of `=`.
pub fn format_pages(pages: &[String]) -> String {
    let rule = "=".repeat(PAGE_SEPARATOR_WIDTH);
    let mut out = String::new();
    for (i, text) in pages.iter().enumerate() {
        out.push_str(&format!("Page {}:\n", i + 1));
        out.push_str(text);
        out.push('\n');
        out.push_str(&rule);
        out.push('\n');
    }
    out
}
