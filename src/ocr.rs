//! Text recognition for rendered pages.

use std::path::Path;
use std::process::Command;

use crate::error::{CashflowError, Result};
use crate::extract::page_marker;
use crate::pdf::render_pages;
use crate::settings::Settings;

/// Turns one page image into text.
pub trait PageRecognizer {
    fn recognize(&self, image: &Path) -> Result<String>;
}

/// The `tesseract` command-line engine.
#[derive(Debug, Clone)]
pub struct Tesseract {
    cmd: String,
    languages: String,
}

impl Tesseract {
    pub fn new(cmd: impl Into<String>, languages: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            languages: languages.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(&settings.tesseract_cmd, &settings.ocr_languages)
    }
}

impl PageRecognizer for Tesseract {
    fn recognize(&self, image: &Path) -> Result<String> {
        tracing::debug!(image = %image.display(), lang = %self.languages, "tesseract");
        let output = Command::new(&self.cmd)
            .arg(image)
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .output()
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => {
                    CashflowError::ToolMissing(format!("tesseract ({})", self.cmd))
                }
                _ => CashflowError::Io(e),
            })?;
        if !output.status.success() {
            return Err(CashflowError::ToolFailed {
                tool: "tesseract".to_string(),
                message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

/// Join page texts behind `--- Page N ---` markers, the layout extraction expects.
pub fn join_pages<I, S>(pages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut text = String::new();
    for (i, page) in pages.into_iter().enumerate() {
        text.push_str(&page_marker(i + 1));
        text.push('\n');
        text.push_str(page.as_ref());
        text.push_str("\n\n");
    }
    text
}

pub fn pdf_to_text(pdf_path: &Path, recognizer: &dyn PageRecognizer, settings: &Settings) -> Result<String> {
    let rendered = render_pages(pdf_path, settings)?;
    let texts = rendered
        .pages()
        .iter()
        .map(|page| recognizer.recognize(page))
        .collect::<Result<Vec<_>>>()?;
    tracing::info!(pdf = %pdf_path.display(), pages = texts.len(), "recognised");
    Ok(join_pages(texts))
}
