//! PDF pages to images via poppler's `pdftoppm`.

use std::path::{Path, PathBuf};
use std::process::Command;

use tempfile::TempDir;

use crate::error::{CashflowError, Result};
use crate::settings::Settings;

/// Page images in a scratch directory that is removed on drop.
#[derive(Debug)]
pub struct RenderedPages {
    dir: TempDir,
    pages: Vec<PathBuf>,
}

impl RenderedPages {
    pub fn pages(&self) -> &[PathBuf] {
        &self.pages
    }
}

fn scratch_dir() -> Result<TempDir> {
    Ok(tempfile::Builder::new().prefix("cashflow_ocr_").tempdir()?)
}

/// `page-1.png`, `page-01.png`, `page-001.png` -> page number.
fn page_number(file_name: &str) -> Option<u32> {
    file_name
        .strip_prefix("page-")?
        .strip_suffix(".png")?
        .parse()
        .ok()
}

fn collect_pages(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut numbered: Vec<(u32, PathBuf)> = std::fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter_map(|e| {
            let n = page_number(e.file_name().to_str()?)?;
            Some((n, e.path()))
        })
        .collect();
    numbered.sort_by_key(|(n, _)| *n);
    Ok(numbered.into_iter().map(|(_, p)| p).collect())
}

pub fn render_pages(pdf_path: &Path, settings: &Settings) -> Result<RenderedPages> {
    let mut rendered = RenderedPages {
        dir: scratch_dir()?,
        pages: Vec::new(),
    };
    tracing::info!(pdf = %pdf_path.display(), dpi = settings.dpi, "rendering pages");

    let output = Command::new(&settings.pdftoppm_cmd)
        .arg("-png")
        .arg("-r")
        .arg(settings.dpi.to_string())
        .arg(pdf_path)
        .arg(rendered.dir.path().join("page"))
        .output()
        .map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => {
                CashflowError::ToolMissing(format!("pdftoppm ({})", settings.pdftoppm_cmd))
            }
            _ => CashflowError::Io(e),
        })?;

    if !output.status.success() {
        return Err(CashflowError::ToolFailed {
            tool: "pdftoppm".to_string(),
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    rendered.pages = collect_pages(rendered.dir.path())?;
    if rendered.pages.is_empty() {
        return Err(CashflowError::ToolFailed {
            tool: "pdftoppm".to_string(),
            message: format!("no pages rendered from {}", pdf_path.display()),
        });
    }
    Ok(rendered)
}
