use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{CashflowError, Result};

pub const DEFAULT_CONFIG_FILE: &str = "config.json";

/// Tool paths and working locations, read from `config.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_source_dir")]
    pub source_dir: String,
    #[serde(default = "default_master_path")]
    pub master_path: String,
    #[serde(default = "default_export_path")]
    pub export_path: String,
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_tesseract_cmd")]
    pub tesseract_cmd: String,
    #[serde(default = "default_pdftoppm_cmd")]
    pub pdftoppm_cmd: String,
    #[serde(default = "default_ocr_languages")]
    pub ocr_languages: String,
    #[serde(default = "default_dpi")]
    pub dpi: u32,
}

fn default_source_dir() -> String {
    "source".to_string()
}

fn default_master_path() -> String {
    Path::new("Master").join("AC_Master.xlsx").to_string_lossy().to_string()
}

fn default_export_path() -> String {
    Path::new("output").join("CashFlow_Report.xlsx").to_string_lossy().to_string()
}

fn default_output_dir() -> String {
    "output".to_string()
}

fn default_db_path() -> String {
    "ocr_data.db".to_string()
}

fn default_tesseract_cmd() -> String {
    "tesseract".to_string()
}

fn default_pdftoppm_cmd() -> String {
    "pdftoppm".to_string()
}

fn default_ocr_languages() -> String {
    "tha+eng".to_string()
}

fn default_dpi() -> u32 {
    200
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source_dir: default_source_dir(),
            master_path: default_master_path(),
            export_path: default_export_path(),
            output_dir: default_output_dir(),
            db_path: default_db_path(),
            tesseract_cmd: default_tesseract_cmd(),
            pdftoppm_cmd: default_pdftoppm_cmd(),
            ocr_languages: default_ocr_languages(),
            dpi: default_dpi(),
        }
    }
}

impl Settings {
    pub fn db_path(&self) -> PathBuf {
        PathBuf::from(shellexpand_path(&self.db_path))
    }

    pub fn master_path(&self) -> PathBuf {
        PathBuf::from(shellexpand_path(&self.master_path))
    }

    pub fn export_path(&self) -> PathBuf {
        PathBuf::from(shellexpand_path(&self.export_path))
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand_path(&self.output_dir))
    }

    pub fn source_dir(&self) -> PathBuf {
        PathBuf::from(shellexpand_path(&self.source_dir))
    }
}

/// Missing file means defaults; a file that exists but does not parse is an error.
pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Settings::default());
    }
    let content = std::fs::read_to_string(path)?;
    serde_json::from_str(&content)
        .map_err(|e| CashflowError::Settings(format!("{}: {e}", path.display())))
}

pub fn save_settings(path: &Path, settings: &Settings) -> Result<()> {
    if let Some(dir) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)
        .map_err(|e| CashflowError::Settings(e.to_string()))?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

pub fn shellexpand_path(path: &str) -> String {
    if path.starts_with('~') {
        if let Some(home) = dirs::home_dir() {
            return path.replacen('~', &home.to_string_lossy(), 1);
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let settings = Settings {
            tesseract_cmd: r"C:\Program Files\Tesseract-OCR\tesseract.exe".to_string(),
            dpi: 300,
            ..Settings::default()
        };
        save_settings(&path, &settings).unwrap();
        let loaded = load_settings(&path).unwrap();
        assert_eq!(loaded.tesseract_cmd, settings.tesseract_cmd);
        assert_eq!(loaded.dpi, 300);
        assert_eq!(loaded.ocr_languages, "tha+eng");
    }

    #[test]
    fn test_load_returns_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let s = load_settings(&dir.path().join("nope.json")).unwrap();
        assert_eq!(s.source_dir, "source");
        assert_eq!(s.db_path, "ocr_data.db");
        assert_eq!(s.dpi, 200);
    }

    #[test]
    fn test_load_merges_with_defaults() {
        let json = r#"{"master_path": "/data/AC_Master.xlsx", "API_KEY": "ignored"}"#;
        let s: Settings = serde_json::from_str(json).unwrap();
        assert_eq!(s.master_path, "/data/AC_Master.xlsx");
        assert_eq!(s.pdftoppm_cmd, "pdftoppm");
    }

    #[test]
    fn test_load_rejects_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = load_settings(&path).unwrap_err();
        assert!(err.to_string().contains("config.json"));
    }

    #[test]
    fn test_shellexpand_leaves_relative_paths() {
        assert_eq!(shellexpand_path("output/report.xlsx"), "output/report.xlsx");
    }
}
