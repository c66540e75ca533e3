use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::options::{DocxOptions, ExtractionOptions, OcrOptions, PdfOptions, SizeLimits};

/// On-disk TOML configuration structure.
/// All fields are optional so partial configs work (merge with defaults).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    pub extraction: Option<ExtractionConfig>,
    pub pdf: Option<PdfConfig>,
    pub docx: Option<DocxConfig>,
    pub ocr: Option<OcrConfig>,
    pub limits: Option<LimitsConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionConfig {
    pub fallback_to_ocr: Option<bool>,
    pub preprocess_image: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PdfConfig {
    pub include_metadata: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocxConfig {
    pub include_style_info: Option<bool>,
    pub ignore_empty_paragraphs: Option<bool>,
    pub style_map: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcrConfig {
    pub language: Option<String>,
    pub white_list: Option<String>,
    pub black_list: Option<String>,
    pub tessdata_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LimitsConfig {
    pub pdf_max_mb: Option<u64>,
    pub docx_max_mb: Option<u64>,
    pub image_max_mb: Option<u64>,
}

/// Platform config directory path: `<config_dir>/docsift/config.toml`.
pub fn config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("docsift").join("config.toml"))
}

/// Load config by cascading CWD `.docsift.toml` over platform config.
/// CWD values override platform values.
pub fn load_config() -> ConfigFile {
    let platform = config_path().and_then(|p| load_from_path(&p));
    let cwd = load_from_path(Path::new(".docsift.toml"));

    match (platform, cwd) {
        (None, None) => ConfigFile::default(),
        (Some(p), None) => p,
        (None, Some(c)) => c,
        (Some(p), Some(c)) => merge(p, c),
    }
}

/// Load a config from a specific path. Returns `None` if the file doesn't
/// exist or can't be parsed.
pub fn load_from_path(path: &Path) -> Option<ConfigFile> {
    let content = std::fs::read_to_string(path).ok()?;
    match toml::from_str(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable config file");
            None
        }
    }
}

/// Take a field from `overlay` if set there, otherwise from `base`.
fn pick<S, T>(overlay: &Option<S>, base: &Option<S>, field: impl Fn(&S) -> Option<T>) -> Option<T> {
    overlay
        .as_ref()
        .and_then(&field)
        .or_else(|| base.as_ref().and_then(&field))
}

/// Merge two configs: `overlay` values take precedence over `base`.
pub fn merge(base: ConfigFile, overlay: ConfigFile) -> ConfigFile {
    ConfigFile {
        extraction: Some(ExtractionConfig {
            fallback_to_ocr: pick(&overlay.extraction, &base.extraction, |e| e.fallback_to_ocr),
            preprocess_image: pick(&overlay.extraction, &base.extraction, |e| {
                e.preprocess_image
            }),
        }),
        pdf: Some(PdfConfig {
            include_metadata: pick(&overlay.pdf, &base.pdf, |p| p.include_metadata),
        }),
        docx: Some(DocxConfig {
            include_style_info: pick(&overlay.docx, &base.docx, |d| d.include_style_info),
            ignore_empty_paragraphs: pick(&overlay.docx, &base.docx, |d| {
                d.ignore_empty_paragraphs
            }),
            style_map: pick(&overlay.docx, &base.docx, |d| d.style_map.clone()),
        }),
        ocr: Some(OcrConfig {
            language: pick(&overlay.ocr, &base.ocr, |o| o.language.clone()),
            white_list: pick(&overlay.ocr, &base.ocr, |o| o.white_list.clone()),
            black_list: pick(&overlay.ocr, &base.ocr, |o| o.black_list.clone()),
            tessdata_path: pick(&overlay.ocr, &base.ocr, |o| o.tessdata_path.clone()),
        }),
        limits: Some(LimitsConfig {
            pdf_max_mb: pick(&overlay.limits, &base.limits, |l| l.pdf_max_mb),
            docx_max_mb: pick(&overlay.limits, &base.limits, |l| l.docx_max_mb),
            image_max_mb: pick(&overlay.limits, &base.limits, |l| l.image_max_mb),
        }),
    }
}

impl ConfigFile {
    /// Build extraction options from this config, falling back to defaults
    /// for anything unset.
    pub fn extraction_options(&self) -> ExtractionOptions {
        let defaults = OcrOptions::default();
        let extraction = self.extraction.clone().unwrap_or_default();
        let pdf = self.pdf.clone().unwrap_or_default();
        let docx = self.docx.clone().unwrap_or_default();
        let ocr = self.ocr.clone().unwrap_or_default();

        ExtractionOptions {
            pdf: PdfOptions {
                page_numbers: None,
                include_metadata: pdf.include_metadata.unwrap_or(false),
            },
            docx: DocxOptions {
                include_style_info: docx.include_style_info.unwrap_or(false),
                ignore_empty_paragraphs: docx.ignore_empty_paragraphs.unwrap_or(false),
                style_map: docx.style_map.unwrap_or_default(),
            },
            ocr: OcrOptions {
                language: ocr.language.unwrap_or(defaults.language),
                white_list: ocr.white_list,
                black_list: ocr.black_list,
                logger: None,
            },
            fallback_to_ocr: extraction.fallback_to_ocr.unwrap_or(false),
            preprocess_image: extraction.preprocess_image.unwrap_or(false),
        }
    }

    pub fn size_limits(&self) -> SizeLimits {
        let defaults = SizeLimits::default();
        let Some(limits) = self.limits.as_ref() else {
            return defaults;
        };
        SizeLimits {
            pdf: limits.pdf_max_mb.map_or(defaults.pdf, |mb| mb * 1024 * 1024),
            docx: limits.docx_max_mb.map_or(defaults.docx, |mb| mb * 1024 * 1024),
            image: limits.image_max_mb.map_or(defaults.image, |mb| mb * 1024 * 1024),
        }
    }

    pub fn tessdata_path(&self) -> Option<PathBuf> {
        self.ocr
            .as_ref()
            .and_then(|o| o.tessdata_path.as_ref())
            .map(PathBuf::from)
    }
}

/// Save the current config to the platform config directory.
pub fn save_config(config: &ConfigFile) -> Result<PathBuf, String> {
    let path = config_path().ok_or_else(|| "Could not determine config directory".to_string())?;
    save_to_path(config, &path)?;
    Ok(path)
}

/// Save a config to a specific path, creating parent directories.
pub fn save_to_path(config: &ConfigFile, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }
    let content =
        toml::to_string_pretty(config).map_err(|e| format!("Failed to serialize config: {}", e))?;
    std::fs::write(path, content).map_err(|e| format!("Failed to write config: {}", e))?;
    Ok(())
}
