use std::path::{Path, PathBuf};

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    /// マスク領域を切り出す際のレンダリング解像度（72 = 1pt/px）
    pub dpi: u32,
    /// アップロードされたPDFを受け取るmultipartフィールド名
    pub upload_field: String,
    pub max_upload_bytes: usize,
    /// 未指定時は PDFIUM_DYNAMIC_LIB_PATH、次にシステムライブラリを使う
    pub pdfium_lib_path: Option<PathBuf>,
    pub parallel_pages: bool,
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            host: "0.0.0.0".to_string(),
            port: 3000,
            dpi: 72,
            upload_field: "file".to_string(),
            max_upload_bytes: 50 * 1024 * 1024,
            pdfium_lib_path: None,
            parallel_pages: true,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn from_yaml(yaml: &str) -> crate::error::Result<Self> {
        let settings: Settings = serde_yml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_file(path: &Path) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// `host:port` 形式のバインドアドレスを返す。
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    fn validate(&self) -> crate::error::Result<()> {
        if self.dpi == 0 {
            return Err(crate::error::HighlightError::config("dpi must be positive"));
        }
        if self.upload_field.trim().is_empty() {
            return Err(crate::error::HighlightError::config(
                "upload_field must not be empty",
            ));
        }
        if self.max_upload_bytes == 0 {
            return Err(crate::error::HighlightError::config(
                "max_upload_bytes must be positive",
            ));
        }
        Ok(())
    }
}
