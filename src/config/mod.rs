pub mod settings;

use settings::Settings;
use std::path::Path;

/// 設定ファイルを読み込む。
///
/// パスが指定されなければデフォルト設定を返す。
/// 指定されたファイルが存在しない場合はエラーとする。
pub fn load_settings(path: Option<&Path>) -> crate::error::Result<Settings> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };

    if !path.exists() {
        return Err(crate::error::HighlightError::config(format!(
            "settings file not found: {}",
            path.display()
        )));
    }

    Settings::from_file(path)
}
