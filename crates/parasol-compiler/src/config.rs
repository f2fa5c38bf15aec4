//! フロントエンド設定モジュール
//!
//! TOML形式の設定ファイルからフロントエンドとCLIの動作を読み込みます。
//! ファイルが存在しない場合は既定値を使い、内容が不正な場合は設定エラーになります。

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::frontend::error::{CompilerError, Result};

/// ログレベル
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// 文字列表現の取得
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// `log` クレートのレベルフィルタに変換
    pub fn to_filter(self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            "trace" => Ok(LogLevel::Trace),
            _ => Err(format!("不正なログレベル: {}", s)),
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// リンクの設定
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LinkConfig {
    /// リンク後に未解決のインクルードを警告するか
    pub warn_unresolved: bool,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self { warn_unresolved: true }
    }
}

/// 出力の設定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// リンク後にラベル付きの木を表示するか
    pub print_tree: bool,
}

/// フロントエンドの設定
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FrontendConfig {
    /// ログレベル
    pub log_level: LogLevel,
    /// リンクの設定
    pub link: LinkConfig,
    /// 出力の設定
    pub output: OutputConfig,
}

impl FrontendConfig {
    /// ファイルから設定を読み込む（ファイルがなければ既定値）
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            log::debug!("設定ファイル {} がないため既定値を使います", path.display());
            return Ok(Self::default());
        }

        Self::load_required(path)
    }

    /// 明示的に指定されたファイルから設定を読み込む（ファイルがなければ設定エラー）
    pub fn load_required<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return Err(CompilerError::config_error(format!(
                "設定ファイル {} が見つかりません",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)?;
        content.parse()
    }
}

impl FromStr for FrontendConfig {
    type Err = CompilerError;

    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| CompilerError::config_error(format!("TOML解析エラー: {}", e)))
    }
}
