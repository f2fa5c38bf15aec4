//! # エラー処理モジュール
//!
//! Parasolフロントエンドで発生するエラーを表現します。
//! 字句解析・構文解析のエラーは現在のモジュールの解析を中断し、
//! リンク時のエラー（未解決インクルード、循環インクルード）は記録・問い合わせ可能な値として扱われます。

use std::fmt;
use std::io;

use thiserror::Error;

/// エラーの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// 字句解析エラー
    Lexical,
    /// 構文解析エラー
    Syntax,
    /// 未解決のインクルード
    UnresolvedInclude,
    /// 循環インクルード
    CyclicInclude,
    /// I/Oエラー
    IO,
    /// 設定ファイルエラー
    Config,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            ErrorKind::Lexical => "字句解析エラー",
            ErrorKind::Syntax => "構文解析エラー",
            ErrorKind::UnresolvedInclude => "未解決のインクルード",
            ErrorKind::CyclicInclude => "循環インクルード",
            ErrorKind::IO => "I/Oエラー",
            ErrorKind::Config => "設定エラー",
        };
        write!(f, "{}", message)
    }
}

/// コンパイラエラー
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind}{}: {message}", line_suffix(.line))]
pub struct CompilerError {
    /// エラーの種類
    pub kind: ErrorKind,
    /// エラーメッセージ
    pub message: String,
    /// エラーが発生した行（1から始まる）
    pub line: Option<usize>,
}

fn line_suffix(line: &Option<usize>) -> String {
    match line {
        Some(line) => format!(" (行 {})", line),
        None => String::new(),
    }
}

impl CompilerError {
    /// 新しいエラーを作成
    pub fn new(kind: ErrorKind, message: impl Into<String>, line: Option<usize>) -> Self {
        Self {
            kind,
            message: message.into(),
            line,
        }
    }

    /// 字句解析エラーを作成
    pub fn lexical_error(message: impl Into<String>, line: usize) -> Self {
        Self::new(ErrorKind::Lexical, message, Some(line))
    }

    /// 構文解析エラーを作成
    pub fn syntax_error(message: impl Into<String>, line: usize) -> Self {
        Self::new(ErrorKind::Syntax, message, Some(line))
    }

    /// 循環インクルードエラーを作成
    pub fn cyclic_include(message: impl Into<String>, line: Option<usize>) -> Self {
        Self::new(ErrorKind::CyclicInclude, message, line)
    }

    /// 設定エラーを作成
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message, None)
    }

    /// 字句解析・構文解析のエラーかどうか
    pub fn is_parse_failure(&self) -> bool {
        matches!(self.kind, ErrorKind::Lexical | ErrorKind::Syntax)
    }
}

impl From<io::Error> for CompilerError {
    fn from(error: io::Error) -> Self {
        Self::new(ErrorKind::IO, error.to_string(), None)
    }
}

/// フロントエンドの結果型
pub type Result<T> = std::result::Result<T, CompilerError>;
