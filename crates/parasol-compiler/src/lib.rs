//! # Parasol Compiler
//!
//! Parasolパイプライン言語のフロントエンドライブラリです。
//! ソースコードを字句解析・構文解析してモジュール単位のASTを組み立て、
//! 複数のモジュールをまたいでパイプラインのインクルードを解決します。
//!
//! ```
//! use parasol_compiler::LinkUnit;
//!
//! let mut unit = LinkUnit::new();
//! unit.add_module("pipeline Base { v = 1 }", "base").unwrap();
//! unit.add_module("pipeline Main { include Base }", "main").unwrap();
//! assert!(unit.link().is_complete());
//!
//! let main = unit.find_pipeline("Main").unwrap();
//! assert!(unit.resolve_variable(main, "v").unwrap().is_some());
//! ```

use std::fs;
use std::path::Path;

pub mod config;
pub mod driver;
pub mod frontend;
pub mod typesystem;

// 再エクスポート
pub use self::config::FrontendConfig;
pub use self::driver::{LinkReport, LinkUnit, UnresolvedInclude};
pub use self::frontend::ast;
pub use self::frontend::error::{CompilerError, ErrorKind, Result};
pub use self::frontend::lexer;
pub use self::frontend::parser;
pub use self::frontend::Module;
pub use self::typesystem::{Type, TypeId, TypeRegistry};

/// ライブラリのバージョン
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// ソースを1つのリンク単位にモジュールとして追加し、リンクまで行う
pub fn parse_source(source: &str, module_name: &str) -> Result<LinkUnit> {
    let mut unit = LinkUnit::new();
    unit.add_module(source, module_name)?;
    unit.link();
    Ok(unit)
}

/// ファイルを読み込み、ファイル名（拡張子なし）をモジュール名として [`parse_source`] する
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<LinkUnit> {
    let path = path.as_ref();
    let source = fs::read_to_string(path)?;
    parse_source(&source, &module_name_for(path))
}

/// パスからモジュール名を決める
pub fn module_name_for(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "main".to_string())
}
