//! # Parasol コンパイラドライバー
//!
//! 複数の翻訳単位をまとめて解析・リンクします。
//! モジュールを追加するたびに解析と分類が走り、全モジュールの追加後にリンクを一度だけ行います。

pub mod link_unit;

pub use self::link_unit::{LinkReport, LinkUnit, UnresolvedInclude};
