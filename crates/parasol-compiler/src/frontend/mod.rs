//! # Parasol コンパイラフロントエンド
//!
//! ソースコードの字句解析から、モジュール単位のASTと分類済みシンボル表の構築までを扱います。
//!
//! ## フェーズ
//! 1. 字句解析（[`lexer`]）
//! 2. 構文解析（[`parser`]）
//! 3. ID付与（[`visitor::IdVisitor`]）
//! 4. 分類（[`semantic`]）
//!
//! モジュール間のインクルード解決は [`crate::driver::LinkUnit`] が行います。

pub mod ast;
pub mod error;
pub mod lexer;
pub mod module;
pub mod parser;
pub mod semantic;
pub mod visitor;

pub use self::{
    ast::{Ast, Node, NodeKind, NodeRef, QualifiedRef},
    error::{CompilerError, ErrorKind, Result},
    lexer::{Lexer, StringTable, Token, TokenKind},
    module::Module,
    parser::Parser,
    semantic::SymbolTable,
};
