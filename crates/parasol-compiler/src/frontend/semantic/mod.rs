//! # 意味解析モジュール
//!
//! モジュールを追加したときに一度だけ走る分類パスです。
//!
//! トップレベル宣言のうちパイプラインはモジュールのパイプライン表へ、関数定義はグローバル関数表へ
//! 登録します。各パイプラインについては、直下の関数定義を関数表へ、直下の変数宣言
//! （または代入 `v = expr` の左辺）を変数表へ登録します。同名の宣言が続いた場合は最初の宣言を残します。

use log::{debug, warn};

use crate::frontend::ast::{Ast, NodeKind, NodeRef};
use crate::frontend::lexer::TokenKind;
use crate::frontend::module::Module;

pub mod symbol_table;

pub use symbol_table::SymbolTable;

/// モジュールの分類パスを実行する
pub fn classify_module(module: &mut Module) {
    let module_name = module.name().to_string();
    let root = module.root();
    let globals = module.globals().to_vec();

    let ast = module.ast_mut();
    let mut pipelines = SymbolTable::new();
    let mut functions = SymbolTable::new();

    for global in globals {
        if ast.pipeline(global).is_some() {
            classify_pipeline(ast, global);
            if let Some(name) = ast.pipeline_name(global) {
                register(&mut pipelines, name, global, "パイプライン", &module_name);
            }
        } else if let Some(name) = ast.function_name(global) {
            register(&mut functions, name, global, "関数", &module_name);
        }
    }

    debug!(
        "モジュール '{}' を分類しました (パイプライン {} 個, 関数 {} 個)",
        module_name,
        pipelines.len(),
        functions.len()
    );

    if let Some(node) = ast.module_mut(root) {
        node.pipelines = pipelines;
        node.functions = functions;
    }
}

/// パイプライン直下の宣言を関数表・変数表に登録する
fn classify_pipeline(ast: &mut Ast, pipeline: NodeRef) {
    let Some(contents) = ast.pipeline(pipeline).map(|p| p.contents.clone()) else {
        return;
    };
    let scope = ast.pipeline_name(pipeline).unwrap_or_default().to_string();

    let mut functions = SymbolTable::new();
    let mut variables = SymbolTable::new();

    for item in contents {
        if let Some(name) = ast.function_name(item) {
            register(&mut functions, name, item, "関数", &scope);
        } else if let Some(decl) = declared_variable(ast, item) {
            if let Some(name) = ast.var_decl_name(decl) {
                register(&mut variables, name, decl, "変数", &scope);
            }
        }
    }

    if let Some(node) = ast.pipeline_mut(pipeline) {
        node.functions = functions;
        node.variables = variables;
    }
}

/// パイプライン直下の項目が宣言する変数宣言ノード
fn declared_variable(ast: &Ast, item: NodeRef) -> Option<NodeRef> {
    let decl = match ast.kind(item) {
        NodeKind::VarDecl { .. } => item,
        NodeKind::BinaryOp {
            op: TokenKind::Equals,
            left,
            ..
        } => *left,
        _ => return None,
    };

    // スコープ参照は新しい宣言ではない
    match ast.kind(decl) {
        NodeKind::VarDecl {
            name: Some(_),
            scope: None,
            ..
        } => Some(decl),
        _ => None,
    }
}

fn register(table: &mut SymbolTable, name: &str, node: NodeRef, what: &str, scope: &str) {
    if !table.insert(name, node) {
        warn!("{} '{}' が '{}' 内で重複しています。最初の宣言を使います", what, name, scope);
    }
}
