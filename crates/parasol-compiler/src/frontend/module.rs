//! # モジュール
//!
//! 1つの翻訳単位（ソースファイル）の解析結果です。ASTのアリーナとその根の
//! モジュールノードを所有します。

use crate::frontend::ast::{Ast, ModuleNode, NodeKind, NodeRef, PipelineNode};
use crate::frontend::semantic::symbol_table::SymbolTable;

/// 解析済みのモジュール
#[derive(Debug, Clone)]
pub struct Module {
    ast: Ast,
    root: NodeRef,
}

impl Module {
    /// パーサーが組み立てたトップレベル宣言から、名前付きのモジュールを作成
    pub fn new(name: &str, mut ast: Ast, globals: Vec<NodeRef>) -> Self {
        let line = globals.first().map_or(1, |g| ast.node(*g).line);
        let name = ast.alloc(line, NodeKind::Ident(name.to_string()));
        let root = ast.alloc(
            line,
            NodeKind::Module(ModuleNode {
                name,
                globals,
                functions: SymbolTable::new(),
                pipelines: SymbolTable::new(),
            }),
        );
        Self { ast, root }
    }

    /// モジュール名
    pub fn name(&self) -> &str {
        self.node()
            .and_then(|m| self.ast.ident(m.name))
            .unwrap_or_default()
    }

    /// ASTのアリーナ
    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    /// ASTのアリーナ（派生状態を書き込むパス向け）
    pub(crate) fn ast_mut(&mut self) -> &mut Ast {
        &mut self.ast
    }

    /// 根のモジュールノード
    pub fn root(&self) -> NodeRef {
        self.root
    }

    /// モジュールノードの内容
    pub fn node(&self) -> Option<&ModuleNode> {
        self.ast.module(self.root)
    }

    /// トップレベル宣言の並び
    pub fn globals(&self) -> &[NodeRef] {
        self.node().map(|m| m.globals.as_slice()).unwrap_or(&[])
    }

    /// パイプラインを名前で検索
    pub fn get_pipeline(&self, name: &str) -> Option<NodeRef> {
        self.node()?.pipelines.get(name)
    }

    /// グローバル関数を名前で検索
    pub fn get_global_function(&self, name: &str) -> Option<NodeRef> {
        self.node()?.functions.get(name)
    }

    /// パイプライン内の関数を検索（インクルードは辿らない）
    pub fn get_pipeline_function(&self, pipeline: &str, name: &str) -> Option<NodeRef> {
        self.pipeline_node(pipeline)?.get_function(name)
    }

    /// パイプライン内の変数を検索（インクルードは辿らない）
    pub fn get_variable(&self, pipeline: &str, name: &str) -> Option<NodeRef> {
        self.pipeline_node(pipeline)?.get_variable(name)
    }

    fn pipeline_node(&self, name: &str) -> Option<&PipelineNode> {
        let node = self.get_pipeline(name)?;
        self.ast.pipeline(node)
    }
}
