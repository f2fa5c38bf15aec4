//! # 抽象構文木（AST）
//!
//! Parasolのソースコードを表現する抽象構文木の定義です。
//!
//! ノードはモジュールごとのアリーナ（[`Ast`]）に格納され、[`NodeRef`] で参照されます。
//! 各バリアントは子ノードを排他的に所有し、子から親への参照は所有しない逆参照として
//! ノード生成時に一度だけ設定されます。インクルード先のパイプラインへの参照は
//! 木の外側の参照であり、モジュールをまたぐ [`QualifiedRef`] として保持されます。
//!
//! バリアントごとの子ノードの列挙（[`NodeKind::children`]）とラベル生成（[`Ast::label`]）は
//! この一か所に集約されており、ID付与・リンク・外部エクスポートの全走査がこれを使います。

use std::fmt;

use crate::frontend::lexer::TokenKind;
use crate::frontend::semantic::symbol_table::SymbolTable;

/// アリーナ内のノード参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeRef(usize);

impl NodeRef {
    /// アリーナ内のインデックス
    pub fn index(&self) -> usize {
        self.0
    }
}

/// リンク単位内のモジュール番号（追加順）
pub type ModuleIndex = usize;

/// モジュールをまたぐノード参照
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QualifiedRef {
    /// モジュール番号
    pub module: ModuleIndex,
    /// モジュール内のノード
    pub node: NodeRef,
}

impl QualifiedRef {
    /// 新しい参照を作成
    pub fn new(module: ModuleIndex, node: NodeRef) -> Self {
        Self { module, node }
    }
}

/// パイプラインノードの内容
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineNode {
    /// パイプライン名（Ident）
    pub name: NodeRef,
    /// 内容（宣言の並び）
    pub contents: Vec<NodeRef>,
    /// 関数のシンボルテーブル（分類パスが設定）
    pub functions: SymbolTable,
    /// 変数のシンボルテーブル（分類パスが設定）
    pub variables: SymbolTable,
    /// リンクされたインクルード宣言（リンクパスが設定）
    pub includes: Vec<NodeRef>,
}

impl PipelineNode {
    /// パイプライン自身のテーブルから関数を検索（インクルードは辿らない）
    pub fn get_function(&self, name: &str) -> Option<NodeRef> {
        self.functions.get(name)
    }

    /// パイプライン自身のテーブルから変数を検索（インクルードは辿らない）
    pub fn get_variable(&self, name: &str) -> Option<NodeRef> {
        self.variables.get(name)
    }
}

/// モジュールノードの内容
#[derive(Debug, Clone, PartialEq)]
pub struct ModuleNode {
    /// モジュール名（Ident）
    pub name: NodeRef,
    /// グローバル宣言の並び
    pub globals: Vec<NodeRef>,
    /// グローバル関数のシンボルテーブル（分類パスが設定）
    pub functions: SymbolTable,
    /// パイプラインのシンボルテーブル（分類パスが設定）
    pub pipelines: SymbolTable,
}

/// ノードの種類
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// 整数リテラル
    Integer(i64),
    /// 浮動小数点リテラル
    Float(f32),
    /// 識別子
    Ident(String),
    /// 型識別子（次元は1以上）
    TypeIdent {
        name: String,
        dimension: i64,
    },
    /// 変数宣言
    ///
    /// `scope` がある場合は新しい宣言ではなく、名前付きスコープへの参照を表します。
    VarDecl {
        name: Option<NodeRef>,
        ty: Option<NodeRef>,
        index: Option<NodeRef>,
        scope: Option<NodeRef>,
    },
    /// 二項演算
    BinaryOp {
        op: TokenKind,
        left: NodeRef,
        right: NodeRef,
    },
    /// 単項演算
    UnaryOp {
        op: TokenKind,
        operand: NodeRef,
    },
    /// 関数呼び出し
    FunctionCall {
        name: NodeRef,
        arguments: Vec<NodeRef>,
    },
    /// 関数定義（本体がなければ組み込み関数のシグネチャ）
    FunctionDef {
        name: NodeRef,
        parameters: Vec<NodeRef>,
        body: Option<NodeRef>,
    },
    /// ラムダ式
    Lambda {
        parameters: Vec<NodeRef>,
        body: NodeRef,
    },
    /// ガード付きの一つの場合
    Case {
        condition: NodeRef,
        result: NodeRef,
    },
    /// 多方向ガード式（Ψ式）
    PsiExpr {
        cases: Vec<NodeRef>,
    },
    /// let束縛
    Let {
        assignments: Vec<NodeRef>,
        body: NodeRef,
    },
    /// インクルード宣言
    ///
    /// `target` は所有しない参照で、リンクパスが設定します。
    IncludeDecl {
        pipeline: NodeRef,
        alias: Option<NodeRef>,
        target: Option<QualifiedRef>,
    },
    /// 構造体定義
    StructDef {
        name: NodeRef,
        members: Vec<NodeRef>,
    },
    /// パイプライン
    Pipeline(PipelineNode),
    /// モジュール（木の根）
    Module(ModuleNode),
}

impl NodeKind {
    /// 所有する子ノードを順に列挙
    pub fn children(&self) -> Vec<NodeRef> {
        match self {
            NodeKind::Integer(_)
            | NodeKind::Float(_)
            | NodeKind::Ident(_)
            | NodeKind::TypeIdent { .. } => Vec::new(),
            NodeKind::VarDecl { name, ty, index, scope } => {
                [*name, *ty, *index, *scope].into_iter().flatten().collect()
            }
            NodeKind::BinaryOp { left, right, .. } => vec![*left, *right],
            NodeKind::UnaryOp { operand, .. } => vec![*operand],
            NodeKind::FunctionCall { name, arguments } => {
                let mut children = vec![*name];
                children.extend(arguments.iter().copied());
                children
            }
            NodeKind::FunctionDef { name, parameters, body } => {
                let mut children = vec![*name];
                children.extend(parameters.iter().copied());
                children.extend(*body);
                children
            }
            NodeKind::Lambda { parameters, body } => {
                let mut children = parameters.clone();
                children.push(*body);
                children
            }
            NodeKind::Case { condition, result } => vec![*condition, *result],
            NodeKind::PsiExpr { cases } => cases.clone(),
            NodeKind::Let { assignments, body } => {
                let mut children = assignments.clone();
                children.push(*body);
                children
            }
            // target はインクルード先の木に属するので子ではない
            NodeKind::IncludeDecl { pipeline, alias, .. } => {
                let mut children = vec![*pipeline];
                children.extend(*alias);
                children
            }
            NodeKind::StructDef { name, members } => {
                let mut children = vec![*name];
                children.extend(members.iter().copied());
                children
            }
            // includes はリンクパスが作る参照の一覧で、所有はしない
            NodeKind::Pipeline(pipeline) => {
                let mut children = vec![pipeline.name];
                children.extend(pipeline.contents.iter().copied());
                children
            }
            NodeKind::Module(module) => {
                let mut children = vec![module.name];
                children.extend(module.globals.iter().copied());
                children
            }
        }
    }

    /// バリアントのタグ
    pub fn tag(&self) -> &'static str {
        match self {
            NodeKind::Integer(_) => "integer",
            NodeKind::Float(_) => "float",
            NodeKind::Ident(_) => "ident",
            NodeKind::TypeIdent { .. } => "type_ident",
            NodeKind::VarDecl { .. } => "var_decl",
            NodeKind::BinaryOp { .. } => "binary_op",
            NodeKind::UnaryOp { .. } => "unary_op",
            NodeKind::FunctionCall { .. } => "function_call",
            NodeKind::FunctionDef { .. } => "function_def",
            NodeKind::Lambda { .. } => "lambda",
            NodeKind::Case { .. } => "case",
            NodeKind::PsiExpr { .. } => "psi",
            NodeKind::Let { .. } => "let",
            NodeKind::IncludeDecl { .. } => "include",
            NodeKind::StructDef { .. } => "struct",
            NodeKind::Pipeline(_) => "pipeline",
            NodeKind::Module(_) => "module",
        }
    }
}

/// ASTノード
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// ソース上の行
    pub line: usize,
    /// ノードID（IDパスが前順で付与、未付与は0）
    pub node_id: usize,
    /// 親ノード（根は `None`）
    pub parent: Option<NodeRef>,
    /// ノードの種類
    pub kind: NodeKind,
}

/// ノードのアリーナ
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Ast {
    nodes: Vec<Node>,
}

impl Ast {
    /// 空のアリーナを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// ノードを追加し、その子ノードの親参照を設定する
    pub fn alloc(&mut self, line: usize, kind: NodeKind) -> NodeRef {
        let node = NodeRef(self.nodes.len());

        for child in kind.children() {
            let slot = &mut self.nodes[child.0].parent;
            debug_assert!(slot.is_none(), "ノード {:?} は既に所有されています", child);
            *slot = Some(node);
        }

        self.nodes.push(Node {
            line,
            node_id: 0,
            parent: None,
            kind,
        });
        node
    }

    /// ノード数
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// ノードを取得
    pub fn node(&self, node: NodeRef) -> &Node {
        &self.nodes[node.0]
    }

    /// ノードを可変で取得
    pub fn node_mut(&mut self, node: NodeRef) -> &mut Node {
        &mut self.nodes[node.0]
    }

    /// ノードの種類を取得
    pub fn kind(&self, node: NodeRef) -> &NodeKind {
        &self.nodes[node.0].kind
    }

    /// 所有する子ノードを順に取得
    pub fn children(&self, node: NodeRef) -> Vec<NodeRef> {
        self.kind(node).children()
    }

    /// 親ノードを取得
    pub fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        self.nodes[node.0].parent
    }

    /// 全ノードの参照（アリーナ順）
    pub fn refs(&self) -> impl Iterator<Item = NodeRef> {
        (0..self.nodes.len()).map(NodeRef)
    }

    /// Ident・TypeIdent の文字列
    pub fn ident(&self, node: NodeRef) -> Option<&str> {
        match self.kind(node) {
            NodeKind::Ident(value) => Some(value),
            NodeKind::TypeIdent { name, .. } => Some(name),
            _ => None,
        }
    }

    /// 変数宣言の名前
    pub fn var_decl_name(&self, node: NodeRef) -> Option<&str> {
        match self.kind(node) {
            NodeKind::VarDecl { name: Some(name), .. } => self.ident(*name),
            _ => None,
        }
    }

    /// 関数定義の宣言名
    pub fn function_name(&self, node: NodeRef) -> Option<&str> {
        match self.kind(node) {
            NodeKind::FunctionDef { name, .. } => self.var_decl_name(*name),
            _ => None,
        }
    }

    /// パイプラインの名前
    pub fn pipeline_name(&self, node: NodeRef) -> Option<&str> {
        self.pipeline(node).and_then(|p| self.ident(p.name))
    }

    /// インクルードされるパイプライン名
    pub fn included_name(&self, node: NodeRef) -> Option<&str> {
        match self.kind(node) {
            NodeKind::IncludeDecl { pipeline, .. } => self.ident(*pipeline),
            _ => None,
        }
    }

    /// インクルード宣言の解決先
    pub fn include_target(&self, node: NodeRef) -> Option<QualifiedRef> {
        match self.kind(node) {
            NodeKind::IncludeDecl { target, .. } => *target,
            _ => None,
        }
    }

    /// パイプラインの内容を取得
    pub fn pipeline(&self, node: NodeRef) -> Option<&PipelineNode> {
        match self.kind(node) {
            NodeKind::Pipeline(pipeline) => Some(pipeline),
            _ => None,
        }
    }

    /// パイプラインの内容を可変で取得
    pub fn pipeline_mut(&mut self, node: NodeRef) -> Option<&mut PipelineNode> {
        match &mut self.nodes[node.0].kind {
            NodeKind::Pipeline(pipeline) => Some(pipeline),
            _ => None,
        }
    }

    /// モジュールの内容を取得
    pub fn module(&self, node: NodeRef) -> Option<&ModuleNode> {
        match self.kind(node) {
            NodeKind::Module(module) => Some(module),
            _ => None,
        }
    }

    /// モジュールの内容を可変で取得
    pub fn module_mut(&mut self, node: NodeRef) -> Option<&mut ModuleNode> {
        match &mut self.nodes[node.0].kind {
            NodeKind::Module(module) => Some(module),
            _ => None,
        }
    }

    /// 変数宣言を `scope[name: type idx]` の形式で整形
    pub fn format_var_decl(&self, node: NodeRef) -> String {
        let (name, ty, index, scope) = match self.kind(node) {
            NodeKind::VarDecl { name, ty, index, scope } => (*name, *ty, *index, *scope),
            _ => return String::new(),
        };

        let mut out = String::new();
        if let Some(scope) = scope {
            out.push_str(self.ident(scope).unwrap_or_default());
            out.push('[');
        }
        if let Some(name) = name {
            out.push_str(self.ident(name).unwrap_or_default());
        }
        if ty.is_some() || index.is_some() {
            out.push(':');
        }
        if let Some(ty) = ty {
            out.push(' ');
            out.push_str(&self.label(ty));
        }
        if let Some(index) = index {
            out.push(' ');
            out.push_str(&self.label(index));
        }
        if scope.is_some() {
            out.push(']');
        }
        out
    }

    /// 引数リストを `a, b: float` の形式で整形
    pub fn format_parameter_list(&self, parameters: &[NodeRef]) -> String {
        parameters
            .iter()
            .map(|p| self.format_var_decl(*p))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// ノードの表示用ラベル
    pub fn label(&self, node: NodeRef) -> String {
        match self.kind(node) {
            NodeKind::Integer(value) => value.to_string(),
            NodeKind::Float(value) => value.to_string(),
            NodeKind::Ident(value) => value.clone(),
            NodeKind::TypeIdent { name, dimension } => {
                if *dimension > 1 {
                    format!("{}@{}", name, dimension)
                } else {
                    name.clone()
                }
            }
            NodeKind::VarDecl { .. } => self.format_var_decl(node),
            NodeKind::BinaryOp { op, .. } | NodeKind::UnaryOp { op, .. } => {
                op.symbol().unwrap_or("?").to_string()
            }
            NodeKind::FunctionCall { name, arguments } => {
                format!("{}({})", self.ident(*name).unwrap_or_default(), arguments.len())
            }
            NodeKind::FunctionDef { name, parameters, .. } => format!(
                "Δ{} {}",
                self.format_var_decl(*name),
                self.format_parameter_list(parameters)
            )
            .trim_end()
            .to_string(),
            NodeKind::Lambda { parameters, .. } => {
                format!("λ{}", self.format_parameter_list(parameters))
            }
            NodeKind::PsiExpr { .. } => "Ψ".to_string(),
            NodeKind::IncludeDecl { pipeline, alias, .. } => {
                let mut out = format!("include {}", self.ident(*pipeline).unwrap_or_default());
                if let Some(alias) = alias {
                    out.push_str(" as ");
                    out.push_str(self.ident(*alias).unwrap_or_default());
                }
                out
            }
            NodeKind::StructDef { name, .. } => format!("{{{}}}", self.ident(*name).unwrap_or_default()),
            NodeKind::Pipeline(pipeline) => format!("={}=", self.ident(pipeline.name).unwrap_or_default()),
            NodeKind::Module(module) => format!("mod:{}", self.ident(module.name).unwrap_or_default()),
            other => other.tag().to_string(),
        }
    }

    /// `root` 以下をインデント付きのラベル木として書き出す
    pub fn write_tree(&self, root: NodeRef, f: &mut impl fmt::Write) -> fmt::Result {
        let mut stack = vec![(root, 0usize)];

        while let Some((node, depth)) = stack.pop() {
            let n = self.node(node);
            writeln!(
                f,
                "{:indent$}{} [{} #{} 行{}]",
                "",
                self.label(node),
                n.kind.tag(),
                n.node_id,
                n.line,
                indent = depth * 2
            )?;
            stack.extend(n.kind.children().into_iter().rev().map(|child| (child, depth + 1)));
        }
        Ok(())
    }
}
