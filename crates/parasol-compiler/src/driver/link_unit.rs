//! # リンク単位
//!
//! 解析済みモジュールを追加順に保持し、モジュールをまたいでインクルードを解決します。
//!
//! モジュールの追加時に分類パスが走り、すべてのモジュールを追加した後に [`LinkUnit::link`] が
//! インクルード宣言の解決先を設定します。名前の解決はリンクの後に行ってください。
//! リンク前の問い合わせはインクルードを辿れないため、見つかる名前が少なくなります。

use std::fmt;

use log::{debug, warn};

use crate::frontend::ast::{Ast, ModuleIndex, Node, NodeKind, NodeRef, QualifiedRef};
use crate::frontend::error::{CompilerError, ErrorKind, Result};
use crate::frontend::module::Module;
use crate::frontend::parser::parse_globals;
use crate::frontend::semantic::classify_module;
use crate::frontend::visitor::{apply_typed_visitor, IdVisitor, TypedVisitor};

/// 解決先が見つからなかったインクルード宣言
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedInclude {
    /// 宣言のあるモジュール名
    pub module: String,
    /// 宣言の行
    pub line: usize,
    /// インクルードしようとしたパイプライン名
    pub name: String,
}

impl UnresolvedInclude {
    /// エラー値に変換
    pub fn to_error(&self) -> CompilerError {
        CompilerError::new(
            ErrorKind::UnresolvedInclude,
            format!("パイプライン '{}' が見つかりません (モジュール '{}')", self.name, self.module),
            Some(self.line),
        )
    }
}

impl fmt::Display for UnresolvedInclude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: include {} は未解決です", self.module, self.line, self.name)
    }
}

/// リンク結果の集計
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LinkReport {
    /// 解決できたインクルード数
    pub linked: usize,
    /// 解決できなかったインクルード数
    pub unresolved: usize,
}

impl LinkReport {
    /// すべてのインクルードが解決されたかどうか
    pub fn is_complete(&self) -> bool {
        self.unresolved == 0
    }
}

/// 名前解決で辿る表
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lookup {
    Function,
    Variable,
}

/// リンク単位
#[derive(Debug)]
pub struct LinkUnit {
    /// 追加順のモジュール
    modules: Vec<Module>,
    /// 未解決のインクルードを警告ログに出すかどうか
    warn_unresolved: bool,
}

impl Default for LinkUnit {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkUnit {
    /// 空のリンク単位を作成
    pub fn new() -> Self {
        Self {
            modules: Vec::new(),
            warn_unresolved: true,
        }
    }

    /// 未解決のインクルードを警告ログに出すかどうかを設定
    pub fn set_warn_unresolved(&mut self, warn_unresolved: bool) {
        self.warn_unresolved = warn_unresolved;
    }

    /// ソースを解析し、名前を付けてモジュールとして追加する
    ///
    /// 字句解析・構文解析のエラーはそのまま返り、既に追加済みのモジュールには影響しません。
    pub fn add_module(&mut self, source: &str, name: &str) -> Result<ModuleIndex> {
        let (ast, globals) = parse_globals(source)?;
        let mut module = Module::new(name, ast, globals);

        let root = module.root();
        IdVisitor::new().assign(module.ast_mut(), root);
        classify_module(&mut module);

        let index = self.modules.len();
        debug!(
            "モジュール '{}' を追加しました (#{}, ノード {} 個)",
            name,
            index,
            module.ast().len()
        );
        self.modules.push(module);
        Ok(index)
    }

    /// 追加順のモジュール
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// 番号でモジュールを取得
    pub fn module(&self, index: ModuleIndex) -> Option<&Module> {
        self.modules.get(index)
    }

    /// 名前でモジュールを検索（最初に追加されたもの）
    pub fn module_by_name(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name() == name)
    }

    /// 参照先のノードを取得
    pub fn node(&self, reference: QualifiedRef) -> Option<&Node> {
        let ast = self.modules.get(reference.module)?.ast();
        (reference.node.index() < ast.len()).then(|| ast.node(reference.node))
    }

    /// 全モジュールのパイプライン表を追加順に検索し、最初に見つかったパイプラインを返す
    pub fn find_pipeline(&self, name: &str) -> Option<QualifiedRef> {
        self.modules.iter().enumerate().find_map(|(index, module)| {
            module
                .get_pipeline(name)
                .map(|node| QualifiedRef::new(index, node))
        })
    }

    /// インクルード解決パス
    ///
    /// 各モジュールの木を前順に走査し、インクルード宣言ごとに解決先を設定して、
    /// 囲んでいるパイプラインのインクルード一覧に追加します。解決できない宣言があっても失敗しません。
    pub fn link(&mut self) -> LinkReport {
        let mut report = LinkReport::default();

        for index in 0..self.modules.len() {
            let mut collector = IncludeCollector::default();
            {
                let module = &self.modules[index];
                apply_typed_visitor(&mut collector, module.ast(), module.root());
            }

            let resolved: Vec<_> = collector
                .includes
                .iter()
                .map(|found| {
                    let target = self.find_pipeline(&found.name);
                    (found, target)
                })
                .collect();

            let module_name = self.modules[index].name().to_string();
            let ast = self.modules[index].ast_mut();

            for pipeline in &collector.pipelines {
                if let Some(node) = ast.pipeline_mut(*pipeline) {
                    node.includes.clear();
                }
            }

            for (found, target) in resolved {
                if let NodeKind::IncludeDecl { target: slot, .. } = &mut ast.node_mut(found.include).kind {
                    *slot = target;
                }
                if let Some(pipeline) = found.pipeline {
                    if let Some(node) = ast.pipeline_mut(pipeline) {
                        node.includes.push(found.include);
                    }
                }

                match target {
                    Some(target) => {
                        report.linked += 1;
                        debug!(
                            "{}: include {} をモジュール #{} に解決しました",
                            module_name, found.name, target.module
                        );
                    }
                    None => {
                        report.unresolved += 1;
                        if self.warn_unresolved {
                            warn!(
                                "{}:{}: インクルードするパイプライン '{}' が見つかりません",
                                module_name,
                                ast.node(found.include).line,
                                found.name
                            );
                        }
                    }
                }
            }
        }

        debug!(
            "リンク完了: 解決 {} 件, 未解決 {} 件",
            report.linked, report.unresolved
        );
        report
    }

    /// リンク後に解決先が見つからなかったインクルード宣言の一覧
    pub fn unresolved_includes(&self) -> Vec<UnresolvedInclude> {
        let mut unresolved = Vec::new();

        for module in &self.modules {
            let ast = module.ast();
            for node in ast.refs() {
                if let NodeKind::IncludeDecl { target: None, .. } = ast.kind(node) {
                    unresolved.push(UnresolvedInclude {
                        module: module.name().to_string(),
                        line: ast.node(node).line,
                        name: ast.included_name(node).unwrap_or_default().to_string(),
                    });
                }
            }
        }

        unresolved
    }

    /// パイプラインから関数を解決する
    ///
    /// パイプライン自身の表を引き、見つからなければリンク順にインクルード先を再帰的に辿ります。
    /// 解決中のパイプラインを再び訪れた場合は循環インクルードのエラーになります。
    pub fn resolve_function(&self, pipeline: QualifiedRef, name: &str) -> Result<Option<QualifiedRef>> {
        self.resolve(pipeline, name, Lookup::Function, &mut Vec::new())
    }

    /// パイプラインから変数を解決する（[`LinkUnit::resolve_function`] と同じ規則）
    pub fn resolve_variable(&self, pipeline: QualifiedRef, name: &str) -> Result<Option<QualifiedRef>> {
        self.resolve(pipeline, name, Lookup::Variable, &mut Vec::new())
    }

    fn resolve(
        &self,
        pipeline: QualifiedRef,
        name: &str,
        lookup: Lookup,
        path: &mut Vec<QualifiedRef>,
    ) -> Result<Option<QualifiedRef>> {
        let Some(ast) = self.modules.get(pipeline.module).map(Module::ast) else {
            return Ok(None);
        };
        let Some(node) = ast.pipeline(pipeline.node) else {
            return Ok(None);
        };

        if path.contains(&pipeline) {
            return Err(self.cycle_error(path, pipeline));
        }

        let direct = match lookup {
            Lookup::Function => node.get_function(name),
            Lookup::Variable => node.get_variable(name),
        };
        if let Some(found) = direct {
            return Ok(Some(QualifiedRef::new(pipeline.module, found)));
        }

        path.push(pipeline);
        for include in &node.includes {
            // 未解決のインクルードは unresolved_includes で報告される
            let Some(target) = ast.include_target(*include) else {
                continue;
            };
            if let Some(found) = self.resolve(target, name, lookup, path)? {
                return Ok(Some(found));
            }
        }
        path.pop();

        Ok(None)
    }

    fn pipeline_label(&self, pipeline: QualifiedRef) -> String {
        let module = &self.modules[pipeline.module];
        format!(
            "{}.{}",
            module.name(),
            module.ast().pipeline_name(pipeline.node).unwrap_or_default()
        )
    }

    fn cycle_error(&self, path: &[QualifiedRef], revisited: QualifiedRef) -> CompilerError {
        let start = path.iter().position(|p| *p == revisited).unwrap_or(0);
        let mut chain: Vec<String> = path[start..].iter().map(|p| self.pipeline_label(*p)).collect();
        chain.push(self.pipeline_label(revisited));

        let line = self.modules[revisited.module].ast().node(revisited.node).line;
        CompilerError::cyclic_include(
            format!("インクルードが循環しています: {}", chain.join(" -> ")),
            Some(line),
        )
    }
}

/// 走査中に見つけたインクルード宣言
#[derive(Debug)]
struct FoundInclude {
    /// 囲んでいるパイプライン
    pipeline: Option<NodeRef>,
    include: NodeRef,
    name: String,
}

/// インクルード宣言とそれを囲むパイプラインを集めるビジター
#[derive(Debug, Default)]
struct IncludeCollector {
    /// 現在入っているパイプラインのスタック
    stack: Vec<NodeRef>,
    pipelines: Vec<NodeRef>,
    includes: Vec<FoundInclude>,
}

impl TypedVisitor for IncludeCollector {
    fn visit(&mut self, ast: &Ast, node: NodeRef) {
        match ast.kind(node) {
            NodeKind::Pipeline(_) => {
                self.stack.push(node);
                self.pipelines.push(node);
            }
            NodeKind::IncludeDecl { .. } => {
                self.includes.push(FoundInclude {
                    pipeline: self.stack.last().copied(),
                    include: node,
                    name: ast.included_name(node).unwrap_or_default().to_string(),
                });
            }
            _ => {}
        }
    }

    fn leave(&mut self, ast: &Ast, node: NodeRef) {
        if ast.pipeline(node).is_some() {
            self.stack.pop();
        }
    }
}
