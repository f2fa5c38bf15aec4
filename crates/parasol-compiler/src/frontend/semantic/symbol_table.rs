//! # シンボルテーブル
//!
//! パイプライン・モジュールごとの「名前 → 宣言ノード」の対応表です。
//! 分類パスが一度だけ書き込み、その後は読み取り専用として扱われます。

use std::collections::HashMap;

use crate::frontend::ast::NodeRef;

/// シンボルテーブル
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    /// 名前から宣言ノードへの対応
    entries: HashMap<String, NodeRef>,
}

impl SymbolTable {
    /// 空のシンボルテーブルを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// シンボルを登録する
    ///
    /// 既に同名のシンボルがある場合は最初の登録を残し、`false` を返します。
    pub fn insert(&mut self, name: &str, node: NodeRef) -> bool {
        if self.entries.contains_key(name) {
            return false;
        }
        self.entries.insert(name.to_string(), node);
        true
    }

    /// シンボルを検索
    pub fn get(&self, name: &str) -> Option<NodeRef> {
        self.entries.get(name).copied()
    }

    /// 登録数
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 名前の一覧（ソート済み）
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::ast::{Ast, NodeKind};

    #[test]
    fn first_insertion_wins() {
        let mut ast = Ast::new();
        let first = ast.alloc(1, NodeKind::Integer(1));
        let second = ast.alloc(2, NodeKind::Integer(2));

        let mut table = SymbolTable::new();
        assert!(table.insert("x", first));
        assert!(!table.insert("x", second));
        assert_eq!(table.get("x"), Some(first));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn missing_name_is_none() {
        let table = SymbolTable::new();
        assert_eq!(table.get("nope"), None);
        assert!(table.is_empty());
    }
}
