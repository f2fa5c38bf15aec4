//! # 文字列テーブル
//!
//! 識別子の文字列をインターンし、一意な文字列ごとに安定した小さな整数を返します。

use std::collections::HashMap;

/// 文字列テーブル
#[derive(Debug, Default, Clone)]
pub struct StringTable {
    /// 登録順の文字列
    strings: Vec<String>,
    /// 文字列から既存インデックスへの対応
    previous_locations: HashMap<String, usize>,
}

impl StringTable {
    /// 空の文字列テーブルを作成
    pub fn new() -> Self {
        Self::default()
    }

    /// 文字列を登録し、そのインデックスを返す
    pub fn push_string(&mut self, s: &str) -> usize {
        if let Some(&index) = self.previous_locations.get(s) {
            return index;
        }

        let index = self.strings.len();
        self.strings.push(s.to_string());
        self.previous_locations.insert(s.to_string(), index);
        index
    }

    /// インデックスから文字列を取得
    ///
    /// # パニック
    ///
    /// 範囲外のインデックスはプログラミングエラーとしてパニックします。
    pub fn get_string(&self, index: usize) -> &str {
        &self.strings[index]
    }

    /// 登録された文字列の数
    pub fn len(&self) -> usize {
        self.strings.len()
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
