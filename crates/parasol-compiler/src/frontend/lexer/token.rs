//! # トークン定義
//!
//! Parasolのレキサーが生成し、パーサーが消費するトークンの定義です。
//! トークンは種類・開始行・ペイロード（整数、浮動小数点、文字列テーブルのインデックス）を持ちます。

use std::fmt;

/// トークンの種類
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    // 区切り記号
    /// コンマ ,
    Comma,
    /// 左波括弧 {
    LeftCurly,
    /// 右波括弧 }
    RightCurly,
    /// 右角括弧 ]
    RightBracket,
    /// 左括弧 (
    LeftParen,
    /// 右括弧 )
    RightParen,
    /// コロン :
    Colon,
    /// アットマーク @（型の次元指定）
    At,

    // 演算子
    /// プラス +
    Plus,
    /// マイナス -
    Minus,
    /// 乗算 *
    Mult,
    /// 除算 /
    Div,
    /// 外積 %
    Cross,
    /// 内積 `
    Dot,
    /// 否定 ~
    Not,
    /// ラムダ \
    Lambda,
    /// 等号 =
    Equals,
    /// 小なり <
    Less,
    /// 大なり >
    Greater,
    /// 感嘆符 !
    Bang,

    // 二文字演算子
    /// アロー =>
    GoesTo,
    /// 等価 ==
    Eq,
    /// 非等価 !=
    NotEq,
    /// 小なりイコール <=
    LessEq,
    /// 大なりイコール >=
    GreaterEq,

    // キーワード
    /// def キーワード
    Def,
    /// if キーワード
    If,
    /// else キーワード
    Else,
    /// let キーワード
    Let,
    /// in キーワード
    In,
    /// include キーワード
    Include,
    /// as キーワード
    As,
    /// pipeline キーワード
    Pipeline,
    /// struct キーワード
    Struct,

    // リテラルと識別子
    /// 整数リテラル
    IntLiteral,
    /// 浮動小数点リテラル
    FloatLiteral,
    /// 識別子
    Identifier,
    /// スコープ参照（`name[`）
    ScopeRef,
    /// 関数呼び出し（`name(`）
    CallIdent,

    /// 入力終端
    End,
}

impl TokenKind {
    /// 固定綴りのトークンの綴りを返す
    ///
    /// リテラル・識別子・終端のように綴りが固定でないトークンは `None` を返します。
    pub fn symbol(&self) -> Option<&'static str> {
        let s = match self {
            TokenKind::Comma => ",",
            TokenKind::LeftCurly => "{",
            TokenKind::RightCurly => "}",
            TokenKind::RightBracket => "]",
            TokenKind::LeftParen => "(",
            TokenKind::RightParen => ")",
            TokenKind::Colon => ":",
            TokenKind::At => "@",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Mult => "*",
            TokenKind::Div => "/",
            TokenKind::Cross => "%",
            TokenKind::Dot => "`",
            TokenKind::Not => "~",
            TokenKind::Lambda => "\\",
            TokenKind::Equals => "=",
            TokenKind::Less => "<",
            TokenKind::Greater => ">",
            TokenKind::Bang => "!",
            TokenKind::GoesTo => "=>",
            TokenKind::Eq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::LessEq => "<=",
            TokenKind::GreaterEq => ">=",
            TokenKind::Def => "def",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::Let => "let",
            TokenKind::In => "in",
            TokenKind::Include => "include",
            TokenKind::As => "as",
            TokenKind::Pipeline => "pipeline",
            TokenKind::Struct => "struct",
            TokenKind::IntLiteral
            | TokenKind::FloatLiteral
            | TokenKind::Identifier
            | TokenKind::ScopeRef
            | TokenKind::CallIdent
            | TokenKind::End => return None,
        };
        Some(s)
    }

    /// キーワードかどうか
    pub fn is_keyword(&self) -> bool {
        matches!(
            self,
            TokenKind::Def
                | TokenKind::If
                | TokenKind::Else
                | TokenKind::Let
                | TokenKind::In
                | TokenKind::Include
                | TokenKind::As
                | TokenKind::Pipeline
                | TokenKind::Struct
        )
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.symbol() {
            Some(s) => write!(f, "'{}'", s),
            None => match self {
                TokenKind::IntLiteral => write!(f, "整数リテラル"),
                TokenKind::FloatLiteral => write!(f, "浮動小数点リテラル"),
                TokenKind::Identifier => write!(f, "識別子"),
                TokenKind::ScopeRef => write!(f, "スコープ参照"),
                TokenKind::CallIdent => write!(f, "関数呼び出し"),
                _ => write!(f, "入力終端"),
            },
        }
    }
}

/// トークンのペイロード
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenValue {
    /// ペイロードなし
    None,
    /// 整数値
    Integer(i64),
    /// 浮動小数点値
    Float(f32),
    /// 文字列テーブルのインデックス
    StringRef(usize),
}

/// トークン
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    /// トークンの種類
    pub kind: TokenKind,
    /// トークンが始まった行（1から始まる）
    pub line: usize,
    /// ペイロード
    pub value: TokenValue,
}

impl Token {
    /// 新しいトークンを作成
    pub fn new(kind: TokenKind, line: usize, value: TokenValue) -> Self {
        Self { kind, line, value }
    }

    /// ペイロードを持たない記号トークンを作成
    pub fn symbol(kind: TokenKind, line: usize) -> Self {
        Self::new(kind, line, TokenValue::None)
    }

    /// 入力終端トークンを作成
    pub fn end(line: usize) -> Self {
        Self::symbol(TokenKind::End, line)
    }

    /// 入力終端かどうか
    pub fn is_end(&self) -> bool {
        self.kind == TokenKind::End
    }

    /// 文字列テーブルのインデックスを取得
    pub fn string_index(&self) -> Option<usize> {
        match self.value {
            TokenValue::StringRef(index) => Some(index),
            _ => None,
        }
    }

    /// 整数値を取得
    pub fn int_value(&self) -> Option<i64> {
        match self.value {
            TokenValue::Integer(v) => Some(v),
            _ => None,
        }
    }

    /// 浮動小数点値を取得
    pub fn float_value(&self) -> Option<f32> {
        match self.value {
            TokenValue::Float(v) => Some(v),
            _ => None,
        }
    }
}
