//! # レキサー（字句解析器）
//!
//! Parasolのソースコードを字句解析し、トークン列に変換するモジュールです。
//!
//! 1回の `next_token` 呼び出しでは次の優先順位で判定します。
//!
//! 1. 空白と `;` から行末までのコメントを読み飛ばす（改行ごとに行番号を進める）
//! 2. 入力終端なら終端トークンを返す
//! 3. 二文字演算子（`=>`, `>=` など）。二文字目が一致しなければ一文字目の単独トークン
//! 4. 一文字の記号
//! 5. 数値リテラル（直後に識別子文字が続く場合はエラー）
//! 6. 識別子（直後の `[` はスコープ参照、`(` は関数呼び出し、それ以外はキーワード表を確認）
//! 7. どれにも該当しない文字はエラー

use std::iter::Peekable;
use std::str::Chars;

use log::trace;

use crate::frontend::error::{CompilerError, Result};

pub mod string_table;
pub mod token;

pub use string_table::StringTable;
pub use token::{Token, TokenKind, TokenValue};

/// 二文字演算子の表の要素
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DigraphEntry {
    /// 一文字目
    pub first: char,
    /// 二文字目が一致しない場合のトークン
    pub monograph: TokenKind,
    /// 二文字目
    pub second: char,
    /// 二文字目が一致した場合のトークン
    pub digraph: TokenKind,
}

/// レキサーが参照する記号・二文字演算子・キーワードの表
#[derive(Debug, Clone)]
pub struct LexerTables {
    /// 一文字の記号
    pub symbols: Vec<(char, TokenKind)>,
    /// 二文字演算子
    pub digraphs: Vec<DigraphEntry>,
    /// キーワード
    pub keywords: Vec<(&'static str, TokenKind)>,
}

impl Default for LexerTables {
    fn default() -> Self {
        let digraph = |first, monograph, second, digraph| DigraphEntry {
            first,
            monograph,
            second,
            digraph,
        };

        Self {
            symbols: vec![
                (',', TokenKind::Comma),
                ('{', TokenKind::LeftCurly),
                ('}', TokenKind::RightCurly),
                (']', TokenKind::RightBracket),
                ('(', TokenKind::LeftParen),
                (')', TokenKind::RightParen),
                (':', TokenKind::Colon),
                ('@', TokenKind::At),
                ('+', TokenKind::Plus),
                ('-', TokenKind::Minus),
                ('*', TokenKind::Mult),
                ('/', TokenKind::Div),
                ('%', TokenKind::Cross),
                ('`', TokenKind::Dot),
                ('~', TokenKind::Not),
                ('\\', TokenKind::Lambda),
            ],
            digraphs: vec![
                digraph('=', TokenKind::Equals, '>', TokenKind::GoesTo),
                digraph('=', TokenKind::Equals, '=', TokenKind::Eq),
                digraph('>', TokenKind::Greater, '=', TokenKind::GreaterEq),
                digraph('<', TokenKind::Less, '=', TokenKind::LessEq),
                digraph('!', TokenKind::Bang, '=', TokenKind::NotEq),
            ],
            keywords: vec![
                ("def", TokenKind::Def),
                ("if", TokenKind::If),
                ("else", TokenKind::Else),
                ("let", TokenKind::Let),
                ("in", TokenKind::In),
                ("include", TokenKind::Include),
                ("as", TokenKind::As),
                ("pipeline", TokenKind::Pipeline),
                ("struct", TokenKind::Struct),
            ],
        }
    }
}

impl LexerTables {
    /// 一文字の記号を検索
    pub fn monograph(&self, c: char) -> Option<TokenKind> {
        self.symbols
            .iter()
            .find(|(symbol, _)| *symbol == c)
            .map(|&(_, kind)| kind)
    }

    /// キーワードを検索
    pub fn keyword(&self, ident: &str) -> Option<TokenKind> {
        self.keywords
            .iter()
            .find(|(keyword, _)| *keyword == ident)
            .map(|&(_, kind)| kind)
    }
}

/// レキサー
///
/// 識別子は呼び出し側が渡す [`StringTable`] にインターンされます。
/// 文字列テーブルは構文解析のセッション（[`Parser`](crate::frontend::parser::Parser)）が所有します。
pub struct Lexer<'a> {
    /// 文字イテレータ
    chars: Peekable<Chars<'a>>,
    /// 現在の行番号（1から始まる）
    line: usize,
    /// 記号・キーワードの表
    tables: LexerTables,
    /// 識別子・数値の読み取りバッファ
    current: String,
}

impl<'a> Lexer<'a> {
    /// 新しいレキサーを作成
    pub fn new(source: &'a str) -> Self {
        Self::with_tables(source, LexerTables::default())
    }

    /// 表を指定してレキサーを作成
    pub fn with_tables(source: &'a str, tables: LexerTables) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            tables,
            current: String::new(),
        }
    }

    /// 次のトークンを取得
    pub fn next_token(&mut self, strings: &mut StringTable) -> Result<Token> {
        self.skip_whitespace();

        let line = self.line;
        let c = match self.chars.peek() {
            Some(&c) => c,
            None => return Ok(Token::end(line)),
        };

        let token = if let Some(kind) = self.next_digraph(c) {
            Token::symbol(kind, line)
        } else if let Some(kind) = self.tables.monograph(c) {
            self.chars.next();
            Token::symbol(kind, line)
        } else if c.is_ascii_digit() || (c == '.' && self.peek_second().map_or(false, |n| n.is_ascii_digit())) {
            self.number(line)?
        } else if is_ident_start(c) {
            self.identifier(line, strings)
        } else {
            return Err(CompilerError::lexical_error(
                format!("不明な文字です: '{}'", c),
                line,
            ));
        };

        trace!("トークン {:?} (行 {})", token.kind, token.line);
        Ok(token)
    }

    /// 空白とコメントを読み飛ばす
    fn skip_whitespace(&mut self) {
        while let Some(&c) = self.chars.peek() {
            match c {
                '\n' => {
                    self.line += 1;
                    self.chars.next();
                }
                ' ' | '\r' | '\t' => {
                    self.chars.next();
                }
                ';' => {
                    // 改行自体は次の周回で数える
                    while let Some(&c) = self.chars.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.chars.next();
                    }
                }
                _ => return,
            }
        }
    }

    /// 現在の文字の次の文字を覗く
    fn peek_second(&self) -> Option<char> {
        self.chars.clone().nth(1)
    }

    /// 二文字演算子の判定
    ///
    /// 一文字目が表にあれば必ず一文字目を消費し、二文字目が一致したときだけ二文字目も消費します。
    fn next_digraph(&mut self, c: char) -> Option<TokenKind> {
        let fallback = self.tables.digraphs.iter().find(|d| d.first == c)?.monograph;
        let second = self.peek_second();

        let matched = self
            .tables
            .digraphs
            .iter()
            .find(|d| d.first == c && Some(d.second) == second)
            .map(|d| d.digraph);

        self.chars.next();
        match matched {
            Some(kind) => {
                self.chars.next();
                Some(kind)
            }
            None => Some(fallback),
        }
    }

    /// 数値リテラルの解析
    fn number(&mut self, line: usize) -> Result<Token> {
        self.current.clear();
        let mut is_float = false;

        while let Some(&c) = self.chars.peek() {
            if c == '.' {
                // 二つ目の '.' でリテラルは終わる
                if is_float {
                    break;
                }
                is_float = true;
            } else if !c.is_ascii_digit() {
                break;
            }
            self.current.push(c);
            self.chars.next();
        }

        if let Some(&c) = self.chars.peek() {
            if is_ident_char(c) {
                return Err(CompilerError::lexical_error(
                    format!("数値リテラル '{}' の直後に識別子文字 '{}' があります", self.current, c),
                    line,
                ));
            }
        }

        if is_float {
            let value = self.current.parse::<f32>().map_err(|_| {
                CompilerError::lexical_error(
                    format!("浮動小数点リテラルを解析できません: {}", self.current),
                    line,
                )
            })?;
            Ok(Token::new(TokenKind::FloatLiteral, line, TokenValue::Float(value)))
        } else {
            let value = self.current.parse::<i64>().map_err(|_| {
                CompilerError::lexical_error(
                    format!("整数リテラルを解析できません: {}", self.current),
                    line,
                )
            })?;
            Ok(Token::new(TokenKind::IntLiteral, line, TokenValue::Integer(value)))
        }
    }

    /// 識別子・キーワード・スコープ参照・関数呼び出しの解析
    fn identifier(&mut self, line: usize, strings: &mut StringTable) -> Token {
        self.current.clear();

        while let Some(&c) = self.chars.peek() {
            if !is_ident_char(c) {
                break;
            }
            self.current.push(c);
            self.chars.next();
        }

        let kind = match self.chars.peek() {
            Some('[') => {
                self.chars.next();
                TokenKind::ScopeRef
            }
            Some('(') => {
                self.chars.next();
                TokenKind::CallIdent
            }
            _ => {
                if let Some(keyword) = self.tables.keyword(&self.current) {
                    return Token::symbol(keyword, line);
                }
                TokenKind::Identifier
            }
        };

        let index = strings.push_string(&self.current);
        Token::new(kind, line, TokenValue::StringRef(index))
    }
}

/// 識別子の先頭になれる文字かどうか
fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// 識別子に含められる文字かどうか
fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '?'
}

/// ソース全体をトークン列に変換する（終端トークンを含む）
pub fn tokenize(source: &str, strings: &mut StringTable) -> Result<Vec<Token>> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();

    loop {
        let token = lexer.next_token(strings)?;
        let done = token.is_end();
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}
