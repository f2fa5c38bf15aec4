//! # パーサー（構文解析器）
//!
//! 文法エンジンに1トークンずつ与え、還元コールバックでASTを組み立てます。
//!
//! 構文エラーは現在のモジュールの解析にとって致命的です。エラーを報告した後のパーサーは
//! それ以上のトークンを受け付けません。

use log::{debug, trace};

use crate::frontend::ast::{Ast, NodeKind, NodeRef, PipelineNode};
use crate::frontend::error::{CompilerError, Result};
use crate::frontend::lexer::{Lexer, StringTable, Token, TokenKind, TokenValue};
use crate::frontend::semantic::symbol_table::SymbolTable;

pub mod grammar;

pub use grammar::{Feed, GrammarEngine, ParasolGrammar, SemanticActions, MAX_NESTING};

/// 解析の状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseStatus {
    /// 入力を受け付けている
    InProgress,
    /// 入力全体を受理した
    Accepted,
    /// 構文エラーで中断した
    Failed,
}

/// 還元コールバックの実装（ノードの構築先）
#[derive(Debug, Default)]
struct TreeBuilder {
    strings: StringTable,
    ast: Ast,
    globals: Vec<NodeRef>,
    error: Option<Token>,
}

impl TreeBuilder {
    fn text(&self, token: &Token) -> String {
        token
            .string_index()
            .map(|index| self.strings.get_string(index).to_string())
            .unwrap_or_default()
    }
}

impl SemanticActions for TreeBuilder {
    fn literal(&mut self, token: &Token) -> NodeRef {
        let kind = match token.value {
            TokenValue::Float(value) => NodeKind::Float(value),
            TokenValue::Integer(value) => NodeKind::Integer(value),
            _ => NodeKind::Integer(0),
        };
        self.ast.alloc(token.line, kind)
    }

    fn ident(&mut self, token: &Token) -> NodeRef {
        let name = self.text(token);
        self.ast.alloc(token.line, NodeKind::Ident(name))
    }

    fn type_ident(&mut self, name: &Token, dimension: Option<&Token>) -> NodeRef {
        let kind = NodeKind::TypeIdent {
            name: self.text(name),
            dimension: dimension.and_then(Token::int_value).unwrap_or(1),
        };
        self.ast.alloc(name.line, kind)
    }

    fn var_decl(
        &mut self,
        line: usize,
        name: Option<NodeRef>,
        ty: Option<NodeRef>,
        index: Option<NodeRef>,
        scope: Option<NodeRef>,
    ) -> NodeRef {
        self.ast.alloc(line, NodeKind::VarDecl { name, ty, index, scope })
    }

    fn binary_op(&mut self, op: &Token, left: NodeRef, right: NodeRef) -> NodeRef {
        self.ast.alloc(
            op.line,
            NodeKind::BinaryOp {
                op: op.kind,
                left,
                right,
            },
        )
    }

    fn unary_op(&mut self, op: &Token, operand: NodeRef) -> NodeRef {
        self.ast.alloc(op.line, NodeKind::UnaryOp { op: op.kind, operand })
    }

    fn function_call(&mut self, name: &Token, arguments: Vec<NodeRef>) -> NodeRef {
        let name_node = self.ident(name);
        self.ast.alloc(
            name.line,
            NodeKind::FunctionCall {
                name: name_node,
                arguments,
            },
        )
    }

    fn function_def(
        &mut self,
        line: usize,
        name: NodeRef,
        parameters: Vec<NodeRef>,
        body: Option<NodeRef>,
    ) -> NodeRef {
        self.ast.alloc(line, NodeKind::FunctionDef { name, parameters, body })
    }

    fn lambda(&mut self, line: usize, parameters: Vec<NodeRef>, body: NodeRef) -> NodeRef {
        self.ast.alloc(line, NodeKind::Lambda { parameters, body })
    }

    fn else_guard(&mut self, line: usize) -> NodeRef {
        self.ast.alloc(line, NodeKind::Integer(1))
    }

    fn case(&mut self, line: usize, condition: NodeRef, result: NodeRef) -> NodeRef {
        self.ast.alloc(line, NodeKind::Case { condition, result })
    }

    fn psi(&mut self, line: usize, cases: Vec<NodeRef>) -> NodeRef {
        self.ast.alloc(line, NodeKind::PsiExpr { cases })
    }

    fn let_expr(&mut self, line: usize, assignments: Vec<NodeRef>, body: NodeRef) -> NodeRef {
        self.ast.alloc(line, NodeKind::Let { assignments, body })
    }

    fn include(&mut self, line: usize, pipeline: NodeRef, alias: Option<NodeRef>) -> NodeRef {
        self.ast.alloc(
            line,
            NodeKind::IncludeDecl {
                pipeline,
                alias,
                target: None,
            },
        )
    }

    fn struct_def(&mut self, line: usize, name: NodeRef, members: Vec<NodeRef>) -> NodeRef {
        self.ast.alloc(line, NodeKind::StructDef { name, members })
    }

    fn pipeline(&mut self, line: usize, name: NodeRef, contents: Vec<NodeRef>) -> NodeRef {
        self.ast.alloc(
            line,
            NodeKind::Pipeline(PipelineNode {
                name,
                contents,
                functions: SymbolTable::new(),
                variables: SymbolTable::new(),
                includes: Vec::new(),
            }),
        )
    }

    fn syntax_error(&mut self, token: &Token) {
        self.error = Some(*token);
    }

    fn accept(&mut self, globals: Vec<NodeRef>) {
        self.globals = globals;
    }
}

/// パーサー
///
/// 1つのモジュールの解析セッションです。識別子の文字列テーブルはこのセッションが所有します。
pub struct Parser<E: GrammarEngine = ParasolGrammar> {
    engine: E,
    builder: TreeBuilder,
    /// 最後に与えられたトークン
    current_token: Option<Token>,
    status: ParseStatus,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    /// Parasol文法のパーサーを作成
    pub fn new() -> Self {
        Self::with_engine(ParasolGrammar::new())
    }
}

impl<E: GrammarEngine> Parser<E> {
    /// 文法エンジンを指定してパーサーを作成
    pub fn with_engine(engine: E) -> Self {
        Self {
            engine,
            builder: TreeBuilder::default(),
            current_token: None,
            status: ParseStatus::InProgress,
        }
    }

    /// 文字列テーブル
    pub fn strings(&self) -> &StringTable {
        &self.builder.strings
    }

    /// レキサーに渡す文字列テーブル
    pub fn strings_mut(&mut self) -> &mut StringTable {
        &mut self.builder.strings
    }

    /// 最後に与えられたトークン
    pub fn current_token(&self) -> Option<&Token> {
        self.current_token.as_ref()
    }

    /// 解析の状態
    pub fn status(&self) -> ParseStatus {
        self.status
    }

    /// トークンを1つ与える
    pub fn offer_token(&mut self, token: Token) -> Result<()> {
        if self.status != ParseStatus::InProgress {
            return Err(CompilerError::syntax_error(
                format!("解析は既に終了しています: {}", token.kind),
                token.line,
            ));
        }

        trace!("トークンを供給 {:?} (行 {})", token.kind, token.line);
        self.current_token = Some(token);

        match self.engine.feed(token, &mut self.builder) {
            Feed::NeedMore => Ok(()),
            Feed::Accepted => {
                self.status = ParseStatus::Accepted;
                debug!("解析を受理しました ({} 個のトップレベル宣言)", self.builder.globals.len());
                Ok(())
            }
            Feed::Rejected => {
                self.status = ParseStatus::Failed;
                let offending = self.builder.error.unwrap_or(token);
                Err(self.syntax_diagnostic(&offending))
            }
        }
    }

    /// 終端トークンを与えて解析を完了する
    pub fn finish(&mut self, line: usize) -> Result<()> {
        self.offer_token(Token::end(line))?;

        if self.status == ParseStatus::Accepted {
            Ok(())
        } else {
            Err(CompilerError::syntax_error("入力が途中で終わっています", line))
        }
    }

    /// 構文エラーの診断メッセージを作成
    fn syntax_diagnostic(&self, token: &Token) -> CompilerError {
        let payload = match token.value {
            TokenValue::Integer(value) => Some(value.to_string()),
            TokenValue::Float(value) => Some(value.to_string()),
            TokenValue::StringRef(index) => Some(self.builder.strings.get_string(index).to_string()),
            TokenValue::None => None,
        };

        let message = match payload {
            Some(payload) => format!("予期しないトークン {} ({})", token.kind, payload),
            None => format!("予期しないトークン {}", token.kind),
        };
        CompilerError::syntax_error(message, token.line)
    }

    /// 受理したトップレベル宣言の並び
    pub fn globals(&self) -> &[NodeRef] {
        &self.builder.globals
    }

    /// 構築したASTとトップレベル宣言を取り出す
    pub fn into_parts(self) -> (Ast, Vec<NodeRef>) {
        (self.builder.ast, self.builder.globals)
    }
}

/// ソースを字句解析しながら構文解析し、ASTとトップレベル宣言を返す
///
/// レキサーが1トークン作るたびにパーサーがそれを消費します。
pub fn parse_globals(source: &str) -> Result<(Ast, Vec<NodeRef>)> {
    let mut lexer = Lexer::new(source);
    let mut parser = Parser::new();

    loop {
        let token = lexer.next_token(parser.strings_mut())?;
        if token.kind == TokenKind::End {
            parser.finish(token.line)?;
            break;
        }
        parser.offer_token(token)?;
    }

    Ok(parser.into_parts())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_source_is_accepted() {
        let (ast, globals) = parse_globals("; 空のモジュール\n").unwrap();
        assert!(ast.is_empty());
        assert!(globals.is_empty());
    }

    #[test]
    fn tokens_after_failure_are_rejected() {
        let mut parser = Parser::new();
        assert!(parser.offer_token(Token::symbol(TokenKind::RightCurly, 1)).is_err());
        assert_eq!(parser.status(), ParseStatus::Failed);
        assert!(parser.offer_token(Token::symbol(TokenKind::Pipeline, 2)).is_err());
    }
}
