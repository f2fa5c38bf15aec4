//! # 文法エンジン
//!
//! パーサーが1トークンずつ駆動する文法エンジンの境界と、Parasol文法の実装です。
//!
//! エンジンはノードを自分では作らず、還元のたびに [`SemanticActions`] のコールバックを呼びます。
//! 構文エラーと受理も同じコールバックで通知されます。
//!
//! [`ParasolGrammar`] はトップレベル宣言を単位に還元します。括弧の深さが0の位置で次の宣言の
//! 先頭キーワード（`pipeline`・`def`・`struct`）か入力終端を受け取ると、保留中の宣言を還元します。
//! 対応しない閉じ括弧や宣言の先頭になれないトークンは、受け取った時点で拒否します。

use log::trace;

use crate::frontend::ast::NodeRef;
use crate::frontend::lexer::{Token, TokenKind};

/// 1トークンを与えた結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feed {
    /// さらに入力が必要
    NeedMore,
    /// 入力全体を受理した
    Accepted,
    /// 構文エラー（詳細は [`SemanticActions::syntax_error`] で通知済み）
    Rejected,
}

/// 還元時にエンジンが呼び出すコールバック
pub trait SemanticActions {
    /// 整数・浮動小数点リテラル
    fn literal(&mut self, token: &Token) -> NodeRef;
    /// 識別子（識別子・スコープ参照・関数呼び出しトークンの名前部分）
    fn ident(&mut self, token: &Token) -> NodeRef;
    /// 型識別子
    fn type_ident(&mut self, name: &Token, dimension: Option<&Token>) -> NodeRef;
    /// 変数宣言
    fn var_decl(
        &mut self,
        line: usize,
        name: Option<NodeRef>,
        ty: Option<NodeRef>,
        index: Option<NodeRef>,
        scope: Option<NodeRef>,
    ) -> NodeRef;
    /// 二項演算
    fn binary_op(&mut self, op: &Token, left: NodeRef, right: NodeRef) -> NodeRef;
    /// 単項演算
    fn unary_op(&mut self, op: &Token, operand: NodeRef) -> NodeRef;
    /// 関数呼び出し
    fn function_call(&mut self, name: &Token, arguments: Vec<NodeRef>) -> NodeRef;
    /// 関数定義
    fn function_def(
        &mut self,
        line: usize,
        name: NodeRef,
        parameters: Vec<NodeRef>,
        body: Option<NodeRef>,
    ) -> NodeRef;
    /// ラムダ式
    fn lambda(&mut self, line: usize, parameters: Vec<NodeRef>, body: NodeRef) -> NodeRef;
    /// `else` ガード（常に真の条件）
    fn else_guard(&mut self, line: usize) -> NodeRef;
    /// ガード付きの場合
    fn case(&mut self, line: usize, condition: NodeRef, result: NodeRef) -> NodeRef;
    /// Ψ式
    fn psi(&mut self, line: usize, cases: Vec<NodeRef>) -> NodeRef;
    /// let束縛
    fn let_expr(&mut self, line: usize, assignments: Vec<NodeRef>, body: NodeRef) -> NodeRef;
    /// インクルード宣言
    fn include(&mut self, line: usize, pipeline: NodeRef, alias: Option<NodeRef>) -> NodeRef;
    /// 構造体定義
    fn struct_def(&mut self, line: usize, name: NodeRef, members: Vec<NodeRef>) -> NodeRef;
    /// パイプライン
    fn pipeline(&mut self, line: usize, name: NodeRef, contents: Vec<NodeRef>) -> NodeRef;

    /// 構文エラーの通知
    fn syntax_error(&mut self, token: &Token);
    /// 受理の通知（トップレベル宣言の並び）
    fn accept(&mut self, globals: Vec<NodeRef>);
}

/// パーサーが駆動する文法エンジン
pub trait GrammarEngine {
    /// トークンを1つ与える
    fn feed(&mut self, token: Token, actions: &mut dyn SemanticActions) -> Feed;

    /// 終端トークンを与えて残りの還元を行う
    fn feed_end(&mut self, line: usize, actions: &mut dyn SemanticActions) -> Feed {
        self.feed(Token::end(line), actions)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EngineState {
    Running,
    Accepted,
    Failed,
}

/// Parasol文法のエンジン
#[derive(Debug)]
pub struct ParasolGrammar {
    /// 還元待ちのトップレベル宣言のトークン
    pending: Vec<Token>,
    /// 現在の括弧の深さ
    depth: usize,
    /// 還元済みのトップレベル宣言
    globals: Vec<NodeRef>,
    state: EngineState,
}

impl Default for ParasolGrammar {
    fn default() -> Self {
        Self::new()
    }
}

impl ParasolGrammar {
    /// 新しいエンジンを作成
    pub fn new() -> Self {
        Self {
            pending: Vec::new(),
            depth: 0,
            globals: Vec::new(),
            state: EngineState::Running,
        }
    }

    fn reject(&mut self, token: &Token, actions: &mut dyn SemanticActions) -> Feed {
        self.state = EngineState::Failed;
        actions.syntax_error(token);
        Feed::Rejected
    }

    /// 保留中の宣言を還元する
    fn reduce_pending(&mut self, lookahead: Token, actions: &mut dyn SemanticActions) -> Result<(), Token> {
        let tokens = std::mem::take(&mut self.pending);
        let mut reducer = Reducer {
            tokens: &tokens,
            pos: 0,
            lookahead,
            nesting: 0,
            actions,
        };

        let global = reducer.global()?;
        if reducer.pos < tokens.len() {
            return Err(tokens[reducer.pos]);
        }

        trace!("トップレベル宣言を還元しました ({} トークン)", tokens.len());
        self.globals.push(global);
        Ok(())
    }
}

fn starts_global(kind: TokenKind) -> bool {
    matches!(kind, TokenKind::Pipeline | TokenKind::Def | TokenKind::Struct)
}

impl GrammarEngine for ParasolGrammar {
    fn feed(&mut self, token: Token, actions: &mut dyn SemanticActions) -> Feed {
        match self.state {
            EngineState::Running => {}
            EngineState::Accepted | EngineState::Failed => return self.reject(&token, actions),
        }

        if token.is_end() || (self.depth == 0 && starts_global(token.kind)) {
            if !self.pending.is_empty() {
                if let Err(offending) = self.reduce_pending(token, actions) {
                    return self.reject(&offending, actions);
                }
            }

            if token.is_end() {
                self.state = EngineState::Accepted;
                actions.accept(std::mem::take(&mut self.globals));
                return Feed::Accepted;
            }
        }

        if self.pending.is_empty() && !starts_global(token.kind) {
            return self.reject(&token, actions);
        }

        match token.kind {
            TokenKind::LeftCurly | TokenKind::LeftParen | TokenKind::CallIdent | TokenKind::ScopeRef => {
                self.depth += 1;
            }
            TokenKind::RightCurly | TokenKind::RightParen | TokenKind::RightBracket => {
                if self.depth == 0 {
                    return self.reject(&token, actions);
                }
                self.depth -= 1;
            }
            _ => {}
        }

        self.pending.push(token);
        Feed::NeedMore
    }
}

type Reduced = Result<NodeRef, Token>;

/// 式の入れ子の上限（超えた位置のトークンで構文エラーになる）
pub const MAX_NESTING: usize = 256;

/// 1つのトップレベル宣言のトークン列を還元する再帰下降器
struct Reducer<'t, 'a> {
    tokens: &'t [Token],
    pos: usize,
    /// 宣言の後ろに続くトークン（列の終わりではこれが見える）
    lookahead: Token,
    /// 現在の式の入れ子の深さ
    nesting: usize,
    actions: &'a mut dyn SemanticActions,
}

impl<'t, 'a> Reducer<'t, 'a> {
    fn peek(&self) -> Token {
        self.tokens.get(self.pos).copied().unwrap_or(self.lookahead)
    }

    fn peek_kind(&self) -> TokenKind {
        self.peek().kind
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.pos < self.tokens.len() && self.tokens[self.pos].kind == kind
    }

    fn bump(&mut self) -> Token {
        let token = self.peek();
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token, Token> {
        if self.at(kind) {
            Ok(self.bump())
        } else {
            Err(self.peek())
        }
    }

    /// 入れ子を1段深くして `f` を還元する
    fn nested(&mut self, f: fn(&mut Self) -> Reduced) -> Reduced {
        if self.nesting >= MAX_NESTING {
            return Err(self.peek());
        }
        self.nesting += 1;
        let reduced = f(self);
        self.nesting -= 1;
        reduced
    }

    fn global(&mut self) -> Reduced {
        match self.peek_kind() {
            TokenKind::Pipeline => self.pipeline(),
            TokenKind::Def => self.function_def(),
            TokenKind::Struct => self.struct_def(),
            _ => Err(self.peek()),
        }
    }

    fn pipeline(&mut self) -> Reduced {
        let keyword = self.expect(TokenKind::Pipeline)?;
        let name = self.expect(TokenKind::Identifier)?;
        let name = self.actions.ident(&name);
        self.expect(TokenKind::LeftCurly)?;

        let mut contents = Vec::new();
        while !self.at(TokenKind::RightCurly) {
            contents.push(self.item()?);
        }
        self.expect(TokenKind::RightCurly)?;

        Ok(self.actions.pipeline(keyword.line, name, contents))
    }

    fn item(&mut self) -> Reduced {
        match self.peek_kind() {
            TokenKind::Include => self.include(),
            TokenKind::Def => self.function_def(),
            TokenKind::Struct => self.struct_def(),
            TokenKind::Identifier => self.binding(),
            _ => Err(self.peek()),
        }
    }

    fn include(&mut self) -> Reduced {
        let keyword = self.expect(TokenKind::Include)?;
        let name = self.expect(TokenKind::Identifier)?;
        let name = self.actions.ident(&name);

        let alias = if self.at(TokenKind::As) {
            self.bump();
            let alias = self.expect(TokenKind::Identifier)?;
            Some(self.actions.ident(&alias))
        } else {
            None
        };

        Ok(self.actions.include(keyword.line, name, alias))
    }

    fn struct_def(&mut self) -> Reduced {
        let keyword = self.expect(TokenKind::Struct)?;
        let name = self.expect(TokenKind::Identifier)?;
        let name = self.actions.ident(&name);
        self.expect(TokenKind::LeftCurly)?;

        let mut members = Vec::new();
        if !self.at(TokenKind::RightCurly) {
            members.push(self.var_decl()?);
            while self.at(TokenKind::Comma) {
                self.bump();
                members.push(self.var_decl()?);
            }
        }
        self.expect(TokenKind::RightCurly)?;

        Ok(self.actions.struct_def(keyword.line, name, members))
    }

    fn function_def(&mut self) -> Reduced {
        let keyword = self.expect(TokenKind::Def)?;
        let call = self.expect(TokenKind::CallIdent)?;
        let parameters = self.parameters()?;
        self.expect(TokenKind::RightParen)?;

        let ty = if self.at(TokenKind::Colon) {
            self.bump();
            Some(self.type_ident()?)
        } else {
            None
        };
        let ident = self.actions.ident(&call);
        let name = self.actions.var_decl(call.line, Some(ident), ty, None, None);

        // 本体のない定義は組み込み関数のシグネチャ
        let body = if self.at(TokenKind::Equals) {
            self.bump();
            Some(self.expr()?)
        } else {
            None
        };

        Ok(self.actions.function_def(keyword.line, name, parameters, body))
    }

    fn parameters(&mut self) -> Result<Vec<NodeRef>, Token> {
        let mut parameters = Vec::new();
        if self.at(TokenKind::Identifier) {
            parameters.push(self.var_decl()?);
            while self.at(TokenKind::Comma) {
                self.bump();
                parameters.push(self.var_decl()?);
            }
        }
        Ok(parameters)
    }

    fn var_decl(&mut self) -> Reduced {
        let name = self.expect(TokenKind::Identifier)?;
        let ident = self.actions.ident(&name);
        self.var_decl_tail(name.line, Some(ident), None)
    }

    fn var_decl_tail(&mut self, line: usize, name: Option<NodeRef>, scope: Option<NodeRef>) -> Reduced {
        let (mut ty, mut index) = (None, None);

        if self.at(TokenKind::Colon) {
            self.bump();
            if self.at(TokenKind::Identifier) {
                ty = Some(self.type_ident()?);
            }
            if self.at(TokenKind::IntLiteral) {
                let token = self.bump();
                index = Some(self.actions.literal(&token));
            }
        }

        Ok(self.actions.var_decl(line, name, ty, index, scope))
    }

    fn type_ident(&mut self) -> Reduced {
        let name = self.expect(TokenKind::Identifier)?;

        let dimension = if self.at(TokenKind::At) {
            self.bump();
            let dimension = self.expect(TokenKind::IntLiteral)?;
            if dimension.int_value().map_or(true, |d| d < 1) {
                return Err(dimension);
            }
            Some(dimension)
        } else {
            None
        };

        Ok(self.actions.type_ident(&name, dimension.as_ref()))
    }

    fn binding(&mut self) -> Reduced {
        let decl = self.var_decl()?;

        if self.at(TokenKind::Equals) {
            let op = self.bump();
            let value = self.expr()?;
            Ok(self.actions.binary_op(&op, decl, value))
        } else {
            Ok(decl)
        }
    }

    fn expr(&mut self) -> Reduced {
        self.nested(|r| match r.peek_kind() {
            TokenKind::Lambda => r.lambda(),
            TokenKind::Let => r.let_expr(),
            TokenKind::If => r.psi(),
            _ => r.compare(),
        })
    }

    fn lambda(&mut self) -> Reduced {
        let keyword = self.expect(TokenKind::Lambda)?;
        let parameters = self.parameters()?;
        self.expect(TokenKind::GoesTo)?;
        let body = self.expr()?;
        Ok(self.actions.lambda(keyword.line, parameters, body))
    }

    fn let_expr(&mut self) -> Reduced {
        let keyword = self.expect(TokenKind::Let)?;

        let mut assignments = vec![self.binding()?];
        while self.at(TokenKind::Comma) {
            self.bump();
            assignments.push(self.binding()?);
        }
        self.expect(TokenKind::In)?;
        let body = self.expr()?;

        Ok(self.actions.let_expr(keyword.line, assignments, body))
    }

    fn psi(&mut self) -> Reduced {
        let keyword = self.expect(TokenKind::If)?;
        self.expect(TokenKind::LeftCurly)?;

        let mut cases = vec![self.case()?];
        while self.at(TokenKind::Comma) {
            self.bump();
            cases.push(self.case()?);
        }
        self.expect(TokenKind::RightCurly)?;

        Ok(self.actions.psi(keyword.line, cases))
    }

    fn case(&mut self) -> Reduced {
        let line = self.peek().line;
        let condition = if self.at(TokenKind::Else) {
            let token = self.bump();
            self.actions.else_guard(token.line)
        } else {
            self.expr()?
        };
        self.expect(TokenKind::GoesTo)?;
        let result = self.expr()?;

        Ok(self.actions.case(line, condition, result))
    }

    fn compare(&mut self) -> Reduced {
        let left = self.additive()?;

        if matches!(
            self.peek_kind(),
            TokenKind::Eq
                | TokenKind::NotEq
                | TokenKind::Less
                | TokenKind::Greater
                | TokenKind::LessEq
                | TokenKind::GreaterEq
        ) && self.pos < self.tokens.len()
        {
            let op = self.bump();
            let right = self.additive()?;
            return Ok(self.actions.binary_op(&op, left, right));
        }

        Ok(left)
    }

    fn additive(&mut self) -> Reduced {
        let mut left = self.term()?;

        while self.at(TokenKind::Plus) || self.at(TokenKind::Minus) {
            let op = self.bump();
            let right = self.term()?;
            left = self.actions.binary_op(&op, left, right);
        }

        Ok(left)
    }

    fn term(&mut self) -> Reduced {
        let mut left = self.unary()?;

        while self.at(TokenKind::Mult)
            || self.at(TokenKind::Div)
            || self.at(TokenKind::Cross)
            || self.at(TokenKind::Dot)
        {
            let op = self.bump();
            let right = self.unary()?;
            left = self.actions.binary_op(&op, left, right);
        }

        Ok(left)
    }

    fn unary(&mut self) -> Reduced {
        if self.at(TokenKind::Minus) || self.at(TokenKind::Not) {
            let op = self.bump();
            let operand = self.nested(Self::unary)?;
            return Ok(self.actions.unary_op(&op, operand));
        }

        self.primary()
    }

    fn primary(&mut self) -> Reduced {
        if self.pos >= self.tokens.len() {
            return Err(self.peek());
        }

        match self.peek_kind() {
            TokenKind::IntLiteral | TokenKind::FloatLiteral => {
                let token = self.bump();
                Ok(self.actions.literal(&token))
            }
            TokenKind::Identifier => {
                let token = self.bump();
                Ok(self.actions.ident(&token))
            }
            TokenKind::ScopeRef => {
                let token = self.bump();
                let scope = self.actions.ident(&token);
                let name = self.expect(TokenKind::Identifier)?;
                let name = self.actions.ident(&name);
                let decl = self.var_decl_tail(token.line, Some(name), Some(scope))?;
                self.expect(TokenKind::RightBracket)?;
                Ok(decl)
            }
            TokenKind::CallIdent => {
                let token = self.bump();
                let mut arguments = Vec::new();
                if !self.at(TokenKind::RightParen) {
                    arguments.push(self.expr()?);
                    while self.at(TokenKind::Comma) {
                        self.bump();
                        arguments.push(self.expr()?);
                    }
                }
                self.expect(TokenKind::RightParen)?;
                Ok(self.actions.function_call(&token, arguments))
            }
            TokenKind::LeftParen => {
                self.bump();
                let inner = self.expr()?;
                self.expect(TokenKind::RightParen)?;
                Ok(inner)
            }
            _ => Err(self.peek()),
        }
    }
}
