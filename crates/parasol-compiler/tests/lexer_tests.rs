use parasol_compiler::frontend::lexer::{self, Lexer, StringTable, Token, TokenKind};
use parasol_compiler::ErrorKind;

fn kinds(source: &str) -> Vec<TokenKind> {
    let mut strings = StringTable::new();
    lexer::tokenize(source, &mut strings)
        .unwrap()
        .iter()
        .map(|t| t.kind)
        .collect()
}

#[test]
fn test_lexer_digraph_is_one_token() {
    assert_eq!(kinds(">="), vec![TokenKind::GreaterEq, TokenKind::End]);
    assert_eq!(kinds("=>"), vec![TokenKind::GoesTo, TokenKind::End]);
    assert_eq!(kinds("=="), vec![TokenKind::Eq, TokenKind::End]);
    assert_eq!(kinds("<= !="), vec![TokenKind::LessEq, TokenKind::NotEq, TokenKind::End]);
}

#[test]
fn test_lexer_digraph_falls_back_to_monograph() {
    assert_eq!(
        kinds("> x"),
        vec![TokenKind::Greater, TokenKind::Identifier, TokenKind::End]
    );
    // 二文字目は独立して字句解析される
    assert_eq!(
        kinds(">x"),
        vec![TokenKind::Greater, TokenKind::Identifier, TokenKind::End]
    );
    assert_eq!(
        kinds("=1"),
        vec![TokenKind::Equals, TokenKind::IntLiteral, TokenKind::End]
    );
    assert_eq!(
        kinds(">>="),
        vec![TokenKind::Greater, TokenKind::GreaterEq, TokenKind::End]
    );
}

#[test]
fn test_lexer_monographs() {
    assert_eq!(
        kinds(", { } ] ( ) : @ + - * / % ` ~ \\"),
        vec![
            TokenKind::Comma,
            TokenKind::LeftCurly,
            TokenKind::RightCurly,
            TokenKind::RightBracket,
            TokenKind::LeftParen,
            TokenKind::RightParen,
            TokenKind::Colon,
            TokenKind::At,
            TokenKind::Plus,
            TokenKind::Minus,
            TokenKind::Mult,
            TokenKind::Div,
            TokenKind::Cross,
            TokenKind::Dot,
            TokenKind::Not,
            TokenKind::Lambda,
            TokenKind::End,
        ]
    );
}

#[test]
fn test_lexer_number_glued_to_identifier_fails() {
    let mut strings = StringTable::new();
    let err = lexer::tokenize("pipeline P {\n\n  x = 22rgb\n}", &mut strings).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Lexical);
    assert_eq!(err.line, Some(3));
}

#[test]
fn test_lexer_number_then_identifier() {
    let mut strings = StringTable::new();
    let tokens = lexer::tokenize("22 rgb", &mut strings).unwrap();

    assert_eq!(tokens.len(), 3);
    assert_eq!(tokens[0].kind, TokenKind::IntLiteral);
    assert_eq!(tokens[0].int_value(), Some(22));
    assert_eq!(tokens[1].kind, TokenKind::Identifier);
    let index = tokens[1].string_index().unwrap();
    assert_eq!(strings.get_string(index), "rgb");
}

#[test]
fn test_lexer_float_literals() {
    let mut strings = StringTable::new();
    let tokens = lexer::tokenize("1.5 .25 1.2.3", &mut strings).unwrap();

    let values: Vec<Option<f32>> = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::FloatLiteral)
        .map(Token::float_value)
        .collect();
    assert_eq!(values, vec![Some(1.5), Some(0.25), Some(1.2), Some(0.3)]);
}

#[test]
fn test_lexer_leading_dot_starts_float() {
    let mut strings = StringTable::new();
    let tokens = lexer::tokenize("x = .5", &mut strings).unwrap();

    assert_eq!(tokens[2].kind, TokenKind::FloatLiteral);
    assert_eq!(tokens[2].float_value(), Some(0.5));
    assert!(tokens[3].is_end());
}

#[test]
fn test_lexer_second_dot_ends_literal() {
    let mut strings = StringTable::new();
    let tokens = lexer::tokenize("1.2.3", &mut strings).unwrap();

    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![TokenKind::FloatLiteral, TokenKind::FloatLiteral, TokenKind::End]
    );
    assert_eq!(tokens[0].float_value(), Some(1.2));
    assert_eq!(tokens[1].float_value(), Some(0.3));
}

#[test]
fn test_lexer_leading_minus_is_operator() {
    let mut strings = StringTable::new();
    let tokens = lexer::tokenize("-5", &mut strings).unwrap();
    assert_eq!(tokens[0].kind, TokenKind::Minus);
    assert_eq!(tokens[1].int_value(), Some(5));
}

#[test]
fn test_lexer_integer_overflow_fails() {
    let mut strings = StringTable::new();
    let err = lexer::tokenize("99999999999999999999999", &mut strings).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Lexical);
}

#[test]
fn test_lexer_scope_and_call_reclassification() {
    assert_eq!(kinds("foo["), vec![TokenKind::ScopeRef, TokenKind::End]);
    assert_eq!(kinds("foo("), vec![TokenKind::CallIdent, TokenKind::End]);
    assert_eq!(kinds("foo "), vec![TokenKind::Identifier, TokenKind::End]);

    let mut strings = StringTable::new();
    let tokens = lexer::tokenize("foo[", &mut strings).unwrap();
    assert_eq!(strings.get_string(tokens[0].string_index().unwrap()), "foo");
}

#[test]
fn test_lexer_keywords() {
    let mut strings = StringTable::new();
    let tokens = lexer::tokenize(
        "pipeline include as def struct let in if else iffy",
        &mut strings,
    )
    .unwrap();

    let keywords: Vec<TokenKind> = tokens
        .iter()
        .filter(|t| t.kind.is_keyword())
        .map(|t| t.kind)
        .collect();
    assert_eq!(
        keywords,
        vec![
            TokenKind::Pipeline,
            TokenKind::Include,
            TokenKind::As,
            TokenKind::Def,
            TokenKind::Struct,
            TokenKind::Let,
            TokenKind::In,
            TokenKind::If,
            TokenKind::Else,
        ]
    );
    assert_eq!(tokens[9].kind, TokenKind::Identifier);
    // キーワードは文字列テーブルに登録されない
    assert_eq!(strings.len(), 1);
}

#[test]
fn test_lexer_identifier_characters() {
    let mut strings = StringTable::new();
    let tokens = lexer::tokenize("_tmp valid? a1_b", &mut strings).unwrap();
    let names: Vec<&str> = tokens
        .iter()
        .filter_map(Token::string_index)
        .map(|i| strings.get_string(i))
        .collect();
    assert_eq!(names, vec!["_tmp", "valid?", "a1_b"]);
}

#[test]
fn test_lexer_comments_and_lines() {
    let mut strings = StringTable::new();
    let source = "; ヘッダーのコメント\npipeline P { ; 行末まで\n  x\n}\n";
    let tokens = lexer::tokenize(source, &mut strings).unwrap();

    let lines: Vec<(TokenKind, usize)> = tokens.iter().map(|t| (t.kind, t.line)).collect();
    assert_eq!(
        lines,
        vec![
            (TokenKind::Pipeline, 2),
            (TokenKind::Identifier, 2),
            (TokenKind::LeftCurly, 2),
            (TokenKind::Identifier, 3),
            (TokenKind::RightCurly, 4),
            (TokenKind::End, 5),
        ]
    );
}

#[test]
fn test_lexer_unknown_character_fails() {
    let mut strings = StringTable::new();
    let err = lexer::tokenize("x\n#", &mut strings).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Lexical);
    assert_eq!(err.line, Some(2));
}

#[test]
fn test_lexer_interns_identifiers() {
    let mut strings = StringTable::new();
    let tokens = lexer::tokenize("a b a", &mut strings).unwrap();
    assert_eq!(tokens[0].string_index(), tokens[2].string_index());
    assert_ne!(tokens[0].string_index(), tokens[1].string_index());
    assert_eq!(strings.len(), 2);
}

#[test]
fn test_lexer_end_is_repeatable() {
    let mut strings = StringTable::new();
    let mut lexer = Lexer::new("x");
    assert_eq!(lexer.next_token(&mut strings).unwrap().kind, TokenKind::Identifier);
    assert!(lexer.next_token(&mut strings).unwrap().is_end());
    assert!(lexer.next_token(&mut strings).unwrap().is_end());
}

#[test]
fn test_string_table_idempotence() {
    let mut strings = StringTable::new();
    let first = strings.push_string("x");
    let second = strings.push_string("x");
    assert_eq!(first, second);
    assert_eq!(strings.get_string(first), "x");
}
