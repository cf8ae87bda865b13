use ember::error::ErrorSink;
use ember::io::CollectStringPrint;
use ember::scanner::Scanner;
use ember::token::TokenKind;

fn scan(source: &str) -> (Vec<ember::token::Token>, ErrorSink) {
    let mut errors = ErrorSink::new();
    let mut out = CollectStringPrint::new();
    let tokens = Scanner::new(source).scan_tokens(&mut errors, &mut out);
    (tokens, errors)
}

#[test]
fn scans_operators_with_optional_equals() {
    let (tokens, errors) = scan("- -= % %= + += / /= * *= ** ! != = == > >= < <=");
    assert!(!errors.had_error);
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Minus,
            TokenKind::MinusEq,
            TokenKind::Modulus,
            TokenKind::ModEq,
            TokenKind::Plus,
            TokenKind::PlusEq,
            TokenKind::Slash,
            TokenKind::SlashEq,
            TokenKind::Star,
            TokenKind::StarEq,
            TokenKind::Power,
            TokenKind::Bang,
            TokenKind::BangEq,
            TokenKind::Eq,
            TokenKind::EqEq,
            TokenKind::Gt,
            TokenKind::GtEq,
            TokenKind::Lt,
            TokenKind::LtEq,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn line_comment_runs_to_newline() {
    let (tokens, errors) = scan("1 // a comment\n2");
    assert!(!errors.had_error);
    assert_eq!(tokens[0].kind, TokenKind::Number);
    assert_eq!(tokens[1].kind, TokenKind::Number);
    assert_eq!(tokens[1].line, 2);
}

#[test]
fn block_comment_tracks_newlines() {
    let (tokens, errors) = scan("1 /* line1\nline2 */ 2");
    assert!(!errors.had_error);
    assert_eq!(tokens[1].line, 2);
}

#[test]
fn unterminated_block_comment_is_scan_error() {
    let (_, errors) = scan("/* never closed");
    assert!(errors.had_error);
}

#[test]
fn unterminated_string_is_scan_error() {
    let (_, errors) = scan("\"never closed");
    assert!(errors.had_error);
}

#[test]
fn string_literal_allows_embedded_newline() {
    let (tokens, errors) = scan("\"a\nb\"");
    assert!(!errors.had_error);
    if let ember::token::Literal::String(s) = &tokens[0].literal {
        assert_eq!(s, "a\nb");
    } else {
        panic!("expected string literal");
    }
}

#[test]
fn lone_ampersand_is_a_scan_error() {
    let (_, errors) = scan("&");
    assert!(errors.had_error);
}

#[test]
fn lone_pipe_is_a_scan_error() {
    let (_, errors) = scan("|");
    assert!(errors.had_error);
}

#[test]
fn keywords_map_to_their_token_kinds() {
    let (tokens, errors) = scan("let var fn fun echo print self this");
    assert!(!errors.had_error);
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            TokenKind::Let,
            TokenKind::Var,
            TokenKind::Fn,
            TokenKind::Fun,
            TokenKind::Echo,
            TokenKind::Print,
            TokenKind::SelfKw,
            TokenKind::This,
            TokenKind::Eof,
        ]
    );
}

#[test]
fn number_requires_digit_after_dot() {
    let (tokens, errors) = scan("1.5");
    assert!(!errors.had_error);
    assert_eq!(tokens[0].kind, TokenKind::Number);
    assert_eq!(tokens.len(), 2); // number + EOF, not split on the dot
}
