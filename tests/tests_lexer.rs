//! Lexer Tests - Keywords and Dialects

use matlint::parser::{Dialect, Keyword, TokenKind, tokenize};
use rstest::rstest;

fn kinds(src: &str, dialect: Dialect) -> Vec<TokenKind> {
    tokenize("t.m", src, dialect)
        .unwrap()
        .into_iter()
        .map(|t| t.kind)
        .collect()
}

// ============================================================================
// Keywords
// ============================================================================

#[rstest]
#[case("end", false, Some(Keyword::End))]
#[case("classdef", false, Some(Keyword::Classdef))]
#[case("parfor", false, Some(Keyword::Parfor))]
#[case("endfunction", false, None)]
#[case("endfunction", true, Some(Keyword::EndFunction))]
#[case("end_try_catch", true, Some(Keyword::EndTryCatch))]
#[case("unwind_protect_cleanup", true, Some(Keyword::UnwindProtectCleanup))]
#[case("until", false, None)]
#[case("properties", false, None)]
#[case("arguments", true, None)]
fn test_keyword_lookup(#[case] word: &str, #[case] octave: bool, #[case] expected: Option<Keyword>) {
    assert_eq!(Keyword::lookup(word, octave), expected);
}

#[test]
fn test_octave_words_are_identifiers_in_matlab() {
    let matlab = kinds("endif\n", Dialect::Matlab);
    assert_eq!(matlab, vec![TokenKind::Identifier, TokenKind::Newline]);
    let octave = kinds("endif\n", Dialect::Octave);
    assert_eq!(octave, vec![TokenKind::Keyword(Keyword::EndIf), TokenKind::Newline]);
}

#[test]
fn test_field_named_like_keyword() {
    let tokens = tokenize("t.m", "s.end = 1;\n", Dialect::Matlab).unwrap();
    assert_eq!(tokens[2].kind, TokenKind::Identifier);
    assert_eq!(tokens[2].value, "end");
}

// ============================================================================
// Positions
// ============================================================================

#[test]
fn test_token_locations() {
    let tokens = tokenize("t.m", "x = 1;\n  y = 2;\n", Dialect::Matlab).unwrap();
    let y = tokens.iter().find(|t| t.value == "y").unwrap();
    assert_eq!(y.location.line, 2);
    assert_eq!(y.location.col_start, 2);
    assert!(tokens.iter().all(|t| &*t.location.file == "t.m"));
}

// ============================================================================
// Matrix whitespace
// ============================================================================

#[rstest]
#[case("x = {@(x) x, 2};\n", 0)]
#[case("x = [@(x) x+1];\n", 0)]
#[case("x = {@(a, b) a * b};\n", 0)]
#[case("x = {@() 1 @sin};\n", 1)]
#[case("x = [1 2 3];\n", 2)]
fn test_implicit_commas(#[case] src: &str, #[case] commas: usize) {
    let tokens = tokenize("t.m", src, Dialect::Matlab).unwrap();
    let commas_found = tokens
        .iter()
        .filter(|t| t.kind == TokenKind::Comma && t.anonymous)
        .count();
    assert_eq!(commas_found, commas, "{:?}", src);
}
