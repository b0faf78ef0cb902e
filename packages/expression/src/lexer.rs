//! Lexer for binding expressions using logos

use crate::error::{CompileError, CompileResult};
use logos::Logos;
use std::ops::Range;

/// Token types for the expression language
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token<'src> {
    // Keywords
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
    #[token("undefined")]
    Undefined,
    #[token("typeof")]
    Typeof,

    #[regex(r"[a-zA-Z_$][a-zA-Z0-9_$]*", |lex| lex.slice())]
    Ident(&'src str),

    // Literals (quotes stripped, escapes resolved by the parser)
    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        &s[1..s.len()-1]
    })]
    #[regex(r"'([^'\\]|\\.)*'", |lex| {
        let s = lex.slice();
        &s[1..s.len()-1]
    })]
    String(&'src str),

    #[regex(r"[0-9]+(\.[0-9]*)?([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    Number(&'src str),

    // Operators
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("==")]
    EqEq,
    #[token("===")]
    EqEqEq,
    #[token("!=")]
    NotEq,
    #[token("!==")]
    NotEqEq,
    #[token("<")]
    Lt,
    #[token("<=")]
    Lte,
    #[token(">")]
    Gt,
    #[token(">=")]
    Gte,
    #[token("&&")]
    And,
    #[token("||")]
    Or,
    #[token("??")]
    Coalesce,
    #[token("!")]
    Bang,
    #[token("?")]
    Question,
    #[token("?.")]
    OptionalDot,

    // Punctuation
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token(";")]
    Semi,
    #[token(".")]
    Dot,
}

pub type SpannedToken<'src> = (Token<'src>, Range<usize>);

/// Lex a whole expression, failing on the first unrecognised character.
pub fn tokenize(source: &str) -> CompileResult<Vec<SpannedToken<'_>>> {
    Token::lexer(source)
        .spanned()
        .map(|(result, span)| match result {
            Ok(token) => Ok((token, span)),
            Err(()) => Err(CompileError::lexer_error(span.start)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lex_member_call() {
        let tokens = tokenize("this.save(count + 1)").unwrap();
        let kinds: Vec<_> = tokens.into_iter().map(|(t, _)| t).collect();
        assert_eq!(
            kinds,
            vec![
                Token::Ident("this"),
                Token::Dot,
                Token::Ident("save"),
                Token::LParen,
                Token::Ident("count"),
                Token::Plus,
                Token::Number("1"),
                Token::RParen,
            ]
        );
    }

    #[test]
    fn test_lex_strings_both_quotes() {
        let tokens = tokenize(r#""double" 'single'"#).unwrap();
        assert_eq!(tokens[0].0, Token::String("double"));
        assert_eq!(tokens[1].0, Token::String("single"));
    }

    #[test]
    fn test_lex_longest_operator() {
        let tokens = tokenize("a === b ?? c?.d").unwrap();
        assert_eq!(tokens[1].0, Token::EqEqEq);
        assert_eq!(tokens[3].0, Token::Coalesce);
        assert_eq!(tokens[5].0, Token::OptionalDot);
    }

    #[test]
    fn test_lex_keyword_prefix_is_ident() {
        let tokens = tokenize("trueish").unwrap();
        assert_eq!(tokens[0].0, Token::Ident("trueish"));
    }

    #[test]
    fn test_lex_error_position() {
        let err = tokenize("a # b").unwrap_err();
        assert_eq!(err, CompileError::LexerError { pos: 2 });
    }
}
