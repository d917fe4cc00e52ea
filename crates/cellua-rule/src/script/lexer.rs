//! Tokenizer for rule-script transitions.

use lazy_static::lazy_static;
use regex::Regex;

use super::error::{ScriptError, Span};

/// Token patterns, from most to least specific.
const TOKEN_PATTERNS: &[&str] = &[
    // Line comment.
    r"//[^\r\n]*",
    // Integer literal.
    r"[0-9]+",
    // Identifier or keyword.
    r"[A-Za-z_][A-Za-z_0-9]*",
    // Two-character operators.
    r"==|!=|<=|>=|&&|\|\|",
    // Anything else, classified below.
    r"[^\s]",
];

lazy_static! {
    static ref TOKEN_PATTERN: Regex = Regex::new(&TOKEN_PATTERNS.join("|")).unwrap();
}

/// Classification of a token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum TokenClass<'a> {
    /// Integer literal.
    Int(&'a str),
    /// Identifier.
    Ident(&'a str),
    /// `let`, `if`, `then` or `else`.
    Keyword(&'a str),
    /// Operator or punctuation.
    Punct(&'a str),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Token<'a> {
    pub span: Span,
    pub class: TokenClass<'a>,
}

impl<'a> Token<'a> {
    pub fn text(&self) -> &'a str {
        match self.class {
            TokenClass::Int(s)
            | TokenClass::Ident(s)
            | TokenClass::Keyword(s)
            | TokenClass::Punct(s) => s,
        }
    }
}

const KEYWORDS: &[&str] = &["let", "if", "then", "else"];
const PUNCTUATION: &[&str] = &[
    "==", "!=", "<=", ">=", "&&", "||", "+", "-", "*", "/", "%", "<", ">", "!", "(", ")", "[",
    "]", ",", ";", "=",
];

/// Split `source` into tokens, dropping comments. Spans are offset by
/// `base` so they point into the whole script.
pub(crate) fn tokenize(source: &str, base: usize) -> Result<Vec<Token<'_>>, ScriptError> {
    let mut tokens = Vec::new();
    for m in TOKEN_PATTERN.find_iter(source) {
        let span = Span::new(base + m.start(), base + m.end());
        let text = m.as_str();
        let first = text.chars().next().unwrap_or(' ');
        let class = if text.starts_with("//") {
            continue;
        } else if first.is_ascii_digit() {
            TokenClass::Int(text)
        } else if first.is_ascii_alphabetic() || first == '_' {
            if KEYWORDS.contains(&text) {
                TokenClass::Keyword(text)
            } else {
                TokenClass::Ident(text)
            }
        } else if PUNCTUATION.contains(&text) {
            TokenClass::Punct(text)
        } else {
            return Err(ScriptError::UnknownSymbol {
                span,
                symbol: text.to_string(),
            });
        };
        tokens.push(Token { span, class });
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(src: &str) -> Vec<&str> {
        tokenize(src, 0).unwrap().iter().map(|t| t.text()).collect()
    }

    #[test]
    fn splits_operators_and_drops_comments() {
        assert_eq!(
            texts("let n = live; // neighbors\nn>=2&&n<=3||!state"),
            vec!["let", "n", "=", "live", ";", "n", ">=", "2", "&&", "n", "<=", "3", "||", "!", "state"]
        );
    }

    #[test]
    fn classifies_keywords() {
        let toks = tokenize("if x then 1 else nb[0]", 0).unwrap();
        assert_eq!(toks[0].class, TokenClass::Keyword("if"));
        assert_eq!(toks[1].class, TokenClass::Ident("x"));
        assert_eq!(toks[3].class, TokenClass::Int("1"));
        assert_eq!(toks[6].class, TokenClass::Punct("["));
    }

    #[test]
    fn spans_are_offset() {
        let toks = tokenize("  state", 10).unwrap();
        assert_eq!(toks[0].span, Span::new(12, 17));
    }

    #[test]
    fn unknown_symbols_rejected() {
        let err = tokenize("state $ 1", 0).unwrap_err();
        assert_eq!(
            err,
            ScriptError::UnknownSymbol {
                span: Span::new(6, 7),
                symbol: "$".into()
            }
        );
    }

    #[test]
    fn only_ascii_digits_form_literals() {
        let err = tokenize("1\u{663}", 0).unwrap_err();
        assert_eq!(
            err,
            ScriptError::UnknownSymbol {
                span: Span::new(1, 3),
                symbol: "\u{663}".into()
            }
        );
        assert!(matches!(
            tokenize("x\u{663}", 0),
            Err(ScriptError::UnknownSymbol { .. })
        ));
    }
}
