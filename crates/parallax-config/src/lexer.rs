// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Streaming tokenizer.
//!
//! Tokens are parentheses, quoted strings, numbers and bare words. `//` and
//! `/* */` comments are skipped. `${NAME}` inside a word or string is
//! replaced by the variable's value; the replacement is taken literally and
//! never scanned again.

use std::collections::BTreeMap;
use std::iter::Peekable;
use std::path::PathBuf;
use std::str::Chars;
use std::sync::Arc;

use crate::error::{ConfigError, ConfigResult, Location};

/// Token payload.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `(`
    Open,
    /// `)`
    Close,
    /// Bare word.
    Word(String),
    /// Quoted string, escapes resolved.
    Str(String),
    /// Numeric literal.
    Number(f64),
}

/// A token and the line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    /// Payload.
    pub kind: TokenKind,
    /// 1-based line.
    pub line: usize,
}

/// Tokenizer over one source text.
pub struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
    file: Arc<PathBuf>,
    vars: &'a BTreeMap<String, String>,
}

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '(' | ')' | '"')
}

fn looks_numeric(text: &str) -> bool {
    text.starts_with(|c: char| c.is_ascii_digit() || matches!(c, '+' | '-' | '.'))
        && text.contains(|c: char| c.is_ascii_digit())
}

impl<'a> Lexer<'a> {
    /// Tokenizer for `source`, reporting errors against `file`.
    pub fn new(source: &'a str, file: Arc<PathBuf>, vars: &'a BTreeMap<String, String>) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            file,
            vars,
        }
    }

    fn error(&self, line: usize, message: impl Into<String>) -> ConfigError {
        ConfigError::Syntax {
            at: Location {
                file: Arc::clone(&self.file),
                line,
            },
            message: message.into(),
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) -> ConfigResult<()> {
        loop {
            match self.chars.peek().copied() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut ahead = self.chars.clone();
                    ahead.next();
                    match ahead.next() {
                        Some('/') => {
                            while let Some(c) = self.bump() {
                                if c == '\n' {
                                    break;
                                }
                            }
                        }
                        Some('*') => {
                            let start = self.line;
                            self.bump();
                            self.bump();
                            let mut prev = '\0';
                            loop {
                                match self.bump() {
                                    Some('/') if prev == '*' => break,
                                    Some(c) => prev = c,
                                    None => return Err(self.error(start, "unterminated comment")),
                                }
                            }
                        }
                        _ => return Ok(()),
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    /// Reads `NAME}` after a `${` and returns the variable's value.
    fn substitute(&mut self, line: usize) -> ConfigResult<String> {
        let mut name = String::new();
        loop {
            match self.bump() {
                Some('}') => break,
                Some(c) if c != '\n' => name.push(c),
                _ => return Err(self.error(line, "unterminated `${`")),
            }
        }
        self.vars
            .get(&name)
            .cloned()
            .ok_or_else(|| self.error(line, format!("undefined variable `{name}`")))
    }

    fn string(&mut self, line: usize) -> ConfigResult<TokenKind> {
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(TokenKind::Str(text)),
                Some('\\') => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some(c) => text.push(c),
                    None => break,
                },
                Some('$') if self.chars.peek() == Some(&'{') => {
                    self.bump();
                    text.push_str(&self.substitute(line)?);
                }
                Some(c) => text.push(c),
                None => break,
            }
        }
        Err(self.error(line, "unterminated string"))
    }

    fn word(&mut self, line: usize) -> ConfigResult<TokenKind> {
        let mut text = String::new();
        while let Some(&c) = self.chars.peek() {
            if is_delimiter(c) {
                break;
            }
            self.bump();
            if c == '$' && self.chars.peek() == Some(&'{') {
                self.bump();
                text.push_str(&self.substitute(line)?);
            } else {
                text.push(c);
            }
        }
        if looks_numeric(&text) {
            if let Ok(n) = text.parse::<f64>() {
                return Ok(TokenKind::Number(n));
            }
        }
        Ok(TokenKind::Word(text))
    }

    /// Next token, or `None` at end of input.
    ///
    /// # Errors
    /// [`ConfigError::Syntax`] for unterminated strings or comments and
    /// undefined variables.
    pub fn next_token(&mut self) -> ConfigResult<Option<Token>> {
        self.skip_trivia()?;
        let line = self.line;
        let Some(&c) = self.chars.peek() else {
            return Ok(None);
        };
        let kind = match c {
            '(' => {
                self.bump();
                TokenKind::Open
            }
            ')' => {
                self.bump();
                TokenKind::Close
            }
            '"' => {
                self.bump();
                self.string(line)?
            }
            _ => self.word(line)?,
        };
        Ok(Some(Token { kind, line }))
    }
}

impl Iterator for Lexer<'_> {
    type Item = ConfigResult<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_token().transpose()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn lex(src: &str, vars: &BTreeMap<String, String>) -> ConfigResult<Vec<TokenKind>> {
        Lexer::new(src, Arc::new(PathBuf::from("test.cfg")), vars)
            .map(|t| t.map(|t| t.kind))
            .collect()
    }

    #[test]
    fn tokens_and_lines() {
        let vars = BTreeMap::new();
        let src = "(NewScreen s0 0.0)\n// comment\n/* block\n */ (Foo \"a \\\"b\\\"\" -1e-3)";
        let tokens: Vec<Token> = Lexer::new(src, Arc::new(PathBuf::from("t")), &vars)
            .collect::<ConfigResult<_>>()
            .unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Open);
        assert_eq!(tokens[1].kind, TokenKind::Word("NewScreen".into()));
        assert_eq!(tokens[3].kind, TokenKind::Number(0.0));
        assert_eq!(tokens[5].line, 4);
        assert_eq!(tokens[7].kind, TokenKind::Str("a \"b\"".into()));
        assert_eq!(tokens[8].kind, TokenKind::Number(-1e-3));
    }

    #[test]
    fn substitution_is_one_level() {
        let mut vars = BTreeMap::new();
        vars.insert("A".to_string(), "${B}".to_string());
        vars.insert("B".to_string(), "nope".to_string());
        vars.insert("W".to_string(), "0.5".to_string());
        let tokens = lex("x${A} ${W} \"${W}m\"", &vars).unwrap();
        assert_eq!(
            tokens,
            vec![
                TokenKind::Word("x${B}".into()),
                TokenKind::Number(0.5),
                TokenKind::Str("0.5m".into()),
            ]
        );
    }

    #[test]
    fn errors_carry_lines() {
        let vars = BTreeMap::new();
        let err = lex("\n\n(Foo ${MISSING})", &vars).unwrap_err();
        assert_eq!(err.location().unwrap().line, 3);
        assert!(lex("\"open", &vars).is_err());
        assert!(lex("/* open", &vars).is_err());
    }

    #[test]
    fn words_that_are_not_numbers_stay_words() {
        let vars = BTreeMap::new();
        let tokens = lex("Infinite - -inf +x", &vars).unwrap();
        assert_eq!(
            tokens,
            vec![
                TokenKind::Word("Infinite".into()),
                TokenKind::Word("-".into()),
                TokenKind::Word("-inf".into()),
                TokenKind::Word("+x".into()),
            ]
        );
    }
}
