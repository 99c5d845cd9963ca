// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! S-expression trees built from the token stream.

use std::path::PathBuf;
use std::sync::Arc;

use crate::error::{ConfigError, ConfigResult, Location};
use crate::lexer::{Lexer, Token, TokenKind};

/// One parsed expression.
#[derive(Debug, Clone, PartialEq)]
pub enum SExpr {
    /// Bare word.
    Word(String),
    /// Quoted string.
    Str(String),
    /// Number.
    Number(f64),
    /// Parenthesized list.
    List(Vec<Node>),
}

/// An expression and the line it starts on.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// The expression.
    pub expr: SExpr,
    /// 1-based line.
    pub line: usize,
}

impl Node {
    /// Head word of a list, if it has one.
    pub fn head_word(&self) -> Option<&str> {
        match &self.expr {
            SExpr::List(items) => match items.first().map(|n| &n.expr) {
                Some(SExpr::Word(w)) => Some(w),
                _ => None,
            },
            _ => None,
        }
    }
}

/// Reads top-level expressions from a lexer, one at a time.
pub struct Reader<'a> {
    lexer: Lexer<'a>,
    file: Arc<PathBuf>,
}

impl<'a> Reader<'a> {
    /// Wraps `lexer`; `file` names the source in errors.
    pub fn new(lexer: Lexer<'a>, file: Arc<PathBuf>) -> Self {
        Self { lexer, file }
    }

    fn error(&self, line: usize, message: &str) -> ConfigError {
        ConfigError::Syntax {
            at: Location {
                file: Arc::clone(&self.file),
                line,
            },
            message: message.to_string(),
        }
    }

    fn list(&mut self, line: usize) -> ConfigResult<Node> {
        let mut items = Vec::new();
        loop {
            match self.lexer.next_token()? {
                Some(Token {
                    kind: TokenKind::Close,
                    ..
                }) => {
                    return Ok(Node {
                        expr: SExpr::List(items),
                        line,
                    })
                }
                Some(token) => items.push(self.from_token(token)?),
                None => return Err(self.error(line, "unbalanced `(`")),
            }
        }
    }

    fn from_token(&mut self, token: Token) -> ConfigResult<Node> {
        let line = token.line;
        let expr = match token.kind {
            TokenKind::Open => return self.list(line),
            TokenKind::Close => return Err(self.error(line, "unexpected `)`")),
            TokenKind::Word(w) => SExpr::Word(w),
            TokenKind::Str(s) => SExpr::Str(s),
            TokenKind::Number(n) => SExpr::Number(n),
        };
        Ok(Node { expr, line })
    }

    /// Next top-level expression, or `None` at end of input.
    ///
    /// # Errors
    /// Lexical errors and unbalanced parentheses.
    pub fn next_expr(&mut self) -> ConfigResult<Option<Node>> {
        match self.lexer.next_token()? {
            Some(token) => self.from_token(token).map(Some),
            None => Ok(None),
        }
    }
}

impl Iterator for Reader<'_> {
    type Item = ConfigResult<Node>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_expr().transpose()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::panic)]
    use std::collections::BTreeMap;

    use super::*;

    fn read(src: &str) -> ConfigResult<Vec<Node>> {
        let vars = BTreeMap::new();
        let file = Arc::new(PathBuf::from("t.cfg"));
        Reader::new(Lexer::new(src, Arc::clone(&file), &vars), file).collect()
    }

    #[test]
    fn nested_lists() {
        let nodes = read("(A (1 2 3) \"s\")\n(B)").unwrap();
        assert_eq!(nodes.len(), 2);
        assert_eq!(nodes[0].head_word(), Some("A"));
        assert_eq!(nodes[1].line, 2);
        let SExpr::List(items) = &nodes[0].expr else {
            panic!("expected list");
        };
        assert!(matches!(&items[1].expr, SExpr::List(v) if v.len() == 3));
    }

    #[test]
    fn unbalanced_parens_are_syntax_errors() {
        assert!(matches!(read("(A (B)"), Err(ConfigError::Syntax { .. })));
        assert!(matches!(read("A)"), Err(ConfigError::Syntax { .. })));
    }
}
