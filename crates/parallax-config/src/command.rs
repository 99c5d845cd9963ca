// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Top-level commands.
//!
//! Every top-level list is a command whose head word names both the action
//! and the object type: `NewScreen`, `ScreenProperty`, `ScreenAlias`. The
//! legacy `<Type>Attribute` spelling is accepted as a property command.

use crate::error::{ConfigError, Location};
use crate::sexpr::{Node, SExpr};
use crate::value::Value;

/// What a command does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandKind {
    /// `New<Type> name args…`.
    New {
        /// Type spelling as written.
        type_name: String,
    },
    /// `<Type>Property name property values…`.
    Property {
        /// Type spelling as written.
        type_name: String,
    },
    /// `<Type>Alias alias original`.
    Alias {
        /// Type spelling as written.
        type_name: String,
    },
    /// `Include "file"`.
    Include,
}

/// One command with evaluated arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// Head word as written.
    pub name: String,
    /// Decoded action.
    pub kind: CommandKind,
    /// Arguments after the head word.
    pub args: Vec<Value>,
    /// Where the command starts.
    pub at: Location,
}

impl Command {
    /// Decodes a top-level expression.
    ///
    /// # Errors
    /// [`ConfigError::Command`] when the expression is not a list headed by a
    /// known command word, or an argument fails to evaluate.
    pub fn parse(node: &Node, at: Location) -> Result<Self, ConfigError> {
        let reject = |command: &str, message: String| ConfigError::Command {
            at: at.clone(),
            command: command.to_owned(),
            message,
        };
        let SExpr::List(items) = &node.expr else {
            return Err(reject("?", "expected a command list".into()));
        };
        let Some(name) = node.head_word() else {
            return Err(reject("?", "command must start with a word".into()));
        };
        let kind = decode(name).ok_or_else(|| reject(name, "unknown command".into()))?;
        let args = items[1..]
            .iter()
            .map(Value::eval)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|message| reject(name, message))?;
        Ok(Self {
            name: name.to_owned(),
            kind,
            args,
            at,
        })
    }

    /// A rejection of this command.
    pub fn error(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::Command {
            at: self.at.clone(),
            command: self.name.clone(),
            message: message.into(),
        }
    }

    /// Argument `i`, or an error naming what was expected.
    pub fn arg(&self, i: usize, what: &str) -> Result<&Value, ConfigError> {
        self.args
            .get(i)
            .ok_or_else(|| self.error(format!("missing {what}")))
    }

    /// Name argument `i`.
    pub fn name_arg(&self, i: usize, what: &str) -> Result<&str, ConfigError> {
        self.arg(i, what)?
            .as_name()
            .map_err(|m| self.error(format!("{what}: {m}")))
    }
}

fn decode(word: &str) -> Option<CommandKind> {
    if word == "Include" {
        return Some(CommandKind::Include);
    }
    let typed = |t: &str| (!t.is_empty()).then(|| t.to_owned());
    if let Some(t) = word.strip_prefix("New") {
        return typed(t).map(|type_name| CommandKind::New { type_name });
    }
    if let Some(t) = word
        .strip_suffix("Property")
        .or_else(|| word.strip_suffix("Attribute"))
    {
        return typed(t).map(|type_name| CommandKind::Property { type_name });
    }
    word.strip_suffix("Alias")
        .and_then(typed)
        .map(|type_name| CommandKind::Alias { type_name })
}
