//! Mutation commands: a path into the resume document plus one of three operations.
//!
//! Commands are data, never code. The model's answer is deserialized through
//! `WireCommand` and any fragment that does not map onto `Operation` fails the parse.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One step of a path: a field/map key or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathSegment {
    Index(usize),
    Key(String),
}

/// The closed set of edit operations.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    /// Replace the value at the path (or create a key in an open map).
    Set(Value),
    /// Push onto the list at the path. A trailing index on the path is ignored.
    Append(Value),
    /// Remove the element at `index` from the list at the path.
    RemoveAt(usize),
}

/// A single validated edit against a `ResumeDocument`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "WireCommand", into = "WireCommand")]
pub struct MutationCommand {
    pub path: Vec<PathSegment>,
    pub operation: Operation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireOp {
    Set,
    Append,
    RemoveAt,
}

/// JSON form of a command as the model writes it:
/// `{"op": "set", "path": ["overview", "name"], "value": "Ada"}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WireCommand {
    pub op: WireOp,
    pub path: Vec<PathSegment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandSyntaxError {
    #[error("path must not be empty")]
    EmptyPath,

    #[error("path must start with a field name")]
    PathStartsWithIndex,

    #[error("'{0}' requires a non-null value")]
    MissingValue(&'static str),

    #[error("'{0}' does not take an index")]
    UnexpectedIndex(&'static str),

    #[error("'remove_at' requires an index")]
    MissingIndex,

    #[error("'remove_at' does not take a value")]
    UnexpectedValue,
}

impl WireOp {
    fn as_str(self) -> &'static str {
        match self {
            WireOp::Set => "set",
            WireOp::Append => "append",
            WireOp::RemoveAt => "remove_at",
        }
    }
}

impl TryFrom<WireCommand> for MutationCommand {
    type Error = CommandSyntaxError;

    fn try_from(wire: WireCommand) -> Result<Self, Self::Error> {
        match wire.path.first() {
            None => return Err(CommandSyntaxError::EmptyPath),
            Some(PathSegment::Index(_)) => return Err(CommandSyntaxError::PathStartsWithIndex),
            Some(PathSegment::Key(_)) => {}
        }

        let operation = match wire.op {
            WireOp::Set | WireOp::Append => {
                if wire.index.is_some() {
                    return Err(CommandSyntaxError::UnexpectedIndex(wire.op.as_str()));
                }
                let value = wire
                    .value
                    .ok_or(CommandSyntaxError::MissingValue(wire.op.as_str()))?;
                if wire.op == WireOp::Set {
                    Operation::Set(value)
                } else {
                    Operation::Append(value)
                }
            }
            WireOp::RemoveAt => {
                if wire.value.is_some() {
                    return Err(CommandSyntaxError::UnexpectedValue);
                }
                Operation::RemoveAt(wire.index.ok_or(CommandSyntaxError::MissingIndex)?)
            }
        };

        Ok(MutationCommand {
            path: wire.path,
            operation,
        })
    }
}

impl From<MutationCommand> for WireCommand {
    fn from(command: MutationCommand) -> Self {
        let (op, value, index) = match command.operation {
            Operation::Set(v) => (WireOp::Set, Some(v), None),
            Operation::Append(v) => (WireOp::Append, Some(v), None),
            Operation::RemoveAt(i) => (WireOp::RemoveAt, None, Some(i)),
        };
        WireCommand {
            op,
            path: command.path,
            value,
            index,
        }
    }
}

/// Renders a path as `projects[1].description[0]`.
pub fn display_path(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in path {
        match segment {
            PathSegment::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            PathSegment::Index(i) => {
                out.push_str(&format!("[{i}]"));
            }
        }
    }
    out
}

impl fmt::Display for MutationCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let path = display_path(&self.path);
        match &self.operation {
            Operation::Set(_) => write!(f, "set {path}"),
            Operation::Append(_) => write!(f, "append {path}"),
            Operation::RemoveAt(i) => write!(f, "remove_at {path}[{i}]"),
        }
    }
}
