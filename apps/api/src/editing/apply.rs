//! Applies a batch of mutation commands to a working copy of a resume document.
//!
//! Every command is resolved against both the JSON form of the document and the
//! static schema. A command that does not resolve, or whose value does not fit the
//! shape at its target, is skipped and reported; the rest of the batch still runs.
//! Because each accepted change conforms to the schema, the document can never end
//! up with a list where a string belongs or the other way round.

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::editing::command::{display_path, MutationCommand, Operation, PathSegment};
use crate::editing::schema::{Shape, RESUME_SHAPE};
use crate::models::resume::ResumeDocument;

/// Why a single command was skipped.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ApplyError {
    #[error("path '{path}' does not resolve: {reason}")]
    PathResolution { path: String, reason: String },

    #[error("type mismatch at '{path}': expected {expected}, got {found}")]
    TypeMismatch {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
}

/// A command that was skipped, with its position in the batch.
#[derive(Debug, Clone, Serialize)]
pub struct CommandFailure {
    pub index: usize,
    pub command: MutationCommand,
    pub reason: String,
}

/// Outcome of applying a batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplyReport {
    /// Number of commands that changed the document.
    pub applied: usize,
    pub failures: Vec<CommandFailure>,
}

/// Applies `commands` in order, mutating `doc` in place.
///
/// The caller owns `doc` as a working copy: on return it holds every command that
/// applied cleanly. An empty batch leaves the document untouched.
pub fn apply_commands(doc: &mut ResumeDocument, commands: &[MutationCommand]) -> ApplyReport {
    let mut report = ApplyReport::default();
    if commands.is_empty() {
        return report;
    }

    let mut working = match serde_json::to_value(&*doc) {
        Ok(value) => value,
        Err(e) => {
            error!("Failed to serialize resume for editing: {e}");
            return reject_all(commands, "resume could not be prepared for editing");
        }
    };

    for (index, command) in commands.iter().enumerate() {
        match apply_one(&mut working, command) {
            Ok(()) => {
                debug!("Applied command {}: {}", index, command);
                report.applied += 1;
            }
            Err(e) => {
                warn!("Skipping command {} ({}): {}", index, command, e);
                report.failures.push(CommandFailure {
                    index,
                    command: command.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if report.applied > 0 {
        match serde_json::from_value::<ResumeDocument>(working) {
            Ok(updated) => *doc = updated,
            Err(e) => {
                error!("Edited resume failed validation, discarding batch: {e}");
                return reject_all(commands, "edited resume failed validation");
            }
        }
    }

    info!(
        "Applied {}/{} mutation commands",
        report.applied,
        commands.len()
    );
    report
}

fn reject_all(commands: &[MutationCommand], reason: &str) -> ApplyReport {
    ApplyReport {
        applied: 0,
        failures: commands
            .iter()
            .enumerate()
            .map(|(index, command)| CommandFailure {
                index,
                command: command.clone(),
                reason: reason.to_string(),
            })
            .collect(),
    }
}

fn apply_one(root: &mut Value, command: &MutationCommand) -> Result<(), ApplyError> {
    let path = &command.path;
    match &command.operation {
        Operation::Set(value) => {
            let Some((last, parent_path)) = path.split_last() else {
                return Err(unresolved(path, "empty path"));
            };
            let (container, shape) = resolve(root, &RESUME_SHAPE, parent_path)?;
            let found = value_kind(container);
            match last {
                PathSegment::Key(key) => {
                    let child_shape = shape
                        .field(key)
                        .ok_or_else(|| unresolved(path, "no such field"))?;
                    let object = container
                        .as_object_mut()
                        .ok_or_else(|| mismatch(parent_path, "record", found))?;
                    if !object.contains_key(key.as_str()) && !shape.is_open_map() {
                        return Err(unresolved(path, "no such field"));
                    }
                    let value = conformed(child_shape, value, path)?;
                    object.insert(key.clone(), value);
                }
                PathSegment::Index(i) => {
                    let element = shape
                        .element()
                        .ok_or_else(|| mismatch(parent_path, shape.kind(), "list index"))?;
                    let items = container
                        .as_array_mut()
                        .ok_or_else(|| mismatch(parent_path, "list", found))?;
                    let len = items.len();
                    let slot = items
                        .get_mut(*i)
                        .ok_or_else(|| unresolved(path, &format!("index {i} out of bounds (len {len})")))?;
                    *slot = conformed(element, value, path)?;
                }
            }
        }
        Operation::Append(value) => {
            let list_path = match path.last() {
                Some(PathSegment::Index(_)) => &path[..path.len() - 1],
                _ => &path[..],
            };
            let (container, shape) = resolve(root, &RESUME_SHAPE, list_path)?;
            let element = shape
                .element()
                .ok_or_else(|| mismatch(list_path, "list", shape.kind()))?;
            let value = conformed(element, value, path)?;
            container
                .as_array_mut()
                .ok_or_else(|| mismatch(list_path, "list", "non-list value"))?
                .push(value);
        }
        Operation::RemoveAt(index) => {
            let (container, shape) = resolve(root, &RESUME_SHAPE, path)?;
            if shape.element().is_none() {
                return Err(mismatch(path, "list", shape.kind()));
            }
            let items = container
                .as_array_mut()
                .ok_or_else(|| mismatch(path, "list", "non-list value"))?;
            if *index >= items.len() {
                return Err(unresolved(
                    path,
                    &format!("index {index} out of bounds (len {})", items.len()),
                ));
            }
            items.remove(*index);
        }
    }
    Ok(())
}

/// Walks `path` from `root`, returning the node it names and that node's shape.
fn resolve<'v>(
    root: &'v mut Value,
    root_shape: &'static Shape,
    path: &[PathSegment],
) -> Result<(&'v mut Value, &'static Shape), ApplyError> {
    let mut node = root;
    let mut shape = root_shape;

    for (depth, segment) in path.iter().enumerate() {
        let walked = &path[..=depth];
        match segment {
            PathSegment::Key(key) => {
                let child_shape = shape
                    .field(key)
                    .ok_or_else(|| unresolved(walked, "no such field"))?;
                node = node
                    .as_object_mut()
                    .and_then(|object| object.get_mut(key.as_str()))
                    .ok_or_else(|| unresolved(walked, "no such key"))?;
                shape = child_shape;
            }
            PathSegment::Index(i) => {
                let element = shape
                    .element()
                    .ok_or_else(|| mismatch(&path[..depth], shape.kind(), "list index"))?;
                node = node
                    .as_array_mut()
                    .and_then(|items| items.get_mut(*i))
                    .ok_or_else(|| unresolved(walked, &format!("index {i} out of bounds")))?;
                shape = element;
            }
        }
    }

    Ok((node, shape))
}

/// Checks `value` against `shape` and returns a copy with record defaults filled in.
fn conformed(shape: &Shape, value: &Value, path: &[PathSegment]) -> Result<Value, ApplyError> {
    if !shape.conforms(value) {
        return Err(mismatch(path, shape.kind(), value_kind(value)));
    }
    let mut value = value.clone();
    shape.fill_defaults(&mut value);
    Ok(value)
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "text",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

fn unresolved(path: &[PathSegment], reason: &str) -> ApplyError {
    ApplyError::PathResolution {
        path: display_path(path),
        reason: reason.to_string(),
    }
}

fn mismatch(path: &[PathSegment], expected: &'static str, found: &'static str) -> ApplyError {
    ApplyError::TypeMismatch {
        path: display_path(path),
        expected,
        found,
    }
}
