//! Attachment extraction and injection.
//!
//! [`extract`] separates a [`Value`] into a serializable skeleton plus an
//! ordered list of `(path, attachment)` pairs; [`inject`] reverses the
//! operation. Both are pure transforms with no I/O.
//!
//! Invariant: for every value `v`,
//! `inject(extract(&v).skeleton, extract(&v).attachments) == v`.
//!
//! # Example
//!
//! ```
//! use seam_rpc::codec::{extract, inject};
//! use seam_rpc::{Attachment, Value};
//!
//! let value = Value::Array(vec![
//!     Value::from("john"),
//!     Value::from(Attachment::new(vec![0u8; 10])),
//! ]);
//!
//! let extracted = extract(&value);
//! assert_eq!(extracted.attachments.len(), 1);
//!
//! let restored = inject(extracted.skeleton, extracted.attachments).unwrap();
//! assert_eq!(restored, value);
//! ```

use crate::error::{Result, SeamError};
use crate::value::{display_path, Attachment, Path, PathSegment, Value};

/// Output of [`extract`]: a skeleton safe to serialize as plain JSON and
/// the attachments that were cut out of it, in encounter order.
#[derive(Debug, Clone, PartialEq)]
pub struct Extracted {
    /// The input value with every attachment replaced by `Null`.
    pub skeleton: Value,
    /// `(path, attachment)` pairs in depth-first encounter order.
    pub attachments: Vec<(Path, Attachment)>,
}

/// Separate `value` into a skeleton and its attachments.
///
/// Traversal is depth-first: sequences by ascending index, maps in stored
/// key order. Attachments are leaves by construction, so no two recorded
/// paths overlap.
pub fn extract(value: &Value) -> Extracted {
    let mut attachments = Vec::new();
    let mut path = Path::new();
    let skeleton = walk(value, &mut path, &mut attachments);
    Extracted {
        skeleton,
        attachments,
    }
}

fn walk(value: &Value, path: &mut Path, out: &mut Vec<(Path, Attachment)>) -> Value {
    match value {
        Value::Attachment(att) => {
            out.push((path.clone(), att.clone()));
            Value::Null
        }
        Value::Array(items) => Value::Array(
            items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    path.push(PathSegment::Index(index));
                    let child = walk(item, path, out);
                    path.pop();
                    child
                })
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| {
                    path.push(PathSegment::Key(key.clone()));
                    let child = walk(item, path, out);
                    path.pop();
                    (key.clone(), child)
                })
                .collect(),
        ),
        scalar => scalar.clone(),
    }
}

/// Re-materialize attachments into a skeleton produced by a matching
/// [`extract`].
///
/// Entries may be applied in any order: attachment paths are disjoint and
/// never prefixes of one another. An empty path replaces the root.
///
/// # Errors
///
/// [`SeamError::MalformedPath`] if a segment does not resolve. This is a
/// skeleton/attachment-list mismatch and cannot happen for well-formed
/// wire data.
pub fn inject(skeleton: Value, attachments: Vec<(Path, Attachment)>) -> Result<Value> {
    let mut root = skeleton;

    for (path, attachment) in attachments {
        let Some((last, parents)) = path.split_last() else {
            root = Value::Attachment(attachment);
            continue;
        };

        let mut slot = &mut root;
        for segment in parents {
            slot = descend(slot, segment).ok_or_else(|| malformed(&path))?;
        }
        let target = descend(slot, last).ok_or_else(|| malformed(&path))?;
        *target = Value::Attachment(attachment);
    }

    Ok(root)
}

fn descend<'a>(value: &'a mut Value, segment: &PathSegment) -> Option<&'a mut Value> {
    match (value, segment) {
        (Value::Array(items), PathSegment::Index(index)) => items.get_mut(*index),
        (Value::Object(map), PathSegment::Key(key)) => map.get_mut(key),
        _ => None,
    }
}

fn malformed(path: &[PathSegment]) -> SeamError {
    SeamError::MalformedPath(display_path(path))
}
