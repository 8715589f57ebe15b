//! Property paths — `/`-separated, with `..` for the parent.
//!
//! Keys are restricted to `[A-Za-z0-9_$]`. Absolute paths start with the
//! separator and resolve from the tree root; relative paths resolve from
//! the node they are handed to.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::{Error, Result};

pub const SEPARATOR: char = '/';
pub const PARENT: &str = "..";

/// One step of a path: descend into a named child, or go to the parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Segment {
    Key(String),
    Parent,
}

/// A parsed property path.
///
/// `""` parses to the empty relative path (the node itself); `"/"` to the
/// empty absolute path (the root).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PropertyPath {
    absolute: bool,
    segments: SmallVec<[Segment; 8]>,
}

/// Whether `key` is a legal child name: non-empty, `[A-Za-z0-9_$]` only.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

impl PropertyPath {
    pub fn parse(raw: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidPath {
            path: raw.to_string(),
            reason: reason.to_string(),
        };

        let (absolute, rest) = match raw.strip_prefix(SEPARATOR) {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let mut segments = SmallVec::new();
        if !rest.is_empty() {
            for part in rest.split(SEPARATOR) {
                if part == PARENT {
                    segments.push(Segment::Parent);
                } else if is_valid_key(part) {
                    segments.push(Segment::Key(part.to_string()));
                } else if part.is_empty() {
                    return Err(invalid("empty segment"));
                } else {
                    return Err(invalid("key contains characters outside [A-Za-z0-9_$]"));
                }
            }
        }

        Ok(Self { absolute, segments })
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Split into (everything but the last segment, last segment), for
    /// write resolution. The final segment of a write path must be a key:
    /// you cannot assign a value to `..`.
    pub fn split_for_write(&self) -> Result<(PropertyPath, &str)> {
        match self.segments.last() {
            Some(Segment::Key(key)) => {
                let prefix = PropertyPath {
                    absolute: self.absolute,
                    segments: self.segments[..self.segments.len() - 1].iter().cloned().collect(),
                };
                Ok((prefix, key))
            }
            Some(Segment::Parent) => Err(Error::InvalidPath {
                path: self.to_string(),
                reason: "write path must end in a key, not `..`".to_string(),
            }),
            None => Err(Error::InvalidPath {
                path: self.to_string(),
                reason: "write path has no key segment".to_string(),
            }),
        }
    }
}

impl FromStr for PropertyPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        PropertyPath::parse(s)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.absolute {
            write!(f, "{SEPARATOR}")?;
        }
        for (i, seg) in self.segments.iter().enumerate() {
            if i > 0 {
                write!(f, "{SEPARATOR}")?;
            }
            match seg {
                Segment::Key(k) => write!(f, "{k}")?,
                Segment::Parent => write!(f, "{PARENT}")?,
            }
        }
        Ok(())
    }
}
