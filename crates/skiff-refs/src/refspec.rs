//! Refspecs: `[+]<src>[:<dst>]` mappings between local and remote names.
//!
//! A push refspec with an empty source (`:refs/heads/old`) deletes the
//! destination. Both sides may carry one `*`, which matches any run of
//! characters and is substituted when transforming a name.

use serde::{Deserialize, Serialize};

use crate::error::{RefError, Result};
use crate::names::validate_refspec_pattern;

/// Which way objects and names flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Fetch,
    Push,
}

/// A parsed refspec.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefSpec {
    /// Source side; empty for push deletions.
    pub src: String,
    /// Destination side; empty for fetch specs without one.
    pub dst: String,
    pub force: bool,
    pub direction: Direction,
}

fn invalid(spec: &str, reason: impl Into<String>) -> RefError {
    RefError::InvalidRefspec {
        spec: spec.to_string(),
        reason: reason.into(),
    }
}

impl RefSpec {
    /// Parse refspec text for the given direction.
    ///
    /// Push sources are revision expressions and are not checked here;
    /// resolving them is the caller's business. Fetch sources and both
    /// destinations must be valid reference names or patterns.
    pub fn parse(text: &str, direction: Direction) -> Result<Self> {
        let (force, rest) = match text.strip_prefix('+') {
            Some(stripped) => (true, stripped),
            None => (false, text),
        };
        if rest.is_empty() {
            return Err(invalid(text, "empty refspec"));
        }

        let (src, dst) = match rest.rfind(':') {
            Some(pos) => (&rest[..pos], &rest[pos + 1..]),
            None => match direction {
                Direction::Push => (rest, rest),
                Direction::Fetch => (rest, ""),
            },
        };
        let dst = if dst.is_empty() && direction == Direction::Push {
            src
        } else {
            dst
        };

        if direction == Direction::Push && dst.is_empty() {
            return Err(invalid(text, "push refspec needs a destination"));
        }
        if direction == Direction::Fetch && src.is_empty() {
            return Err(invalid(text, "fetch refspec needs a source"));
        }
        if src.contains(':') {
            return Err(invalid(text, "more than one ':'"));
        }

        let src_glob = src.contains('*');
        let dst_glob = dst.contains('*');
        if !dst.is_empty() && src_glob != dst_glob {
            return Err(invalid(text, "wildcard must appear on both sides"));
        }

        if direction == Direction::Fetch || src_glob {
            validate_refspec_pattern(src).map_err(|e| invalid(text, e.to_string()))?;
        }
        if !dst.is_empty() {
            validate_refspec_pattern(dst).map_err(|e| invalid(text, e.to_string()))?;
        }

        Ok(Self {
            src: src.to_string(),
            dst: dst.to_string(),
            force,
            direction,
        })
    }

    /// A non-forced push mapping; the names are not validated.
    pub fn push(src: impl Into<String>, dst: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
            force: false,
            direction: Direction::Push,
        }
    }

    /// A forced fetch mapping; the names are not validated.
    pub fn fetch(src: impl Into<String>, dst: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
            force: true,
            direction: Direction::Fetch,
        }
    }

    pub fn is_glob(&self) -> bool {
        self.src.contains('*')
    }

    /// A push refspec with an empty source deletes its destination.
    pub fn is_delete(&self) -> bool {
        self.direction == Direction::Push && self.src.is_empty()
    }

    /// Does `name` match the source side?
    pub fn src_matches(&self, name: &str) -> bool {
        glob_capture(&self.src, name).is_some()
    }

    /// Does `name` match the destination side?
    pub fn dst_matches(&self, name: &str) -> bool {
        glob_capture(&self.dst, name).is_some()
    }

    /// Map a name matching the source side onto the destination side.
    ///
    /// `refs/heads/*:refs/remotes/origin/*` transforms `refs/heads/main`
    /// into `refs/remotes/origin/main`. Returns `None` if `name` does not
    /// match, or there is no destination.
    pub fn transform(&self, name: &str) -> Option<String> {
        if self.dst.is_empty() {
            return None;
        }
        let captured = glob_capture(&self.src, name)?;
        Some(self.dst.replacen('*', captured, 1))
    }

    /// Map a name matching the destination side back onto the source side.
    pub fn reverse_transform(&self, name: &str) -> Option<String> {
        if self.src.is_empty() {
            return None;
        }
        let captured = glob_capture(&self.dst, name)?;
        Some(self.src.replacen('*', captured, 1))
    }
}

impl std::fmt::Display for RefSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.force {
            write!(f, "+")?;
        }
        if self.dst.is_empty() {
            write!(f, "{}", self.src)
        } else {
            write!(f, "{}:{}", self.src, self.dst)
        }
    }
}

/// Match `name` against `pattern`, returning what `*` matched (or `""`
/// for an exact, glob-free match).
fn glob_capture<'a>(pattern: &str, name: &'a str) -> Option<&'a str> {
    match pattern.split_once('*') {
        None => (pattern == name && !pattern.is_empty()).then_some(""),
        Some((prefix, suffix)) => {
            if name.len() < prefix.len() + suffix.len() {
                return None;
            }
            let middle = name.strip_prefix(prefix)?.strip_suffix(suffix)?;
            Some(middle)
        }
    }
}
