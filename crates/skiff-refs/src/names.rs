//! Reference name validation following git's `check-ref-format` rules.
//!
//! Valid reference names:
//! - Start with `refs/`, or are a one-level pseudo ref such as `HEAD`
//! - Must not contain control characters, whitespace, `~`, `^`, `:`, `?`,
//!   `*`, `[`, `\`
//! - Must not contain `..`, `@{` or `//`
//! - Must not end with `/` or `.`; no component starts with `.` or ends
//!   with `.lock`

use crate::error::{RefError, Result};

/// Namespace every full reference name lives under.
pub const REFS_PREFIX: &str = "refs/";

/// Characters that are forbidden anywhere in a reference name.
const FORBIDDEN_CHARS: &[char] = &[' ', '~', '^', ':', '?', '*', '[', '\\'];

fn invalid(name: &str, reason: impl Into<String>) -> RefError {
    RefError::InvalidName {
        name: name.to_string(),
        reason: reason.into(),
    }
}

/// `HEAD`, `FETCH_HEAD`, `ORIG_HEAD` and friends.
pub fn is_pseudo_ref(name: &str) -> bool {
    !name.is_empty()
        && name.ends_with("HEAD")
        && name.chars().all(|c| c.is_ascii_uppercase() || c == '_')
}

/// Validate a full reference name.
///
/// # Examples
///
/// ```
/// use skiff_refs::names::validate_reference_name;
///
/// assert!(validate_reference_name("refs/heads/main").is_ok());
/// assert!(validate_reference_name("HEAD").is_ok());
/// assert!(validate_reference_name("main").is_err());
/// assert!(validate_reference_name("refs/heads/bad..name").is_err());
/// ```
pub fn validate_reference_name(name: &str) -> Result<()> {
    validate(name, false)
}

/// Validate one side of a refspec: like [`validate_reference_name`], but a
/// single `*` is allowed.
pub fn validate_refspec_pattern(name: &str) -> Result<()> {
    validate(name, true)
}

fn validate(name: &str, allow_glob: bool) -> Result<()> {
    if name.is_empty() {
        return Err(invalid(name, "reference name must not be empty"));
    }
    if is_pseudo_ref(name) {
        return Ok(());
    }
    let Some(rest) = name.strip_prefix(REFS_PREFIX) else {
        return Err(invalid(name, "must start with 'refs/'"));
    };
    if rest.is_empty() {
        return Err(invalid(name, "must name something below 'refs/'"));
    }

    if name.chars().any(|c| c.is_control()) {
        return Err(invalid(name, "contains a control character"));
    }
    let globs = name.matches('*').count();
    if globs > usize::from(allow_glob) {
        return Err(invalid(name, "too many '*' wildcards"));
    }
    for ch in FORBIDDEN_CHARS {
        if *ch == '*' && allow_glob {
            continue;
        }
        if name.contains(*ch) {
            return Err(invalid(name, format!("contains forbidden character: {ch:?}")));
        }
    }
    if name.contains("..") {
        return Err(invalid(name, "must not contain '..'"));
    }
    if name.contains("@{") {
        return Err(invalid(name, "must not contain '@{'"));
    }
    if name.ends_with('/') || name.ends_with('.') {
        return Err(invalid(name, "must not end with '/' or '.'"));
    }
    for component in rest.split('/') {
        if component.is_empty() {
            return Err(invalid(name, "path components must not be empty"));
        }
        if component.starts_with('.') {
            return Err(invalid(
                name,
                format!("component must not start with '.': {component:?}"),
            ));
        }
        if component.ends_with(".lock") {
            return Err(invalid(name, "component must not end with '.lock'"));
        }
    }
    Ok(())
}

/// Validate a remote name. Must be a simple identifier (no slashes).
pub fn validate_remote_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(invalid(name, "remote name must not be empty"));
    }
    if name.contains('/') {
        return Err(invalid(name, "remote name must not contain '/'"));
    }
    for ch in FORBIDDEN_CHARS {
        if name.contains(*ch) {
            return Err(invalid(
                name,
                format!("remote name contains forbidden character: {ch:?}"),
            ));
        }
    }
    Ok(())
}
