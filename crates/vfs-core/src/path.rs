//! Path parsing and joining
//!
//! Paths are `/`-separated. A path is absolute when its first segment, after
//! at most one leading separator, is a valid volume name (`C:/docs`,
//! `/C:/docs`). Anything else is relative to a current directory.

use crate::error::{FsError, FsResult};
use crate::names::{ItemNameComparer, NameComparer};

pub const SEPARATOR: char = '/';

/// Volumes that may exist under the root, in default-first order
pub const VALID_VOLUME_NAMES: &[&str] = &["C:", "D:", "E:", "F:"];

const RESERVED_CHARS: &[char] = &['/', '\\', '<', '>', ':', '"', '|', '?', '*'];

/// The volume used when a caller supplies no current directory.
pub fn default_volume() -> &'static str {
    VALID_VOLUME_NAMES[0]
}

pub fn is_valid_volume_name(name: &str) -> bool {
    VALID_VOLUME_NAMES
        .iter()
        .any(|volume| ItemNameComparer.equals(volume, name))
}

/// Whether `name` may be used for a directory or a file
pub fn is_valid_item_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && name.trim() == name
        && !name
            .chars()
            .any(|c| c.is_control() || RESERVED_CHARS.contains(&c))
}

pub fn is_absolute_path(path: &str) -> bool {
    let path = path.trim();
    let path = path.strip_prefix(SEPARATOR).unwrap_or(path);
    let first = path.split(SEPARATOR).next().unwrap_or_default();
    is_valid_volume_name(first)
}

/// Splits a path into its segments
///
/// One leading and one trailing separator are tolerated; empty segments and
/// `.`/`..` are rejected.
pub fn split_path(path: &str) -> FsResult<Vec<&str>> {
    let trimmed = path.trim();
    let inner = trimmed.strip_prefix(SEPARATOR).unwrap_or(trimmed);
    let inner = inner.strip_suffix(SEPARATOR).unwrap_or(inner);

    if inner.is_empty() {
        return Err(FsError::invalid_argument(format!("empty path '{path}'")));
    }

    let segments: Vec<&str> = inner.split(SEPARATOR).collect();
    for segment in &segments {
        if segment.is_empty() {
            return Err(FsError::invalid_argument(format!(
                "path '{path}' contains an empty segment"
            )));
        }
        if *segment == "." || *segment == ".." {
            return Err(FsError::invalid_argument(format!(
                "relative segments are not supported in '{path}'"
            )));
        }
    }

    Ok(segments)
}

/// Joins `relative` onto `base` without resolving any segment
///
/// A leading separator on `relative` is dropped, so `/docs` from `C:` is
/// `C:/docs`.
pub fn combine_path(base: &str, relative: &str) -> String {
    let base = base.trim();
    let base = base.strip_suffix(SEPARATOR).unwrap_or(base);
    let relative = relative.trim();
    let relative = relative.strip_prefix(SEPARATOR).unwrap_or(relative);
    format!("{}{}{}", base, SEPARATOR, relative)
}
