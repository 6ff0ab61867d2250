//! Shard path validation shared by every backend.

use std::path::{Component, Path};

use crate::error::StoreError;

/// Check that `path` is a non-empty relative path made only of normal
/// segments.
///
/// Absolute paths, `..` and `.` segments are rejected so a manifest can
/// never address a file outside a store's root.
pub fn validate_path(path: &str) -> Result<(), StoreError> {
    let reject = |reason| StoreError::InvalidPath {
        path: path.to_string(),
        reason,
    };

    if path.is_empty() {
        return Err(reject("empty path"));
    }
    if path.ends_with('/') {
        return Err(reject("trailing separator"));
    }
    for component in Path::new(path).components() {
        match component {
            Component::Normal(_) => {}
            Component::ParentDir => return Err(reject("parent directory segment")),
            Component::CurDir => return Err(reject("current directory segment")),
            Component::RootDir | Component::Prefix(_) => {
                return Err(reject("absolute path"));
            }
        }
    }
    Ok(())
}
