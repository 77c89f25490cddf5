//! Normalized path handling for cross-platform compatibility

use std::path::{Path, PathBuf};

/// A path normalized to use forward slashes internally.
///
/// Write-sets and import filters compare paths as strings, so every path
/// that takes part in a comparison goes through this type first. Conversion
/// to the platform-native form happens only at I/O boundaries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NormalizedPath {
    /// Internal representation always uses forward slashes
    inner: String,
}

impl NormalizedPath {
    /// Create a new NormalizedPath from any path-like input.
    ///
    /// Converts backslashes to forward slashes and drops a trailing slash
    /// (except for the filesystem root).
    pub fn new(path: impl AsRef<Path>) -> Self {
        let path_str = path.as_ref().to_string_lossy();
        let mut normalized = path_str.replace('\\', "/");
        while normalized.len() > 1 && normalized.ends_with('/') {
            normalized.pop();
        }
        Self { inner: normalized }
    }

    /// Resolve `path` to an absolute path without UNC prefixes.
    ///
    /// Falls back to the path as given when it does not exist yet.
    pub fn canonical(path: impl AsRef<Path>) -> Self {
        match dunce::canonicalize(path.as_ref()) {
            Ok(resolved) => Self::new(resolved),
            Err(_) => Self::new(path),
        }
    }

    /// Get the internal normalized string representation.
    pub fn as_str(&self) -> &str {
        &self.inner
    }

    /// Convert to a platform-native PathBuf for I/O operations.
    pub fn to_native(&self) -> PathBuf {
        PathBuf::from(&self.inner)
    }

    /// Join this path with a segment.
    pub fn join(&self, segment: &str) -> Self {
        let segment_normalized = segment.replace('\\', "/");
        let segment_normalized = segment_normalized.trim_start_matches('/');
        let joined = if self.inner.is_empty() {
            segment_normalized.to_string()
        } else if self.inner.ends_with('/') {
            format!("{}{}", self.inner, segment_normalized)
        } else {
            format!("{}/{}", self.inner, segment_normalized)
        };
        Self::new(joined)
    }

    /// Get the parent directory.
    pub fn parent(&self) -> Option<Self> {
        let trimmed = self.inner.trim_end_matches('/');
        match trimmed.rfind('/') {
            Some(idx) if idx > 0 => Some(Self {
                inner: trimmed[..idx].to_string(),
            }),
            Some(0) => Some(Self {
                inner: "/".to_string(),
            }),
            _ => None,
        }
    }

    /// Get the file name component.
    pub fn file_name(&self) -> Option<&str> {
        let trimmed = self.inner.trim_end_matches('/');
        trimmed.rsplit('/').next().filter(|name| !name.is_empty())
    }

    /// Check if this path exists on the filesystem.
    pub fn exists(&self) -> bool {
        self.to_native().exists()
    }

    /// Check if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.to_native().is_dir()
    }

    /// Check if this is a file.
    pub fn is_file(&self) -> bool {
        self.to_native().is_file()
    }

    /// Get the extension if present.
    pub fn extension(&self) -> Option<&str> {
        self.file_name().and_then(|name| {
            let idx = name.rfind('.')?;
            if idx == 0 {
                None
            } else {
                Some(&name[idx + 1..])
            }
        })
    }

    /// True if `other` is this path or lies somewhere below it.
    ///
    /// Matches whole components only: `a/b` contains `a/b/c` but not `a/bc`.
    pub fn contains(&self, other: &NormalizedPath) -> bool {
        match other.inner.strip_prefix(&self.inner) {
            Some("") => true,
            Some(rest) => rest.starts_with('/') || self.inner.ends_with('/'),
            None => false,
        }
    }

    /// Path of `self` relative to `base`, or `None` when `self` is not below it.
    pub fn relative_to(&self, base: &NormalizedPath) -> Option<String> {
        if !base.contains(self) || self == base {
            return None;
        }
        let rest = &self.inner[base.inner.len()..];
        Some(rest.trim_start_matches('/').to_string())
    }
}

impl AsRef<Path> for NormalizedPath {
    fn as_ref(&self) -> &Path {
        Path::new(&self.inner)
    }
}

impl std::fmt::Display for NormalizedPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.inner)
    }
}

impl From<&str> for NormalizedPath {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for NormalizedPath {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<PathBuf> for NormalizedPath {
    fn from(p: PathBuf) -> Self {
        Self::new(p)
    }
}

impl From<&Path> for NormalizedPath {
    fn from(p: &Path) -> Self {
        Self::new(p)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contains_matches_whole_components() {
        let base = NormalizedPath::new("root/Dialogs/D1");
        assert!(base.contains(&NormalizedPath::new("root/Dialogs/D1")));
        assert!(base.contains(&NormalizedPath::new("root/Dialogs/D1/Events/Card.Open.isbl")));
        assert!(!base.contains(&NormalizedPath::new("root/Dialogs/D10")));
        assert!(!base.contains(&NormalizedPath::new("root/Dialogs")));
    }

    #[test]
    fn relative_to_strips_base() {
        let base = NormalizedPath::new("C:\\dev\\tree");
        let folder = NormalizedPath::new("C:\\dev\\tree\\Dialogs\\D1");
        assert_eq!(folder.relative_to(&base).as_deref(), Some("Dialogs/D1"));
        assert_eq!(base.relative_to(&base), None);
    }
}
