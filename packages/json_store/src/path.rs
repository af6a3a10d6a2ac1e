//! Slash-separated paths into a mounted JSON document.

use std::fmt;

/// A path from the document root to some node.
///
/// Unlike store paths elsewhere, components are arbitrary strings: any JSON
/// object key is addressable, so no identifier validation is applied. The
/// empty path is the document root (`/`).
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Path {
    pub components: Vec<String>,
}

impl Path {
    /// The document root.
    pub fn root() -> Self {
        Path::default()
    }

    /// Parse a path string.
    ///
    /// Empty segments are dropped, so `/a//b/` and `a/b` are the same path.
    ///
    /// ```rust
    /// use jsonfs_json_store::Path;
    ///
    /// let path = Path::parse("/b/1");
    /// assert_eq!(path.len(), 2);
    /// assert_eq!(Path::parse("b/1/"), path);
    /// ```
    pub fn parse(s: &str) -> Self {
        Path {
            components: s
                .split('/')
                .filter(|c| !c.is_empty())
                .map(|c| c.to_string())
                .collect(),
        }
    }

    /// Check if this path is the root.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.components.iter()
    }

    /// Append a single component.
    #[must_use]
    pub fn child(&self, name: &str) -> Path {
        let mut components = self.components.clone();
        components.push(name.to_string());
        Path { components }
    }

    /// Split into the parent path and the final component.
    ///
    /// Returns `None` for the root, which has no parent.
    pub fn split_last(&self) -> Option<(Path, &str)> {
        let (last, prefix) = self.components.split_last()?;
        Some((
            Path {
                components: prefix.to_vec(),
            },
            last.as_str(),
        ))
    }

    /// The final component, if any.
    pub fn name(&self) -> Option<&str> {
        self.components.last().map(String::as_str)
    }

    /// Check if this path has the given prefix.
    pub fn has_prefix(&self, prefix: &Path) -> bool {
        prefix.components.len() <= self.components.len()
            && prefix.components == self.components[..prefix.components.len()]
    }

    /// Strip a prefix from this path.
    ///
    /// Returns `None` if the prefix doesn't match.
    #[must_use]
    pub fn strip_prefix(&self, prefix: &Path) -> Option<Path> {
        if self.has_prefix(prefix) {
            Some(Path {
                components: self.components[prefix.components.len()..].to_vec(),
            })
        } else {
            None
        }
    }

    /// Join this path with another.
    #[must_use]
    pub fn join(&self, other: &Path) -> Path {
        let mut components = self.components.clone();
        components.extend(other.components.iter().cloned());
        Path { components }
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.components.join("/"))
    }
}

impl std::ops::Index<usize> for Path {
    type Output = String;

    fn index(&self, i: usize) -> &Self::Output {
        &self.components[i]
    }
}

impl From<&str> for Path {
    fn from(s: &str) -> Self {
        Path::parse(s)
    }
}

/// Shorthand for `Path::parse`.
///
/// ```rust
/// use jsonfs_json_store::path;
///
/// let p = path!("/b/1");
/// assert_eq!(p.len(), 2);
/// ```
#[macro_export]
macro_rules! path {
    ($s:expr) => {
        $crate::Path::parse($s)
    };
}
