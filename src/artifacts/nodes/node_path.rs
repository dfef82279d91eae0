use crate::artifacts::nodes::NodeKind;
use crate::errors::{Result, VcsError};
use serde::{Serialize, Serializer};

/// Relative, slash-separated location of a node inside a snapshot
///
/// Never starts or ends with `/`. Only the root directory has the empty path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct NodePath(String);

impl NodePath {
    pub fn root() -> Self {
        NodePath(String::new())
    }

    /// Validate `path` for a node of the given kind
    ///
    /// A single trailing slash is dropped, so `"docs/"` names the same directory as `"docs"`.
    pub fn try_parse(path: &str, kind: NodeKind) -> Result<Self> {
        if path.starts_with('/') {
            return Err(VcsError::invalid_path(path, "only relative paths are supported"));
        }

        let normalized = path.strip_suffix('/').unwrap_or(path);
        if normalized.ends_with('/') {
            return Err(VcsError::invalid_path(path, "path cannot end with a slash"));
        }
        if normalized.is_empty() && kind != NodeKind::Dir {
            return Err(VcsError::invalid_path(
                path,
                "only the root directory may have an empty path",
            ));
        }
        if !normalized.is_empty() && normalized.split('/').any(str::is_empty) {
            return Err(VcsError::invalid_path(path, "path contains an empty segment"));
        }

        Ok(NodePath(normalized.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Last segment of the path, empty for the root
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or("")
    }

    /// Path of the containing directory, `None` for the root
    pub fn parent_path(&self) -> Option<NodePath> {
        if self.is_root() {
            return None;
        }

        Some(match self.0.rsplit_once('/') {
            Some((parent, _)) => NodePath(parent.to_string()),
            None => NodePath::root(),
        })
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|segment| !segment.is_empty())
    }

    /// Directory segments and the leaf name
    pub fn split_leaf(&self) -> (Vec<&str>, &str) {
        let mut segments = self.segments().collect::<Vec<_>>();
        let leaf = segments.pop().unwrap_or("");
        (segments, leaf)
    }

    /// Path of a direct child named `name`
    pub fn join(&self, name: &str) -> NodePath {
        if self.is_root() {
            NodePath(name.to_string())
        } else {
            NodePath(format!("{}/{}", self.0, name))
        }
    }
}

impl AsRef<str> for NodePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NodePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for NodePath {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("/foo", NodeKind::File)]
    #[case("/foo/bar", NodeKind::File)]
    #[case("/foo/", NodeKind::Dir)]
    #[case("/foo/bar/", NodeKind::Dir)]
    #[case("", NodeKind::File)]
    #[case("", NodeKind::Submodule)]
    #[case("foo//", NodeKind::Dir)]
    #[case("foo//bar", NodeKind::File)]
    fn invalid_paths_are_rejected(#[case] path: &str, #[case] kind: NodeKind) {
        let error = NodePath::try_parse(path, kind).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Structural);
    }

    #[rstest]
    #[case("", "")]
    #[case("path", "path")]
    #[case("path/", "path")]
    #[case("some/path", "path")]
    #[case("some/path/", "path")]
    fn name_is_the_last_segment(#[case] path: &str, #[case] name: &str) -> Result<()> {
        assert_eq!(NodePath::try_parse(path, NodeKind::Dir)?.name(), name);
        Ok(())
    }

    #[rstest]
    #[case("some/path/", Some("some"))]
    #[case("some/longer/path/", Some("some/longer"))]
    #[case("top", Some(""))]
    #[case("", None)]
    fn parent_path_drops_the_last_segment(
        #[case] path: &str,
        #[case] parent: Option<&str>,
    ) -> Result<()> {
        let parent_path = NodePath::try_parse(path, NodeKind::Dir)?.parent_path();
        assert_eq!(parent_path.as_ref().map(NodePath::as_str), parent);
        Ok(())
    }

    proptest! {
        #[test]
        fn parsed_paths_never_have_outer_slashes(segments in prop::collection::vec("[a-z0-9 ._-]{1,8}", 1..5)) {
            let raw = segments.join("/");
            let path = NodePath::try_parse(&raw, NodeKind::File).unwrap();

            prop_assert!(!path.as_str().starts_with('/'));
            prop_assert!(!path.as_str().ends_with('/'));
            prop_assert_eq!(path.segments().count(), segments.len());
            prop_assert_eq!(path.parent_path().unwrap().join(path.name()), path.clone());
        }
    }
}
