use crate::artifacts::branch::INVALID_REF_NAME_REGEX;
use crate::errors::{Result, VcsError};
use regex::Regex;
use std::sync::LazyLock;

static INVALID_REF_NAME: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(INVALID_REF_NAME_REGEX).ok());

/// Validated branch or tag name
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RefName(String);

impl RefName {
    pub fn try_parse(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(VcsError::InvalidRefName(name));
        }

        let invalid = INVALID_REF_NAME
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("invalid ref name regex: {INVALID_REF_NAME_REGEX}"))?;
        if invalid.is_match(&name) {
            return Err(VcsError::InvalidRefName(name));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RefName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
