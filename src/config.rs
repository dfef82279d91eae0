//! Repository-wide settings
//!
//! Settings are passed explicitly into [`Repository`](crate::areas::repository::Repository)
//! constructors instead of being looked up from a global.

use anyhow::Context;

pub const DEFAULT_BRANCH: &str = "master";
pub const DEFAULT_SHORT_ID_LENGTH: usize = 12;
pub const DEFAULT_CONTEXT_LINES: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Branch recorded on commits that do not name one
    pub default_branch: String,
    /// Number of hex characters in a changeset's short id
    pub short_id_length: usize,
    /// Lines of context around each hunk of a generated diff
    pub context_lines: usize,
    /// Compare lines with whitespace stripped when generating diffs
    pub ignore_whitespace: bool,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        RepositoryConfig {
            default_branch: DEFAULT_BRANCH.to_string(),
            short_id_length: DEFAULT_SHORT_ID_LENGTH,
            context_lines: DEFAULT_CONTEXT_LINES,
            ignore_whitespace: false,
        }
    }
}

impl RepositoryConfig {
    /// Load settings from the environment, falling back to defaults
    ///
    /// Reads VCS_DEFAULT_BRANCH, VCS_SHORT_ID_LENGTH, VCS_DIFF_CONTEXT and
    /// VCS_IGNORE_WHITESPACE. Unset variables keep their default value.
    pub fn load_from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(branch) = std::env::var("VCS_DEFAULT_BRANCH") {
            config.default_branch = branch;
        }
        if let Ok(length) = std::env::var("VCS_SHORT_ID_LENGTH") {
            config.short_id_length = length
                .parse()
                .with_context(|| format!("VCS_SHORT_ID_LENGTH is not a number: {length}"))?;
        }
        if let Ok(context) = std::env::var("VCS_DIFF_CONTEXT") {
            config.context_lines = context
                .parse()
                .with_context(|| format!("VCS_DIFF_CONTEXT is not a number: {context}"))?;
        }
        if let Ok(flag) = std::env::var("VCS_IGNORE_WHITESPACE") {
            config.ignore_whitespace = match flag.as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => anyhow::bail!("VCS_IGNORE_WHITESPACE is not a boolean: {flag}"),
            };
        }

        anyhow::ensure!(
            (4..=crate::artifacts::objects::OBJECT_ID_LENGTH).contains(&config.short_id_length),
            "VCS_SHORT_ID_LENGTH must be between 4 and 40, got {}",
            config.short_id_length
        );

        Ok(config)
    }

    pub fn with_default_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_branch = branch.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_the_conventional_settings() {
        let config = RepositoryConfig::default();

        assert_eq!(config.default_branch, "master");
        assert_eq!(config.short_id_length, 12);
        assert_eq!(config.context_lines, 3);
        assert!(!config.ignore_whitespace);
    }

    #[test]
    fn default_branch_can_be_overridden() {
        let config = RepositoryConfig::default().with_default_branch("trunk");
        assert_eq!(config.default_branch, "trunk");
    }
}
