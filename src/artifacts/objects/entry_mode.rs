/// Permission bits of a file entry
#[derive(Debug, Clone, Copy, Eq, Ord, Default, PartialEq, PartialOrd, Hash)]
pub enum FileMode {
    #[default]
    Regular,
    Executable,
    Symlink,
}

impl FileMode {
    pub fn is_executable(&self) -> bool {
        matches!(self, FileMode::Executable)
    }
}

/// Mode of a tree entry, as written in tree objects
#[derive(Debug, Clone, Copy, Eq, Ord, PartialEq, PartialOrd, Hash)]
pub enum EntryMode {
    File(FileMode),
    Directory,
    Submodule,
}

impl EntryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryMode::File(FileMode::Regular) => "100644",
            EntryMode::File(FileMode::Executable) => "100755",
            EntryMode::File(FileMode::Symlink) => "120000",
            EntryMode::Directory => "40000",
            EntryMode::Submodule => "160000",
        }
    }

    pub fn as_u32(&self) -> u32 {
        match self {
            EntryMode::File(FileMode::Regular) => 0o100644,
            EntryMode::File(FileMode::Executable) => 0o100755,
            EntryMode::File(FileMode::Symlink) => 0o120000,
            EntryMode::Directory => 0o40000,
            EntryMode::Submodule => 0o160000,
        }
    }

    pub fn is_tree(&self) -> bool {
        matches!(self, EntryMode::Directory)
    }

    pub fn is_submodule(&self) -> bool {
        matches!(self, EntryMode::Submodule)
    }

    /// Parse the octal mode of a tree entry
    ///
    /// Legacy group-writable blobs (`100664`) are read as regular files.
    pub fn from_octal_str(mode: &str) -> anyhow::Result<Self> {
        let mode = u32::from_str_radix(mode, 8)
            .map_err(|_| anyhow::anyhow!("invalid entry mode {mode:?}"))?;
        Self::try_from(mode)
    }
}

impl TryFrom<u32> for EntryMode {
    type Error = anyhow::Error;

    fn try_from(mode: u32) -> anyhow::Result<Self> {
        match mode {
            0o100644 | 0o100664 => Ok(EntryMode::File(FileMode::Regular)),
            0o100755 => Ok(EntryMode::File(FileMode::Executable)),
            0o120000 => Ok(EntryMode::File(FileMode::Symlink)),
            0o40000 => Ok(EntryMode::Directory),
            0o160000 => Ok(EntryMode::Submodule),
            _ => Err(anyhow::anyhow!("invalid entry mode {mode:o}")),
        }
    }
}

impl From<FileMode> for EntryMode {
    fn from(mode: FileMode) -> Self {
        EntryMode::File(mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    #[rstest]
    #[case("100644", EntryMode::File(FileMode::Regular))]
    #[case("100755", EntryMode::File(FileMode::Executable))]
    #[case("120000", EntryMode::File(FileMode::Symlink))]
    #[case("40000", EntryMode::Directory)]
    #[case("160000", EntryMode::Submodule)]
    fn octal_modes_round_trip(#[case] octal: &str, #[case] mode: EntryMode) -> anyhow::Result<()> {
        assert_eq!(EntryMode::from_octal_str(octal)?, mode);
        assert_eq!(mode.as_str(), octal);
        assert_eq!(format!("{:o}", mode.as_u32()), octal);
        Ok(())
    }

    #[test]
    fn unknown_modes_are_rejected() {
        assert!(EntryMode::from_octal_str("100600").is_err());
        assert!(EntryMode::from_octal_str("xyz").is_err());
    }
}
