//! Ref names and revision expressions

pub mod ref_name;
pub mod revision;

pub const INVALID_REF_NAME_REGEX: &str =
    r"^\.|\/\.|\.\.|^\/|\/$|\.lock$|@\{|[\x00-\x20\*:\?\[\\~\^\x7f]";
pub const PARENT_REGEX: &str = r"^(.+)\^$";
pub const ANCESTOR_REGEX: &str = r"^(.+)\~(\d+)$";

/// Spellings of the newest changeset
pub const TIP_ALIASES: phf::Set<&'static str> = phf::phf_set! {
    "",
    "tip",
    "HEAD",
    "head",
    "@",
    "-1",
};

/// All-digit revisions at least this long are ids, not indexes
pub const MAX_INDEX_DIGITS: usize = 12;
