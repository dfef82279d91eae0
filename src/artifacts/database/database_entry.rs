use crate::artifacts::objects::entry_mode::EntryMode;
use crate::artifacts::objects::object_id::ObjectId;
use derive_new::new;

/// One entry of a stored tree: the mode and id of a child object
#[derive(Debug, Clone, PartialEq, Eq, Hash, new)]
pub struct DatabaseEntry {
    pub oid: ObjectId,
    pub mode: EntryMode,
}

impl DatabaseEntry {
    pub fn is_tree(&self) -> bool {
        self.mode.is_tree()
    }

    pub fn is_submodule(&self) -> bool {
        self.mode.is_submodule()
    }
}
