//! Database entry types
//!
//! Entries read back from stored trees: the id of a child object together with its mode.

pub mod database_entry;
