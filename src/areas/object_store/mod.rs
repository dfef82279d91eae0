//! Raw object storage
//!
//! An [`ObjectStore`] persists encoded objects under their content address. The engine only
//! needs three calls from it; everything typed lives in [`Database`](crate::areas::database::Database).

pub mod loose;
pub mod memory;

use crate::artifacts::objects::object_id::ObjectId;
use bytes::Bytes;

pub use loose::LooseStore;
pub use memory::MemoryStore;

pub trait ObjectStore: Send + Sync + std::fmt::Debug {
    /// Read the encoded bytes of an object, header included
    fn read_object(&self, oid: &ObjectId) -> anyhow::Result<Bytes>;

    /// Store encoded bytes and return their id
    ///
    /// Writing the same bytes twice returns the same id and stores them once.
    fn write_object(&self, encoded: Bytes) -> anyhow::Result<ObjectId>;

    fn contains(&self, oid: &ObjectId) -> anyhow::Result<bool>;
}
