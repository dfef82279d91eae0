use crate::areas::object_store::ObjectStore;
use crate::artifacts::objects::object_id::ObjectId;
use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Object store kept entirely in memory
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<HashMap<ObjectId, Bytes>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ObjectStore for MemoryStore {
    fn read_object(&self, oid: &ObjectId) -> anyhow::Result<Bytes> {
        let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        objects
            .get(oid)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("object {oid} not found"))
    }

    fn write_object(&self, encoded: Bytes) -> anyhow::Result<ObjectId> {
        let oid = ObjectId::hash(&encoded);
        let mut objects = self.objects.write().unwrap_or_else(PoisonError::into_inner);
        objects.entry(oid.clone()).or_insert(encoded);
        Ok(oid)
    }

    fn contains(&self, oid: &ObjectId) -> anyhow::Result<bool> {
        let objects = self.objects.read().unwrap_or_else(PoisonError::into_inner);
        Ok(objects.contains_key(oid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn identical_bytes_are_stored_once() -> anyhow::Result<()> {
        let store = MemoryStore::new();

        let first = store.write_object(Bytes::from_static(b"blob 1\0x"))?;
        let second = store.write_object(Bytes::from_static(b"blob 1\0x"))?;

        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
        assert_eq!(store.read_object(&first)?, Bytes::from_static(b"blob 1\0x"));
        Ok(())
    }

    #[test]
    fn missing_objects_are_reported() {
        let store = MemoryStore::new();
        let oid = ObjectId::hash(b"nothing");

        assert!(store.read_object(&oid).is_err());
        assert!(!store.contains(&oid).unwrap_or(true));
    }
}
