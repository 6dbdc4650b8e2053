//! In-process blob store, for local development and tests.
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use super::{Blob, Error, Store};

/// URL scheme of objects held in memory.
pub const SCHEME: &str = "memory://";

#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: Mutex<BTreeMap<String, Vec<u8>>>,
}

impl MemoryStore {
    /// Content of an object, if it exists.
    pub fn get(&self, pathname: &str) -> Option<Vec<u8>> {
        self.objects().get(pathname).cloned()
    }

    fn objects(&self) -> MutexGuard<'_, BTreeMap<String, Vec<u8>>> {
        // A panic while holding the lock can't leave the map half-written.
        self.objects.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn blob(pathname: &str) -> Blob {
        Blob {
            pathname: pathname.to_owned(),
            url: format!("{SCHEME}/{pathname}"),
        }
    }
}

impl Store for MemoryStore {
    fn list(&self, prefix: &str) -> Result<Vec<Blob>, Error> {
        Ok(self
            .objects()
            .range(prefix.to_owned()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| Self::blob(k))
            .collect())
    }

    fn fetch(&self, blob: &Blob) -> Result<Vec<u8>, Error> {
        self.get(&blob.pathname)
            .ok_or_else(|| Error::NotFound(blob.url.clone()))
    }

    fn put(&self, pathname: &str, body: Vec<u8>) -> Result<Blob, Error> {
        self.objects().insert(pathname.to_owned(), body);

        Ok(Self::blob(pathname))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod test {
    use super::*;

    #[test]
    fn test_list_prefix() {
        let store = MemoryStore::default();
        store.put("a.json", b"1".to_vec()).unwrap();
        store.put("ab.json", b"2".to_vec()).unwrap();
        store.put("b.json", b"3".to_vec()).unwrap();

        let names = store
            .list("a")
            .unwrap()
            .into_iter()
            .map(|b| b.pathname)
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["a.json", "ab.json"]);
        assert_eq!(store.list("c").unwrap(), vec![]);

        let blob = store.put("a.json", b"4".to_vec()).unwrap();
        assert_eq!(blob.url, "memory:///a.json");
        assert_eq!(store.fetch(&blob).unwrap(), b"4");
    }
}
