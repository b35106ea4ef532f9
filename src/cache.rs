use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::classfile::{self, ClassView, DecodeError};
use crate::walker::{ClassEntry, ClassOrigin};

/// Per-run decode cache keyed by `(origin, entry path)`. Safe for
/// concurrent readers and writers; dropped wholesale at run teardown.
pub(crate) struct DecodeCache {
    decoded: Mutex<HashMap<(ClassOrigin, String), Arc<ClassView>>>,
}

impl DecodeCache {
    pub(crate) fn new() -> Self {
        Self {
            decoded: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn get_or_decode(&self, entry: &ClassEntry) -> Result<Arc<ClassView>, DecodeError> {
        let key = (entry.origin.clone(), entry.path.clone());
        if let Some(view) = self
            .decoded
            .lock()
            .expect("decode cache lock poisoned")
            .get(&key)
        {
            return Ok(Arc::clone(view));
        }
        let view = Arc::new(classfile::decode(&entry.bytes)?);
        self.decoded
            .lock()
            .expect("decode cache lock poisoned")
            .insert(key, Arc::clone(&view));
        Ok(view)
    }

    #[cfg(test)]
    pub(crate) fn decoded_count(&self) -> usize {
        self.decoded.lock().expect("decode cache lock poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::test_harness::ClassFileBuilder;

    #[test]
    fn repeated_access_reuses_the_decoded_view() {
        let cache = DecodeCache::new();
        let entry = ClassEntry {
            origin: ClassOrigin {
                archive: PathBuf::from("app.war"),
                nested: None,
            },
            path: "WEB-INF/classes/com/ex/A.class".to_string(),
            bytes: ClassFileBuilder::new("com/ex/A", "java/lang/Object").finish(),
        };

        let first = cache.get_or_decode(&entry).expect("decode");
        let second = cache.get_or_decode(&entry).expect("decode again");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.decoded_count(), 1);
    }

    #[test]
    fn decode_failures_are_not_cached() {
        let cache = DecodeCache::new();
        let entry = ClassEntry {
            origin: ClassOrigin {
                archive: PathBuf::from("app.war"),
                nested: None,
            },
            path: "WEB-INF/classes/com/ex/Bad.class".to_string(),
            bytes: b"garbage".to_vec(),
        };

        assert!(cache.get_or_decode(&entry).is_err());
        assert_eq!(cache.decoded_count(), 0);
    }
}
