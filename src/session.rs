use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

const KEY_STUDENT_ID: &str = "user_msv";
const KEY_NAME: &str = "user_name";

fn voted_key(student_id: &str) -> String {
    format!("voted_{}", student_id)
}

/// String key-value persistence for identity and the per-student voted
/// flag. Any backing layer works; the binary uses a JSON file.
pub trait SessionStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
    fn clear(&mut self);
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub name: String,
    pub student_id: String,
    pub voted: bool,
}

pub fn restore(store: &dyn SessionStore) -> Option<Session> {
    let student_id = store.get(KEY_STUDENT_ID)?;
    let name = store.get(KEY_NAME)?;
    let voted = has_voted(store, &student_id);
    Some(Session {
        name,
        student_id,
        voted,
    })
}

pub fn persist(store: &mut dyn SessionStore, name: &str, student_id: &str) {
    store.set(KEY_STUDENT_ID, student_id);
    store.set(KEY_NAME, name);
}

pub fn mark_voted(store: &mut dyn SessionStore, student_id: &str) {
    store.set(&voted_key(student_id), "true");
}

pub fn has_voted(store: &dyn SessionStore, student_id: &str) -> bool {
    store.get(&voted_key(student_id)).is_some()
}

#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemoryStore {
    values: BTreeMap<String, String>,
}

#[cfg(test)]
impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
    }

    fn clear(&mut self) {
        self.values.clear();
    }
}

/// File-backed store. Writes are best-effort: a failed save keeps the
/// in-memory view and logs, matching the browser-storage role of this
/// layer rather than failing the flow.
pub struct FileStore {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileStore {
    pub fn open(path: PathBuf) -> Self {
        let values = fs::read_to_string(&path)
            .ok()
            .and_then(|raw| serde_json::from_str(&raw).ok())
            .unwrap_or_default();
        Self { path, values }
    }

    fn save(&self) {
        match serde_json::to_string_pretty(&self.values) {
            Ok(raw) => {
                if let Err(err) = fs::write(&self.path, raw) {
                    log::warn!("failed to save session file {:?}: {}", self.path, err);
                }
            }
            Err(err) => log::warn!("failed to encode session file: {}", err),
        }
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
        self.save();
    }

    fn remove(&mut self, key: &str) {
        self.values.remove(key);
        self.save();
    }

    fn clear(&mut self) {
        self.values.clear();
        self.save();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restore_needs_both_identity_keys() {
        let mut store = MemoryStore::default();
        assert_eq!(restore(&store), None);

        store.set(KEY_STUDENT_ID, "B21DCCN001");
        assert_eq!(restore(&store), None);

        store.set(KEY_NAME, "An");
        assert_eq!(
            restore(&store),
            Some(Session {
                name: "An".into(),
                student_id: "B21DCCN001".into(),
                voted: false,
            })
        );
    }

    #[test]
    fn voted_flag_is_per_student() {
        let mut store = MemoryStore::default();
        persist(&mut store, "An", "B21DCCN001");
        mark_voted(&mut store, "B21DCCN001");

        assert!(has_voted(&store, "B21DCCN001"));
        assert!(!has_voted(&store, "B21DCCN002"));
        assert!(restore(&store).unwrap().voted);
    }

    #[test]
    fn clear_forgets_everything() {
        let mut store = MemoryStore::default();
        persist(&mut store, "An", "B21DCCN001");
        mark_voted(&mut store, "B21DCCN001");

        store.clear();
        assert_eq!(restore(&store), None);
        assert!(!has_voted(&store, "B21DCCN001"));
    }

    #[test]
    fn file_store_round_trips() {
        let path = std::env::temp_dir().join(format!("vote_together_test_{}.json", std::process::id()));
        let _ = fs::remove_file(&path);

        {
            let mut store = FileStore::open(path.clone());
            persist(&mut store, "An", "B21DCCN001");
            mark_voted(&mut store, "B21DCCN001");
        }

        let reopened = FileStore::open(path.clone());
        let session = restore(&reopened).unwrap();
        assert_eq!(session.student_id, "B21DCCN001");
        assert!(session.voted);

        let _ = fs::remove_file(&path);
    }
}
