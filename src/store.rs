use crate::config::Options;
use crate::error::StoreError;
use fs4::fs_std::FileExt;
use serde_json::{Map, Value};
use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// A stored record: keys mapped to JSON values
pub type Record = Map<String, Value>;

/// Persistent key-value storage shared by options and the capture slot
pub trait KeyValueStore: Send + Sync {
    /// Reads the keys named in `defaults`; missing keys take the default value
    fn get(&self, defaults: &Record) -> Result<Record, StoreError>;

    /// Writes every key of `record`, keeping other keys
    fn set(&self, record: Record) -> Result<(), StoreError>;

    fn remove(&self, keys: &[&str]) -> Result<(), StoreError>;

    /// Removes `key` and returns what it held, in one step
    fn take(&self, key: &str) -> Result<Option<Value>, StoreError>;
}

fn select(all: &Record, defaults: &Record) -> Record {
    defaults
        .iter()
        .map(|(key, default)| {
            let value = all.get(key).cloned().unwrap_or_else(|| default.clone());
            (key.clone(), value)
        })
        .collect()
}

/// Store that lives only as long as the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    data: Mutex<Record>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Record> {
        // a poisoned map is still a valid map
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, defaults: &Record) -> Result<Record, StoreError> {
        Ok(select(&self.lock(), defaults))
    }

    fn set(&self, record: Record) -> Result<(), StoreError> {
        self.lock().extend(record);
        Ok(())
    }

    fn remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        let mut data = self.lock();
        for key in keys {
            data.remove(*key);
        }
        Ok(())
    }

    fn take(&self, key: &str) -> Result<Option<Value>, StoreError> {
        Ok(self.lock().remove(key))
    }
}

/// Store persisted as one JSON object in a file
///
/// The file is read on every access and rewritten on every change, so separate
/// processes see each other's writes. Every access holds an advisory lock on a
/// `.lock` file next to the store; a read-modify-write such as [`take`] is
/// therefore atomic across processes, not just across threads.
///
/// [`take`]: KeyValueStore::take
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<Record, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(Record::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Record::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, data: &Record) -> Result<(), StoreError> {
        let contents = serde_json::to_string_pretty(data)?;
        // write-then-rename keeps the file whole if we die mid-write
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &self.path)?;
        ::log::trace!("Wrote store {}", self.path.display());
        Ok(())
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("json.lock")
    }

    /// Opens the lock file and waits for the lock; released when the file drops
    fn lock_file(&self, exclusive: bool) -> Result<File, StoreError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(self.lock_path())?;
        if exclusive {
            file.lock_exclusive()?;
        } else {
            file.lock_shared()?;
        }
        Ok(file)
    }

    fn update<T>(&self, f: impl FnOnce(&mut Record) -> T) -> Result<T, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let _file_lock = self.lock_file(true)?;
        let mut data = self.read()?;
        let result = f(&mut data);
        self.write(&data)?;
        Ok(result)
    }
}

impl KeyValueStore for JsonFileStore {
    fn get(&self, defaults: &Record) -> Result<Record, StoreError> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let _file_lock = self.lock_file(false)?;
        Ok(select(&self.read()?, defaults))
    }

    fn set(&self, record: Record) -> Result<(), StoreError> {
        self.update(|data| data.extend(record))
    }

    fn remove(&self, keys: &[&str]) -> Result<(), StoreError> {
        self.update(|data| {
            for key in keys {
                data.remove(*key);
            }
        })
    }

    fn take(&self, key: &str) -> Result<Option<Value>, StoreError> {
        self.update(|data| data.remove(key))
    }
}

/// Loads the prompt options, falling back to defaults for missing keys
pub fn load_options(store: &dyn KeyValueStore) -> Result<Options, StoreError> {
    let defaults = match serde_json::to_value(Options::default())? {
        Value::Object(map) => map,
        _ => Record::new(),
    };
    let record = store.get(&defaults)?;
    Ok(serde_json::from_value(Value::Object(record))?)
}

pub fn save_options(store: &dyn KeyValueStore, options: &Options) -> Result<(), StoreError> {
    if let Value::Object(record) = serde_json::to_value(options)? {
        store.set(record)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_get_fills_defaults() {
        let store = MemoryStore::new();
        store.set(record(json!({"a": 1}))).unwrap();

        let got = store.get(&record(json!({"a": 0, "b": "x"}))).unwrap();
        assert_eq!(Value::Object(got), json!({"a": 1, "b": "x"}));
    }

    #[test]
    fn test_take_removes() {
        let store = MemoryStore::new();
        store.set(record(json!({"slot": {"n": 1}}))).unwrap();

        assert_eq!(store.take("slot").unwrap(), Some(json!({"n": 1})));
        assert_eq!(store.take("slot").unwrap(), None);
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        let store = JsonFileStore::new(&path);
        store.set(record(json!({"a": true, "b": [1, 2]}))).unwrap();
        store.remove(&["b"]).unwrap();

        let reopened = JsonFileStore::new(&path);
        let got = reopened.get(&record(json!({"a": false, "b": null}))).unwrap();
        assert_eq!(Value::Object(got), json!({"a": true, "b": null}));
        assert_eq!(reopened.take("a").unwrap(), Some(json!(true)));
        assert_eq!(JsonFileStore::new(&path).take("a").unwrap(), None);
    }

    #[test]
    fn test_separate_file_stores_do_not_lose_writes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");

        // each writer has its own store, as separate processes would
        let writers: Vec<_> = (0..6)
            .map(|writer| {
                let path = path.clone();
                std::thread::spawn(move || {
                    let store = JsonFileStore::new(&path);
                    for n in 0..10 {
                        store
                            .set(record(json!({ format!("w{}-{}", writer, n): n })))
                            .unwrap();
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().unwrap();
        }

        let all = JsonFileStore::new(&path).read().unwrap();
        assert_eq!(all.len(), 60);
    }

    #[test]
    fn test_take_waits_for_a_concurrent_writer() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        let reader = JsonFileStore::new(&path);
        reader.set(record(json!({"slot": 1}))).unwrap();

        let writer_path = path.clone();
        let taken = reader
            .update(|data| {
                // a second store writes a new slot while this update holds the lock
                let writer = std::thread::spawn(move || {
                    JsonFileStore::new(&writer_path)
                        .set(record(json!({"slot": 2})))
                        .unwrap();
                });
                std::thread::sleep(std::time::Duration::from_millis(100));
                assert!(!writer.is_finished());
                (data.remove("slot"), writer)
            })
            .unwrap();
        let (value, writer) = taken;
        writer.join().unwrap();

        assert_eq!(value, Some(json!(1)));
        assert_eq!(reader.take("slot").unwrap(), Some(json!(2)));
    }

    #[test]
    fn test_file_store_rejects_garbage() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), "not json").unwrap();

        let store = JsonFileStore::new(file.path());
        assert!(matches!(store.get(&Record::new()), Err(StoreError::Json(_))));
    }

    #[test]
    fn test_options_round_trip_through_store() {
        let store = MemoryStore::new();
        assert_eq!(load_options(&store).unwrap(), Options::default());

        let mut options = Options::default();
        options.set("includeImages", false);
        save_options(&store, &options).unwrap();
        assert!(!load_options(&store).unwrap().include_images);
    }
}
