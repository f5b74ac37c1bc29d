//! Key-value persistence for per-user and community records.
//!
//! Keys are `/`-separated paths (`players/alice`, `forum/threads/<id>`) and
//! values are JSON documents. Two backends ship: `MemoryStore` for tests and
//! ephemeral runs, and `DirStore`, which keeps one `<key>.json` file per
//! record under a root directory.
//!
//! Read-modify-write goes through `update`, which both backends run under an
//! in-process lock, so concurrent updates of one key are never lost within a
//! single process.

use std::{collections::BTreeMap, path::PathBuf};

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, instrument, warn};

use crate::error::AppError;

/// Mutation applied by `KvStore::update`; receives the current value if any.
pub type UpdateFn = Box<dyn FnOnce(Option<Value>) -> Result<Value, AppError> + Send>;

#[async_trait]
pub trait KvStore: Send + Sync {
  async fn get(&self, key: &str) -> Result<Option<Value>, AppError>;

  async fn put(&self, key: &str, value: Value) -> Result<(), AppError>;

  /// All `(key, value)` pairs whose key starts with `prefix`, ordered by key.
  async fn list(&self, prefix: &str) -> Result<Vec<(String, Value)>, AppError>;

  /// Atomically replace the value at `key` with `f(current)` and return it.
  /// When `f` fails nothing is written.
  async fn update(&self, key: &str, f: UpdateFn) -> Result<Value, AppError>;

  /// Store `value` only if `key` is absent. Returns whether it was written.
  async fn insert_new(&self, key: &str, value: Value) -> Result<bool, AppError>;
}

/// In-process store backed by a sorted map.
#[derive(Default)]
pub struct MemoryStore {
  data: RwLock<BTreeMap<String, Value>>,
}

impl MemoryStore {
  pub fn new() -> Self {
    Self::default()
  }
}

#[async_trait]
impl KvStore for MemoryStore {
  async fn get(&self, key: &str) -> Result<Option<Value>, AppError> {
    Ok(self.data.read().await.get(key).cloned())
  }

  async fn put(&self, key: &str, value: Value) -> Result<(), AppError> {
    self.data.write().await.insert(key.to_string(), value);
    Ok(())
  }

  async fn list(&self, prefix: &str) -> Result<Vec<(String, Value)>, AppError> {
    let data = self.data.read().await;
    Ok(
      data
        .range(prefix.to_string()..)
        .take_while(|(k, _)| k.starts_with(prefix))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect(),
    )
  }

  async fn update(&self, key: &str, f: UpdateFn) -> Result<Value, AppError> {
    let mut data = self.data.write().await;
    let next = f(data.get(key).cloned())?;
    data.insert(key.to_string(), next.clone());
    Ok(next)
  }

  async fn insert_new(&self, key: &str, value: Value) -> Result<bool, AppError> {
    let mut data = self.data.write().await;
    if data.contains_key(key) {
      return Ok(false);
    }
    data.insert(key.to_string(), value);
    Ok(true)
  }
}

/// One JSON file per key under `root`; `a/b` lives at `root/a/b.json`.
pub struct DirStore {
  root: PathBuf,
  write_lock: Mutex<()>,
}

impl DirStore {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into(), write_lock: Mutex::new(()) }
  }

  fn path_for(&self, key: &str) -> Result<PathBuf, AppError> {
    let mut path = self.root.clone();
    let segments: Vec<&str> = key.split('/').collect();
    for (i, seg) in segments.iter().enumerate() {
      if seg.is_empty() || *seg == "." || *seg == ".." || seg.contains('\\') {
        return Err(AppError::Storage(format!("invalid store key: {key}")));
      }
      if i + 1 == segments.len() {
        path.push(format!("{seg}.json"));
      } else {
        path.push(seg);
      }
    }
    Ok(path)
  }

  async fn read_value(&self, key: &str) -> Result<Option<Value>, AppError> {
    let path = self.path_for(key)?;
    match tokio::fs::read(&path).await {
      Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
      Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
      Err(e) => Err(e.into()),
    }
  }

  // Write to a sibling temp file and rename so readers never see half a record.
  async fn write_value(&self, key: &str, value: &Value) -> Result<(), AppError> {
    let path = self.path_for(key)?;
    if let Some(parent) = path.parent() {
      tokio::fs::create_dir_all(parent).await?;
    }
    let tmp = path.with_extension(format!("json.{}.tmp", uuid::Uuid::new_v4().simple()));
    tokio::fs::write(&tmp, serde_json::to_vec_pretty(value)?).await?;
    tokio::fs::rename(&tmp, &path).await?;
    debug!(target: "lumen_backend", %key, "Record written");
    Ok(())
  }
}

#[async_trait]
impl KvStore for DirStore {
  async fn get(&self, key: &str) -> Result<Option<Value>, AppError> {
    self.read_value(key).await
  }

  async fn put(&self, key: &str, value: Value) -> Result<(), AppError> {
    let _guard = self.write_lock.lock().await;
    self.write_value(key, &value).await
  }

  #[instrument(level = "debug", skip(self), fields(root = %self.root.display()))]
  async fn list(&self, prefix: &str) -> Result<Vec<(String, Value)>, AppError> {
    let mut out = Vec::new();
    let mut pending = vec![self.root.clone()];

    while let Some(dir) = pending.pop() {
      let mut entries = match tokio::fs::read_dir(&dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
        Err(e) => return Err(e.into()),
      };
      while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_dir() {
          pending.push(path);
          continue;
        }
        let Some(rel) = path.strip_prefix(&self.root).ok().and_then(|p| p.to_str()) else { continue };
        let Some(key) = rel.strip_suffix(".json") else { continue };
        let key = key.replace(std::path::MAIN_SEPARATOR, "/");
        if !key.starts_with(prefix) {
          continue;
        }
        match tokio::fs::read(&path).await {
          Ok(bytes) => match serde_json::from_slice::<Value>(&bytes) {
            Ok(value) => out.push((key, value)),
            Err(e) => warn!(target: "lumen_backend", %key, error = %e, "Skipping unreadable record"),
          },
          // Removed between read_dir and read.
          Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
          Err(e) => return Err(e.into()),
        }
      }
    }

    out.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(out)
  }

  async fn update(&self, key: &str, f: UpdateFn) -> Result<Value, AppError> {
    let _guard = self.write_lock.lock().await;
    let next = f(self.read_value(key).await?)?;
    self.write_value(key, &next).await?;
    Ok(next)
  }

  async fn insert_new(&self, key: &str, value: Value) -> Result<bool, AppError> {
    let _guard = self.write_lock.lock().await;
    if self.read_value(key).await?.is_some() {
      return Ok(false);
    }
    self.write_value(key, &value).await?;
    Ok(true)
  }
}

// --- Typed helpers ---

pub async fn get_json<T: DeserializeOwned>(store: &dyn KvStore, key: &str) -> Result<Option<T>, AppError> {
  match store.get(key).await? {
    Some(v) => Ok(Some(serde_json::from_value(v)?)),
    None => Ok(None),
  }
}

pub async fn put_json<T: Serialize>(store: &dyn KvStore, key: &str, value: &T) -> Result<(), AppError> {
  store.put(key, serde_json::to_value(value)?).await
}

pub async fn insert_new_json<T: Serialize>(store: &dyn KvStore, key: &str, value: &T) -> Result<bool, AppError> {
  store.insert_new(key, serde_json::to_value(value)?).await
}

/// Records under `prefix` that deserialize as `T`; others are logged and skipped.
pub async fn list_json<T: DeserializeOwned>(store: &dyn KvStore, prefix: &str) -> Result<Vec<T>, AppError> {
  let mut out = Vec::new();
  for (key, value) in store.list(prefix).await? {
    match serde_json::from_value::<T>(value) {
      Ok(v) => out.push(v),
      Err(e) => warn!(target: "lumen_backend", %key, error = %e, "Skipping record with unexpected shape"),
    }
  }
  Ok(out)
}

/// Typed `KvStore::update`.
pub async fn update_json<T, F>(store: &dyn KvStore, key: &str, f: F) -> Result<T, AppError>
where
  T: Serialize + DeserializeOwned + Send + 'static,
  F: FnOnce(Option<T>) -> Result<T, AppError> + Send + 'static,
{
  let update: UpdateFn = Box::new(move |current| {
    let current = current.map(serde_json::from_value::<T>).transpose()?;
    Ok(serde_json::to_value(f(current)?)?)
  });
  let next = store.update(key, update).await?;
  Ok(serde_json::from_value(next)?)
}
