use super::Source;
use crate::definition::Definition;
use crate::error::{Error, Result};
use dashmap::{DashMap, DashSet};
use std::sync::Arc;
use tracing::{trace, warn};

/// A persistent key-value store shared between containers.
///
/// Implementations must tolerate concurrent reads of the same key from several
/// containers.
pub trait CachePool: Send + Sync {
  fn has(&self, key: &str) -> bool;
  fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
  fn set(&self, key: &str, value: Vec<u8>) -> Result<()>;
}

/// An in-process pool, typically shared by all containers of one process.
#[derive(Debug, Default)]
pub struct MemoryCachePool {
  entries: DashMap<String, Vec<u8>>,
}

impl MemoryCachePool {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl CachePool for MemoryCachePool {
  fn has(&self, key: &str) -> bool {
    self.entries.contains_key(key)
  }

  fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
    Ok(self.entries.get(key).map(|v| v.value().clone()))
  }

  fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
    self.entries.insert(key.to_owned(), value);
    Ok(())
  }
}

/// Wraps another source with a persistent definition cache.
///
/// Definitions that cannot be serialized (closures, live objects) are recorded
/// in a negative cache and never looked up in the pool again for the lifetime
/// of this source. Pool failures degrade to a plain pass-through.
pub struct CachedSource {
  inner: Arc<dyn Source>,
  pool: Arc<dyn CachePool>,
  namespace: String,
  label: String,
  uncacheable: DashSet<String>,
}

impl CachedSource {
  pub fn new(inner: Arc<dyn Source>, pool: Arc<dyn CachePool>, namespace: impl Into<String>) -> Self {
    let label = format!("cached {}", inner.label());
    Self {
      inner,
      pool,
      namespace: namespace.into(),
      label,
      uncacheable: DashSet::new(),
    }
  }

  fn key(&self, name: &str) -> String {
    format!("{}.definition.{}", self.namespace, name)
  }

  fn read(&self, key: &str) -> Option<Definition> {
    let bytes = match self.pool.get(key) {
      Ok(found) => found?,
      Err(e) => {
        warn!(key, error = %e, "definition cache read failed");
        return None;
      }
    };
    match decode(key, &bytes) {
      Ok(definition) => Some(definition),
      Err(e) => {
        warn!(key, error = %e, "discarding undecodable cached definition");
        None
      }
    }
  }

  fn write(&self, name: &str, key: &str, definition: &Definition) {
    match serde_json::to_vec(definition) {
      Ok(bytes) => {
        if let Err(e) = self.pool.set(key, bytes) {
          warn!(key, error = %e, "definition cache write failed");
        }
      }
      Err(_) => {
        trace!(entry = name, "definition is not serializable, bypassing cache");
        self.uncacheable.insert(name.to_owned());
      }
    }
  }
}

fn decode(key: &str, bytes: &[u8]) -> Result<Definition> {
  serde_json::from_slice(bytes).map_err(|e| Error::Cache(format!("entry '{}' is corrupt: {}", key, e)))
}

impl Source for CachedSource {
  fn has(&self, name: &str) -> bool {
    if self.uncacheable.contains(name) {
      return self.inner.has(name);
    }
    self.pool.has(&self.key(name)) || self.inner.has(name)
  }

  fn get(&self, name: &str) -> Option<Definition> {
    if self.uncacheable.contains(name) {
      return self.inner.get(name);
    }

    let key = self.key(name);
    if let Some(definition) = self.read(&key) {
      return Some(definition);
    }

    let definition = self.inner.get(name)?;
    self.write(name, &key, &definition);
    Some(definition)
  }

  fn label(&self) -> &str {
    &self.label
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::definition::{factory_fn, object, value};
  use crate::registry::{Callable, Signature};
  use crate::source::ArraySource;
  use crate::value::Value;
  use std::sync::atomic::{AtomicUsize, Ordering};

  #[derive(Default)]
  struct CountingPool {
    inner: MemoryCachePool,
    gets: AtomicUsize,
    sets: AtomicUsize,
  }

  impl CachePool for CountingPool {
    fn has(&self, key: &str) -> bool {
      self.inner.has(key)
    }
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
      self.gets.fetch_add(1, Ordering::SeqCst);
      self.inner.get(key)
    }
    fn set(&self, key: &str, value: Vec<u8>) -> Result<()> {
      self.sets.fetch_add(1, Ordering::SeqCst);
      self.inner.set(key, value)
    }
  }

  struct FailingPool;

  impl CachePool for FailingPool {
    fn has(&self, _key: &str) -> bool {
      true
    }
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
      Err(Error::Cache(format!("backend unreachable reading '{}'", key)))
    }
    fn set(&self, key: &str, _value: Vec<u8>) -> Result<()> {
      Err(Error::Cache(format!("backend unreachable writing '{}'", key)))
    }
  }

  fn inner() -> Arc<ArraySource> {
    Arc::new(ArraySource::from_definitions([
      ("mailer", object("Mailer").into()),
      ("answer", value(42)),
      (
        "clock",
        factory_fn(Callable::new("now", Signature::new(), |_| Ok(Value::Int(0)))).into(),
      ),
    ]))
  }

  #[test]
  fn misses_are_written_back() {
    let pool = Arc::new(CountingPool::default());
    let source = CachedSource::new(inner(), pool.clone(), "test");

    assert_eq!(source.get("mailer"), Some(object("Mailer").into()));
    assert_eq!(pool.sets.load(Ordering::SeqCst), 1);
    assert!(pool.inner.has("test.definition.mailer"));

    // A second source sharing the pool is served from the cache.
    let empty: Arc<dyn Source> = Arc::new(ArraySource::new());
    let warm = CachedSource::new(empty, pool.clone(), "test");
    assert_eq!(warm.get("mailer"), Some(object("Mailer").into()));
    assert!(warm.has("mailer"));
  }

  #[test]
  fn unserializable_definitions_are_negative_cached() {
    let pool = Arc::new(CountingPool::default());
    let source = CachedSource::new(inner(), pool.clone(), "test");

    for _ in 0..5 {
      assert!(source.get("clock").is_some());
    }

    assert_eq!(pool.gets.load(Ordering::SeqCst), 1);
    assert_eq!(pool.sets.load(Ordering::SeqCst), 0);
    assert!(pool.inner.is_empty());
  }

  #[test]
  fn absent_names_are_not_cached() {
    let pool = Arc::new(CountingPool::default());
    let source = CachedSource::new(inner(), pool.clone(), "test");
    assert!(source.get("missing").is_none());
    assert!(!source.has("missing"));
    assert_eq!(pool.sets.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn pool_failures_fall_back_to_the_inner_source() {
    let source = CachedSource::new(inner(), Arc::new(FailingPool), "test");
    assert_eq!(source.get("answer"), Some(value(42)));
    assert_eq!(source.get("mailer"), Some(object("Mailer").into()));
    assert!(source.get("missing").is_none());
  }

  #[test]
  fn corrupt_entries_are_reported_as_cache_errors_and_skipped() {
    let pool = Arc::new(CountingPool::default());
    pool.inner.set("test.definition.answer", b"{not json".to_vec()).unwrap();
    assert!(matches!(
      decode("test.definition.answer", b"{not json"),
      Err(Error::Cache(_))
    ));

    let source = CachedSource::new(inner(), pool.clone(), "test");
    assert_eq!(source.get("answer"), Some(value(42)));
    // The fresh definition replaces the corrupt bytes.
    assert_eq!(pool.sets.load(Ordering::SeqCst), 1);
    let rewritten = pool.inner.get("test.definition.answer").unwrap().unwrap();
    assert_eq!(decode("test.definition.answer", &rewritten).unwrap(), value(42));
  }
}
