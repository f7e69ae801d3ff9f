//! The ordered composition of sources, with a memo of decorated entries.

use crate::decorator::Decorator;
use crate::definition::{Definition, DefinitionEntry};
use crate::error::{Error, Result};
use crate::source::{ArraySource, Source};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::trace;

/// Queries sources in priority order; the first one to bind a name wins.
///
/// Entries are decorated once, on first lookup, and memoized. The memo is a
/// read-through cache and is only invalidated by `set` (or by the builder when
/// component registration adds a binding).
pub struct SourceChain {
  sources: Vec<Arc<dyn Source>>,
  mutable: Option<Arc<ArraySource>>,
  decorator: Decorator,
  memo: RwLock<HashMap<String, Arc<DefinitionEntry>>>,
  next_id: AtomicU64,
}

impl SourceChain {
  pub fn new(sources: Vec<Arc<dyn Source>>, decorator: Decorator) -> Self {
    Self {
      sources,
      mutable: None,
      decorator,
      memo: RwLock::new(HashMap::new()),
      next_id: AtomicU64::new(1),
    }
  }

  /// Designates the source that `set` writes to. It is consulted before all
  /// other sources.
  pub fn with_mutable(mut self, source: Arc<ArraySource>) -> Self {
    let as_source: Arc<dyn Source> = source.clone();
    let target = Arc::as_ptr(&as_source).cast::<()>();
    if !self.sources.iter().any(|s| Arc::as_ptr(s).cast::<()>() == target) {
      self.sources.insert(0, as_source);
    }
    self.mutable = Some(source);
    self
  }

  pub fn has(&self, name: &str) -> bool {
    self.memo.read().contains_key(name) || self.sources.iter().any(|s| s.has(name))
  }

  /// The decorated entry for `name`, or `None` when no source binds it.
  pub fn get(&self, name: &str) -> Result<Option<Arc<DefinitionEntry>>> {
    if let Some(entry) = self.memo.read().get(name) {
      return Ok(Some(entry.clone()));
    }

    let Some((source, definition)) = self
      .sources
      .iter()
      .find_map(|s| s.get(name).map(|def| (s, def)))
    else {
      return Ok(None);
    };

    let unique_id = self.next_id.fetch_add(1, Ordering::Relaxed);
    trace!(entry = name, id = unique_id, source = source.label(), "decorating entry");
    let entry = DefinitionEntry::new(name, definition, unique_id);
    let decorated = Arc::new(self.decorator.decorate(entry, self)?);

    // Concurrent lookups may both decorate; the first memoized entry wins.
    let mut memo = self.memo.write();
    Ok(Some(memo.entry(name.to_owned()).or_insert(decorated).clone()))
  }

  pub fn set(&self, name: &str, definition: Definition) -> Result<()> {
    let source = self.mutable.as_ref().ok_or_else(|| {
      Error::definition(name, "this container has no mutable definition source")
    })?;
    source.set(name, definition);
    self.invalidate(name);
    Ok(())
  }

  pub fn is_mutable(&self) -> bool {
    self.mutable.is_some()
  }

  pub(crate) fn invalidate(&self, name: &str) {
    self.memo.write().remove(name);
  }

  pub fn source_count(&self) -> usize {
    self.sources.len()
  }
}
