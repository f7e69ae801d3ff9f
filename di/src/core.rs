//! Cycle and depth detection for nested resolution.

use crate::error::{Error, Result};
use std::cell::RefCell;

thread_local! {
  // The entries currently being resolved on this thread, outermost first,
  // tagged with the id of the container resolving them.
  static RESOLVING_STACK: RefCell<Vec<(u64, String)>> = const { RefCell::new(Vec::new()) };
}

/// An RAII guard marking an entry as "being resolved".
///
/// Entering an entry that is already on the stack for the same container means
/// the dependency graph loops back on itself without a lazy break point. The
/// guard pops its entry when dropped, so early returns and `?` keep the stack
/// consistent.
pub(crate) struct ResolutionGuard {
  container_id: u64,
}

impl ResolutionGuard {
  pub(crate) fn enter(container_id: u64, name: &str, max_depth: usize) -> Result<Self> {
    RESOLVING_STACK.with(|stack| {
      let mut stack = stack.borrow_mut();
      let in_container = || stack.iter().filter(|(id, _)| *id == container_id);

      if in_container().any(|(_, entry)| entry == name) {
        let mut chain: Vec<&str> = in_container()
          .map(|(_, entry)| entry.as_str())
          .skip_while(|entry| *entry != name)
          .collect();
        chain.push(name);
        return Err(Error::CircularDependency {
          chain: chain.join(" -> "),
        });
      }

      let depth = in_container().count();
      if depth >= max_depth {
        return Err(Error::DepthExceeded {
          entry: name.to_owned(),
          depth: max_depth,
        });
      }

      stack.push((container_id, name.to_owned()));
      Ok(())
    })?;
    Ok(Self { container_id })
  }
}

impl Drop for ResolutionGuard {
  fn drop(&mut self) {
    RESOLVING_STACK.with(|stack| {
      let mut stack = stack.borrow_mut();
      if let Some(pos) = stack.iter().rposition(|(id, _)| *id == self.container_id) {
        stack.remove(pos);
      }
    });
  }
}
