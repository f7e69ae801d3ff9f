//! Units of work for request-scoped bindings.
//!
//! A unit of work is identified by a [`UnitId`]. The unit active on the current
//! thread is tracked in a thread-local slot; a cooperative host that moves a
//! task between threads re-enters the task's unit with [`RequestScope::enter`]
//! each time it resumes it.

use std::cell::Cell;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_UNIT: AtomicU64 = AtomicU64::new(1);

thread_local! {
  static CURRENT_UNIT: Cell<Option<UnitId>> = const { Cell::new(None) };
}

/// Identifies one logical unit of work.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UnitId(u64);

impl UnitId {
  /// Allocates a process-unique id.
  pub fn next() -> Self {
    UnitId(NEXT_UNIT.fetch_add(1, Ordering::Relaxed))
  }

  pub fn as_u64(self) -> u64 {
    self.0
  }
}

pub struct RequestScope;

impl RequestScope {
  /// The unit of work active on this thread.
  pub fn current() -> Option<UnitId> {
    CURRENT_UNIT.with(Cell::get)
  }

  /// Makes `unit` the active unit on this thread until the guard is dropped,
  /// at which point the previously active unit (if any) is restored.
  pub fn enter(unit: UnitId) -> UnitGuard {
    let previous = CURRENT_UNIT.with(|slot| slot.replace(Some(unit)));
    UnitGuard { previous }
  }
}

/// Restores the previously active unit of work when dropped.
#[must_use = "the unit of work ends when the guard is dropped"]
pub struct UnitGuard {
  previous: Option<UnitId>,
}

impl Drop for UnitGuard {
  fn drop(&mut self) {
    CURRENT_UNIT.with(|slot| slot.set(self.previous));
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn nested_units_restore_the_outer_one() {
    assert_eq!(RequestScope::current(), None);
    let outer = UnitId::next();
    let inner = UnitId::next();
    assert_ne!(outer, inner);

    let _outer_guard = RequestScope::enter(outer);
    {
      let _inner_guard = RequestScope::enter(inner);
      assert_eq!(RequestScope::current(), Some(inner));
    }
    assert_eq!(RequestScope::current(), Some(outer));
  }

  #[test]
  fn units_are_per_thread() {
    let _guard = RequestScope::enter(UnitId::next());
    let seen = std::thread::spawn(RequestScope::current).join().unwrap();
    assert_eq!(seen, None);
  }
}
