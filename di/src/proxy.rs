//! Virtual proxies and deferred objects.
//!
//! A proxy stands in for a service that has not been built yet. It implements
//! the same [`Service`] surface as the real object, builds it on the first
//! capability call and forwards every call from then on.

use crate::container::WeakContainer;
use crate::error::{Error, Result};
use crate::scope::RequestScope;
use crate::value::{Args, Instance, Service, Value};
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use tracing::trace;

/// Builds the real instance behind a proxy.
pub type Initializer = Box<dyn Fn() -> Result<Instance> + Send + Sync>;

enum ProxyState {
  Idle,
  Initializing(ThreadId),
  Ready(Instance),
}

/// A proxy that builds its target at most once, on first use.
///
/// A failed initialization leaves the proxy idle so the next call retries.
/// Calling into the proxy from its own initializer is a dependency cycle and
/// fails instead of deadlocking; other threads wait for the initializer.
pub struct LazyProxy {
  label: String,
  initializer: Initializer,
  state: Mutex<ProxyState>,
  ready: Condvar,
}

impl LazyProxy {
  pub fn new(label: impl Into<String>, initializer: Initializer) -> Self {
    Self {
      label: label.into(),
      initializer,
      state: Mutex::new(ProxyState::Idle),
      ready: Condvar::new(),
    }
  }

  pub fn label(&self) -> &str {
    &self.label
  }

  pub fn is_initialized(&self) -> bool {
    matches!(*self.state.lock(), ProxyState::Ready(_))
  }

  /// The target, building it if this is the first use.
  pub fn instance(&self) -> Result<Instance> {
    let me = thread::current().id();
    let mut state = self.state.lock();
    loop {
      let must_wait = match &*state {
        ProxyState::Ready(instance) => return Ok(instance.clone()),
        ProxyState::Initializing(owner) if *owner == me => {
          return Err(Error::CircularDependency {
            chain: format!("{} (used by its own initializer)", self.label),
          })
        }
        ProxyState::Initializing(_) => true,
        ProxyState::Idle => false,
      };
      if !must_wait {
        break;
      }
      self.ready.wait(&mut state);
    }
    *state = ProxyState::Initializing(me);
    drop(state);

    trace!(proxy = %self.label, "initializing lazy proxy");
    let result = (self.initializer)();

    let mut state = self.state.lock();
    *state = match &result {
      Ok(instance) => ProxyState::Ready(instance.clone()),
      Err(_) => ProxyState::Idle,
    };
    self.ready.notify_all();
    result
  }
}

impl Service for LazyProxy {
  fn invoke(&self, method: &str, args: Args) -> Result<Value> {
    self.instance()?.invoke(method, args)
  }

  fn set_property(&self, name: &str, value: Value) -> Result<()> {
    self.instance()?.set_property(name, value)
  }

  fn target(&self) -> Result<Option<Instance>> {
    self.instance().map(Some)
  }
}

/// A proxy resolving to one instance per unit of work.
///
/// Instances live in the container, keyed by unit and entry name, so every
/// proxy for the same entry within one unit reaches the same object.
pub struct RequestProxy {
  name: String,
  container: WeakContainer,
  initializer: Initializer,
}

impl RequestProxy {
  pub fn instance(&self) -> Result<Instance> {
    let unit = RequestScope::current().ok_or_else(|| Error::NoActiveRequest {
      name: self.name.clone(),
    })?;
    let container = self.container.upgrade(&self.name)?;
    container.request_instance(unit, &self.name, || (self.initializer)())
  }

  pub fn name(&self) -> &str {
    &self.name
  }
}

impl Service for RequestProxy {
  fn invoke(&self, method: &str, args: Args) -> Result<Value> {
    self.instance()?.invoke(method, args)
  }

  fn set_property(&self, name: &str, value: Value) -> Result<()> {
    self.instance()?.set_property(name, value)
  }

  fn target(&self) -> Result<Option<Instance>> {
    self.instance().map(Some)
  }
}

/// Property and method injection still to be applied to an instance.
pub type Injection = Box<dyn FnOnce(&Instance) -> Result<()> + Send>;

enum Wiring {
  Pending(Injection),
  Running(ThreadId),
  Done,
  Failed(String),
}

/// An object whose identity exists before it is fully wired.
///
/// A singleton under construction is published as this wrapper before its
/// injection runs, so a property or method cycle back to it resolves to the
/// same identity. The injection runs exactly once. Calls from the wiring
/// thread pass straight through; other threads wait until wiring finishes.
/// A failed injection is permanent and every later call reports it.
pub struct DeferredObject {
  label: String,
  inner: Instance,
  state: Mutex<Wiring>,
  wired: Condvar,
}

impl DeferredObject {
  pub fn new(label: impl Into<String>, inner: Instance, injection: Injection) -> Self {
    Self {
      label: label.into(),
      inner,
      state: Mutex::new(Wiring::Pending(injection)),
      wired: Condvar::new(),
    }
  }

  pub fn is_wired(&self) -> bool {
    matches!(*self.state.lock(), Wiring::Done)
  }

  /// Applies the pending injection if it has not run yet.
  pub fn complete(&self) -> Result<()> {
    let me = thread::current().id();
    let mut state = self.state.lock();
    let injection = loop {
      match std::mem::replace(&mut *state, Wiring::Running(me)) {
        Wiring::Pending(injection) => break injection,
        Wiring::Running(owner) if owner == me => {
          *state = Wiring::Running(owner);
          return Ok(());
        }
        Wiring::Running(owner) => {
          *state = Wiring::Running(owner);
          self.wired.wait(&mut state);
        }
        Wiring::Done => {
          *state = Wiring::Done;
          return Ok(());
        }
        Wiring::Failed(message) => {
          let err = Error::invocation(self.label.as_str(), message.as_str());
          *state = Wiring::Failed(message);
          return Err(err);
        }
      }
    };
    drop(state);

    trace!(object = %self.label, "applying deferred injection");
    let result = injection(&self.inner);

    let mut state = self.state.lock();
    *state = match &result {
      Ok(()) => Wiring::Done,
      Err(e) => Wiring::Failed(format!("wiring failed: {}", e)),
    };
    self.wired.notify_all();
    result
  }
}

impl Service for DeferredObject {
  fn invoke(&self, method: &str, args: Args) -> Result<Value> {
    self.complete()?;
    self.inner.invoke(method, args)
  }

  fn set_property(&self, name: &str, value: Value) -> Result<()> {
    self.complete()?;
    self.inner.set_property(name, value)
  }

  fn target(&self) -> Result<Option<Instance>> {
    self.complete()?;
    Ok(Some(self.inner.clone()))
  }
}

/// Creates the proxies handed out for lazy and request-scoped bindings.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProxyFactory;

impl ProxyFactory {
  pub fn lazy(&self, label: &str, initializer: Initializer) -> Instance {
    Arc::new(LazyProxy::new(label, initializer))
  }

  pub fn request(&self, name: &str, container: WeakContainer, initializer: Initializer) -> Instance {
    Arc::new(RequestProxy {
      name: name.to_owned(),
      container,
      initializer,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::{OnceLock, Weak};

  struct Counter {
    hits: AtomicUsize,
  }

  impl Service for Counter {
    fn invoke(&self, method: &str, _args: Args) -> Result<Value> {
      match method {
        "hit" => Ok(Value::Int(self.hits.fetch_add(1, Ordering::SeqCst) as i64 + 1)),
        other => Err(Error::invocation(other, "unknown method")),
      }
    }
  }

  fn counting_proxy(builds: Arc<AtomicUsize>) -> LazyProxy {
    LazyProxy::new(
      "counter",
      Box::new(move || {
        builds.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(Counter {
          hits: AtomicUsize::new(0),
        }) as Instance)
      }),
    )
  }

  #[test]
  fn lazy_proxy_builds_once_on_first_call() {
    let builds = Arc::new(AtomicUsize::new(0));
    let proxy = counting_proxy(builds.clone());
    assert!(!proxy.is_initialized());
    assert_eq!(builds.load(Ordering::SeqCst), 0);

    for expected in 1..=3 {
      let hits = proxy.invoke("hit", Args::default()).unwrap();
      assert_eq!(hits, Value::Int(expected));
    }
    assert_eq!(builds.load(Ordering::SeqCst), 1);
    assert!(proxy.is_initialized());
  }

  #[test]
  fn lazy_proxy_builds_once_under_concurrency() {
    let builds = Arc::new(AtomicUsize::new(0));
    let proxy = Arc::new(counting_proxy(builds.clone()));
    thread::scope(|s| {
      for _ in 0..8 {
        let proxy = proxy.clone();
        s.spawn(move || proxy.invoke("hit", Args::default()).unwrap());
      }
    });
    assert_eq!(builds.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn failed_initialization_is_retried() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let seen = attempts.clone();
    let proxy = LazyProxy::new(
      "flaky",
      Box::new(move || {
        if seen.fetch_add(1, Ordering::SeqCst) == 0 {
          Err(Error::invocation("flaky", "not yet"))
        } else {
          Ok(Arc::new(Counter {
            hits: AtomicUsize::new(0),
          }) as Instance)
        }
      }),
    );
    assert!(proxy.target().is_err());
    assert!(proxy.target().unwrap().is_some());
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
  }

  fn deferred_counter(runs: Arc<AtomicUsize>, fail: bool) -> DeferredObject {
    DeferredObject::new(
      "counter",
      Arc::new(Counter {
        hits: AtomicUsize::new(0),
      }),
      Box::new(move |_| {
        runs.fetch_add(1, Ordering::SeqCst);
        if fail {
          Err(Error::invocation("counter", "no such property"))
        } else {
          Ok(())
        }
      }),
    )
  }

  #[test]
  fn deferred_injection_runs_once() {
    let runs = Arc::new(AtomicUsize::new(0));
    let deferred = deferred_counter(runs.clone(), false);
    assert!(!deferred.is_wired());
    deferred.invoke("hit", Args::default()).unwrap();
    deferred.complete().unwrap();
    deferred.invoke("hit", Args::default()).unwrap();
    assert!(deferred.is_wired());
    assert_eq!(runs.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn deferred_object_is_usable_from_its_own_injection() {
    let slot: Arc<OnceLock<Weak<DeferredObject>>> = Arc::new(OnceLock::new());
    let seen = Arc::new(Mutex::new(None));
    let deferred = Arc::new(DeferredObject::new(
      "counter",
      Arc::new(Counter {
        hits: AtomicUsize::new(0),
      }),
      Box::new({
        let (slot, seen) = (slot.clone(), seen.clone());
        move |_| {
          let wrapper = slot
            .get()
            .and_then(Weak::upgrade)
            .ok_or_else(|| Error::invocation("counter", "wrapper dropped"))?;
          // Mid-wiring: a call through the wrapper must not block or rerun.
          *seen.lock() = Some(wrapper.invoke("hit", Args::default())?);
          Ok(())
        }
      }),
    ));
    slot.set(Arc::downgrade(&deferred)).ok();

    deferred.complete().unwrap();
    assert_eq!(*seen.lock(), Some(Value::Int(1)));
    assert!(deferred.is_wired());
  }

  #[test]
  fn failed_injection_is_reported_on_every_call() {
    let runs = Arc::new(AtomicUsize::new(0));
    let deferred = deferred_counter(runs.clone(), true);
    assert!(deferred.complete().is_err());
    assert!(matches!(
      deferred.invoke("hit", Args::default()),
      Err(Error::Invocation { .. })
    ));
    assert!(!deferred.is_wired());
    assert_eq!(runs.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn other_threads_wait_for_wiring_to_finish() {
    let (started_tx, started_rx) = std::sync::mpsc::channel();
    let (release_tx, release_rx) = std::sync::mpsc::channel::<()>();
    let deferred = Arc::new(DeferredObject::new(
      "slow",
      Arc::new(Counter {
        hits: AtomicUsize::new(0),
      }),
      Box::new(move |_| {
        started_tx.send(()).ok();
        release_rx.recv().ok();
        Ok(())
      }),
    ));

    thread::scope(|s| {
      let wiring = deferred.clone();
      s.spawn(move || wiring.complete().unwrap());
      started_rx.recv().unwrap();

      let waiting = deferred.clone();
      let caller = s.spawn(move || {
        let hits = waiting.invoke("hit", Args::default()).unwrap();
        (hits, waiting.is_wired())
      });
      release_tx.send(()).unwrap();
      assert_eq!(caller.join().unwrap(), (Value::Int(1), true));
    });
  }
}
