use fibre_di::{
  object, Args, ClassMeta, ContainerBuilder, Error, Instance, Result, Scope, Service, Signature,
  Value,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

static SESSIONS: AtomicUsize = AtomicUsize::new(0);

// --- Services ---
struct Session {
  id: usize,
}

impl Service for Session {
  fn invoke(&self, method: &str, _args: Args) -> Result<Value> {
    match method {
      "id" => Ok(Value::Int(self.id as i64)),
      other => Err(Error::invocation(other, "unknown method")),
    }
  }
}

// A singleton that holds on to a request-scoped session.
struct Handler {
  session: Instance,
}

impl Handler {
  fn handle(&self, request: usize) -> Result<String> {
    let id = self.session.invoke("id", Args::default())?;
    Ok(format!("request {} served by session {:?}", request, id))
  }
}

impl Service for Handler {}

fn main() -> Result<()> {
  let container = ContainerBuilder::new()
    .register_class(ClassMeta::new("Session", |_| {
      Ok(Arc::new(Session {
        id: SESSIONS.fetch_add(1, Ordering::SeqCst) + 1,
      }))
    }))
    .register_class(
      ClassMeta::new("Handler", |args| {
        Ok(Arc::new(Handler {
          session: args.object(0)?,
        }))
      })
      .constructor(Signature::new().class("session", "Session")),
    )
    .add_definition("Session", object("Session").scope(Scope::Request))
    .build()?;

  let handler = container.get_as::<Handler>("Handler")?;

  // Each thread runs one unit of work; the handler sees that unit's session.
  thread::scope(|s| {
    for request in 1..=3 {
      let container = container.clone();
      let handler = handler.clone();
      s.spawn(move || {
        let _request = container.begin_request();
        match handler.handle(request) {
          Ok(line) => println!("{}", line),
          Err(e) => eprintln!("request {} failed: {}", request, e),
        }
      });
    }
  });

  println!("live request instances: {}", container.request_instance_count());
  Ok(())
}
