use super::{kind_mismatch, DefinitionResolver, Params};
use crate::container::Container;
use crate::definition::{Definition, DefinitionEntry, DefinitionKind};
use crate::error::{Error, Result};
use crate::value::Value;
use once_cell::sync::Lazy;
use regex::Regex;

static PLACEHOLDER: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"\{([^{}]+)\}").expect("placeholder pattern is valid"));

/// Interpolates `{name}` placeholders with the string form of other entries.
#[derive(Debug, Default, Clone, Copy)]
pub struct StringResolver;

impl DefinitionResolver for StringResolver {
  fn resolve(&self, container: &Container, entry: &DefinitionEntry, _params: &Params) -> Result<Value> {
    let Definition::String(template) = &entry.definition else {
      return Err(kind_mismatch(entry, DefinitionKind::String));
    };

    let mut output = String::with_capacity(template.len());
    let mut last = 0;
    for captures in PLACEHOLDER.captures_iter(template) {
      let (Some(whole), Some(name)) = (captures.get(0), captures.get(1)) else {
        continue;
      };
      output.push_str(&template[last..whole.start()]);
      output.push_str(&interpolate(container, entry, template, name.as_str())?);
      last = whole.end();
    }
    output.push_str(&template[last..]);
    Ok(Value::Str(output))
  }
}

fn interpolate(container: &Container, entry: &DefinitionEntry, template: &str, name: &str) -> Result<String> {
  let value = container.get(name).map_err(|e| match e {
    Error::NotFound { .. } => Error::definition(
      entry.name.as_str(),
      format!("placeholder '{{{}}}' in \"{}\" cannot be resolved", name, template),
    ),
    other => other,
  })?;
  value.to_template_string().ok_or_else(|| {
    Error::definition(
      entry.name.as_str(),
      format!(
        "placeholder '{{{}}}' resolves to a {}, which has no string form",
        name,
        value.kind()
      ),
    )
  })
}
