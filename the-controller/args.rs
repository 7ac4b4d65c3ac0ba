use serde_json::{
  Map,
  Value,
};

use crate::ControllerError;

/// Property name `get_value` stores the requested key under.
pub const PROP_KEY: &str = "propKey";

/// Arguments a topic is run with.
///
/// A JSON object of caller-supplied properties, plus the error being reported
/// when the topic is `captureError`.
#[derive(Debug, Default)]
pub struct Args {
  props: Map<String, Value>,
  error: Option<anyhow::Error>,
}

impl Args {
  pub fn new() -> Self {
    Self::default()
  }

  /// Arguments for a `captureError` dispatch.
  pub fn from_error(error: anyhow::Error) -> Self {
    Self {
      props: Map::new(),
      error: Some(error),
    }
  }

  #[must_use]
  pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
    self.insert(key, value);
    self
  }

  pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
    self.props.insert(key.into(), value.into())
  }

  pub fn get(&self, key: &str) -> Option<&Value> {
    self.props.get(key)
  }

  /// The `propKey` of a `getValue` dispatch.
  pub fn prop_key(&self) -> Option<&str> {
    self.get(PROP_KEY).and_then(Value::as_str)
  }

  pub fn props(&self) -> &Map<String, Value> {
    &self.props
  }

  pub fn error(&self) -> Option<&anyhow::Error> {
    self.error.as_ref()
  }

  pub fn into_props(self) -> Map<String, Value> {
    self.props
  }
}

impl From<Map<String, Value>> for Args {
  fn from(props: Map<String, Value>) -> Self {
    Self { props, error: None }
  }
}

impl TryFrom<Value> for Args {
  type Error = ControllerError;

  fn try_from(value: Value) -> Result<Self, Self::Error> {
    match value {
      Value::Object(props) => Ok(props.into()),
      Value::Null => Ok(Self::default()),
      other => Err(ControllerError::ArgsNotAnObject(other)),
    }
  }
}

#[cfg(test)]
mod tests {
  use serde_json::json;

  use super::*;

  #[test]
  fn prop_key_reads_string_only() {
    assert_eq!(Args::new().with(PROP_KEY, "width").prop_key(), Some("width"));
    assert_eq!(Args::new().with(PROP_KEY, 3).prop_key(), None);
    assert_eq!(Args::new().prop_key(), None);
  }

  #[test]
  fn try_from_value() {
    let args = Args::try_from(json!({ "a": 1 })).unwrap();
    assert_eq!(args.get("a"), Some(&json!(1)));
    assert!(Args::try_from(Value::Null).unwrap().props().is_empty());
    assert!(matches!(
      Args::try_from(json!([1, 2])),
      Err(ControllerError::ArgsNotAnObject(_))
    ));
  }

  #[test]
  fn from_error_keeps_error() {
    let args = Args::from_error(anyhow::anyhow!("broken"));
    assert_eq!(args.error().map(ToString::to_string).as_deref(), Some("broken"));
    assert!(args.props().is_empty());
  }
}
