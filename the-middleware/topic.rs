use std::{
  borrow::{
    Borrow,
    Cow,
  },
  fmt,
};

/// Name of an extension point that plugins contribute handlers to.
///
/// Topics form an open set. The well-known ones are exposed as constants;
/// anything else a plugin invents is just as valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Topic(Cow<'static, str>);

impl Topic {
  /// Resolves a property value for a `propKey`.
  pub const GET_VALUE: Topic = Topic::from_static("getValue");
  /// Receives errors raised by other topics' handlers.
  pub const CAPTURE_ERROR: Topic = Topic::from_static("captureError");

  pub const fn from_static(name: &'static str) -> Self {
    Self(Cow::Borrowed(name))
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Topic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl From<&'static str> for Topic {
  fn from(name: &'static str) -> Self {
    Self::from_static(name)
  }
}

impl From<String> for Topic {
  fn from(name: String) -> Self {
    Self(Cow::Owned(name))
  }
}

impl From<&Topic> for Topic {
  fn from(topic: &Topic) -> Self {
    topic.clone()
  }
}

impl Borrow<str> for Topic {
  fn borrow(&self) -> &str {
    &self.0
  }
}

impl AsRef<str> for Topic {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

impl PartialEq<str> for Topic {
  fn eq(&self, other: &str) -> bool {
    self.0 == other
  }
}

impl PartialEq<&str> for Topic {
  fn eq(&self, other: &&str) -> bool {
    self.0 == *other
  }
}

#[cfg(test)]
mod tests {
  use std::collections::HashMap;

  use super::*;

  #[test]
  fn static_and_owned_topics_compare_equal() {
    let owned = Topic::from(String::from("getValue"));
    assert_eq!(owned, Topic::GET_VALUE);
    assert_eq!(Topic::CAPTURE_ERROR, "captureError");
  }

  #[test]
  fn topic_map_lookup_by_str() {
    let mut map = HashMap::new();
    map.insert(Topic::from("custom"), 1);
    assert_eq!(map.get("custom"), Some(&1));
    assert_eq!(map.get("missing"), None);
  }
}
