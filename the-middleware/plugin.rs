//! Typed plugins: one handler per topic, registered as a unit.

use std::fmt;

use indexmap::IndexMap;

use crate::{
  Handler,
  Middleware,
  Next,
  Topic,
};

/// A set of handlers contributed under distinct topics.
///
/// Topics keep their insertion order, which is the order they are appended
/// to the [`Middleware`] on registration. Adding a topic twice replaces the
/// earlier handler in place.
pub struct Plugin<Ctx, Out> {
  handlers: IndexMap<Topic, Handler<Ctx, Out>>,
}

impl<Ctx, Out> Plugin<Ctx, Out> {
  pub fn new() -> Self {
    Self {
      handlers: IndexMap::new(),
    }
  }

  /// Builder form of [`Plugin::insert`].
  #[must_use]
  pub fn with<F>(mut self, topic: impl Into<Topic>, handler: F) -> Self
  where
    F: Fn(&Ctx, Next<'_, Ctx, Out>) -> anyhow::Result<Out> + 'static,
  {
    self.insert(topic, Box::new(handler));
    self
  }

  /// Set the handler for `topic`, returning the one it replaced.
  pub fn insert(
    &mut self,
    topic: impl Into<Topic>,
    handler: Handler<Ctx, Out>,
  ) -> Option<Handler<Ctx, Out>> {
    self.handlers.insert(topic.into(), handler)
  }

  pub fn len(&self) -> usize {
    self.handlers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.handlers.is_empty()
  }

  pub fn contains(&self, topic: &str) -> bool {
    self.handlers.contains_key(topic)
  }

  pub fn topics(&self) -> impl Iterator<Item = &Topic> {
    self.handlers.keys()
  }
}

impl<Ctx, Out> Default for Plugin<Ctx, Out> {
  fn default() -> Self {
    Self::new()
  }
}

impl<Ctx, Out> fmt::Debug for Plugin<Ctx, Out> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Plugin")
      .field("topics", &self.handlers.keys().collect::<Vec<_>>())
      .finish()
  }
}

impl<Ctx, Out> IntoIterator for Plugin<Ctx, Out> {
  type Item = (Topic, Handler<Ctx, Out>);
  type IntoIter = indexmap::map::IntoIter<Topic, Handler<Ctx, Out>>;

  fn into_iter(self) -> Self::IntoIter {
    self.handlers.into_iter()
  }
}

/// Anything that can be registered into a [`Middleware`].
///
/// Sequences register their elements depth-first in order and `None`
/// registers nothing, so plugin lists may nest and carry optional entries.
pub trait RegisterPlugin<Ctx, Out> {
  fn register_into(self, middleware: &mut Middleware<Ctx, Out>);
}

impl<Ctx, Out> RegisterPlugin<Ctx, Out> for Plugin<Ctx, Out> {
  fn register_into(self, middleware: &mut Middleware<Ctx, Out>) {
    for (topic, handler) in self {
      middleware.push(topic, handler);
    }
  }
}

impl<Ctx, Out, P> RegisterPlugin<Ctx, Out> for Option<P>
where
  P: RegisterPlugin<Ctx, Out>,
{
  fn register_into(self, middleware: &mut Middleware<Ctx, Out>) {
    if let Some(plugin) = self {
      plugin.register_into(middleware);
    }
  }
}

impl<Ctx, Out, P> RegisterPlugin<Ctx, Out> for Vec<P>
where
  P: RegisterPlugin<Ctx, Out>,
{
  fn register_into(self, middleware: &mut Middleware<Ctx, Out>) {
    for plugin in self {
      plugin.register_into(middleware);
    }
  }
}

impl<Ctx, Out, P, const N: usize> RegisterPlugin<Ctx, Out> for [P; N]
where
  P: RegisterPlugin<Ctx, Out>,
{
  fn register_into(self, middleware: &mut Middleware<Ctx, Out>) {
    for plugin in self {
      plugin.register_into(middleware);
    }
  }
}

/// Build a [`Plugin`] from `topic => handler` pairs.
///
/// The context and output types come first so handler closures can be
/// written without annotations:
///
/// ```rust
/// use the_middleware::plugin;
///
/// let plugin = plugin!(String, usize;
///   "length" => |ctx, _next| Ok(ctx.len()),
/// );
/// assert!(plugin.contains("length"));
/// ```
#[macro_export]
macro_rules! plugin {
  ($ctx:ty, $out:ty; $( $topic:expr => $handler:expr ),* $(,)?) => {{
    let plugin = $crate::Plugin::<$ctx, $out>::new();
    $(
      let plugin = plugin.with($topic, $handler);
    )*
    plugin
  }};
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn with_keeps_insertion_order() {
    let plugin = Plugin::<(), i32>::new()
      .with("b", |_, _| Ok(1))
      .with("a", |_, _| Ok(2))
      .with("c", |_, _| Ok(3));

    let topics: Vec<_> = plugin.topics().map(Topic::as_str).collect();
    assert_eq!(topics, vec!["b", "a", "c"]);
  }

  #[test]
  fn same_topic_replaces_in_place() {
    let mut plugin = Plugin::<(), i32>::new()
      .with("a", |_, _| Ok(1))
      .with("b", |_, _| Ok(2));

    let replaced = plugin.insert("a", crate::handler(|_, _| Ok(3)));
    assert!(replaced.is_some());
    assert_eq!(plugin.len(), 2);

    let (topic, handler) = plugin.into_iter().next().unwrap();
    assert_eq!(topic, "a");
    let handlers = vec![handler];
    assert_eq!(crate::compose(&handlers).run(&(), None).unwrap(), 3);
  }

  #[test]
  fn macro_builds_plugin() {
    let plugin = plugin!((), i32;
      "one" => |_, _| Ok(1),
      "two" => |_, next| next.call(),
    );
    assert_eq!(plugin.len(), 2);
    assert!(plugin.contains("one"));
    assert!(!plugin.contains("three"));
  }
}
