use std::{
  collections::{
    HashMap,
    hash_map::Entry,
  },
  fmt,
};

use crate::{
  Chain,
  Handler,
  RegisterPlugin,
  Topic,
  compose,
};

/// Topic to handler-list mapping.
///
/// Lists are append-only: handlers land in registration order and are never
/// removed or reordered afterwards.
pub struct Middleware<Ctx, Out> {
  topics: HashMap<Topic, Vec<Handler<Ctx, Out>>>,
}

impl<Ctx, Out> Middleware<Ctx, Out> {
  pub fn new() -> Self {
    Self {
      topics: HashMap::new(),
    }
  }

  /// Register a plugin, a sequence of plugins or nothing at all.
  pub fn register(&mut self, plugins: impl RegisterPlugin<Ctx, Out>) {
    plugins.register_into(self);
  }

  /// Append a single handler to `topic`.
  pub fn push(&mut self, topic: impl Into<Topic>, handler: Handler<Ctx, Out>) {
    let entry = self.topics.entry(topic.into());
    let position = match &entry {
      Entry::Occupied(handlers) => handlers.get().len(),
      Entry::Vacant(_) => 0,
    };
    tracing::trace!(topic = %entry.key(), position, "registering middleware handler");
    entry.or_default().push(handler);
  }

  /// Handlers for `topic` in registration order; empty if unknown.
  pub fn handlers(&self, topic: &str) -> &[Handler<Ctx, Out>] {
    self.topics.get(topic).map(Vec::as_slice).unwrap_or_default()
  }

  pub fn len(&self, topic: &str) -> usize {
    self.handlers(topic).len()
  }

  pub fn contains(&self, topic: &str) -> bool {
    self.topics.contains_key(topic)
  }

  pub fn topics(&self) -> impl Iterator<Item = &Topic> {
    self.topics.keys()
  }

  /// Compose the current handler list of `topic`.
  pub fn compose(&self, topic: &str) -> Chain<'_, Ctx, Out> {
    compose(self.handlers(topic))
  }
}

impl<Ctx, Out> Default for Middleware<Ctx, Out> {
  fn default() -> Self {
    Self::new()
  }
}

impl<Ctx, Out> fmt::Debug for Middleware<Ctx, Out> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut map = f.debug_map();
    for (topic, handlers) in &self.topics {
      map.entry(topic, &handlers.len());
    }
    map.finish()
  }
}
