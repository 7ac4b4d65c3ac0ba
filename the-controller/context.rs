use std::{
  cell::Ref,
  fmt,
};

use serde_json::Value;
use the_middleware::Topic;

use crate::{
  Args,
  ChangeCallback,
  Controller,
  DocModel,
  controller::Result,
};

/// What a handler sees while its chain runs: the controller that dispatched
/// it, the topic being run and the arguments of this run.
pub struct RunContext<D> {
  controller: Controller<D>,
  topic:      Topic,
  args:       Args,
}

impl<D> RunContext<D> {
  pub(crate) fn new(controller: Controller<D>, topic: Topic, args: Args) -> Self {
    Self {
      controller,
      topic,
      args,
    }
  }

  pub fn controller(&self) -> &Controller<D> {
    &self.controller
  }

  pub fn topic(&self) -> &Topic {
    &self.topic
  }

  pub fn args(&self) -> &Args {
    &self.args
  }

  pub fn is_read_only(&self) -> bool {
    self.controller.is_read_only()
  }

  /// Dispatch another topic on the same controller.
  pub fn run(&self, topic: impl AsRef<str>, arg: Option<Args>) -> Result<Value> {
    self.controller.run(topic, arg)
  }

  pub fn get_value(&self, prop_key: impl Into<String>, arg: Option<Args>) -> Result<Value> {
    self.controller.get_value(prop_key, arg)
  }

  pub fn change(&self, doc_model: D, callback: Option<ChangeCallback>) -> Result<()> {
    self.controller.change(doc_model, callback)
  }
}

impl<D: DocModel> RunContext<D> {
  pub fn model(&self) -> Result<Ref<'_, D::Sheet>> {
    self.controller.model()
  }
}

impl<D> fmt::Debug for RunContext<D> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RunContext")
      .field("topic", &self.topic)
      .field("args", &self.args)
      .finish_non_exhaustive()
  }
}
