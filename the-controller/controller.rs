//! Controller shell: owns the middleware, the document and change listeners.
//!
//! Every extensible operation is a topic dispatch. Handler failures are not
//! special-cased either: they are redirected into the `captureError` topic so
//! plugins decide how errors surface.
//!
//! Handlers receive a [`RunContext`] that holds a handle to the same
//! controller, so a plugin can consult the read-only flag, read the document,
//! apply a change or dispatch another topic. The state behind the handle is
//! shared, which is why the document and listener sit behind `RefCell`s.

use std::{
  cell::{
    Cell,
    Ref,
    RefCell,
  },
  fmt,
  rc::Rc,
};

use serde_json::Value;
use the_middleware::{
  Middleware,
  Plugin,
  RegisterPlugin,
  Topic,
};
use thiserror::Error;

use crate::{
  Args,
  ControllerConfig,
  DocModel,
  RunContext,
  args::PROP_KEY,
};

pub type SheetPlugin<D> = Plugin<RunContext<D>, Value>;
pub type SheetMiddleware<D> = Middleware<RunContext<D>, Value>;

/// Invoked by whoever applies a model change, once it has been applied.
pub type ChangeCallback = Box<dyn FnOnce()>;

/// Listener notified on every [`Controller::change`].
pub type OnChange<D> = Box<dyn FnMut(&D, Option<ChangeCallback>)>;

#[derive(Debug, Error)]
pub enum ControllerError {
  #[error("no document model is loaded")]
  NoDocModel,
  #[error("document model is borrowed elsewhere")]
  ModelInUse,
  #[error("run arguments must be a JSON object, got {0}")]
  ArgsNotAnObject(Value),
  #[error("captureError handler failed: {source:#}")]
  CaptureFailed { source: anyhow::Error },
  #[error("uncaptured error in topic {topic}: {source:#}")]
  Uncaptured {
    topic:  String,
    source: anyhow::Error,
  },
}

pub type Result<T> = std::result::Result<T, ControllerError>;

/// Construction options for a [`Controller`].
pub struct ControllerOptions<D> {
  middleware:                SheetMiddleware<D>,
  doc_model:                 Option<D>,
  read_only:                 bool,
  on_change:                 Option<OnChange<D>>,
  surface_uncaptured_errors: bool,
}

impl<D> ControllerOptions<D> {
  pub fn new() -> Self {
    Self {
      middleware:                Middleware::new(),
      doc_model:                 None,
      read_only:                 false,
      on_change:                 None,
      surface_uncaptured_errors: false,
    }
  }

  /// Plugins registered at construction, in order.
  #[must_use]
  pub fn with_plugins(mut self, plugins: impl RegisterPlugin<RunContext<D>, Value>) -> Self {
    self.middleware.register(plugins);
    self
  }

  #[must_use]
  pub fn with_doc_model(mut self, doc_model: D) -> Self {
    self.doc_model = Some(doc_model);
    self
  }

  #[must_use]
  pub fn with_read_only(mut self, read_only: bool) -> Self {
    self.read_only = read_only;
    self
  }

  #[must_use]
  pub fn with_on_change<F>(mut self, on_change: F) -> Self
  where
    F: FnMut(&D, Option<ChangeCallback>) + 'static,
  {
    self.on_change = Some(Box::new(on_change));
    self
  }

  #[must_use]
  pub fn with_surface_uncaptured_errors(mut self, surface: bool) -> Self {
    self.surface_uncaptured_errors = surface;
    self
  }

  #[must_use]
  pub fn with_config(self, config: ControllerConfig) -> Self {
    self
      .with_read_only(config.read_only)
      .with_surface_uncaptured_errors(config.surface_uncaptured_errors)
  }
}

impl<D> Default for ControllerOptions<D> {
  fn default() -> Self {
    Self::new()
  }
}

struct Core<D> {
  middleware:                SheetMiddleware<D>,
  read_only:                 Cell<bool>,
  doc_model:                 RefCell<Option<D>>,
  on_change:                 RefCell<Option<OnChange<D>>>,
  surface_uncaptured_errors: bool,
}

/// Handle to the controller state.
///
/// The caller owns one handle; every running chain holds another through its
/// [`RunContext`], which is dropped when the chain returns.
pub struct Controller<D> {
  core: Rc<Core<D>>,
}

impl<D> Controller<D> {
  pub fn new(options: ControllerOptions<D>) -> Self {
    let ControllerOptions {
      middleware,
      doc_model,
      read_only,
      on_change,
      surface_uncaptured_errors,
    } = options;

    Self {
      core: Rc::new(Core {
        middleware,
        read_only: Cell::new(read_only),
        doc_model: RefCell::new(doc_model),
        on_change: RefCell::new(on_change),
        surface_uncaptured_errors,
      }),
    }
  }

  /// Register more plugins after construction. Handlers are appended behind
  /// everything registered so far.
  pub fn register(&mut self, plugins: impl RegisterPlugin<RunContext<D>, Value>) {
    // Only running chains share the core, and they cannot outlive `&self`.
    match Rc::get_mut(&mut self.core) {
      Some(core) => core.middleware.register(plugins),
      None => tracing::error!("cannot register plugins while a chain holds the controller"),
    }
  }

  pub fn middleware(&self) -> &SheetMiddleware<D> {
    &self.core.middleware
  }

  pub fn is_read_only(&self) -> bool {
    self.core.read_only.get()
  }

  pub fn set_read_only(&self, read_only: bool) {
    self.core.read_only.set(read_only);
  }

  /// The current document, if one is loaded and not being replaced.
  pub fn doc_model(&self) -> Option<Ref<'_, D>> {
    let doc_model = self.core.doc_model.try_borrow().ok()?;
    Ref::filter_map(doc_model, Option::as_ref).ok()
  }

  /// Run the handler chain of `topic`.
  ///
  /// Unknown topics run an empty chain and yield `Value::Null`. A handler
  /// error is redirected to `captureError` and `run` then yields
  /// `Value::Null`; only a failing `captureError` chain is returned as an
  /// error (or an uncaptured one, when configured to surface those).
  pub fn run(&self, topic: impl AsRef<str>, arg: Option<Args>) -> Result<Value> {
    let topic = topic.as_ref();
    match self.dispatch(topic, arg.unwrap_or_default()) {
      Ok(value) => Ok(value),
      Err(source) if topic == Topic::CAPTURE_ERROR.as_str() => {
        Err(ControllerError::CaptureFailed { source })
      },
      Err(error) => self.capture_error(topic, error),
    }
  }

  /// Shorthand for running `getValue` with `propKey` set on `arg`.
  pub fn get_value(&self, prop_key: impl Into<String>, arg: Option<Args>) -> Result<Value> {
    let args = arg.unwrap_or_default().with(PROP_KEY, prop_key.into());
    self.run(Topic::GET_VALUE, Some(args))
  }

  /// Replace the document model and notify the change listener.
  ///
  /// Fails with [`ControllerError::ModelInUse`] while a borrow handed out by
  /// [`Controller::doc_model`] or [`Controller::model`] is still alive.
  pub fn change(&self, doc_model: D, callback: Option<ChangeCallback>) -> Result<()> {
    tracing::debug!(has_callback = callback.is_some(), "document model changed");
    {
      let mut current = self
        .core
        .doc_model
        .try_borrow_mut()
        .map_err(|_| ControllerError::ModelInUse)?;
      *current = Some(doc_model);
    }

    let mut on_change = self.core.on_change.borrow_mut();
    let Some(on_change) = on_change.as_mut() else {
      tracing::warn!("document model changed but no change listener is registered");
      return Ok(());
    };
    let doc_model = self.doc_model().ok_or(ControllerError::ModelInUse)?;
    on_change(&doc_model, callback);
    Ok(())
  }

  fn dispatch(&self, topic: &str, args: Args) -> anyhow::Result<Value> {
    let chain = self.core.middleware.compose(topic);
    if chain.is_empty() {
      tracing::warn!("the middleware function {topic} is not found!");
    }
    let ctx = RunContext::new(self.share(), Topic::from(topic.to_string()), args);
    chain.run(&ctx, None)
  }

  fn capture_error(&self, topic: &str, error: anyhow::Error) -> Result<Value> {
    if !self.core.middleware.contains(Topic::CAPTURE_ERROR.as_str()) {
      tracing::error!(%topic, "uncaptured middleware error: {error:#}");
      if self.core.surface_uncaptured_errors {
        return Err(ControllerError::Uncaptured {
          topic:  topic.to_string(),
          source: error,
        });
      }
    } else {
      tracing::debug!(%topic, "redirecting middleware error to captureError");
    }

    self
      .dispatch(Topic::CAPTURE_ERROR.as_str(), Args::from_error(error))
      .map(|_| Value::Null)
      .map_err(|source| ControllerError::CaptureFailed { source })
  }

  fn share(&self) -> Self {
    Self {
      core: Rc::clone(&self.core),
    }
  }
}

impl<D: DocModel> Controller<D> {
  /// The sheet currently being edited.
  pub fn model(&self) -> Result<Ref<'_, D::Sheet>> {
    let doc_model = self
      .core
      .doc_model
      .try_borrow()
      .map_err(|_| ControllerError::ModelInUse)?;
    Ref::filter_map(doc_model, |doc_model| {
      doc_model.as_ref().map(DocModel::current_sheet_model)
    })
    .map_err(|_| ControllerError::NoDocModel)
  }
}

impl<D> fmt::Debug for Controller<D> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let has_doc_model = self
      .core
      .doc_model
      .try_borrow()
      .map(|doc_model| doc_model.is_some())
      .unwrap_or(true);
    f.debug_struct("Controller")
      .field("middleware", &self.core.middleware)
      .field("read_only", &self.is_read_only())
      .field("has_doc_model", &has_doc_model)
      .field("surface_uncaptured_errors", &self.core.surface_uncaptured_errors)
      .finish_non_exhaustive()
  }
}

#[cfg(test)]
mod tests {
  use std::{
    cell::Cell,
    rc::Rc,
  };

  use super::*;

  fn controller(plugins: Vec<SheetPlugin<()>>) -> Controller<()> {
    Controller::new(ControllerOptions::new().with_plugins(plugins))
  }

  #[test]
  fn unknown_topic_yields_null() {
    let controller = controller(Vec::new());
    assert_eq!(controller.run("missing", None).unwrap(), Value::Null);
  }

  #[test]
  fn capture_error_runs_once() {
    let captured = Rc::new(Cell::new(0));
    let counter = captured.clone();

    let controller = controller(vec![
      SheetPlugin::new().with("explode", |_, _| Err(anyhow::anyhow!("boom"))),
      SheetPlugin::new().with(Topic::CAPTURE_ERROR, move |ctx, _| {
        let error = ctx.args().error().map(ToString::to_string);
        assert_eq!(error.as_deref(), Some("boom"));
        assert_eq!(ctx.topic(), "captureError");
        counter.set(counter.get() + 1);
        Ok(Value::Bool(true))
      }),
    ]);

    assert_eq!(controller.run("explode", None).unwrap(), Value::Null);
    assert_eq!(captured.get(), 1);
  }

  #[test]
  fn failing_capture_error_propagates() {
    let controller = controller(vec![
      SheetPlugin::new().with("explode", |_, _| Err(anyhow::anyhow!("boom"))),
      SheetPlugin::new().with(Topic::CAPTURE_ERROR, |_, _| Err(anyhow::anyhow!("capture broke"))),
    ]);

    let err = controller.run("explode", None).unwrap_err();
    assert!(matches!(err, ControllerError::CaptureFailed { .. }));
    assert!(err.to_string().contains("capture broke"));
  }

  #[test]
  fn uncaptured_error_dropped_by_default() {
    let controller = controller(vec![
      SheetPlugin::new().with("explode", |_, _| Err(anyhow::anyhow!("boom"))),
    ]);
    assert_eq!(controller.run("explode", None).unwrap(), Value::Null);
  }

  #[test]
  fn uncaptured_error_surfaced_when_configured() {
    let controller: Controller<()> = Controller::new(
      ControllerOptions::new()
        .with_surface_uncaptured_errors(true)
        .with_plugins(SheetPlugin::new().with("explode", |_, _| Err(anyhow::anyhow!("boom")))),
    );

    match controller.run("explode", None) {
      Err(ControllerError::Uncaptured { topic, source }) => {
        assert_eq!(topic, "explode");
        assert_eq!(source.to_string(), "boom");
      },
      other => panic!("expected uncaptured error, got {other:?}"),
    }
  }

  #[test]
  fn register_after_runs_succeeds() {
    let mut controller = controller(vec![SheetPlugin::new().with("x", |_, next| next.call())]);
    controller.run("x", None).unwrap();

    controller.register(SheetPlugin::new().with("x", |_, _| Ok(Value::from(2))));
    assert_eq!(controller.middleware().len("x"), 2);
    assert_eq!(controller.run("x", None).unwrap(), Value::from(2));
  }
}
