//! # the-controller
//!
//! The controller behind the sheet and diagram editors. It holds the
//! document model, the read-only flag and the change listener, and turns
//! every extensible operation into a topic dispatch over
//! [`the_middleware`] chains. Handlers receive a [`RunContext`], which gives
//! them the run arguments and a handle back to the controller.
//!
//! ```rust
//! use the_controller::{
//!   Args,
//!   Controller,
//!   ControllerOptions,
//!   SheetPlugin,
//!   Value,
//! };
//!
//! let controller: Controller<()> = Controller::new(
//!   ControllerOptions::new().with_plugins(
//!     SheetPlugin::new().with("getValue", |ctx, _next| {
//!       if ctx.is_read_only() {
//!         return Ok(Value::Null);
//!       }
//!       Ok(ctx.args().prop_key().map(Value::from).unwrap_or_default())
//!     }),
//!   ),
//! );
//!
//! assert_eq!(controller.get_value("foo", None).unwrap(), "foo");
//! assert_eq!(controller.run("unknown", Some(Args::new())).unwrap(), Value::Null);
//! ```

mod args;
mod config;
mod context;
mod controller;
mod model;

pub use args::{
  Args,
  PROP_KEY,
};
pub use config::{
  ConfigError,
  ControllerConfig,
};
pub use context::RunContext;
pub use controller::{
  ChangeCallback,
  Controller,
  ControllerError,
  ControllerOptions,
  OnChange,
  Result,
  SheetMiddleware,
  SheetPlugin,
};
pub use model::DocModel;
pub use serde_json::Value;
pub use the_middleware::Topic;
