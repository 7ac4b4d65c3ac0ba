//! # the-middleware
//!
//! Topic-keyed middleware chains for composing plugin behavior.
//!
//! ## Core Concepts
//!
//! - **Topics**: Named extension points (`getValue`, `captureError`, or
//!   anything a plugin invents)
//! - **Handlers**: Closures receiving a context and a [`Next`] continuation
//! - **Plugins**: One handler per topic, registered as a unit
//! - **Middleware**: Append-only topic → handler-list mapping
//! - **Chains**: A topic's handlers composed front to back; a handler either
//!   delegates with `next.call()` or returns early
//!
//! ## Basic Usage
//!
//! ```rust
//! use the_middleware::{
//!   Middleware,
//!   Plugin,
//! };
//!
//! let mut middleware = Middleware::<i32, i32>::new();
//!
//! middleware.register(vec![
//!   Plugin::<i32, i32>::new().with("x", |_, next| Ok(next.call()? + 1)),
//!   Plugin::<i32, i32>::new().with("x", |ctx, _| Ok(*ctx * 10)),
//! ]);
//!
//! let out = middleware.compose("x").run(&1, None).unwrap();
//! assert_eq!(out, 11);
//! ```
//!
//! ## Short-circuiting
//!
//! A handler that never calls its continuation ends the chain, and its return
//! value becomes the result:
//!
//! ```rust
//! use the_middleware::{
//!   Middleware,
//!   Plugin,
//! };
//!
//! let mut middleware = Middleware::<bool, &'static str>::new();
//! middleware.register([
//!   Plugin::<bool, &str>::new().with("save", |read_only, next| {
//!     if *read_only { Ok("refused") } else { next.call() }
//!   }),
//!   Plugin::<bool, &str>::new().with("save", |_, _| Ok("saved")),
//! ]);
//!
//! assert_eq!(middleware.compose("save").run(&true, None).unwrap(), "refused");
//! assert_eq!(middleware.compose("save").run(&false, None).unwrap(), "saved");
//! ```
//!
//! ## Continuations
//!
//! `next` may be called at most once per handler. Calling it again fails with
//! [`ChainError::NextCalledMultipleTimes`], tracked per [`Chain::run`] call.

mod chain;
mod plugin;
mod registry;
mod topic;

pub use chain::{
  Chain,
  ChainError,
  FinalNext,
  Handler,
  Next,
  compose,
  handler,
};
pub use plugin::{
  Plugin,
  RegisterPlugin,
};
pub use registry::Middleware;
pub use topic::Topic;
