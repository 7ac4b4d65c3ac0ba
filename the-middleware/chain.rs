//! Composition of a topic's handlers into a single callable chain.
//!
//! A [`Chain`] borrows an ordered handler list and runs it front to back.
//! Each handler receives the shared context and a [`Next`] continuation; it
//! either calls [`Next::call`] to delegate to the rest of the chain or returns
//! on its own, which short-circuits everything downstream.

use std::cell::Cell;

use thiserror::Error;

/// A boxed middleware handler.
///
/// Handlers receive the run context and the continuation for the rest of the
/// chain. Errors propagate to the caller of [`Chain::run`] untouched.
pub type Handler<Ctx, Out> = Box<dyn Fn(&Ctx, Next<'_, Ctx, Out>) -> anyhow::Result<Out>>;

/// Continuation invoked once the last handler delegates past the end.
pub type FinalNext<'a, Ctx, Out> = &'a dyn Fn(&Ctx) -> anyhow::Result<Out>;

/// Box a closure as a [`Handler`].
pub fn handler<Ctx, Out, F>(f: F) -> Handler<Ctx, Out>
where
  F: Fn(&Ctx, Next<'_, Ctx, Out>) -> anyhow::Result<Out> + 'static,
{
  Box::new(f)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ChainError {
  #[error("next() called multiple times")]
  NextCalledMultipleTimes,
}

/// Compose an ordered handler list into a [`Chain`].
///
/// Composition only borrows the slice, so callers compose on every dispatch
/// instead of caching the result.
pub fn compose<Ctx, Out>(handlers: &[Handler<Ctx, Out>]) -> Chain<'_, Ctx, Out> {
  Chain { handlers }
}

pub struct Chain<'h, Ctx, Out> {
  handlers: &'h [Handler<Ctx, Out>],
}

impl<Ctx, Out> Chain<'_, Ctx, Out> {
  pub fn len(&self) -> usize {
    self.handlers.len()
  }

  pub fn is_empty(&self) -> bool {
    self.handlers.is_empty()
  }
}

impl<Ctx, Out: Default> Chain<'_, Ctx, Out> {
  /// Run the chain starting at the first handler.
  ///
  /// When the last handler delegates, `final_next` is invoked if present;
  /// otherwise the chain yields `Out::default()`.
  pub fn run(
    &self,
    ctx: &Ctx,
    final_next: Option<FinalNext<'_, Ctx, Out>>,
  ) -> anyhow::Result<Out> {
    let invocation = Invocation {
      handlers: self.handlers,
      final_next,
      reached: Cell::new(None),
    };
    invocation.dispatch(ctx, 0)
  }
}

/// State owned by a single [`Chain::run`] call.
struct Invocation<'a, Ctx, Out> {
  handlers:   &'a [Handler<Ctx, Out>],
  final_next: Option<FinalNext<'a, Ctx, Out>>,
  // Highest index dispatched so far. Only ever grows.
  reached:    Cell<Option<usize>>,
}

impl<Ctx, Out: Default> Invocation<'_, Ctx, Out> {
  fn dispatch<'s>(&'s self, ctx: &'s Ctx, index: usize) -> anyhow::Result<Out> {
    if self.reached.get().is_some_and(|reached| index <= reached) {
      return Err(ChainError::NextCalledMultipleTimes.into());
    }
    self.reached.set(Some(index));

    match self.handlers.get(index) {
      Some(handler) => handler(ctx, Next {
        invocation: self,
        ctx,
        index: index + 1,
      }),
      None => match self.final_next {
        Some(final_next) => final_next(ctx),
        None => Ok(Out::default()),
      },
    }
  }
}

/// Continuation handed to each handler.
///
/// Calling it runs the remainder of the chain. It may be called at most once;
/// a second call fails with [`ChainError::NextCalledMultipleTimes`].
pub struct Next<'a, Ctx, Out> {
  invocation: &'a Invocation<'a, Ctx, Out>,
  ctx:        &'a Ctx,
  index:      usize,
}

impl<Ctx, Out> Clone for Next<'_, Ctx, Out> {
  fn clone(&self) -> Self {
    *self
  }
}

impl<Ctx, Out> Copy for Next<'_, Ctx, Out> {}

impl<'a, Ctx, Out> Next<'a, Ctx, Out> {
  /// The context the chain was run with.
  pub fn context(&self) -> &'a Ctx {
    self.ctx
  }

  /// Index of the handler this continuation would run.
  pub fn index(&self) -> usize {
    self.index
  }
}

impl<Ctx, Out: Default> Next<'_, Ctx, Out> {
  pub fn call(&self) -> anyhow::Result<Out> {
    self.invocation.dispatch(self.ctx, self.index)
  }
}

#[cfg(test)]
mod tests {
  use std::{
    cell::RefCell,
    rc::Rc,
  };

  use super::*;

  fn push_then_next(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> Handler<(), i32> {
    let log = log.clone();
    handler(move |_: &(), next| {
      log.borrow_mut().push(name);
      next.call()
    })
  }

  #[test]
  fn empty_chain_without_final_yields_default() {
    let handlers: Vec<Handler<(), i32>> = Vec::new();
    assert_eq!(compose(&handlers).run(&(), None).unwrap(), 0);
  }

  #[test]
  fn empty_chain_calls_final_next() {
    let handlers: Vec<Handler<i32, i32>> = Vec::new();
    let final_next = |ctx: &i32| -> anyhow::Result<i32> { Ok(*ctx * 2) };
    assert_eq!(compose(&handlers).run(&21, Some(&final_next)).unwrap(), 42);
  }

  #[test]
  fn handlers_run_in_order() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let handlers = vec![
      push_then_next(&log, "a"),
      push_then_next(&log, "b"),
      push_then_next(&log, "c"),
    ];

    compose(&handlers).run(&(), None).unwrap();
    assert_eq!(*log.borrow(), vec!["a", "b", "c"]);
  }

  #[test]
  fn last_handler_delegates_to_final_next() {
    let log = Rc::new(RefCell::new(Vec::new()));
    let handlers = vec![push_then_next(&log, "a")];
    let final_next = |_: &()| -> anyhow::Result<i32> { Ok(7) };

    assert_eq!(compose(&handlers).run(&(), Some(&final_next)).unwrap(), 7);
    assert_eq!(*log.borrow(), vec!["a"]);
  }

  #[test]
  fn next_twice_fails() {
    let handlers: Vec<Handler<(), i32>> = vec![
      handler(|_, next| {
        next.call()?;
        next.call()
      }),
      handler(|_, _| Ok(1)),
    ];

    let err = compose(&handlers).run(&(), None).unwrap_err();
    assert_eq!(
      err.downcast_ref::<ChainError>(),
      Some(&ChainError::NextCalledMultipleTimes)
    );
    assert_eq!(err.to_string(), "next() called multiple times");
  }

  #[test]
  fn each_run_gets_fresh_state() {
    let handlers: Vec<Handler<(), i32>> =
      vec![handler(|_, next| next.call()), handler(|_, _| Ok(3))];
    let chain = compose(&handlers);

    assert_eq!(chain.run(&(), None).unwrap(), 3);
    assert_eq!(chain.run(&(), None).unwrap(), 3);
  }
}
