//! Backend-supplied handlers, one optional slot per operation.
//!
//! Registration happens before the session starts and the registry is
//! moved into the [`Dispatcher`](crate::Dispatcher), so slots can never
//! change while requests are being served. An empty slot answers
//! [`Outcome::Failed`] without the dispatcher having to know about it.
//!
//! # Example
//!
//! ```
//! use tableproc_api::{HandlerRegistry, Outcome};
//!
//! let mut handlers = HandlerRegistry::new();
//! handlers.on_check(|_kind, key| Outcome::from(key == "postmaster"));
//! handlers.on_lookup(|_kind, key, out| match key.to_str() {
//!     Some("host") => match out.set("10.0.0.1") {
//!         Ok(()) => Outcome::Found,
//!         Err(_) => Outcome::Failed,
//!     },
//!     _ => Outcome::NotFound,
//! });
//!
//! assert!(handlers.capabilities().check);
//! assert!(!handlers.capabilities().fetch);
//! ```

use std::fmt;

use crate::key::Key;
use crate::outcome::Outcome;
use crate::value::ValueBuffer;

type UpdateFn = Box<dyn FnMut() -> Outcome>;
type CheckFn = Box<dyn FnMut(i32, Key<'_>) -> Outcome>;
type LookupFn = Box<dyn FnMut(i32, Key<'_>, &mut ValueBuffer) -> Outcome>;
type FetchFn = Box<dyn FnMut(i32, &mut ValueBuffer) -> Outcome>;

/// Which operations a registry can answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub update: bool,
    pub check: bool,
    pub lookup: bool,
    pub fetch: bool,
}

/// The four handler slots.
#[derive(Default)]
pub struct HandlerRegistry {
    update: Option<UpdateFn>,
    check: Option<CheckFn>,
    lookup: Option<LookupFn>,
    fetch: Option<FetchFn>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle UPDATE (reload the table). Replaces any earlier handler.
    pub fn on_update<F>(&mut self, f: F) -> &mut Self
    where
        F: FnMut() -> Outcome + 'static,
    {
        self.update = Some(Box::new(f));
        self
    }

    /// Handle CHECK (does `key` exist for this key type).
    ///
    /// The key is passed through byte for byte; see [`Key`].
    pub fn on_check<F>(&mut self, f: F) -> &mut Self
    where
        F: FnMut(i32, Key<'_>) -> Outcome + 'static,
    {
        self.check = Some(Box::new(f));
        self
    }

    /// Handle LOOKUP. On [`Outcome::Found`] the value must be in the buffer.
    pub fn on_lookup<F>(&mut self, f: F) -> &mut Self
    where
        F: FnMut(i32, Key<'_>, &mut ValueBuffer) -> Outcome + 'static,
    {
        self.lookup = Some(Box::new(f));
        self
    }

    /// Handle FETCH (next entry for this key type).
    pub fn on_fetch<F>(&mut self, f: F) -> &mut Self
    where
        F: FnMut(i32, &mut ValueBuffer) -> Outcome + 'static,
    {
        self.fetch = Some(Box::new(f));
        self
    }

    pub fn capabilities(&self) -> Capabilities {
        Capabilities {
            update: self.update.is_some(),
            check: self.check.is_some(),
            lookup: self.lookup.is_some(),
            fetch: self.fetch.is_some(),
        }
    }

    pub(crate) fn update(&mut self) -> Outcome {
        self.update.as_mut().map_or(Outcome::Failed, |f| f())
    }

    pub(crate) fn check(&mut self, kind: i32, key: Key<'_>) -> Outcome {
        self.check.as_mut().map_or(Outcome::Failed, |f| f(kind, key))
    }

    pub(crate) fn lookup(&mut self, kind: i32, key: Key<'_>, out: &mut ValueBuffer) -> Outcome {
        self.lookup
            .as_mut()
            .map_or(Outcome::Failed, |f| f(kind, key, out))
    }

    pub(crate) fn fetch(&mut self, kind: i32, out: &mut ValueBuffer) -> Outcome {
        self.fetch.as_mut().map_or(Outcome::Failed, |f| f(kind, out))
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("capabilities", &self.capabilities())
            .finish()
    }
}
