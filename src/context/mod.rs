//! Request-scoped execution context.
//!
//! # Data Flow
//! ```text
//! Context::background()          (root, no bindings)
//!     → with_timeout(request)    (transport: deadline)
//!         → with_logger(l)       (middleware: request logger)
//!             → with_value::<K>  (handlers: anything else)
//! ```
//!
//! # Design Decisions
//! - Persistent linked list: deriving allocates one node and shares the rest
//! - Contexts are immutable; siblings derived from one parent never interfere
//! - Keys are Rust types, so a private key type cannot collide with others
//! - Deadline is inherited; a child can only tighten it

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

/// Typed key for values stored in a [`Context`].
///
/// Implement it on a (usually private, zero-sized) marker type:
///
/// ```
/// use request_logger::context::{Context, ContextKey};
///
/// struct TenantKey;
/// impl ContextKey for TenantKey {
///     type Value = String;
/// }
///
/// let ctx = Context::background().with_value::<TenantKey>("acme".to_string());
/// assert_eq!(ctx.value::<TenantKey>().map(String::as_str), Some("acme"));
/// ```
pub trait ContextKey: 'static {
    type Value: Send + Sync + 'static;
}

struct Node {
    parent: Option<Arc<Node>>,
    key: TypeId,
    value: Arc<dyn Any + Send + Sync>,
}

/// Immutable, chainable carrier of request-scoped values.
#[derive(Clone, Default)]
pub struct Context {
    head: Option<Arc<Node>>,
    deadline: Option<Instant>,
}

impl Context {
    /// Empty root context.
    pub fn background() -> Self {
        Self::default()
    }

    /// Child context with `value` bound under `K`. `self` is unchanged.
    pub fn with_value<K: ContextKey>(&self, value: K::Value) -> Self {
        Self {
            head: Some(Arc::new(Node {
                parent: self.head.clone(),
                key: TypeId::of::<K>(),
                value: Arc::new(value),
            })),
            deadline: self.deadline,
        }
    }

    /// Nearest value bound under `K`, searching toward the root.
    pub fn value<K: ContextKey>(&self) -> Option<&K::Value> {
        let key = TypeId::of::<K>();
        let mut node = self.head.as_deref();
        while let Some(current) = node {
            if current.key == key {
                return current.value.downcast_ref::<K::Value>();
            }
            node = current.parent.as_deref();
        }
        None
    }

    /// Child context that expires at `deadline`, or at the inherited
    /// deadline if that one is earlier.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current < deadline => current,
            _ => deadline,
        };
        Self {
            head: self.head.clone(),
            deadline: Some(deadline),
        }
    }

    /// Child context expiring `timeout` from now. A timeout too large to
    /// represent as an instant leaves the inherited deadline (if any) in place.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        match Instant::now().checked_add(timeout) {
            Some(deadline) => self.with_deadline(deadline),
            None => self.clone(),
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the deadline; `None` without a deadline.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn is_expired(&self) -> bool {
        self.deadline
            .map(|deadline| Instant::now() >= deadline)
            .unwrap_or(false)
    }

    /// Number of bindings on the chain.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut node = self.head.as_deref();
        while let Some(current) = node {
            depth += 1;
            node = current.parent.as_deref();
        }
        depth
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("depth", &self.depth())
            .field("deadline", &self.deadline)
            .finish()
    }
}
