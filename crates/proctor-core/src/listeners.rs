//! Registry of attached signal listeners
//!
//! Every listener a session attaches is recorded with the context that owns
//! it, so a whole context (or everything) can be detached in one call.

use proctor_util::ListenerId;
use std::fmt;
use tracing::debug;

type Detach = Box<dyn FnOnce() + Send>;

struct Registration {
    id: ListenerId,
    target: String,
    event: String,
    context: String,
    detach: Detach,
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("target", &self.target)
            .field("event", &self.event)
            .field("context", &self.context)
            .finish_non_exhaustive()
    }
}

/// Listener bookkeeping with scoped bulk removal.
///
/// `detach` runs exactly once, when the listener is removed or the registry
/// is dropped.
#[derive(Debug, Default)]
pub struct ListenerRegistry {
    registrations: Vec<Registration>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a listener attached to `target` for `event`, owned by `context`
    pub fn register(
        &mut self,
        target: impl Into<String>,
        event: impl Into<String>,
        context: impl Into<String>,
        detach: impl FnOnce() + Send + 'static,
    ) -> ListenerId {
        let registration = Registration {
            id: ListenerId::next(),
            target: target.into(),
            event: event.into(),
            context: context.into(),
            detach: Box::new(detach),
        };
        let id = registration.id;

        debug!(
            listener = %id,
            target = %registration.target,
            event = %registration.event,
            context = %registration.context,
            "Listener registered"
        );

        self.registrations.push(registration);
        id
    }

    /// Detach every listener owned by `context`. Returns how many were removed.
    pub fn remove_context(&mut self, context: &str) -> usize {
        let (removed, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.registrations)
            .into_iter()
            .partition(|r| r.context == context);
        self.registrations = kept;
        Self::detach_all(removed)
    }

    /// Detach every listener. Returns how many were removed.
    pub fn remove_all(&mut self) -> usize {
        Self::detach_all(std::mem::take(&mut self.registrations))
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    pub fn count_in_context(&self, context: &str) -> usize {
        self.registrations
            .iter()
            .filter(|r| r.context == context)
            .count()
    }

    fn detach_all(registrations: Vec<Registration>) -> usize {
        let count = registrations.len();
        for registration in registrations {
            debug!(
                listener = %registration.id,
                target = %registration.target,
                event = %registration.event,
                context = %registration.context,
                "Listener removed"
            );
            (registration.detach)();
        }
        count
    }
}

impl Drop for ListenerRegistry {
    fn drop(&mut self) {
        self.remove_all();
    }
}
