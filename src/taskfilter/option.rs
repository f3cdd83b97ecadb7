use crate::observable::{Observable, SubscriptionId};
use tracing::debug;

/// A named boolean setting whose changes can be observed.
///
/// The option only holds the live value; saving and restoring it is up to
/// the host (see [`crate::config::FilterConfig`]).
#[derive(Debug, Clone)]
pub struct BooleanOption {
    id: &'static str,
    default: bool,
    value: Observable<bool>,
}

impl BooleanOption {
    pub fn new(id: &'static str, default: bool) -> Self {
        Self {
            id,
            default,
            value: Observable::new(default),
        }
    }

    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn default_value(&self) -> bool {
        self.default
    }

    pub fn get(&self) -> bool {
        self.value.get()
    }

    pub fn set(&self, value: bool) {
        debug!(option = self.id, value, "option changed");
        self.value.set(value);
    }

    pub fn reset(&self) {
        self.set(self.default);
    }

    pub fn subscribe(&self, subscriber: impl FnMut(&bool) + 'static) -> SubscriptionId {
        self.value.subscribe(subscriber)
    }

    /// The shared cell behind this option; writes through it are visible here.
    pub fn as_observable(&self) -> Observable<bool> {
        self.value.clone()
    }
}
