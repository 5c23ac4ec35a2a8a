//! Listener registry mapping buttons to gesture handlers

use casita_core::{ButtonId, Gesture};
use dashmap::DashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, error, info};

/// Result type for listener invocations
pub type ListenerResult = Result<(), ListenerError>;

/// Future type for async gesture listeners
pub type ListenerFuture = Pin<Box<dyn Future<Output = ListenerResult> + Send>>;

/// Gesture listener function type
type ListenerFn = Arc<dyn Fn(ButtonId, Gesture) -> ListenerFuture + Send + Sync>;

/// Error a gesture listener can report
///
/// Listener failures never propagate past the registry; they are logged at
/// the emission boundary and the classifier keeps going.
#[derive(Debug, Clone, Error)]
pub enum ListenerError {
    #[error("listener failed: {0}")]
    Failed(String),
}

#[derive(Clone)]
struct RegisteredListener {
    name: Arc<str>,
    handler: ListenerFn,
}

/// The listener registry routes classified gestures to handlers
///
/// Registrations happen during startup, before the edge source starts
/// delivering events; lookup is O(1) by button ID. Registering with an
/// empty button list installs the fallback handler applied to any button
/// without an explicit registration (used to silently acknowledge
/// unmapped hardware).
pub struct ListenerRegistry {
    listeners: DashMap<ButtonId, RegisteredListener>,
    fallback: RwLock<Option<RegisteredListener>>,
}

impl ListenerRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            listeners: DashMap::new(),
            fallback: RwLock::new(None),
        }
    }

    /// Register a handler for the given buttons
    ///
    /// With an empty `buttons` slice the handler becomes the fallback for
    /// every button not explicitly registered. `name` identifies the
    /// handler in log output when it fails.
    pub fn register<F, Fut>(&self, buttons: &[ButtonId], name: impl Into<Arc<str>>, handler: F)
    where
        F: Fn(ButtonId, Gesture) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ListenerResult> + Send + 'static,
    {
        let handler: ListenerFn =
            Arc::new(move |button, gesture| Box::pin(handler(button, gesture)) as ListenerFuture);
        let listener = RegisteredListener {
            name: name.into(),
            handler,
        };

        if buttons.is_empty() {
            debug!(listener = %listener.name, "installing fallback listener");
            *self.fallback.write().unwrap() = Some(listener);
            return;
        }

        for button in buttons {
            debug!(button = %button, listener = %listener.name, "registering listener");
            self.listeners.insert(button.clone(), listener.clone());
        }
    }

    /// Whether a button has an explicit (non-fallback) registration
    pub fn has_listener(&self, button: &ButtonId) -> bool {
        self.listeners.contains_key(button)
    }

    /// Number of explicit registrations
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Deliver a classified gesture to the registered listener
    ///
    /// This is the emission boundary: a failing listener is logged with
    /// its identity and the error swallowed, so one bad handler can never
    /// crash the classifier or block later gestures.
    pub async fn dispatch(&self, button: &ButtonId, gesture: Gesture) {
        info!(button = %button, gesture = %gesture, "button event");

        let listener = match self.listeners.get(button) {
            // Clone out of the map so the shard lock is released before
            // the handler runs.
            Some(entry) => entry.value().clone(),
            None => match self.fallback.read().unwrap().clone() {
                Some(listener) => listener,
                None => {
                    debug!(button = %button, "no listener registered, dropping gesture");
                    return;
                }
            },
        };

        if let Err(err) = (listener.handler)(button.clone(), gesture).await {
            error!(
                listener = %listener.name,
                button = %button,
                gesture = %gesture,
                error = %err,
                "listener failed"
            );
        }
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}
