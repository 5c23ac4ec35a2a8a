//! Lifecycle wiring for the casita hub
//!
//! [`Hub`] assembles the gesture engine, listener registry, zone locks,
//! and dispatcher from loaded settings and a device command
//! implementation, registers all listeners before the first edge arrives,
//! and consumes the edge stream until the source closes it.
//!
//! The edge source itself (the lighting bridge's button subscription) is
//! an external collaborator: anything able to feed
//! [`EdgeEvent`](casita_core::EdgeEvent)s into an mpsc channel can drive
//! the hub.

use casita_config::Settings;
use casita_core::{EdgeEvent, SharedDeviceCommands};
use casita_dispatch::{register_bindings, ButtonBinding, Dispatcher};
use casita_gesture::{GestureEngine, ListenerRegistry};
use casita_zones::ZoneLocks;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, trace};

/// The assembled hub
pub struct Hub {
    engine: GestureEngine,
    registry: Arc<ListenerRegistry>,
    dispatcher: Arc<Dispatcher>,
    bindings: Vec<ButtonBinding>,
}

impl Hub {
    /// Wire up a hub from settings and a bridge client
    pub fn new(settings: &Settings, commands: SharedDeviceCommands) -> Self {
        let registry = Arc::new(ListenerRegistry::new());
        let zones = Arc::new(ZoneLocks::new());
        let dispatcher = Arc::new(Dispatcher::new(
            commands,
            zones,
            settings.dispatch.settle_delay(),
        ));
        let engine = GestureEngine::new(settings.gesture.gesture_config(), registry.clone());

        Self {
            engine,
            registry,
            dispatcher,
            bindings: settings.bindings.clone(),
        }
    }

    /// Register all listeners
    ///
    /// Must complete before the edge source starts delivering events;
    /// registrations after that point are not supported.
    pub fn startup(&self) {
        debug!("running events startup hook");

        // Unmapped hardware is acknowledged silently instead of logging
        // an error per press.
        self.registry
            .register(&[], "unmapped", |button, gesture| async move {
                trace!(button = %button, gesture = %gesture, "ignoring unmapped button");
                Ok(())
            });

        register_bindings(&self.registry, &self.dispatcher, &self.bindings);
        info!(bindings = self.bindings.len(), "listeners registered");
    }

    /// The registry gestures are dispatched through
    pub fn registry(&self) -> &Arc<ListenerRegistry> {
        &self.registry
    }

    /// Feed a single edge, for embedders that bring their own loop
    pub fn handle_edge(&self, event: EdgeEvent) {
        self.engine.handle_edge(event);
    }

    /// Consume the edge stream until the sender side closes
    ///
    /// Listener failures are logged at the emission boundary and never
    /// end this loop.
    pub async fn run(&self, mut edges: mpsc::Receiver<EdgeEvent>) {
        while let Some(event) = edges.recv().await {
            self.engine.handle_edge(event);
        }
        info!("edge stream closed");
    }

    /// Release anything held for shutdown
    ///
    /// Zone locks and classifiers drop with the hub; this only exists so
    /// callers have a symmetric hook to pair with [`Hub::startup`].
    pub async fn shutdown(&self) {
        debug!("running events shutdown hook");
    }
}
