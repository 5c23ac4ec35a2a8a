//! Edge intake: one classifier per button, created on first sight

use crate::classifier::{ButtonClassifier, GestureConfig};
use crate::registry::ListenerRegistry;
use casita_core::{ButtonId, EdgeEvent};
use dashmap::DashMap;
use std::sync::Arc;

/// Owns the per-button classifiers and feeds them raw edges
///
/// Buttons classify fully independently; the engine only routes each edge
/// to its button's classifier, creating one lazily the first time a
/// button is seen.
pub struct GestureEngine {
    config: GestureConfig,
    registry: Arc<ListenerRegistry>,
    classifiers: DashMap<ButtonId, Arc<ButtonClassifier>>,
}

impl GestureEngine {
    pub fn new(config: GestureConfig, registry: Arc<ListenerRegistry>) -> Self {
        Self {
            config,
            registry,
            classifiers: DashMap::new(),
        }
    }

    /// The registry gestures are dispatched through
    pub fn registry(&self) -> &Arc<ListenerRegistry> {
        &self.registry
    }

    /// Route one raw edge to its button's classifier
    pub fn handle_edge(&self, event: EdgeEvent) {
        let classifier = self
            .classifiers
            .entry(event.button.clone())
            .or_insert_with(|| {
                Arc::new(ButtonClassifier::new(
                    event.button.clone(),
                    self.config,
                    self.registry.clone(),
                ))
            })
            .clone();
        classifier.handle_edge(event.edge);
    }

    /// Number of buttons seen so far
    pub fn button_count(&self) -> usize {
        self.classifiers.len()
    }
}
