use std::collections::HashMap;
use std::sync::Arc;

use crate::error::HandlerError;
use crate::handler::{Renderer, ResourceHandler};

/// Dispatches resource `type` strings to the [`ResourceHandler`] that owns them.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn ResourceHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, handler: Arc<dyn ResourceHandler>) -> &mut Self {
        self.handlers.insert(handler.resource_type().to_string(), handler);
        self
    }

    pub fn get(&self, resource_type: &str) -> Result<Arc<dyn ResourceHandler>, HandlerError> {
        self.handlers
            .get(resource_type)
            .cloned()
            .ok_or_else(|| HandlerError::HandlerNotFound(resource_type.to_string()))
    }
}

/// Dispatches component `kind` strings to the [`Renderer`] that owns them.
#[derive(Default)]
pub struct RendererRegistry {
    renderers: HashMap<String, Arc<dyn Renderer>>,
}

impl RendererRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, renderer: Arc<dyn Renderer>) -> &mut Self {
        self.renderers.insert(renderer.component_kind().to_string(), renderer);
        self
    }

    pub fn get(&self, component_kind: &str) -> Result<Arc<dyn Renderer>, HandlerError> {
        self.renderers
            .get(component_kind)
            .cloned()
            .ok_or_else(|| HandlerError::RendererNotFound(component_kind.to_string()))
    }
}
