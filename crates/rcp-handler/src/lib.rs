pub mod error;
pub mod handler;
pub mod local;
pub mod registry;

pub use error::HandlerError;
pub use handler::{AllocateBindingsContext, DeleteContext, PutContext, RenderContext, Renderer, ResourceHandler};
pub use local::{InMemoryHandler, InMemoryRenderer};
pub use registry::{HandlerRegistry, RendererRegistry};
