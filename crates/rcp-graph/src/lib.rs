mod binding;
mod error;
mod order;

pub use binding::{resolve_bindings, BindingMetadataRegistry, ProviderRecord, ResolvedBindings};
pub use error::GraphError;
pub use order::order_components;
