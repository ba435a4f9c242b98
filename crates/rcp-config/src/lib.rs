pub mod credentials;
pub mod error;
pub mod server;

pub use credentials::CloudCredentials;
pub use error::ConfigError;
pub use server::{ServerConfig, StoreBackend};
