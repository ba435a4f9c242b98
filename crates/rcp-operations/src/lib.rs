pub mod error;
pub mod manager;

pub use error::OperationsError;
pub use manager::{GetOperationOutcome, MutationAck, MutationMode, OperationManager};
