use std::sync::Arc;

use rcp_operations::OperationManager;
use rcp_store::StateStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn StateStore>,
    pub operations: Arc<OperationManager>,
    pub auth_token: Arc<String>,
    /// Used to build poll-location URLs when a request carries no `Host` header.
    pub api_base: Arc<String>,
}
