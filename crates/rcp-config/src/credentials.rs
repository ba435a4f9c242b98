use crate::error::ConfigError;

/// Service-principal identity a resource handler uses to authenticate
/// against an external provider (§6). Exact env var names are part of the
/// operational surface, not the core.
#[derive(Debug, Clone)]
pub struct CloudCredentials {
    pub subscription_id: String,
    pub resource_group: String,
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl CloudCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(CloudCredentials {
            subscription_id: env_var("RCP_SUBSCRIPTION_ID")?,
            resource_group: env_var("RCP_RESOURCE_GROUP")?,
            tenant_id: env_var("RCP_TENANT_ID")?,
            client_id: env_var("RCP_CLIENT_ID")?,
            client_secret: env_var("RCP_CLIENT_SECRET")?,
        })
    }
}

fn env_var(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnv(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_env_var_names_itself_in_the_error() {
        let err = env_var("RCP_DOES_NOT_EXIST").unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnv(name) if name == "RCP_DOES_NOT_EXIST"));
    }
}
