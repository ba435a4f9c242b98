use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rcp_config::ServerConfig;

#[derive(Debug, Parser)]
#[command(name = "rcp", about = "Declarative application control plane", version)]
pub struct Cli {
    /// Base URL of a running control-plane server.
    #[arg(long, env = "RCP_URL", global = true, default_value = "http://localhost:8080")]
    pub url: String,

    /// Bearer token to authenticate with. Falls back to `~/.rcp/token`.
    #[arg(long, env = "RCP_TOKEN", global = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start the control-plane server in-process.
    Serve {
        #[command(flatten)]
        config: ServerConfig,

        /// Rotate the auth token on startup even if one already exists on disk.
        #[arg(long)]
        rotate_token: bool,
    },

    /// Create or update an application.
    PutApplication {
        application: String,
        /// Path to a JSON file of `{"properties": {...}}`. Defaults to an empty body.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Show an application.
    GetApplication { application: String },

    /// Delete an application (fails if it still has deployments).
    DeleteApplication { application: String },

    /// Submit a new revision of a component.
    PutComponent {
        application: String,
        component: String,
        /// Path to a JSON file of `{"kind": ..., "properties": {...}}`.
        file: PathBuf,
    },

    /// Show a component's revision history.
    GetComponent { application: String, component: String },

    /// Deploy a set of components (create or update a deployment).
    Apply {
        application: String,
        deployment: String,
        /// Path to a JSON file of `{"components": [...]}`.
        file: PathBuf,

        /// Poll until the deployment reaches a terminal state.
        #[arg(long)]
        wait: bool,
    },

    /// Show a deployment's current state.
    GetDeployment { application: String, deployment: String },

    /// Tear down a deployment's resources.
    Destroy {
        application: String,
        deployment: String,

        #[arg(long)]
        wait: bool,
    },

    /// Poll a deployment operation.
    Status {
        application: String,
        deployment: String,
        operation: String,
    },

    /// List every operation ever started against a deployment.
    ListOperations { application: String, deployment: String },

    /// List recent audit events.
    Events {
        #[arg(long)]
        application: Option<String>,

        #[arg(long, default_value_t = 100)]
        limit: u32,
    },
}
