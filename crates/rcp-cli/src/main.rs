mod cli;
mod commands;
mod output;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).with_target(false).init();

    let cli = Cli::parse();
    let url = cli.url;
    let token = cli.token;

    match cli.command {
        Command::Serve { config, rotate_token } => commands::serve(config, rotate_token).await,
        Command::PutApplication { application, file } => commands::put_application(url, token, application, file).await,
        Command::GetApplication { application } => commands::get_application(url, token, application).await,
        Command::DeleteApplication { application } => commands::delete_application(url, token, application).await,
        Command::PutComponent { application, component, file } => {
            commands::put_component(url, token, application, component, file).await
        }
        Command::GetComponent { application, component } => commands::get_component(url, token, application, component).await,
        Command::Apply { application, deployment, file, wait } => {
            commands::apply(url, token, application, deployment, file, wait).await
        }
        Command::GetDeployment { application, deployment } => commands::get_deployment(url, token, application, deployment).await,
        Command::Destroy { application, deployment, wait } => commands::destroy(url, token, application, deployment, wait).await,
        Command::Status { application, deployment, operation } => commands::status(url, token, application, deployment, operation).await,
        Command::ListOperations { application, deployment } => commands::list_operations(url, token, application, deployment).await,
        Command::Events { application, limit } => commands::events(url, token, application, limit).await,
    }
}
