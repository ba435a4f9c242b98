use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use rcp_config::{ServerConfig, StoreBackend};
use rcp_graph::BindingMetadataRegistry;
use rcp_handler::{HandlerRegistry, InMemoryHandler, InMemoryRenderer, RendererRegistry};
use rcp_store::{InMemoryStore, PostgresStore, StateStore};
use uuid::Uuid;

use crate::output;

// ── Serve ─────────────────────────────────────────────────────────────────────

pub async fn serve(config: ServerConfig, rotate_token: bool) -> Result<()> {
    let token_path = default_token_path();
    let token = if let Some(t) = config.auth_token.clone() {
        t
    } else if rotate_token {
        let t = generate_token();
        write_token(&token_path, &t)?;
        println!("Rotated token (written to {})", token_path.display());
        t
    } else if let Ok(existing) = std::fs::read_to_string(&token_path).map(|s| s.trim().to_string()) {
        if existing.is_empty() {
            let t = generate_token();
            write_token(&token_path, &t)?;
            t
        } else {
            existing
        }
    } else {
        let t = generate_token();
        write_token(&token_path, &t)?;
        println!("Generated new token (written to {})", token_path.display());
        t
    };

    let backing: Arc<dyn StateStore> = match config.store {
        StoreBackend::Memory => {
            println!("Using in-memory (ephemeral) store — state will be lost on server stop");
            Arc::new(InMemoryStore::new())
        }
        StoreBackend::Postgres => {
            let url = config
                .database_url
                .clone()
                .context("--database-url (or RCP_DATABASE_URL) is required for the postgres store")?;
            println!("Connecting to postgres store...");
            Arc::new(PostgresStore::connect(&url).await.context("Failed to connect to postgres store")?)
        }
    };

    let mut handlers = HandlerRegistry::new();
    handlers.register(Arc::new(InMemoryHandler::new("Container")));
    let mut renderers = RendererRegistry::new();
    renderers.register(Arc::new(InMemoryRenderer::new("Container", "Container")));

    let addr = config.listen_address();
    let api_base = config.resolved_api_base();
    println!("Starting control-plane server on http://{addr}");

    let app = rcp_api::build_app(
        backing,
        Arc::new(handlers),
        Arc::new(renderers),
        Arc::new(rcp_orchestrator::NoopNamespaceProvisioner),
        Arc::new(BindingMetadataRegistry::new()),
        Arc::new(token),
        api_base,
    );

    let listener = tokio::net::TcpListener::bind(&addr).await.with_context(|| format!("Failed to bind to {addr}"))?;
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

// ── Applications ──────────────────────────────────────────────────────────────

pub async fn put_application(url: String, token: Option<String>, application: String, file: Option<PathBuf>) -> Result<()> {
    let token = resolve_token(token)?;
    let body = match file {
        Some(path) => read_json_file(&path)?,
        None => serde_json::json!({ "properties": {} }),
    };
    let resp = authed_client(&token)
        .put(format!("{}/applications/{}", url.trim_end_matches('/'), application))
        .json(&body)
        .send()
        .await
        .with_context(|| format!("Failed to reach server at {url}"))?;
    print_response(resp).await
}

pub async fn get_application(url: String, token: Option<String>, application: String) -> Result<()> {
    let token = resolve_token(token)?;
    let resp = authed_client(&token)
        .get(format!("{}/applications/{}", url.trim_end_matches('/'), application))
        .send()
        .await
        .with_context(|| format!("Failed to reach server at {url}"))?;
    print_response(resp).await
}

pub async fn delete_application(url: String, token: Option<String>, application: String) -> Result<()> {
    let token = resolve_token(token)?;
    let resp = authed_client(&token)
        .delete(format!("{}/applications/{}", url.trim_end_matches('/'), application))
        .send()
        .await
        .with_context(|| format!("Failed to reach server at {url}"))?;
    print_response(resp).await
}

// ── Components ────────────────────────────────────────────────────────────────

pub async fn put_component(url: String, token: Option<String>, application: String, component: String, file: PathBuf) -> Result<()> {
    let token = resolve_token(token)?;
    let body = read_json_file(&file)?;
    let resp = authed_client(&token)
        .put(format!("{}/applications/{}/components/{}", url.trim_end_matches('/'), application, component))
        .json(&body)
        .send()
        .await
        .with_context(|| format!("Failed to reach server at {url}"))?;
    print_response(resp).await
}

pub async fn get_component(url: String, token: Option<String>, application: String, component: String) -> Result<()> {
    let token = resolve_token(token)?;
    let resp = authed_client(&token)
        .get(format!("{}/applications/{}/components/{}", url.trim_end_matches('/'), application, component))
        .send()
        .await
        .with_context(|| format!("Failed to reach server at {url}"))?;
    print_response(resp).await
}

// ── Deployments ───────────────────────────────────────────────────────────────

pub async fn apply(url: String, token: Option<String>, application: String, deployment: String, file: PathBuf, wait: bool) -> Result<()> {
    let token = resolve_token(token)?;
    let body = read_json_file(&file)?;
    let client = authed_client(&token);
    let resp = client
        .put(format!("{}/applications/{}/deployments/{}", url.trim_end_matches('/'), application, deployment))
        .json(&body)
        .send()
        .await
        .with_context(|| format!("Failed to reach server at {url}"))?;

    let status = resp.status();
    let location = resp.headers().get("location").and_then(|v| v.to_str().ok()).map(String::from);
    let value: serde_json::Value = resp.json().await.unwrap_or(serde_json::Value::Null);
    println!("{} {}", status, output::render_json(&value));

    if wait {
        if let Some(location) = location {
            wait_on_operation(&client, &location).await?;
        }
    }
    Ok(())
}

pub async fn get_deployment(url: String, token: Option<String>, application: String, deployment: String) -> Result<()> {
    let token = resolve_token(token)?;
    let resp = authed_client(&token)
        .get(format!("{}/applications/{}/deployments/{}", url.trim_end_matches('/'), application, deployment))
        .send()
        .await
        .with_context(|| format!("Failed to reach server at {url}"))?;
    print_response(resp).await
}

pub async fn destroy(url: String, token: Option<String>, application: String, deployment: String, wait: bool) -> Result<()> {
    let token = resolve_token(token)?;
    let client = authed_client(&token);
    let resp = client
        .delete(format!("{}/applications/{}/deployments/{}", url.trim_end_matches('/'), application, deployment))
        .send()
        .await
        .with_context(|| format!("Failed to reach server at {url}"))?;

    let status = resp.status();
    let location = resp.headers().get("location").and_then(|v| v.to_str().ok()).map(String::from);
    let value: serde_json::Value = resp.json().await.unwrap_or(serde_json::Value::Null);
    println!("{} {}", status, output::render_json(&value));

    if wait {
        if let Some(location) = location {
            wait_on_operation(&client, &location).await?;
        }
    }
    Ok(())
}

pub async fn status(url: String, token: Option<String>, application: String, deployment: String, operation: String) -> Result<()> {
    let token = resolve_token(token)?;
    let endpoint = format!(
        "{}/applications/{}/deployments/{}/operationresults/{}",
        url.trim_end_matches('/'),
        application,
        deployment,
        operation,
    );
    let resp = authed_client(&token).get(&endpoint).send().await.with_context(|| format!("Failed to reach server at {url}"))?;
    print_response(resp).await
}

pub async fn list_operations(url: String, token: Option<String>, application: String, deployment: String) -> Result<()> {
    let token = resolve_token(token)?;
    let endpoint = format!("{}/applications/{}/deployments/{}/operations", url.trim_end_matches('/'), application, deployment);
    let resp = authed_client(&token).get(&endpoint).send().await.with_context(|| format!("Failed to reach server at {url}"))?;
    print_response(resp).await
}

async fn wait_on_operation(client: &reqwest::Client, location: &str) -> Result<()> {
    loop {
        let resp = client.get(location).send().await.with_context(|| format!("Failed to poll {location}"))?;
        let status = resp.status();
        let value: serde_json::Value = resp.json().await.unwrap_or(serde_json::Value::Null);
        if status != reqwest::StatusCode::ACCEPTED {
            println!("{} {}", status, output::render_json(&value));
            return Ok(());
        }
        tokio::time::sleep(std::time::Duration::from_millis(500)).await;
    }
}

// ── Events ────────────────────────────────────────────────────────────────────

pub async fn events(url: String, token: Option<String>, application: Option<String>, limit: u32) -> Result<()> {
    let token = resolve_token(token)?;
    let client = authed_client(&token);
    let mut req = client.get(format!("{}/events", url.trim_end_matches('/'))).query(&[("limit", limit.to_string())]);
    if let Some(app) = application {
        req = req.query(&[("application", app)]);
    }
    let resp = req.send().await.with_context(|| format!("Failed to reach server at {url}"))?;
    print_response(resp).await
}

// ── Shared helpers ────────────────────────────────────────────────────────────

async fn print_response(resp: reqwest::Response) -> Result<()> {
    let status = resp.status();
    let value: serde_json::Value = resp.json().await.unwrap_or(serde_json::Value::Null);
    println!("{} {}", status, output::render_json(&value));
    if status.is_client_error() || status.is_server_error() {
        anyhow::bail!("request failed with status {status}");
    }
    Ok(())
}

fn read_json_file(path: &PathBuf) -> Result<serde_json::Value> {
    let content = std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {} as JSON", path.display()))
}

fn generate_token() -> String {
    let a = Uuid::new_v4().to_string().replace('-', "");
    let b = Uuid::new_v4().to_string().replace('-', "");
    format!("{a}{b}")
}

fn resolve_token(explicit: Option<String>) -> Result<String> {
    if let Some(t) = explicit {
        return Ok(t);
    }
    let path = default_token_path();
    std::fs::read_to_string(&path).map(|s| s.trim().to_string()).with_context(|| {
        format!(
            "No token provided and could not read token file at {}. Use --token, RCP_TOKEN, or run `rcp serve` first.",
            path.display()
        )
    })
}

fn write_token(path: &PathBuf, token: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    std::fs::write(path, token).with_context(|| format!("Failed to write token to {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    }
    Ok(())
}

fn default_token_path() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
    PathBuf::from(home).join(".rcp").join("token")
}

fn authed_client(token: &str) -> reqwest::Client {
    let mut headers = reqwest::header::HeaderMap::new();
    let bearer = format!("Bearer {token}");
    headers.insert(
        reqwest::header::AUTHORIZATION,
        reqwest::header::HeaderValue::from_str(&bearer).expect("token contains invalid header characters"),
    );
    reqwest::Client::builder().default_headers(headers).build().expect("failed to build HTTP client")
}
