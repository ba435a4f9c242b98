use clap::Parser;
use rcp_config::{ServerConfig, StoreBackend};

#[derive(Debug, Parser)]
struct Harness {
    #[command(flatten)]
    server: ServerConfig,
}

#[test]
fn defaults_bind_to_loopback_with_memory_store() {
    let harness = Harness::parse_from(["rcp-server"]);
    assert_eq!(harness.server.bind, "127.0.0.1");
    assert_eq!(harness.server.port, 8080);
    assert_eq!(harness.server.store, StoreBackend::Memory);
    assert_eq!(harness.server.listen_address(), "127.0.0.1:8080");
}

#[test]
fn postgres_store_accepts_database_url_flag() {
    let harness = Harness::parse_from([
        "rcp-server",
        "--store",
        "postgres",
        "--database-url",
        "postgres://localhost/rcp",
    ]);
    assert_eq!(harness.server.store, StoreBackend::Postgres);
    assert_eq!(harness.server.database_url.as_deref(), Some("postgres://localhost/rcp"));
}
