use std::process::{Child, Command, Stdio};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use reqwest::StatusCode;

static SERVER: OnceLock<TestServer> = OnceLock::new();
static DB_SERVER: OnceLock<TestServer> = OnceLock::new();

/// Secret shared with the spawned servers so tests can mint their own tokens
#[allow(dead_code)]
pub const JWT_SECRET: &str = "integration-test-secret";

pub struct TestServer {
    pub base_url: String,
    _child: Child,
}

impl TestServer {
    fn spawn(database_url: Option<&str>) -> Result<Self> {
        // Pick an unused port for isolation
        let port = portpicker::pick_unused_port().context("failed to pick free port")?;
        let base_url = format!("http://127.0.0.1:{}", port);

        let mut cmd = Command::new(env!("CARGO_BIN_EXE_blog-api-rust"));
        cmd.env("BLOG_API_PORT", port.to_string())
            .env("APP_ENV", "development")
            .env("JWT_SECRET", JWT_SECRET);

        match database_url {
            // Migrations finish before the listener binds
            Some(url) => cmd.env("DATABASE_URL", url).env("DATABASE_RUN_MIGRATIONS", "true"),
            None => cmd.env_remove("DATABASE_URL").env("DATABASE_RUN_MIGRATIONS", "false"),
        };

        cmd.stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());

        let child = cmd.spawn().context("failed to spawn server binary")?;

        Ok(Self { base_url, _child: child })
    }

    async fn wait_ready(&self, timeout: Duration) -> Result<()> {
        let client = reqwest::Client::new();
        let deadline = Instant::now() + timeout;
        loop {
            if Instant::now() > deadline {
                break;
            }
            let url = format!("{}/health", self.base_url);
            if let Ok(resp) = client.get(&url).send().await {
                if resp.status() == StatusCode::OK || resp.status() == StatusCode::SERVICE_UNAVAILABLE {
                    return Ok(());
                }
            }
            tokio::time::sleep(Duration::from_millis(150)).await;
        }
        anyhow::bail!("server did not become ready on {} within {:?}", self.base_url, timeout)
    }
}

/// Server without a database, for behaviour decided before any query is made
#[allow(dead_code)]
pub async fn ensure_server() -> Result<&'static TestServer> {
    let server = SERVER.get_or_init(|| TestServer::spawn(None).expect("failed to spawn server binary"));
    server.wait_ready(Duration::from_secs(10)).await?;
    Ok(server)
}

/// `DATABASE_URL` when the environment provides one; database-backed tests
/// skip themselves otherwise
#[allow(dead_code)]
pub fn database_url() -> Option<String> {
    match std::env::var("DATABASE_URL") {
        Ok(url) if !url.trim().is_empty() => Some(url),
        _ => {
            eprintln!("DATABASE_URL not set; skipping database-backed test");
            None
        }
    }
}

/// Server connected to `database_url`, with migrations applied
#[allow(dead_code)]
pub async fn ensure_db_server(database_url: &str) -> Result<&'static TestServer> {
    let server = DB_SERVER.get_or_init(|| {
        TestServer::spawn(Some(database_url)).expect("failed to spawn server binary")
    });
    server.wait_ready(Duration::from_secs(20)).await?;
    Ok(server)
}
