//! Shared harness for console specs.

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use ats_client::test_support::FakeOlcServer;
use ats_client::{
    ChannelFactory, ConsoleOutput, ControlStub, LogStreamer, OutputCapture, ServerChannel,
    ServerEndpoint, ServerPreparer, ServerSpawnConfig, SessionRpcStub, SessionStub, VersionStub,
};
use ats_core::ClientId;
use ats_olc::LogImportance;

pub const PLUGIN_LABEL: &str = "ats_plugin";

/// Everything a spec needs to drive the console subsystem.
pub struct Console {
    pub channel: Arc<ServerChannel>,
    pub preparer: Arc<ServerPreparer>,
    pub client_id: ClientId,
    pub capture: OutputCapture,
    output: Arc<ConsoleOutput>,
}

impl Console {
    /// Build a console against `endpoint` with an explicit server binary.
    pub fn new(endpoint: ServerEndpoint, binary: PathBuf, always_restart: bool) -> Self {
        let channel = ChannelFactory::new(endpoint).channel();
        let (output, capture) = ConsoleOutput::captured();
        let client_id = ClientId::new("spec-console");
        let preparer = Arc::new(ServerPreparer::new(
            VersionStub::new(Arc::clone(&channel)),
            ControlStub::new(Arc::clone(&channel)),
            client_id.clone(),
            ServerSpawnConfig::new(binary, endpoint.port),
            always_restart,
            Arc::clone(&output),
        ));
        Self {
            channel,
            preparer,
            client_id,
            capture,
            output,
        }
    }

    /// Console for a fake that is already serving (reuse path).
    pub fn for_fake(fake: &FakeOlcServer) -> Self {
        Self::new(fake.endpoint(), PathBuf::from("/nonexistent"), false)
    }

    /// Session stub typed over raw JSON payloads.
    pub fn sessions(&self) -> SessionStub<serde_json::Value> {
        SessionStub::new(
            SessionRpcStub::new(Arc::clone(&self.channel)),
            Arc::clone(&self.preparer),
            Some(PLUGIN_LABEL.to_string()),
            "AtsSessionPlugin",
        )
    }

    pub fn streamer(&self, min_importance: LogImportance) -> LogStreamer {
        LogStreamer::new(
            ControlStub::new(Arc::clone(&self.channel)),
            Arc::clone(&self.preparer),
            self.client_id.clone(),
            min_importance,
            Arc::clone(&self.output),
        )
    }
}

/// Write an executable shell script acting as the server binary.
pub fn server_script(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("ats_olc_server");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

/// A spawn-script body that drops `marker` and announces readiness.
pub fn ready_script_body(marker: &Path) -> String {
    format!(
        "echo x >> {}\necho 'OLC server started' >&2\nsleep 60",
        marker.display()
    )
}

/// Allocate a local port with nothing listening on it.
pub async fn free_port() -> u16 {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}

/// Serve a fake on `port` once `marker` shows the child script has run.
///
/// The scripts standing in for the server binary cannot speak the
/// protocol, so a fake takes over the port as soon as the script drops its
/// marker file. The receiver yields the fake for scripting its sessions.
pub fn serve_after_spawn(
    port: u16,
    marker: PathBuf,
) -> tokio::sync::oneshot::Receiver<FakeOlcServer> {
    let (tx, rx) = tokio::sync::oneshot::channel();
    tokio::spawn(async move {
        while !marker.exists() {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        loop {
            match FakeOlcServer::start_on(port).await {
                Ok(fake) => {
                    let _ = tx.send(fake);
                    break;
                }
                Err(_) => tokio::time::sleep(Duration::from_millis(20)).await,
            }
        }
    });
    rx
}

/// Poll until `cond` holds (real-clock specs only).
pub async fn wait_for(what: &str, cond: impl Fn() -> bool) {
    for _ in 0..300 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("timed out waiting for {what}");
}
