use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use leadchat::api::HttpConversationApi;
use leadchat::config::ChatConfig;
use leadchat::presentation::BufferedSurface;
use leadchat::session::FileSessionStore;
use leadchat::ConversationClient;

#[allow(dead_code)]
pub fn temp_session_store() -> (Arc<FileSessionStore>, TempDir) {
    let tmp = TempDir::new().expect("failed to create tempdir");
    let store = FileSessionStore::with_path(tmp.path().join("session.json"));
    (Arc::new(store), tmp)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}

/// Chat settings without the typing delay so tests run at full speed
#[allow(dead_code)]
pub fn instant_chat() -> ChatConfig {
    ChatConfig {
        typing_delay_ms: 0,
        ..ChatConfig::default()
    }
}

/// Client wired to a real HTTP API pointed at `base_url`
#[allow(dead_code)]
pub fn http_client(
    base_url: &str,
    timeout_seconds: u64,
) -> (
    ConversationClient,
    Arc<FileSessionStore>,
    Arc<BufferedSurface>,
    TempDir,
) {
    let api = HttpConversationApi::new(base_url, timeout_seconds).expect("valid base url");
    let (store, tmp) = temp_session_store();
    let surface = Arc::new(BufferedSurface::new());
    let client = ConversationClient::new(
        Arc::new(api),
        store.clone(),
        surface.clone(),
        instant_chat(),
    );
    (client, store, surface, tmp)
}
