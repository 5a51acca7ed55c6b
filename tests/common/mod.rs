//! Shared utilities for integration testing.

use std::path::PathBuf;
use std::sync::Arc;

use httpcapture::app::App;
use httpcapture::capture::request::Transport;
use httpcapture::config::CaptureSettings;
use httpcapture::storage::{Database, RequestRepository};

/// An assembled application over a throwaway database file.
pub struct TestApp {
    pub app: App,
    db_path: PathBuf,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_settings(&CaptureSettings::default())
    }

    pub fn with_settings(settings: &CaptureSettings) -> Self {
        let db_path = std::env::temp_dir().join(format!(
            "httpcapture-it-{}.sqlite",
            uuid::Uuid::new_v4()
        ));
        let database = Database::open(db_path.clone()).expect("open test database");
        let repository = Arc::new(RequestRepository::new(database));
        let app = App::new(repository, settings);
        Self { app, db_path }
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_path);
    }
}

/// Transport metadata for a synthetic request.
pub fn transport(method: &str, target: &str, headers: &[(&str, &str)]) -> Transport {
    Transport {
        method: Some(method.to_string()),
        target: Some(target.to_string()),
        headers: headers
            .iter()
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect(),
        remote_addr: Some("10.0.0.5".to_string()),
        ..Transport::default()
    }
}
