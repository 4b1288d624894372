#![allow(dead_code)]

pub mod fake_helpdesk;

use fake_helpdesk::FakeHelpdesk;
use receipt_helpdesk_harness::blob::mock::MockBlobStore;
use receipt_helpdesk_harness::config::AppConfig;
use receipt_helpdesk_harness::helpdesk::HelpdeskClient;
use receipt_helpdesk_harness::scenario::{Harness, ScenarioContext};
use receipt_helpdesk_harness::store::mock::MockDocumentStore;
use std::collections::HashMap;
use std::sync::Arc;

pub struct TestEnv {
    pub config: AppConfig,
    pub store: MockDocumentStore,
    pub blobs: MockBlobStore,
    pub helpdesk: FakeHelpdesk,
    pub harness: Arc<Harness>,
    pub work_dir: tempfile::TempDir,
}

impl TestEnv {
    pub fn context(&self) -> ScenarioContext {
        ScenarioContext::new(self.harness.clone())
    }
}

pub async fn test_env() -> TestEnv {
    test_env_with(&[]).await
}

pub async fn test_env_with(overrides: &[(&str, &str)]) -> TestEnv {
    let store = MockDocumentStore::new();
    let blobs = MockBlobStore::new();

    let mut vars = HashMap::from([
        ("SUBKEY".to_string(), "test-subkey".to_string()),
        ("canary".to_string(), "true".to_string()),
        ("POLL_INTERVAL_MS".to_string(), "10".to_string()),
        ("SCENARIO_TIMEOUT_SEC".to_string(), "5".to_string()),
    ]);
    for (k, v) in overrides {
        vars.insert(k.to_string(), v.to_string());
    }
    let mut config = AppConfig::from_map(&vars).unwrap();

    let helpdesk = FakeHelpdesk::start(store.clone(), blobs.clone(), config.collections.clone()).await;
    config.helpdesk_url = Some(helpdesk.url.clone());
    config.tokenizer_url = Some(helpdesk.url.clone());

    let client = HelpdeskClient::from_config(&config).unwrap();
    let mut harness = Harness::new(&config, Arc::new(store.clone()), Arc::new(blobs.clone()), client);
    let work_dir = tempfile::tempdir().unwrap();
    harness.settings.work_dir = work_dir.path().to_path_buf();

    TestEnv {
        config,
        store,
        blobs,
        helpdesk,
        harness: Arc::new(harness),
        work_dir,
    }
}
