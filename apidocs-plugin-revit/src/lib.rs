use std::sync::Arc;

use apidocs_plugin::{
    BrowserOpener, Plugin, PluginError, PluginInitContext, PluginMetadata, Query, ResultItem,
    SettingPanel, SettingProvider, SystemBrowser,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

pub mod client;
pub mod dispatcher;
pub mod error;
pub mod panel;
pub mod settings;
pub mod versions;

use client::SearchClient;
use dispatcher::ResultActionDispatcher;
use error::SearchError;
use panel::SettingsPanel;
use settings::{Settings, SettingsStore};

pub static METADATA: PluginMetadata = PluginMetadata {
    id: "revit-api-search",
    name: "Revit API Search",
    action_keyword: "rvt",
    description: "Search the Revit API documentation",
    website: client::BASE_URL,
};

/// In-memory settings and where they are persisted. The store is only known
/// after `init`; until then changes stay in memory.
#[derive(Debug, Default)]
struct SettingsState {
    settings: Settings,
    store: Option<SettingsStore>,
}

impl SettingsState {
    fn set_version(&mut self, token: String) {
        self.settings.default_version = token;
        match &self.store {
            Some(store) => store.save(&self.settings),
            None => debug!("Plugin not initialized, keeping settings in memory only"),
        }
    }
}

pub struct RevitApiSearch {
    client: SearchClient,
    dispatcher: ResultActionDispatcher,
    state: Arc<RwLock<SettingsState>>,
}

impl RevitApiSearch {
    pub fn new() -> Result<Self, SearchError> {
        Ok(Self::with_client(SearchClient::new()?))
    }

    pub fn with_client(client: SearchClient) -> Self {
        Self {
            client,
            dispatcher: ResultActionDispatcher::new(Arc::new(SystemBrowser::default())),
            state: Arc::new(RwLock::new(SettingsState::default())),
        }
    }

    pub fn with_browser(mut self, opener: Arc<dyn BrowserOpener>) -> Self {
        self.dispatcher = ResultActionDispatcher::new(opener);
        self
    }

    /// The version token queries currently run against.
    pub fn version(&self) -> String {
        self.state.read().settings.default_version.clone()
    }

    /// Changes the version and saves the settings immediately.
    pub fn set_version(&self, token: impl Into<String>) {
        self.state.write().set_version(token.into());
    }
}

#[async_trait]
impl Plugin for RevitApiSearch {
    fn metadata(&self) -> &PluginMetadata {
        &METADATA
    }

    async fn init(&mut self, context: PluginInitContext) -> Result<(), PluginError> {
        let store = SettingsStore::in_directory(&context.data_directory);
        let settings = {
            let store = store.clone();
            tokio::task::spawn_blocking(move || store.load())
                .await
                .map_err(settings_load_failed)?
        };
        info!(
            "Initialized with Revit API version {} (settings at {:?})",
            settings.default_version,
            store.path()
        );

        if let Some(exe) = context.browser {
            debug!("Opening results with {:?}", exe);
            self.dispatcher = ResultActionDispatcher::new(Arc::new(SystemBrowser::new(Some(exe))));
        }

        *self.state.write() = SettingsState {
            settings,
            store: Some(store),
        };
        Ok(())
    }

    async fn query(
        &self,
        query: &Query,
        cancel: CancellationToken,
    ) -> Result<Vec<ResultItem>, PluginError> {
        if query.is_blank() {
            return Ok(Vec::new());
        }

        let version = self.version();
        let hits = self.client.query(&query.search(), &version, cancel).await?;

        Ok(hits
            .into_iter()
            .map(|hit| self.dispatcher.bind(METADATA.name, hit))
            .collect())
    }
}

fn settings_load_failed(err: tokio::task::JoinError) -> PluginError {
    PluginError::Init(format!("settings load task failed: {err}"))
}

impl SettingProvider for RevitApiSearch {
    fn create_setting_panel(&self) -> Box<dyn SettingPanel> {
        let state = Arc::clone(&self.state);
        Box::new(SettingsPanel::new(
            &self.version(),
            Box::new(move |token: String| state.write().set_version(token)),
        ))
    }
}

/// Entry point for hosts that load the plugin dynamically. Returns null if the
/// HTTP client cannot be created.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn _apidocs_init() -> *mut dyn Plugin {
    match RevitApiSearch::new() {
        Ok(plugin) => Box::into_raw(Box::new(plugin)),
        Err(e) => {
            error!("Failed to create {}: {}", METADATA.name, e);
            std::ptr::null_mut::<RevitApiSearch>() as *mut dyn Plugin
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::tests::{FakeTransport, envelope};
    use crate::dispatcher::tests::{Opened, RecordingBrowser};
    use apidocs_plugin::{ActionContext, SpecialKeyState};
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;
    use serde_json::json;
    use tempfile::TempDir;
    use url::Url;

    fn plugin(transport: Arc<FakeTransport>) -> (RevitApiSearch, Arc<RecordingBrowser>) {
        let client =
            SearchClient::with_transport(Url::parse(client::BASE_URL).unwrap(), transport).unwrap();
        let browser = Arc::new(RecordingBrowser::default());
        let plugin = RevitApiSearch::with_client(client).with_browser(browser.clone());
        (plugin, browser)
    }

    fn context(dir: &TempDir) -> PluginInitContext {
        PluginInitContext {
            plugin_directory: dir.path().to_path_buf(),
            data_directory: dir.path().join("data"),
            browser: None,
        }
    }

    #[tokio::test]
    async fn test_query_uses_saved_version() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("data")).unwrap();
        std::fs::write(
            dir.path().join("data").join("settings.json"),
            r#"{ "DefaultVersion": "2025.3" }"#,
        )
        .unwrap();
        let transport = FakeTransport::new(StatusCode::OK, envelope(json!([])));
        let (mut plugin, _) = plugin(transport.clone());

        plugin.init(context(&dir)).await.unwrap();
        plugin
            .query(&Query::new("rvt wall", Some("rvt")), CancellationToken::new())
            .await
            .unwrap();

        let requests = transport.requests.lock().unwrap();
        assert_eq!(requests[0].path(), "/2025.3/search");
        assert_eq!(requests[0].query(), Some("query=wall"));
    }

    #[tokio::test]
    async fn test_results_open_in_browser() {
        let body = envelope(json!([{
            "title": "Wall Class",
            "description": "Represents a wall",
            "short_title": "Wall",
            "href": "abc.htm",
        }]));
        let (plugin, browser) = plugin(FakeTransport::new(StatusCode::OK, body));

        let results = plugin
            .query(&Query::new("wall", None), CancellationToken::new())
            .await
            .unwrap();
        let ctrl = ActionContext {
            special_keys: SpecialKeyState {
                ctrl: true,
                ..Default::default()
            },
        };

        assert_eq!(results.len(), 1);
        assert!(results[0].activate(&ctrl));
        assert_eq!(
            *browser.opened.lock().unwrap(),
            vec![Opened::Window("https://www.revitapidocs.com/2024/abc.htm".to_string())]
        );
    }

    #[tokio::test]
    async fn test_panel_writes_through_to_settings_file() {
        let dir = TempDir::new().unwrap();
        let transport = FakeTransport::new(StatusCode::OK, envelope(json!([])));
        let (mut plugin, _) = plugin(transport.clone());
        plugin.init(context(&dir)).await.unwrap();

        let mut panel = plugin.create_setting_panel();
        assert_eq!(panel.selected_index(), versions::default_index());
        panel.select(2).unwrap();

        assert_eq!(plugin.version(), "2024");
        let store = SettingsStore::in_directory(&dir.path().join("data"));
        assert_eq!(store.load().default_version, "2024");

        plugin
            .query(&Query::new("wall", None), CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(transport.requests.lock().unwrap()[0].path(), "/2024/search");
    }

    #[test]
    fn test_set_version_before_init_stays_in_memory() {
        let (plugin, _) = plugin(FakeTransport::new(StatusCode::OK, ""));
        assert_eq!(plugin.version(), "2023");

        plugin.set_version("2026");

        assert_eq!(plugin.version(), "2026");
    }

    #[tokio::test]
    async fn test_cancellation_is_not_an_empty_result() {
        let (plugin, _) = plugin(FakeTransport::new(StatusCode::OK, envelope(json!([]))));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = plugin.query(&Query::new("wall", None), cancel).await;

        assert!(matches!(result, Err(PluginError::Cancelled)));
    }

    #[tokio::test]
    async fn test_failed_settings_task_is_an_init_error() {
        let err = tokio::task::spawn_blocking(|| -> Settings { panic!("disk on fire") })
            .await
            .unwrap_err();

        let err = settings_load_failed(err);

        assert!(matches!(err, PluginError::Init(_)));
        assert!(err.to_string().starts_with("plugin initialization failed"));
    }

    #[test]
    fn test_ffi_constructor() {
        let raw = unsafe { _apidocs_init() };
        assert!(!raw.is_null());
        let plugin = unsafe { Box::from_raw(raw) };
        assert_eq!(plugin.metadata().action_keyword, "rvt");
    }
}
