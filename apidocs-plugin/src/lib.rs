use std::fmt::{self, Debug};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

mod browser;
mod query;

pub use browser::{BrowserOpener, SystemBrowser};
pub use query::Query;

/// Callback bound to a result, invoked by the host when the user selects it.
/// Returns whether the selection was handled.
pub type Action = Arc<dyn Fn(&ActionContext) -> bool + Send + Sync>;

/// The standardized data structure for a single result item.
#[derive(Clone)]
pub struct ResultItem {
    pub id: String,
    pub title: String,
    pub subtitle: String,
    pub autocomplete_text: String,
    pub icon: Option<String>,
    pub action: Option<Action>,
}

impl ResultItem {
    /// Runs the bound action. Items without an action are never handled.
    pub fn activate(&self, context: &ActionContext) -> bool {
        match &self.action {
            Some(action) => action(context),
            None => false,
        }
    }
}

impl Debug for ResultItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultItem")
            .field("id", &self.id)
            .field("title", &self.title)
            .field("subtitle", &self.subtitle)
            .field("autocomplete_text", &self.autocomplete_text)
            .field("icon", &self.icon)
            .field("action", &self.action.is_some())
            .finish()
    }
}

/// Modifier keys held down when a result was activated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpecialKeyState {
    pub ctrl: bool,
    pub shift: bool,
    pub alt: bool,
    pub win: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ActionContext {
    pub special_keys: SpecialKeyState,
}

/// Everything the host hands a plugin once, before the first query.
#[derive(Debug, Clone, Default)]
pub struct PluginInitContext {
    /// Directory the plugin was installed into.
    pub plugin_directory: PathBuf,
    /// Directory the plugin may persist its own state in.
    pub data_directory: PathBuf,
    /// Browser executable to use for opening links, if the user picked one.
    pub browser: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct PluginMetadata {
    pub id: &'static str,
    pub name: &'static str,
    pub action_keyword: &'static str,
    pub description: &'static str,
    pub website: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("query was cancelled")]
    Cancelled,

    #[error("transport failure: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    #[error("plugin initialization failed: {0}")]
    Init(String),

    #[error("invalid setting: {0}")]
    InvalidSetting(String),
}

#[async_trait]
pub trait Plugin: Send + Sync {
    /// Static description of the plugin.
    fn metadata(&self) -> &PluginMetadata;

    /// Called once by the host before any query is issued.
    async fn init(&mut self, context: PluginInitContext) -> Result<(), PluginError>;

    /// Called by the host to get results for a given query.
    ///
    /// A fired `cancel` token yields [`PluginError::Cancelled`] rather than an
    /// empty result list.
    async fn query(
        &self,
        query: &Query,
        cancel: CancellationToken,
    ) -> Result<Vec<ResultItem>, PluginError>;
}

/// Implemented by plugins that expose user-editable settings.
pub trait SettingProvider {
    fn create_setting_panel(&self) -> Box<dyn SettingPanel>;
}

/// A single-choice settings surface rendered by the host.
pub trait SettingPanel: Send {
    fn title(&self) -> &str;

    /// Labels in display order.
    fn choices(&self) -> Vec<String>;

    fn selected_index(&self) -> usize;

    /// Applies a new selection and persists it.
    fn select(&mut self, index: usize) -> Result<(), PluginError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    fn item(action: Option<Action>) -> ResultItem {
        ResultItem {
            id: "test::1".to_string(),
            title: "Title".to_string(),
            subtitle: "Subtitle".to_string(),
            autocomplete_text: "Short".to_string(),
            icon: None,
            action,
        }
    }

    #[test]
    fn test_activate_without_action_is_unhandled() {
        assert!(!item(None).activate(&ActionContext::default()));
    }

    #[test]
    fn test_activate_passes_modifier_state() {
        let saw_ctrl = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&saw_ctrl);
        let result = item(Some(Arc::new(move |ctx: &ActionContext| {
            flag.store(ctx.special_keys.ctrl, Ordering::SeqCst);
            true
        })));

        let ctx = ActionContext {
            special_keys: SpecialKeyState {
                ctrl: true,
                ..Default::default()
            },
        };
        assert!(result.activate(&ctx));
        assert!(saw_ctrl.load(Ordering::SeqCst));
    }

    #[test]
    fn test_debug_hides_closure() {
        let rendered = format!("{:?}", item(Some(Arc::new(|_: &ActionContext| true))));
        assert!(rendered.contains("action: true"));
    }
}
