use std::sync::Arc;

use apidocs_plugin::{ActionContext, BrowserOpener, ResultItem, SpecialKeyState};
use tracing::{debug, warn};
use url::Url;

use crate::client::SearchHit;

const RESULT_ICON: &str = "help-browser";

/// Opens selected search hits in the browser.
#[derive(Clone)]
pub struct ResultActionDispatcher {
    opener: Arc<dyn BrowserOpener>,
}

impl ResultActionDispatcher {
    pub fn new(opener: Arc<dyn BrowserOpener>) -> Self {
        Self { opener }
    }

    /// Ctrl opens a new browser window, anything else a new tab. Open failures
    /// are logged only; the activation always counts as handled.
    pub fn activate(&self, url: &Url, keys: SpecialKeyState) -> bool {
        let opened = if keys.ctrl {
            debug!("Opening {url} in a new window");
            self.opener.open_in_window(url.as_str())
        } else {
            debug!("Opening {url} in a new tab");
            self.opener.open_in_tab(url.as_str())
        };
        if let Err(e) = opened {
            warn!("Failed to open {url}: {e}");
        }
        true
    }

    /// Converts a hit into a host result whose action opens the hit's page.
    pub fn bind(&self, plugin_name: &str, hit: SearchHit) -> ResultItem {
        let dispatcher = self.clone();
        let url = hit.url;
        ResultItem {
            id: format!("{}::{}", plugin_name, url),
            title: hit.title,
            subtitle: hit.subtitle,
            autocomplete_text: hit.autocomplete_text,
            icon: Some(RESULT_ICON.to_string()),
            action: Some(Arc::new(move |ctx: &ActionContext| {
                dispatcher.activate(&url, ctx.special_keys)
            })),
        }
    }
}
