use apidocs_plugin::{PluginError, SettingPanel};

use crate::versions;

/// Receives the newly chosen version token.
pub type VersionChanged = Box<dyn Fn(String) + Send + Sync>;

/// Version picker. The panel owns only its selection; persisting the choice
/// is delegated to the callback supplied by the plugin.
pub struct SettingsPanel {
    selected: usize,
    on_change: VersionChanged,
}

impl SettingsPanel {
    pub fn new(current_version: &str, on_change: VersionChanged) -> Self {
        Self {
            selected: versions::token_to_index(current_version),
            on_change,
        }
    }
}

impl SettingPanel for SettingsPanel {
    fn title(&self) -> &str {
        "Default Revit API version"
    }

    fn choices(&self) -> Vec<String> {
        versions::labels()
    }

    fn selected_index(&self) -> usize {
        self.selected
    }

    fn select(&mut self, index: usize) -> Result<(), PluginError> {
        let token = versions::index_to_token(index).ok_or_else(|| {
            PluginError::InvalidSetting(format!("no version at position {}", index + 1))
        })?;
        self.selected = index;
        (self.on_change)(token.to_string());
        Ok(())
    }
}
