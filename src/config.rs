pub mod defaults;
pub mod settings;
pub mod user;

pub use settings::{EngineSettings, LexicalRule, SettingsFile, StyleMap, TagStyle};
pub use user::{CONFIG_FILE_NAME, load_settings_file, load_user_config, user_config_path};

use std::collections::HashMap;
use std::path::Path;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SettingsEventKind {
    Info,
    Warning,
}

/// Something worth telling the user about while loading settings.
///
/// Loading never fails hard: a broken layer is skipped and reported.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SettingsEvent {
    pub kind: SettingsEventKind,
    pub message: String,
}

impl SettingsEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: SettingsEventKind::Info,
            message: message.into(),
        }
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self {
            kind: SettingsEventKind::Warning,
            message: message.into(),
        }
    }

    /// Forward this event to the `log` facade.
    pub fn log(&self) {
        match self.kind {
            SettingsEventKind::Info => log::info!(target: "irodori::config", "{}", self.message),
            SettingsEventKind::Warning => {
                log::warn!(target: "irodori::config", "{}", self.message)
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct SettingsLoadOutcome {
    pub settings: EngineSettings,
    pub events: Vec<SettingsEvent>,
}

/// Load settings from every layer.
///
/// Layers, lowest precedence first: programmed defaults, user config,
/// `<root>/irodori.toml`, then `override_path`.
pub fn load_settings(root_path: Option<&Path>, override_path: Option<&Path>) -> SettingsLoadOutcome {
    let mut events = Vec::new();

    let defaults = Some(defaults::default_settings());
    let user_config = load_user_config_with_events(&mut events);
    let project = root_path.and_then(|root| {
        let path = root.join(CONFIG_FILE_NAME);
        path.exists()
            .then(|| load_layer(&path, &mut events))
            .flatten()
    });
    let explicit = override_path.and_then(|path| load_layer(path, &mut events));

    let merged = merge_all(&[defaults, user_config, project, explicit]).unwrap_or_default();
    SettingsLoadOutcome {
        settings: EngineSettings::from(merged),
        events,
    }
}

fn load_user_config_with_events(events: &mut Vec<SettingsEvent>) -> Option<SettingsFile> {
    match load_user_config() {
        Ok(Some(settings)) => {
            events.push(SettingsEvent::info("Loaded user config"));
            Some(settings)
        }
        Ok(None) => None,
        Err(err) => {
            events.push(SettingsEvent::warning(format!(
                "Failed to load user config: {}",
                err
            )));
            None
        }
    }
}

fn load_layer(path: &Path, events: &mut Vec<SettingsEvent>) -> Option<SettingsFile> {
    match load_settings_file(path) {
        Ok(settings) => {
            events.push(SettingsEvent::info(format!(
                "Loaded config file: {}",
                path.display()
            )));
            Some(settings)
        }
        Err(err) => {
            events.push(SettingsEvent::warning(format!(
                "Failed to load {}: {}",
                path.display(),
                err
            )));
            None
        }
    }
}

/// Merge multiple layers in order.
/// Later layers in the slice have higher precedence.
pub fn merge_all(configs: &[Option<SettingsFile>]) -> Option<SettingsFile> {
    configs.iter().cloned().reduce(merge_settings).flatten()
}

/// Merge two layers, preferring values from `primary` over `fallback`
pub fn merge_settings(
    fallback: Option<SettingsFile>,
    primary: Option<SettingsFile>,
) -> Option<SettingsFile> {
    match (fallback, primary) {
        (None, None) => None,
        (Some(settings), None) | (None, Some(settings)) => Some(settings),
        (Some(fallback), Some(primary)) => Some(SettingsFile {
            debounce_ms: primary.debounce_ms.or(fallback.debounce_ms),
            split_on_identifier_boundary: primary
                .split_on_identifier_boundary
                .or(fallback.split_on_identifier_boundary),
            identifier: primary.identifier.or(fallback.identifier),
            // Styles merge per tag; a tag entry replaces the whole style
            styles: merge_maps(fallback.styles, primary.styles),
            // Rule lists are ordered, so they replace instead of merging
            lexical: primary.lexical.or(fallback.lexical),
            captures: merge_maps(fallback.captures, primary.captures),
        }),
    }
}

fn merge_maps<V>(mut fallback: HashMap<String, V>, primary: HashMap<String, V>) -> HashMap<String, V> {
    fallback.extend(primary);
    fallback
}
