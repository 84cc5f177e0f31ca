use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::geometry::Color;
use crate::scene::TextFontFamily;

const CONFIG_DIR: &str = "snipkit";
const CONFIG_FILE: &str = "config.json";

/// Names a config file directly, skipping the directory lookup.
pub const CONFIG_PATH_ENV: &str = "SNIPKIT_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ConfigPathError {
    #[error("none of SNIPKIT_CONFIG, XDG_CONFIG_HOME or HOME is set")]
    NoConfigLocation,
}

/// Editor settings from `config.json`. Every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub history_capacity: usize,
    pub handle_size: u32,
    pub min_font_size: f32,
    pub bubble_padding: u32,
    pub bubble_tail_height: u32,
    pub bubble_tail_width: u32,
    pub stroke_width: u32,
    pub stroke_color: Color,
    pub text_size: f32,
    pub text_color: Color,
    pub text_family: TextFontFamily,
    pub bubble_font_size: f32,
    pub bubble_stroke: Color,
    pub bubble_fill: Color,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_capacity: crate::history::DEFAULT_HISTORY_CAPACITY,
            handle_size: 10,
            min_font_size: 5.0,
            bubble_padding: 10,
            bubble_tail_height: 15,
            bubble_tail_width: 10,
            stroke_width: 5,
            stroke_color: Color::new(255, 0, 0),
            text_size: 30.0,
            text_color: Color::BLACK,
            text_family: TextFontFamily::Sans,
            bubble_font_size: 14.0,
            bubble_stroke: Color::BLACK,
            bubble_fill: Color::WHITE,
        }
    }
}

/// Environment inputs that decide where `config.json` is read from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigLocations {
    pub explicit: Option<PathBuf>,
    pub xdg_config_home: Option<PathBuf>,
    pub home: Option<PathBuf>,
}

impl ConfigLocations {
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var_os(name).map(PathBuf::from);
        Self {
            explicit: var(CONFIG_PATH_ENV),
            xdg_config_home: var("XDG_CONFIG_HOME"),
            home: var("HOME"),
        }
    }

    /// `SNIPKIT_CONFIG` first, then `$XDG_CONFIG_HOME/snipkit/config.json`,
    /// then `$HOME/.config/snipkit/config.json`. Empty values count as unset.
    pub fn resolve(&self) -> Result<PathBuf, ConfigPathError> {
        if let Some(path) = non_empty(&self.explicit) {
            return Ok(path.to_path_buf());
        }
        let root = match (non_empty(&self.xdg_config_home), non_empty(&self.home)) {
            (Some(xdg), _) => xdg.to_path_buf(),
            (None, Some(home)) => home.join(".config"),
            (None, None) => return Err(ConfigPathError::NoConfigLocation),
        };
        Ok(root.join(CONFIG_DIR).join(CONFIG_FILE))
    }
}

fn non_empty(path: &Option<PathBuf>) -> Option<&Path> {
    path.as_deref().filter(|path| !path.as_os_str().is_empty())
}

pub fn load_editor_config() -> EditorConfig {
    load_editor_config_at(&ConfigLocations::from_env())
}

fn load_editor_config_at(locations: &ConfigLocations) -> EditorConfig {
    match locations.resolve() {
        Ok(path) if path.exists() => load_editor_config_from(&path),
        Ok(path) => {
            if non_empty(&locations.explicit).is_some() {
                tracing::warn!(?path, "{CONFIG_PATH_ENV} names a missing file; using defaults");
            }
            EditorConfig::default()
        }
        Err(err) => {
            tracing::debug!(%err, "no config location; using defaults");
            EditorConfig::default()
        }
    }
}

/// Reads `path`, falling back to defaults when it is unreadable or malformed.
pub fn load_editor_config_from(path: &Path) -> EditorConfig {
    match std::fs::read_to_string(path) {
        Ok(contents) => match serde_json::from_str(&contents) {
            Ok(config) => {
                tracing::debug!(?path, "loaded editor config");
                config
            }
            Err(err) => {
                tracing::warn!(?err, ?path, "failed to parse editor config; using defaults");
                EditorConfig::default()
            }
        },
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read editor config; using defaults");
            EditorConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locations(explicit: Option<&str>, xdg: Option<&str>, home: Option<&str>) -> ConfigLocations {
        ConfigLocations {
            explicit: explicit.map(PathBuf::from),
            xdg_config_home: xdg.map(PathBuf::from),
            home: home.map(PathBuf::from),
        }
    }

    #[test]
    fn explicit_path_wins_over_directory_lookup() {
        let path = locations(Some("/tmp/custom.json"), Some("/tmp/xdg"), Some("/tmp/home"))
            .resolve()
            .expect("path should resolve");
        assert_eq!(path, PathBuf::from("/tmp/custom.json"));
    }

    #[test]
    fn xdg_then_home_dot_config() {
        let path = locations(None, Some("/tmp/xdg"), Some("/tmp/home"))
            .resolve()
            .expect("path should resolve");
        assert_eq!(path, PathBuf::from("/tmp/xdg/snipkit/config.json"));

        let path = locations(Some(""), Some(""), Some("/tmp/home"))
            .resolve()
            .expect("path should resolve");
        assert_eq!(path, PathBuf::from("/tmp/home/.config/snipkit/config.json"));
    }

    #[test]
    fn no_location_is_an_error() {
        let error = ConfigLocations::default()
            .resolve()
            .expect_err("no root directory");
        assert_eq!(error, ConfigPathError::NoConfigLocation);
    }

    #[test]
    fn partial_config_keeps_defaults_for_missing_fields() {
        let root = tempfile::tempdir().expect("temp dir");
        let dir = root.path().join("snipkit");
        std::fs::create_dir_all(&dir).expect("config dir");
        std::fs::write(
            dir.join("config.json"),
            r##"{ "history_capacity": 5, "stroke_color": "#00ff00", "text_size": 12, "text_family": "Courier" }"##,
        )
        .expect("write config");

        let config = load_editor_config_at(&ConfigLocations {
            xdg_config_home: Some(root.path().to_path_buf()),
            ..ConfigLocations::default()
        });
        assert_eq!(config.history_capacity, 5);
        assert_eq!(config.stroke_color, Color::new(0, 255, 0));
        assert_eq!(config.text_size, 12.0);
        assert_eq!(config.text_family, TextFontFamily::Monospace);
        assert_eq!(config.handle_size, 10);
        assert_eq!(config.bubble_fill, Color::WHITE);
    }

    #[test]
    fn malformed_or_missing_config_falls_back_to_defaults() {
        let root = tempfile::tempdir().expect("temp dir");
        assert_eq!(
            load_editor_config_at(&ConfigLocations {
                explicit: Some(root.path().join("absent.json")),
                ..ConfigLocations::default()
            }),
            EditorConfig::default()
        );

        let path = root.path().join("broken.json");
        std::fs::write(&path, r##"{ "stroke_color": "red" }"##).expect("write config");
        assert_eq!(load_editor_config_from(&path), EditorConfig::default());

        std::fs::write(&path, r##"{ "text_family": "wingdings" }"##).expect("write config");
        assert_eq!(load_editor_config_from(&path), EditorConfig::default());
    }
}
