use crate::scene_editor::controls::OrbitSettings;
use crate::scene_editor::error::{EditorError, EditorResult};
use crate::scene_editor::geometry::PrimitiveKind;
use crate::scene_editor::interaction::ToolMode;
use crate::scene_editor::viewport::ViewportConfig;
use bevy::prelude::Resource;
use ron::ser::PrettyConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub viewport: ViewportConfig,
    pub initial_tool: ToolMode,
    pub initial_primitive: PrimitiveKind,
    pub seed_initial_object: bool,
    pub orbit: OrbitSettings,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            viewport: ViewportConfig::default(),
            initial_tool: ToolMode::Create,
            initial_primitive: PrimitiveKind::Box,
            seed_initial_object: true,
            orbit: OrbitSettings::default(),
        }
    }
}

impl EditorConfig {
    pub fn sanitized(self) -> Self {
        Self {
            viewport: self.viewport.sanitized(),
            orbit: self.orbit.sanitized(),
            ..self
        }
    }
}

/// Where the running session saves its settings back to.
#[derive(Resource, Debug, Clone)]
pub struct ConfigPath(pub PathBuf);

pub fn load_editor_config(path: &Path) -> EditorResult<EditorConfig> {
    let text = fs::read_to_string(path).map_err(|source| EditorError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let config = ron::from_str::<EditorConfig>(&text).map_err(|source| EditorError::ConfigParse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(config.sanitized())
}

/// Missing file means defaults; a broken file is reported and ignored.
pub fn load_editor_config_or_default(path: &Path) -> EditorConfig {
    if !path.exists() {
        return EditorConfig::default();
    }
    match load_editor_config(path) {
        Ok(config) => {
            info!("loaded editor settings from {}", path.display());
            config
        }
        Err(err) => {
            warn!("ignoring editor settings: {err}");
            EditorConfig::default()
        }
    }
}

/// An explicitly requested file must load; the default location may be absent
/// or broken.
pub fn load_startup_config(path: &Path, required: bool) -> EditorResult<EditorConfig> {
    if required {
        load_editor_config(path)
    } else {
        Ok(load_editor_config_or_default(path))
    }
}

pub fn save_editor_config(path: &Path, config: &EditorConfig) -> EditorResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| EditorError::ConfigWrite {
            path: parent.to_path_buf(),
            reason: err.to_string(),
        })?;
    }

    let content = ron::ser::to_string_pretty(config, PrettyConfig::new()).map_err(|err| {
        EditorError::ConfigWrite {
            path: path.to_path_buf(),
            reason: err.to_string(),
        }
    })?;
    fs::write(path, content).map_err(|err| EditorError::ConfigWrite {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}
