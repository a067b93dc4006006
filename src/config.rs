use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::snap::{DEFAULT_THRESHOLD, SnapOptions};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    #[default]
    Software,
    Accelerated,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapConfig {
    /// Pixel distance below which an alignment snaps.
    pub threshold: f64,
    /// Snap to the container origin and center.
    pub canvas_targets: bool,
    pub gap_snapping: bool,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            canvas_targets: true,
            gap_snapping: true,
        }
    }
}

impl SnapConfig {
    pub fn options(&self, container: Option<crate::geometry::Rect>) -> SnapOptions {
        SnapOptions {
            threshold: self.threshold,
            container: if self.canvas_targets { container } else { None },
            gap_snapping: self.gap_snapping,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    pub cell_size: f64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { cell_size: 64.0 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub backend: BackendKind,
    /// Push overlapping siblings out of the way while dragging.
    pub displacement: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Software,
            displacement: true,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub snap: SnapConfig,
    pub index: IndexConfig,
    pub bridge: BridgeConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigFile {
    pub snap: Option<SnapConfigFile>,
    pub index: Option<IndexConfigFile>,
    pub bridge: Option<BridgeConfigFile>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapConfigFile {
    pub threshold: Option<f64>,
    pub canvas_targets: Option<bool>,
    pub gap_snapping: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexConfigFile {
    pub cell_size: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeConfigFile {
    pub backend: Option<BackendKind>,
    pub displacement: Option<bool>,
}

impl EngineConfig {
    /// Applies the overrides present in a parsed config file.
    pub fn merge(mut self, file: ConfigFile) -> Self {
        if let Some(snap) = file.snap {
            if let Some(v) = snap.threshold {
                self.snap.threshold = v;
            }
            if let Some(v) = snap.canvas_targets {
                self.snap.canvas_targets = v;
            }
            if let Some(v) = snap.gap_snapping {
                self.snap.gap_snapping = v;
            }
        }
        if let Some(index) = file.index {
            if let Some(v) = index.cell_size {
                self.index.cell_size = v;
            }
        }
        if let Some(bridge) = file.bridge {
            if let Some(v) = bridge.backend {
                self.bridge.backend = v;
            }
            if let Some(v) = bridge.displacement {
                self.bridge.displacement = v;
            }
        }
        self
    }
}

pub fn parse_config(contents: &str) -> anyhow::Result<EngineConfig> {
    let parsed: ConfigFile = serde_json::from_str(contents)?;
    Ok(EngineConfig::default().merge(parsed))
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<EngineConfig> {
    let Some(path) = path else {
        return Ok(EngineConfig::default());
    };
    let contents = std::fs::read_to_string(path)?;
    parse_config(&contents)
}
