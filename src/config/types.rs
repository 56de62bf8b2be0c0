use lightframe_dom::LightboxOptions;
use lightframe_player::{LifecycleConfig, PlayerConfig};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub player: PlayerConfig,

    #[serde(default)]
    pub lightbox: LightboxConfig,

    #[serde(default)]
    pub lifecycle: LifecycleConfig,

    #[serde(default)]
    pub data: DataConfig,
}

/// Construction options for the lightbox widget.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct LightboxConfig {
    #[serde(default = "default_selector")]
    pub selector: String,

    #[serde(default = "default_true")]
    pub touch_navigation: bool,

    #[serde(default, rename = "loop")]
    pub loop_slides: bool,

    #[serde(default)]
    pub zoomable: bool,

    /// Whether the widget script is present on the page. When it is not,
    /// galleries render without a lightbox and no overlay is reconciled.
    #[serde(default = "default_true")]
    pub available: bool,
}

fn default_selector() -> String {
    "a.glightbox".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LightboxConfig {
    fn default() -> Self {
        Self {
            selector: default_selector(),
            touch_navigation: true,
            loop_slides: false,
            zoomable: false,
            available: true,
        }
    }
}

impl LightboxConfig {
    pub fn options(&self) -> LightboxOptions {
        LightboxOptions {
            selector: self.selector.clone(),
            touch_navigation: self.touch_navigation,
            loop_slides: self.loop_slides,
            zoomable: self.zoomable,
        }
    }
}

/// Where page data is read from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DataConfig {
    /// Directory holding `projects.json`, `gallery.json` and the per-cat
    /// profiles. Relative paths given on the command line that do not exist
    /// from the working directory are looked up here.
    #[serde(default = "default_data_dir")]
    pub dir: PathBuf,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            dir: default_data_dir(),
        }
    }
}
