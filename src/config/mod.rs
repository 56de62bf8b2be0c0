mod types;

pub use types::*;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let mut config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;
    expand_paths(&mut config);

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = ["./lightframe.toml", "~/.config/lightframe/config.toml"];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Resolve a page data file. A path that exists as given wins; otherwise a
/// relative path is looked up under `data.dir`.
pub fn resolve_data_path(config: &Config, path: &Path) -> PathBuf {
    if path.is_absolute() || path.exists() {
        return path.to_path_buf();
    }
    config.data.dir.join(path)
}

fn expand_paths(config: &mut Config) {
    let raw = config.data.dir.to_string_lossy().into_owned();
    let expanded = shellexpand::tilde(&raw);
    config.data.dir = expanded.as_ref().into();
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    let player = &config.player;

    if player.controls_idle_hide_ms == 0 {
        anyhow::bail!("player.controls_idle_hide_ms cannot be 0");
    }

    if !player.progress_seek_step_secs.is_finite() || player.progress_seek_step_secs <= 0.0 {
        anyhow::bail!(
            "player.progress_seek_step_secs must be positive, got {}",
            player.progress_seek_step_secs
        );
    }

    if !player.video_seek_step_secs.is_finite() || player.video_seek_step_secs <= 0.0 {
        anyhow::bail!(
            "player.video_seek_step_secs must be positive, got {}",
            player.video_seek_step_secs
        );
    }

    let threshold = player.low_volume_threshold;
    if threshold.is_nan() || threshold <= 0.0 || threshold > 1.0 {
        anyhow::bail!(
            "player.low_volume_threshold must be in (0, 1], got {}",
            player.low_volume_threshold
        );
    }

    if config.lightbox.selector.trim().is_empty() {
        anyhow::bail!("lightbox.selector cannot be empty");
    }
    lightframe_dom::Selector::parse(&config.lightbox.selector)
        .with_context(|| format!("Invalid lightbox.selector: {:?}", config.lightbox.selector))?;

    if !config.lifecycle.cancel_timers_on_unload {
        tracing::warn!("lifecycle.cancel_timers_on_unload is off; wiring timers may outlive the page view");
    }

    Ok(())
}
