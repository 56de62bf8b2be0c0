//! Media element state and the native media operations.
//!
//! State lives in the element; every mutation goes through a `Document`
//! method that raises the same events a browser would (`play`, `pause`,
//! `timeupdate`, `ended`, `volumechange`, `loadedmetadata`, `canplay`,
//! `loadstart`, `error`).

use std::time::Duration;

use indextree::NodeId;
use serde::Serialize;
use tracing::debug;

use crate::document::Document;
use crate::error::{DomError, DomResult};
use crate::event::{Event, EventType};

/// Vendor variants of the fullscreen request capability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FullscreenApi {
    /// `requestFullscreen`
    Standard,
    /// `webkitRequestFullscreen`
    Webkit,
    /// `msRequestFullscreen`
    Ms,
}

/// Network state of a media element.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NetworkState {
    /// No source selected.
    #[default]
    Empty,
    /// Source selected, metadata not loaded.
    Loading,
    /// Metadata loaded.
    Idle,
}

/// Live state of a `<video>` or `<audio>` element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MediaState {
    pub(crate) paused: bool,
    pub(crate) ended: bool,
    pub(crate) muted: bool,
    pub(crate) volume: f64,
    pub(crate) current_time: f64,
    pub(crate) duration: Option<f64>,
    pub(crate) src: String,
    pub(crate) network_state: NetworkState,
    pub(crate) error: Option<String>,
    pub(crate) fullscreen_apis: Vec<FullscreenApi>,
}

impl Default for MediaState {
    fn default() -> Self {
        Self {
            paused: true,
            ended: false,
            muted: false,
            volume: 1.0,
            current_time: 0.0,
            duration: None,
            src: String::new(),
            network_state: NetworkState::Empty,
            error: None,
            fullscreen_apis: vec![FullscreenApi::Standard],
        }
    }
}

impl MediaState {
    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn ended(&self) -> bool {
        self.ended
    }

    pub fn muted(&self) -> bool {
        self.muted
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// `None` until metadata has loaded.
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    pub fn src(&self) -> &str {
        &self.src
    }

    pub fn network_state(&self) -> NetworkState {
        self.network_state
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Fullscreen request capabilities, in the order a caller should try them.
    pub fn fullscreen_apis(&self) -> &[FullscreenApi] {
        &self.fullscreen_apis
    }

    pub fn is_playing(&self) -> bool {
        !self.paused && !self.ended
    }
}

impl Document {
    /// Media state of `node`.
    pub fn media(&self, node: NodeId) -> DomResult<&MediaState> {
        self.element(node)?
            .media
            .as_ref()
            .ok_or(DomError::NotMedia(node))
    }

    fn media_mut(&mut self, node: NodeId) -> DomResult<&mut MediaState> {
        self.element_mut(node)?
            .media
            .as_mut()
            .ok_or(DomError::NotMedia(node))
    }

    fn fire(&mut self, kind: EventType, node: NodeId) {
        self.dispatch(Event::new(kind, node));
    }

    /// Media elements that still exist, connected or not.
    pub fn media_elements(&self) -> Vec<NodeId> {
        self.media_nodes
            .iter()
            .copied()
            .filter(|&node| self.is_alive(node))
            .collect()
    }

    /// The source a media element would load: its `src`, else the first
    /// `<source src>` child.
    pub fn current_src(&self, node: NodeId) -> DomResult<String> {
        let media = self.media(node)?;
        if !media.src.is_empty() {
            return Ok(media.src.clone());
        }
        Ok(self
            .children(node)
            .into_iter()
            .filter_map(|child| self.element(child).ok())
            .filter(|el| el.tag() == "source")
            .find_map(|el| el.attr("src").map(str::to_string))
            .unwrap_or_default())
    }

    /// Begin playback. Playing an ended element restarts it from zero.
    pub fn play(&mut self, node: NodeId) -> DomResult<()> {
        let media = self.media_mut(node)?;
        if let Some(error) = &media.error {
            return Err(DomError::Playback(error.clone()));
        }
        if media.ended {
            media.ended = false;
            media.current_time = 0.0;
        }
        if media.paused {
            media.paused = false;
            self.fire(EventType::Play, node);
        }
        Ok(())
    }

    pub fn pause(&mut self, node: NodeId) -> DomResult<()> {
        let media = self.media_mut(node)?;
        if !media.paused {
            media.paused = true;
            self.fire(EventType::Pause, node);
        }
        Ok(())
    }

    /// Seek. The position is clamped to `[0, duration]`.
    pub fn set_current_time(&mut self, node: NodeId, seconds: f64) -> DomResult<()> {
        if seconds.is_nan() {
            return Err(DomError::OutOfRange {
                what: "currentTime",
                value: seconds,
            });
        }
        let media = self.media_mut(node)?;
        let upper = media.duration.unwrap_or(f64::INFINITY);
        media.current_time = seconds.clamp(0.0, upper);
        if media.current_time < upper {
            media.ended = false;
        }
        self.fire(EventType::TimeUpdate, node);
        Ok(())
    }

    /// Set the volume; values outside `[0, 1]` are rejected.
    pub fn set_volume(&mut self, node: NodeId, volume: f64) -> DomResult<()> {
        if !(0.0..=1.0).contains(&volume) {
            return Err(DomError::OutOfRange {
                what: "volume",
                value: volume,
            });
        }
        let media = self.media_mut(node)?;
        if media.volume != volume {
            media.volume = volume;
            self.fire(EventType::VolumeChange, node);
        }
        Ok(())
    }

    pub fn set_muted(&mut self, node: NodeId, muted: bool) -> DomResult<()> {
        let media = self.media_mut(node)?;
        if media.muted != muted {
            media.muted = muted;
            self.fire(EventType::VolumeChange, node);
        }
        Ok(())
    }

    /// Simulate the network delivering metadata.
    pub fn load_metadata(&mut self, node: NodeId, duration: f64) -> DomResult<()> {
        if !duration.is_finite() || duration < 0.0 {
            return Err(DomError::OutOfRange {
                what: "duration",
                value: duration,
            });
        }
        let media = self.media_mut(node)?;
        media.duration = Some(duration);
        media.network_state = NetworkState::Idle;
        self.fire(EventType::LoadedMetadata, node);
        self.fire(EventType::CanPlay, node);
        Ok(())
    }

    /// Simulate a decode or network failure.
    pub fn fail_media(&mut self, node: NodeId, message: &str) -> DomResult<()> {
        let media = self.media_mut(node)?;
        media.error = Some(message.to_string());
        media.paused = true;
        media.network_state = NetworkState::Empty;
        self.fire(EventType::Error, node);
        Ok(())
    }

    /// Replace the `src` attribute.
    pub fn set_media_src(&mut self, node: NodeId, src: &str) -> DomResult<()> {
        self.media(node)?;
        self.set_attr(node, "src", src)
    }

    /// Reset the element and select its current source, like `load()`.
    pub fn load_media(&mut self, node: NodeId) -> DomResult<()> {
        let src = self.current_src(node)?;
        let media = self.media_mut(node)?;
        let was_playing = !media.paused;
        media.paused = true;
        media.ended = false;
        media.current_time = 0.0;
        media.duration = None;
        media.error = None;
        media.network_state = if src.is_empty() {
            NetworkState::Empty
        } else {
            NetworkState::Loading
        };
        if was_playing {
            self.fire(EventType::Pause, node);
        }
        if !src.is_empty() {
            self.fire(EventType::LoadStart, node);
        }
        Ok(())
    }

    /// Restrict which fullscreen request variants the element exposes.
    pub fn set_fullscreen_apis(&mut self, node: NodeId, apis: &[FullscreenApi]) -> DomResult<()> {
        self.media_mut(node)?.fullscreen_apis = apis.to_vec();
        Ok(())
    }

    /// Enter fullscreen through a specific vendor variant.
    pub fn request_fullscreen(&mut self, node: NodeId, api: FullscreenApi) -> DomResult<()> {
        if !self.media(node)?.fullscreen_apis.contains(&api) {
            return Err(DomError::NotSupported(format!("{api:?} fullscreen request")));
        }
        debug!(node = ?node, api = ?api, "entering fullscreen");
        self.fullscreen = Some(node);
        Ok(())
    }

    pub fn exit_fullscreen(&mut self) {
        self.fullscreen = None;
    }

    pub fn fullscreen_element(&self) -> Option<NodeId> {
        self.fullscreen.filter(|&node| self.is_alive(node))
    }

    /// Advance every playing element by `elapsed`.
    pub(crate) fn progress_media(&mut self, elapsed: Duration) {
        for node in self.media_elements() {
            let Ok(media) = self.media_mut(node) else {
                continue;
            };
            if !media.is_playing() {
                continue;
            }
            let Some(duration) = media.duration else {
                continue;
            };

            media.current_time = (media.current_time + elapsed.as_secs_f64()).min(duration);
            let finished = media.current_time >= duration;
            if finished {
                media.paused = true;
                media.ended = true;
            }

            self.fire(EventType::TimeUpdate, node);
            if finished {
                self.fire(EventType::Pause, node);
                self.fire(EventType::Ended, node);
            }
        }
    }
}
