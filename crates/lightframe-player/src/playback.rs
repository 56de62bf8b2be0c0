//! Playback control binder.
//!
//! Wires one `<video>` inside a `.video-wrapper` to its custom control
//! surface. Every piece of UI state (icons, progress, time labels, overlay
//! visibility) is recomputed from the element's live media state inside the
//! handler that needs it; nothing about playback is cached between events.
//!
//! Expected markup:
//!
//! ```text
//! .video-wrapper
//!   video
//!   .custom-video-controls
//!     .play-pause-btn > i
//!     .progress-bar > .progress-filled
//!     .current-time  .duration
//!     .mute-btn > i
//!     .volume-slider
//!     .fullscreen-btn
//! ```
//!
//! The binder appends a `.video-play-overlay` to the wrapper. Dragging
//! across the progress bar seeks through document-level move/up listeners,
//! which go through the registry like every other subscription.

use std::cell::Cell;
use std::rc::Rc;

use lightframe_dom::{
    Document, DomError, DomResult, Event, EventTarget, EventType, FullscreenApi, KeyCode, NodeId, Rect,
};
use tracing::{debug, error};

use crate::config::PlayerConfig;
use crate::error::{PlayerError, Result};
use crate::registry::{ListenerRegistry, TimerSlot};

const PLAY_OVERLAY: &str = r#"<div class="video-play-overlay"><div class="play-button"><i class="fas fa-play"></i></div></div>"#;

const ERROR_FALLBACK: &str = r#"<div class="alert alert-warning" role="alert">
<h5><i class="fas fa-exclamation-triangle"></i> Video Loading Issue</h5>
<p>There was a problem loading this video. You can try:</p>
<ul>
<li><a class="direct-link" target="_blank">Opening the video directly</a></li>
<li>Refreshing the page</li>
<li>Checking your internet connection</li>
</ul>
</div>"#;

/// Fullscreen request variants, most preferred first.
const FULLSCREEN_PREFERENCE: [FullscreenApi; 3] =
    [FullscreenApi::Standard, FullscreenApi::Webkit, FullscreenApi::Ms];

/// Format seconds as `m:ss`. Negative and non-finite input shows `0:00`.
pub fn format_time(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };
    format!("{}:{:02}", total / 60, total % 60)
}

/// Played share of the media, in percent. Zero until the duration is known.
pub fn progress_percent(current_time: f64, duration: Option<f64>) -> f64 {
    match duration {
        Some(d) if d > 0.0 => (current_time / d * 100.0).clamp(0.0, 100.0),
        _ => 0.0,
    }
}

/// Where along `rect` a click at `client_x` landed, clamped to `[0, 1]`.
pub fn seek_fraction(client_x: f64, rect: Rect) -> Option<f64> {
    if rect.width <= 0.0 {
        return None;
    }
    Some(((client_x - rect.left) / rect.width).clamp(0.0, 1.0))
}

/// Clamp a relative seek into `[0, duration]`.
pub fn seek_by(current_time: f64, delta: f64, duration: Option<f64>) -> f64 {
    let upper = duration.unwrap_or(f64::INFINITY);
    (current_time + delta).clamp(0.0, upper)
}

/// The three states of the mute button icon.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VolumeIcon {
    Mute,
    Low,
    Full,
}

impl VolumeIcon {
    pub fn from_state(muted: bool, volume: f64, low_threshold: f64) -> Self {
        if muted || volume == 0.0 {
            VolumeIcon::Mute
        } else if volume < low_threshold {
            VolumeIcon::Low
        } else {
            VolumeIcon::Full
        }
    }

    pub fn class_name(&self) -> &'static str {
        match self {
            VolumeIcon::Mute => "fas fa-volume-mute",
            VolumeIcon::Low => "fas fa-volume-down",
            VolumeIcon::Full => "fas fa-volume-up",
        }
    }
}

/// Icon on the play/pause toggle and the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayIcon {
    Play,
    Pause,
    Replay,
}

impl PlayIcon {
    pub fn class_name(&self) -> &'static str {
        match self {
            PlayIcon::Play => "fas fa-play",
            PlayIcon::Pause => "fas fa-pause",
            PlayIcon::Replay => "fas fa-redo",
        }
    }
}

/// Nodes making up one bound player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlayerControls {
    pub video: NodeId,
    pub wrapper: NodeId,
    pub controls: NodeId,
    pub play_pause_btn: NodeId,
    pub play_pause_icon: NodeId,
    pub mute_btn: NodeId,
    pub mute_icon: NodeId,
    pub fullscreen_btn: NodeId,
    pub progress_bar: NodeId,
    pub progress_filled: NodeId,
    pub volume_slider: NodeId,
    pub current_time: NodeId,
    pub duration: NodeId,
    pub overlay: NodeId,
    pub overlay_icon: NodeId,
}

fn require(doc: &Document, scope: NodeId, selector: &'static str) -> Result<NodeId> {
    doc.query(scope, selector)?
        .ok_or(PlayerError::missing(selector))
}

fn set_icon(doc: &mut Document, icon: NodeId, class: &str) -> DomResult<()> {
    doc.set_class_name(icon, class)
}

fn show(doc: &mut Document, node: NodeId, visible: bool) -> DomResult<()> {
    doc.set_style(node, "opacity", if visible { "1" } else { "0" })
}

fn set_overlay_visible(doc: &mut Document, overlay: NodeId, visible: bool) -> DomResult<()> {
    show(doc, overlay, visible)?;
    doc.set_style(overlay, "pointer-events", if visible { "auto" } else { "none" })
}

fn toggle_playback(doc: &mut Document, video: NodeId) -> DomResult<()> {
    if doc.media(video)?.paused() {
        doc.play(video)
    } else {
        doc.pause(video)
    }
}

fn request_fullscreen(doc: &mut Document, video: NodeId) -> DomResult<()> {
    let available = doc.media(video)?.fullscreen_apis().to_vec();
    match FULLSCREEN_PREFERENCE
        .into_iter()
        .find(|api| available.contains(api))
    {
        Some(api) => doc.request_fullscreen(video, api),
        None => {
            debug!(video = ?video, "no fullscreen capability");
            Ok(())
        }
    }
}

/// Seek to where `client_x` falls along `bar`. No-op before metadata.
fn seek_to_pointer(doc: &mut Document, video: NodeId, bar: NodeId, client_x: f64) -> DomResult<()> {
    let Some(duration) = doc.media(video)?.duration() else {
        return Ok(());
    };
    match seek_fraction(client_x, doc.rect(bar)?) {
        Some(fraction) => doc.set_current_time(video, fraction * duration),
        None => Ok(()),
    }
}

/// Overlay glyph for the element's current state.
fn overlay_icon_for(doc: &Document, video: NodeId) -> DomResult<PlayIcon> {
    Ok(if doc.media(video)?.ended() {
        PlayIcon::Replay
    } else {
        PlayIcon::Play
    })
}

fn seek_relative(doc: &mut Document, video: NodeId, delta: f64) -> DomResult<()> {
    let media = doc.media(video)?;
    let target = seek_by(media.current_time(), delta, media.duration());
    doc.set_current_time(video, target)
}

/// Hide the page-level loading indicator, if any.
pub fn hide_loading(doc: &mut Document) -> DomResult<()> {
    if let Some(loading) = doc.query(doc.root(), ".video-loading")? {
        doc.set_style(loading, "display", "none")?;
    }
    Ok(())
}

/// Attaches control behavior to video elements through a registry.
#[derive(Debug, Clone, Default)]
pub struct PlaybackBinder {
    config: PlayerConfig,
}

impl PlaybackBinder {
    pub fn new(config: PlayerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Bind `video` and its control surface.
    ///
    /// All controls are located before anything is installed, so a missing
    /// control leaves the registry and the document untouched.
    pub fn bind(
        &self,
        doc: &mut Document,
        registry: &mut ListenerRegistry,
        video: NodeId,
    ) -> Result<PlayerControls> {
        doc.media(video)?;
        let wrapper = doc
            .closest(video, ".video-wrapper")?
            .ok_or(PlayerError::missing(".video-wrapper"))?;
        let controls = require(doc, wrapper, ".custom-video-controls")?;
        let play_pause_btn = require(doc, controls, ".play-pause-btn")?;
        let play_pause_icon = require(doc, play_pause_btn, "i")?;
        let mute_btn = require(doc, controls, ".mute-btn")?;
        let mute_icon = require(doc, mute_btn, "i")?;
        let fullscreen_btn = require(doc, controls, ".fullscreen-btn")?;
        let progress_bar = require(doc, controls, ".progress-bar")?;
        let progress_filled = require(doc, progress_bar, ".progress-filled")?;
        let volume_slider = require(doc, controls, ".volume-slider")?;
        let current_time = require(doc, controls, ".current-time")?;
        let duration = require(doc, controls, ".duration")?;

        let overlay = doc
            .insert_markup(wrapper, PLAY_OVERLAY)?
            .first()
            .copied()
            .ok_or(PlayerError::missing(".video-play-overlay"))?;
        let overlay_icon = require(doc, overlay, "i")?;

        let ui = PlayerControls {
            video,
            wrapper,
            controls,
            play_pause_btn,
            play_pause_icon,
            mute_btn,
            mute_icon,
            fullscreen_btn,
            progress_bar,
            progress_filled,
            volume_slider,
            current_time,
            duration,
            overlay,
            overlay_icon,
        };

        let before = registry.len();
        self.bind_media_events(doc, registry, ui)?;
        self.bind_overlay(doc, registry, ui)?;
        self.bind_controls(doc, registry, ui)?;
        debug!(
            video = ?video,
            listeners = registry.len() - before,
            "video controls bound"
        );
        Ok(ui)
    }

    fn bind_media_events(
        &self,
        doc: &mut Document,
        registry: &mut ListenerRegistry,
        ui: PlayerControls,
    ) -> DomResult<()> {
        let video = ui.video;
        let video_step = self.config.video_seek_step_secs;

        registry.on(doc, video, EventType::LoadStart, |_, _| {
            debug!("video loading started");
            Ok(())
        })?;
        registry.on(doc, video, EventType::LoadedMetadata, |doc, _| {
            debug!("video metadata loaded");
            hide_loading(doc)
        })?;
        registry.on(doc, video, EventType::CanPlay, |doc, _| {
            debug!("video can start playing");
            hide_loading(doc)
        })?;

        registry.on(doc, video, EventType::Error, move |doc, _| {
            let src = doc.current_src(video)?;
            let message = doc.media(video)?.error().unwrap_or("unknown").to_string();
            error!(video = ?video, src = %src, error = %message, "video failed to load");

            let Some(container) = doc.parent(video) else {
                return Ok(());
            };
            let alert = doc.set_inner_markup(container, ERROR_FALLBACK)?;
            if let Some(link) = alert
                .first()
                .and_then(|&alert| doc.query(alert, "a.direct-link").ok().flatten())
            {
                doc.set_attr(link, "href", &src)?;
            }
            Ok(())
        })?;

        registry.on(doc, video, EventType::KeyDown, move |doc, event| {
            let Some(key) = event.key else {
                return Ok(());
            };
            match key {
                KeyCode::Space => {
                    event.prevent_default();
                    toggle_playback(doc, video)
                }
                KeyCode::ArrowLeft => {
                    event.prevent_default();
                    seek_relative(doc, video, -video_step)
                }
                KeyCode::ArrowRight => {
                    event.prevent_default();
                    seek_relative(doc, video, video_step)
                }
                KeyCode::Letter('M') => {
                    event.prevent_default();
                    let muted = doc.media(video)?.muted();
                    doc.set_muted(video, !muted)
                }
                KeyCode::Letter('F') => {
                    event.prevent_default();
                    request_fullscreen(doc, video)
                }
                _ => Ok(()),
            }
        })?;

        registry.on(doc, video, EventType::ContextMenu, |_, event| {
            event.prevent_default();
            Ok(())
        })?;
        Ok(())
    }

    fn bind_overlay(
        &self,
        doc: &mut Document,
        registry: &mut ListenerRegistry,
        ui: PlayerControls,
    ) -> DomResult<()> {
        let PlayerControls {
            video,
            overlay,
            overlay_icon,
            ..
        } = ui;

        registry.on(doc, video, EventType::Play, move |doc, _| {
            set_overlay_visible(doc, overlay, false)?;
            let icon = overlay_icon_for(doc, video)?;
            set_icon(doc, overlay_icon, icon.class_name())
        })?;
        registry.on(doc, video, EventType::Pause, move |doc, _| {
            if !doc.media(video)?.ended() {
                set_overlay_visible(doc, overlay, true)?;
                set_icon(doc, overlay_icon, PlayIcon::Play.class_name())?;
            }
            Ok(())
        })?;
        registry.on(doc, video, EventType::Ended, move |doc, _| {
            set_overlay_visible(doc, overlay, true)?;
            set_icon(doc, overlay_icon, PlayIcon::Replay.class_name())
        })?;
        registry.on(doc, overlay, EventType::Click, move |doc, _| {
            if doc.media(video)?.ended() {
                doc.set_current_time(video, 0.0)?;
                set_icon(doc, overlay_icon, PlayIcon::Play.class_name())?;
            }
            doc.play(video)
        })?;
        Ok(())
    }

    fn bind_controls(
        &self,
        doc: &mut Document,
        registry: &mut ListenerRegistry,
        ui: PlayerControls,
    ) -> DomResult<()> {
        let PlayerControls {
            video,
            wrapper,
            controls,
            ..
        } = ui;
        let idle = self.config.idle_hide_delay();
        let low = self.config.low_volume_threshold;
        let progress_step = self.config.progress_seek_step_secs;

        // Auto-hide: one pending idle timer at most, cancelled on cleanup.
        let idle_timer: TimerSlot = Rc::default();
        registry.track_timer(Rc::clone(&idle_timer));
        let leave_timer = Rc::clone(&idle_timer);
        registry.on(doc, wrapper, EventType::MouseMove, move |doc, _| {
            show(doc, controls, true)?;
            if let Some(previous) = idle_timer.take() {
                doc.clear_timeout(previous);
            }
            let id = doc.set_timeout(idle, move |doc| {
                let playing = doc.media(video).is_ok_and(|m| !m.paused());
                if playing && show(doc, controls, false).is_err() {
                    debug!("controls gone before idle timeout");
                }
            });
            idle_timer.set(Some(id));
            Ok(())
        })?;
        registry.on(doc, wrapper, EventType::MouseLeave, move |doc, _| {
            if let Some(pending) = leave_timer.take() {
                doc.clear_timeout(pending);
            }
            if !doc.media(video)?.paused() {
                show(doc, controls, false)?;
            }
            Ok(())
        })?;

        // Play/pause toggle; icons follow native events only.
        registry.on(doc, ui.play_pause_btn, EventType::Click, move |doc, _| {
            toggle_playback(doc, video)
        })?;
        let play_icon = ui.play_pause_icon;
        registry.on(doc, video, EventType::Play, move |doc, _| {
            set_icon(doc, play_icon, PlayIcon::Pause.class_name())
        })?;
        registry.on(doc, video, EventType::Pause, move |doc, _| {
            set_icon(doc, play_icon, PlayIcon::Play.class_name())?;
            show(doc, controls, true)
        })?;

        // Mute and volume.
        let mute_icon = ui.mute_icon;
        let update_mute_icon = move |doc: &mut Document| -> DomResult<()> {
            let media = doc.media(video)?;
            let icon = VolumeIcon::from_state(media.muted(), media.volume(), low);
            set_icon(doc, mute_icon, icon.class_name())
        };
        registry.on(doc, ui.mute_btn, EventType::Click, move |doc, _| {
            let muted = doc.media(video)?.muted();
            doc.set_muted(video, !muted)?;
            update_mute_icon(doc)
        })?;
        let slider = ui.volume_slider;
        registry.on(doc, slider, EventType::Input, move |doc, _| {
            let raw = doc.value(slider)?.trim().to_string();
            let volume: f64 = raw.parse().map_err(|_| DomError::OutOfRange {
                what: "volume",
                value: f64::NAN,
            })?;
            doc.set_volume(video, volume)?;
            doc.set_muted(video, false)?;
            update_mute_icon(doc)
        })?;
        registry.on(doc, video, EventType::VolumeChange, move |doc, _| {
            update_mute_icon(doc)
        })?;

        // Progress and time labels.
        let (filled, current_label, duration_label) =
            (ui.progress_filled, ui.current_time, ui.duration);
        registry.on(doc, video, EventType::TimeUpdate, move |doc, _| {
            let media = doc.media(video)?;
            let current = media.current_time();
            let percent = progress_percent(current, media.duration());
            doc.set_style(filled, "width", &format!("{percent}%"))?;
            doc.set_text(current_label, &format_time(current))
        })?;
        registry.on(doc, video, EventType::LoadedMetadata, move |doc, _| {
            let duration = doc.media(video)?.duration().unwrap_or(0.0);
            doc.set_text(duration_label, &format_time(duration))
        })?;

        let bar = ui.progress_bar;
        registry.on(doc, bar, EventType::Click, move |doc, event: &Event| {
            seek_to_pointer(doc, video, bar, event.client_x)
        })?;

        // Drag seeking: press on the bar, follow the pointer anywhere.
        let dragging: Rc<Cell<bool>> = Rc::default();
        let pressed = Rc::clone(&dragging);
        registry.on(doc, bar, EventType::MouseDown, move |doc, event| {
            event.prevent_default();
            pressed.set(true);
            seek_to_pointer(doc, video, bar, event.client_x)
        })?;
        let moving = Rc::clone(&dragging);
        registry.on(doc, EventTarget::Document, EventType::MouseMove, move |doc, event| {
            if !moving.get() {
                return Ok(());
            }
            seek_to_pointer(doc, video, bar, event.client_x)
        })?;
        registry.on(doc, EventTarget::Document, EventType::MouseUp, move |_, _| {
            dragging.set(false);
            Ok(())
        })?;
        registry.on(doc, bar, EventType::KeyDown, move |doc, event| {
            let media = doc.media(video)?;
            let duration = media.duration();
            let target = match event.key {
                Some(KeyCode::ArrowLeft) => seek_by(media.current_time(), -progress_step, duration),
                Some(KeyCode::ArrowRight) => seek_by(media.current_time(), progress_step, duration),
                Some(KeyCode::Home) => 0.0,
                Some(KeyCode::End) => match duration {
                    Some(d) => d,
                    None => return Ok(()),
                },
                _ => return Ok(()),
            };
            event.prevent_default();
            doc.set_current_time(video, target)
        })?;

        registry.on(doc, ui.fullscreen_btn, EventType::Click, move |doc, _| {
            request_fullscreen(doc, video)
        })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use lightframe_dom::Dispatch;
    use std::time::Duration;

    use crate::fixtures::PLAYER_MARKUP;

    struct Fixture {
        doc: Document,
        registry: ListenerRegistry,
        ui: PlayerControls,
    }

    fn bound() -> Fixture {
        let mut doc = Document::new();
        doc.insert_markup(doc.body(), PLAYER_MARKUP).unwrap();
        let video = doc.query(doc.body(), "video").unwrap().unwrap();
        let mut registry = ListenerRegistry::new();
        let ui = PlaybackBinder::default()
            .bind(&mut doc, &mut registry, video)
            .unwrap();
        Fixture { doc, registry, ui }
    }

    fn icon(doc: &Document, node: NodeId) -> String {
        doc.attr(node, "class").unwrap_or_default()
    }

    #[test]
    fn test_format_time() {
        assert_eq!(format_time(0.0), "0:00");
        assert_eq!(format_time(65.9), "1:05");
        assert_eq!(format_time(600.0), "10:00");
        assert_eq!(format_time(f64::NAN), "0:00");
        assert_eq!(format_time(-3.0), "0:00");
    }

    #[test]
    fn test_volume_icon_thresholds() {
        assert_eq!(VolumeIcon::from_state(false, 0.0, 0.5), VolumeIcon::Mute);
        assert_eq!(VolumeIcon::from_state(true, 0.8, 0.5), VolumeIcon::Mute);
        assert_eq!(VolumeIcon::from_state(false, 0.3, 0.5), VolumeIcon::Low);
        assert_eq!(VolumeIcon::from_state(false, 0.8, 0.5), VolumeIcon::Full);
        assert_eq!(VolumeIcon::from_state(false, 0.5, 0.5), VolumeIcon::Full);
    }

    #[test]
    fn test_seek_helpers() {
        assert_eq!(seek_by(3.0, -10.0, Some(60.0)), 0.0);
        assert_eq!(seek_by(55.0, 10.0, Some(60.0)), 60.0);
        assert_eq!(seek_by(5.0, 10.0, None), 15.0);
        let rect = Rect::new(100.0, 0.0, 200.0, 10.0);
        assert_eq!(seek_fraction(150.0, rect), Some(0.25));
        assert_eq!(seek_fraction(50.0, rect), Some(0.0));
        assert_eq!(seek_fraction(400.0, rect), Some(1.0));
        assert_eq!(seek_fraction(150.0, Rect::default()), None);
        assert_eq!(progress_percent(30.0, Some(120.0)), 25.0);
        assert_eq!(progress_percent(30.0, None), 0.0);
    }

    #[test]
    fn test_bind_installs_and_overlay_is_added() {
        let f = bound();
        assert!(f.registry.len() >= 20);
        assert_eq!(f.doc.total_listeners(), f.registry.len());
        assert!(f.doc.has_class(f.ui.overlay, "video-play-overlay"));
        assert_eq!(f.doc.parent(f.ui.overlay), Some(f.ui.wrapper));
    }

    #[test]
    fn test_missing_control_installs_nothing() {
        let mut doc = Document::new();
        doc.insert_markup(doc.body(), &PLAYER_MARKUP.replace("mute-btn", "other-btn"))
            .unwrap();
        let video = doc.query(doc.body(), "video").unwrap().unwrap();
        let mut registry = ListenerRegistry::new();
        let err = PlaybackBinder::default()
            .bind(&mut doc, &mut registry, video)
            .unwrap_err();
        assert_matches!(err, PlayerError::MissingControl { selector: ".mute-btn" });
        assert!(registry.is_empty());
        assert_eq!(doc.total_listeners(), 0);
        assert_eq!(doc.query(doc.body(), ".video-play-overlay").unwrap(), None);
    }

    #[test]
    fn test_missing_wrapper() {
        let mut doc = Document::new();
        let video = doc.create_element("video");
        doc.append_child(doc.body(), video).unwrap();
        let mut registry = ListenerRegistry::new();
        assert_matches!(
            PlaybackBinder::default().bind(&mut doc, &mut registry, video),
            Err(PlayerError::MissingControl { selector: ".video-wrapper" })
        );
    }

    #[test]
    fn test_programmatic_pause_flips_icon() {
        let mut f = bound();
        let video = f.ui.video;
        f.doc.play(video).unwrap();
        assert_eq!(icon(&f.doc, f.ui.play_pause_icon), "fas fa-pause");
        assert_eq!(f.doc.style(f.ui.overlay, "opacity").as_deref(), Some("0"));
        assert_eq!(f.doc.style(f.ui.overlay, "pointer-events").as_deref(), Some("none"));

        f.doc.pause(video).unwrap();
        assert_eq!(icon(&f.doc, f.ui.play_pause_icon), "fas fa-play");
        assert_eq!(f.doc.style(f.ui.overlay, "opacity").as_deref(), Some("1"));
        // Overlay is hidden, never removed.
        assert!(f.doc.is_connected(f.ui.overlay));
    }

    #[test]
    fn test_toggle_button_drives_native_state() {
        let mut f = bound();
        f.doc.dispatch(Event::new(EventType::Click, f.ui.play_pause_btn));
        assert!(f.doc.media(f.ui.video).unwrap().is_playing());
        f.doc.dispatch(Event::new(EventType::Click, f.ui.play_pause_icon));
        assert!(f.doc.media(f.ui.video).unwrap().paused());
    }

    #[test]
    fn test_metadata_duration_and_loading_indicator() {
        let mut f = bound();
        f.doc.load_metadata(f.ui.video, 125.0).unwrap();
        assert_eq!(f.doc.text_content(f.ui.duration), "2:05");
        let loading = f.doc.query(f.doc.body(), ".video-loading").unwrap().unwrap();
        assert_eq!(f.doc.style(loading, "display").as_deref(), Some("none"));
    }

    #[test]
    fn test_timeupdate_reflects_progress() {
        let mut f = bound();
        f.doc.load_metadata(f.ui.video, 100.0).unwrap();
        f.doc.play(f.ui.video).unwrap();
        f.doc.advance(Duration::from_secs(25));
        assert_eq!(f.doc.style(f.ui.progress_filled, "width").as_deref(), Some("25%"));
        assert_eq!(f.doc.text_content(f.ui.current_time), "0:25");
    }

    #[test]
    fn test_progress_click_seeks() {
        let mut f = bound();
        f.doc.load_metadata(f.ui.video, 80.0).unwrap();
        f.doc
            .set_rect(f.ui.progress_bar, Rect::new(10.0, 0.0, 400.0, 6.0))
            .unwrap();
        f.doc.dispatch(Event::click_at(f.ui.progress_filled, 110.0, 3.0));
        assert_eq!(f.doc.media(f.ui.video).unwrap().current_time(), 20.0);
        f.doc.dispatch(Event::click_at(f.ui.progress_bar, 900.0, 3.0));
        assert_eq!(f.doc.media(f.ui.video).unwrap().current_time(), 80.0);
    }

    #[test]
    fn test_keyboard_seek_clamps() {
        let mut f = bound();
        let video = f.ui.video;
        f.doc.load_metadata(video, 60.0).unwrap();
        f.doc.set_current_time(video, 3.0).unwrap();

        let outcome = f.doc.dispatch(Event::key_down(video, KeyCode::ArrowLeft));
        assert_matches!(outcome, Dispatch::Delivered { default_prevented: true, .. });
        assert_eq!(f.doc.media(video).unwrap().current_time(), 0.0);

        f.doc.set_current_time(video, 57.0).unwrap();
        f.doc.dispatch(Event::key_down(f.ui.progress_bar, KeyCode::ArrowRight));
        assert_eq!(f.doc.media(video).unwrap().current_time(), 60.0);
        f.doc.dispatch(Event::key_down(f.ui.progress_bar, KeyCode::ArrowLeft));
        assert_eq!(f.doc.media(video).unwrap().current_time(), 55.0);
        f.doc.dispatch(Event::key_down(f.ui.progress_bar, KeyCode::Home));
        assert_eq!(f.doc.media(video).unwrap().current_time(), 0.0);
        f.doc.dispatch(Event::key_down(f.ui.progress_bar, KeyCode::End));
        assert_eq!(f.doc.media(video).unwrap().current_time(), 60.0);
    }

    #[test]
    fn test_keyboard_shortcuts_on_video() {
        let mut f = bound();
        let video = f.ui.video;
        f.doc.dispatch(Event::key_down(video, KeyCode::Space));
        assert!(f.doc.media(video).unwrap().is_playing());
        f.doc.dispatch(Event::key_down(video, KeyCode::letter('m')));
        assert!(f.doc.media(video).unwrap().muted());
        assert_eq!(icon(&f.doc, f.ui.mute_icon), "fas fa-volume-mute");
        f.doc.dispatch(Event::key_down(video, KeyCode::letter('f')));
        assert_eq!(f.doc.fullscreen_element(), Some(video));
    }

    #[test]
    fn test_volume_slider_unmutes_and_sets_icon() {
        let mut f = bound();
        let video = f.ui.video;
        f.doc.dispatch(Event::new(EventType::Click, f.ui.mute_btn));
        assert!(f.doc.media(video).unwrap().muted());
        assert_eq!(icon(&f.doc, f.ui.mute_icon), "fas fa-volume-mute");

        f.doc.set_value(f.ui.volume_slider, "0.3").unwrap();
        f.doc.dispatch(Event::new(EventType::Input, f.ui.volume_slider));
        let media = f.doc.media(video).unwrap();
        assert!(!media.muted());
        assert_eq!(media.volume(), 0.3);
        assert_eq!(icon(&f.doc, f.ui.mute_icon), "fas fa-volume-down");

        f.doc.set_value(f.ui.volume_slider, "0.8").unwrap();
        f.doc.dispatch(Event::new(EventType::Input, f.ui.volume_slider));
        assert_eq!(icon(&f.doc, f.ui.mute_icon), "fas fa-volume-up");

        f.doc.set_value(f.ui.volume_slider, "0").unwrap();
        f.doc.dispatch(Event::new(EventType::Input, f.ui.volume_slider));
        assert_eq!(icon(&f.doc, f.ui.mute_icon), "fas fa-volume-mute");
    }

    #[test]
    fn test_bad_slider_value_is_contained() {
        let mut f = bound();
        f.doc.set_value(f.ui.volume_slider, "loud").unwrap();
        f.doc.dispatch(Event::new(EventType::Input, f.ui.volume_slider));
        assert_eq!(f.doc.media(f.ui.video).unwrap().volume(), 1.0);
    }

    #[test]
    fn test_ended_shows_replay_and_overlay_restarts() {
        let mut f = bound();
        let video = f.ui.video;
        f.doc.load_metadata(video, 2.0).unwrap();
        f.doc.play(video).unwrap();
        f.doc.advance(Duration::from_secs(3));

        assert!(f.doc.media(video).unwrap().ended());
        assert_eq!(icon(&f.doc, f.ui.overlay_icon), "fas fa-redo");
        assert_eq!(f.doc.style(f.ui.overlay, "opacity").as_deref(), Some("1"));

        f.doc.dispatch(Event::new(EventType::Click, f.ui.overlay));
        let media = f.doc.media(video).unwrap();
        assert!(media.is_playing());
        assert_eq!(media.current_time(), 0.0);
        assert_eq!(icon(&f.doc, f.ui.overlay_icon), "fas fa-play");
    }

    #[test]
    fn test_progress_drag_follows_pointer() {
        let mut f = bound();
        let video = f.ui.video;
        f.doc.load_metadata(video, 100.0).unwrap();
        f.doc
            .set_rect(f.ui.progress_bar, Rect::new(0.0, 0.0, 200.0, 6.0))
            .unwrap();
        let time = |doc: &Document| doc.media(video).unwrap().current_time();

        f.doc.dispatch(Event::pointer(EventType::MouseMove, EventTarget::Document, 100.0, 3.0));
        assert_eq!(time(&f.doc), 0.0);

        let outcome = f.doc.dispatch(Event::pointer(EventType::MouseDown, f.ui.progress_bar, 20.0, 3.0));
        assert_matches!(outcome, Dispatch::Delivered { default_prevented: true, .. });
        assert_eq!(time(&f.doc), 10.0);

        f.doc.dispatch(Event::pointer(EventType::MouseMove, f.ui.wrapper, 150.0, 3.0));
        assert_eq!(time(&f.doc), 75.0);
        f.doc.dispatch(Event::pointer(EventType::MouseMove, EventTarget::Document, -40.0, 3.0));
        assert_eq!(time(&f.doc), 0.0);
        f.doc.dispatch(Event::pointer(EventType::MouseMove, EventTarget::Document, 900.0, 3.0));
        assert_eq!(time(&f.doc), 100.0);

        f.doc.dispatch(Event::pointer(EventType::MouseUp, EventTarget::Document, 900.0, 3.0));
        f.doc.dispatch(Event::pointer(EventType::MouseMove, EventTarget::Document, 50.0, 3.0));
        assert_eq!(time(&f.doc), 100.0);
    }

    #[test]
    fn test_drag_listeners_removed_on_cleanup() {
        let mut f = bound();
        assert_eq!(f.doc.listener_count(EventTarget::Document), 2);
        let report = f.registry.cleanup(&mut f.doc);
        assert_eq!(report.failed, 0);
        assert_eq!(f.doc.listener_count(EventTarget::Document), 0);
        assert_eq!(f.doc.total_listeners(), 0);
    }

    #[test]
    fn test_restart_without_overlay_resets_glyph() {
        let mut f = bound();
        let video = f.ui.video;
        f.doc.load_metadata(video, 2.0).unwrap();
        f.doc.play(video).unwrap();
        f.doc.advance(Duration::from_secs(3));
        assert_eq!(icon(&f.doc, f.ui.overlay_icon), "fas fa-redo");

        f.doc.dispatch(Event::new(EventType::Click, f.ui.play_pause_btn));
        f.doc.advance(Duration::from_millis(500));
        f.doc.pause(video).unwrap();

        let media = f.doc.media(video).unwrap();
        assert!(!media.ended());
        assert!(media.paused());
        assert_eq!(icon(&f.doc, f.ui.overlay_icon), "fas fa-play");
        assert_eq!(f.doc.style(f.ui.overlay, "opacity").as_deref(), Some("1"));
    }

    #[test]
    fn test_idle_timer_cancelled_on_leave_and_cleanup() {
        let mut f = bound();
        f.doc.play(f.ui.video).unwrap();
        f.doc.dispatch(Event::new(EventType::MouseMove, f.ui.wrapper));
        assert_eq!(f.doc.pending_timers(), 1);
        f.doc.dispatch(Event::new(EventType::MouseLeave, f.ui.wrapper));
        assert_eq!(f.doc.pending_timers(), 0);

        f.doc.dispatch(Event::new(EventType::MouseMove, f.ui.wrapper));
        assert_eq!(f.doc.pending_timers(), 1);
        let report = f.registry.cleanup(&mut f.doc);
        assert_eq!(report.timers, 1);
        assert_eq!(f.doc.pending_timers(), 0);

        f.doc.set_style(f.ui.controls, "opacity", "1").unwrap();
        f.doc.advance(Duration::from_secs(5));
        assert_eq!(f.doc.style(f.ui.controls, "opacity").as_deref(), Some("1"));
    }

    #[test]
    fn test_controls_auto_hide_with_single_timer() {
        let mut f = bound();
        let video = f.ui.video;
        f.doc.play(video).unwrap();

        f.doc.dispatch(Event::new(EventType::MouseMove, f.ui.wrapper));
        f.doc.advance(Duration::from_secs(2));
        f.doc.dispatch(Event::new(EventType::MouseMove, video));
        assert_eq!(f.doc.pending_timers(), 1);

        f.doc.advance(Duration::from_secs(2));
        assert_eq!(f.doc.style(f.ui.controls, "opacity").as_deref(), Some("1"));
        f.doc.advance(Duration::from_secs(1));
        assert_eq!(f.doc.style(f.ui.controls, "opacity").as_deref(), Some("0"));
    }

    #[test]
    fn test_idle_timer_keeps_controls_when_paused() {
        let mut f = bound();
        f.doc.dispatch(Event::new(EventType::MouseMove, f.ui.wrapper));
        f.doc.advance(Duration::from_secs(4));
        assert_eq!(f.doc.style(f.ui.controls, "opacity").as_deref(), Some("1"));
    }

    #[test]
    fn test_mouse_leave_hides_only_while_playing() {
        let mut f = bound();
        f.doc.dispatch(Event::new(EventType::MouseLeave, f.ui.wrapper));
        assert_eq!(f.doc.style(f.ui.controls, "opacity"), None);
        f.doc.play(f.ui.video).unwrap();
        f.doc.dispatch(Event::new(EventType::MouseLeave, f.ui.wrapper));
        assert_eq!(f.doc.style(f.ui.controls, "opacity").as_deref(), Some("0"));
    }

    #[test]
    fn test_fullscreen_uses_available_vendor_api() {
        let mut f = bound();
        f.doc
            .set_fullscreen_apis(f.ui.video, &[FullscreenApi::Ms])
            .unwrap();
        f.doc.dispatch(Event::new(EventType::Click, f.ui.fullscreen_btn));
        assert_eq!(f.doc.fullscreen_element(), Some(f.ui.video));

        f.doc.exit_fullscreen();
        f.doc.set_fullscreen_apis(f.ui.video, &[]).unwrap();
        f.doc.dispatch(Event::new(EventType::Click, f.ui.fullscreen_btn));
        assert_eq!(f.doc.fullscreen_element(), None);
    }

    #[test]
    fn test_context_menu_is_suppressed() {
        let mut f = bound();
        let outcome = f.doc.dispatch(Event::new(EventType::ContextMenu, f.ui.video));
        assert_matches!(outcome, Dispatch::Delivered { default_prevented: true, .. });
    }

    #[test]
    fn test_media_error_shows_fallback_and_cleanup_tolerates_it() {
        let mut f = bound();
        f.doc.fail_media(f.ui.video, "network").unwrap();

        assert!(!f.doc.is_alive(f.ui.video));
        let link = f.doc.query(f.doc.body(), ".alert a").unwrap().unwrap();
        assert_eq!(f.doc.attr(link, "href").as_deref(), Some("clip.mp4"));
        assert!(f.doc.text_content(f.ui.wrapper).contains("Video Loading Issue"));

        let total = f.registry.len();
        let report = f.registry.cleanup(&mut f.doc);
        assert_eq!(report.total(), total);
        assert!(report.failed > 0);
        assert_eq!(report.removed, 4, "only wrapper and document listeners survive");
        assert_eq!(f.doc.total_listeners(), 0);
    }

    #[test]
    fn test_cleanup_then_events_do_nothing() {
        let mut f = bound();
        let report = f.registry.cleanup(&mut f.doc);
        assert_eq!(report.failed, 0);
        f.doc.play(f.ui.video).unwrap();
        assert_eq!(icon(&f.doc, f.ui.play_pause_icon), "fas fa-play");
    }
}
