//! Scripted page views.
//!
//! A session loads page data, builds the page in a fresh [`Document`], drives
//! it the way a visitor would, then navigates away so the lifecycle
//! coordinator tears everything down. The returned record is what the CLI
//! prints.

use std::cell::RefCell;
use std::path::Path;
use std::rc::Rc;

use anyhow::{Context, Result};
use lightframe_common::PageViewId;
use lightframe_dom::{Document, DomResult, Event, EventType, KeyCode, NodeId, Rect};
use lightframe_player::overlay::overlay_count;
use lightframe_player::{
    LifecycleCoordinator, LightboxAdapter, ModuleHandle, PlayerControls, SlideOutcome, Teardown,
};
use serde::Serialize;
use tracing::{debug, info, info_span, Instrument};

use crate::config::Config;
use crate::fetch;
use crate::models::{CatProfile, Photo, Project};
use crate::pages::{
    CatDetailPage, GalleryPage, LightboxHost, PageRender, ProjectDetailPage, CAT_PAGE_MARKUP,
    GALLERY_PAGE_MARKUP, PROJECT_PAGE_MARKUP,
};

/// Width given to the progress bar before clicking it.
const PROGRESS_WIDTH: f64 = 400.0;

/// Player state after one scripted action.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSnapshot {
    pub paused: bool,
    pub ended: bool,
    pub current_time: f64,
    pub duration: Option<f64>,
    pub muted: bool,
    pub volume: f64,
    pub progress: Option<String>,
    pub clock: String,
    pub play_icon: String,
    pub volume_icon: String,
    pub controls_visible: bool,
}

impl PlayerSnapshot {
    fn capture(doc: &Document, ui: &PlayerControls) -> DomResult<Self> {
        let media = doc.media(ui.video)?;
        Ok(Self {
            paused: media.paused(),
            ended: media.ended(),
            current_time: media.current_time(),
            duration: media.duration(),
            muted: media.muted(),
            volume: media.volume(),
            progress: doc.style(ui.progress_filled, "width"),
            clock: format!(
                "{} / {}",
                doc.text_content(ui.current_time),
                doc.text_content(ui.duration)
            ),
            play_icon: doc.attr(ui.play_pause_icon, "class").unwrap_or_default(),
            volume_icon: doc.attr(ui.mute_icon, "class").unwrap_or_default(),
            controls_visible: doc.style(ui.controls, "opacity").as_deref() != Some("0"),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Step {
    /// Virtual time since the page view started.
    pub at_ms: u64,
    pub action: &'static str,
    pub player: PlayerSnapshot,
}

/// A scripted visit to one project page.
#[derive(Debug, Clone, Serialize)]
pub struct PlaySession {
    pub page_view: PageViewId,
    pub project: String,
    pub render: PageRender,
    pub steps: Vec<Step>,
    pub teardowns: Vec<Teardown>,
    /// Listeners still installed once the coordinator itself is removed.
    pub listeners_left: usize,
    /// Media source after teardown; empty once released.
    pub media_src_after: Option<String>,
}

/// One slide as the visitor saw it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideView {
    pub index: usize,
    pub title: Option<String>,
    pub meta: Option<String>,
    pub overlays: usize,
}

/// A scripted walk through a gallery lightbox.
#[derive(Debug, Clone, Serialize)]
pub struct BrowseSession {
    pub page_view: PageViewId,
    pub page: &'static str,
    pub render: PageRender,
    pub slides: Vec<SlideView>,
    pub outcomes: Vec<SlideOutcome>,
    pub teardowns: Vec<Teardown>,
    /// Whether any lightbox DOM survived the teardown.
    pub lightbox_left: bool,
}

struct Trace {
    steps: Vec<Step>,
}

impl Trace {
    fn record(&mut self, doc: &Document, ui: &PlayerControls, action: &'static str) -> DomResult<()> {
        let player = PlayerSnapshot::capture(doc, ui)?;
        debug!(action, time = player.current_time, paused = player.paused, "step");
        self.steps.push(Step {
            at_ms: doc.now().as_millis() as u64,
            action,
            player,
        });
        Ok(())
    }
}

/// Visit project `raw_id` from `projects` and play its video through.
pub async fn play_project(config: &Config, projects: &Path, raw_id: &str, duration: f64) -> Result<PlaySession> {
    if !duration.is_finite() || duration <= 0.0 {
        anyhow::bail!("video duration must be a positive number of seconds, got {duration}");
    }
    let page_view = PageViewId::new();
    let span = info_span!("page_view", id = %page_view, page = "project");
    let data = fetch::load_projects(projects).instrument(span.clone()).await;
    span.in_scope(|| run_project(page_view, config, data, raw_id, duration))
}

fn run_project(
    page_view: PageViewId,
    config: &Config,
    data: lightframe_common::Result<Vec<Project>>,
    raw_id: &str,
    duration: f64,
) -> Result<PlaySession> {
    let mut doc = Document::new();
    doc.insert_markup(doc.body(), PROJECT_PAGE_MARKUP)?;

    let page = Rc::new(RefCell::new(ProjectDetailPage::new(&doc, config.player.clone())?));
    let mut coordinator = LifecycleCoordinator::new(config.lifecycle.clone());
    let handle: ModuleHandle = page.clone();
    coordinator.register(handle);
    coordinator.install(&mut doc)?;

    page.borrow_mut().init()?;
    let render = page.borrow_mut().render(&mut doc, data, Some(raw_id))?;

    let mut trace = Trace { steps: Vec::new() };
    let mut video = None;
    if render == PageRender::Scheduled {
        doc.advance(config.player.wiring_delay());
        let controls = page.borrow().controls();
        match controls {
            Some(ui) => {
                video = Some(ui.video);
                drive_player(&mut doc, &mut trace, &ui, config, duration)
                    .context("scripted playback failed")?;
            }
            None => info!("project has no self-hosted video to drive"),
        }
    }

    doc.navigate_away();
    let teardowns = coordinator.teardowns();
    coordinator.uninstall(&mut doc);

    Ok(PlaySession {
        page_view,
        project: raw_id.to_string(),
        render,
        steps: trace.steps,
        teardowns,
        listeners_left: doc.total_listeners(),
        media_src_after: video.and_then(|v| doc.current_src(v).ok()),
    })
}

fn drive_player(
    doc: &mut Document,
    trace: &mut Trace,
    ui: &PlayerControls,
    config: &Config,
    duration: f64,
) -> DomResult<()> {
    let video = ui.video;

    doc.load_metadata(video, duration)?;
    trace.record(doc, ui, "metadata")?;

    doc.dispatch(Event::new(EventType::Click, ui.play_pause_btn));
    trace.record(doc, ui, "play")?;

    doc.dispatch(Event::new(EventType::MouseMove, ui.wrapper));
    trace.record(doc, ui, "pointer")?;

    doc.advance(config.player.idle_hide_delay());
    trace.record(doc, ui, "idle")?;

    doc.set_rect(ui.progress_bar, Rect::new(0.0, 0.0, PROGRESS_WIDTH, 6.0))?;
    doc.dispatch(Event::click_at(ui.progress_bar, PROGRESS_WIDTH / 2.0, 3.0));
    trace.record(doc, ui, "seek")?;

    doc.dispatch(Event::key_down(video, KeyCode::ArrowLeft));
    trace.record(doc, ui, "rewind")?;

    doc.set_value(ui.volume_slider, "0.3")?;
    doc.dispatch(Event::new(EventType::Input, ui.volume_slider));
    trace.record(doc, ui, "volume")?;

    doc.dispatch(Event::new(EventType::Click, ui.mute_btn));
    trace.record(doc, ui, "mute")?;

    doc.advance(std::time::Duration::from_secs_f64(duration.max(0.0)));
    trace.record(doc, ui, "ended")?;

    doc.dispatch(Event::new(EventType::Click, ui.overlay));
    trace.record(doc, ui, "replay")
}

/// Open a gallery page and walk its lightbox to the end and back.
///
/// With `cat` set, `path` is a cat profile whose file stem is the cat's
/// name; otherwise it is the photo list of the main gallery.
pub async fn browse_gallery(config: &Config, path: &Path, cat: bool) -> Result<BrowseSession> {
    let page_view = PageViewId::new();
    let page = if cat { "cat" } else { "gallery" };
    let span = info_span!("page_view", id = %page_view, page);

    if cat {
        let name = path.file_stem().and_then(|s| s.to_str()).map(str::to_owned);
        let data = fetch::load_cat(path).instrument(span.clone()).await;
        span.in_scope(|| run_cat(page_view, config, name.as_deref(), data))
    } else {
        let data = fetch::load_gallery(path).instrument(span.clone()).await;
        span.in_scope(|| run_gallery(page_view, config, data))
    }
}

fn run_gallery(
    page_view: PageViewId,
    config: &Config,
    data: lightframe_common::Result<Vec<Photo>>,
) -> Result<BrowseSession> {
    let mut doc = Document::new();
    doc.insert_markup(doc.body(), GALLERY_PAGE_MARKUP)?;
    let page = Rc::new(RefCell::new(GalleryPage::new(&doc, config.lightbox.clone())?));
    let mut coordinator = LifecycleCoordinator::new(config.lifecycle.clone());
    let handle: ModuleHandle = page.clone();
    coordinator.register(handle);
    coordinator.install(&mut doc)?;

    page.borrow_mut().init(&mut doc)?;
    let render = page.borrow_mut().render(&mut doc, data)?;
    let (slides, outcomes) = walk(&mut doc, page.borrow_mut().lightbox())?;
    finish(page_view, "gallery", doc, coordinator, render, slides, outcomes)
}

fn run_cat(
    page_view: PageViewId,
    config: &Config,
    name: Option<&str>,
    data: lightframe_common::Result<CatProfile>,
) -> Result<BrowseSession> {
    let mut doc = Document::new();
    doc.insert_markup(doc.body(), CAT_PAGE_MARKUP)?;
    let page = Rc::new(RefCell::new(CatDetailPage::new(&doc, config.lightbox.clone())?));
    let mut coordinator = LifecycleCoordinator::new(config.lifecycle.clone());
    let handle: ModuleHandle = page.clone();
    coordinator.register(handle);
    coordinator.install(&mut doc)?;

    let initialized = page.borrow_mut().init(&mut doc, name)?;
    let render = match initialized {
        Some(_) => page.borrow_mut().render(&mut doc, data)?,
        None => PageRender::Failed {
            message: doc.text_content(page.borrow().bio_node()),
        },
    };
    let (slides, outcomes) = walk(&mut doc, page.borrow_mut().lightbox())?;
    finish(page_view, "cat", doc, coordinator, render, slides, outcomes)
}

fn finish(
    page_view: PageViewId,
    page: &'static str,
    mut doc: Document,
    mut coordinator: LifecycleCoordinator,
    render: PageRender,
    slides: Vec<SlideView>,
    outcomes: Vec<SlideOutcome>,
) -> Result<BrowseSession> {
    doc.navigate_away();
    let teardowns = coordinator.teardowns();
    coordinator.uninstall(&mut doc);
    let lightbox_left = doc.query(doc.root(), ".glightbox-container")?.is_some();
    Ok(BrowseSession {
        page_view,
        page,
        render,
        slides,
        outcomes,
        teardowns,
        lightbox_left,
    })
}

/// Open slide 0, step forward to the last slide, then back to the first.
/// The lightbox is left open for the teardown to dispose of.
fn walk(doc: &mut Document, host: &mut LightboxHost) -> Result<(Vec<SlideView>, Vec<SlideOutcome>)> {
    let Some(widget) = host.widget_mut() else {
        return Ok((Vec::new(), Vec::new()));
    };
    let count = widget.slide_count();
    if count == 0 {
        return Ok((Vec::new(), Vec::new()));
    }

    let mut slides = Vec::new();
    let mut index = 0;
    widget.open(doc, index)?;
    slides.push(view(doc, widget.current_slide(), index)?);
    for _ in 1..count {
        if !widget.next(doc)? {
            break;
        }
        index = (index + 1) % count;
        slides.push(view(doc, widget.current_slide(), index)?);
    }
    for _ in 1..count {
        if !widget.prev(doc)? {
            break;
        }
        index = if index == 0 { count - 1 } else { index - 1 };
        slides.push(view(doc, widget.current_slide(), index)?);
    }

    Ok((slides, host.reconciler().outcomes()))
}

fn view(doc: &Document, slide: Option<NodeId>, index: usize) -> DomResult<SlideView> {
    let Some(slide) = slide else {
        return Ok(SlideView {
            index,
            title: None,
            meta: None,
            overlays: 0,
        });
    };
    let overlay = doc.query(slide, ".gslide-media .glightbox-custom-caption")?;
    let text = |selector: &str| -> DomResult<Option<String>> {
        Ok(match overlay {
            Some(overlay) => doc
                .query(overlay, selector)?
                .map(|node| doc.text_content(node))
                .filter(|t| !t.trim().is_empty()),
            None => None,
        })
    };
    Ok(SlideView {
        index,
        title: text("h5")?,
        meta: text("p")?,
        overlays: overlay_count(doc, slide),
    })
}
