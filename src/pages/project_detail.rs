use std::cell::{Cell, RefCell};
use std::rc::Rc;

use lightframe_common::{ModuleState, TimerId};
use lightframe_dom::{Document, EventType, NodeId};
use lightframe_player::playback::hide_loading;
use lightframe_player::{
    CleanupReport, ListenerRegistry, PageModule, PlaybackBinder, PlayerConfig, PlayerControls, PlayerError, Result,
};
use tracing::{debug, info, warn};

use super::{begin, escape, PageRender};
use crate::models::{sanitize_project_id, Project};

/// Body markup of the project detail page.
pub const PROJECT_PAGE_MARKUP: &str = r#"<main class="container"><div id="projectDetail"></div></main>"#;

const LOADING: &str = r#"<div class="video-loading"><i class="fas fa-spinner"></i> Loading video...</div>"#;

const CONTROLS: &str = r#"<div class="custom-video-controls">
  <div class="controls-bar">
    <button class="control-btn play-pause-btn" title="Play/Pause"><i class="fas fa-play"></i></button>
    <div class="progress-container">
      <div class="progress-bar"><div class="progress-filled"></div></div>
      <div class="time-display"><span class="current-time">0:00</span> / <span class="duration">0:00</span></div>
    </div>
    <button class="control-btn mute-btn" title="Mute/Unmute"><i class="fas fa-volume-up"></i></button>
    <div class="volume-container">
      <input type="range" class="volume-slider" min="0" max="1" step="0.1" value="1">
    </div>
    <button class="control-btn fullscreen-btn" title="Fullscreen"><i class="fas fa-expand"></i></button>
  </div>
</div>"#;

fn media_markup(project: &Project) -> String {
    if project.is_local_video() {
        format!(
            r#"<div class="video-wrapper"><video preload="metadata" playsinline disablepictureinpicture controlslist="nodownload" poster="{poster}"><source src="{src}" type="video/mp4"></video>{CONTROLS}</div>"#,
            poster = escape(&project.poster()),
            src = escape(&project.video_url),
        )
    } else {
        format!(
            r#"<div class="video-wrapper"><div class="ratio"><iframe src="{src}" title="{title}" loading="lazy" allowfullscreen></iframe></div></div>"#,
            src = escape(&project.video_url),
            title = escape(&project.title),
        )
    }
}

fn meta_item(label: &str, value: &str) -> String {
    format!(
        r#"<div class="meta-item"><span class="meta-label">{label}</span><span class="meta-value">{}</span></div>"#,
        escape(value)
    )
}

/// Full detail markup inserted once the wiring delay has elapsed. The
/// loading indicator stays in place until the media reports it is ready.
fn detail_markup(project: &Project) -> String {
    let description = project
        .description
        .as_deref()
        .filter(|d| !d.trim().is_empty())
        .map(|d| format!(r#"<div class="description">{}</div>"#, escape(d)))
        .unwrap_or_default();
    format!(
        r#"<div class="back-nav"><a href="video.html" class="mt-3 btn btn-outline-warning"><i class="fas fa-arrow-left"></i> Back to Videos</a></div>
<div class="video-detail-container">{LOADING}{media}<div class="video-info"><h2>{title}</h2>{description}<div class="video-meta">{client}{date}{location}{tools}</div></div></div>"#,
        media = media_markup(project),
        title = escape(&project.title),
        client = meta_item("Client", project.client_label()),
        date = meta_item("Date", project.date_label()),
        location = meta_item("Location", project.video_kind().label()),
        tools = meta_item("Tools Used", project.tools_label()),
    )
}

/// State the wiring timer shares with the page.
#[derive(Debug, Default)]
struct Shared {
    state: Cell<ModuleState>,
    registry: RefCell<ListenerRegistry>,
    controls: Cell<Option<PlayerControls>>,
}

/// One video project: details, embedded or self-hosted media, and the
/// custom player controls.
///
/// Rendering stages a loading indicator and schedules the real markup on a
/// timer. The timer re-checks that the page is still active before touching
/// the document, so a teardown that lands between the two is safe.
#[derive(Debug)]
pub struct ProjectDetailPage {
    container: NodeId,
    binder: PlaybackBinder,
    shared: Rc<Shared>,
    wiring: Option<TimerId>,
}

impl ProjectDetailPage {
    const NAME: &'static str = "project-detail";

    pub fn new(doc: &Document, config: PlayerConfig) -> Result<Self> {
        let container = doc
            .get_element_by_id("projectDetail")
            .ok_or(PlayerError::missing("#projectDetail"))?;
        Ok(Self {
            container,
            binder: PlaybackBinder::new(config),
            shared: Rc::default(),
            wiring: None,
        })
    }

    pub fn state(&self) -> ModuleState {
        self.shared.state.get()
    }

    pub fn init(&mut self) -> Result<()> {
        let mut state = self.shared.state.get();
        begin(&mut state, Self::NAME)?;
        self.shared.state.set(state);
        Ok(())
    }

    /// Controls of the bound player, once wiring has run.
    pub fn controls(&self) -> Option<PlayerControls> {
        self.shared.controls.get()
    }

    pub fn listener_count(&self) -> usize {
        self.shared.registry.borrow().len()
    }

    /// Whether the wiring timer is still pending.
    pub fn wiring_pending(&self, doc: &Document) -> bool {
        self.wiring.is_some_and(|id| doc.has_timer(id))
    }

    pub fn render(
        &mut self,
        doc: &mut Document,
        projects: lightframe_common::Result<Vec<Project>>,
        raw_id: Option<&str>,
    ) -> Result<PageRender> {
        if !self.state().is_active() {
            debug!(state = %self.state(), "project data arrived after teardown, ignored");
            return Ok(PageRender::Ignored);
        }

        // The container is about to be replaced; drop what the last render bound.
        if let Some(previous) = self.wiring.take() {
            doc.clear_timeout(previous);
        }
        let released = release_bindings(doc, &self.shared);
        if !released.is_empty() {
            debug!(removed = released.removed, "previous project bindings released");
        }

        let projects = match projects {
            Ok(projects) => projects,
            Err(e) => {
                warn!(error = %e, "failed to load project detail");
                return self.fail(doc, "Error loading project details.");
            }
        };
        let Some(id) = sanitize_project_id(raw_id) else {
            return self.fail(doc, "Invalid or missing project ID.");
        };
        let Some(project) = projects.into_iter().find(|p| p.id == id) else {
            debug!(id, "no project with this id");
            return self.fail(doc, "Project not found.");
        };

        doc.set_inner_markup(self.container, LOADING)?;

        let shared = Rc::clone(&self.shared);
        let binder = self.binder.clone();
        let container = self.container;
        let markup = detail_markup(&project);
        let local = project.is_local_video();
        let delay = self.binder.config().wiring_delay();
        self.wiring = Some(doc.set_timeout(delay, move |doc| {
            if !shared.state.get().is_active() {
                debug!("page torn down before wiring, skipped");
                return;
            }
            if let Err(e) = wire(doc, &shared, &binder, container, &markup, local) {
                warn!(error = %e, "failed to wire project media");
            }
        }));

        info!(id = %project.id, local, "project detail scheduled");
        Ok(PageRender::Scheduled)
    }

    fn fail(&mut self, doc: &mut Document, message: &str) -> Result<PageRender> {
        doc.set_inner_markup(self.container, &format!("<p class='text-danger'>{message}</p>"))?;
        Ok(PageRender::Failed {
            message: message.to_string(),
        })
    }
}

/// Remove every subscription and timer a previous wiring left behind.
fn release_bindings(doc: &mut Document, shared: &Shared) -> CleanupReport {
    let report = match shared.registry.try_borrow_mut() {
        Ok(mut registry) => registry.cleanup(doc),
        Err(_) => {
            warn!("listener registry busy during cleanup");
            CleanupReport::default()
        }
    };
    shared.controls.set(None);
    report
}

fn wire(
    doc: &mut Document,
    shared: &Shared,
    binder: &PlaybackBinder,
    container: NodeId,
    markup: &str,
    local: bool,
) -> Result<()> {
    release_bindings(doc, shared);
    doc.set_inner_markup(container, markup)?;
    let mut registry = shared.registry.borrow_mut();

    if let Some(iframe) = doc.query(container, "iframe")? {
        registry.on(doc, iframe, EventType::Load, |doc, _| hide_loading(doc))?;
    }

    let Some(video) = doc.query(container, "video")? else {
        return Ok(());
    };
    if !local {
        registry.on(doc, video, EventType::LoadedMetadata, |doc, _| hide_loading(doc))?;
        return Ok(());
    }
    match binder.bind(doc, &mut registry, video) {
        Ok(controls) => shared.controls.set(Some(controls)),
        Err(e) => warn!(error = %e, "video controls not bound"),
    }
    Ok(())
}

impl PageModule for ProjectDetailPage {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn cleanup(&mut self, doc: &mut Document) -> CleanupReport {
        if let Some(id) = self.wiring.take() {
            if doc.clear_timeout(id) {
                debug!(timer = %id, "pending wiring cancelled");
            }
        }
        let report = release_bindings(doc, &self.shared);
        self.shared.state.set(ModuleState::TornDown);
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lightframe_common::Error;
    use lightframe_dom::Event;
    use std::time::Duration;

    fn project(id: &str, url: &str) -> Project {
        Project {
            id: id.to_string(),
            title: "Harbor Reel".into(),
            video_url: url.to_string(),
            description: Some("Shot at <dawn>".into()),
            client: None,
            mdy_date: Some("06/01/2023".into()),
            tools: Some("Resolve".into()),
            ..Project::default()
        }
    }

    fn page() -> (Document, ProjectDetailPage) {
        let mut doc = Document::new();
        doc.insert_markup(doc.body(), PROJECT_PAGE_MARKUP).unwrap();
        let mut page = ProjectDetailPage::new(&doc, PlayerConfig::default()).unwrap();
        page.init().unwrap();
        (doc, page)
    }

    fn detail_text(doc: &Document) -> String {
        doc.text_content(doc.get_element_by_id("projectDetail").unwrap())
    }

    #[test]
    fn test_error_messages() {
        let (mut doc, mut page) = page();
        let projects = || Ok(vec![project("reel", "/assets/video/reel.mp4")]);

        let render = page.render(&mut doc, projects(), None).unwrap();
        assert_eq!(
            render,
            PageRender::Failed {
                message: "Invalid or missing project ID.".into()
            }
        );
        page.render(&mut doc, projects(), Some("other")).unwrap();
        assert_eq!(detail_text(&doc), "Project not found.");
        page.render(&mut doc, Err(Error::not_found("projects.json")), Some("reel"))
            .unwrap();
        assert_eq!(detail_text(&doc), "Error loading project details.");
        assert_eq!(doc.pending_timers(), 0);
    }

    #[test]
    fn test_local_video_wired_after_delay() {
        let (mut doc, mut page) = page();
        let render = page
            .render(&mut doc, Ok(vec![project("reel", "/assets/video/reel.mp4")]), Some("reel"))
            .unwrap();
        assert_eq!(render, PageRender::Scheduled);
        assert!(detail_text(&doc).contains("Loading video..."));
        assert!(page.wiring_pending(&doc));

        doc.advance(Duration::from_millis(499));
        assert!(page.controls().is_none());
        doc.advance(Duration::from_millis(1));
        let controls = page.controls().unwrap();
        assert!(!page.wiring_pending(&doc));
        assert!(page.listener_count() > 0);

        let text = detail_text(&doc);
        assert!(text.contains("Back to Videos"));
        assert!(text.contains("Personal Project"));
        assert!(text.contains("06/01/2023"));
        assert!(text.contains("Self-Hosted Video"));
        assert!(text.contains("Shot at <dawn>"));

        let video = controls.video;
        assert_eq!(doc.current_src(video).unwrap(), "/assets/video/reel.mp4");
        assert_eq!(
            doc.attr(video, "poster").as_deref(),
            Some("assets/video/gallery/thumbs/reel.webp")
        );
        let loading = doc.query(doc.root(), ".video-loading").unwrap().unwrap();
        assert!(doc.is_displayed(loading));
        doc.load_metadata(video, 42.0).unwrap();
        assert!(!doc.is_displayed(loading));
    }

    #[test]
    fn test_embedded_video_hides_loading_on_iframe_load() {
        let (mut doc, mut page) = page();
        page.render(
            &mut doc,
            Ok(vec![project("trailer", "https://www.youtube.com/embed/abc")]),
            Some("trailer"),
        )
        .unwrap();
        doc.advance(Duration::from_millis(500));
        assert!(page.controls().is_none());
        assert_eq!(page.listener_count(), 1);
        assert!(detail_text(&doc).contains("YouTube Video"));

        let iframe = doc.query(doc.root(), "iframe").unwrap().unwrap();
        let loading = doc.query(doc.root(), ".video-loading").unwrap().unwrap();
        doc.dispatch(Event::new(EventType::Load, iframe));
        assert!(!doc.is_displayed(loading));
    }

    #[test]
    fn test_teardown_before_wiring_skips_it() {
        let (mut doc, mut page) = page();
        page.render(&mut doc, Ok(vec![project("reel", "/assets/video/reel.mp4")]), Some("reel"))
            .unwrap();
        let report = page.cleanup(&mut doc);
        assert!(report.is_empty());
        assert_eq!(doc.pending_timers(), 0);

        doc.advance(Duration::from_secs(1));
        assert!(page.controls().is_none());
        assert!(!detail_text(&doc).contains("Back to Videos"));
        assert_eq!(page.state(), ModuleState::TornDown);
    }

    #[test]
    fn test_late_wiring_after_teardown_is_inert() {
        let (mut doc, mut page) = page();
        page.render(&mut doc, Ok(vec![project("reel", "/assets/video/reel.mp4")]), Some("reel"))
            .unwrap();
        // Teardown from a path that does not cancel the timer.
        page.wiring = None;
        page.cleanup(&mut doc);
        assert_eq!(doc.pending_timers(), 1);

        doc.advance(Duration::from_millis(500));
        assert_eq!(page.listener_count(), 0);
        assert!(doc.query(doc.root(), "video").unwrap().is_none());
    }

    #[test]
    fn test_rerender_replaces_previous_bindings() {
        let (mut doc, mut page) = page();
        let projects = || Ok(vec![project("reel", "/assets/video/reel.mp4")]);

        page.render(&mut doc, projects(), Some("reel")).unwrap();
        doc.advance(Duration::from_millis(500));
        assert!(page.controls().is_some());
        let bound = page.listener_count();
        assert_eq!(doc.total_listeners(), bound);

        page.render(&mut doc, projects(), Some("reel")).unwrap();
        assert_eq!(page.listener_count(), 0);
        assert!(page.controls().is_none());
        doc.advance(Duration::from_millis(500));
        assert!(page.controls().is_some());
        assert_eq!(page.listener_count(), bound);
        assert_eq!(doc.total_listeners(), bound);

        let report = page.cleanup(&mut doc);
        assert_eq!(report.removed, bound);
        assert_eq!(report.failed, 0);
        assert_eq!(doc.total_listeners(), 0);
    }

    #[test]
    fn test_failed_rerender_releases_bindings() {
        let (mut doc, mut page) = page();
        page.render(&mut doc, Ok(vec![project("reel", "/assets/video/reel.mp4")]), Some("reel"))
            .unwrap();
        doc.advance(Duration::from_millis(500));
        assert!(page.listener_count() > 0);

        page.render(&mut doc, Ok(vec![]), Some("reel")).unwrap();
        assert_eq!(page.listener_count(), 0);
        assert_eq!(doc.total_listeners(), 0);
        assert_eq!(page.cleanup(&mut doc).failed, 0);
    }

    #[test]
    fn test_cleanup_removes_bound_listeners() {
        let (mut doc, mut page) = page();
        page.render(&mut doc, Ok(vec![project("reel", "/assets/video/reel.mp4")]), Some("reel"))
            .unwrap();
        doc.advance(Duration::from_millis(500));
        let bound = page.listener_count();
        let before = doc.total_listeners();

        let report = page.cleanup(&mut doc);
        assert_eq!(report.removed, bound);
        assert_eq!(doc.total_listeners(), before - bound);
        assert_eq!(page.cleanup(&mut doc).total(), 0);

        page.init().unwrap();
        let render = page.render(&mut doc, Ok(vec![]), Some("reel")).unwrap();
        assert_eq!(
            render,
            PageRender::Failed {
                message: "Project not found.".into()
            }
        );
    }
}
