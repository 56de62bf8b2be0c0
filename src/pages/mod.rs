//! Page-view modules.
//!
//! Each module is a capability object handed to the
//! [`LifecycleCoordinator`](lightframe_player::LifecycleCoordinator). It
//! renders fetched records into the document, attaches behavior through the
//! player crate, and undoes all of it in [`PageModule::cleanup`]. A module
//! that was torn down while its data was still loading ignores the late
//! result.
//!
//! [`PageModule::cleanup`]: lightframe_player::PageModule::cleanup

mod cat_detail;
mod gallery;
mod project_detail;

pub use cat_detail::{CatDetailPage, CAT_PAGE_MARKUP};
pub use gallery::{GalleryPage, GALLERY_PAGE_MARKUP};
pub use project_detail::{ProjectDetailPage, PROJECT_PAGE_MARKUP};

use lightframe_common::ModuleState;
use lightframe_dom::{Document, DomResult, NodeId};
use lightframe_player::{GLightbox, LightboxAdapter, OverlayReconciler, PlayerError, Result};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::LightboxConfig;

/// What a call to a page's `render` did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "render", rename_all = "snake_case")]
pub enum PageRender {
    /// Records were rendered.
    Rendered { items: usize },
    /// Markup was staged and wiring is scheduled on a timer.
    Scheduled,
    /// An error panel was shown instead.
    Failed { message: String },
    /// The module was not active; the result was dropped.
    Ignored,
}

/// Escape text for inclusion in markup.
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Create an element with a class list.
pub(crate) fn element(doc: &mut Document, tag: &str, class: &str) -> DomResult<NodeId> {
    let node = doc.create_element(tag);
    if !class.is_empty() {
        doc.set_class_name(node, class)?;
    }
    Ok(node)
}

/// Shared `init()` guard: only an inactive module may start.
pub(crate) fn begin(state: &mut ModuleState, name: &str) -> Result<()> {
    if !state.can_init() {
        return Err(PlayerError::already_active(name));
    }
    *state = ModuleState::Active;
    debug!(module = name, "page module initialized");
    Ok(())
}

/// The lightbox instance owned by a gallery page.
///
/// A re-render reloads the existing widget; after `destroy` the next render
/// builds a fresh one. The overlay reconciler is attached to every instance.
#[derive(Debug)]
pub struct LightboxHost {
    config: LightboxConfig,
    widget: Option<GLightbox>,
    reconciler: OverlayReconciler,
}

impl LightboxHost {
    pub fn new(config: LightboxConfig) -> Self {
        Self {
            config,
            widget: None,
            reconciler: OverlayReconciler::new(),
        }
    }

    /// Reload or create the widget over the anchors now in `doc`. Returns
    /// the slide count, or `None` when the widget is not available.
    pub fn mount(&mut self, doc: &mut Document) -> Result<Option<usize>> {
        if !self.config.available {
            let err = PlayerError::WidgetUnavailable("lightbox".into());
            warn!(error = %err, "rendering gallery without a lightbox");
            return Ok(None);
        }

        match self.widget.as_mut().filter(|w| !w.is_destroyed()) {
            Some(widget) => {
                let slides = widget.reload(doc)?;
                debug!(slides, "lightbox reloaded");
                Ok(Some(slides))
            }
            None => {
                let mut widget = GLightbox::create(doc, self.config.options())?;
                self.reconciler.attach(&mut widget);
                let slides = widget.slide_count();
                self.widget = Some(widget);
                Ok(Some(slides))
            }
        }
    }

    /// Destroy the widget, if any. Returns whether one was destroyed.
    pub fn destroy(&mut self, doc: &mut Document) -> bool {
        match self.widget.take() {
            Some(mut widget) => {
                widget.destroy(doc);
                true
            }
            None => false,
        }
    }

    pub fn widget_mut(&mut self) -> Option<&mut GLightbox> {
        self.widget.as_mut()
    }

    pub fn reconciler(&self) -> &OverlayReconciler {
        &self.reconciler
    }
}
