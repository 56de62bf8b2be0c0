use lightframe_common::{Error, ModuleState};
use lightframe_dom::{Document, DomResult, NodeId};
use lightframe_player::{CleanupReport, PageModule, PlayerError, Result};
use tracing::{debug, info, warn};

use super::{begin, element, escape, LightboxHost, PageRender};
use crate::config::LightboxConfig;
use crate::models::{format_photo_date, group_by_year, sanitize_cat_name, CatProfile, Photo};

/// Body markup of the cat profile page.
pub const CAT_PAGE_MARKUP: &str = r#"<main class="container">
<div id="catDetailHeader" class="cat-detail-header">
  <img id="catPhoto" class="cat-photo" src="" alt="">
  <h1 id="catName">Loading...</h1>
  <p id="catBio"></p>
</div>
<div id="catGalleryGrid" class="row"></div>
</main>"#;

const LOADING: &str = r#"<div class="col-12 text-center"><div class="alert alert-info" role="alert"><i class="fas fa-spinner fa-spin"></i> Loading photos...</div></div>"#;

fn failure_message(error: &Error) -> &'static str {
    match error {
        Error::NotFound(_) => "Cat information not found. Please check the URL or try again.",
        Error::Json(_) => "Cat data is corrupted. Please contact the site administrator.",
        _ => "Unable to load cat information. Please try again.",
    }
}

#[derive(Debug, Clone, Copy)]
struct Elements {
    header: NodeId,
    name: NodeId,
    bio: NodeId,
    photo: NodeId,
    grid: NodeId,
}

/// A cat's profile header and year-grouped photo gallery.
#[derive(Debug)]
pub struct CatDetailPage {
    el: Elements,
    state: ModuleState,
    lightbox: LightboxHost,
}

impl CatDetailPage {
    const NAME: &'static str = "cat-detail";

    pub fn new(doc: &Document, lightbox: LightboxConfig) -> Result<Self> {
        let find = |id: &str, selector: &'static str| {
            doc.get_element_by_id(id).ok_or(PlayerError::missing(selector))
        };
        Ok(Self {
            el: Elements {
                header: find("catDetailHeader", "#catDetailHeader")?,
                name: find("catName", "#catName")?,
                bio: find("catBio", "#catBio")?,
                photo: find("catPhoto", "#catPhoto")?,
                grid: find("catGalleryGrid", "#catGalleryGrid")?,
            },
            state: ModuleState::Uninitialized,
            lightbox: LightboxHost::new(lightbox),
        })
    }

    pub fn state(&self) -> ModuleState {
        self.state
    }

    /// Start the page for the name taken from the URL. Returns the
    /// sanitized name to load, or `None` when an error was shown instead.
    pub fn init(&mut self, doc: &mut Document, raw_name: Option<&str>) -> Result<Option<String>> {
        begin(&mut self.state, Self::NAME)?;

        let name = match (raw_name, sanitize_cat_name(raw_name)) {
            (_, Some(name)) => name,
            (None, None) => {
                self.show_error(doc, "No cat specified in URL")?;
                return Ok(None);
            }
            (Some(raw), None) => {
                warn!(raw, "rejected cat name");
                self.show_error(doc, "Invalid cat name in URL")?;
                return Ok(None);
            }
        };

        doc.set_inner_markup(self.el.grid, LOADING)?;
        Ok(Some(name))
    }

    pub fn render(&mut self, doc: &mut Document, cat: lightframe_common::Result<CatProfile>) -> Result<PageRender> {
        if !self.state.is_active() {
            debug!(state = %self.state, "cat data arrived after teardown, ignored");
            return Ok(PageRender::Ignored);
        }

        let cat = match cat {
            Ok(cat) => cat,
            Err(e) => {
                warn!(error = %e, "failed to load cat");
                let message = failure_message(&e);
                self.show_error(doc, message)?;
                return Ok(PageRender::Failed {
                    message: message.to_string(),
                });
            }
        };

        doc.set_title(&format!("{} Gallery", cat.name));
        doc.set_text(self.el.name, &cat.name)?;
        doc.set_text(self.el.bio, &cat.bio)?;
        if let Some(thumb) = cat.card_thumbnail.as_deref().filter(|t| !t.is_empty()) {
            doc.set_attr(self.el.photo, "src", thumb)?;
            doc.set_attr(self.el.photo, "alt", &cat.name)?;
        }
        if cat.memorial {
            doc.add_class(self.el.header, "memorial")?;
        }

        let photos: Vec<Photo> = cat.photos.into_iter().filter(Photo::is_valid).collect();
        if photos.is_empty() {
            doc.set_inner_markup(
                self.el.grid,
                &format!(
                    r#"<div class="col-12 text-center"><p class="text-warning">No photos available for {} yet.</p></div>"#,
                    escape(&cat.name)
                ),
            )?;
            return Ok(PageRender::Rendered { items: 0 });
        }

        doc.clear_children(self.el.grid)?;
        let mut items = 0;
        for (year, group) in group_by_year(&photos) {
            self.append_year_header(doc, year, group.len())?;
            for photo in group {
                self.append_item(doc, photo)?;
                items += 1;
            }
        }

        self.lightbox.mount(doc)?;
        info!(cat = %cat.name, items, "cat gallery rendered");
        Ok(PageRender::Rendered { items })
    }

    fn append_year_header(&self, doc: &mut Document, year: Option<i32>, count: usize) -> DomResult<()> {
        let label = year.map_or_else(|| "Undated".to_string(), |y| y.to_string());
        let header = element(doc, "div", "col-12 mb-3 mt-4 cat-year")?;
        doc.append_child(self.el.grid, header)?;
        doc.insert_markup(
            header,
            &format!(
                r#"<div class="d-flex align-items-center"><h3 class="me-2 mb-0">{label}</h3><span class="text-muted small">({count} photos)</span></div><hr class="year-separator">"#
            ),
        )?;
        Ok(())
    }

    fn append_item(&self, doc: &mut Document, photo: &Photo) -> DomResult<()> {
        let col = element(doc, "div", "col-6 col-md-4 col-lg-3 mb-4 gallery-item")?;
        let anchor = element(doc, "a", "glightbox")?;
        doc.set_attr(anchor, "href", &photo.full)?;
        doc.set_attr(anchor, "data-gallery", "cat-gallery")?;
        doc.set_attr(anchor, "data-title", "")?;
        doc.set_attr(
            anchor,
            "data-description",
            &format!(
                r#"<div class="glightbox-custom-caption"><h5>{}</h5><p>{}</p></div>"#,
                escape(&photo.caption),
                escape(&format_photo_date(&photo.date))
            ),
        )?;

        let pic = element(doc, "div", "gallery-pic")?;
        let img = element(doc, "img", "img-fluid rounded shadow-sm")?;
        doc.set_attr(img, "src", &photo.thumb)?;
        doc.set_attr(img, "alt", &photo.caption)?;
        doc.set_attr(img, "loading", "lazy")?;
        doc.append_child(pic, img)?;
        doc.append_child(anchor, pic)?;
        doc.append_child(col, anchor)?;

        let heading = element(doc, "h5", "mt-2")?;
        let strong = doc.create_element("strong");
        doc.set_text(strong, &photo.caption)?;
        doc.append_child(heading, strong)?;
        doc.append_child(col, heading)?;
        let rule = doc.create_element("hr");
        doc.append_child(col, rule)?;

        doc.append_child(self.el.grid, col)
    }

    fn show_error(&self, doc: &mut Document, message: &str) -> DomResult<()> {
        doc.set_text(self.el.name, "Error")?;
        doc.set_text(self.el.bio, message)?;
        doc.set_inner_markup(
            self.el.grid,
            &format!(
                r#"<div class="col-12 text-center"><p class="text-danger">{}</p></div>"#,
                escape(message)
            ),
        )?;
        Ok(())
    }

    /// The bio line, which also carries error messages.
    pub fn bio_node(&self) -> NodeId {
        self.el.bio
    }

    pub fn lightbox(&mut self) -> &mut LightboxHost {
        &mut self.lightbox
    }
}

impl PageModule for CatDetailPage {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn cleanup(&mut self, doc: &mut Document) -> CleanupReport {
        self.lightbox.destroy(doc);
        self.state = ModuleState::TornDown;
        CleanupReport::default()
    }
}
