//! Visual Aid Toggles
//!
//! High contrast, the magnifier lens and the heading map. Each aid keeps its
//! state in the page itself (a root class, the lens element, the overlay
//! element) so a toggle always reflects what is actually shown.

use std::sync::Arc;

use crate::business::Speaker;
use crate::data::{HeadingMapConfig, MagnifierConfig};
use crate::page::{ElementCategory, ElementRef, Page, PageScanner};

pub const CONTRAST_CLASS: &str = "bn-high-contrast";
pub const LENS_ID: &str = "magnifier-lens";
pub const HEADING_MAP_ID: &str = "bn-heading-map";
/// Attribute linking a heading-map entry to its heading.
pub const HEADING_TARGET_ATTR: &str = "data-bn-target";

const LENS_STYLE: &[(&str, &str)] = &[
    ("position", "fixed"),
    ("border-radius", "50%"),
    ("border", "4px solid #000"),
    ("overflow", "hidden"),
    ("pointer-events", "none"),
    ("z-index", "999999"),
    ("box-shadow", "0 0 20px rgba(0,0,0,0.4)"),
    ("background-color", "transparent"),
];

const HEADING_MAP_STYLE: &[(&str, &str)] = &[
    ("position", "fixed"),
    ("top", "10px"),
    ("right", "10px"),
    ("max-height", "80vh"),
    ("overflow", "auto"),
    ("z-index", "999998"),
    ("background", "#fff"),
    ("border", "2px solid #000"),
    ("padding", "8px"),
];

pub struct VisualAids {
    page: Arc<dyn Page>,
    speaker: Arc<Speaker>,
    magnifier: MagnifierConfig,
    heading_map: HeadingMapConfig,
    lens: Option<ElementRef>,
    pointer_tracking: bool,
}

impl VisualAids {
    pub fn new(
        page: Arc<dyn Page>,
        speaker: Arc<Speaker>,
        magnifier: MagnifierConfig,
        heading_map: HeadingMapConfig,
    ) -> Self {
        Self {
            page,
            speaker,
            magnifier,
            heading_map,
            lens: None,
            pointer_tracking: false,
        }
    }

    // ---- high contrast ----

    pub fn is_contrast_enabled(&self) -> bool {
        self.page.has_class(self.page.root(), CONTRAST_CLASS)
    }

    pub fn toggle_contrast(&self) -> bool {
        let on = self.page.toggle_class(self.page.root(), CONTRAST_CLASS);
        self.speaker.speak(if on {
            "High contrast enabled."
        } else {
            "High contrast disabled."
        });
        on
    }

    // ---- magnifier ----

    pub fn is_magnifier_enabled(&self) -> bool {
        self.lens.map(|lens| self.page.is_attached(lens)).unwrap_or(false)
    }

    pub fn is_pointer_tracking(&self) -> bool {
        self.pointer_tracking
    }

    pub fn lens(&self) -> Option<ElementRef> {
        self.lens.filter(|&lens| self.page.is_attached(lens))
    }

    pub fn toggle_magnifier(&mut self) -> bool {
        if self.is_magnifier_enabled() {
            self.disable_magnifier();
            false
        } else {
            self.enable_magnifier();
            true
        }
    }

    pub fn enable_magnifier(&mut self) {
        if self.is_magnifier_enabled() {
            return;
        }
        let parent = self.page.body().unwrap_or_else(|| self.page.root());
        let Some(lens) = self.page.create_element(parent, "div") else {
            tracing::warn!("Could not attach magnifier lens");
            return;
        };
        self.page.set_attribute(lens, "id", LENS_ID);
        let size = format!("{}px", self.magnifier.lens_size);
        self.page.set_style(lens, "width", &size);
        self.page.set_style(lens, "height", &size);
        for (property, value) in LENS_STYLE {
            self.page.set_style(lens, property, value);
        }

        self.lens = Some(lens);
        self.pointer_tracking = true;
        tracing::info!("Magnifier enabled (zoom {})", self.magnifier.zoom);
        self.speaker.speak("Magnifier enabled.");
    }

    pub fn disable_magnifier(&mut self) {
        if self.lens.is_none() && !self.pointer_tracking {
            return;
        }
        if let Some(lens) = self.lens.take() {
            self.page.remove(lens);
        }
        self.pointer_tracking = false;
        tracing::info!("Magnifier disabled");
        self.speaker.speak("Magnifier disabled.");
    }

    /// Centers the lens on the pointer.
    pub fn pointer_moved(&self, x: f64, y: f64) {
        if !self.pointer_tracking {
            return;
        }
        let Some(lens) = self.lens() else {
            return;
        };
        let half = f64::from(self.magnifier.lens_size) / 2.0;
        self.page.set_style(lens, "left", &format!("{}px", x - half));
        self.page.set_style(lens, "top", &format!("{}px", y - half));
        self.page
            .set_style(lens, "transform", &format!("scale({})", self.magnifier.zoom));
        self.page
            .set_style(lens, "transform-origin", &format!("{half}px {half}px"));
    }

    // ---- heading map ----

    pub fn is_heading_map_open(&self) -> bool {
        self.page.element_by_id(HEADING_MAP_ID).is_some()
    }

    /// Opens the heading map, or removes it if it is already open.
    /// Returns whether it is open afterwards.
    pub fn toggle_heading_map(&self) -> bool {
        if self.close_heading_map() {
            return false;
        }
        self.open_heading_map();
        true
    }

    /// Returns whether a map was removed.
    pub fn close_heading_map(&self) -> bool {
        match self.page.element_by_id(HEADING_MAP_ID) {
            Some(map) => {
                self.page.remove(map);
                tracing::debug!("Heading map closed");
                true
            }
            None => false,
        }
    }

    fn open_heading_map(&self) {
        let page = self.page.as_ref();
        let headings = PageScanner::scan_category(page, ElementCategory::Headings);
        let Some(map) = page.create_element(page.root(), "div") else {
            return;
        };
        page.set_attribute(map, "id", HEADING_MAP_ID);
        page.set_attribute(map, "role", "navigation");
        for (property, value) in HEADING_MAP_STYLE {
            page.set_style(map, property, value);
        }
        if let Some(title) = page.create_element(map, "h4") {
            page.set_text(title, "Page headings");
        }

        if headings.is_empty() {
            if let Some(empty) = page.create_element(map, "div") {
                page.set_text(empty, "No headings detected.");
            }
        } else if let Some(list) = page.create_element(map, "ul") {
            for heading in &headings {
                let Some(item) = page.create_element(list, "li") else {
                    continue;
                };
                page.set_text(item, &self.entry_text(*heading));
                page.set_attribute(item, HEADING_TARGET_ATTR, &heading.id().to_string());
            }
        }
        tracing::debug!("Heading map opened with {} entries", headings.len());
    }

    fn entry_text(&self, heading: ElementRef) -> String {
        let page = self.page.as_ref();
        let text = page
            .inner_text(heading)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .or_else(|| page.attribute(heading, "aria-label").filter(|t| !t.is_empty()))
            .or_else(|| page.tag_name(heading).map(|t| t.to_uppercase()))
            .unwrap_or_default();

        let max = self.heading_map.max_entry_chars;
        if text.chars().count() > max {
            let mut truncated: String = text.chars().take(max).collect();
            truncated.push_str("...");
            truncated
        } else {
            text
        }
    }

    /// Entry labels of the open heading map, in order.
    pub fn heading_map_entries(&self) -> Vec<String> {
        self.page
            .query_all(&format!("#{HEADING_MAP_ID} li"))
            .into_iter()
            .filter_map(|item| self.page.inner_text(item))
            .collect()
    }

    /// Heading behind entry `index` of the open heading map.
    pub fn heading_map_target(&self, index: usize) -> Option<ElementRef> {
        let item = *self
            .page
            .query_all(&format!("#{HEADING_MAP_ID} li"))
            .get(index)?;
        let id = self.page.attribute(item, HEADING_TARGET_ATTR)?.parse().ok()?;
        Some(ElementRef::new(id))
    }

    /// Turns every aid off without announcements, except the magnifier which
    /// reports being disabled.
    pub fn reset(&mut self) {
        self.page.remove_class(self.page.root(), CONTRAST_CLASS);
        self.close_heading_map();
        if self.is_magnifier_enabled() || self.pointer_tracking {
            self.disable_magnifier();
        }
    }
}
