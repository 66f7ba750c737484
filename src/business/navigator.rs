//! Navigation Cursor
//!
//! Sequential movement through one category of page elements at a time.

use std::sync::Arc;

use crate::business::Speaker;
use crate::page::{ElementCategory, ElementRef, Page, PageScanner};

/// Marker class of the currently focused element.
pub const HIGHLIGHT_CLASS: &str = "blind-nav-highlight";

/// Per-page navigation state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationSession {
    active: bool,
    category: Option<ElementCategory>,
    current_list: Vec<ElementRef>,
    index: usize,
    last_read: Option<ElementRef>,
}

impl NavigationSession {
    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn category(&self) -> Option<ElementCategory> {
        self.category
    }

    pub fn current_list(&self) -> &[ElementRef] {
        &self.current_list
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn current(&self) -> Option<ElementRef> {
        self.current_list.get(self.index).copied()
    }

    pub fn last_read(&self) -> Option<ElementRef> {
        self.last_read
    }
}

/// Moves through element lists, highlighting and announcing each stop.
pub struct Navigator {
    page: Arc<dyn Page>,
    speaker: Arc<Speaker>,
    session: NavigationSession,
}

impl Navigator {
    pub fn new(page: Arc<dyn Page>, speaker: Arc<Speaker>) -> Self {
        Self {
            page,
            speaker,
            session: NavigationSession::default(),
        }
    }

    pub fn session(&self) -> &NavigationSession {
        &self.session
    }

    pub fn set_active(&mut self, active: bool) {
        self.session.active = active;
    }

    /// Scans the page for `category` and selects the result.
    pub fn select_category(&mut self, category: ElementCategory) {
        let list = PageScanner::scan_category(self.page.as_ref(), category);
        self.select_list(list, category);
    }

    pub fn select_list(&mut self, list: Vec<ElementRef>, category: ElementCategory) {
        self.session.current_list = list;
        self.session.category = Some(category);
        self.session.index = 0;

        let Some(&first) = self.session.current_list.first() else {
            self.speaker
                .speak(&format!("No {} found on this page.", category));
            return;
        };

        tracing::info!("Selected {} {}", self.session.current_list.len(), category);
        self.speaker.speak(&format!(
            "{} {} found. Say 'next' to move.",
            self.session.current_list.len(),
            category
        ));
        self.focus(first);
    }

    pub fn next(&mut self) {
        let n = self.session.current_list.len();
        if n == 0 {
            self.speaker
                .speak("No active list. Say headings, links or buttons first.");
            return;
        }
        self.session.index = (self.session.index + 1) % n;
        self.focus(self.session.current_list[self.session.index]);
    }

    pub fn previous(&mut self) {
        let n = self.session.current_list.len();
        if n == 0 {
            self.speaker.speak("No active list.");
            return;
        }
        self.session.index = (self.session.index + n - 1) % n;
        self.focus(self.session.current_list[self.session.index]);
    }

    /// Highlights `el`, scrolls to it, and reads it out.
    pub fn focus(&mut self, el: ElementRef) {
        if !self.page.is_attached(el) {
            tracing::debug!("Focus target {} is no longer on the page", el);
        }
        self.clear_highlight();
        self.page.add_class(el, HIGHLIGHT_CLASS);
        self.page.scroll_into_view(el);
        self.session.last_read = Some(el);
        self.speaker.speak(&describe(self.page.as_ref(), el));
    }

    /// Removes the focus highlight from every element carrying it.
    pub fn clear_highlight(&self) {
        for marked in self.page.query_all(&format!(".{HIGHLIGHT_CLASS}")) {
            self.page.remove_class(marked, HIGHLIGHT_CLASS);
        }
    }
}

/// Label announced for `el`: accessible label, alt text, visible text,
/// title, then `"<tag> element"`.
pub fn describe(page: &dyn Page, el: ElementRef) -> String {
    let candidates = [
        page.attribute(el, "aria-label"),
        page.attribute(el, "alt"),
        page.inner_text(el),
        page.attribute(el, "title"),
    ];
    candidates
        .into_iter()
        .flatten()
        .map(|text| text.trim().to_string())
        .find(|text| !text.is_empty())
        .unwrap_or_else(|| {
            let tag = page.tag_name(el).unwrap_or_else(|| "unknown".to_string());
            format!("{tag} element")
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::business::speech::testing::{recording_speaker, RecordingSynthesizer};
    use crate::page::InMemoryPage;

    fn setup() -> (Arc<InMemoryPage>, Navigator, Arc<RecordingSynthesizer>) {
        let page = Arc::new(InMemoryPage::new());
        let (speaker, synth) = recording_speaker();
        let navigator = Navigator::new(page.clone(), speaker);
        (page, navigator, synth)
    }

    fn add_headings(page: &InMemoryPage, titles: &[&str]) -> Vec<ElementRef> {
        let body = page.body().unwrap();
        titles
            .iter()
            .map(|title| {
                let h = page.append_element(body, "h2", &[]);
                page.append_text(h, title);
                h
            })
            .collect()
    }

    #[test]
    fn test_empty_category_announces_and_clears() {
        for category in ElementCategory::ALL {
            let (_page, mut navigator, synth) = setup();
            navigator.select_category(category);
            assert_eq!(
                synth.last(),
                Some(format!("No {} found on this page.", category.name()))
            );
            assert!(navigator.session().current_list().is_empty());
            assert_eq!(navigator.session().last_read(), None);
        }
    }

    #[test]
    fn test_select_announces_count_and_focuses_first() {
        let (page, mut navigator, synth) = setup();
        let headings = add_headings(&page, &["Intro", "Usage"]);

        navigator.select_category(ElementCategory::Headings);

        assert_eq!(
            synth.texts(),
            vec!["2 headings found. Say 'next' to move.", "Intro"]
        );
        assert_eq!(navigator.session().index(), 0);
        assert_eq!(navigator.session().last_read(), Some(headings[0]));
        assert!(page.has_class(headings[0], HIGHLIGHT_CLASS));
        assert_eq!(page.last_scrolled(), Some(headings[0]));
    }

    #[test]
    fn test_next_wraps_around() {
        let (page, mut navigator, _synth) = setup();
        let headings = add_headings(&page, &["A", "B", "C"]);
        navigator.select_category(ElementCategory::Headings);

        for _ in 0..headings.len() {
            navigator.next();
        }
        assert_eq!(navigator.session().index(), 0);
        assert_eq!(navigator.session().current(), Some(headings[0]));
    }

    #[test]
    fn test_previous_wraps_around() {
        let (page, mut navigator, synth) = setup();
        let headings = add_headings(&page, &["A", "B", "C"]);
        navigator.select_category(ElementCategory::Headings);

        navigator.previous();
        assert_eq!(navigator.session().index(), 2);
        assert_eq!(synth.last().as_deref(), Some("C"));

        for _ in 0..headings.len() - 1 {
            navigator.previous();
        }
        assert_eq!(navigator.session().index(), 0);
    }

    #[test]
    fn test_navigation_without_list() {
        let (_page, mut navigator, synth) = setup();
        navigator.next();
        assert_eq!(
            synth.last().as_deref(),
            Some("No active list. Say headings, links or buttons first.")
        );
        navigator.previous();
        assert_eq!(synth.last().as_deref(), Some("No active list."));
    }

    #[test]
    fn test_single_highlight_invariant() {
        let (page, mut navigator, _synth) = setup();
        add_headings(&page, &["A", "B", "C"]);
        navigator.select_category(ElementCategory::Headings);
        navigator.next();
        navigator.next();
        assert_eq!(page.query_all(".blind-nav-highlight").len(), 1);

        navigator.clear_highlight();
        assert!(page.query_all(".blind-nav-highlight").is_empty());
    }

    #[test]
    fn test_describe_precedence() {
        let page = InMemoryPage::new();
        let body = page.body().unwrap();

        let both = page.append_element(body, "img", &[("aria-label", "Label"), ("alt", "Alt")]);
        assert_eq!(describe(&page, both), "Label");

        let alt = page.append_element(body, "img", &[("alt", "Alt"), ("title", "Title")]);
        assert_eq!(describe(&page, alt), "Alt");

        let text = page.append_element(body, "a", &[("title", "Title")]);
        page.append_text(text, "  Visible  ");
        assert_eq!(describe(&page, text), "Visible");

        let titled = page.append_element(body, "a", &[("aria-label", "  "), ("title", "Title")]);
        assert_eq!(describe(&page, titled), "Title");

        let bare = page.append_element(body, "button", &[]);
        assert_eq!(describe(&page, bare), "button element");
    }

    #[test]
    fn test_stale_element_is_tolerated() {
        let (page, mut navigator, synth) = setup();
        let headings = add_headings(&page, &["A", "B"]);
        navigator.select_category(ElementCategory::Headings);
        page.remove(headings[1]);

        navigator.next();
        assert_eq!(navigator.session().last_read(), Some(headings[1]));
        assert_eq!(synth.last().as_deref(), Some("unknown element"));
    }
}
