//! Page Scanner
//!
//! Live queries for the navigable element categories.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{ElementRef, Page};

/// A navigable element category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementCategory {
    Headings,
    Links,
    Buttons,
}

impl ElementCategory {
    pub const ALL: [ElementCategory; 3] = [Self::Headings, Self::Links, Self::Buttons];

    pub fn selector(self) -> &'static str {
        match self {
            Self::Headings => "h1, h2, h3, h4, h5, h6",
            Self::Links => "a",
            Self::Buttons => "button, input[type=button], input[type=submit]",
        }
    }

    /// Plural name used in announcements.
    pub fn name(self) -> &'static str {
        match self {
            Self::Headings => "headings",
            Self::Links => "links",
            Self::Buttons => "buttons",
        }
    }
}

impl fmt::Display for ElementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageElements {
    pub headings: Vec<ElementRef>,
    pub links: Vec<ElementRef>,
    pub buttons: Vec<ElementRef>,
}

/// Stateless scanner; every call re-queries the page.
pub struct PageScanner;

impl PageScanner {
    pub fn scan(page: &dyn Page) -> PageElements {
        let elements = PageElements {
            headings: Self::scan_category(page, ElementCategory::Headings),
            links: Self::scan_category(page, ElementCategory::Links),
            buttons: Self::scan_category(page, ElementCategory::Buttons),
        };
        tracing::debug!(
            "Scanned page: {} headings, {} links, {} buttons",
            elements.headings.len(),
            elements.links.len(),
            elements.buttons.len()
        );
        elements
    }

    pub fn scan_category(page: &dyn Page, category: ElementCategory) -> Vec<ElementRef> {
        page.query_all(category.selector())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::InMemoryPage;

    #[test]
    fn test_scan_empty_page() {
        let page = InMemoryPage::new();
        assert_eq!(PageScanner::scan(&page), PageElements::default());
    }

    #[test]
    fn test_scan_categories() {
        let page = InMemoryPage::new();
        let body = page.body().unwrap();
        let h1 = page.append_element(body, "h1", &[]);
        let link = page.append_element(body, "a", &[("href", "/")]);
        let button = page.append_element(body, "button", &[]);
        let submit = page.append_element(body, "input", &[("type", "submit")]);
        page.append_element(body, "input", &[("type", "text")]);
        let h3 = page.append_element(body, "h3", &[]);

        let elements = PageScanner::scan(&page);
        assert_eq!(elements.headings, vec![h1, h3]);
        assert_eq!(elements.links, vec![link]);
        assert_eq!(elements.buttons, vec![button, submit]);
    }

    #[test]
    fn test_scan_is_live() {
        let page = InMemoryPage::new();
        let body = page.body().unwrap();
        assert!(PageScanner::scan_category(&page, ElementCategory::Links).is_empty());
        page.append_element(body, "a", &[]);
        assert_eq!(PageScanner::scan_category(&page, ElementCategory::Links).len(), 1);
    }
}
