//! Page access
//!
//! The navigator never owns page elements. It holds [`ElementRef`] lookup
//! handles and goes through the [`Page`] trait for every read and mutation,
//! so a handle whose element has been removed simply resolves to nothing.

mod enhancer;
mod memory;
mod scanner;
mod selector;

pub use enhancer::{enhance_link_labels, enhance_screen_reader, guess_alt_from_filename};
pub use memory::{InMemoryPage, PageOutline};
pub use scanner::{ElementCategory, PageElements, PageScanner};
pub use selector::{Selector, SelectorError, SelectorNode};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Weak handle to a page element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementRef(u64);

impl ElementRef {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Document operations the accessibility engine relies on.
///
/// Queries are live: nothing is cached between calls. Every method taking an
/// [`ElementRef`] treats a stale handle as absent (`None`, `false`, or a
/// no-op).
pub trait Page: Send + Sync {
    /// Elements matching `selector`, in document order.
    fn query_all(&self, selector: &str) -> Vec<ElementRef>;

    fn query_first(&self, selector: &str) -> Option<ElementRef> {
        self.query_all(selector).into_iter().next()
    }

    /// First descendant of `scope` matching `selector`.
    fn query_within(&self, scope: ElementRef, selector: &str) -> Option<ElementRef>;

    /// Nearest inclusive ancestor of `el` matching `selector`.
    fn closest(&self, el: ElementRef, selector: &str) -> Option<ElementRef>;

    fn element_by_id(&self, id: &str) -> Option<ElementRef> {
        self.query_first(&format!("#{id}"))
    }

    /// The document element.
    fn root(&self) -> ElementRef;
    fn body(&self) -> Option<ElementRef>;
    fn parent(&self, el: ElementRef) -> Option<ElementRef>;
    fn is_attached(&self, el: ElementRef) -> bool;

    /// Lowercase tag name.
    fn tag_name(&self, el: ElementRef) -> Option<String>;
    fn attribute(&self, el: ElementRef, name: &str) -> Option<String>;
    fn set_attribute(&self, el: ElementRef, name: &str, value: &str);

    /// Rendered text of the element and its descendants.
    fn inner_text(&self, el: ElementRef) -> Option<String>;
    /// Replaces all children of `el` with a single text node.
    fn set_text(&self, el: ElementRef, text: &str);

    fn has_class(&self, el: ElementRef, class: &str) -> bool;
    fn add_class(&self, el: ElementRef, class: &str);
    fn remove_class(&self, el: ElementRef, class: &str);
    /// Flips `class` on `el` and returns whether it is now present.
    fn toggle_class(&self, el: ElementRef, class: &str) -> bool;

    fn set_style(&self, el: ElementRef, property: &str, value: &str);
    fn style(&self, el: ElementRef, property: &str) -> Option<String>;

    fn scroll_into_view(&self, el: ElementRef);

    /// Appends a new element under `parent`.
    fn create_element(&self, parent: ElementRef, tag: &str) -> Option<ElementRef>;
    /// Detaches `el` and its subtree. Returns false if it was not attached.
    fn remove(&self, el: ElementRef) -> bool;

    /// Wraps the first occurrence of `needle` inside `container` in a `span`
    /// carrying `class`. Returns false when no single text run contains it.
    fn mark_text(&self, container: ElementRef, needle: &str, class: &str) -> bool;
    /// Unwraps every `span` carrying `class` inside `container`.
    fn unmark_text(&self, container: ElementRef, class: &str);
}
