//! Page enhancers
//!
//! One-shot passes that fill in missing accessibility metadata so that both
//! this navigator and any host screen reader get something useful to say.

use super::Page;

const GENERIC_LINK_TEXTS: [&str; 4] = ["click here", "read more", "more", "here"];
const HINT_MAX_CHARS: usize = 80;

/// Fills in missing image alt text, button labels and the main landmark.
pub fn enhance_screen_reader(page: &dyn Page) {
    let mut images = 0;
    for img in page.query_all("img") {
        let has_alt = page
            .attribute(img, "alt")
            .map(|alt| !alt.trim().is_empty())
            .unwrap_or(false);
        if has_alt {
            continue;
        }
        let alt = non_empty(page.attribute(img, "title"))
            .or_else(|| non_empty(page.attribute(img, "aria-label")))
            .or_else(|| {
                page.attribute(img, "src")
                    .map(|src| guess_alt_from_filename(&src))
                    .and_then(|guess| non_empty(Some(guess)))
            });
        if let Some(alt) = alt {
            page.set_attribute(img, "alt", &alt);
            images += 1;
        }
    }

    let mut buttons = 0;
    for btn in page.query_all("button, input[type=button], input[type=submit]") {
        let has_label = non_empty(page.attribute(btn, "aria-label")).is_some();
        let has_text = non_empty(page.inner_text(btn)).is_some()
            || non_empty(page.attribute(btn, "value")).is_some();
        if !has_label && !has_text {
            let label = non_empty(page.attribute(btn, "title")).unwrap_or_else(|| "button".to_string());
            page.set_attribute(btn, "aria-label", &label);
            buttons += 1;
        }
    }

    if page.query_first("[role=main]").is_none() {
        let main = page
            .query_first("main")
            .or_else(|| page.query_first("article"))
            .or_else(|| page.body());
        if let Some(main) = main {
            if page.attribute(main, "role").is_none() {
                page.set_attribute(main, "role", "main");
            }
        }
    }

    tracing::debug!(
        "Screen reader enhancer: {} image alts, {} button labels",
        images,
        buttons
    );
}

/// Adds `data-bn-label` to links with no text or with generic text.
pub fn enhance_link_labels(page: &dyn Page) {
    for link in page.query_all("a") {
        let text = page
            .inner_text(link)
            .unwrap_or_default()
            .trim()
            .to_lowercase();

        if text.is_empty() {
            let label = non_empty(page.attribute(link, "title"))
                .or_else(|| non_empty(page.attribute(link, "aria-label")));
            if let Some(label) = label {
                page.set_attribute(link, "data-bn-label", &label);
            }
        } else if GENERIC_LINK_TEXTS.contains(&text.as_str()) {
            let hint = find_nearby_text(page, link)
                .or_else(|| non_empty(page.attribute(link, "href")))
                .unwrap_or_else(|| "link".to_string());
            page.set_attribute(link, "data-bn-label", &format!("{text} ({hint})"));
        }
    }
}

fn find_nearby_text(page: &dyn Page, link: super::ElementRef) -> Option<String> {
    let container = page
        .closest(link, "p, li, div")
        .or_else(|| page.parent(link))?;
    let text = page
        .inner_text(container)?
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if text.is_empty() {
        return None;
    }
    let anchor = page.inner_text(link).unwrap_or_default();
    let hint: String = text
        .replacen(anchor.trim(), "", 1)
        .trim()
        .chars()
        .take(HINT_MAX_CHARS)
        .collect();
    non_empty(Some(hint))
}

/// Guesses alt text from an image URL: `/img/red_car-02.png?x=1` → `red car`.
pub fn guess_alt_from_filename(src: &str) -> String {
    let file = src.rsplit('/').next().filter(|f| !f.is_empty()).unwrap_or(src);
    let file = file.split('?').next().unwrap_or(file);

    let mut spaced = String::with_capacity(file.len());
    let mut in_run = false;
    for ch in file.chars() {
        if ch == '-' || ch == '_' || ch.is_ascii_digit() {
            if !in_run {
                spaced.push(' ');
                in_run = true;
            }
        } else {
            spaced.push(ch);
            in_run = false;
        }
    }

    spaced.split('.').next().unwrap_or_default().trim().to_string()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::InMemoryPage;

    #[test]
    fn test_guess_alt_from_filename() {
        assert_eq!(guess_alt_from_filename("/img/red_car-02.png?x=1"), "red car");
        assert_eq!(guess_alt_from_filename("sunset.jpg"), "sunset");
        assert_eq!(guess_alt_from_filename("2024.png"), "");
    }

    #[test]
    fn test_screen_reader_enhancer() {
        let page = InMemoryPage::new();
        let body = page.body().unwrap();
        let titled = page.append_element(body, "img", &[("title", "Logo"), ("src", "x.png")]);
        let guessed = page.append_element(body, "img", &[("src", "/pics/blue_bird.png")]);
        let kept = page.append_element(body, "img", &[("alt", "Kept"), ("title", "Other")]);
        let empty_btn = page.append_element(body, "button", &[]);
        let titled_btn = page.append_element(body, "button", &[("title", "Close")]);
        let text_btn = page.append_element(body, "button", &[]);
        page.append_text(text_btn, "Send");
        let article = page.append_element(body, "article", &[]);

        enhance_screen_reader(&page);

        assert_eq!(page.attribute(titled, "alt").as_deref(), Some("Logo"));
        assert_eq!(page.attribute(guessed, "alt").as_deref(), Some("blue bird"));
        assert_eq!(page.attribute(kept, "alt").as_deref(), Some("Kept"));
        assert_eq!(page.attribute(empty_btn, "aria-label").as_deref(), Some("button"));
        assert_eq!(page.attribute(titled_btn, "aria-label").as_deref(), Some("Close"));
        assert_eq!(page.attribute(text_btn, "aria-label"), None);
        assert_eq!(page.attribute(article, "role").as_deref(), Some("main"));
    }

    #[test]
    fn test_existing_main_landmark_is_respected() {
        let page = InMemoryPage::new();
        let body = page.body().unwrap();
        page.append_element(body, "div", &[("role", "main")]);
        let main = page.append_element(body, "main", &[]);
        enhance_screen_reader(&page);
        assert_eq!(page.attribute(main, "role"), None);
    }

    #[test]
    fn test_link_labels() {
        let page = InMemoryPage::new();
        let body = page.body().unwrap();
        let icon = page.append_element(body, "a", &[("title", "Home page")]);
        let p = page.append_element(body, "p", &[]);
        page.append_text(p, "Pricing details. ");
        let generic = page.append_element(p, "a", &[("href", "/pricing")]);
        page.append_text(generic, "Read more");
        let list = page.append_element(body, "ul", &[]);
        let item = page.append_element(list, "li", &[]);
        let bare = page.append_element(item, "a", &[("href", "/faq")]);
        page.append_text(bare, "here");
        let normal = page.append_element(body, "a", &[]);
        page.append_text(normal, "Contact");

        enhance_link_labels(&page);

        assert_eq!(page.attribute(icon, "data-bn-label").as_deref(), Some("Home page"));
        assert_eq!(
            page.attribute(generic, "data-bn-label").as_deref(),
            Some("read more (Pricing details.)")
        );
        assert_eq!(page.attribute(bare, "data-bn-label").as_deref(), Some("here (/faq)"));
        assert_eq!(page.attribute(normal, "data-bn-label"), None);
    }
}
