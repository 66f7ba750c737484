//! Single-key navigation

use crate::business::Action;
use crate::data::KeyConfig;
use crate::page::ElementCategory;

/// Form controls that keep their keystrokes.
const EDITABLE_TAGS: &[&str] = &["INPUT", "TEXTAREA", "SELECT"];

/// A key press as delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyInput {
    /// Key value, e.g. `"h"` or `"Tab"`.
    pub key: String,
    /// Tag name of the focused element, if any.
    pub target_tag: Option<String>,
}

impl KeyInput {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            target_tag: None,
        }
    }

    pub fn on(mut self, tag: impl Into<String>) -> Self {
        self.target_tag = Some(tag.into());
        self
    }

    pub fn is_tab(&self) -> bool {
        self.key == "Tab"
    }

    fn targets_editable(&self) -> bool {
        self.target_tag
            .as_deref()
            .map(|tag| EDITABLE_TAGS.iter().any(|t| t.eq_ignore_ascii_case(tag)))
            .unwrap_or(false)
    }
}

#[derive(Debug, Clone)]
pub struct KeyMap {
    bindings: Vec<(char, Action)>,
}

impl Default for KeyMap {
    fn default() -> Self {
        Self::new(&KeyConfig::default())
    }
}

impl KeyMap {
    pub fn new(keys: &KeyConfig) -> Self {
        Self {
            bindings: vec![
                (keys.headings, Action::ReadList(ElementCategory::Headings)),
                (keys.links, Action::ReadList(ElementCategory::Links)),
                (keys.buttons, Action::ReadList(ElementCategory::Buttons)),
                (keys.next, Action::Next),
                (keys.previous, Action::Previous),
                (keys.read_paragraph, Action::ReadParagraph),
            ],
        }
    }

    /// Action bound to `input`. Keys typed into form controls never resolve.
    pub fn resolve(&self, input: &KeyInput) -> Option<Action> {
        if input.targets_editable() {
            return None;
        }
        let mut chars = input.key.chars();
        let (Some(ch), None) = (chars.next(), chars.next()) else {
            return None;
        };
        self.bindings
            .iter()
            .find(|(key, _)| *key == ch)
            .map(|(_, action)| *action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bindings() {
        let map = KeyMap::default();
        assert_eq!(
            map.resolve(&KeyInput::new("h")),
            Some(Action::ReadList(ElementCategory::Headings))
        );
        assert_eq!(
            map.resolve(&KeyInput::new("l")),
            Some(Action::ReadList(ElementCategory::Links))
        );
        assert_eq!(
            map.resolve(&KeyInput::new("b")),
            Some(Action::ReadList(ElementCategory::Buttons))
        );
        assert_eq!(map.resolve(&KeyInput::new("n")), Some(Action::Next));
        assert_eq!(map.resolve(&KeyInput::new("p")), Some(Action::Previous));
        assert_eq!(map.resolve(&KeyInput::new("r")), Some(Action::ReadParagraph));
    }

    #[test]
    fn test_unbound_keys() {
        let map = KeyMap::default();
        assert_eq!(map.resolve(&KeyInput::new("H")), None);
        assert_eq!(map.resolve(&KeyInput::new("x")), None);
        assert_eq!(map.resolve(&KeyInput::new("Tab")), None);
        assert_eq!(map.resolve(&KeyInput::new("")), None);
    }

    #[test]
    fn test_form_controls_keep_keys() {
        let map = KeyMap::default();
        for tag in ["INPUT", "textarea", "Select"] {
            assert_eq!(map.resolve(&KeyInput::new("n").on(tag)), None);
        }
        assert_eq!(map.resolve(&KeyInput::new("n").on("DIV")), Some(Action::Next));
    }

    #[test]
    fn test_custom_bindings() {
        let keys = KeyConfig {
            next: 'j',
            previous: 'k',
            ..KeyConfig::default()
        };
        let map = KeyMap::new(&keys);
        assert_eq!(map.resolve(&KeyInput::new("j")), Some(Action::Next));
        assert_eq!(map.resolve(&KeyInput::new("k")), Some(Action::Previous));
        assert_eq!(map.resolve(&KeyInput::new("n")), None);
    }
}
