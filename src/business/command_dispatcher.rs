//! Voice Command Dispatcher
//!
//! Maps a transcribed utterance to a single [`Action`] using an ordered
//! keyword table. Rules are evaluated top to bottom and the first match
//! wins, so earlier rules shadow later ones that share a keyword.

use crate::page::ElementCategory;

/// Something the user asked the navigator to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    ReadList(ElementCategory),
    Next,
    Previous,
    ReadParagraph,
    ToggleContrast,
    ToggleHeadingMap,
    ToggleMagnifier,
}

/// Fires `action` when the utterance contains any of `keywords`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandRule {
    pub keywords: &'static [&'static str],
    pub action: Action,
}

impl CommandRule {
    pub fn matches(&self, utterance: &str) -> bool {
        self.keywords.iter().any(|k| utterance.contains(k))
    }
}

pub const DEFAULT_RULES: &[CommandRule] = &[
    CommandRule {
        keywords: &["head", "heading"],
        action: Action::ReadList(ElementCategory::Headings),
    },
    CommandRule {
        keywords: &["link"],
        action: Action::ReadList(ElementCategory::Links),
    },
    CommandRule {
        keywords: &["button"],
        action: Action::ReadList(ElementCategory::Buttons),
    },
    CommandRule {
        keywords: &["next"],
        action: Action::Next,
    },
    CommandRule {
        keywords: &["previous", "prev"],
        action: Action::Previous,
    },
    CommandRule {
        keywords: &["read paragraph", "read"],
        action: Action::ReadParagraph,
    },
    CommandRule {
        keywords: &["contrast", "high contrast"],
        action: Action::ToggleContrast,
    },
    CommandRule {
        keywords: &["heading map", "headings"],
        action: Action::ToggleHeadingMap,
    },
    CommandRule {
        keywords: &["magnifier", "zoom"],
        action: Action::ToggleMagnifier,
    },
];

#[derive(Debug, Clone)]
pub struct CommandDispatcher {
    rules: Vec<CommandRule>,
}

impl Default for CommandDispatcher {
    fn default() -> Self {
        Self::with_rules(DEFAULT_RULES.to_vec())
    }
}

impl CommandDispatcher {
    pub fn with_rules(rules: Vec<CommandRule>) -> Self {
        Self { rules }
    }

    /// Action for a finalized utterance, or `None` if nothing matches.
    pub fn dispatch(&self, utterance: &str) -> Option<Action> {
        let utterance = utterance.trim().to_lowercase();
        if utterance.is_empty() {
            return None;
        }
        let action = self
            .rules
            .iter()
            .find(|rule| rule.matches(&utterance))
            .map(|rule| rule.action);
        match action {
            Some(action) => tracing::debug!("Voice command {:?} -> {:?}", utterance, action),
            None => tracing::debug!("No command matches {:?}", utterance),
        }
        action
    }
}
