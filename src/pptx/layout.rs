//! Slide layouts and their classification into title, content and blank roles.

use crate::pptx::shape::PlaceholderRef;
use serde::Serialize;

/// A placeholder declared by a layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutPlaceholder {
    /// Shape name on the layout
    pub name: String,
    pub placeholder: PlaceholderRef,
}

/// A slide layout of the presentation's first master.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideLayout {
    /// Package part, e.g. `ppt/slideLayouts/slideLayout2.xml`
    pub part_name: String,
    /// `cSld/@name`
    pub name: String,
    pub placeholders: Vec<LayoutPlaceholder>,
}

impl SlideLayout {
    /// The title placeholder, if any.
    pub fn title_placeholder(&self) -> Option<&LayoutPlaceholder> {
        self.placeholders.iter().find(|p| p.placeholder.is_title())
    }

    /// The first body placeholder, if any.
    pub fn body_placeholder(&self) -> Option<&LayoutPlaceholder> {
        self.placeholders.iter().find(|p| p.placeholder.is_body())
    }

    /// Whether the layout has a body placeholder.
    pub fn has_body(&self) -> bool {
        self.body_placeholder().is_some()
    }

    /// First free-text placeholder other than the title.
    pub fn secondary_placeholder(&self) -> Option<&LayoutPlaceholder> {
        self.placeholders.iter().find(|p| p.placeholder.is_text_slot())
    }
}

/// Semantic role a layout can play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum LayoutRole {
    Title,
    Content,
    Blank,
}

const TITLE_TOKENS: &[&str] = &["title", "標題"];
const CONTENT_TOKENS: &[&str] = &["content", "object", "內容", "物件"];
const BLANK_TOKENS: &[&str] = &["blank", "空白"];

fn contains_any(name: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|t| name.contains(t))
}

fn is_title_name(name: &str) -> bool {
    contains_any(name, TITLE_TOKENS) && !contains_any(name, CONTENT_TOKENS)
}

fn is_content_name(name: &str) -> bool {
    contains_any(name, CONTENT_TOKENS)
}

fn is_blank_name(name: &str) -> bool {
    contains_any(name, BLANK_TOKENS)
}

/// Name predicates, evaluated against each layout's lowercased name.
const ROLE_RULES: [(LayoutRole, fn(&str) -> bool); 3] = [
    (LayoutRole::Title, is_title_name),
    (LayoutRole::Content, is_content_name),
    (LayoutRole::Blank, is_blank_name),
];

/// Positional fallbacks when no name matched.
fn positional_fallback(role: LayoutRole, count: usize) -> usize {
    match role {
        LayoutRole::Title | LayoutRole::Blank => 0,
        LayoutRole::Content => [2, 1, 0].into_iter().find(|&i| i < count).unwrap_or(0),
    }
}

/// Layout indices chosen for each role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ResolvedLayouts {
    pub title: usize,
    pub content: usize,
    pub blank: usize,
    /// Whether the content layout carries a body placeholder
    pub content_has_body: bool,
}

impl ResolvedLayouts {
    /// Layout used for content slides.
    ///
    /// When the content layout has no body placeholder, content slides use
    /// the blank layout and get synthesized text boxes.
    pub fn content_slide_layout(&self) -> usize {
        if self.content_has_body {
            self.content
        } else {
            self.blank
        }
    }

    /// Whether content slides need synthesized text boxes.
    pub fn synthesizes_text(&self) -> bool {
        !self.content_has_body
    }

    pub fn get(&self, role: LayoutRole) -> usize {
        match role {
            LayoutRole::Title => self.title,
            LayoutRole::Content => self.content,
            LayoutRole::Blank => self.blank,
        }
    }
}

/// Classify layouts; `None` when there are no layouts at all.
pub fn resolve_layouts(layouts: &[SlideLayout]) -> Option<ResolvedLayouts> {
    if layouts.is_empty() {
        return None;
    }

    let mut slots: [Option<usize>; 3] = [None; 3];
    for (index, layout) in layouts.iter().enumerate() {
        let name = layout.name.to_lowercase();
        for (slot, (_, matches)) in slots.iter_mut().zip(ROLE_RULES.iter()) {
            if slot.is_none() && matches(&name) {
                *slot = Some(index);
            }
        }
    }

    let pick = |i: usize| slots[i].unwrap_or_else(|| positional_fallback(ROLE_RULES[i].0, layouts.len()));
    let resolved = ResolvedLayouts {
        title: pick(0),
        content: pick(1),
        blank: pick(2),
        content_has_body: false,
    };
    let content_has_body = layouts[resolved.content].has_body();
    if !content_has_body {
        tracing::debug!(
            layout = %layouts[resolved.content].name,
            "content layout has no body placeholder, using blank layout with text boxes"
        );
    }

    Some(ResolvedLayouts {
        content_has_body,
        ..resolved
    })
}
