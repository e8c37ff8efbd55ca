//! Renderer-agnostic document description.
//!
//! The client-side renderer consumes this as JSON: a flat stream of blocks,
//! a named style sheet the blocks refer to, and page/footer settings.
//! Nothing here knows about glyph metrics or line breaking.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ────────────────────────────────────────────────────────────────────────────
// Blocks
// ────────────────────────────────────────────────────────────────────────────

/// Named text styles. Every text-bearing block references one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextStyle {
    Name,
    Contact,
    SectionHeading,
    EntryTitle,
    EntrySubtitle,
    DateRange,
    Body,
    CategoryLabel,
    Link,
}

/// One unit of document content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Block {
    /// Section heading, e.g. "Work Experience".
    Heading { text: String, style: TextStyle },
    Text { text: String, style: TextStyle },
    /// Two-column line: primary text on the left, right-aligned text (dates).
    Row {
        left: String,
        right: Option<String>,
        left_style: TextStyle,
        right_style: TextStyle,
    },
    Bullets { items: Vec<String>, style: TextStyle },
    /// All blocks belonging to one record; renderers keep it on one page
    /// where possible.
    Entry { blocks: Vec<Block> },
    Image(ImageBlock),
    /// Side-by-side layout used by the profile header when a photo is embedded.
    Columns { columns: Vec<Vec<Block>> },
}

impl Block {
    pub fn heading(text: impl Into<String>) -> Self {
        Block::Heading {
            text: text.into(),
            style: TextStyle::SectionHeading,
        }
    }

    pub fn text(text: impl Into<String>, style: TextStyle) -> Self {
        Block::Text {
            text: text.into(),
            style,
        }
    }
}

#[cfg(test)]
impl Block {
    pub fn is_heading(&self) -> bool {
        matches!(self, Block::Heading { .. })
    }

    pub fn is_entry(&self) -> bool {
        matches!(self, Block::Entry { .. })
    }

    /// True if this block, or any block nested in it, is an image.
    pub fn contains_image(&self) -> bool {
        match self {
            Block::Image(_) => true,
            Block::Entry { blocks } => blocks.iter().any(Block::contains_image),
            Block::Columns { columns } => columns.iter().flatten().any(Block::contains_image),
            _ => false,
        }
    }

    /// All text carried by this block and its children, in reading order.
    pub fn texts(&self) -> Vec<&str> {
        match self {
            Block::Heading { text, .. } | Block::Text { text, .. } => vec![text.as_str()],
            Block::Row { left, right, .. } => {
                let mut out = vec![left.as_str()];
                out.extend(right.as_deref());
                out
            }
            Block::Bullets { items, .. } => items.iter().map(String::as_str).collect(),
            Block::Entry { blocks } => blocks.iter().flat_map(Block::texts).collect(),
            Block::Columns { columns } => columns.iter().flatten().flat_map(Block::texts).collect(),
            Block::Image(_) => Vec::new(),
        }
    }
}

/// Inline image, already encoded as a `data:` URI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageBlock {
    pub data_uri: String,
    pub width_pt: f32,
    pub height_pt: f32,
}

// ────────────────────────────────────────────────────────────────────────────
// Styles
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alignment {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSpec {
    pub font_size_pt: f32,
    pub bold: bool,
    pub italics: bool,
    /// Hex color, e.g. `#1f2937`.
    pub color: String,
    /// left, top, right, bottom in points.
    pub margin_pt: [f32; 4],
    pub alignment: Alignment,
}

impl StyleSpec {
    fn new(font_size_pt: f32, color: &str) -> Self {
        Self {
            font_size_pt,
            bold: false,
            italics: false,
            color: color.to_string(),
            margin_pt: [0.0; 4],
            alignment: Alignment::Left,
        }
    }

    fn align(mut self, alignment: Alignment) -> Self {
        self.alignment = alignment;
        self
    }

    fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    fn italics(mut self) -> Self {
        self.italics = true;
        self
    }

    fn margin(mut self, left: f32, top: f32, right: f32, bottom: f32) -> Self {
        self.margin_pt = [left, top, right, bottom];
        self
    }
}

pub type StyleSheet = BTreeMap<TextStyle, StyleSpec>;

const INK: &str = "#1f2937";
const MUTED: &str = "#6b7280";
const ACCENT: &str = "#1d4ed8";

/// Style sheet shared by every block of the classic template.
pub fn classic_style_sheet() -> StyleSheet {
    BTreeMap::from([
        (TextStyle::Name, StyleSpec::new(22.0, INK).bold().margin(0.0, 0.0, 0.0, 4.0)),
        (TextStyle::Contact, StyleSpec::new(9.5, MUTED).margin(0.0, 0.0, 0.0, 2.0)),
        (
            TextStyle::SectionHeading,
            StyleSpec::new(14.0, ACCENT).bold().margin(0.0, 14.0, 0.0, 6.0),
        ),
        (TextStyle::EntryTitle, StyleSpec::new(11.5, INK).bold()),
        (TextStyle::EntrySubtitle, StyleSpec::new(10.5, MUTED).italics()),
        (TextStyle::DateRange, StyleSpec::new(9.5, MUTED).align(Alignment::Right)),
        (TextStyle::Body, StyleSpec::new(10.0, INK).margin(0.0, 2.0, 0.0, 4.0)),
        (
            TextStyle::CategoryLabel,
            StyleSpec::new(10.0, ACCENT).bold().margin(0.0, 4.0, 0.0, 2.0),
        ),
        (TextStyle::Link, StyleSpec::new(9.5, ACCENT)),
    ])
}

// ────────────────────────────────────────────────────────────────────────────
// Page setup
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PageSize {
    A4,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSetup {
    pub size: PageSize,
    /// left, top, right, bottom in points.
    pub margins_pt: [f32; 4],
}

impl Default for PageSetup {
    fn default() -> Self {
        Self {
            size: PageSize::A4,
            margins_pt: [40.0, 60.0, 40.0, 60.0],
        }
    }
}

/// Running footer. The renderer substitutes `{current}` and `{total}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footer {
    pub template: String,
    pub style: StyleSpec,
}

impl Footer {
    pub fn page_counter() -> Self {
        Self {
            template: "Page {current} of {total}".to_string(),
            style: StyleSpec::new(8.0, MUTED).align(Alignment::Center),
        }
    }

    #[cfg(test)]
    pub fn render(&self, current: u32, total: u32) -> String {
        self.template
            .replace("{current}", &current.to_string())
            .replace("{total}", &total.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub title: String,
    pub author: Option<String>,
}

/// Complete description handed to the renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentDescription {
    pub info: DocumentInfo,
    pub page: PageSetup,
    pub footer: Footer,
    pub default_style: StyleSpec,
    pub styles: StyleSheet,
    pub content: Vec<Block>,
}

impl DocumentDescription {
    pub fn default_style() -> StyleSpec {
        StyleSpec::new(10.0, INK)
    }
}
