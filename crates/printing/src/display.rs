use serde::Serialize;

use crate::content::NodeKind;
use crate::template::Alignment;

/// Positioned drawing commands for one page, handed to the platform adapters.
/// Coordinates are millimetres from the page's top-left corner.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PrintDisplayList {
    pub commands: Vec<DisplayCommand>,
}

impl PrintDisplayList {
    /// Append a command to the display list.
    pub fn push(&mut self, command: DisplayCommand) {
        self.commands.push(command);
    }

    /// Returns true if the display list is empty.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Text runs placed in the given region, in drawing order.
    pub fn text_in(&self, region: Region) -> impl Iterator<Item = &TextRun> {
        self.commands.iter().filter_map(move |command| match command {
            DisplayCommand::Text(run) if run.region == region => Some(run),
            _ => None,
        })
    }

    /// Content blocks in drawing order.
    pub fn blocks(&self) -> impl Iterator<Item = &NodeBlock> {
        self.commands.iter().filter_map(|command| match command {
            DisplayCommand::Block(block) => Some(block),
            _ => None,
        })
    }
}

/// Low-level drawing commands emitted when a page is materialized.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum DisplayCommand {
    Text(TextRun),
    Block(NodeBlock),
    HorizontalRule {
        start: Point,
        end: Point,
        stroke: Stroke,
    },
}

/// Page region a command belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Header,
    Main,
    Footer,
}

/// A header or footer text slot.
#[derive(Debug, Clone, Serialize)]
pub struct TextRun {
    pub text: String,
    pub region: Region,
    pub alignment: Alignment,
    pub position: Point,
}

/// A placed content node occupying its measured height in the main region.
#[derive(Debug, Clone, Serialize)]
pub struct NodeBlock {
    /// Always [`Region::Main`]; header and footer only carry text runs.
    pub region: Region,
    pub node_index: usize,
    pub node_id: String,
    pub kind: NodeKind,
    pub text: String,
    pub origin: Point,
    pub size: Size,
}

/// 2D size representation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

/// 2D coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

/// RGBA color stored in normalized floating-point form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }
}

/// Stroke descriptor for simple line drawing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Stroke {
    pub width: f32,
    pub color: Color,
}
