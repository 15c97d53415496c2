use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Kind of block a letter body is made of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    #[default]
    Paragraph,
    Heading,
    TableRows,
    Address,
    Spacer,
}

/// Atomic unit of letter content. A node is never split across pages.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ContentNode {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub kind: NodeKind,
    #[serde(default)]
    pub text: String,
    /// Height already known to the producer; skips text measurement when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_mm: Option<f32>,
}

impl ContentNode {
    pub fn new(id: impl Into<String>, kind: NodeKind, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            text: text.into(),
            height_mm: None,
        }
    }

    /// Convenience constructor for a node whose height is fixed up front.
    pub fn sized(id: impl Into<String>, height_mm: f32) -> Self {
        Self {
            id: id.into(),
            height_mm: Some(height_mm),
            ..Self::default()
        }
    }
}

/// Letter body as handed over by the document producer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LetterBody {
    #[serde(default)]
    pub nodes: Vec<ContentNode>,
}

impl LetterBody {
    pub fn from_json(input: &str) -> Result<Self, ContentError> {
        serde_json::from_str(input).map_err(ContentError::Parse)
    }
}

/// A node paired with the height it occupies in the main region.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredNode {
    /// Position in the source stream.
    pub index: usize,
    pub node: Arc<ContentNode>,
    pub height_mm: f32,
}

impl MeasuredNode {
    pub fn new(index: usize, node: ContentNode, height_mm: f32) -> Self {
        Self {
            index,
            node: Arc::new(node),
            height_mm,
        }
    }

    pub fn id(&self) -> &str {
        &self.node.id
    }
}

/// Errors raised while loading or measuring letter content.
#[derive(Debug, Error)]
pub enum ContentError {
    #[error("failed to parse letter body: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("node #{index} ('{id}') has an invalid height of {height_mm}mm")]
    InvalidHeight {
        index: usize,
        id: String,
        height_mm: f32,
    },
}

/// Assigns a height to a node for a main region of the given width.
pub trait NodeMeasurer {
    fn measure(&self, node: &ContentNode, main_width_mm: f32) -> f32;
}

/// Fixed-pitch text metrics used to estimate block heights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TextMetrics {
    pub line_height_mm: f32,
    pub average_char_width_mm: f32,
    pub block_spacing_mm: f32,
    pub heading_scale: f32,
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            line_height_mm: 5.0,
            average_char_width_mm: 2.2,
            block_spacing_mm: 2.0,
            heading_scale: 1.4,
        }
    }
}

impl NodeMeasurer for TextMetrics {
    fn measure(&self, node: &ContentNode, main_width_mm: f32) -> f32 {
        if let Some(height) = node.height_mm {
            return height;
        }

        let line_height = self.line_height_mm.max(0.1);
        let spacing = self.block_spacing_mm.max(0.0);
        if node.kind == NodeKind::Spacer {
            return line_height + spacing;
        }

        let scale = match node.kind {
            NodeKind::Heading => self.heading_scale.max(1.0),
            _ => 1.0,
        };
        let char_width = self.average_char_width_mm.max(0.1) * scale;
        let chars_per_line = (main_width_mm / char_width).floor().max(1.0) as usize;
        let lines = wrapped_line_count(&node.text, chars_per_line);
        lines as f32 * line_height * scale + spacing
    }
}

fn wrapped_line_count(text: &str, chars_per_line: usize) -> usize {
    text.split('\n')
        .map(|line| {
            let chars = line.chars().count();
            if chars == 0 {
                1
            } else {
                (chars + chars_per_line - 1) / chars_per_line
            }
        })
        .sum()
}

/// Measures every node once, in source order.
pub fn measure_all<M>(
    nodes: Vec<ContentNode>,
    measurer: &M,
    main_width_mm: f32,
) -> Result<Vec<MeasuredNode>, ContentError>
where
    M: NodeMeasurer + ?Sized,
{
    nodes
        .into_iter()
        .enumerate()
        .map(|(index, node)| {
            let height_mm = measurer.measure(&node, main_width_mm);
            if !height_mm.is_finite() || height_mm < 0.0 {
                return Err(ContentError::InvalidHeight {
                    index,
                    id: node.id,
                    height_mm,
                });
            }
            Ok(MeasuredNode::new(index, node, height_mm))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> TextMetrics {
        TextMetrics {
            line_height_mm: 5.0,
            average_char_width_mm: 2.0,
            block_spacing_mm: 1.0,
            heading_scale: 1.5,
        }
    }

    #[test]
    fn explicit_height_wins_over_text() {
        let node = ContentNode {
            text: "x".repeat(500),
            ..ContentNode::sized("fixed", 42.0)
        };
        assert_eq!(metrics().measure(&node, 100.0), 42.0);
    }

    #[test]
    fn paragraph_wraps_on_width_and_newlines() {
        // 100mm / 2mm = 50 chars per line.
        let node = ContentNode::new("p", NodeKind::Paragraph, format!("{}\nshort", "a".repeat(120)));
        // 3 wrapped lines + 1 line after the newline.
        assert_eq!(metrics().measure(&node, 100.0), 4.0 * 5.0 + 1.0);
    }

    #[test]
    fn empty_paragraph_still_takes_a_line() {
        let node = ContentNode::new("blank", NodeKind::Paragraph, "");
        assert_eq!(metrics().measure(&node, 100.0), 6.0);
    }

    #[test]
    fn headings_are_scaled() {
        let node = ContentNode::new("h", NodeKind::Heading, "Invoice");
        assert_eq!(metrics().measure(&node, 100.0), 5.0 * 1.5 + 1.0);
    }

    #[test]
    fn measure_all_keeps_source_order() {
        let nodes = vec![
            ContentNode::sized("a", 10.0),
            ContentNode::sized("b", 20.0),
            ContentNode::sized("c", 30.0),
        ];
        let measured = measure_all(nodes, &metrics(), 100.0).unwrap();
        let ids: Vec<_> = measured.iter().map(|m| (m.index, m.id().to_string())).collect();
        assert_eq!(
            ids,
            vec![(0, "a".into()), (1, "b".into()), (2, "c".into())]
        );
    }

    #[test]
    fn negative_heights_are_rejected() {
        let nodes = vec![ContentNode::sized("ok", 1.0), ContentNode::sized("bad", -3.0)];
        match measure_all(nodes, &metrics(), 100.0) {
            Err(ContentError::InvalidHeight { index: 1, id, .. }) => assert_eq!(id, "bad"),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn letter_body_parses_from_json() {
        let body = LetterBody::from_json(
            r#"{ "nodes": [
                { "id": "addr", "kind": "address", "text": "Jane Doe\n1 Main St" },
                { "id": "rows", "kind": "table_rows", "height_mm": 80.5 }
            ] }"#,
        )
        .unwrap();
        assert_eq!(body.nodes.len(), 2);
        assert_eq!(body.nodes[0].kind, NodeKind::Address);
        assert_eq!(body.nodes[1].height_mm, Some(80.5));
        assert!(body.nodes[1].text.is_empty());
    }
}
