use std::collections::VecDeque;

use crate::content::MeasuredNode;

/// Slack absorbed when summing heights so float noise never forces a break.
const FIT_TOLERANCE_MM: f32 = 1e-3;

/// Prefix taken from the cursor for one page.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub nodes: Vec<MeasuredNode>,
    pub used_height_mm: f32,
    /// Set when a single node taller than the budget was placed alone.
    pub oversized: bool,
}

/// Remainder of the letter body that has not been placed on a page yet.
#[derive(Debug, Clone, Default)]
pub struct ContentCursor {
    remaining: VecDeque<MeasuredNode>,
}

impl ContentCursor {
    pub fn new(nodes: impl IntoIterator<Item = MeasuredNode>) -> Self {
        Self {
            remaining: nodes.into_iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.remaining.is_empty()
    }

    /// Number of nodes still waiting for a page.
    pub fn remaining(&self) -> usize {
        self.remaining.len()
    }

    pub fn remaining_height_mm(&self) -> f32 {
        self.remaining.iter().map(|node| node.height_mm).sum()
    }

    /// Removes the longest prefix whose summed height stays within `max_height_mm`.
    ///
    /// The head node is always taken, even when it alone exceeds the budget,
    /// so every call on a non-empty cursor makes progress.
    pub fn take_fitting(&mut self, max_height_mm: f32) -> Placement {
        let mut nodes = Vec::new();
        let mut used_height_mm = 0.0f32;

        while let Some(next) = self.remaining.front() {
            let height = next.height_mm;
            if !nodes.is_empty() && used_height_mm + height > max_height_mm + FIT_TOLERANCE_MM {
                break;
            }
            let Some(node) = self.remaining.pop_front() else {
                break;
            };
            used_height_mm += height;
            nodes.push(node);
        }

        let oversized = nodes.len() == 1 && used_height_mm > max_height_mm + FIT_TOLERANCE_MM;
        Placement {
            nodes,
            used_height_mm,
            oversized,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ContentNode;

    fn cursor(heights: &[f32]) -> ContentCursor {
        ContentCursor::new(heights.iter().enumerate().map(|(index, height)| {
            MeasuredNode::new(index, ContentNode::sized(format!("n{index}"), *height), *height)
        }))
    }

    fn indices(placement: &Placement) -> Vec<usize> {
        placement.nodes.iter().map(|node| node.index).collect()
    }

    #[test]
    fn takes_everything_that_fits() {
        let mut cursor = cursor(&[50.0, 60.0, 40.0]);
        let placement = cursor.take_fitting(257.0);
        assert_eq!(indices(&placement), vec![0, 1, 2]);
        assert_eq!(placement.used_height_mm, 150.0);
        assert!(!placement.oversized);
        assert!(cursor.is_empty());
    }

    #[test]
    fn stops_before_the_overflowing_node() {
        let mut cursor = cursor(&[100.0, 100.0, 100.0]);
        let placement = cursor.take_fitting(257.0);
        assert_eq!(indices(&placement), vec![0, 1]);
        assert_eq!(cursor.remaining(), 1);
        assert_eq!(cursor.remaining_height_mm(), 100.0);
    }

    #[test]
    fn exact_fit_is_accepted() {
        let mut cursor = cursor(&[128.5, 128.5, 1.0]);
        let placement = cursor.take_fitting(257.0);
        assert_eq!(indices(&placement), vec![0, 1]);
        assert!(!placement.oversized);
    }

    #[test]
    fn oversized_head_is_placed_alone() {
        let mut cursor = cursor(&[500.0, 10.0]);
        let placement = cursor.take_fitting(257.0);
        assert_eq!(indices(&placement), vec![0]);
        assert!(placement.oversized);
        assert_eq!(cursor.remaining(), 1);
    }

    #[test]
    fn empty_cursor_yields_empty_placement() {
        let mut cursor = ContentCursor::default();
        let placement = cursor.take_fitting(257.0);
        assert!(placement.nodes.is_empty());
        assert!(!placement.oversized);
    }

    #[test]
    fn zero_height_nodes_ride_along() {
        let mut cursor = cursor(&[257.0, 0.0, 0.0, 1.0]);
        let placement = cursor.take_fitting(257.0);
        assert_eq!(indices(&placement), vec![0, 1, 2]);
    }
}
