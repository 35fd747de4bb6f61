//! Per-tick draw command queue
//!
//! Commands reference elements by [`ElementIndex`], so they are only valid
//! against the tree of the same tick. They are consumed in insertion order:
//! later commands paint over earlier ones.

use crate::color::Color;
use crate::element::ElementIndex;
use crate::error::{QueueError, TreeError};
use crate::geometry::GeometryBatch;
use crate::tree::ElementTree;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawCommand {
    pub element: ElementIndex,
    pub color: Color,
}

/// Fixed-capacity, append-only list of [`DrawCommand`]s
#[derive(Clone, Debug)]
pub struct DrawCommandQueue {
    commands: Vec<DrawCommand>,
    capacity: usize,
}

impl DrawCommandQueue {
    pub fn new(capacity: usize) -> Self {
        Self {
            commands: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn reset(&mut self) {
        self.commands.clear();
    }

    /// Record a fill of `element`'s rectangle. A full queue rejects the command.
    pub fn push(&mut self, element: ElementIndex, color: Color) -> Result<(), QueueError> {
        if self.commands.len() == self.capacity {
            return Err(QueueError::CapacityExceeded {
                capacity: self.capacity,
            });
        }
        self.commands.push(DrawCommand { element, color });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DrawCommand> {
        self.commands.iter()
    }

    /// Append one quad per command to `batch`, in command order.
    ///
    /// Fails on the first command whose element is not part of `tree`;
    /// quads of the commands before it stay in the batch.
    pub fn emit(&self, tree: &ElementTree, batch: &mut GeometryBatch) -> Result<(), TreeError> {
        for command in &self.commands {
            let rect = tree.rect(command.element)?;
            batch.push_rect(rect.min, rect.size(), command.color);
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a DrawCommandQueue {
    type Item = &'a DrawCommand;
    type IntoIter = std::slice::Iter<'a, DrawCommand>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;

    #[test]
    fn test_push_until_full() {
        let mut queue = DrawCommandQueue::new(2);
        let index = ElementIndex::new(0);
        queue.push(index, Color::default()).unwrap();
        queue.push(index, Color::default()).unwrap();

        assert_eq!(
            queue.push(index, Color::default()),
            Err(QueueError::CapacityExceeded { capacity: 2 })
        );
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_reset_twice_is_noop() {
        let mut queue = DrawCommandQueue::new(4);
        queue.reset();
        queue.reset();
        assert!(queue.is_empty());
        assert_eq!(queue.capacity(), 4);
    }

    #[test]
    fn test_emit_preserves_order() {
        let mut tree = ElementTree::new(4, 0);
        let back = tree
            .append(None, Element::from_key("back").with_extent(100.0, 100.0))
            .unwrap();
        let front = tree
            .append(
                Some(back),
                Element::from_key("front").with_pos(10.0, 10.0).with_extent(20.0, 20.0),
            )
            .unwrap();
        tree.resolve();

        let mut queue = DrawCommandQueue::new(4);
        queue.push(back, Color::gray(0.2)).unwrap();
        queue.push(front, Color::gray(0.8)).unwrap();

        let mut batch = GeometryBatch::new();
        queue.emit(&tree, &mut batch).unwrap();

        let verts = batch.vertices();
        assert_eq!(verts.len(), 12);
        assert_eq!(verts[0].color, Color::gray(0.2).to_array());
        assert_eq!(verts[6].color, Color::gray(0.8).to_array());
        assert_eq!(verts[6].pos, [10.0, 10.0]);
        assert_eq!(verts[8].pos, [30.0, 30.0]);
    }

    #[test]
    fn test_emit_rejects_stale_index() {
        let tree = ElementTree::new(4, 0);
        let mut queue = DrawCommandQueue::new(4);
        queue.push(ElementIndex::new(2), Color::default()).unwrap();

        let mut batch = GeometryBatch::new();
        assert!(queue.emit(&tree, &mut batch).is_err());
        assert!(batch.is_empty());
    }
}
