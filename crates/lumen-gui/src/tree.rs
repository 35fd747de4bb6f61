//! Structure-of-arrays element tree
//!
//! The tree is rebuilt from scratch every tick: [`ElementTree::reset`] drops all
//! elements, scene code appends nodes parent-first, and [`ElementTree::resolve`]
//! runs the bottom-up layout pass followed by the top-down transform pass.
//! After that the tree is read-only until the next reset.
//!
//! Every attribute lives in its own array indexed by [`ElementIndex`]. Parent,
//! child and sibling links are plain indices, children form a singly linked
//! list in insertion order (`first_children` -> `siblings` -> ... ->
//! `last_children`).

use std::ops::Index;

use glam::Vec2;

use crate::element::{Element, ElementId, ElementIndex};
use crate::error::TreeError;
use crate::layout::{clamp_extent, ElementConstraints, LayoutConfig, LayoutKind};
use crate::primitives::Rect;

#[derive(Clone, Debug, PartialEq)]
pub struct ElementTree {
    elements: Vec<Element>,
    parents: Vec<Option<ElementIndex>>,
    first_children: Vec<Option<ElementIndex>>,
    last_children: Vec<Option<ElementIndex>>,
    siblings: Vec<Option<ElementIndex>>,
    /// Measured size, written by the layout pass
    extents: Vec<Vec2>,
    /// Absolute position, written by the transform pass
    positions: Vec<Vec2>,
    /// Folded constraint bounds, rebuilt at the start of every layout pass
    min_extents: Vec<Vec2>,
    max_extents: Vec<Vec2>,
    element_count: usize,

    constraints: Vec<ElementConstraints>,
    constraint_capacity: usize,

    config: LayoutConfig,
}

impl ElementTree {
    /// Create a tree holding at most `capacity` elements and
    /// `constraint_capacity` constraint entries per tick.
    ///
    /// All arrays are allocated here once; building a tick never allocates.
    pub fn new(capacity: usize, constraint_capacity: usize) -> Self {
        Self::with_config(capacity, constraint_capacity, LayoutConfig::default())
    }

    pub fn with_config(capacity: usize, constraint_capacity: usize, config: LayoutConfig) -> Self {
        Self {
            elements: vec![Element::default(); capacity],
            parents: vec![None; capacity],
            first_children: vec![None; capacity],
            last_children: vec![None; capacity],
            siblings: vec![None; capacity],
            extents: vec![Vec2::ZERO; capacity],
            positions: vec![Vec2::ZERO; capacity],
            min_extents: vec![Vec2::ZERO; capacity],
            max_extents: vec![Vec2::INFINITY; capacity],
            element_count: 0,
            constraints: Vec::with_capacity(constraint_capacity),
            constraint_capacity,
            config,
        }
    }

    pub fn config(&self) -> LayoutConfig {
        self.config
    }

    pub fn set_config(&mut self, config: LayoutConfig) {
        self.config = config;
    }

    pub fn len(&self) -> usize {
        self.element_count
    }

    pub fn is_empty(&self) -> bool {
        self.element_count == 0
    }

    pub fn capacity(&self) -> usize {
        self.elements.len()
    }

    /// Drop every element and constraint. Array storage is kept.
    pub fn reset(&mut self) {
        self.element_count = 0;
        self.constraints.clear();
    }

    /// Append `value` as the last child of `parent` (or as a new root).
    ///
    /// This is the only way to mutate the structure of the tree. On error
    /// nothing is written.
    pub fn append(
        &mut self,
        parent: Option<ElementIndex>,
        value: Element,
    ) -> Result<ElementIndex, TreeError> {
        if self.element_count == self.capacity() {
            return Err(TreeError::CapacityExceeded {
                capacity: self.capacity(),
            });
        }
        if let Some(parent) = parent {
            self.check(parent)?;
        }

        let slot = self.element_count;
        let result = ElementIndex(slot as u32);

        self.elements[slot] = value;
        self.parents[slot] = parent;
        self.first_children[slot] = None;
        self.last_children[slot] = None;
        self.siblings[slot] = None;
        self.extents[slot] = Vec2::ZERO;
        self.positions[slot] = Vec2::ZERO;

        if let Some(parent) = parent {
            let p = parent.get();
            if let Some(last) = self.last_children[p] {
                self.siblings[last.get()] = Some(result);
            }
            self.last_children[p] = Some(result);
            if self.first_children[p].is_none() {
                self.first_children[p] = Some(result);
            }
        }

        self.element_count += 1;
        Ok(result)
    }

    /// Attach min/max extent bounds to an element of the current tree.
    ///
    /// Several entries for the same element intersect. A zero `max` component
    /// leaves that axis unbounded.
    pub fn constrain(&mut self, index: ElementIndex, min: Vec2, max: Vec2) -> Result<(), TreeError> {
        self.check(index)?;
        if self.constraints.len() == self.constraint_capacity {
            return Err(TreeError::CapacityExceeded {
                capacity: self.constraint_capacity,
            });
        }
        self.constraints
            .push(ElementConstraints::new(index, min, max));
        Ok(())
    }

    pub fn constraints(&self) -> &[ElementConstraints] {
        &self.constraints
    }

    /// Run the layout pass and then the transform pass.
    pub fn resolve(&mut self) {
        self.layout();
        self.transform();
    }

    /// Bottom-up measurement pass.
    ///
    /// Children always sit at higher indices than their parent, so walking the
    /// indices backwards measures every child before its parent.
    pub fn layout(&mut self) {
        let count = self.element_count;

        self.min_extents[..count].fill(Vec2::ZERO);
        self.max_extents[..count].fill(Vec2::INFINITY);
        for constraint in &self.constraints {
            let i = constraint.index.get();
            if i >= count {
                log::warn!(
                    "ignoring constraint on element {} (tree holds {count})",
                    constraint.index
                );
                continue;
            }
            self.min_extents[i] = self.min_extents[i].max(constraint.min_extent);
            self.max_extents[i] = self.max_extents[i].min(constraint.resolved_max());
        }

        for i in (0..count).rev() {
            let elem = self.elements[i];
            let mut extent = self.measure_children(i) + elem.padding.size();

            // A requested extent replaces the measured one; content may overflow it.
            if elem.extent.x != 0.0 {
                extent.x = elem.extent.x;
            }
            if elem.extent.y != 0.0 {
                extent.y = elem.extent.y;
            }

            self.extents[i] = clamp_extent(extent, self.min_extents[i], self.max_extents[i]);
        }
    }

    /// Size of the children of `index` aggregated along the parent's axes.
    fn measure_children(&self, index: usize) -> Vec2 {
        let kind = self.elements[index].major_axis();
        let mut total = Vec2::ZERO;
        let mut count = 0usize;

        for child in self.children(ElementIndex(index as u32)) {
            let extent = self.extents[child.get()];
            match kind.major_index() {
                Some(major) => {
                    let minor = 1 - major;
                    total[major] += extent[major];
                    total[minor] = total[minor].max(extent[minor]);
                }
                None => total = total.max(extent),
            }
            count += 1;
        }

        if let (Some(major), true) = (kind.major_index(), count > 1) {
            total[major] += self.config.spacing * (count - 1) as f32;
        }
        total
    }

    /// Top-down pass assigning absolute positions.
    ///
    /// Parents precede their children in index order, so a node's position is
    /// final by the time its children are placed.
    pub fn transform(&mut self) {
        for i in 0..self.element_count {
            if self.parents[i].is_none() {
                self.positions[i] = self.elements[i].pos;
            }
            self.place_children(i);
        }
    }

    fn place_children(&mut self, index: usize) {
        let parent = self.elements[index];
        let origin = self.positions[index] + parent.padding.origin();
        let content = (self.extents[index] - parent.padding.size()).max(Vec2::ZERO);
        let kind = parent.major_axis();
        let cross = parent.minor_axis();
        let auto = parent.flags.auto_layout();

        let mut cursor = 0.0f32;
        let mut next = self.first_children[index];
        while let Some(child) = next {
            let c = child.get();
            let extent = self.extents[c];
            let elem = self.elements[c];

            let offset = if !auto {
                elem.alignment * (content - extent)
            } else {
                match kind {
                    LayoutKind::Overlay => Vec2::new(
                        cross.offset(content.x, extent.x),
                        cross.offset(content.y, extent.y),
                    ),
                    LayoutKind::Horizontal | LayoutKind::Vertical => {
                        let major = if kind == LayoutKind::Horizontal { 0 } else { 1 };
                        let minor = 1 - major;
                        let mut offset = Vec2::ZERO;
                        offset[major] = cursor;
                        offset[minor] = cross.offset(content[minor], extent[minor]);
                        cursor += extent[major] + self.config.spacing;
                        offset
                    }
                }
            };

            self.positions[c] = origin + offset + elem.pos;
            next = self.siblings[c];
        }
    }

    fn check(&self, index: ElementIndex) -> Result<usize, TreeError> {
        let i = index.get();
        if i < self.element_count {
            Ok(i)
        } else {
            Err(TreeError::IndexOutOfRange {
                index,
                len: self.element_count,
            })
        }
    }

    pub fn get(&self, index: ElementIndex) -> Result<&Element, TreeError> {
        let i = self.check(index)?;
        Ok(&self.elements[i])
    }

    /// Mutable access to an element's value, e.g. to set its extent after appending.
    pub fn get_mut(&mut self, index: ElementIndex) -> Result<&mut Element, TreeError> {
        let i = self.check(index)?;
        Ok(&mut self.elements[i])
    }

    pub fn parent(&self, index: ElementIndex) -> Result<Option<ElementIndex>, TreeError> {
        let i = self.check(index)?;
        Ok(self.parents[i])
    }

    pub fn first_child(&self, index: ElementIndex) -> Result<Option<ElementIndex>, TreeError> {
        let i = self.check(index)?;
        Ok(self.first_children[i])
    }

    pub fn last_child(&self, index: ElementIndex) -> Result<Option<ElementIndex>, TreeError> {
        let i = self.check(index)?;
        Ok(self.last_children[i])
    }

    pub fn next_sibling(&self, index: ElementIndex) -> Result<Option<ElementIndex>, TreeError> {
        let i = self.check(index)?;
        Ok(self.siblings[i])
    }

    /// Iterate the children of `index` in insertion order.
    ///
    /// Yields nothing for an index outside the current tree.
    pub fn children(&self, index: ElementIndex) -> Children<'_> {
        let next = self
            .check(index)
            .ok()
            .and_then(|i| self.first_children[i]);
        Children { tree: self, next }
    }

    /// Measured extent from the last layout pass.
    pub fn extent(&self, index: ElementIndex) -> Result<Vec2, TreeError> {
        let i = self.check(index)?;
        Ok(self.extents[i])
    }

    /// Absolute position from the last transform pass.
    pub fn position(&self, index: ElementIndex) -> Result<Vec2, TreeError> {
        let i = self.check(index)?;
        Ok(self.positions[i])
    }

    /// Absolute rectangle (position + measured extent).
    pub fn rect(&self, index: ElementIndex) -> Result<Rect, TreeError> {
        let i = self.check(index)?;
        Ok(Rect::from_min_size(self.positions[i], self.extents[i]))
    }

    pub fn elements(&self) -> &[Element] {
        &self.elements[..self.element_count]
    }

    pub fn extents(&self) -> &[Vec2] {
        &self.extents[..self.element_count]
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions[..self.element_count]
    }

    /// Indices of every element in append order
    pub fn indices(&self) -> impl Iterator<Item = ElementIndex> + '_ {
        (0..self.element_count).map(|i| ElementIndex(i as u32))
    }

    /// Slot of the element carrying `id` in the current tree, if any.
    pub fn find(&self, id: ElementId) -> Option<ElementIndex> {
        self.elements()
            .iter()
            .position(|elem| elem.id == id)
            .map(|i| ElementIndex(i as u32))
    }

    /// Topmost element whose absolute rectangle contains `point`.
    ///
    /// Later elements are drawn over earlier ones, so the highest matching
    /// index wins. Only meaningful after [`resolve`](Self::resolve).
    pub fn hit_test(&self, point: Vec2) -> Option<ElementIndex> {
        (0..self.element_count)
            .rev()
            .find(|&i| Rect::from_min_size(self.positions[i], self.extents[i]).contains(point))
            .map(|i| ElementIndex(i as u32))
    }
}

impl Index<ElementIndex> for ElementTree {
    type Output = Element;

    /// # Panics
    /// Panics if `index` is not part of the current tree.
    fn index(&self, index: ElementIndex) -> &Element {
        &self.elements()[index.get()]
    }
}

/// Iterator over the children of one element, see [`ElementTree::children`].
pub struct Children<'a> {
    tree: &'a ElementTree,
    next: Option<ElementIndex>,
}

impl Iterator for Children<'_> {
    type Item = ElementIndex;

    fn next(&mut self) -> Option<ElementIndex> {
        let current = self.next?;
        self.next = self.tree.siblings[current.get()];
        Some(current)
    }
}
