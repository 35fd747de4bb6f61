use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use glam::Vec2;

use crate::layout::{CrossAlign, LayoutKind, Padding};

/// Stable identity of an element across frames.
///
/// Ids are derived from a caller-supplied logical key rather than from the
/// slot an element happens to occupy, so they survive tree rebuilds and can
/// be used to match elements between ticks (hover tracking, animations).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

impl ElementId {
    /// Id of a top-level element identified by `key`.
    pub fn from_key(key: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        Self(hasher.finish())
    }

    /// Id for an element nested under `self`, identified by `key`.
    ///
    /// ```
    /// # use lumen_gui::ElementId;
    /// let panel = ElementId::from_key("panel");
    /// assert_eq!(panel.child("ok"), panel.child("ok"));
    /// assert_ne!(panel.child("ok"), panel.child("cancel"));
    /// ```
    pub fn child(self, key: &str) -> Self {
        let mut hasher = DefaultHasher::new();
        self.0.hash(&mut hasher);
        key.hash(&mut hasher);
        Self(hasher.finish())
    }

    /// Id for the `n`-th element of a repeated group under `self`.
    pub fn indexed(self, n: u64) -> Self {
        let mut hasher = DefaultHasher::new();
        self.0.hash(&mut hasher);
        n.hash(&mut hasher);
        Self(hasher.finish())
    }
}

/// Dense slot index into the per-frame element arrays.
///
/// Only valid against the tree of the tick that produced it. The tree is
/// rebuilt every tick, so indices must never be kept across ticks; use
/// [`ElementId`] for that.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementIndex(pub(crate) u32);

impl ElementIndex {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub const fn get(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ElementIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

bitflags::bitflags! {
    /// Packed layout flags of an element.
    ///
    /// Bits 0-1 hold the major-axis [`LayoutKind`], bits 2-3 the minor-axis
    /// [`CrossAlign`], bit 4 enables auto-layout of children.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ElementFlags: u32 {
        const LAYOUT_AXIS_MAJOR_MASK = 0x3;
        const LAYOUT_AXIS_MINOR_MASK = 0xC;
        const USE_AUTO_LAYOUT = 0x10;
    }
}

impl ElementFlags {
    pub fn major_axis(self) -> LayoutKind {
        LayoutKind::from_bits(self.bits() & Self::LAYOUT_AXIS_MAJOR_MASK.bits())
    }

    pub fn minor_axis(self) -> CrossAlign {
        CrossAlign::from_bits((self.bits() & Self::LAYOUT_AXIS_MINOR_MASK.bits()) >> 2)
    }

    pub fn auto_layout(self) -> bool {
        self.contains(Self::USE_AUTO_LAYOUT)
    }

    pub fn with_major_axis(self, kind: LayoutKind) -> Self {
        let cleared = self.bits() & !Self::LAYOUT_AXIS_MAJOR_MASK.bits();
        Self::from_bits_retain(cleared | kind.bits())
    }

    pub fn with_minor_axis(self, align: CrossAlign) -> Self {
        let cleared = self.bits() & !Self::LAYOUT_AXIS_MINOR_MASK.bits();
        Self::from_bits_retain(cleared | (align.bits() << 2))
    }
}

/// A UI node as supplied by scene code.
///
/// Plain value type; all derived geometry (measured extent, absolute
/// position) lives in the [`ElementTree`](crate::ElementTree) arrays.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Element {
    pub id: ElementId,
    /// Offset relative to the parent's content origin
    pub pos: Vec2,
    /// Placement inside the parent's content box, 0.0 = start, 1.0 = end.
    /// Ignored when the parent auto-lays out its children.
    pub alignment: Vec2,
    /// Requested extent; a nonzero component overrides the measured one
    pub extent: Vec2,
    pub padding: Padding,
    pub flags: ElementFlags,
}

impl Element {
    pub fn from_id(id: ElementId) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    pub fn from_key(key: &str) -> Self {
        Self::from_id(ElementId::from_key(key))
    }

    pub fn with_pos(mut self, x: f32, y: f32) -> Self {
        self.pos = Vec2::new(x, y);
        self
    }

    pub fn with_alignment(mut self, x: f32, y: f32) -> Self {
        self.alignment = Vec2::new(x, y);
        self
    }

    pub fn with_extent(mut self, width: f32, height: f32) -> Self {
        self.extent = Vec2::new(width, height);
        self
    }

    pub fn with_padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_layout(mut self, kind: LayoutKind) -> Self {
        self.flags = self.flags.with_major_axis(kind);
        self
    }

    pub fn with_cross_align(mut self, align: CrossAlign) -> Self {
        self.flags = self.flags.with_minor_axis(align);
        self
    }

    /// Place children one after another along the major axis.
    pub fn with_auto_layout(mut self, enabled: bool) -> Self {
        self.flags.set(ElementFlags::USE_AUTO_LAYOUT, enabled);
        self
    }

    pub fn major_axis(&self) -> LayoutKind {
        self.flags.major_axis()
    }

    pub fn minor_axis(&self) -> CrossAlign {
        self.flags.minor_axis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_pack_both_axes() {
        let flags = ElementFlags::empty()
            .with_major_axis(LayoutKind::Vertical)
            .with_minor_axis(CrossAlign::End)
            | ElementFlags::USE_AUTO_LAYOUT;

        assert_eq!(flags.bits(), 0x1 | (0x2 << 2) | 0x10);
        assert_eq!(flags.major_axis(), LayoutKind::Vertical);
        assert_eq!(flags.minor_axis(), CrossAlign::End);
        assert!(flags.auto_layout());
    }

    #[test]
    fn test_flags_overwrite_axis() {
        let flags = ElementFlags::empty()
            .with_major_axis(LayoutKind::Overlay)
            .with_major_axis(LayoutKind::Horizontal);
        assert_eq!(flags.major_axis(), LayoutKind::Horizontal);
        assert_eq!(flags.minor_axis(), CrossAlign::Start);
    }

    #[test]
    fn test_ids_are_deterministic() {
        assert_eq!(ElementId::from_key("window"), ElementId::from_key("window"));
        assert_ne!(ElementId::from_key("window"), ElementId::from_key("other"));

        let list = ElementId::from_key("list");
        assert_ne!(list.indexed(0), list.indexed(1));
        assert_ne!(list.child("a"), ElementId::from_key("a"));
    }

    #[test]
    fn test_builder() {
        let elem = Element::from_key("box")
            .with_pos(5.0, 6.0)
            .with_extent(32.0, 128.0)
            .with_layout(LayoutKind::Horizontal)
            .with_auto_layout(true);

        assert_eq!(elem.pos, Vec2::new(5.0, 6.0));
        assert_eq!(elem.extent, Vec2::new(32.0, 128.0));
        assert_eq!(elem.major_axis(), LayoutKind::Horizontal);
        assert!(elem.flags.auto_layout());

        let elem = elem.with_auto_layout(false);
        assert!(!elem.flags.auto_layout());
    }
}
