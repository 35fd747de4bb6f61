use glam::Vec2;

use crate::element::ElementIndex;

/// How a container arranges its children along its major axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LayoutKind {
    /// Children stack left to right; the major axis is x
    #[default]
    Horizontal,
    /// Children stack top to bottom; the major axis is y
    Vertical,
    /// Children overlap in the same content box
    Overlay,
}

impl LayoutKind {
    /// Decode the 2-bit major-axis field. The reserved value 3 reads as `Overlay`.
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0x3 {
            0 => Self::Horizontal,
            1 => Self::Vertical,
            _ => Self::Overlay,
        }
    }

    pub const fn bits(self) -> u32 {
        match self {
            Self::Horizontal => 0,
            Self::Vertical => 1,
            Self::Overlay => 2,
        }
    }

    /// Component index of the major axis, `None` for overlays.
    pub const fn major_index(self) -> Option<usize> {
        match self {
            Self::Horizontal => Some(0),
            Self::Vertical => Some(1),
            Self::Overlay => None,
        }
    }
}

/// Placement of auto-laid-out children across the major axis.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CrossAlign {
    #[default]
    Start,
    Center,
    End,
}

impl CrossAlign {
    /// Decode the 2-bit minor-axis field. The reserved value 3 reads as `Start`.
    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0x3 {
            1 => Self::Center,
            2 => Self::End,
            _ => Self::Start,
        }
    }

    pub const fn bits(self) -> u32 {
        match self {
            Self::Start => 0,
            Self::Center => 1,
            Self::End => 2,
        }
    }

    /// Offset of a child of size `child` inside a span of size `available`.
    pub fn offset(self, available: f32, child: f32) -> f32 {
        match self {
            Self::Start => 0.0,
            Self::Center => (available - child) * 0.5,
            Self::End => available - child,
        }
    }
}

/// Padding inside an element, between its border and its content box
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Padding {
    pub right: f32,
    pub top: f32,
    pub left: f32,
    pub bottom: f32,
}

impl Padding {
    pub const ZERO: Self = Self::all(0.0);

    /// Create padding with all sides equal
    pub const fn all(value: f32) -> Self {
        Self {
            right: value,
            top: value,
            left: value,
            bottom: value,
        }
    }

    /// Create padding with symmetric horizontal and vertical values (CSS-style)
    ///
    /// ```
    /// # use lumen_gui::Padding;
    /// let padding = Padding::symmetric(10.0, 20.0);
    /// assert_eq!(padding.left, 10.0);
    /// assert_eq!(padding.right, 10.0);
    /// assert_eq!(padding.top, 20.0);
    /// assert_eq!(padding.bottom, 20.0);
    /// ```
    pub const fn symmetric(horizontal: f32, vertical: f32) -> Self {
        Self {
            right: horizontal,
            top: vertical,
            left: horizontal,
            bottom: vertical,
        }
    }

    /// Create padding from individual top, right, bottom, left values (CSS-style)
    pub const fn trbl(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            right,
            top,
            left,
            bottom,
        }
    }

    /// Offset from the element's origin to its content origin.
    ///
    /// Layout measures from the minimum corner, so `top` pads the edge with the
    /// smaller y. With a bottom-left scene origin that edge is drawn lowest.
    pub fn origin(&self) -> Vec2 {
        Vec2::new(self.left, self.top)
    }

    /// Total padding along each axis
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.left + self.right, self.top + self.bottom)
    }
}

/// Min/max extent bounds attached to one element of the current tree.
///
/// A zero `max_extent` component means "unbounded" on that axis.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ElementConstraints {
    pub index: ElementIndex,
    pub min_extent: Vec2,
    pub max_extent: Vec2,
}

impl ElementConstraints {
    pub fn new(index: ElementIndex, min_extent: Vec2, max_extent: Vec2) -> Self {
        Self {
            index,
            min_extent,
            max_extent,
        }
    }

    pub(crate) fn resolved_max(&self) -> Vec2 {
        Vec2::new(
            if self.max_extent.x > 0.0 {
                self.max_extent.x
            } else {
                f32::INFINITY
            },
            if self.max_extent.y > 0.0 {
                self.max_extent.y
            } else {
                f32::INFINITY
            },
        )
    }
}

/// Tunables of the layout pass
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutConfig {
    /// Gap inserted between consecutive children along the major axis
    pub spacing: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self { spacing: 0.0 }
    }
}

/// Clamp `extent` into `[min, max]` per axis. `min` wins when the bounds cross.
pub(crate) fn clamp_extent(extent: Vec2, min: Vec2, max: Vec2) -> Vec2 {
    extent.min(max).max(min)
}
