use std::fmt::{self, Debug, Display, Write};

/// An index into an [`InterferenceGraph`]'s compact id space, `[0, P)` for resource
/// groups followed by `[P, P + V)` for demand ordinals
///
/// [`InterferenceGraph`]: crate::graph::InterferenceGraph
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct NodeId(pub u32);

impl NodeId {
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("NodeId(")?;
        Debug::fmt(&self.0, f)?;
        f.write_char(')')
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('n')?;
        Display::fmt(&self.0, f)
    }
}

/// A color handed out by a solver. Colors share their numbering with resource
/// group ids, a group is always colored with itself
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct Color(pub u32);

impl Color {
    #[inline]
    pub const fn new(color: u32) -> Self {
        Self(color)
    }

    /// The color a resource group colors itself with
    #[inline]
    pub const fn of_group(group: NodeId) -> Self {
        Self(group.0)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl Debug for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Color(")?;
        Debug::fmt(&self.0, f)?;
        f.write_char(')')
    }
}

impl Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_char('c')?;
        Display::fmt(&self.0, f)
    }
}
