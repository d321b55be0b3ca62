//! Scene node components
//!
//! Every node carries a [`Node`]. Hierarchy is stored as a [`Parent`] on the
//! child and an ordered [`Children`] list on the parent.

use glam::Vec2;
use hecs::Entity;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::core::Rect;

/// Position and size of a scene node.
///
/// `position` is relative to the parent node; roots are relative to the
/// scene origin.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Node {
    /// Offset from the parent's origin
    pub position: Vec2,
    /// Width and height
    pub size: Vec2,
}

impl Node {
    /// Create a node at a local position with a size
    #[must_use]
    pub const fn new(position: Vec2, size: Vec2) -> Self {
        Self { position, size }
    }

    /// Create a node from scalar components
    #[must_use]
    pub const fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(Vec2::new(x, y), Vec2::new(width, height))
    }

    /// Local bounds
    #[must_use]
    pub fn rect(&self) -> Rect {
        Rect::from_position_size(self.position, self.size)
    }
}

/// Optional lookup name for a node
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Name(pub String);

impl Name {
    /// Create a new name
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// The node that owns this one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Parent(pub Entity);

impl Parent {
    /// Get the parent entity
    #[must_use]
    pub const fn entity(&self) -> Entity {
        self.0
    }
}

/// Ordered children of a node
#[derive(Debug, Clone, Default)]
pub struct Children(pub SmallVec<[Entity; 8]>);

impl Children {
    /// Append a child, ignoring duplicates
    pub fn add(&mut self, child: Entity) {
        if !self.0.contains(&child) {
            self.0.push(child);
        }
    }

    /// Remove a child, keeping the order of the rest
    pub fn remove(&mut self, child: Entity) -> bool {
        if let Some(pos) = self.0.iter().position(|&e| e == child) {
            self.0.remove(pos);
            true
        } else {
            false
        }
    }

    /// Check if `child` is in the list
    #[must_use]
    pub fn contains(&self, child: Entity) -> bool {
        self.0.contains(&child)
    }

    /// Check if there are no children
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the number of children
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Iterate over children in order
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Entity> {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_children_keep_order() {
        let mut world = hecs::World::new();
        let a = world.spawn(());
        let b = world.spawn(());
        let c = world.spawn(());

        let mut children = Children::default();
        children.add(a);
        children.add(b);
        children.add(c);
        children.add(a);
        assert_eq!(children.len(), 3);

        assert!(children.remove(b));
        assert!(!children.remove(b));
        assert_eq!(children.iter().copied().collect::<Vec<_>>(), vec![a, c]);
    }

    #[test]
    fn test_node_rect() {
        let node = Node::from_xywh(5.0, 10.0, 20.0, 30.0);
        let rect = node.rect();
        assert_eq!(rect.max(), Vec2::new(25.0, 40.0));
    }
}
