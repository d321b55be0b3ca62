//! Lazy scene traversals
//!
//! All iterators borrow the scene immutably, so the tree cannot be changed
//! while a traversal is in progress.

use glam::Vec2;
use hecs::{Entity, World};

use super::{Children, GridCoord, GridMap, Node};

/// Depth-first, in-order sequence of the leaf nodes under a root.
///
/// Children are visited in list order, so the tiles of a grid map come out
/// row-major. Cloning the iterator restarts from the clone point.
#[derive(Clone)]
pub struct Leaves<'a> {
    world: &'a World,
    stack: Vec<Entity>,
}

impl<'a> Leaves<'a> {
    pub(crate) fn new(world: &'a World, root: Entity) -> Self {
        let stack = if world.contains(root) { vec![root] } else { Vec::new() };
        Self { world, stack }
    }
}

impl Iterator for Leaves<'_> {
    type Item = Entity;

    fn next(&mut self) -> Option<Entity> {
        while let Some(entity) = self.stack.pop() {
            match self.world.get::<&Children>(entity) {
                Ok(children) if !children.is_empty() => {
                    self.stack.extend(children.iter().rev().copied());
                }
                _ => return Some(entity),
            }
        }
        None
    }
}

/// A node visited by [`Walk`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Visit {
    pub entity: Entity,
    /// Position with every ancestor offset applied
    pub world_position: Vec2,
    pub size: Vec2,
    /// Distance from the walk root
    pub depth: usize,
}

/// Pre-order walk over every node under a root, parents before children
#[derive(Clone)]
pub struct Walk<'a> {
    world: &'a World,
    stack: Vec<(Entity, Vec2, usize)>,
}

impl<'a> Walk<'a> {
    pub(crate) fn new(world: &'a World, root: Entity, origin: Vec2) -> Self {
        let stack = if world.contains(root) {
            vec![(root, origin, 0)]
        } else {
            Vec::new()
        };
        Self { world, stack }
    }
}

impl Iterator for Walk<'_> {
    type Item = Visit;

    fn next(&mut self) -> Option<Visit> {
        let (entity, parent_origin, depth) = self.stack.pop()?;
        let node = self
            .world
            .get::<&Node>(entity)
            .map(|node| *node)
            .unwrap_or_default();
        let world_position = parent_origin + node.position;

        if let Ok(children) = self.world.get::<&Children>(entity) {
            self.stack.extend(
                children
                    .iter()
                    .rev()
                    .map(|&child| (child, world_position, depth + 1)),
            );
        }

        Some(Visit {
            entity,
            world_position,
            size: node.size,
            depth,
        })
    }
}

/// Row-major sequence of `(coordinate, tile)` pairs of one grid map
pub struct Tiles<'a> {
    grid: hecs::Ref<'a, GridMap>,
    index: usize,
}

impl<'a> Tiles<'a> {
    pub(crate) fn new(grid: hecs::Ref<'a, GridMap>) -> Self {
        Self { grid, index: 0 }
    }
}

impl Iterator for Tiles<'_> {
    type Item = (GridCoord, Entity);

    fn next(&mut self) -> Option<Self::Item> {
        let entity = *self.grid.entities().get(self.index)?;
        let cols = self.grid.size().cols as usize;
        let coord = GridCoord::new((self.index % cols) as u32, (self.index / cols) as u32);
        self.index += 1;
        Some((coord, entity))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.grid.entities().len().saturating_sub(self.index);
        (remaining, Some(remaining))
    }
}
