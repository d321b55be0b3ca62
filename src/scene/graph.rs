//! The scene tree
//!
//! Nodes live in a [`hecs::World`]; the tree structure is kept in
//! [`Parent`]/[`Children`] components. Textures reference shared assets, which
//! are not thread-safe, so they are kept in a side table instead of the world.

use glam::Vec2;
use hecs::{Entity, World};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::{
    Children, GridCoord, GridMap, GridSize, Leaves, Name, Node, Parent, Tile, Tiles, Walk,
};
use crate::assets::Texture;
use crate::core::{EventEmitter, EventSource, Rect};

/// Change notifications emitted by a [`Scene`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SceneEvent {
    /// A node's local position changed
    LocationUpdate {
        entity: Entity,
        position: Vec2,
        world_position: Vec2,
    },
    /// A node's size changed
    SizeUpdate { entity: Entity, size: Vec2 },
    /// A node was appended to a parent's child list
    ChildAdded { parent: Entity, child: Entity },
    /// A node was taken out of a parent's child list
    ChildRemoved { parent: Entity, child: Entity },
}

/// Errors from scene operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("entity {0:?} does not exist")]
    NoSuchEntity(Entity),
    #[error("entity {0:?} cannot be its own child")]
    SelfParent(Entity),
    #[error("entity {child:?} already belongs to {parent:?}")]
    AlreadyParented { child: Entity, parent: Entity },
    #[error("adding {child:?} under {parent:?} would create a cycle")]
    Cycle { parent: Entity, child: Entity },
    #[error("entity {child:?} is not a child of {parent:?}")]
    NotAChild { parent: Entity, child: Entity },
    #[error("entity {0:?} is not a grid map")]
    NotAGrid(Entity),
    #[error("tile {coord} is outside a {size} grid")]
    TileOutOfBounds { coord: GridCoord, size: GridSize },
    #[error("grid must have at least one tile")]
    EmptyGrid,
    #[error("tile size must be positive and finite, got {0}")]
    InvalidTileSize(Vec2),
    #[error("tile {0:?} is fixed to its grid cell")]
    FixedTile(Entity),
}

/// A tree of positioned, sized nodes.
///
/// Any number of roots may exist; a node belongs to at most one parent.
/// Positions are local to the parent.
pub struct Scene {
    world: World,
    textures: FxHashMap<Entity, Texture>,
    events: EventEmitter<SceneEvent>,
}

impl Scene {
    /// Create an empty scene
    #[must_use]
    pub fn new() -> Self {
        Self {
            world: World::new(),
            textures: FxHashMap::default(),
            events: EventEmitter::new(),
        }
    }

    /// Spawn a root node
    pub fn spawn(&mut self, node: Node) -> Entity {
        self.world.spawn((node,))
    }

    /// Spawn a root node with a lookup name
    pub fn spawn_named(&mut self, name: impl Into<String>, node: Node) -> Entity {
        self.world.spawn((node, Name::new(name)))
    }

    /// Spawn a node and append it to `parent`
    ///
    /// # Errors
    ///
    /// Returns an error if `parent` does not exist
    pub fn spawn_child(&mut self, parent: Entity, node: Node) -> Result<Entity, SceneError> {
        self.ensure_exists(parent)?;
        let child = self.spawn(node);
        self.add_child(parent, child)?;
        Ok(child)
    }

    /// Append a root node to the end of `parent`'s children
    ///
    /// # Errors
    ///
    /// Returns an error if either node is missing, the child already has a
    /// parent, or the link would make a cycle
    pub fn add_child(&mut self, parent: Entity, child: Entity) -> Result<(), SceneError> {
        self.ensure_exists(parent)?;
        self.ensure_exists(child)?;
        if parent == child {
            return Err(SceneError::SelfParent(child));
        }
        if let Some(existing) = self.parent(child) {
            return Err(SceneError::AlreadyParented {
                child,
                parent: existing,
            });
        }
        if self.ancestors(parent).any(|ancestor| ancestor == child) {
            return Err(SceneError::Cycle { parent, child });
        }

        self.link(parent, child)?;
        self.events.emit(&SceneEvent::ChildAdded { parent, child });
        Ok(())
    }

    /// Take `child` out of `parent` and despawn it with its subtree
    ///
    /// # Errors
    ///
    /// Returns an error if `child` is not a direct child of `parent` or is a
    /// grid tile
    pub fn remove_child(&mut self, parent: Entity, child: Entity) -> Result<(), SceneError> {
        self.ensure_exists(parent)?;
        if self.parent(child) != Some(parent) {
            return Err(SceneError::NotAChild { parent, child });
        }
        self.despawn(child)
    }

    /// Take a node out of its parent, keeping it alive as a root
    ///
    /// Returns the former parent.
    ///
    /// # Errors
    ///
    /// Returns an error if the node is missing or is a grid tile
    pub fn detach(&mut self, child: Entity) -> Result<Option<Entity>, SceneError> {
        self.ensure_exists(child)?;
        self.ensure_not_tile(child)?;

        let Some(parent) = self.parent(child) else {
            return Ok(None);
        };
        self.unlink(parent, child);
        self.events.emit(&SceneEvent::ChildRemoved { parent, child });
        Ok(Some(parent))
    }

    /// Despawn a node and everything under it
    ///
    /// # Errors
    ///
    /// Returns an error if the node is missing or is a grid tile; despawn the
    /// grid instead
    pub fn despawn(&mut self, entity: Entity) -> Result<(), SceneError> {
        self.ensure_exists(entity)?;
        self.ensure_not_tile(entity)?;

        let parent = self.parent(entity);
        if let Some(parent) = parent {
            self.unlink(parent, entity);
        }

        let mut stack = vec![entity];
        let mut removed = 0usize;
        while let Some(next) = stack.pop() {
            if let Ok(children) = self.world.get::<&Children>(next) {
                stack.extend(children.iter().copied());
            }
            self.textures.remove(&next);
            if self.world.despawn(next).is_ok() {
                removed += 1;
            }
        }
        log::debug!("Despawned {entity:?} and {} descendants", removed.saturating_sub(1));

        if let Some(parent) = parent {
            self.events.emit(&SceneEvent::ChildRemoved {
                parent,
                child: entity,
            });
        }
        Ok(())
    }

    /// Check if a node exists
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        self.world.contains(entity)
    }

    /// Number of nodes
    #[must_use]
    pub fn len(&self) -> usize {
        self.world.len() as usize
    }

    /// Check if the scene has no nodes
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.world.is_empty()
    }

    /// Parent of a node
    #[must_use]
    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.world.get::<&Parent>(entity).ok().map(|p| p.entity())
    }

    /// Children of a node, in order
    #[must_use]
    pub fn children(&self, entity: Entity) -> SmallVec<[Entity; 8]> {
        self.world
            .get::<&Children>(entity)
            .map(|children| children.0.clone())
            .unwrap_or_default()
    }

    /// Child at an index of the child list
    #[must_use]
    pub fn child_at(&self, entity: Entity, index: usize) -> Option<Entity> {
        self.world
            .get::<&Children>(entity)
            .ok()
            .and_then(|children| children.0.get(index).copied())
    }

    /// Ancestors of a node, nearest first
    pub fn ancestors(&self, entity: Entity) -> impl Iterator<Item = Entity> + '_ {
        std::iter::successors(self.parent(entity), move |&e| self.parent(e))
    }

    /// First node carrying `name`
    #[must_use]
    pub fn find(&self, name: &str) -> Option<Entity> {
        self.world
            .query::<&Name>()
            .iter()
            .find(|(_, n)| n.as_str() == name)
            .map(|(entity, _)| entity)
    }

    /// Name of a node
    #[must_use]
    pub fn name(&self, entity: Entity) -> Option<String> {
        self.world.get::<&Name>(entity).ok().map(|n| n.0.clone())
    }

    /// Position and size of a node
    #[must_use]
    pub fn node(&self, entity: Entity) -> Option<Node> {
        self.world.get::<&Node>(entity).ok().map(|node| *node)
    }

    /// Local position of a node
    #[must_use]
    pub fn position(&self, entity: Entity) -> Option<Vec2> {
        self.node(entity).map(|node| node.position)
    }

    /// Size of a node
    #[must_use]
    pub fn size(&self, entity: Entity) -> Option<Vec2> {
        self.node(entity).map(|node| node.size)
    }

    /// Move a node to a new local position
    ///
    /// # Errors
    ///
    /// Returns an error if the node is missing or is a grid tile
    pub fn set_position(&mut self, entity: Entity, position: Vec2) -> Result<(), SceneError> {
        self.ensure_not_tile(entity)?;
        self.node_mut(entity)?.position = position;

        let world_position = self.world_position(entity).unwrap_or(position);
        self.events.emit(&SceneEvent::LocationUpdate {
            entity,
            position,
            world_position,
        });
        Ok(())
    }

    /// Move a node by a delta
    ///
    /// # Errors
    ///
    /// Returns an error if the node is missing or is a grid tile
    pub fn translate(&mut self, entity: Entity, delta: Vec2) -> Result<(), SceneError> {
        let position = self
            .position(entity)
            .ok_or(SceneError::NoSuchEntity(entity))?;
        self.set_position(entity, position + delta)
    }

    /// Resize a node
    ///
    /// # Errors
    ///
    /// Returns an error if the node is missing or is a grid tile
    pub fn set_size(&mut self, entity: Entity, size: Vec2) -> Result<(), SceneError> {
        self.ensure_not_tile(entity)?;
        self.node_mut(entity)?.size = size;
        self.events.emit(&SceneEvent::SizeUpdate { entity, size });
        Ok(())
    }

    /// Position of a node with all ancestor offsets applied
    #[must_use]
    pub fn world_position(&self, entity: Entity) -> Option<Vec2> {
        let own = self.position(entity)?;
        Some(
            self.ancestors(entity)
                .filter_map(|ancestor| self.position(ancestor))
                .fold(own, |acc, offset| acc + offset),
        )
    }

    /// Bounds of a node in scene coordinates
    #[must_use]
    pub fn world_rect(&self, entity: Entity) -> Option<Rect> {
        let size = self.size(entity)?;
        let position = self.world_position(entity)?;
        Some(Rect::from_position_size(position, size))
    }

    /// Texture drawn for a node
    #[must_use]
    pub fn texture(&self, entity: Entity) -> Option<&Texture> {
        self.textures.get(&entity)
    }

    /// Assign a texture, returning the previous one
    ///
    /// # Errors
    ///
    /// Returns an error if the node does not exist
    pub fn set_texture(
        &mut self,
        entity: Entity,
        texture: impl Into<Texture>,
    ) -> Result<Option<Texture>, SceneError> {
        self.ensure_exists(entity)?;
        Ok(self.textures.insert(entity, texture.into()))
    }

    /// Remove a node's texture
    pub fn clear_texture(&mut self, entity: Entity) -> Option<Texture> {
        self.textures.remove(&entity)
    }

    /// Leaf nodes under `root`, depth-first in child order
    #[must_use]
    pub fn leaves(&self, root: Entity) -> Leaves<'_> {
        Leaves::new(&self.world, root)
    }

    /// Every node under `root` with its scene position, parents first
    #[must_use]
    pub fn walk(&self, root: Entity) -> Walk<'_> {
        let origin = self
            .parent(root)
            .and_then(|parent| self.world_position(parent))
            .unwrap_or(Vec2::ZERO);
        Walk::new(&self.world, root, origin)
    }

    /// Spawn a root grid map with one tile node per cell.
    ///
    /// Tiles are children of the grid in row-major order, each positioned at
    /// `coord * tile_size` relative to the grid.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty grid or a non-positive tile size
    pub fn spawn_grid_map(
        &mut self,
        position: Vec2,
        size: GridSize,
        tile_size: Vec2,
    ) -> Result<Entity, SceneError> {
        if size.area() == 0 {
            return Err(SceneError::EmptyGrid);
        }
        if !tile_size.is_finite() || tile_size.min_element() <= 0.0 {
            return Err(SceneError::InvalidTileSize(tile_size));
        }

        let pixel_size = Vec2::new(size.cols as f32, size.rows as f32) * tile_size;
        let grid = self.world.spawn((Node::new(position, pixel_size),));

        let mut tiles = Vec::with_capacity(size.area());
        for row in 0..size.rows {
            for col in 0..size.cols {
                let coord = GridCoord::new(col, row);
                let origin = Vec2::new(col as f32, row as f32) * tile_size;
                tiles.push(self.world.spawn((
                    Node::new(origin, tile_size),
                    Parent(grid),
                    Tile {
                        grid,
                        coord,
                        collisionable: false,
                    },
                )));
            }
        }

        let children = Children(tiles.iter().copied().collect());
        self.world
            .insert(grid, (children, GridMap::new(size, tile_size, tiles)))
            .map_err(|_| SceneError::NoSuchEntity(grid))?;

        log::debug!("Spawned {size} grid map {grid:?} with {tile_size} tiles");
        Ok(grid)
    }

    /// Tile node at a grid coordinate
    ///
    /// # Errors
    ///
    /// Returns an error if `grid` is not a grid map or `coord` is outside it
    pub fn tile(&self, grid: Entity, coord: GridCoord) -> Result<Entity, SceneError> {
        let map = self.grid_map(grid)?;
        map.tile(coord).ok_or(SceneError::TileOutOfBounds {
            coord,
            size: map.size(),
        })
    }

    /// Dimensions of a grid map
    ///
    /// # Errors
    ///
    /// Returns an error if `grid` is not a grid map
    pub fn grid_size(&self, grid: Entity) -> Result<GridSize, SceneError> {
        Ok(self.grid_map(grid)?.size())
    }

    /// Tile size of a grid map
    ///
    /// # Errors
    ///
    /// Returns an error if `grid` is not a grid map
    pub fn tile_size(&self, grid: Entity) -> Result<Vec2, SceneError> {
        Ok(self.grid_map(grid)?.tile_size())
    }

    /// Every tile of a grid map, row-major
    ///
    /// # Errors
    ///
    /// Returns an error if `grid` is not a grid map
    pub fn tiles(&self, grid: Entity) -> Result<Tiles<'_>, SceneError> {
        Ok(Tiles::new(self.grid_map(grid)?))
    }

    /// Tile component of a tile node
    #[must_use]
    pub fn tile_info(&self, tile: Entity) -> Option<Tile> {
        self.world.get::<&Tile>(tile).ok().map(|t| *t)
    }

    /// Set the collision flag of a tile
    ///
    /// # Errors
    ///
    /// Returns an error if `grid` is not a grid map or `coord` is outside it
    pub fn set_collisionable(
        &mut self,
        grid: Entity,
        coord: GridCoord,
        collisionable: bool,
    ) -> Result<(), SceneError> {
        let tile = self.tile(grid, coord)?;
        let mut info = self
            .world
            .get::<&mut Tile>(tile)
            .map_err(|_| SceneError::NoSuchEntity(tile))?;
        info.collisionable = collisionable;
        Ok(())
    }

    /// Collision flag of a tile
    ///
    /// # Errors
    ///
    /// Returns an error if `grid` is not a grid map or `coord` is outside it
    pub fn is_collisionable(&self, grid: Entity, coord: GridCoord) -> Result<bool, SceneError> {
        let tile = self.tile(grid, coord)?;
        Ok(self.tile_info(tile).is_some_and(|t| t.collisionable))
    }

    /// Grid coordinate under a point in scene coordinates
    ///
    /// # Errors
    ///
    /// Returns an error if `grid` is not a grid map
    pub fn coord_at(&self, grid: Entity, point: Vec2) -> Result<Option<GridCoord>, SceneError> {
        let origin = self
            .world_position(grid)
            .ok_or(SceneError::NoSuchEntity(grid))?;
        Ok(self.grid_map(grid)?.coord_at(point - origin))
    }

    fn grid_map(&self, grid: Entity) -> Result<hecs::Ref<'_, GridMap>, SceneError> {
        self.ensure_exists(grid)?;
        self.world
            .get::<&GridMap>(grid)
            .map_err(|_| SceneError::NotAGrid(grid))
    }

    fn node_mut(&mut self, entity: Entity) -> Result<hecs::RefMut<'_, Node>, SceneError> {
        self.world
            .get::<&mut Node>(entity)
            .map_err(|_| SceneError::NoSuchEntity(entity))
    }

    fn ensure_exists(&self, entity: Entity) -> Result<(), SceneError> {
        if self.world.contains(entity) {
            Ok(())
        } else {
            Err(SceneError::NoSuchEntity(entity))
        }
    }

    fn ensure_not_tile(&self, entity: Entity) -> Result<(), SceneError> {
        if self.world.get::<&Tile>(entity).is_ok() {
            Err(SceneError::FixedTile(entity))
        } else {
            Ok(())
        }
    }

    fn link(&mut self, parent: Entity, child: Entity) -> Result<(), SceneError> {
        if let Ok(mut children) = self.world.get::<&mut Children>(parent) {
            children.add(child);
        } else {
            let mut children = Children::default();
            children.add(child);
            self.world
                .insert_one(parent, children)
                .map_err(|_| SceneError::NoSuchEntity(parent))?;
        }
        self.world
            .insert_one(child, Parent(parent))
            .map_err(|_| SceneError::NoSuchEntity(child))
    }

    /// Break the parent/child link; returns false if either side was missing
    fn unlink(&mut self, parent: Entity, child: Entity) -> bool {
        let listed = self
            .world
            .get::<&mut Children>(parent)
            .is_ok_and(|mut children| children.remove(child));
        if !listed {
            log::warn!("Unlink: {child:?} was not in the child list of {parent:?}");
        }

        let linked = match self.world.remove_one::<Parent>(child) {
            Ok(Parent(recorded)) if recorded == parent => true,
            Ok(Parent(recorded)) => {
                log::warn!("Unlink: {child:?} recorded parent {recorded:?}, expected {parent:?}");
                false
            }
            Err(err) => {
                log::warn!("Unlink: {child:?} had no parent link: {err}");
                false
            }
        };

        listed && linked
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for Scene {
    type Event = SceneEvent;

    fn events(&self) -> &EventEmitter<SceneEvent> {
        &self.events
    }
}

impl std::fmt::Debug for Scene {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scene")
            .field("nodes", &self.world.len())
            .field("textures", &self.textures.len())
            .finish()
    }
}
