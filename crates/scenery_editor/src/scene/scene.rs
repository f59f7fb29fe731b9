//! Scene entity storage and hierarchy
//!
//! Entities live in a slotmap; stable [`EntityId`]s map to storage keys
//! through a side table so external references survive storage reshuffles.
//! The parent hierarchy is acyclic by construction (`set_parent` rejects
//! cycles), and every parent-chain walk still carries a visited guard so a
//! corrupted hierarchy degrades into a logged early-out instead of a hang.

use crate::foundation::math::Mat4;
use crate::scene::components::{MeshComponent, StaticMeshComponent, TransformComponent};
use crate::scene::entity::{EntityId, SceneId};
use log::warn;
use slotmap::{new_key_type, SlotMap};
use std::collections::{HashMap, HashSet};

new_key_type! {
    struct EntityKey;
}

#[derive(Debug)]
struct EntityRecord {
    id: EntityId,
    name: String,
    transform: TransformComponent,
    parent: Option<EntityId>,
    children: Vec<EntityId>,
    mesh: Option<MeshComponent>,
    static_mesh: Option<StaticMeshComponent>,
}

/// A scene: entity storage, hierarchy, and components
#[derive(Debug)]
pub struct Scene {
    id: SceneId,
    entities: SlotMap<EntityKey, EntityRecord>,
    index: HashMap<EntityId, EntityKey>,
}

impl Scene {
    /// Create an empty scene
    pub fn new(id: SceneId) -> Self {
        Self {
            id,
            entities: SlotMap::with_key(),
            index: HashMap::new(),
        }
    }

    /// This scene's identifier (the selection context key)
    pub fn id(&self) -> SceneId {
        self.id
    }

    /// Create a root entity with an identity transform
    pub fn create_entity(&mut self, name: impl Into<String>) -> EntityId {
        let id = EntityId::generate();
        let key = self.entities.insert(EntityRecord {
            id,
            name: name.into(),
            transform: TransformComponent::identity(),
            parent: None,
            children: Vec::new(),
            mesh: None,
            static_mesh: None,
        });
        self.index.insert(id, key);
        id
    }

    /// Remove an entity, detaching it from its parent and its children
    ///
    /// Children are reparented to the root, not destroyed. Returns `false`
    /// if the entity does not exist.
    pub fn destroy_entity(&mut self, entity: EntityId) -> bool {
        let Some(key) = self.index.remove(&entity) else {
            return false;
        };
        let Some(record) = self.entities.remove(key) else {
            return false;
        };

        if let Some(parent) = record.parent {
            if let Some(parent_record) = self.record_mut(parent) {
                parent_record.children.retain(|child| *child != entity);
            }
        }
        for child in record.children {
            if let Some(child_record) = self.record_mut(child) {
                child_record.parent = None;
            }
        }
        true
    }

    /// Whether the entity exists in this scene
    pub fn contains(&self, entity: EntityId) -> bool {
        self.index.contains_key(&entity)
    }

    /// Number of entities in the scene
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// All entity ids, in storage order
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.entities.values().map(|record| record.id)
    }

    /// The entity's display name
    pub fn name(&self, entity: EntityId) -> Option<&str> {
        self.record(entity).map(|record| record.name.as_str())
    }

    /// The entity's local transform
    pub fn transform(&self, entity: EntityId) -> Option<&TransformComponent> {
        self.record(entity).map(|record| &record.transform)
    }

    /// Mutable access to the entity's local transform
    pub fn transform_mut(&mut self, entity: EntityId) -> Option<&mut TransformComponent> {
        self.record_mut(entity).map(|record| &mut record.transform)
    }

    /// Attach a mesh component
    pub fn set_mesh(&mut self, entity: EntityId, mesh: MeshComponent) {
        if let Some(record) = self.record_mut(entity) {
            record.mesh = Some(mesh);
        }
    }

    /// The entity's mesh component, if any
    pub fn mesh(&self, entity: EntityId) -> Option<&MeshComponent> {
        self.record(entity).and_then(|record| record.mesh.as_ref())
    }

    /// Attach a static mesh component
    pub fn set_static_mesh(&mut self, entity: EntityId, static_mesh: StaticMeshComponent) {
        if let Some(record) = self.record_mut(entity) {
            record.static_mesh = Some(static_mesh);
        }
    }

    /// The entity's static mesh component, if any
    pub fn static_mesh(&self, entity: EntityId) -> Option<&StaticMeshComponent> {
        self.record(entity)
            .and_then(|record| record.static_mesh.as_ref())
    }

    /// The entity's parent, if it has one
    pub fn parent(&self, entity: EntityId) -> Option<EntityId> {
        self.record(entity).and_then(|record| record.parent)
    }

    /// The entity's direct children
    pub fn children(&self, entity: EntityId) -> &[EntityId] {
        self.record(entity)
            .map_or(&[], |record| record.children.as_slice())
    }

    /// Reparent an entity; `None` detaches it to the root
    ///
    /// Rejects (returning `false`) unknown entities, self-parenting, and any
    /// parent that is a descendant of the child, keeping the hierarchy
    /// acyclic.
    pub fn set_parent(&mut self, child: EntityId, parent: Option<EntityId>) -> bool {
        if !self.contains(child) {
            return false;
        }
        if let Some(parent) = parent {
            if !self.contains(parent) {
                return false;
            }
            if parent == child || self.is_ancestor(child, parent) {
                warn!("rejecting reparent of {child} under {parent}: would form a cycle");
                return false;
            }
        }

        if let Some(old_parent) = self.parent(child) {
            if let Some(record) = self.record_mut(old_parent) {
                record.children.retain(|c| *c != child);
            }
        }
        if let Some(parent) = parent {
            if let Some(record) = self.record_mut(parent) {
                record.children.push(child);
            }
        }
        if let Some(record) = self.record_mut(child) {
            record.parent = parent;
        }
        true
    }

    /// The entity's local TRS matrix (identity for unknown entities)
    pub fn local_matrix(&self, entity: EntityId) -> Mat4 {
        self.transform(entity)
            .map_or_else(Mat4::identity, TransformComponent::to_matrix)
    }

    /// The entity's world matrix, composed along the parent chain
    pub fn world_matrix(&self, entity: EntityId) -> Mat4 {
        let mut matrix = self.local_matrix(entity);
        let mut visited = HashSet::from([entity]);
        let mut current = self.parent(entity);

        while let Some(ancestor) = current {
            if !visited.insert(ancestor) {
                warn!("parent chain of {entity} revisits {ancestor}; truncating walk");
                break;
            }
            matrix = self.local_matrix(ancestor) * matrix;
            current = self.parent(ancestor);
        }
        matrix
    }

    /// The topmost ancestor of an entity (itself if unparented)
    pub fn root_ancestor(&self, entity: EntityId) -> EntityId {
        let mut visited = HashSet::from([entity]);
        let mut current = entity;

        while let Some(ancestor) = self.parent(current) {
            if !visited.insert(ancestor) {
                warn!("parent chain of {entity} revisits {ancestor}; truncating walk");
                break;
            }
            current = ancestor;
        }
        current
    }

    /// Whether `ancestor` appears on `entity`'s parent chain
    pub fn is_ancestor(&self, ancestor: EntityId, entity: EntityId) -> bool {
        let mut visited = HashSet::from([entity]);
        let mut current = self.parent(entity);

        while let Some(candidate) = current {
            if candidate == ancestor {
                return true;
            }
            if !visited.insert(candidate) {
                warn!("parent chain of {entity} revisits {candidate}; truncating walk");
                break;
            }
            current = self.parent(candidate);
        }
        false
    }

    fn record(&self, entity: EntityId) -> Option<&EntityRecord> {
        self.index.get(&entity).and_then(|key| self.entities.get(*key))
    }

    fn record_mut(&mut self, entity: EntityId) -> Option<&mut EntityRecord> {
        self.index
            .get(&entity)
            .and_then(|key| self.entities.get_mut(*key))
    }
}
