//! Selection state across scene contexts
//!
//! [`SelectionManager`] tracks which entities are selected per scene, in
//! selection order. Mutations enqueue [`SelectionEvent`]s instead of calling
//! observers inline; the editor layer drains the queue with
//! [`SelectionManager::take_events`] at a point where reacting to selection
//! changes is safe. Selecting an already-selected entity or deselecting an
//! absent one is a no-op and produces no event.

use crate::scene::{EntityId, Scene, SceneId};
use log::{debug, warn};
use std::collections::{HashMap, HashSet};

/// One selection state change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionEvent {
    /// The scene whose selection changed
    pub context: SceneId,
    /// The entity whose state changed
    pub entity: EntityId,
    /// `true` for selected, `false` for deselected
    pub selected: bool,
}

/// Ordered multi-context selection state
#[derive(Debug, Default)]
pub struct SelectionManager {
    contexts: HashMap<SceneId, Vec<EntityId>>,
    events: Vec<SelectionEvent>,
}

impl SelectionManager {
    /// Create an empty selection manager
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity to a context's selection
    ///
    /// Selection order is preserved; re-selecting is a no-op.
    pub fn select(&mut self, context: SceneId, entity: EntityId) {
        let selected = self.contexts.entry(context).or_default();
        if selected.contains(&entity) {
            return;
        }
        selected.push(entity);
        debug!("select {entity} in {context}");
        self.events.push(SelectionEvent {
            context,
            entity,
            selected: true,
        });
    }

    /// Remove an entity from a context's selection
    pub fn deselect(&mut self, context: SceneId, entity: EntityId) {
        let Some(selected) = self.contexts.get_mut(&context) else {
            return;
        };
        let Some(position) = selected.iter().position(|id| *id == entity) else {
            return;
        };
        selected.remove(position);
        debug!("deselect {entity} in {context}");
        self.events.push(SelectionEvent {
            context,
            entity,
            selected: false,
        });
    }

    /// Remove an entity from whichever context has it selected
    ///
    /// Stops at the first containing context; an entity belongs to at most
    /// one context's selection under normal use.
    pub fn deselect_anywhere(&mut self, entity: EntityId) {
        let context = self
            .contexts
            .iter()
            .find(|(_, selected)| selected.contains(&entity))
            .map(|(context, _)| *context);
        if let Some(context) = context {
            self.deselect(context, entity);
        }
    }

    /// Clear one context's selection
    pub fn deselect_all_in(&mut self, context: SceneId) {
        let Some(selected) = self.contexts.get_mut(&context) else {
            return;
        };
        for entity in selected.drain(..) {
            self.events.push(SelectionEvent {
                context,
                entity,
                selected: false,
            });
        }
    }

    /// Clear every context's selection
    pub fn deselect_all(&mut self) {
        let contexts: Vec<SceneId> = self.contexts.keys().copied().collect();
        for context in contexts {
            self.deselect_all_in(context);
        }
    }

    /// Whether the entity is selected in any context
    pub fn is_selected(&self, entity: EntityId) -> bool {
        self.contexts
            .values()
            .any(|selected| selected.contains(&entity))
    }

    /// Whether the entity is selected in a specific context
    pub fn is_selected_in(&self, context: SceneId, entity: EntityId) -> bool {
        self.contexts
            .get(&context)
            .is_some_and(|selected| selected.contains(&entity))
    }

    /// Whether the entity or any of its ancestors is selected in the
    /// entity's scene
    pub fn is_entity_or_ancestor_selected(&self, scene: &Scene, entity: EntityId) -> bool {
        let context = scene.id();
        let mut visited = HashSet::new();
        let mut current = Some(entity);

        while let Some(candidate) = current {
            if !visited.insert(candidate) {
                warn!("parent chain of {entity} revisits {candidate}; truncating walk");
                return false;
            }
            if self.is_selected_in(context, candidate) {
                return true;
            }
            current = scene.parent(candidate);
        }
        false
    }

    /// The context's selection in selection order
    pub fn selections(&self, context: SceneId) -> &[EntityId] {
        self.contexts
            .get(&context)
            .map_or(&[], |selected| selected.as_slice())
    }

    /// Number of selected entities in a context
    pub fn selection_count(&self, context: SceneId) -> usize {
        self.selections(context).len()
    }

    /// The `index`-th selected entity in a context
    ///
    /// Out-of-range indices are a usage contract violation.
    pub fn selection(&self, context: SceneId, index: usize) -> Option<EntityId> {
        let selected = self.selections(context);
        debug_assert!(
            index < selected.len(),
            "selection index {index} out of range ({} selected)",
            selected.len()
        );
        selected.get(index).copied()
    }

    /// Drain the pending change events, oldest first
    pub fn take_events(&mut self) -> Vec<SelectionEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (SceneId, EntityId, EntityId) {
        (SceneId::generate(), EntityId::generate(), EntityId::generate())
    }

    #[test]
    fn test_select_preserves_order_and_dedupes() {
        let (ctx, a, b) = ids();
        let mut manager = SelectionManager::new();

        manager.select(ctx, a);
        manager.select(ctx, b);
        manager.select(ctx, a);

        assert_eq!(manager.selections(ctx), &[a, b]);
        assert_eq!(manager.selection_count(ctx), 2);
        assert_eq!(manager.selection(ctx, 1), Some(b));
        assert_eq!(manager.take_events().len(), 2, "re-select emits nothing");
    }

    #[test]
    fn test_deselect_and_events() {
        let (ctx, a, b) = ids();
        let mut manager = SelectionManager::new();
        manager.select(ctx, a);
        manager.select(ctx, b);
        manager.take_events();

        manager.deselect(ctx, a);
        manager.deselect(ctx, a);

        assert_eq!(manager.selections(ctx), &[b]);
        let events = manager.take_events();
        assert_eq!(
            events,
            vec![SelectionEvent {
                context: ctx,
                entity: a,
                selected: false
            }]
        );
        assert!(manager.take_events().is_empty(), "queue drained");
    }

    #[test]
    fn test_deselect_anywhere_finds_owning_context() {
        let (ctx_a, a, b) = ids();
        let ctx_b = SceneId::generate();
        let mut manager = SelectionManager::new();

        manager.select(ctx_a, a);
        manager.select(ctx_b, b);

        manager.deselect_anywhere(a);
        assert!(!manager.is_selected(a));
        assert!(manager.is_selected_in(ctx_b, b));

        manager.deselect_anywhere(a);
        assert!(!manager.is_selected(a), "absent deselect is a no-op");
    }

    #[test]
    fn test_deselect_all() {
        let (ctx_a, a, b) = ids();
        let ctx_b = SceneId::generate();
        let mut manager = SelectionManager::new();
        manager.select(ctx_a, a);
        manager.select(ctx_b, b);

        manager.deselect_all();
        assert_eq!(manager.selection_count(ctx_a), 0);
        assert_eq!(manager.selection_count(ctx_b), 0);
    }

    #[test]
    fn test_ancestor_selection_walks_hierarchy() {
        let mut scene = Scene::new(SceneId::generate());
        let root = scene.create_entity("root");
        let mid = scene.create_entity("mid");
        let leaf = scene.create_entity("leaf");
        scene.set_parent(mid, Some(root));
        scene.set_parent(leaf, Some(mid));

        let mut manager = SelectionManager::new();
        manager.select(scene.id(), root);

        assert!(manager.is_entity_or_ancestor_selected(&scene, leaf));
        assert!(manager.is_entity_or_ancestor_selected(&scene, root));

        manager.deselect(scene.id(), root);
        assert!(!manager.is_entity_or_ancestor_selected(&scene, leaf));
    }
}
