//! # Scenery Editor Core
//!
//! The ownership, selection, and viewport manipulation engine of a 3D
//! scenery-authoring editor.
//!
//! ## Features
//!
//! - **Intrusive Ownership**: `Ref`/`WeakRef` handles with an embedded
//!   atomic count and a process-wide live-reference registry
//! - **Scene Graph**: slotmap-backed entities with parent hierarchy and
//!   transform components
//! - **Selection**: ordered per-scene selection contexts with deferred
//!   change events
//! - **Picking**: mouse-ray construction and AABB/triangle intersection
//!   against scene mesh geometry
//! - **Gizmo Engine**: single- and multi-entity transform application with
//!   snapping and undo bracketing
//!
//! ## Quick Start
//!
//! ```rust
//! use scenery_editor::prelude::*;
//!
//! let mut scene = Scene::new(SceneId::generate());
//! let tower = scene.create_entity("tower");
//!
//! let mut selection = SelectionManager::new();
//! selection.select(scene.id(), tower);
//! assert!(selection.is_selected(tower));
//!
//! for event in selection.take_events() {
//!     println!("{} selected={}", event.entity, event.selected);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod core;

pub mod assets;
pub mod config;
pub mod foundation;
pub mod scene;
pub mod selection;
pub mod viewport;

/// Common imports for editor-core users
pub mod prelude {
    pub use crate::{
        assets::{Asset, AssetHandle, AssetType, Mesh, MeshSource, Prefab, StaticMesh},
        config::{Config, ConfigError, EditorConfig},
        core::{AnyRef, Ref, RefCounted, RefCounter, WeakRef},
        foundation::math::{Mat4, Quat, Transform, Vec2, Vec3},
        scene::{EntityId, Scene, SceneId, TransformComponent},
        selection::{SelectionEvent, SelectionManager},
        viewport::{
            EditorCamera, GizmoEngine, GizmoMode, PickModifiers, Ray, SnapSettings,
            TransformTarget,
        },
    };
}
