//! Scene graph: entities, hierarchy, and components

pub mod aabb;
pub mod components;
pub mod entity;
#[allow(clippy::module_inception)]
pub mod scene;

pub use aabb::Aabb;
pub use components::{MeshComponent, StaticMeshComponent, TransformComponent};
pub use entity::{EntityId, SceneId};
pub use scene::Scene;
