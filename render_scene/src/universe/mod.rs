//! Universe module: entities, component handles and transforms.
//!
//! The render scene reads transforms through the `Universe` trait; the
//! simulation owns them.

mod entity;
mod world;

pub use entity::{ComponentHandle, Entity, Transform};
pub use world::{Universe, World};
