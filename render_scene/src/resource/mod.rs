//! Resource module
//!
//! Models, materials and the asset manager interface the render scene
//! loads them through. `ResourceManager` is the in-crate implementation.

mod asset_manager;
mod material;
mod mesh;
mod model;
mod resource_manager;

pub use asset_manager::{AssetEvent, AssetManager};
pub use material::{Material, MaterialDesc};
pub use mesh::{Mesh, MeshDesc};
pub use model::{
    Bone, Lod, LodMeshIndices, Model, ModelData, ModelDesc, ModelKey, Pose,
};
pub use resource_manager::ResourceManager;
