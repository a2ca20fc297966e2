/*!
# Prism Render Scene

Renderable and light components attached to the entities of a simulation
world, and the per-frame queries a renderer asks about them.

The scene answers three questions every frame:

- which model instances are visible in a frustum, and which of their
  submeshes to draw at the current level of detail
- which point lights affect which model instances
- which decals, lights and cameras are relevant to a view

## Architecture

- **RenderScene**: component storage, component directory and queries
- **SpatialIndex**: bounding spheres and layer masks, culled per frustum
  (`OctreeSpatialIndex`, `LinearSpatialIndex`)
- **AssetManager**: reference-counted models and materials with readiness
  events (`ResourceManager`)
- **Universe**: entity transforms and moved-entity notifications (`World`)

The caller creates the universe, asset manager and spatial index and hands
them to `RenderScene::new`.
*/

// Internal modules
mod error;
pub mod log;
pub mod camera;
pub mod culling;
pub mod resource;
pub mod scene;
pub mod universe;

// Main prism namespace module
pub mod prism {
    // Error types
    pub use crate::error::{Error, Result};

    // Logging sub-module (types and logger installation, NOT macros)
    pub mod log {
        pub use crate::log::{set_logger, reset_logger, Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    pub mod camera {
        pub use crate::camera::*;
    }

    pub mod culling {
        pub use crate::culling::*;
    }

    pub mod resource {
        pub use crate::resource::*;
    }

    pub mod scene {
        pub use crate::scene::*;
    }

    pub mod universe {
        pub use crate::universe::*;
    }
}

// Re-export math library at crate root
pub use glam;
