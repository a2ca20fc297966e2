//! Camera module: camera component data and view frusta.

mod camera;
mod frustum;

pub use camera::{Camera, MAX_SLOT_LENGTH};
pub use frustum::{
    Frustum, FrustumTest,
    PLANE_LEFT, PLANE_RIGHT, PLANE_BOTTOM, PLANE_TOP, PLANE_NEAR, PLANE_FAR,
};
