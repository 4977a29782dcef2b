//! Node builder (§4.3): turns collected objects and scene data into FBX
//! node fragments. Split by concern the same way the format itself
//! separates `Objects` into models, geometry, materials, textures, and
//! connections.

pub mod connections;
pub mod geometry;
pub mod header;
pub mod materials;
pub mod models;
pub mod textures;
