pub mod error;
pub mod geometry;
pub mod layout;
pub mod math;
pub mod mesh;
pub mod stack;
pub mod topology;
pub mod xsection;

pub use error::{Result, XsmeshError};
pub use mesh::{CdtBackend, CrossSectionMesh, MeshBackend, MeshFromPolygons, MeshParameters};
pub use stack::{LayerStack, LayerStackEntry};
pub use xsection::{planar_mesh, planar_meshes, swept_mesh, UzCrossSection, XyCrossSection};
