pub mod backend;
pub mod brep;
pub mod builder;
pub mod cdt;
pub mod params;

pub use backend::{Mesh, MeshBackend};
pub use brep::{BoundaryRepresentation, BrepEdge, BrepPoint, BrepSurface, SignedEdge};
pub use builder::{CrossSectionMesh, MeshFromPolygons, PreparedGeometry, RegionInfo};
pub use cdt::CdtBackend;
pub use params::{Background, LayerResolution, MeshParameters, MeshQuality};
