pub mod path;
pub mod polygon;
pub mod tag;

pub use path::Path;
pub use polygon::{compare_points, to_multi_polygon, Polygon};
pub use tag::{LayerTag, TaggedPolygon};
