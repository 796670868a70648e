pub mod brep;
pub mod euler;
pub mod primitives;
