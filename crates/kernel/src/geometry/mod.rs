pub mod bbox;
pub mod plane;
pub mod point;
pub mod ray;
pub mod vector;
