pub mod errors;
pub mod face;
pub mod format;
pub mod numbers;
pub mod writer;

pub use errors::FormatError;
pub use face::{FaceRecord, SurfaceAttributes, TextureAttributes, TextureAxes, NO_TEXTURE_NAME};
pub use format::{FaceDialect, MapFormat};
pub use writer::BrushWriter;
