pub mod kernels;
pub mod surface;

pub use surface::RasterSurface;
