pub mod chat_surface;
pub mod surface_cache;

pub use chat_surface::ChatSurface;
pub use surface_cache::SurfaceCache;
