mod render;
mod summary;
pub mod views;

pub use render::paginate;
pub use summary::SemaphoreReport;
