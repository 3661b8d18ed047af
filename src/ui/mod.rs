pub mod app;
pub mod dashboard;
pub mod viewport;

pub use app::App;
