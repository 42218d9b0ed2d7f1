pub mod global_404;
pub mod health;

pub use global_404::global_404_handler;
pub use health::health_handler;
