//! Database access

mod catalog;
mod feedback;
mod pool;

pub use catalog::PgCatalog;
pub use feedback::{FeedbackFilter, PgFeedbackStore};
pub use pool::{create_lazy_pool, create_pool, run_migrations};
