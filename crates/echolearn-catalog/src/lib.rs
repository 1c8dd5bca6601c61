//! Learning content catalog for EchoLearn
//!
//! The data provider the interaction layer reads from: categories, learning
//! items, and the seeded in-memory store. Read-mostly; the only write path
//! is `add_item`.

use async_trait::async_trait;
use thiserror::Error;

pub mod seed;
pub mod store;
pub mod types;

pub use store::MemCatalog;
pub use types::{Category, LearningItem, NewLearningItem};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CatalogError {
    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("unknown item: {0}")]
    UnknownItem(String),
}

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Data provider seam. The announcement core treats this as an external
/// collaborator; tests substitute their own implementations.
#[async_trait]
pub trait Catalog: Send + Sync {
    async fn categories(&self) -> CatalogResult<Vec<Category>>;

    async fn category(&self, id: &str) -> CatalogResult<Category>;

    /// Items belonging to a category, in seed order.
    async fn items_in(&self, category_id: &str) -> CatalogResult<Vec<LearningItem>>;

    async fn item(&self, id: &str) -> CatalogResult<LearningItem>;

    async fn add_item(&self, item: NewLearningItem) -> CatalogResult<LearningItem>;
}
