//! In-memory catalog store

use crate::seed;
use crate::types::{Category, LearningItem, NewLearningItem};
use crate::{Catalog, CatalogError, CatalogResult};
use async_trait::async_trait;
use parking_lot::RwLock;

/// Seeded in-memory store. Item ids are slugs derived from the item name
/// within its category, so they are stable across runs.
pub struct MemCatalog {
    categories: Vec<Category>,
    items: RwLock<Vec<LearningItem>>,
}

impl Default for MemCatalog {
    fn default() -> Self {
        Self::seeded()
    }
}

impl MemCatalog {
    pub fn seeded() -> Self {
        let store = Self::empty();
        {
            let mut items = store.items.write();
            for item in seed::items() {
                items.push(materialize(item));
            }
        }
        store
    }

    pub fn empty() -> Self {
        Self {
            categories: seed::categories(),
            items: RwLock::new(Vec::new()),
        }
    }

    fn category_exists(&self, id: &str) -> bool {
        self.categories.iter().any(|c| c.id == id)
    }
}

fn materialize(item: NewLearningItem) -> LearningItem {
    let id = format!("{}-{}", item.category, slug(&item.name));
    LearningItem {
        id,
        name: item.name,
        category: item.category,
        emoji: item.emoji,
        fact: item.fact,
    }
}

fn slug(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}

#[async_trait]
impl Catalog for MemCatalog {
    async fn categories(&self) -> CatalogResult<Vec<Category>> {
        Ok(self.categories.clone())
    }

    async fn category(&self, id: &str) -> CatalogResult<Category> {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownCategory(id.to_string()))
    }

    async fn items_in(&self, category_id: &str) -> CatalogResult<Vec<LearningItem>> {
        if !self.category_exists(category_id) {
            return Err(CatalogError::UnknownCategory(category_id.to_string()));
        }
        Ok(self
            .items
            .read()
            .iter()
            .filter(|item| item.category == category_id)
            .cloned()
            .collect())
    }

    async fn item(&self, id: &str) -> CatalogResult<LearningItem> {
        self.items
            .read()
            .iter()
            .find(|item| item.id == id)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownItem(id.to_string()))
    }

    async fn add_item(&self, item: NewLearningItem) -> CatalogResult<LearningItem> {
        if !self.category_exists(&item.category) {
            return Err(CatalogError::UnknownCategory(item.category));
        }
        let item = materialize(item);
        self.items.write().push(item.clone());
        Ok(item)
    }
}
