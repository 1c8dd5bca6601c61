//! View state machine
//!
//! `Categories ⇄ Items`, with `Items` requiring a selected category and an
//! optional open learning display on top. Transitions are validated the
//! same way the app lifecycle is: an impossible move is a bug, not a state.

use echolearn_catalog::{Category, LearningItem};
use echolearn_foundation::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Categories,
    Items,
}

pub struct Session {
    view: View,
    selected_category: Option<Category>,
    open_item: Option<LearningItem>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            view: View::Categories,
            selected_category: None,
            open_item: None,
        }
    }

    pub fn view(&self) -> View {
        self.view
    }

    pub fn selected_category(&self) -> Option<&Category> {
        self.selected_category.as_ref()
    }

    pub fn open_item(&self) -> Option<&LearningItem> {
        self.open_item.as_ref()
    }

    /// Categories → Items.
    pub fn select_category(&mut self, category: Category) -> Result<(), AppError> {
        if self.view != View::Categories {
            return Err(AppError::InvalidInteraction(format!(
                "cannot select a category from the {:?} view",
                self.view
            )));
        }
        tracing::debug!(category = %category.id, "entering items view");
        self.selected_category = Some(category);
        self.view = View::Items;
        Ok(())
    }

    /// Open the learning display for an item; requires the items view.
    pub fn show_item(&mut self, item: LearningItem) -> Result<(), AppError> {
        if self.view != View::Items {
            return Err(AppError::InvalidInteraction(
                "cannot open an item outside the items view".to_string(),
            ));
        }
        self.open_item = Some(item);
        Ok(())
    }

    /// Close the learning display, if one is open.
    pub fn close_item(&mut self) -> Option<LearningItem> {
        self.open_item.take()
    }

    /// Items → Categories. Clears the category selection.
    pub fn go_back(&mut self) -> Result<(), AppError> {
        if self.view != View::Items {
            return Err(AppError::InvalidInteraction(
                "already at the top-level view".to_string(),
            ));
        }
        self.view = View::Categories;
        self.selected_category = None;
        self.open_item = None;
        Ok(())
    }
}
