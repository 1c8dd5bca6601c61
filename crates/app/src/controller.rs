//! Interaction controller
//!
//! Translates navigation events into announcements, catalog reads, and
//! feedback. Owns the session state machine; the frontend only reports
//! what the user did.

use crate::accessibility::{FeedbackSink, HapticPattern};
use crate::announcer::Announcer;
use crate::session::{Session, View};
use echolearn_catalog::{Catalog, Category, LearningItem};
use echolearn_foundation::AppError;
use std::sync::Arc;
use tracing::{debug, info};

const WELCOME_ANNOUNCEMENT: &str = "Welcome to Learn and Listen! An accessible educational app. \
    Navigate through categories to learn about fruits, vegetables, animals, and letters. \
    Use Tab to navigate and Enter to select.";

/// Navigation/selection events from the frontend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavEvent {
    SelectCategory(String),
    SelectItem(String),
    /// Escape gesture: stop speech and step back one level.
    Cancel,
}

pub struct InteractionController {
    session: Session,
    catalog: Arc<dyn Catalog>,
    announcer: Announcer,
    feedback: Arc<dyn FeedbackSink>,
    categories: Vec<Category>,
    items: Vec<LearningItem>,
}

impl InteractionController {
    /// Load the category list and greet the assistive-technology channel.
    pub async fn new(
        catalog: Arc<dyn Catalog>,
        announcer: Announcer,
        feedback: Arc<dyn FeedbackSink>,
    ) -> Result<Self, AppError> {
        let categories = catalog.categories().await?;
        info!(count = categories.len(), "catalog loaded");
        feedback.announce(WELCOME_ANNOUNCEMENT);
        Ok(Self {
            session: Session::new(),
            catalog,
            announcer,
            feedback,
            categories,
            items: Vec::new(),
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Items of the currently selected category; empty at top level.
    pub fn items(&self) -> &[LearningItem] {
        &self.items
    }

    pub async fn handle(&mut self, event: NavEvent) -> Result<(), AppError> {
        debug!(?event, "navigation event");
        match event {
            NavEvent::SelectCategory(id) => self.select_category(&id).await,
            NavEvent::SelectItem(id) => self.select_item(&id).await,
            NavEvent::Cancel => self.cancel().await,
        }
    }

    async fn select_category(&mut self, id: &str) -> Result<(), AppError> {
        let category = match self.catalog.category(id).await {
            Ok(category) => category,
            Err(e) => {
                self.feedback.vibrate(HapticPattern::Error);
                return Err(e.into());
            }
        };

        self.feedback.vibrate(HapticPattern::Select);
        self.session.select_category(category.clone())?;
        self.items = self.catalog.items_in(id).await?;

        let description = format!("Now viewing {}. {}", category.name, category.description);
        self.feedback.announce(&description);
        self.announcer.announce(&description).await;
        Ok(())
    }

    async fn select_item(&mut self, id: &str) -> Result<(), AppError> {
        let Some(item) = self.items.iter().find(|item| item.id == id).cloned() else {
            self.feedback.vibrate(HapticPattern::Error);
            return Err(AppError::InvalidInteraction(format!(
                "item {} is not in the current view",
                id
            )));
        };

        self.feedback.vibrate(HapticPattern::Select);
        self.session.show_item(item.clone())?;
        self.announcer.announce_item(&item.name, &item.fact).await;
        Ok(())
    }

    /// Escape: always silences speech, then closes the learning display if
    /// one is open, else steps Items → Categories, else does nothing.
    async fn cancel(&mut self) -> Result<(), AppError> {
        self.announcer.stop_speech().await;

        if self.session.close_item().is_some() {
            self.feedback
                .announce("Closed learning display. Continue exploring items.");
            return Ok(());
        }

        if self.session.view() == View::Items {
            self.session.go_back()?;
            self.items.clear();
            self.feedback.vibrate(HapticPattern::Navigate);
            self.feedback
                .announce("Returned to categories. Choose a learning category to continue.");
        }
        Ok(())
    }
}
