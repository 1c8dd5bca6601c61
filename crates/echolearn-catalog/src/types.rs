use serde::{Deserialize, Serialize};

/// A top-level learning category (fruits, animals, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub emoji: String,
    pub description: String,
}

/// One learnable thing: its name to spell out, an emoji, and a fun fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LearningItem {
    pub id: String,
    pub name: String,
    pub category: String,
    pub emoji: String,
    pub fact: String,
}

/// Insert payload; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLearningItem {
    pub name: String,
    pub category: String,
    pub emoji: String,
    pub fact: String,
}
