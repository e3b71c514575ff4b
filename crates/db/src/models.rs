use std::sync::Arc;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// One stored document: its key within a collection and its JSON body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub key: String,
    pub data: serde_json::Value,
}

/// The full contents of a collection at one point in time, ordered by key.
pub type DocumentSet = Arc<Vec<Document>>;
