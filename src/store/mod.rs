use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::error::CueResult;
use crate::subscription::Subscription;

mod memory;

pub use memory::MemoryStore;

pub const USERS: &str = "users";
pub const USER_SHOWS: &str = "user_shows";

pub type Fields = Map<String, Value>;

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

/// Equality filters over one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: String,
    pub filters: Vec<(String, Value)>,
}

impl Query {
    pub fn collection(name: &str) -> Self {
        Self {
            collection: name.to_string(),
            filters: Vec::new(),
        }
    }

    pub fn where_eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push((field.to_string(), value.into()));
        self
    }

    pub fn matches(&self, fields: &Fields) -> bool {
        self.filters
            .iter()
            .all(|(field, expected)| fields.get(field) == Some(expected))
    }
}

/// Remote per-user document database. Writes are request/response; reads can
/// be one-shot or live.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, collection: &str, id: &str) -> CueResult<Option<Document>>;

    async fn query(&self, query: &Query) -> CueResult<Vec<Document>>;

    /// Stores `fields` under a generated id and returns it.
    async fn add(&self, collection: &str, fields: Fields) -> CueResult<String>;

    /// Creates or replaces the whole document.
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> CueResult<()>;

    /// Merges `fields` into an existing document; `NotFound` if it is absent.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> CueResult<()>;

    async fn delete(&self, collection: &str, id: &str) -> CueResult<()>;

    /// Result set of `query`, republished after every change to the collection.
    async fn watch(&self, query: Query) -> CueResult<Subscription<Vec<Document>>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_matches_on_every_filter() {
        let q = Query::collection(USER_SHOWS)
            .where_eq("userId", "u1")
            .where_eq("showId", 42);
        let mut fields = Fields::new();
        fields.insert("userId".into(), json!("u1"));
        fields.insert("showId".into(), json!(42));
        assert!(q.matches(&fields));
        fields.insert("showId".into(), json!(7));
        assert!(!q.matches(&fields));
    }
}
