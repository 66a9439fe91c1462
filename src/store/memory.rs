use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{broadcast, watch, Mutex};
use tracing::{debug, warn};
use uuid::Uuid;

use super::{Document, DocumentStore, Fields, Query};
use crate::error::{CueError, CueResult};
use crate::subscription::Subscription;

const CHANGE_BUFFER: usize = 64;

type Collections = HashMap<String, BTreeMap<String, Fields>>;

/// Process-local document store with live queries. Backs tests and the demo
/// binary in place of a hosted database.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

struct Inner {
    collections: Mutex<Collections>,
    changes: broadcast::Sender<String>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            inner: Arc::new(Inner {
                collections: Mutex::new(HashMap::new()),
                changes,
            }),
        }
    }

    pub async fn len(&self, collection: &str) -> usize {
        self.inner
            .collections
            .lock()
            .await
            .get(collection)
            .map_or(0, |c| c.len())
    }

    fn notify(&self, collection: &str) {
        // No receivers simply means nobody is watching.
        let _ = self.inner.changes.send(collection.to_string());
    }
}

impl Inner {
    async fn run_query(&self, query: &Query) -> Vec<Document> {
        let guard = self.collections.lock().await;
        guard
            .get(&query.collection)
            .map(|docs| {
                docs.iter()
                    .filter(|(_, fields)| query.matches(fields))
                    .map(|(id, fields)| Document {
                        id: id.clone(),
                        fields: fields.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> CueResult<Option<Document>> {
        let guard = self.inner.collections.lock().await;
        Ok(guard
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|fields| Document {
                id: id.to_string(),
                fields: fields.clone(),
            }))
    }

    async fn query(&self, query: &Query) -> CueResult<Vec<Document>> {
        Ok(self.inner.run_query(query).await)
    }

    async fn add(&self, collection: &str, fields: Fields) -> CueResult<String> {
        let id = Uuid::new_v4().simple().to_string();
        self.inner
            .collections
            .lock()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        debug!(collection, id = %id, "document added");
        self.notify(collection);
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> CueResult<()> {
        self.inner
            .collections
            .lock()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);
        self.notify(collection);
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> CueResult<()> {
        {
            let mut guard = self.inner.collections.lock().await;
            let doc = guard
                .get_mut(collection)
                .and_then(|docs| docs.get_mut(id))
                .ok_or_else(|| CueError::NotFound(format!("{collection}/{id}")))?;
            for (key, value) in fields {
                doc.insert(key, value);
            }
        }
        self.notify(collection);
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> CueResult<()> {
        let removed = self
            .inner
            .collections
            .lock()
            .await
            .get_mut(collection)
            .and_then(|docs| docs.remove(id));
        if removed.is_some() {
            self.notify(collection);
        }
        Ok(())
    }

    async fn watch(&self, query: Query) -> CueResult<Subscription<Vec<Document>>> {
        // Subscribe before the first read so no change slips between the two.
        let mut changes = self.inner.changes.subscribe();
        let initial = self.inner.run_query(&query).await;
        let (tx, rx) = watch::channel(initial);
        let inner = Arc::clone(&self.inner);

        let feeder = tokio::spawn(async move {
            loop {
                match changes.recv().await {
                    Ok(collection) if collection != query.collection => continue,
                    Ok(_) => {}
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!(skipped, "live query lagged behind changes; re-reading");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
                let docs = inner.run_query(&query).await;
                tx.send_if_modified(|current| {
                    if *current == docs {
                        false
                    } else {
                        *current = docs;
                        true
                    }
                });
                if tx.is_closed() {
                    break;
                }
            }
        });

        Ok(Subscription::with_feeder(rx, feeder))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn fields(value: serde_json::Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn add_generates_distinct_ids() {
        let store = MemoryStore::new();
        let a = store.add("c", fields(json!({"n": 1}))).await.unwrap();
        let b = store.add("c", fields(json!({"n": 2}))).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.len("c").await, 2);
    }

    #[tokio::test]
    async fn update_merges_and_requires_existing_document() {
        let store = MemoryStore::new();
        store
            .set("c", "d1", fields(json!({"a": 1, "b": 2})))
            .await
            .unwrap();
        store.update("c", "d1", fields(json!({"b": 3}))).await.unwrap();
        let doc = store.get("c", "d1").await.unwrap().unwrap();
        assert_eq!(doc.fields, fields(json!({"a": 1, "b": 3})));

        let err = store
            .update("c", "missing", fields(json!({"b": 3})))
            .await
            .unwrap_err();
        assert!(matches!(err, CueError::NotFound(_)));
    }

    #[tokio::test]
    async fn query_filters_by_equality() {
        let store = MemoryStore::new();
        store.add("c", fields(json!({"userId": "u1"}))).await.unwrap();
        store.add("c", fields(json!({"userId": "u2"}))).await.unwrap();
        let hits = store
            .query(&Query::collection("c").where_eq("userId", "u1"))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn watch_republishes_after_changes() {
        let store = MemoryStore::new();
        let mut live = store
            .watch(Query::collection("c").where_eq("userId", "u1"))
            .await
            .unwrap();
        assert!(live.current().is_empty());

        store.add("c", fields(json!({"userId": "u1"}))).await.unwrap();
        let docs = tokio::time::timeout(Duration::from_secs(1), live.next())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(docs.len(), 1);
    }

    #[tokio::test]
    async fn dropped_watch_stops_listening() {
        let store = MemoryStore::new();
        let live = store.watch(Query::collection("c")).await.unwrap();
        assert_eq!(store.inner.changes.receiver_count(), 1);
        drop(live);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.inner.changes.receiver_count(), 0);
    }
}
