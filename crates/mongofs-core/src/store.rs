//! Document-store session interface and implementations.
//!
//! The trait is the seam between the presenter and the database: the
//! real implementation speaks to MongoDB through the official driver,
//! and tests inject [`MemoryStore`]. Every call is a single attempt
//! with no retries; connection failures surface as
//! [`StoreError::Unavailable`], distinct from a document simply not
//! being there (which is `Ok(None)`).

use std::sync::RwLock;
use std::time::Duration;

use async_trait::async_trait;
use bson::oid::ObjectId;
use bson::{doc, Bson, Document};
use futures::stream::TryStreamExt;
use mongodb::options::ClientOptions;
use mongodb::Client;
use tracing::debug;

use mongofs_config::MongoFsConfig;

/// Errors from document-store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Connection or transport failure. Surfaced to the filesystem
    /// layer as an I/O error rather than masked as not-found.
    #[error("document store unavailable: {0}")]
    Unavailable(String),

    /// The server rejected or failed the query.
    #[error("query failed: {0}")]
    Query(String),
}

impl StoreError {
    fn from_driver(e: mongodb::error::Error) -> Self {
        use mongodb::error::ErrorKind;
        match *e.kind {
            ErrorKind::Io(_)
            | ErrorKind::ServerSelection { .. }
            | ErrorKind::ConnectionPoolCleared { .. } => StoreError::Unavailable(e.to_string()),
            _ => StoreError::Query(e.to_string()),
        }
    }
}

/// Minimal session interface against the document store.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All collection names in the database.
    async fn list_collections(&self) -> Result<Vec<String>, StoreError>;

    /// Point lookup of one document by id.
    async fn find_document(
        &self,
        collection: &str,
        id: ObjectId,
    ) -> Result<Option<Document>, StoreError>;

    /// Point lookup filtered on the given dotted field path existing,
    /// projecting only that field. `Ok(Some)` carries the projected
    /// value; absence of either document or field is `Ok(None)`.
    async fn find_field(
        &self,
        collection: &str,
        id: ObjectId,
        field_path: &str,
    ) -> Result<Option<Bson>, StoreError>;

    /// Ids of every document in the collection, in store order.
    /// Unpaginated full scan; the cursor lives for this one call.
    async fn list_ids(&self, collection: &str) -> Result<Vec<ObjectId>, StoreError>;
}

/// Walk a dotted field path through nested documents.
pub(crate) fn lookup_dotted<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut current = doc;
    let mut parts = path.split('.').peekable();
    while let Some(part) = parts.next() {
        let value = current.get(part)?;
        if parts.peek().is_none() {
            return Some(value);
        }
        current = value.as_document()?;
    }
    None
}

/// Document store backed by a MongoDB deployment.
pub struct MongoStore {
    client: Client,
    database: String,
}

impl MongoStore {
    /// Connect to the configured deployment.
    ///
    /// Connection establishment and server selection are bounded by
    /// the configured timeout; individual queries inherit the driver's
    /// own bounds and are attempted exactly once.
    pub async fn connect(config: &MongoFsConfig) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(config.connection_uri())
            .await
            .map_err(StoreError::from_driver)?;
        let timeout = Duration::from_secs(config.connect_timeout_secs);
        options.connect_timeout = Some(timeout);
        options.server_selection_timeout = Some(timeout);
        options.app_name = Some("mongofs".to_string());

        let client = Client::with_options(options).map_err(StoreError::from_driver)?;
        debug!(host = %config.host, database = %config.database, "connected store session");

        Ok(MongoStore {
            client,
            database: config.database.clone(),
        })
    }

    fn db(&self) -> mongodb::Database {
        self.client.database(&self.database)
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        self.db()
            .list_collection_names()
            .await
            .map_err(StoreError::from_driver)
    }

    async fn find_document(
        &self,
        collection: &str,
        id: ObjectId,
    ) -> Result<Option<Document>, StoreError> {
        self.db()
            .collection::<Document>(collection)
            .find_one(doc! { "_id": id })
            .await
            .map_err(StoreError::from_driver)
    }

    async fn find_field(
        &self,
        collection: &str,
        id: ObjectId,
        field_path: &str,
    ) -> Result<Option<Bson>, StoreError> {
        let filter = doc! { "_id": id, field_path: { "$exists": true } };
        let found = self
            .db()
            .collection::<Document>(collection)
            .find_one(filter)
            .projection(doc! { field_path: 1, "_id": 0 })
            .await
            .map_err(StoreError::from_driver)?;

        Ok(found.and_then(|doc| lookup_dotted(&doc, field_path).cloned()))
    }

    async fn list_ids(&self, collection: &str) -> Result<Vec<ObjectId>, StoreError> {
        let mut cursor = self
            .db()
            .collection::<Document>(collection)
            .find(doc! {})
            .projection(doc! { "_id": 1 })
            .await
            .map_err(StoreError::from_driver)?;

        let mut ids = Vec::new();
        while let Some(doc) = cursor.try_next().await.map_err(StoreError::from_driver)? {
            if let Ok(id) = doc.get_object_id("_id") {
                ids.push(id);
            }
        }
        Ok(ids)
    }
}

/// In-memory document store for tests.
///
/// Collections preserve insertion order, matching the "store order"
/// contract for listings.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<Vec<(String, Vec<(ObjectId, Document)>)>>,
    unavailable: RwLock<bool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a document, generating a fresh id, and return it.
    pub fn insert(&self, collection: &str, doc: Document) -> ObjectId {
        let id = ObjectId::new();
        self.insert_with_id(collection, id, doc);
        id
    }

    /// Insert a document under a caller-chosen id.
    pub fn insert_with_id(&self, collection: &str, id: ObjectId, mut doc: Document) {
        doc.insert("_id", id);
        let mut collections = self.collections.write().unwrap_or_else(|e| e.into_inner());
        if let Some((_, docs)) = collections.iter_mut().find(|(name, _)| name == collection) {
            docs.push((id, doc));
        } else {
            collections.push((collection.to_string(), vec![(id, doc)]));
        }
    }

    /// Register an empty collection.
    pub fn create_collection(&self, collection: &str) {
        let mut collections = self.collections.write().unwrap_or_else(|e| e.into_inner());
        if !collections.iter().any(|(name, _)| name == collection) {
            collections.push((collection.to_string(), Vec::new()));
        }
    }

    /// Make every subsequent call fail with [`StoreError::Unavailable`].
    pub fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().unwrap_or_else(|e| e.into_inner()) = unavailable;
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if *self.unavailable.read().unwrap_or_else(|e| e.into_inner()) {
            Err(StoreError::Unavailable("simulated outage".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list_collections(&self) -> Result<Vec<String>, StoreError> {
        self.check_available()?;
        let collections = self.collections.read().unwrap_or_else(|e| e.into_inner());
        Ok(collections.iter().map(|(name, _)| name.clone()).collect())
    }

    async fn find_document(
        &self,
        collection: &str,
        id: ObjectId,
    ) -> Result<Option<Document>, StoreError> {
        self.check_available()?;
        let collections = self.collections.read().unwrap_or_else(|e| e.into_inner());
        Ok(collections
            .iter()
            .find(|(name, _)| name == collection)
            .and_then(|(_, docs)| docs.iter().find(|(doc_id, _)| *doc_id == id))
            .map(|(_, doc)| doc.clone()))
    }

    async fn find_field(
        &self,
        collection: &str,
        id: ObjectId,
        field_path: &str,
    ) -> Result<Option<Bson>, StoreError> {
        let doc = self.find_document(collection, id).await?;
        Ok(doc.and_then(|doc| lookup_dotted(&doc, field_path).cloned()))
    }

    async fn list_ids(&self, collection: &str) -> Result<Vec<ObjectId>, StoreError> {
        self.check_available()?;
        let collections = self.collections.read().unwrap_or_else(|e| e.into_inner());
        Ok(collections
            .iter()
            .find(|(name, _)| name == collection)
            .map(|(_, docs)| docs.iter().map(|(id, _)| *id).collect())
            .unwrap_or_default())
    }
}
