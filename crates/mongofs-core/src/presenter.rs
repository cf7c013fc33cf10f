//! Entity presentation: synthesize filesystem attributes and directory
//! listings for a resolved locator from live store queries.
//!
//! Nothing here is cached or persisted; existence is checked fresh on
//! every call, so a listing and a follow-up attribute lookup may see
//! different snapshots of the store.

use std::sync::Arc;

use bson::{doc, Bson, Document};
use tracing::debug;

use crate::locator::{Grammar, PathLocator};
use crate::store::{DocumentStore, StoreError};

/// Presentation class of an entry: plain file or directory. There is
/// deliberately no unified node type; attribute and listing semantics
/// diverge completely between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// Synthesized attributes for a path.
///
/// Timestamps are not part of this struct: the filesystem layer stamps
/// every answer with "now", an accepted inexactness of the design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryAttr {
    pub kind: EntryKind,
    /// Byte-size estimate. For files this is the serialized BSON
    /// footprint, not an exact wire size; it is display-only since
    /// content reads are not implemented.
    pub size: u64,
    pub perm: u16,
    pub nlink: u32,
}

impl EntryAttr {
    /// Fixed attributes for every synthesized directory.
    pub fn directory() -> Self {
        EntryAttr {
            kind: EntryKind::Directory,
            size: 4096,
            perm: 0o755,
            nlink: 2,
        }
    }

    /// File attributes with an estimated size.
    pub fn file(size: u64) -> Self {
        EntryAttr {
            kind: EntryKind::File,
            size,
            perm: 0o666,
            nlink: 1,
        }
    }
}

/// A single directory entry produced by a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildEntry {
    pub name: String,
    pub kind: EntryKind,
}

/// Errors from presentation.
#[derive(Debug, thiserror::Error)]
pub enum PresentError {
    /// The entity the locator names does not exist.
    #[error("entity not found")]
    NotFound,

    /// The store could not be reached or the query failed. Kept
    /// distinct from absence so connectivity failures do not
    /// masquerade as missing files.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Serialized-footprint estimate for a document.
fn document_footprint(doc: &Document) -> u64 {
    match bson::to_vec(doc) {
        Ok(bytes) => bytes.len() as u64,
        // Unserializable documents should not happen for data that came
        // off the wire; fall back to the debug rendering length.
        Err(_) => doc.to_string().len() as u64,
    }
}

/// Footprint estimate for a single projected value.
fn value_footprint(value: &Bson) -> u64 {
    document_footprint(&doc! { "v": value.clone() })
}

/// Answers attribute and listing queries for resolved locators.
pub struct Presenter {
    store: Arc<dyn DocumentStore>,
    grammar: Grammar,
}

impl Presenter {
    pub fn new(store: Arc<dyn DocumentStore>, grammar: Grammar) -> Self {
        Presenter { store, grammar }
    }

    pub fn grammar(&self) -> Grammar {
        self.grammar
    }

    /// How a document is presented depends on the grammar: a leaf file
    /// in the flat variant, a directory of field files otherwise. It is
    /// never both at once.
    fn document_kind(&self) -> EntryKind {
        if self.grammar.field_access {
            EntryKind::Directory
        } else {
            EntryKind::File
        }
    }

    /// Synthesize attributes for the entity a locator names.
    ///
    /// Root and collection directories always exist and never touch
    /// the store; documents and fields require a point lookup.
    pub async fn attributes_of(&self, locator: &PathLocator) -> Result<EntryAttr, PresentError> {
        match locator {
            PathLocator::Root | PathLocator::Collection { .. } => Ok(EntryAttr::directory()),

            PathLocator::Document { collection, id } => {
                match self.store.find_document(collection, *id).await? {
                    Some(doc) => match self.document_kind() {
                        EntryKind::Directory => Ok(EntryAttr::directory()),
                        EntryKind::File => Ok(EntryAttr::file(document_footprint(&doc))),
                    },
                    None => {
                        debug!(collection, id = %id, "document not found");
                        Err(PresentError::NotFound)
                    }
                }
            }

            PathLocator::Field {
                collection,
                id,
                field_path,
            } => {
                if !self.grammar.field_access {
                    return Err(PresentError::NotFound);
                }
                match self.store.find_field(collection, *id, field_path).await? {
                    Some(value) => Ok(EntryAttr::file(value_footprint(&value))),
                    None => Err(PresentError::NotFound),
                }
            }
        }
    }

    /// List the children of the entity a locator names, in store
    /// order, without the `.`/`..` markers (the filesystem layer
    /// prepends those).
    pub async fn list_children(
        &self,
        locator: &PathLocator,
    ) -> Result<Vec<ChildEntry>, PresentError> {
        match locator {
            PathLocator::Root => {
                let names = self.store.list_collections().await?;
                Ok(names
                    .into_iter()
                    .map(|name| ChildEntry {
                        name,
                        kind: EntryKind::Directory,
                    })
                    .collect())
            }

            PathLocator::Collection { collection } => {
                let ids = self.store.list_ids(collection).await?;
                let kind = self.document_kind();
                Ok(ids
                    .into_iter()
                    .map(|id| ChildEntry {
                        name: id.to_hex(),
                        kind,
                    })
                    .collect())
            }

            PathLocator::Document { collection, id } => {
                if !self.grammar.field_access {
                    // Flat grammar: documents are leaf files with no
                    // children to enumerate.
                    return Ok(Vec::new());
                }
                match self.store.find_document(collection, *id).await? {
                    Some(doc) => Ok(doc
                        .keys()
                        .map(|key| ChildEntry {
                            name: key.clone(),
                            kind: EntryKind::File,
                        })
                        .collect()),
                    None => Err(PresentError::NotFound),
                }
            }

            PathLocator::Field { .. } => Ok(Vec::new()),
        }
    }
}
