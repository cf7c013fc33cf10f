//! Path resolution: classify a slash-delimited path into a typed
//! locator describing the database entity it names.
//!
//! Resolution is a pure function of the path string and the configured
//! grammar. Existence is never consulted here; a locator describes
//! what a path *would* name, and the presenter decides whether the
//! entity is actually there.

use bson::oid::ObjectId;

/// Grammar configuration for the resolver.
///
/// With `field_access` disabled (the default) paths bottom out at
/// documents. Enabling it adds a fourth level where remaining path
/// segments address a dotted field path inside the document.
#[derive(Debug, Clone, Copy, Default)]
pub struct Grammar {
    pub field_access: bool,
}

impl Grammar {
    pub fn with_field_access(enabled: bool) -> Self {
        Grammar {
            field_access: enabled,
        }
    }
}

/// The resolved, typed description of what a filesystem path names.
///
/// Exactly one variant holds per path; the populated fields are fully
/// determined by the variant. Locators are built fresh per request and
/// never cached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathLocator {
    /// The database root.
    Root,
    /// A collection.
    Collection { collection: String },
    /// A single document addressed by its ObjectId.
    Document { collection: String, id: ObjectId },
    /// A (possibly nested) field inside a document, as a dotted path.
    Field {
        collection: String,
        id: ObjectId,
        field_path: String,
    },
}

impl PathLocator {
    /// Ordinal depth of the locator kind: 0 for root through 3 for field.
    pub fn depth(&self) -> u8 {
        match self {
            PathLocator::Root => 0,
            PathLocator::Collection { .. } => 1,
            PathLocator::Document { .. } => 2,
            PathLocator::Field { .. } => 3,
        }
    }
}

/// Errors from path resolution.
///
/// Both map to "no such entry" at the filesystem boundary, but they
/// are distinct from absence: the path is syntactically incapable of
/// naming anything.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ResolveError {
    /// The identifier segment is not a valid ObjectId.
    #[error("malformed object id: {0}")]
    MalformedId(String),

    /// The path has more segments than the grammar allows.
    #[error("path deeper than the configured grammar: {0}")]
    DepthExceeded(String),
}

impl Grammar {
    /// Resolve a path string into a locator.
    ///
    /// Total over all strings: every input yields either a locator or
    /// a [`ResolveError`], never a panic. Leading and trailing
    /// separators are ignored; the split is segment-limited so the
    /// third token absorbs the rest of the path unsplit.
    pub fn resolve(&self, path: &str) -> Result<PathLocator, ResolveError> {
        let trimmed = path.trim_matches('/');
        if trimmed.is_empty() {
            return Ok(PathLocator::Root);
        }

        let mut parts = trimmed.splitn(3, '/');
        let collection = parts.next().unwrap_or_default().to_string();
        let id_segment = parts.next();
        let remainder = parts.next();

        let id_segment = match id_segment {
            Some(s) => s,
            None => return Ok(PathLocator::Collection { collection }),
        };

        // Doubled or trailing separators leave an empty identifier
        // segment; degrade to the collection so the caller gets a
        // clean not-found instead of a parse failure.
        if id_segment.is_empty() {
            return Ok(PathLocator::Collection { collection });
        }

        let id = ObjectId::parse_str(id_segment)
            .map_err(|_| ResolveError::MalformedId(id_segment.to_string()))?;

        let remainder = match remainder {
            Some(r) if !r.trim_matches('/').is_empty() => r,
            _ => return Ok(PathLocator::Document { collection, id }),
        };

        if !self.field_access {
            return Err(ResolveError::DepthExceeded(path.to_string()));
        }

        let field_path = remainder.trim_matches('/').replace('/', ".");
        Ok(PathLocator::Field {
            collection,
            id,
            field_path,
        })
    }
}
