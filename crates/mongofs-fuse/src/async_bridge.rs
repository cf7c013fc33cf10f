//! Bridge between synchronous FUSE callbacks and async store queries.
//!
//! FUSE callbacks are synchronous; the document-store session is
//! async. A single shared runtime drives the queries.

use std::future::Future;
use std::sync::OnceLock;

use tokio::runtime::{Builder, Runtime};

use crate::core::FsOpError;

/// Global tokio runtime for FUSE callbacks.
///
/// Stores the result of runtime creation so that initialization errors
/// are propagated without panicking.
static RUNTIME: OnceLock<Result<Runtime, String>> = OnceLock::new();

/// Initialize the async runtime for FUSE operations.
pub fn init_runtime() -> Result<&'static Runtime, FsOpError> {
    let result = RUNTIME.get_or_init(|| {
        Builder::new_multi_thread()
            .worker_threads(4)
            .thread_name("mongofs-fuse-worker")
            .enable_all()
            .build()
            .map_err(|e| e.to_string())
    });
    match result {
        Ok(rt) => Ok(rt),
        Err(e) => Err(FsOpError::Store(format!(
            "failed to create FUSE async runtime: {}",
            e
        ))),
    }
}

fn runtime() -> Result<&'static Runtime, FsOpError> {
    match RUNTIME.get() {
        Some(Ok(rt)) => Ok(rt),
        Some(Err(e)) => Err(FsOpError::Store(format!(
            "FUSE runtime failed to initialize: {}",
            e
        ))),
        None => Err(FsOpError::Store(
            "FUSE runtime not initialized - call init_runtime first".to_string(),
        )),
    }
}

/// Run an async store operation synchronously in the FUSE runtime.
pub fn block_on<F, T>(future: F) -> Result<T, FsOpError>
where
    F: Future<Output = T>,
{
    let rt = runtime()?;
    Ok(rt.block_on(future))
}
