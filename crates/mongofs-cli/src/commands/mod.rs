use std::sync::Arc;

use mongofs_config::MongoFsConfig;
use mongofs_core::{Grammar, MongoStore, Presenter};

pub mod config;
pub mod ls;
pub mod mount;
pub mod stat;
pub mod validate;

/// Connect to the configured deployment and build a presenter for
/// mount-free commands.
pub async fn connect(config: &MongoFsConfig) -> Result<Presenter, Box<dyn std::error::Error>> {
    config.validate_or_err()?;
    let store = MongoStore::connect(config).await?;
    Ok(Presenter::new(
        Arc::new(store),
        Grammar::with_field_access(config.field_access),
    ))
}
