
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use super::{BackendKind, LocalStore, RemoteIndex, VectorStore};
use crate::Result;
use crate::config::Config;

/// The vector backend chosen once at startup
#[derive(Debug)]
pub enum BackendSelection {
    Connected(RemoteIndex),
    /// Local store in use, with the reason the remote index was not
    Fallback(LocalStore, String),
}

impl BackendSelection {
    #[inline]
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Connected(_) => BackendKind::Remote,
            Self::Fallback(..) => BackendKind::Local,
        }
    }

    #[inline]
    pub fn fallback_reason(&self) -> Option<&str> {
        match self {
            Self::Connected(_) => None,
            Self::Fallback(_, reason) => Some(reason),
        }
    }

    #[inline]
    pub fn into_parts(self) -> (Arc<dyn VectorStore>, Option<String>) {
        match self {
            Self::Connected(index) => (Arc::new(index), None),
            Self::Fallback(store, reason) => (Arc::new(store), Some(reason)),
        }
    }
}

/// Connect to the remote index, or open the local store when that is impossible.
///
/// Only a local store that cannot be opened is an error; remote failures
/// are logged and reported through the fallback reason.
#[inline]
pub async fn select_backend(config: &Config) -> Result<BackendSelection> {
    let dimension = config.embedding_dimension();

    let reason = if config.remote_index.enabled {
        let remote_config = config.remote_index.clone();
        let attempt =
            tokio::task::spawn_blocking(move || RemoteIndex::connect(&remote_config, dimension))
                .await;

        match attempt {
            Ok(Ok(index)) => return Ok(BackendSelection::Connected(index)),
            Ok(Err(e)) => format!("{:#}", e),
            Err(e) => format!("connection task failed: {}", e),
        }
    } else {
        "remote index disabled".to_string()
    };

    warn!(
        "Remote index not available ({}), using local fallback store",
        reason
    );

    let store = LocalStore::open(config.local_store_path(), dimension).await?;
    info!("Local fallback store active at {}", store.path().display());

    Ok(BackendSelection::Fallback(store, reason))
}

/// What the service would use, found without changing remote state
#[derive(Debug, Clone, PartialEq)]
pub enum BackendReport {
    Remote {
        index_name: String,
        info: serde_json::Value,
    },
    Local {
        path: PathBuf,
        records: usize,
        reason: String,
    },
}

/// Read-only counterpart of [`select_backend`]: the remote index is probed and
/// looked up but never created, and the local store file is only read.
#[inline]
pub async fn inspect_backend(config: &Config) -> Result<BackendReport> {
    let reason = if config.remote_index.enabled {
        let remote_config = config.remote_index.clone();
        let attempt =
            tokio::task::spawn_blocking(move || RemoteIndex::inspect(&remote_config)).await;

        match attempt {
            Ok(Ok(info)) => {
                return Ok(BackendReport::Remote {
                    index_name: config.remote_index.index_name.clone(),
                    info,
                });
            }
            Ok(Err(e)) => format!("{:#}", e),
            Err(e) => format!("inspection task failed: {}", e),
        }
    } else {
        "remote index disabled".to_string()
    };

    let store = LocalStore::open(config.local_store_path(), config.embedding_dimension()).await?;
    let records = store.record_count().await.unwrap_or_default();

    Ok(BackendReport::Local {
        path: store.path().to_path_buf(),
        records,
        reason,
    })
}
