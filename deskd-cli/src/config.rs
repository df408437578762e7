use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::Context;

use deskd_core::client::DeskdClient;
use deskd_core::directory::DeskList;

// ─── Storage Backend Selection ──────────────────────────────────────────────

/// Where bookings live: `memory`, `sqlite:<path>` or `file:<path>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Memory,
    Sqlite(String),
    File(String),
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "memory" {
            return Ok(StorageBackend::Memory);
        }
        let (kind, path) = s
            .split_once(':')
            .ok_or_else(|| format!("Unknown storage backend '{}'. Use 'memory', 'sqlite:<path>' or 'file:<path>'", s))?;
        if path.is_empty() {
            return Err(format!("Storage backend '{}' needs a path", kind));
        }
        match kind {
            "sqlite" => Ok(StorageBackend::Sqlite(path.to_string())),
            "file" => Ok(StorageBackend::File(path.to_string())),
            _ => Err(format!(
                "Unknown storage backend '{}'. Use 'memory', 'sqlite:<path>' or 'file:<path>'",
                kind
            )),
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageBackend::Memory => write!(f, "memory"),
            StorageBackend::Sqlite(path) => write!(f, "sqlite:{}", path),
            StorageBackend::File(path) => write!(f, "file:{}", path),
        }
    }
}

/// Load the desk list and open the configured store.
pub fn open_client(storage: &StorageBackend, desks_path: &Path) -> anyhow::Result<DeskdClient> {
    let desks = DeskList::open(desks_path)
        .with_context(|| format!("Unable to open desk file {}", desks_path.display()))?;
    tracing::info!(desks = desks.len(), path = %desks_path.display(), "Desk list loaded");

    match storage {
        StorageBackend::Memory => {
            tracing::info!("Storage backend: in-memory (bookings will not persist)");
            Ok(DeskdClient::in_memory(desks))
        }
        StorageBackend::Sqlite(path) => {
            #[cfg(feature = "sqlite")]
            {
                tracing::info!("Storage backend: SQLite ({})", path);
                DeskdClient::with_sqlite(path, desks)
                    .with_context(|| format!("Unable to open SQLite database at '{}'", path))
            }
            #[cfg(not(feature = "sqlite"))]
            {
                let _ = desks;
                anyhow::bail!(
                    "SQLite storage '{}' requested but the `sqlite` feature is not enabled. \
                     Rebuild with: cargo build --features sqlite",
                    path
                )
            }
        }
        StorageBackend::File(path) => {
            #[cfg(feature = "file")]
            {
                tracing::info!("Storage backend: JSON file ({})", path);
                DeskdClient::with_file(path, desks)
                    .with_context(|| format!("Unable to open booking file at '{}'", path))
            }
            #[cfg(not(feature = "file"))]
            {
                let _ = desks;
                anyhow::bail!(
                    "File storage '{}' requested but the `file` feature is not enabled. \
                     Rebuild with: cargo build --features file",
                    path
                )
            }
        }
    }
}
