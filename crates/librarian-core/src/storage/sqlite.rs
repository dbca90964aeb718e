use rusqlite::{Connection, DatabaseName, OpenFlags, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub const SCHEMA_VERSION: i64 = 1;

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        let db = Database { conn };
        db.configure_pragmas()?;
        db.migrate_schema()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Database { conn };
        db.configure_pragmas()?;
        db.migrate_schema()?;
        Ok(db)
    }

    fn configure_pragmas(&self) -> Result<()> {
        self.conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA cache_size = -64000;
             PRAGMA busy_timeout = 5000;",
        )?;
        debug!("SQLite pragmas configured (WAL mode, 64MB cache)");
        Ok(())
    }

    /// Check schema version and migrate if needed.
    /// Version < 1 (including tables written by older tooling without a
    /// primary key): drop and recreate. The catalog is derived from disk.
    fn migrate_schema(&self) -> Result<()> {
        let version: i64 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version < SCHEMA_VERSION {
            debug!(
                "Schema version {} < {}, dropping catalog table and recreating",
                version, SCHEMA_VERSION
            );
            self.conn.execute_batch("DROP TABLE IF EXISTS catalog;")?;
        }

        self.conn.execute_batch(include_str!("schema.sql"))?;
        debug!("SQLite schema initialized (version {})", SCHEMA_VERSION);
        Ok(())
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

/// Online copy of the store file at `source` into `target`. The source is
/// opened bare: no pragmas, no migration, never created.
pub fn backup_file(source: &Path, target: &Path) -> Result<()> {
    let conn = Connection::open_with_flags(
        source,
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;
    conn.backup(DatabaseName::Main, target, None)
}

/// `library.sqlite` -> `library-20250607-142501.sqlite.bak`, next to the store.
pub fn backup_path_for(store_path: &Path, stamp: &str) -> PathBuf {
    let stem = store_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "library".to_string());
    let ext = store_path
        .extension()
        .map(|e| e.to_string_lossy().into_owned())
        .unwrap_or_else(|| "sqlite".to_string());
    store_path.with_file_name(format!("{}-{}.{}.bak", stem, stamp, ext))
}

/// Timestamped copy of the store, taken before it is opened for writing
/// (opening may migrate the schema). A missing store has nothing to copy.
/// Failures are warnings: the caller proceeds without a backup.
pub fn backup_store(store_path: &Path) -> Option<PathBuf> {
    if !store_path.exists() {
        debug!("No catalog store at {} yet, nothing to back up", store_path.display());
        return None;
    }
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S").to_string();
    let target = backup_path_for(store_path, &stamp);
    match backup_file(store_path, &target) {
        Ok(()) => {
            info!("Backed up catalog store to {}", target.display());
            Some(target)
        }
        Err(e) => {
            warn!("Backup of {} failed, continuing without one: {}", store_path.display(), e);
            let _ = fs::remove_file(&target);
            None
        }
    }
}
