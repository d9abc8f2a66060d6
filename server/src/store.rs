use jimmy_core::AppData;
use tokio::sync::RwLock;
use turso::Database;

use crate::{AppResult, db};

/// In-memory snapshot of the bundle, written through to the database.
///
/// Mutations run under the write lock, so there is a single writer. A failed
/// save keeps the new snapshot in memory and reports the error; the next
/// successful mutation persists it.
pub struct Store {
    db: Database,
    data: RwLock<AppData>,
}

impl Store {
    pub async fn open(db: Database) -> AppResult<Self> {
        let data = match db::load_data(&db).await? {
            Some(data) => data,
            None => {
                let data = AppData::default();
                db::save_data(&db, &data).await?;
                tracing::info!("initialized empty data store");
                data
            }
        };

        Ok(Self {
            db,
            data: RwLock::new(data),
        })
    }

    pub async fn snapshot(&self) -> AppData {
        self.data.read().await.clone()
    }

    pub async fn read<T>(&self, f: impl FnOnce(&AppData) -> T) -> T {
        f(&*self.data.read().await)
    }

    /// Applies `f` to a copy of the snapshot and commits it if `f` succeeds.
    pub async fn update<T>(&self, f: impl FnOnce(&mut AppData) -> AppResult<T>) -> AppResult<T> {
        let mut guard = self.data.write().await;
        let mut next = guard.clone();
        let out = f(&mut next)?;
        *guard = next;

        db::save_data(&self.db, &guard).await?;
        tracing::info!(
            sessions = guard.session_history.len(),
            programs = guard.workout_programs.len(),
            "data saved"
        );
        Ok(out)
    }
}
