use chrono::{SecondsFormat, Utc};
use jimmy_core::{AppData, export_bundle, load_bundle};
use turso::{Builder, Database};

use crate::AppResult;

/// The bundle lives in a single row.
const BUNDLE_ROW: i64 = 1;

pub const MIGRATIONS: &str = r#"
CREATE TABLE IF NOT EXISTS app_data (
    id INTEGER PRIMARY KEY NOT NULL,
    payload TEXT NOT NULL,
    updated_at DATETIME NOT NULL DEFAULT CURRENT_TIMESTAMP
);
"#;

pub async fn init_database(path: &str) -> AppResult<Database> {
    let db = Builder::new_local(path).build().await?;
    let conn = db.connect()?;
    conn.execute_batch(MIGRATIONS).await?;
    Ok(db)
}

/// Reads the stored bundle. `None` on first run.
///
/// A payload that no longer parses is logged and replaced by defaults so the
/// app stays usable.
pub async fn load_data(db: &Database) -> AppResult<Option<AppData>> {
    let conn = db.connect()?;
    let mut rows = conn
        .query("SELECT payload FROM app_data WHERE id = ?1", [BUNDLE_ROW])
        .await?;
    let Some(row) = rows.next().await? else {
        return Ok(None);
    };
    let payload: String = row.get(0)?;

    match load_bundle(&payload) {
        Ok(data) => Ok(Some(data)),
        Err(err) => {
            tracing::error!(error = %err, "stored data is unreadable, starting from defaults");
            Ok(Some(AppData::default()))
        }
    }
}

pub async fn save_data(db: &Database, data: &AppData) -> AppResult<()> {
    let payload = export_bundle(data)?;
    let conn = db.connect()?;
    conn.execute(
        "INSERT INTO app_data (id, payload, updated_at) VALUES (?1, ?2, ?3) \
         ON CONFLICT(id) DO UPDATE SET payload = excluded.payload, updated_at = excluded.updated_at",
        (BUNDLE_ROW, payload.as_str(), timestamp().as_str()),
    )
    .await?;
    Ok(())
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
