use rusqlite::params;

use super::types::{MessageRecord, Role};
use super::{HistoryStore, StoreResult};

impl HistoryStore {
    /// Record a thread id. Re-recording an existing thread is a no-op.
    pub async fn ensure_thread(&self, thread_id: &str) -> StoreResult<()> {
        let db = self.store.db.lock().await;
        db.execute(
            "INSERT OR IGNORE INTO threads (id) VALUES (?1)",
            params![thread_id],
        )?;
        Ok(())
    }

    pub async fn thread_exists(&self, thread_id: &str) -> StoreResult<bool> {
        let db = self.store.db.lock().await;
        let count: i64 = db.query_row(
            "SELECT COUNT(*) FROM threads WHERE id = ?1",
            params![thread_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Append one turn. The thread must already be recorded.
    pub async fn append(&self, thread_id: &str, role: Role, content: &str) -> StoreResult<i64> {
        let db = self.store.db.lock().await;
        db.execute(
            "INSERT INTO messages (thread_id, role, content) VALUES (?1, ?2, ?3)",
            params![thread_id, role.as_str(), content],
        )?;
        Ok(db.last_insert_rowid())
    }

    /// All turns of a thread, oldest first.
    pub async fn messages(&self, thread_id: &str) -> StoreResult<Vec<MessageRecord>> {
        let db = self.store.db.lock().await;
        let mut stmt = db.prepare(
            "SELECT id, thread_id, role, content, created_at FROM messages \
             WHERE thread_id = ?1 ORDER BY created_at ASC, id ASC",
        )?;
        let rows = stmt.query_map(params![thread_id], |row| {
            Ok(MessageRecord {
                id: row.get(0)?,
                thread_id: row.get(1)?,
                role: row.get(2)?,
                content: row.get(3)?,
                created_at: row.get(4)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }
}
