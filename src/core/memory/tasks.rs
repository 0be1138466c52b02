use rusqlite::params;

use super::types::{STATUS_PENDING, TaskRecord};
use super::{StoreResult, TaskStore};

impl TaskStore {
    /// Insert a new task with status `pending` and return its id.
    pub async fn add(&self, description: &str) -> StoreResult<i64> {
        let db = self.store.db.lock().await;
        db.execute(
            "INSERT INTO tasks (task, status) VALUES (?1, ?2)",
            params![description, STATUS_PENDING],
        )?;
        Ok(db.last_insert_rowid())
    }

    /// All tasks in id order.
    pub async fn list(&self) -> StoreResult<Vec<TaskRecord>> {
        let db = self.store.db.lock().await;
        let mut stmt = db.prepare("SELECT id, task, status FROM tasks ORDER BY id ASC")?;
        let rows = stmt.query_map([], |row| {
            Ok(TaskRecord {
                id: row.get(0)?,
                description: row.get(1)?,
                status: row.get(2)?,
            })
        })?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?);
        }
        Ok(results)
    }

    /// Returns false when no task has this id.
    pub async fn update_status(&self, id: i64, status: &str) -> StoreResult<bool> {
        let db = self.store.db.lock().await;
        let changed = db.execute(
            "UPDATE tasks SET status = ?1 WHERE id = ?2",
            params![status, id],
        )?;
        Ok(changed > 0)
    }

    /// Returns false when no task has this id.
    pub async fn delete(&self, id: i64) -> StoreResult<bool> {
        let db = self.store.db.lock().await;
        let changed = db.execute("DELETE FROM tasks WHERE id = ?1", params![id])?;
        Ok(changed > 0)
    }
}
