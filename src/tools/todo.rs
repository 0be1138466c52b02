use crate::core::memory::types::TaskRecord;

pub const EMPTY_LIST: &str = "Your to-do list is empty.";

pub fn render_task_list(tasks: &[TaskRecord]) -> String {
    if tasks.is_empty() {
        return EMPTY_LIST.to_string();
    }
    let mut out = String::from("Here are your tasks:\n");
    for task in tasks {
        out.push_str(&format!(
            "{}: {} - {}\n",
            task.id, task.description, task.status
        ));
    }
    out
}

pub fn added(description: &str, id: i64) -> String {
    format!("Task '{}' added with ID {}.", description, id)
}

pub fn status_updated(id: i64, status: &str) -> String {
    format!("Task {} status updated to '{}'.", id, status)
}

pub fn deleted(id: i64) -> String {
    format!("Task {} deleted.", id)
}

pub fn not_found(id: i64) -> String {
    format!("Task {} not found.", id)
}
