use crate::model::task::Task;

/// Human-readable progress sentence for the whole list.
pub fn summarize(tasks: &[Task]) -> String {
    let done = tasks.iter().filter(|t| t.done).count();
    let pending = tasks.len() - done;
    format!(
        "You completed {} tasks today. You still have {} pending. Keep going!",
        done, pending
    )
}
