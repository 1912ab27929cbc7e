//! Terminal output

use todo_core::notify::{Notification, NotificationLevel};
use todo_core::session::Identity;
use todo_core::task::{Task, TaskCounts};

pub fn task_line(task: &Task) -> String {
    let mark = if task.is_completed() { "x" } else { " " };
    let mut line = format!("[{}] {:<8} {}", mark, task.id, task.title);
    if !task.description.is_empty() {
        line.push_str(&format!(" - {}", task.description));
    }
    line
}

pub fn print_tasks(tasks: &[Task], counts: TaskCounts) {
    if tasks.is_empty() {
        println!("No tasks found.");
    }
    for task in tasks {
        println!("{}", task_line(task));
    }
    println!(
        "{} total, {} active, {} completed",
        counts.total, counts.active, counts.completed
    );
}

pub fn print_identity(identity: &Identity) {
    println!("{} <{}> (id {})", identity.display_name(), identity.email, identity.id);
}

pub fn notification_line(note: &Notification) -> String {
    let tag = match note.level {
        NotificationLevel::Success => "ok",
        NotificationLevel::Error => "error",
    };
    format!("[{}] {}: {}", tag, note.title, note.description)
}
