//! Plain-text rendering for the terminal.

use relocate_core::{ExecutionResult, MoveIntent, Snapshot, Task};

pub fn task_line(task: &Task, snapshot: &Snapshot) -> String {
    let mut s = format!(
        "{:<12} {}  [{}]",
        task.id,
        task.content,
        snapshot.project_name(&task.project_id)
    );
    if task.parent_id.is_some() {
        s.push_str("  subtask");
    }
    if let Some(due) = &task.due {
        s.push_str(&format!("  due {}", due.date));
    }
    s
}

pub fn today_list(snapshot: &Snapshot) -> String {
    let tasks = snapshot.today_tasks();
    if tasks.is_empty() {
        return format!("No tasks due {}.\n", snapshot.today());
    }
    let mut s = format!("# Today ({})\n\n", snapshot.today());
    for t in tasks {
        s.push_str(&task_line(t, snapshot));
        s.push('\n');
    }
    s
}

pub fn destination_list(snapshot: &Snapshot) -> String {
    let tasks = snapshot.destinations();
    if tasks.is_empty() {
        return "No tasks available.\n".to_string();
    }
    let mut s = String::from("# Destinations\n\n");
    for t in tasks {
        s.push_str(&task_line(t, snapshot));
        s.push('\n');
    }
    s
}

pub fn intent_line(intent: &MoveIntent, snapshot: &Snapshot) -> String {
    let name = snapshot
        .graph()
        .get(&intent.task_id)
        .map(|t| t.content.as_str())
        .unwrap_or("?");
    let project = match &intent.target_project_id {
        Some(p) => format!("project -> {}", snapshot.project_name(p)),
        None => "project unchanged".to_string(),
    };
    format!(
        "{} ({}): {}, parent -> {}",
        intent.task_id, name, project, intent.target_parent_id
    )
}

pub fn plan_summary(intents: &[MoveIntent], snapshot: &Snapshot) -> String {
    let mut s = format!("Planned {} update(s):\n", intents.len());
    for (i, intent) in intents.iter().enumerate() {
        s.push_str(&format!("{:>3}. {}\n", i + 1, intent_line(intent, snapshot)));
    }
    s
}

pub fn result_summary(result: &ExecutionResult, snapshot: &Snapshot) -> String {
    match result {
        ExecutionResult::Succeeded { applied } => {
            format!("Moved {} task(s).\n", applied.len())
        }
        ExecutionResult::Failed {
            completed,
            failing,
            error,
        } => {
            let mut s = format!("Move failed: {error}\n");
            s.push_str(&format!(
                "{} update(s) completed before the failure; failed on {}\n",
                completed.len(),
                intent_line(failing, snapshot)
            ));
            if failing.relocates() {
                // Sequential updates move the project first; only the parent call may have failed.
                s.push_str(&format!(
                    "Task {} may already be in its new project even though its parent was not changed.\n",
                    failing.task_id
                ));
            }
            if !completed.is_empty() {
                s.push_str("Already applied (not rolled back):\n");
                for intent in completed {
                    s.push_str(&format!("  - {}\n", intent_line(intent, snapshot)));
                }
            }
            s
        }
    }
}
