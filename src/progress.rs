//! Task progress calculators.
//!
//! Three separate numbers describe "how done" a task is, and they do not
//! agree with each other:
//!
//! - [`weighted_progress`] blends subtasks (40%), tracked time against the
//!   estimate (30%) and the manually stored value (30%). This is the
//!   `calculated_progress` of the task read model.
//! - [`status_progress`] looks only at the status and the time spent.
//! - [`subtask_progress`] is the subtask-only ratio written back into the
//!   task's stored `progress` after every subtask mutation.

use crate::world::{Subtask, Task, TaskStatus, TimeEntry};

const SUBTASK_WEIGHT: f64 = 0.4;
const TIME_WEIGHT: f64 = 0.3;
const MANUAL_WEIGHT: f64 = 0.3;

/// Weighted overall completion in `[0, 100]`.
///
/// A task with no subtasks and no time entries ends up at
/// `0.3 * task.progress`.
pub fn weighted_progress<'a>(
    task: &Task,
    subtasks: impl IntoIterator<Item = &'a Subtask>,
    entries: impl IntoIterator<Item = &'a TimeEntry>,
) -> u8 {
    let (total, completed) = subtasks
        .into_iter()
        .fold((0u32, 0u32), |(n, done), s| (n + 1, done + u32::from(s.completed)));
    let subtask_term = if total > 0 {
        100.0 * f64::from(completed) / f64::from(total)
    } else {
        0.0
    };

    let mut entry_count = 0usize;
    let tracked_hours: f64 = entries
        .into_iter()
        .inspect(|_| entry_count += 1)
        .map(TimeEntry::hours)
        .sum();
    let time_term = match task.estimated_hours {
        Some(estimate) if estimate > 0.0 && entry_count > 0 => {
            (100.0 * tracked_hours / estimate).min(100.0)
        }
        _ => 0.0,
    };

    let manual_term = f64::from(task.progress);

    let blended =
        SUBTASK_WEIGHT * subtask_term + TIME_WEIGHT * time_term + MANUAL_WEIGHT * manual_term;
    clamp_percent(blended)
}

/// Status-driven completion.
///
/// Completed is always 100 and todo always 0. Anything else uses
/// `time_spent / estimated_hours`, capped at 99 until the task is marked
/// completed, or 50 when there is no estimate.
pub fn status_progress(task: &Task) -> u8 {
    match task.status {
        TaskStatus::Completed => 100,
        TaskStatus::Todo => 0,
        TaskStatus::InProgress | TaskStatus::Overdue => match task.estimated_hours {
            Some(estimate) if estimate > 0.0 => {
                clamp_percent((100.0 * task.time_spent / estimate).min(99.0))
            }
            _ => 50,
        },
    }
}

/// `round(100 * completed / count)`, or `None` when there are no subtasks.
pub fn subtask_progress<'a>(subtasks: impl IntoIterator<Item = &'a Subtask>) -> Option<u8> {
    let (total, completed) = subtasks
        .into_iter()
        .fold((0u32, 0u32), |(n, done), s| (n + 1, done + u32::from(s.completed)));
    (total > 0).then(|| clamp_percent(100.0 * f64::from(completed) / f64::from(total)))
}

// Half-to-even, the same way the stored values have always been rounded.
fn clamp_percent(value: f64) -> u8 {
    value.round_ties_even().clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Priority, DEFAULT_CARD_COLOR};
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn task(progress: u8, estimated_hours: Option<f64>) -> Task {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        Task {
            id: Uuid::new_v4(),
            title: "Write report".into(),
            description: None,
            status: TaskStatus::InProgress,
            priority: Priority::Medium,
            progress,
            card_color: DEFAULT_CARD_COLOR.into(),
            due_date: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
            estimated_hours,
            time_spent: 0.0,
            actual_hours: None,
            start_date: None,
            last_tracked: None,
            is_tracking: false,
            project_id: None,
            parent_task_id: None,
            dependencies: Vec::new(),
        }
    }

    fn subtasks(task_id: Uuid, done: usize, open: usize) -> Vec<Subtask> {
        let now = Utc::now();
        (0..done + open)
            .map(|i| Subtask {
                id: Uuid::new_v4(),
                task_id,
                title: format!("step {i}"),
                completed: i < done,
                created_at: now,
                completed_at: (i < done).then_some(now),
                order: i as u32,
            })
            .collect()
    }

    fn entry(task_id: Uuid, hours: i64) -> TimeEntry {
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap();
        TimeEntry {
            id: Uuid::new_v4(),
            task_id,
            start_time: start,
            end_time: start + Duration::hours(hours),
            description: None,
        }
    }

    fn no_subtasks() -> Vec<Subtask> {
        Vec::new()
    }

    fn no_entries() -> Vec<TimeEntry> {
        Vec::new()
    }

    #[test]
    fn manual_only_is_thirty_percent_of_manual() {
        let t = task(50, None);
        assert_eq!(weighted_progress(&t, &no_subtasks(), &no_entries()), 15);
    }

    #[test]
    fn half_the_subtasks_done() {
        let t = task(0, None);
        let subs = subtasks(t.id, 2, 2);
        assert_eq!(weighted_progress(&t, &subs, &no_entries()), 20);
    }

    #[test]
    fn half_the_estimate_tracked() {
        let t = task(0, Some(10.0));
        let entries = vec![entry(t.id, 2), entry(t.id, 3)];
        assert_eq!(weighted_progress(&t, &no_subtasks(), &entries), 15);
    }

    #[test]
    fn time_term_needs_an_estimate() {
        let t = task(0, None);
        let entries = vec![entry(t.id, 8)];
        assert_eq!(weighted_progress(&t, &no_subtasks(), &entries), 0);

        let zero = task(0, Some(0.0));
        assert_eq!(weighted_progress(&zero, &no_subtasks(), &entries), 0);
    }

    #[test]
    fn time_term_reads_entries_not_time_spent() {
        let mut t = task(0, Some(10.0));
        t.time_spent = 5.0;
        assert_eq!(weighted_progress(&t, &no_subtasks(), &no_entries()), 0);
        assert_eq!(status_progress(&t), 50);
    }

    #[test]
    fn time_term_caps_at_one_hundred() {
        let t = task(100, Some(1.0));
        let subs = subtasks(t.id, 3, 0);
        let entries = vec![entry(t.id, 40)];
        assert_eq!(weighted_progress(&t, &subs, &entries), 100);
    }

    #[test]
    fn weighted_output_stays_in_range() {
        for manual in [0u8, 1, 33, 50, 99, 100] {
            for (done, open) in [(0, 0), (0, 3), (1, 2), (3, 0)] {
                for hours in [0i64, 1, 5, 50] {
                    let t = task(manual, Some(4.0));
                    let subs = subtasks(t.id, done, open);
                    let entries: Vec<_> = (hours > 0).then(|| entry(t.id, hours)).into_iter().collect();
                    let p = weighted_progress(&t, &subs, &entries);
                    assert!(p <= 100, "{p} out of range");
                }
            }
        }
    }

    #[test]
    fn status_progress_by_status() {
        let mut t = task(10, Some(10.0));
        t.time_spent = 5.0;
        assert_eq!(status_progress(&t), 50);

        t.time_spent = 30.0;
        assert_eq!(status_progress(&t), 99);

        t.status = TaskStatus::Todo;
        assert_eq!(status_progress(&t), 0);

        t.status = TaskStatus::Completed;
        assert_eq!(status_progress(&t), 100);

        let mut no_estimate = task(0, None);
        no_estimate.status = TaskStatus::InProgress;
        assert_eq!(status_progress(&no_estimate), 50);
    }

    #[test]
    fn completed_ignores_everything_else() {
        let mut t = task(0, Some(100.0));
        t.status = TaskStatus::Completed;
        t.time_spent = 1.0;
        assert_eq!(status_progress(&t), 100);
    }

    #[test]
    fn subtask_ratio() {
        let id = Uuid::new_v4();
        assert_eq!(subtask_progress(&subtasks(id, 0, 0)), None);
        assert_eq!(subtask_progress(&subtasks(id, 1, 1)), Some(50));
        assert_eq!(subtask_progress(&subtasks(id, 1, 2)), Some(33));
        assert_eq!(subtask_progress(&subtasks(id, 2, 1)), Some(67));
        assert_eq!(subtask_progress(&subtasks(id, 4, 0)), Some(100));
    }
}
