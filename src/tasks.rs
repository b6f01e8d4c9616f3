use serde::Deserialize;
use std::collections::HashMap;

/// A reference to a task as it appears inside a raw time entry.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskReference {
    pub id: String,
    pub name: String,
}

/// One raw start/end timestamp pair attributed to a task, as returned by the time
/// tracking API. Both timestamps are epoch milliseconds. `end >= start` is assumed
/// and not validated: an entry violating it contributes a negative duration to its
/// task total, which is preserved as-is (a known data quality gap, clamping would
/// silently change totals).
#[derive(Debug, Clone, Deserialize)]
pub struct TimeEntry {
    pub task: TaskReference,
    pub start: i64,
    pub end: i64,
}

/// A unit of tracked work with its aggregated total duration in milliseconds.
/// Identity is the external task id; produced by `aggregate` and consumed
/// read-only by rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub time: i64,
}

/// Groups raw time entries by task id, summing `end - start` into each task's
/// total time. The task name is taken from the first encountered entry with that
/// id; later entries with a differing name do not update it. The result holds
/// exactly one task per distinct id and is sorted by descending time, with ties
/// keeping their first-encounter order. An empty input yields an empty vector.
pub fn aggregate(entries: &[TimeEntry]) -> Vec<Task> {
    let mut tasks: Vec<Task> = Vec::new();
    let mut index_by_id: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        let duration = entry.end - entry.start;
        match index_by_id.get(&entry.task.id) {
            Some(&index) => tasks[index].time += duration,
            None => {
                index_by_id.insert(entry.task.id.clone(), tasks.len());
                tasks.push(Task {
                    id: entry.task.id.clone(),
                    name: entry.task.name.clone(),
                    time: duration,
                });
            }
        }
    }

    // `sort_by` is stable, so equal times keep their encounter order
    tasks.sort_by(|left, right| right.time.cmp(&left.time));

    tasks
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, name: &str, start: i64, end: i64) -> TimeEntry {
        TimeEntry {
            task: TaskReference {
                id: id.into(),
                name: name.into(),
            },
            start,
            end,
        }
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert!(aggregate(&[]).is_empty());
    }

    #[test]
    fn sums_durations_per_task_id() {
        let tasks = aggregate(&[
            entry("a", "First", 0, 1_000),
            entry("b", "Second", 0, 5_000),
            entry("a", "First", 10_000, 12_500),
        ]);

        assert_eq!(tasks.len(), 2);
        assert_eq!(tasks[0].id, "b");
        assert_eq!(tasks[0].time, 5_000);
        assert_eq!(tasks[1].id, "a");
        assert_eq!(tasks[1].time, 3_500);
    }

    #[test]
    fn first_encountered_name_wins() {
        let tasks = aggregate(&[
            entry("a", "Original name", 0, 1_000),
            entry("a", "Renamed later", 1_000, 2_000),
        ]);

        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].name, "Original name");
    }

    #[test]
    fn sorts_descending_with_stable_ties() {
        let tasks = aggregate(&[
            entry("small", "Small", 0, 100),
            entry("tied-first", "Tied first", 0, 500),
            entry("tied-second", "Tied second", 0, 500),
            entry("big", "Big", 0, 900),
        ]);

        let ids: Vec<&str> = tasks.iter().map(|task| task.id.as_str()).collect();
        assert_eq!(ids, vec!["big", "tied-first", "tied-second", "small"]);
    }

    #[test]
    fn aggregation_is_idempotent_on_single_entry_tasks() {
        let first = aggregate(&[
            entry("a", "First", 0, 4_000),
            entry("b", "Second", 0, 2_000),
        ]);
        let as_entries: Vec<TimeEntry> = first
            .iter()
            .map(|task| entry(&task.id, &task.name, 0, task.time))
            .collect();
        let second = aggregate(&as_entries);

        assert_eq!(first, second);
    }

    #[test]
    fn negative_durations_are_preserved_not_clamped() {
        let tasks = aggregate(&[entry("a", "Backwards", 5_000, 2_000)]);
        assert_eq!(tasks[0].time, -3_000);
    }
}
