use crate::tasks::Task;
use crate::utils::shorten_string;

/// How many tasks get their own line on the invoice. Tasks beyond this cap are
/// collapsed into a single summary line, because a one-page document has no room
/// for an unbounded table.
pub const VISIBLE_TASK_LIMIT: usize = 18;

/// Task names longer than this are truncated with an ellipsis in the description
/// column so the hours column never gets overrun.
const TASK_NAME_LIMIT: usize = 40;

/// Where a task description link points to in the source tracking system.
const TASK_URL_BASE: &str = "https://app.clickup.com/t";

/// The billing rate configuration, supplied once from the environment.
#[derive(Debug, Clone)]
pub struct SalaryConfig {
    /// The currency code appended verbatim to amounts, e.g. `CZK`.
    pub currency: String,
    /// The hourly rate in that currency.
    pub per_hour: f64,
}

/// The grand totals of an invoice, already rounded for display.
#[derive(Debug, Clone, PartialEq)]
pub struct TotalSummary {
    pub total_hours: f64,
    pub total_amount: f64,
}

/// One row of the invoice task table: a description (optionally clickable), the
/// displayed hours and the line amount derived from them.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceLine {
    pub label: String,
    pub url: Option<String>,
    /// Hours rounded to 2 decimals, exactly as displayed.
    pub hours: f64,
    /// The line amount. This deliberately multiplies the *rounded* hours by the
    /// rate so the displayed amount always agrees with the displayed hours.
    pub amount: f64,
}

/// Converts a duration in milliseconds to hours at full precision.
pub fn millis_to_hours(milliseconds: i64) -> f64 {
    milliseconds as f64 / 3_600_000.0
}

/// Rounds to 2 decimal places, half away from zero.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Builds the displayable task table rows from the aggregated tasks. The first
/// `VISIBLE_TASK_LIMIT` tasks each get a linked line; any remaining tasks are
/// summarized as one `and N more` line whose hours are the full-precision sum of
/// the overflowed tasks' hours, rounded only at this point. Rounding each
/// overflowed task first and summing afterwards would compound the rounding
/// error, so the intermediate sum stays unrounded.
pub fn invoice_lines(tasks: &[Task], salary: &SalaryConfig) -> Vec<InvoiceLine> {
    let mut lines: Vec<InvoiceLine> = tasks
        .iter()
        .take(VISIBLE_TASK_LIMIT)
        .map(|task| {
            let hours = round2(millis_to_hours(task.time));
            InvoiceLine {
                label: format!("[{}] {}", task.id, shorten_string(&task.name, TASK_NAME_LIMIT)),
                url: Some(format!("{}/{}", TASK_URL_BASE, task.id)),
                hours,
                amount: hours * salary.per_hour,
            }
        })
        .collect();

    let overflowed = &tasks[tasks.len().min(VISIBLE_TASK_LIMIT)..];
    if !overflowed.is_empty() {
        let hours = round2(
            overflowed
                .iter()
                .map(|task| millis_to_hours(task.time))
                .sum(),
        );
        lines.push(InvoiceLine {
            label: format!("and {} more", overflowed.len()),
            url: None,
            hours,
            amount: hours * salary.per_hour,
        });
    }

    lines
}

/// Computes the grand totals over *all* tasks, including the overflowed ones.
/// The hours are summed at full precision and rounded once at the end, then the
/// amount is derived from the rounded total so it matches the displayed hours.
pub fn total_summary(tasks: &[Task], salary: &SalaryConfig) -> TotalSummary {
    let total_hours = round2(
        tasks
            .iter()
            .map(|task| millis_to_hours(task.time))
            .sum(),
    );

    TotalSummary {
        total_hours,
        total_amount: total_hours * salary.per_hour,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str, time: i64) -> Task {
        Task {
            id: id.into(),
            name: format!("Task {id}"),
            time,
        }
    }

    fn salary() -> SalaryConfig {
        SalaryConfig {
            currency: "CZK".into(),
            per_hour: 500.0,
        }
    }

    #[test]
    fn rounds_half_away_from_zero_to_two_decimals() {
        assert_eq!(round2(0.5025), 0.5);
        assert_eq!(round2(1.5075), 1.51);
        assert_eq!(round2(-0.005), -0.01);
        assert_eq!(round2(1.0), 1.0);
    }

    #[test]
    fn every_task_under_the_cap_gets_its_own_linked_line() {
        let tasks = vec![task("a", 3_600_000), task("b", 1_800_000)];
        let lines = invoice_lines(&tasks, &salary());

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].label, "[a] Task a");
        assert_eq!(
            lines[0].url.as_deref(),
            Some("https://app.clickup.com/t/a")
        );
        assert_eq!(lines[0].hours, 1.0);
        assert_eq!(lines[0].amount, 500.0);
        assert_eq!(lines[1].hours, 0.5);
        assert_eq!(lines[1].amount, 250.0);
    }

    #[test]
    fn tasks_beyond_the_cap_collapse_into_one_summary_line() {
        // 20 tasks of half an hour each, two of them beyond the cap
        let tasks: Vec<Task> = (0..20)
            .map(|index| task(&format!("t{index}"), 1_800_000))
            .collect();
        let lines = invoice_lines(&tasks, &salary());

        assert_eq!(lines.len(), VISIBLE_TASK_LIMIT + 1);
        let summary = lines.last().unwrap();
        assert_eq!(summary.label, "and 2 more");
        assert_eq!(summary.url, None);
        assert_eq!(summary.hours, 1.0);
        assert_eq!(summary.amount, 500.0);
    }

    #[test]
    fn overflow_hours_are_summed_before_rounding() {
        // 19 overflowed tasks of 1,809,000 ms are 0.5025 h each: rounding each to
        // 0.50 first would give 9.50, while the true sum 9.5475 rounds to 9.55
        let tasks: Vec<Task> = (0..VISIBLE_TASK_LIMIT + 19)
            .map(|index| task(&format!("t{index}"), 1_809_000))
            .collect();
        let lines = invoice_lines(&tasks, &salary());

        let summary = lines.last().unwrap();
        assert_eq!(summary.label, "and 19 more");
        assert_eq!(summary.hours, 9.55);
    }

    #[test]
    fn grand_total_sums_unrounded_hours_then_rounds_once() {
        // Three tasks of 1,809,000 ms: individually rounded hours are 0.50 each
        // (summing to 1.50) but the true sum 1.5075 rounds to 1.51
        let tasks: Vec<Task> = (0..3).map(|index| task(&format!("t{index}"), 1_809_000)).collect();
        let summary = total_summary(&tasks, &salary());

        let rounded_then_summed: f64 = tasks
            .iter()
            .map(|task| round2(millis_to_hours(task.time)))
            .sum();
        assert_eq!(rounded_then_summed, 1.5);
        assert_eq!(summary.total_hours, 1.51);
        assert_eq!(summary.total_amount, 755.0);
    }

    #[test]
    fn reference_two_task_scenario() {
        let tasks = vec![task("a", 3_600_000), task("b", 1_800_000)];
        let summary = total_summary(&tasks, &salary());

        assert_eq!(summary.total_hours, 1.5);
        assert_eq!(summary.total_amount, 750.0);
    }

    #[test]
    fn empty_task_list_totals_to_zero() {
        let summary = total_summary(&[], &salary());
        assert_eq!(summary.total_hours, 0.0);
        assert_eq!(summary.total_amount, 0.0);
    }

    #[test]
    fn negative_task_time_produces_negative_hours_and_amount() {
        let tasks = vec![task("a", -1_800_000)];
        let lines = invoice_lines(&tasks, &salary());
        assert_eq!(lines[0].hours, -0.5);
        assert_eq!(lines[0].amount, -250.0);
    }
}
