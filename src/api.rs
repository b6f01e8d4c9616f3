use serde::Deserialize;

use crate::error::{Error, ErrorKind};
use crate::tasks::TimeEntry;

/// The base endpoint of the ClickUp REST API.
const BASE_ENDPOINT: &str = "https://api.clickup.com/api/v2";

/// The credentials and identifiers needed to query the time tracking API.
#[derive(Debug, Clone)]
pub struct ClickUpConfig {
    /// The private API key, sent verbatim in the `Authorization` header.
    pub private_key: String,
    /// The team (workspace) whose time entries are queried.
    pub team_id: String,
    /// The user the time entries are assigned to.
    pub user_id: String,
}

/// The wire shape of the time entries endpoint response.
#[derive(Debug, Deserialize)]
struct TimeEntriesResponse {
    data: Vec<TimeEntry>,
}

/// Fetches the billable time entries assigned to the configured user between the
/// two epoch-millisecond bounds. A network failure, a non-2xx status or a body
/// which does not decode to the expected shape all surface as a fetch error; no
/// retry or timeout is applied, a hanging call blocks the run.
pub fn fetch_time_entries(
    config: &ClickUpConfig,
    start_date: i64,
    end_date: i64,
) -> Result<Vec<TimeEntry>, Error> {
    let url = time_entries_url(BASE_ENDPOINT, config, start_date, end_date);

    let client = reqwest::blocking::Client::new();
    let response = client
        .get(&url)
        .header("Authorization", &config.private_key)
        .send()
        .map_err(|error| {
            Error::with_error(ErrorKind::Fetch, "Failed to query the time entries", &error)
        })?
        .error_for_status()
        .map_err(|error| {
            Error::with_error(
                ErrorKind::Fetch,
                "The time entries query was rejected",
                &error,
            )
        })?;

    let body: TimeEntriesResponse = response.json().map_err(|error| {
        Error::with_error(
            ErrorKind::Fetch,
            "Failed to decode the time entries response",
            &error,
        )
    })?;

    Ok(body.data)
}

/// Builds the time entries query URL for the given bounds.
fn time_entries_url(
    base_endpoint: &str,
    config: &ClickUpConfig,
    start_date: i64,
    end_date: i64,
) -> String {
    format!(
        "{}/team/{}/time_entries?assignee={}&start_date={}&end_date={}",
        base_endpoint, config.team_id, config.user_id, start_date, end_date
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_the_time_entries_url_with_all_parameters() {
        let config = ClickUpConfig {
            private_key: "pk_secret".into(),
            team_id: "9001".into(),
            user_id: "42".into(),
        };
        let url = time_entries_url("https://api.clickup.com/api/v2", &config, 100, 200);
        assert_eq!(
            url,
            "https://api.clickup.com/api/v2/team/9001/time_entries?assignee=42&start_date=100&end_date=200"
        );
    }

    #[test]
    fn decodes_the_expected_response_shape() {
        let body = r#"{
            "data": [
                { "task": { "id": "abc1", "name": "Fix the build" }, "start": 1000, "end": 4000 }
            ]
        }"#;
        let response: TimeEntriesResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.data.len(), 1);
        assert_eq!(response.data[0].task.id, "abc1");
        assert_eq!(response.data[0].end - response.data[0].start, 3000);
    }
}
