//! Container status collection
//!
//! Runs `ps --format json` for one compose file and folds the
//! newline-delimited records into a per-service summary. This path never
//! fails outward: anything that goes wrong degrades to the zero summary.

use super::executor::Executor;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;
use tracing::debug;

/// Wall-clock bound for the read-only status query
pub const STATUS_TIMEOUT: Duration = Duration::from_secs(30);

/// Status of one known container
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContainerStatus {
    pub name: String,
    pub container_id: Option<String>,
    /// Lower-cased state ("running", "exited", ...)
    pub state: String,
    /// Free-form human text ("Up 2 hours")
    pub status: String,
    pub health: Option<String>,
}

/// Running/total counts plus the per-service mapping
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusSummary {
    pub services: BTreeMap<String, ContainerStatus>,
    pub summary: StatusCounts,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatusCounts {
    pub running: usize,
    pub total: usize,
}

/// One line of `ps --format json` output. Field names vary between the
/// plugin and the legacy binary, so identity fields carry aliases and
/// everything is optional.
#[derive(Debug, Deserialize)]
struct PsRecord {
    #[serde(rename = "Service")]
    service: Option<String>,
    #[serde(rename = "Name")]
    name: Option<String>,
    #[serde(rename = "State")]
    state: Option<String>,
    #[serde(rename = "Status")]
    status: Option<String>,
    #[serde(rename = "ID", alias = "Id")]
    id: Option<String>,
    #[serde(rename = "Health")]
    health: Option<String>,
}

/// Container status collector
#[derive(Debug, Clone)]
pub struct StatusCollector {
    executor: Executor,
}

impl StatusCollector {
    pub fn new(executor: Executor) -> Self {
        Self {
            executor: executor.with_timeout(STATUS_TIMEOUT),
        }
    }

    /// Query container status for one compose file. Never fails: spawn
    /// errors, timeouts, non-zero exits, and garbage output all collapse
    /// into the empty summary.
    pub async fn collect(&self, file: &Path) -> StatusSummary {
        let result = match self
            .executor
            .run_args(file, &["ps", "--format", "json"])
            .await
        {
            Ok(result) => result,
            Err(e) => {
                debug!("Status query failed for {}: {}", file.display(), e);
                return StatusSummary::default();
            }
        };

        if !result.success {
            debug!(
                "Status query exited {:?} for {}",
                result.exit_code,
                file.display()
            );
            return StatusSummary::default();
        }

        parse_status_output(&result.stdout)
    }
}

/// Fold newline-delimited JSON records into a summary. Malformed lines
/// are skipped; well-formed lines around them still count.
pub fn parse_status_output(output: &str) -> StatusSummary {
    let mut summary = StatusSummary::default();

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let record: PsRecord = match serde_json::from_str(line) {
            Ok(record) => record,
            Err(_) => continue,
        };

        let name = match record.service.or(record.name) {
            Some(name) => name,
            None => continue,
        };

        let state = record.state.unwrap_or_default().to_lowercase();
        if state == "running" {
            summary.summary.running += 1;
        }
        summary.summary.total += 1;

        summary.services.insert(
            name.clone(),
            ContainerStatus {
                name,
                container_id: record.id,
                state,
                status: record.status.unwrap_or_default(),
                health: record.health,
            },
        );
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_and_exited_counts() {
        let output = concat!(
            r#"{"Service":"web","State":"running","Status":"Up 2 hours","ID":"abc123"}"#,
            "\n",
            r#"{"Service":"db","State":"exited","Status":"Exited (0) 1 hour ago","ID":"def456"}"#,
            "\n",
        );

        let summary = parse_status_output(output);

        assert_eq!(summary.summary.running, 1);
        assert_eq!(summary.summary.total, 2);
        assert_eq!(summary.services["web"].state, "running");
        assert_eq!(summary.services["db"].state, "exited");
        assert_eq!(summary.services["web"].container_id.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let output = concat!(
            r#"{"Service":"web","State":"running"}"#,
            "\n",
            "this is not json\n",
            r#"{"Service":"db","State":"running"}"#,
            "\n",
        );

        let summary = parse_status_output(output);
        assert_eq!(summary.summary.running, 2);
        assert_eq!(summary.summary.total, 2);
    }

    #[test]
    fn test_empty_output_is_the_zero_summary() {
        let summary = parse_status_output("");
        assert!(summary.services.is_empty());
        assert_eq!(summary.summary.running, 0);
        assert_eq!(summary.summary.total, 0);

        let summary = parse_status_output("\n\n   \n");
        assert_eq!(summary.summary.total, 0);
    }

    #[test]
    fn test_name_falls_back_when_service_is_absent() {
        let output = r#"{"Name":"myapp-web-1","State":"Running","Id":"0a1b"}"#;

        let summary = parse_status_output(output);
        let status = &summary.services["myapp-web-1"];
        // State comparison and storage are lower-cased
        assert_eq!(status.state, "running");
        assert_eq!(status.container_id.as_deref(), Some("0a1b"));
        assert_eq!(summary.summary.running, 1);
    }

    #[test]
    fn test_health_is_carried_through() {
        let output = r#"{"Service":"web","State":"running","Health":"healthy"}"#;
        let summary = parse_status_output(output);
        assert_eq!(summary.services["web"].health.as_deref(), Some("healthy"));
    }

    #[tokio::test]
    async fn test_collect_never_fails_without_a_cli() {
        // No compose binary, nonexistent file: still the zero summary.
        let collector = StatusCollector::new(Executor::new(true, false));
        let summary = collector
            .collect(Path::new("/nonexistent/docker-compose.yml"))
            .await;
        assert_eq!(summary.summary.total, 0);
    }
}
