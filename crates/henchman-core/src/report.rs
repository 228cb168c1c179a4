use crate::plan::Plan;
use crate::task::{TaskId, TaskStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;

/// Summary of a finished run, built from the plan's status record.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub run_id: String,
    pub plan: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub hosts: Vec<HostReport>,
    /// Number of task runs per status, across all hosts.
    pub counts: BTreeMap<TaskStatus, usize>,
    /// Last applied status per task id.
    pub tasks: BTreeMap<TaskId, TaskStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HostReport {
    pub host: String,
    pub tasks_run: usize,
    pub tasks_total: usize,
    pub failed: bool,
    pub failed_task: Option<TaskId>,
    pub results: Vec<TaskResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TaskResult {
    pub task: TaskId,
    pub status: TaskStatus,
}

impl Report {
    /// Build the report. Call only after the orchestrator has returned.
    pub fn from_plan(plan: &Plan, started_at: DateTime<Utc>) -> Self {
        let mut by_host = plan.status().host_statuses();
        let mut counts = BTreeMap::new();

        // Keep plan order; hosts that never recorded anything still get a row.
        let hosts = plan
            .hosts
            .iter()
            .map(|host| {
                let results: Vec<TaskResult> = by_host
                    .remove(host)
                    .unwrap_or_default()
                    .into_iter()
                    .map(|(task, status)| TaskResult { task, status })
                    .collect();
                for r in &results {
                    *counts.entry(r.status).or_insert(0) += 1;
                }
                let failed_task = results
                    .iter()
                    .find(|r| r.status.is_failure())
                    .map(|r| r.task.clone());
                HostReport {
                    host: host.to_string(),
                    tasks_run: results.len(),
                    tasks_total: plan.tasks.len(),
                    failed: failed_task.is_some(),
                    failed_task,
                    results,
                }
            })
            .collect();

        Self {
            run_id: uuid::Uuid::new_v4().to_string(),
            plan: plan.name.clone(),
            started_at,
            finished_at: Utc::now(),
            hosts,
            counts,
            tasks: plan.status().final_statuses(),
        }
    }

    pub fn any_failed(&self) -> bool {
        self.hosts.iter().any(|h| h.failed)
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }

    /// Plain-text table for the terminal.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let elapsed = self.finished_at - self.started_at;
        out.push_str(&format!(
            "Run {} ({}) finished in {}.{:03}s\n\n",
            self.run_id,
            self.plan.as_deref().unwrap_or("unnamed plan"),
            elapsed.num_seconds(),
            elapsed.num_milliseconds().rem_euclid(1000),
        ));

        out.push_str(&format!("{:<28} {:<8} {:<10} {}\n", "HOST", "RAN", "RESULT", "FAILED TASK"));
        out.push_str(&format!("{}\n", "-".repeat(64)));
        for h in &self.hosts {
            out.push_str(&format!(
                "{:<28} {:<8} {:<10} {}\n",
                h.host,
                format!("{}/{}", h.tasks_run, h.tasks_total),
                if h.failed { "failure" } else { "ok" },
                h.failed_task.as_ref().map(|t| t.to_string()).unwrap_or_else(|| "-".into()),
            ));
        }

        if !self.tasks.is_empty() {
            out.push_str(&format!("\n{:<28} {}\n", "TASK", "STATUS"));
            out.push_str(&format!("{}\n", "-".repeat(64)));
            for (task, status) in &self.tasks {
                out.push_str(&format!("{:<28} {}\n", task, status));
            }
        }

        let counts: Vec<String> = self
            .counts
            .iter()
            .map(|(status, n)| format!("{}={}", status, n))
            .collect();
        if !counts.is_empty() {
            out.push_str(&format!("\n{}\n", counts.join(" ")));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::target::Host;
    use crate::task::{Task, TaskVars};

    fn plan() -> Plan {
        Plan::new(
            vec![Host::new("a", 22), Host::new("b", 22), Host::new("c", 22)],
            vec![Task::new("t1", "true"), Task::new("t2", "false")],
            TaskVars::new(),
        )
        .unwrap()
        .with_name("demo")
    }

    #[test]
    fn summarizes_hosts_in_plan_order() {
        let plan = plan();
        let (a, b) = (Host::new("a", 22), Host::new("b", 22));
        plan.status().record_status(&b, &"t1".into(), TaskStatus::Success);
        plan.status().record_status(&b, &"t2".into(), TaskStatus::Failure);
        plan.status().record_status(&a, &"t1".into(), TaskStatus::Success);
        plan.status().record_status(&a, &"t2".into(), TaskStatus::Success);

        let report = Report::from_plan(&plan, Utc::now());
        let names: Vec<_> = report.hosts.iter().map(|h| h.host.as_str()).collect();
        assert_eq!(names, ["a:22", "b:22", "c:22"]);

        assert!(!report.hosts[0].failed);
        assert_eq!(report.hosts[1].failed_task, Some(TaskId::from("t2")));
        assert_eq!(report.hosts[2].tasks_run, 0);
        assert_eq!(report.hosts[2].tasks_total, 2);

        assert_eq!(report.counts[&TaskStatus::Success], 3);
        assert_eq!(report.counts[&TaskStatus::Failure], 1);
        assert_eq!(report.tasks[&TaskId::from("t2")], TaskStatus::Success);
        assert!(report.any_failed());
    }

    #[test]
    fn renders_table_and_json() {
        let plan = plan();
        plan.status().record_status(&Host::new("a", 22), &"t1".into(), TaskStatus::Success);
        let report = Report::from_plan(&plan, Utc::now());

        let text = report.render();
        assert!(text.contains("demo"));
        assert!(text.contains("a:22"));
        assert!(text.contains("1/2"));
        assert!(text.contains("success=1"));

        let json = report.to_json();
        assert_eq!(json["plan"], "demo");
        assert_eq!(json["tasks"]["t1"], "success");
        assert_eq!(json["hosts"][0]["results"][0]["status"], "success");
    }

    #[test]
    fn empty_plan_has_empty_report() {
        let plan = Plan::new(vec![], vec![], TaskVars::new()).unwrap();
        let report = Report::from_plan(&plan, Utc::now());
        assert!(report.hosts.is_empty());
        assert!(report.tasks.is_empty());
        assert!(!report.any_failed());
    }
}
