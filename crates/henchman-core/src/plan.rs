use crate::error::PlanError;
use crate::status::StatusRecord;
use crate::target::Host;
use crate::task::{Task, TaskId, TaskVars};
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::path::Path;

/// What to run, where, and with which variables.
///
/// Hosts, tasks and vars are fixed at construction. The status record is the
/// only part written during a run.
#[derive(Debug)]
pub struct Plan {
    pub name: Option<String>,
    pub hosts: Vec<Host>,
    pub tasks: Vec<Task>,
    pub vars: TaskVars,
    status: StatusRecord,
}

/// On-disk shape of a plan document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PlanFile {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    hosts: Vec<String>,
    #[serde(default)]
    vars: HashMap<String, serde_yaml::Value>,
    #[serde(default)]
    tasks: Vec<TaskEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TaskEntry {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    shell: Option<String>,
    #[serde(default)]
    local_action: bool,
}

impl Plan {
    /// Build a plan in code. Task ids, hosts and var names are validated.
    pub fn new(hosts: Vec<Host>, tasks: Vec<Task>, vars: TaskVars) -> Result<Self, PlanError> {
        let mut seen_tasks = HashSet::new();
        for task in &tasks {
            if !seen_tasks.insert(&task.id) {
                return Err(PlanError::DuplicateTask(task.id.to_string()));
            }
            if task.shell.trim().is_empty() {
                return Err(PlanError::MissingCommand(task.id.to_string()));
            }
        }

        let mut seen_hosts = HashSet::new();
        for host in &hosts {
            if !seen_hosts.insert(host) {
                return Err(PlanError::DuplicateHost(host.to_string()));
            }
        }

        if let Some(bad) = vars.keys().find(|k| !is_var_name(k)) {
            return Err(PlanError::InvalidVarName(bad.clone()));
        }

        Ok(Self {
            name: None,
            hosts,
            tasks,
            vars,
            status: StatusRecord::new(),
        })
    }

    /// Parse a YAML plan. `extra_vars` override the plan's own vars.
    pub fn from_yaml(
        source: &str,
        extra_vars: &TaskVars,
        default_port: u16,
    ) -> Result<Self, PlanError> {
        let file: PlanFile = serde_yaml::from_str(source)?;

        let hosts = file
            .hosts
            .iter()
            .map(|h| Host::parse_with_port(h, default_port))
            .collect::<Result<Vec<_>, _>>()?;

        let tasks = file
            .tasks
            .into_iter()
            .enumerate()
            .map(|(i, entry)| {
                let id = entry
                    .name
                    .filter(|n| !n.trim().is_empty())
                    .map(TaskId::from_string)
                    .unwrap_or_else(|| TaskId::positional(i + 1));
                let shell = entry
                    .shell
                    .ok_or_else(|| PlanError::MissingCommand(id.to_string()))?;
                Ok(Task {
                    id,
                    shell,
                    local_action: entry.local_action,
                })
            })
            .collect::<Result<Vec<_>, PlanError>>()?;

        let mut vars = TaskVars::with_capacity(file.vars.len() + extra_vars.len());
        for (key, value) in file.vars {
            let value = scalar_to_string(&value)
                .ok_or_else(|| PlanError::InvalidVarValue(key.clone()))?;
            vars.insert(key, value);
        }
        vars.extend(extra_vars.iter().map(|(k, v)| (k.clone(), v.clone())));

        let mut plan = Self::new(hosts, tasks, vars)?;
        plan.name = file.name;
        Ok(plan)
    }

    /// Read and parse a plan file.
    pub fn load(path: &Path, extra_vars: &TaskVars, default_port: u16) -> Result<Self, PlanError> {
        let source = std::fs::read_to_string(path).map_err(|source| PlanError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&source, extra_vars, default_port)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn status(&self) -> &StatusRecord {
        &self.status
    }
}

/// Split `"a=x b=y"` into vars. Later pairs win.
pub fn parse_extra_args(args: &str) -> Result<TaskVars, PlanError> {
    let mut vars = TaskVars::new();
    for pair in args.split_whitespace() {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| PlanError::InvalidExtraArg(pair.to_string()))?;
        if key.is_empty() {
            return Err(PlanError::InvalidExtraArg(pair.to_string()));
        }
        vars.insert(key.to_string(), value.to_string());
    }
    Ok(vars)
}

/// Vars are exported to the shell, so names must be identifiers.
fn is_var_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.clone()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const PLAN: &str = r#"
name: deploy
hosts:
  - web1
  - 10.0.0.2:2222
vars:
  env: prod
  replicas: 3
tasks:
  - name: uptime
    shell: uptime
  - shell: echo "$env"
  - name: notify
    shell: echo done
    local_action: true
"#;

    #[test]
    fn parses_plan_document() {
        let plan = Plan::from_yaml(PLAN, &TaskVars::new(), 22).unwrap();
        assert_eq!(plan.name.as_deref(), Some("deploy"));
        assert_eq!(plan.hosts, vec![Host::new("web1", 22), Host::new("10.0.0.2", 2222)]);

        let ids: Vec<_> = plan.tasks.iter().map(|t| t.id.0.as_str()).collect();
        assert_eq!(ids, ["uptime", "task-2", "notify"]);
        assert!(plan.tasks[2].local_action);
        assert!(!plan.tasks[0].local_action);

        assert_eq!(plan.vars["env"], "prod");
        assert_eq!(plan.vars["replicas"], "3");
        assert!(plan.status().is_empty());
    }

    #[test]
    fn extra_vars_override_plan_vars() {
        let extra = parse_extra_args("env=staging region=eu").unwrap();
        let plan = Plan::from_yaml(PLAN, &extra, 22).unwrap();
        assert_eq!(plan.vars["env"], "staging");
        assert_eq!(plan.vars["region"], "eu");
    }

    #[test]
    fn uses_configured_default_port() {
        let plan = Plan::from_yaml("hosts: [web1]\n", &TaskVars::new(), 2200).unwrap();
        assert_eq!(plan.hosts[0].port, 2200);
        assert!(plan.tasks.is_empty());
    }

    #[test]
    fn rejects_duplicate_task_ids() {
        let doc = "tasks:\n  - {name: a, shell: 'true'}\n  - {name: a, shell: 'false'}\n";
        let err = Plan::from_yaml(doc, &TaskVars::new(), 22).unwrap_err();
        assert!(matches!(err, PlanError::DuplicateTask(id) if id == "a"));
    }

    #[test]
    fn rejects_duplicate_hosts() {
        let err = Plan::from_yaml("hosts: [web1, 'web1:22']\n", &TaskVars::new(), 22).unwrap_err();
        assert!(matches!(err, PlanError::DuplicateHost(_)));
    }

    #[test]
    fn rejects_task_without_command() {
        let err = Plan::from_yaml("tasks:\n  - name: empty\n", &TaskVars::new(), 22).unwrap_err();
        assert!(matches!(err, PlanError::MissingCommand(id) if id == "empty"));
    }

    #[test]
    fn rejects_non_identifier_var_names() {
        let err = Plan::from_yaml("vars:\n  bad-name: x\n", &TaskVars::new(), 22).unwrap_err();
        assert!(matches!(err, PlanError::InvalidVarName(_)));

        let extra = parse_extra_args("1st=x").unwrap();
        let err = Plan::from_yaml("hosts: []\n", &extra, 22).unwrap_err();
        assert!(matches!(err, PlanError::InvalidVarName(k) if k == "1st"));
    }

    #[test]
    fn rejects_nested_var_values() {
        let err = Plan::from_yaml("vars:\n  list: [1, 2]\n", &TaskVars::new(), 22).unwrap_err();
        assert!(matches!(err, PlanError::InvalidVarValue(k) if k == "list"));
    }

    #[test]
    fn rejects_unknown_fields() {
        assert!(Plan::from_yaml("hostz: [a]\n", &TaskVars::new(), 22).is_err());
    }

    #[test]
    fn parses_extra_args() {
        assert!(parse_extra_args("").unwrap().is_empty());
        let vars = parse_extra_args("a=x  b=y=z a=w").unwrap();
        assert_eq!(vars["a"], "w");
        assert_eq!(vars["b"], "y=z");
    }

    #[test]
    fn rejects_malformed_extra_args() {
        assert!(matches!(parse_extra_args("novalue"), Err(PlanError::InvalidExtraArg(_))));
        assert!(matches!(parse_extra_args("=x"), Err(PlanError::InvalidExtraArg(_))));
    }

    #[test]
    fn loads_plan_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(PLAN.as_bytes()).unwrap();
        let plan = Plan::load(file.path(), &TaskVars::new(), 22).unwrap();
        assert_eq!(plan.tasks.len(), 3);

        let err = Plan::load(Path::new("/nonexistent/plan.yaml"), &TaskVars::new(), 22).unwrap_err();
        assert!(matches!(err, PlanError::Read { .. }));
    }
}
