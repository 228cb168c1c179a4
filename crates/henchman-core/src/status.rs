use crate::target::Host;
use crate::task::{TaskId, TaskStatus};
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Task results written concurrently by every host worker.
///
/// Two views are kept under one lock: the per-host history in execution
/// order, and an aggregate keyed by task id that holds whichever write was
/// applied last across all hosts.
#[derive(Debug, Default)]
pub struct StatusRecord {
    inner: Mutex<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    by_task: BTreeMap<TaskId, TaskStatus>,
    by_host: BTreeMap<Host, Vec<(TaskId, TaskStatus)>>,
}

impl StatusRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_status(&self, host: &Host, task_id: &TaskId, status: TaskStatus) {
        let mut inner = self.lock();
        inner.by_task.insert(task_id.clone(), status);
        inner
            .by_host
            .entry(host.clone())
            .or_default()
            .push((task_id.clone(), status));
    }

    /// Last applied status per task id. Only meaningful once every worker has been joined.
    pub fn final_statuses(&self) -> BTreeMap<TaskId, TaskStatus> {
        self.lock().by_task.clone()
    }

    /// Each host's results in the order its worker produced them.
    pub fn host_statuses(&self) -> BTreeMap<Host, Vec<(TaskId, TaskStatus)>> {
        self.lock().by_host.clone()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().by_task.is_empty()
    }

    // Every write is a pair of inserts done under the lock, so a poisoned
    // guard still holds consistent data.
    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
