//! Mock Queue Client for Testing
//!
//! In-memory implementation of the `QueueClient` trait with per-tube scripts
//! for ready-job ages, reserve races, and failures. Calls are recorded so
//! tests can assert the exact command sequence.

use async_trait::async_trait;
use beanstalk_check::{
    CheckError, CheckResult, Job, JobState, JobStats, PeekReady, QueueClient,
};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

/// Scripted behaviour of one tube
#[derive(Debug, Clone, Default)]
pub struct MockTube {
    /// Age of the oldest ready job; `None` means the tube has no ready jobs
    pub ready_age: Option<f64>,
    /// Stats reads that report the job as reserved before a ready read succeeds
    pub reserve_races: u32,
    /// Stats reads that report the job as vanished before the reserved ones
    pub vanish_races: u32,
    pub select_error: Option<String>,
    pub peek_error: Option<String>,
    pub stats_error: Option<String>,
}

/// Mock state shared between the client and the test
#[derive(Debug, Default)]
pub struct MockQueueState {
    pub tubes: BTreeMap<String, MockTube>,
    pub list_error: Option<String>,
    pub active_tube: String,
    pub calls: Vec<String>,
    next_job_id: u64,
    job_tubes: BTreeMap<u64, String>,
}

/// Mock queue client
#[derive(Debug, Clone, Default)]
pub struct MockQueueClient {
    state: Arc<Mutex<MockQueueState>>,
}

impl MockQueueClient {
    pub fn new() -> Self {
        let client = Self::default();
        client.state.lock().unwrap().active_tube = "default".to_string();
        client
    }

    /// Add a tube whose oldest ready job has the given age
    pub fn with_tube(self, name: &str, ready_age: Option<f64>) -> Self {
        self.state.lock().unwrap().tubes.insert(
            name.to_string(),
            MockTube {
                ready_age,
                ..Default::default()
            },
        );
        self
    }

    /// Adjust the script of an existing tube
    pub fn configure_tube(self, name: &str, configure: impl FnOnce(&mut MockTube)) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let tube = state.tubes.entry(name.to_string()).or_default();
            configure(tube);
        }
        self
    }

    pub fn with_list_error(self, message: &str) -> Self {
        self.state.lock().unwrap().list_error = Some(message.to_string());
        self
    }

    /// Commands issued so far, e.g. `use jobs`, `peek-ready`, `stats-job 1`
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count_calls(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

#[async_trait]
impl QueueClient for MockQueueClient {
    async fn list_tubes(&mut self) -> CheckResult<Vec<String>> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("list-tubes".to_string());
        if let Some(message) = &state.list_error {
            return Err(CheckError::list_tubes(message.clone()));
        }
        Ok(state.tubes.keys().cloned().collect())
    }

    async fn use_tube(&mut self, tube: &str) -> CheckResult<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("use {tube}"));
        if let Some(message) = state.tubes.get(tube).and_then(|t| t.select_error.clone()) {
            return Err(CheckError::select_tube(tube, message));
        }
        state.active_tube = tube.to_string();
        Ok(())
    }

    async fn peek_ready(&mut self) -> CheckResult<PeekReady> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("peek-ready".to_string());
        let active = state.active_tube.clone();
        let tube = state.tubes.get(&active).cloned().unwrap_or_default();

        if let Some(message) = tube.peek_error {
            return Err(CheckError::peek(active, message));
        }
        if tube.ready_age.is_none() {
            return Ok(PeekReady::Empty);
        }

        state.next_job_id += 1;
        let id = state.next_job_id;
        state.job_tubes.insert(id, active);
        Ok(PeekReady::Found(Job::new(id, format!("job-{id}"))))
    }

    async fn stats_job(&mut self, job_id: u64) -> CheckResult<JobStats> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("stats-job {job_id}"));
        let Some(tube_name) = state.job_tubes.get(&job_id).cloned() else {
            return Err(CheckError::JobVanished { job_id });
        };
        let Some(tube) = state.tubes.get_mut(&tube_name) else {
            return Err(CheckError::JobVanished { job_id });
        };

        if tube.vanish_races > 0 {
            tube.vanish_races -= 1;
            return Err(CheckError::JobVanished { job_id });
        }
        if tube.reserve_races > 0 {
            tube.reserve_races -= 1;
            return Ok(JobStats::new(job_id, JobState::Reserved, 0.0));
        }
        if let Some(message) = &tube.stats_error {
            return Err(CheckError::stats_fetch(job_id, message.clone()));
        }

        let mut stats = JobStats::new(job_id, JobState::Ready, tube.ready_age.unwrap_or(0.0));
        stats.tube = tube_name;
        Ok(stats)
    }
}
