//! Dependency-aware execution of a task graph.
//!
//! The [`Scheduler`] runs a single coordinator loop that owns every task
//! status, the ready queue and the dependency counters. Executor attempts are
//! driven concurrently through a [`FuturesUnordered`] set bounded by the
//! concurrency limit; their results come back to the coordinator, which
//! applies the transition and recomputes readiness in one step. A task is
//! therefore never dispatched twice, and never before all of its
//! dependencies have completed.

mod config;
mod executor;
mod result;
mod retry;

use std::{
    collections::{BTreeMap, HashMap, VecDeque},
    sync::Arc,
    time::Duration,
};

use futures::{stream::FuturesUnordered, StreamExt};
use jiff::Timestamp;
use log::{debug, info, warn};
use tokio_util::sync::CancellationToken;

pub use config::SchedulerConfig;
pub use executor::{DryRunExecutor, StepExecutor, StepOutcome, StepRequest};
pub use result::{RunOutcome, RunResult};
pub use retry::RetryPolicy;

use crate::{
    error::{CairnError, Result},
    graph::TaskGraph,
    models::TaskStatus,
    tracker::StatusTracker,
};

/// Executes task graphs against a [`StepExecutor`].
#[derive(Debug, Clone)]
pub struct Scheduler {
    config: SchedulerConfig,
    cancellation: CancellationToken,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            cancellation: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Token that cancels the run when fired. Clones may be moved to other
    /// tasks.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancellation.clone()
    }

    /// Requests cancellation: nothing new is dispatched, pending tasks are
    /// cancelled, and in-flight results are discarded.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Runs `graph` to a terminal state.
    ///
    /// Task failures do not make this return an error; they are reported
    /// in the [`RunResult`]. Use [`RunResult::ensure_success`] to turn an
    /// unsuccessful run into a [`CairnError`].
    pub async fn run(
        &self,
        graph: TaskGraph,
        executor: Arc<dyn StepExecutor>,
    ) -> Result<RunResult> {
        self.config.validate()?;

        let started_at = Timestamp::now();
        info!(
            "Starting run of plan '{}' version '{}' ({} tasks, {} workers)",
            graph.plan_id(),
            graph.version_id(),
            graph.len(),
            self.config.concurrency_limit
        );

        let mut run = RunState::new(graph, self.config, self.cancellation.clone());
        let mut in_flight = FuturesUnordered::new();
        let mut cancelled = false;

        loop {
            if !cancelled && self.cancellation.is_cancelled() {
                cancelled = true;
                run.cancel_pending()?;
            }

            while !cancelled && !run.halted && in_flight.len() < self.config.concurrency_limit {
                let Some(task_id) = run.ready.pop_front() else {
                    break;
                };
                let request = run.start(&task_id)?;
                in_flight.push(attempt(Arc::clone(&executor), request, None));
            }

            if in_flight.is_empty() {
                break;
            }

            tokio::select! {
                biased;
                _ = self.cancellation.cancelled(), if !cancelled => {
                    warn!(
                        "Run of plan '{}' version '{}' cancelled; {} task(s) in flight",
                        run.graph.plan_id(),
                        run.graph.version_id(),
                        in_flight.len()
                    );
                    cancelled = true;
                    run.cancel_pending()?;
                }
                Some(report) = in_flight.next() => {
                    if let Some((request, delay)) = run.finish(report, cancelled)? {
                        let backoff = Backoff {
                            delay,
                            interrupt: run.halt.clone(),
                        };
                        in_flight.push(attempt(Arc::clone(&executor), request, Some(backoff)));
                    }
                }
            }
        }

        let RunState { graph, tracker, .. } = run;
        let result = RunResult::new(
            graph.plan_id().to_string(),
            graph.version_id().to_string(),
            graph.into_tasks(),
            tracker.into_transitions(),
            cancelled,
            started_at,
        );
        info!(
            "Run of plan '{}' version '{}' finished: {}",
            result.plan_id,
            result.version_id,
            result.outcome.as_str()
        );
        Ok(result)
    }
}

/// What came back from one attempt. `outcome` is `None` when cancellation
/// or a fail-fast halt interrupted the backoff before the executor was
/// called.
struct AttemptReport {
    task_id: String,
    attempt: u32,
    outcome: Option<StepOutcome>,
}

/// Wait before a retry. `interrupt` fires on cancellation and on a
/// fail-fast halt.
struct Backoff {
    delay: Duration,
    interrupt: CancellationToken,
}

async fn attempt(
    executor: Arc<dyn StepExecutor>,
    request: StepRequest,
    backoff: Option<Backoff>,
) -> AttemptReport {
    let task_id = request.task_id.clone();
    let attempt = request.attempt;

    if let Some(Backoff { delay, interrupt }) = backoff {
        tokio::select! {
            biased;
            _ = interrupt.cancelled() => {
                return AttemptReport { task_id, attempt, outcome: None };
            }
            _ = tokio::time::sleep(delay) => {}
        }
    }

    let outcome = executor.execute(request).await;
    AttemptReport {
        task_id,
        attempt,
        outcome: Some(outcome),
    }
}

/// Mutable state of a run, owned by the coordinator loop.
struct RunState {
    graph: TaskGraph,
    tracker: StatusTracker,
    config: SchedulerConfig,
    cancellation: CancellationToken,
    /// Child of `cancellation`, also fired when fail-fast halts the run
    halt: CancellationToken,
    /// Pending tasks whose dependencies have all completed
    ready: VecDeque<String>,
    /// Number of dependencies not yet completed, per executable task
    remaining: HashMap<String, usize>,
    /// Set after a terminal failure under the fail-fast policy
    halted: bool,
}

impl RunState {
    fn new(graph: TaskGraph, config: SchedulerConfig, cancellation: CancellationToken) -> Self {
        let mut ready = VecDeque::new();
        let mut remaining = HashMap::new();
        for task in graph.tasks().filter(|t| t.is_executable()) {
            let count = task.dependency_task_ids.len();
            if count == 0 {
                ready.push_back(task.id.clone());
            }
            remaining.insert(task.id.clone(), count);
        }

        Self {
            graph,
            tracker: StatusTracker::new(),
            config,
            halt: cancellation.child_token(),
            cancellation,
            ready,
            remaining,
            halted: false,
        }
    }

    /// Marks a ready task in progress and builds its first request.
    fn start(&mut self, task_id: &str) -> Result<StepRequest> {
        self.tracker
            .transition(&mut self.graph, task_id, TaskStatus::InProgress)?;
        self.request(task_id, 1)
    }

    fn request(&mut self, task_id: &str, attempt: u32) -> Result<StepRequest> {
        let task = self.graph.task_mut(task_id).ok_or_else(|| unknown_task(task_id))?;
        task.attempt_count = attempt;
        let (step_id, description, dependencies) = (
            task.step_id.clone(),
            task.description.clone(),
            task.dependency_task_ids.clone(),
        );

        let context: BTreeMap<_, _> = dependencies
            .into_iter()
            .filter_map(|dep| {
                let output = self.graph.task(&dep)?.result.clone()?;
                Some((dep, output))
            })
            .collect();

        debug!("Dispatching task '{task_id}' (attempt {attempt})");
        Ok(StepRequest {
            task_id: task_id.to_string(),
            step_id,
            description,
            attempt,
            context,
            cancellation: self.cancellation.clone(),
        })
    }

    /// Applies the outcome of an attempt. Returns the next attempt to run
    /// and its backoff when the task is retried.
    fn finish(
        &mut self,
        report: AttemptReport,
        cancelled: bool,
    ) -> Result<Option<(StepRequest, Duration)>> {
        let AttemptReport {
            task_id,
            attempt,
            outcome,
        } = report;

        let outcome = match outcome {
            Some(outcome) if !cancelled => outcome,
            _ => {
                debug!("Discarding attempt {attempt} of task '{task_id}'");
                self.tracker
                    .transition(&mut self.graph, &task_id, TaskStatus::Cancelled)?;
                return Ok(None);
            }
        };

        if outcome.success {
            self.tracker
                .transition(&mut self.graph, &task_id, TaskStatus::Completed)?;
            if let Some(task) = self.graph.task_mut(&task_id) {
                task.result = Some(outcome.output);
                task.error = None;
            }
            self.release_dependents(&task_id);
            return Ok(None);
        }

        let message = outcome
            .error
            .unwrap_or_else(|| "executor reported failure".to_string());
        if let Some(task) = self.graph.task_mut(&task_id) {
            task.error = Some(message.clone());
        }

        if !self.halted && self.config.retry.should_retry(attempt) {
            let delay = self.config.retry.delay_for(attempt);
            warn!(
                "Task '{task_id}' failed on attempt {attempt}/{}: {message}; retrying in {delay:?}",
                self.config.retry.max_attempts
            );
            let request = self.request(&task_id, attempt + 1)?;
            return Ok(Some((request, delay)));
        }

        warn!("Task '{task_id}' failed after {attempt} attempt(s): {message}");
        self.tracker
            .transition(&mut self.graph, &task_id, TaskStatus::Failed)?;
        self.block_dependents(&task_id)?;

        if !self.config.continue_on_failure && !self.halted {
            warn!("Stopping dispatch after failure of task '{task_id}'");
            self.halted = true;
            self.halt.cancel();
            self.cancel_pending()?;
        }
        Ok(None)
    }

    /// Decrements dependency counters and enqueues dependents that became
    /// ready, all of them at once.
    fn release_dependents(&mut self, task_id: &str) {
        for dependent in self.graph.dependents(task_id).to_vec() {
            let Some(count) = self.remaining.get_mut(&dependent) else {
                continue;
            };
            *count = count.saturating_sub(1);
            let still_pending = self
                .graph
                .task(&dependent)
                .is_some_and(|t| t.status == TaskStatus::Pending);
            if *count == 0 && still_pending && !self.halted {
                debug!("Task '{dependent}' is ready");
                self.ready.push_back(dependent);
            }
        }
    }

    /// Moves every transitive dependent of a failed task to `BLOCKED`.
    fn block_dependents(&mut self, task_id: &str) -> Result<()> {
        let mut stack: Vec<String> = self.graph.dependents(task_id).to_vec();
        while let Some(id) = stack.pop() {
            let pending = self
                .graph
                .task(&id)
                .is_some_and(|t| t.status == TaskStatus::Pending);
            if !pending {
                continue;
            }
            warn!("Blocking task '{id}': upstream task '{task_id}' failed");
            self.tracker
                .transition(&mut self.graph, &id, TaskStatus::Blocked)?;
            stack.extend(self.graph.dependents(&id).iter().cloned());
        }
        Ok(())
    }

    /// Cancels every executable task that has not started yet.
    fn cancel_pending(&mut self) -> Result<()> {
        self.ready.clear();
        let pending: Vec<String> = self
            .graph
            .tasks()
            .filter(|t| t.is_executable() && t.status == TaskStatus::Pending)
            .map(|t| t.id.clone())
            .collect();
        for id in pending {
            self.tracker
                .transition(&mut self.graph, &id, TaskStatus::Cancelled)?;
        }
        Ok(())
    }
}

fn unknown_task(task_id: &str) -> CairnError {
    CairnError::invalid_input("task_id")
        .with_reason(format!("task '{task_id}' is not part of the graph"))
}
