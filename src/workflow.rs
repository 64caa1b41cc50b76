//! Runs the setup steps in order, resuming from the checkpoint.

use thiserror::Error;
use tracing::{error, info};

use crate::{
    chain::{ChainClients, ChildChain, ParentChain},
    config::Settings,
    error::{Result, SetupError},
    state::{CheckpointStore, RuntimeState},
    step::Step,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepStatus {
    Pending,
    /// Held only while the step runs. A returned report never contains it:
    /// the step ends as `Done` or `Failed` first.
    InProgress,
    Done,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepReport {
    pub step: Step,
    pub status: StepStatus,
    /// Done by an earlier run, nothing was sent this time.
    pub resumed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub state: RuntimeState,
    pub steps: Vec<StepReport>,
}

/// A run that stopped at `step`. `state` is what was persisted: the failed
/// step and everything after it are still pending.
#[derive(Debug, Error)]
#[error("step `{step}` failed")]
pub struct WorkflowAbort {
    pub step: Step,
    pub state: RuntimeState,
    pub steps: Vec<StepReport>,
    #[source]
    pub error: SetupError,
}

/// Checks both RPC endpoints point at the configured chains.
pub async fn preflight<P, C>(clients: &ChainClients<P, C>, settings: &Settings) -> Result<()>
where
    P: ParentChain,
    C: ChildChain,
{
    let parent = clients.parent.chain_id().await?;
    if parent != settings.setup.parent_chain_id {
        return Err(SetupError::NetworkMismatch {
            chain: "parent",
            expected: settings.setup.parent_chain_id,
            actual: parent,
        });
    }
    let child = clients.child.chain_id().await?;
    if child != settings.setup.chain_id {
        return Err(SetupError::NetworkMismatch {
            chain: "child",
            expected: settings.setup.chain_id,
            actual: child,
        });
    }
    Ok(())
}

pub struct Workflow<'a, P, C> {
    clients: &'a ChainClients<P, C>,
    settings: &'a Settings,
    store: CheckpointStore,
    steps: Vec<Step>,
}

impl<'a, P, C> Workflow<'a, P, C>
where
    P: ParentChain,
    C: ChildChain,
{
    pub fn new(clients: &'a ChainClients<P, C>, settings: &'a Settings) -> Self {
        Self {
            clients,
            settings,
            store: CheckpointStore::new(&settings.checkpoint_path),
            steps: Step::all(),
        }
    }

    pub fn with_steps(mut self, steps: Vec<Step>) -> Self {
        self.steps = steps;
        self
    }

    pub fn store(&self) -> &CheckpointStore {
        &self.store
    }

    /// The checkpoint for the configured child chain.
    pub fn load_state(&self) -> Result<RuntimeState> {
        self.store.load(self.settings.setup.chain_id)
    }

    /// Runs every step `state` does not already mark as done.
    ///
    /// The state is saved after each completed step and again when a step
    /// fails, so the next run starts at the first step that has not finished.
    pub async fn run(
        &self,
        mut state: RuntimeState,
    ) -> std::result::Result<RunReport, WorkflowAbort> {
        let mut reports: Vec<StepReport> = self
            .steps
            .iter()
            .map(|step| StepReport {
                step: *step,
                status: StepStatus::Pending,
                resumed: false,
            })
            .collect();

        for (index, step) in self.steps.iter().enumerate() {
            if step.is_done(&state) {
                info!(%step, "already done, skipping");
                reports[index].status = StepStatus::Done;
                reports[index].resumed = true;
                continue;
            }

            info!(%step, "running");
            reports[index].status = StepStatus::InProgress;

            if let Err(err) = step.run(self.clients, self.settings).await {
                reports[index].status = StepStatus::Failed;
                error!(%step, error = %err, "step failed");
                self.save_after_failure(&state);
                return Err(WorkflowAbort {
                    step: *step,
                    state,
                    steps: reports,
                    error: err,
                });
            }

            step.mark_done(&mut state);
            reports[index].status = StepStatus::Done;
            if let Err(err) = self.store.save(&state) {
                error!(%step, error = %err, "step completed but its progress could not be saved");
                return Err(WorkflowAbort {
                    step: *step,
                    state,
                    steps: reports,
                    error: err,
                });
            }
            info!(%step, "done");
        }

        Ok(RunReport {
            state,
            steps: reports,
        })
    }

    fn save_after_failure(&self, state: &RuntimeState) {
        match self.store.save(state) {
            Ok(()) => info!(
                path = %self.store.path().display(),
                "progress recorded, rerunning will resume from the failed step"
            ),
            Err(err) => error!(error = %err, "progress could not be recorded"),
        }
    }
}
