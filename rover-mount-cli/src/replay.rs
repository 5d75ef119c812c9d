use anyhow::{Context, Result, bail};
use rover_mount::host::Orientation;
use rover_mount::{
    ApplyReport, BridgeEvent, MountConfig, MountingCoordinator, Mutation, RecordingHost, Tag,
    Transaction, TransactionQueue,
};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// A scripted session: transactions from the diff side interleaved with
/// whatever the platform does on its own
#[derive(Debug, Deserialize)]
pub struct ReplayScript {
    #[serde(default = "default_root")]
    pub root: Tag,
    pub steps: Vec<ReplayStep>,
}

fn default_root() -> Tag {
    Tag(1)
}

#[derive(Debug, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum ReplayStep {
    Transaction {
        #[serde(default)]
        revision: u64,
        mutations: Vec<Mutation>,
    },
    /// Finish every pending present/dismiss animation
    CompleteTransitions,
    ExternalDismiss { tag: Tag },
    DismissAttempt { tag: Tag },
    Rotate { tag: Tag, orientation: Orientation },
}

pub struct ReplayOptions {
    pub config: MountConfig,
    /// Apply each transaction as it arrives instead of queueing runs of them
    pub immediate: bool,
}

pub struct ReplayOutcome {
    pub events: Vec<BridgeEvent>,
    pub reports: Vec<ApplyReport>,
    pub tree: String,
}

impl ReplayOutcome {
    pub fn skipped(&self) -> usize {
        self.reports.iter().map(|r| r.skipped).sum()
    }
}

pub fn load_script(path: &Path) -> Result<ReplayScript> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read script: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid replay script: {}", path.display()))
}

pub fn run(script: ReplayScript, options: ReplayOptions) -> Result<ReplayOutcome> {
    let mut config = options.config;
    if options.immediate {
        config.coalesce_transactions = false;
    }
    let (mut coordinator, bridge) = MountingCoordinator::with_recording_host(config, script.root);
    let queue = TransactionQueue::new();
    let mut reports = Vec::new();

    for (index, step) in script.steps.into_iter().enumerate() {
        debug!(index, "replay step");
        match step {
            ReplayStep::Transaction {
                revision,
                mutations,
            } => {
                queue.push(Transaction::with_mutations(revision, mutations));
                if options.immediate {
                    reports.extend(coordinator.drain_queue(&queue));
                }
                continue;
            }
            other => {
                // Platform activity lands between mounting passes
                reports.extend(coordinator.drain_queue(&queue));
                simulate(&mut coordinator, other)?;
            }
        }
        coordinator.pump();
    }
    reports.extend(coordinator.drain_queue(&queue));
    coordinator.pump();

    Ok(ReplayOutcome {
        events: bridge.try_iter().collect(),
        reports,
        tree: coordinator.host().describe(),
    })
}

fn simulate(coordinator: &mut MountingCoordinator<RecordingHost>, step: ReplayStep) -> Result<()> {
    let host = coordinator.host_mut();
    match step {
        ReplayStep::CompleteTransitions => {
            let completed = host.complete_transitions();
            debug!(completed, "transitions completed");
        }
        ReplayStep::ExternalDismiss { tag } => {
            let Some(presentation) = host.presentation_for(tag) else {
                bail!("tag {} has no presentation to dismiss", tag);
            };
            if !host.dismiss_externally(presentation) {
                warn!(%tag, "presentation is not on screen, external dismiss ignored");
            }
        }
        ReplayStep::DismissAttempt { tag } => {
            let Some(presentation) = host.presentation_for(tag) else {
                bail!("tag {} has no presentation", tag);
            };
            if !host.attempt_dismiss(presentation) {
                warn!(%tag, "presentation is not on screen, dismiss attempt ignored");
            }
        }
        ReplayStep::Rotate { tag, orientation } => {
            let Some(presentation) = host.presentation_for(tag) else {
                bail!("tag {} has no presentation", tag);
            };
            if !host.rotate(presentation, orientation) {
                warn!(%tag, ?orientation, "rotation ignored");
            }
        }
        ReplayStep::Transaction { .. } => {}
    }
    Ok(())
}
