//! Batch-parallel lifecycle orchestration
//!
//! The orchestrator walks the execution plan batch by batch. Batches
//! are the only synchronization: every package in a batch has all of
//! its dependencies described in earlier batches, so packages within a
//! batch run concurrently, bounded by a worker semaphore around the
//! external source and build phases. A failed package is recorded and
//! every transitive dependent is skipped, never attempted.

use std::sync::Arc;
use std::time::Instant;

use dashmap::DashMap;
use futures::future::join_all;
use tokio::sync::{watch, Semaphore};

use mason_errors::{Error, LifecycleError};
use mason_events::{AppEvent, EventEmitter, EventSender, LifecycleEvent, ResolverEvent};
use mason_resolver::{validate, ExecutionPlan, ResolvedGraph, ResolvedNode};
use mason_types::{BuildReport, FailedPackage, Settings};

use crate::collaborators::{Installer, SourceFetcher, ToolchainRunner};
use crate::descriptor::{describe, CapabilityDescriptor};
use crate::phase::{Phase, PhaseSequence};

/// Outcome of one node, used for skip propagation.
#[derive(Debug, Clone, PartialEq, Eq)]
enum NodeOutcome {
    Described,
    Failed,
    Skipped,
}

impl NodeOutcome {
    fn blocks_dependents(&self) -> bool {
        matches!(self, NodeOutcome::Failed | NodeOutcome::Skipped)
    }
}

/// Drives resolved nodes through the build lifecycle.
pub struct Orchestrator {
    fetcher: Arc<dyn SourceFetcher>,
    runner: Arc<dyn ToolchainRunner>,
    installer: Arc<dyn Installer>,
    workers: usize,
    fail_fast: bool,
    events: Option<EventSender>,
    cancel: Option<watch::Receiver<bool>>,
}

impl EventEmitter for Orchestrator {
    fn event_sender(&self) -> Option<&EventSender> {
        self.events.as_ref()
    }
}

impl Orchestrator {
    pub fn new(
        fetcher: Arc<dyn SourceFetcher>,
        runner: Arc<dyn ToolchainRunner>,
        installer: Arc<dyn Installer>,
    ) -> Self {
        Self {
            fetcher,
            runner,
            installer,
            workers: 4,
            fail_fast: false,
            events: None,
            cancel: None,
        }
    }

    /// Bound on concurrently executing external phases.
    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Stop scheduling new batches after the first failure.
    #[must_use]
    pub fn with_fail_fast(mut self, fail_fast: bool) -> Self {
        self.fail_fast = fail_fast;
        self
    }

    #[must_use]
    pub fn with_events(mut self, sender: EventSender) -> Self {
        self.events = Some(sender);
        self
    }

    /// Cooperative cancellation: send `true` on the paired sender to
    /// stop after in-flight collaborator calls complete.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().is_some_and(|rx| *rx.borrow())
    }

    /// Run the full lifecycle over a resolved graph.
    ///
    /// The validation gate runs first; on any failure no phase beyond
    /// `Validated` executes and the run aborts with
    /// `LifecycleError::ValidationRejected`.
    ///
    /// # Errors
    ///
    /// Returns `ValidationRejected` for rejected configurations and
    /// `Error::Cancelled` when cancellation stopped the run. Per-node
    /// lifecycle failures do not abort the run; they are reported in
    /// the returned `BuildReport`.
    pub async fn run(
        &self,
        graph: &ResolvedGraph,
        settings: &Settings,
    ) -> Result<BuildReport, Error> {
        let start = Instant::now();
        self.emit_operation_started(format!("build {}", graph.root_name()));

        let failures = validate(graph, settings);
        if !failures.is_empty() {
            for failure in &failures {
                self.emit(AppEvent::Resolver(ResolverEvent::ValidationFailed {
                    package: failure.package.clone(),
                    message: failure.message.clone(),
                }));
            }
            self.emit_operation_completed(format!("build {}", graph.root_name()), false);
            return Err(LifecycleError::ValidationRejected {
                failures: failures.iter().map(ToString::to_string).collect(),
            }
            .into());
        }

        let plan = ExecutionPlan::from_graph(graph)?;
        let semaphore = Arc::new(Semaphore::new(self.workers));
        let descriptors: DashMap<String, CapabilityDescriptor> = DashMap::new();
        let outcomes: DashMap<String, NodeOutcome> = DashMap::new();

        let mut report = BuildReport::default();
        let mut cancelled = false;

        'batches: for batch in plan.batches() {
            if self.is_cancelled() {
                cancelled = true;
                break;
            }
            if self.fail_fast && !report.failed.is_empty() {
                break 'batches;
            }

            let mut scheduled = Vec::new();
            for name in batch {
                let node = graph.get(name).expect("plan names come from the graph");

                // A dependent of a failed or skipped package is skipped,
                // never attempted.
                let blocked_on = node.deps.iter().find(|dep| {
                    outcomes
                        .get(dep.as_str())
                        .is_some_and(|outcome| outcome.blocks_dependents())
                });
                if let Some(dependency) = blocked_on {
                    outcomes.insert(name.clone(), NodeOutcome::Skipped);
                    report.skipped.push(name.clone());
                    self.emit(AppEvent::Lifecycle(LifecycleEvent::PackageSkipped {
                        package: name.clone(),
                        failed_dependency: dependency.clone(),
                    }));
                    continue;
                }

                scheduled.push((name.clone(), self.run_node(node, &semaphore, &descriptors)));
            }

            let (names, futures): (Vec<_>, Vec<_>) = scheduled.into_iter().unzip();
            for (name, result) in names.into_iter().zip(join_all(futures).await) {
                match result {
                    Ok(descriptor) => {
                        report.described.push(descriptor.package.clone());
                        descriptors.insert(name.clone(), descriptor);
                        outcomes.insert(name, NodeOutcome::Described);
                    }
                    Err((_, Error::Cancelled)) => {
                        // Discarded: not yet packaged when cancellation hit.
                        cancelled = true;
                    }
                    Err((phase, error)) => {
                        outcomes.insert(name.clone(), NodeOutcome::Failed);
                        report.failed.push(FailedPackage {
                            name,
                            phase: phase.to_string(),
                            error: error.to_string(),
                        });
                    }
                }
            }
        }

        if cancelled {
            self.emit_operation_completed(format!("build {}", graph.root_name()), false);
            return Err(Error::Cancelled);
        }

        // Nodes never scheduled (fail-fast stop) are reported as skipped.
        for node in graph.nodes() {
            if !outcomes.contains_key(node.name()) {
                report.skipped.push(node.name().to_string());
            }
        }

        report.duration_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
        self.emit_operation_completed(
            format!("build {}", graph.root_name()),
            report.is_success(),
        );
        Ok(report)
    }

    /// Execute phases `Sourced` through `Described` for one node.
    ///
    /// The phases up to `BuildRequirementsResolved` were completed
    /// during resolution and validation; the sequence picks up from
    /// there.
    async fn run_node(
        &self,
        node: &ResolvedNode,
        semaphore: &Semaphore,
        descriptors: &DashMap<String, CapabilityDescriptor>,
    ) -> Result<CapabilityDescriptor, (Phase, Error)> {
        let name = node.name().to_string();
        let mut sequence = PhaseSequence::starting_at(&name, Phase::BuildRequirementsResolved);

        // Source: external, bounded by the worker pool.
        let source = {
            let _permit = self.acquire(semaphore, Phase::Sourced).await?;
            self.enter(&mut sequence, &name, Phase::Sourced)?;
            let source = self.fetcher.fetch(node).await.map_err(|error| {
                self.fail(&name, Phase::Sourced, &error);
                match error {
                    Error::Cancelled => (Phase::Sourced, Error::Cancelled),
                    other => (
                        Phase::Sourced,
                        LifecycleError::SourceFetchFailed {
                            package: name.clone(),
                            message: other.to_string(),
                        }
                        .into(),
                    ),
                }
            })?;
            self.complete(&name, Phase::Sourced);
            source
        };

        // Generate: needs the descriptors of every dependency; all are
        // present because dependencies finished in earlier batches.
        self.check_cancel(Phase::Generated)?;
        self.enter(&mut sequence, &name, Phase::Generated)?;
        let dependency_descriptors: Vec<CapabilityDescriptor> = node
            .deps
            .iter()
            .filter_map(|dep| descriptors.get(dep.as_str()).map(|d| d.value().clone()))
            .collect();
        self.runner
            .generate(node, &source, &dependency_descriptors)
            .await
            .map_err(|error| self.external_failure(&name, Phase::Generated, error))?;
        self.complete(&name, Phase::Generated);

        // Build: external, bounded by the worker pool.
        let artifacts = {
            let _permit = self.acquire(semaphore, Phase::Built).await?;
            self.enter(&mut sequence, &name, Phase::Built)?;
            let artifacts = self
                .runner
                .build(node, &source)
                .await
                .map_err(|error| self.external_failure(&name, Phase::Built, error))?;
            self.complete(&name, Phase::Built);
            artifacts
        };

        self.check_cancel(Phase::Packaged)?;
        self.enter(&mut sequence, &name, Phase::Packaged)?;
        self.installer
            .install(node, artifacts)
            .await
            .map_err(|error| self.external_failure(&name, Phase::Packaged, error))?;
        self.complete(&name, Phase::Packaged);

        self.enter(&mut sequence, &name, Phase::Described)?;
        let descriptor = describe(node);
        self.complete(&name, Phase::Described);
        self.emit(AppEvent::Lifecycle(LifecycleEvent::DescriptorEmitted {
            package: descriptor.package.clone(),
        }));

        Ok(descriptor)
    }

    async fn acquire<'s>(
        &self,
        semaphore: &'s Semaphore,
        phase: Phase,
    ) -> Result<tokio::sync::SemaphorePermit<'s>, (Phase, Error)> {
        self.check_cancel(phase)?;
        semaphore
            .acquire()
            .await
            .map_err(|_| (phase, Error::internal("worker pool closed")))
    }

    fn check_cancel(&self, phase: Phase) -> Result<(), (Phase, Error)> {
        if self.is_cancelled() {
            return Err((phase, Error::Cancelled));
        }
        Ok(())
    }

    fn enter(
        &self,
        sequence: &mut PhaseSequence,
        name: &str,
        phase: Phase,
    ) -> Result<(), (Phase, Error)> {
        sequence
            .advance_to(phase)
            .map_err(|e| (phase, Error::from(e)))?;
        self.emit(AppEvent::Lifecycle(LifecycleEvent::PhaseStarted {
            package: name.to_string(),
            phase: phase.to_string(),
        }));
        Ok(())
    }

    fn complete(&self, name: &str, phase: Phase) {
        self.emit(AppEvent::Lifecycle(LifecycleEvent::PhaseCompleted {
            package: name.to_string(),
            phase: phase.to_string(),
        }));
    }

    fn fail(&self, name: &str, phase: Phase, error: &Error) {
        self.emit(AppEvent::Lifecycle(LifecycleEvent::PhaseFailed {
            package: name.to_string(),
            phase: phase.to_string(),
            error: error.to_string(),
        }));
    }

    fn external_failure(&self, name: &str, phase: Phase, error: Error) -> (Phase, Error) {
        self.fail(name, phase, &error);
        match error {
            Error::Cancelled => (phase, Error::Cancelled),
            other => (
                phase,
                LifecycleError::ExternalToolFailed {
                    package: name.to_string(),
                    phase: phase.to_string(),
                    message: other.to_string(),
                }
                .into(),
            ),
        }
    }
}
