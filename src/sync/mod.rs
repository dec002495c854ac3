//! The sequential sync pipeline.
//!
//! Records are processed strictly in input order, one at a time. Each
//! record walks an explicit state machine — resolve the provider, fetch
//! into a private staging directory, materialize at the destination,
//! clean up — and any failure along the way skips that record alone; the
//! run always continues and always ends with a single `Finished.` line.
//!
//! Cancellation is cooperative: the token is checked before each record
//! and again between fetch and materialize, so an in-flight transfer is
//! never severed and the destination never sees a half-placed asset.

pub mod archive;
pub mod error;
pub mod workspace;

pub use error::SyncError;

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

use crate::progress::ProgressSink;
use crate::provider::ProviderRegistry;
use crate::store::AssetRecord;
use workspace::WorkspaceManager;

/// Where in its lifecycle a record was when processing stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStage {
    Queued,
    Resolving,
    Fetching,
    Materializing,
    CleaningUp,
}

/// Terminal state of one record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    Succeeded,
    Skipped { stage: SyncStage, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordResult {
    pub name: String,
    pub outcome: RecordOutcome,
}

/// Per-record outcomes of one run, in input order.
#[derive(Debug, Default)]
pub struct RunReport {
    results: Vec<RecordResult>,
}

impl RunReport {
    fn push(&mut self, name: String, outcome: RecordOutcome) {
        self.results.push(RecordResult { name, outcome });
    }

    pub fn results(&self) -> &[RecordResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, RecordOutcome::Succeeded))
            .count()
    }

    pub fn skipped(&self) -> usize {
        self.len() - self.succeeded()
    }
}

pub struct SyncPipeline {
    project_root: PathBuf,
    workspaces: WorkspaceManager,
    registry: ProviderRegistry,
}

impl SyncPipeline {
    pub fn new(
        project_root: impl Into<PathBuf>,
        temp_root: impl Into<PathBuf>,
        registry: ProviderRegistry,
    ) -> Self {
        Self {
            project_root: project_root.into(),
            workspaces: WorkspaceManager::new(temp_root),
            registry,
        }
    }

    /// Processes `records` in order and reports every outcome.
    ///
    /// An empty batch emits exactly one line and touches nothing on disk.
    pub async fn run(
        &self,
        records: &[AssetRecord],
        sink: &dyn ProgressSink,
        cancel: CancellationToken,
    ) -> RunReport {
        let mut report = RunReport::default();

        if records.is_empty() {
            sink.emit("Nothing selected.");
            return report;
        }

        for (index, record) in records.iter().enumerate() {
            if cancel.is_cancelled() {
                tracing::info!("Cancellation requested, leaving remaining assets queued");
                for rest in &records[index..] {
                    report.push(
                        rest.name.clone(),
                        RecordOutcome::Skipped {
                            stage: SyncStage::Queued,
                            reason: "cancelled".to_string(),
                        },
                    );
                }
                break;
            }

            sink.emit(&format!("\n── {} ──", record.name));
            let outcome = self.process_record(record, sink, &cancel).await;
            match &outcome {
                RecordOutcome::Succeeded => sink.emit(&format!("  ✓ Done: {}", record.name)),
                RecordOutcome::Skipped { .. } => {
                    sink.emit(&format!("  ⚠ Skipped: {}", record.name))
                }
            }
            report.push(record.name.clone(), outcome);
        }

        sink.emit("\nFinished.");
        report
    }

    async fn process_record(
        &self,
        record: &AssetRecord,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> RecordOutcome {
        let mut stage = SyncStage::Resolving;
        tracing::debug!(asset = %record.name, ?stage, kind = %record.kind, "Resolving provider");

        let provider = match self.registry.resolve(&record.kind) {
            Some(provider) => provider,
            None => {
                let e = SyncError::UnknownProvider(record.kind.clone());
                sink.emit(&format!("  ERROR: {e}"));
                return RecordOutcome::Skipped {
                    stage,
                    reason: e.to_string(),
                };
            }
        };

        let workspace = match self.workspaces.acquire(&record.name).await {
            Ok(workspace) => workspace,
            Err(e) => {
                let e = SyncError::Filesystem(e);
                sink.emit(&format!("  ERROR: {e}"));
                return RecordOutcome::Skipped {
                    stage,
                    reason: e.to_string(),
                };
            }
        };

        stage = SyncStage::Fetching;
        tracing::debug!(asset = %record.name, ?stage, provider = provider.name(), "Fetching");
        let fetched = match provider.fetch(&record.url, workspace.path(), sink).await {
            Ok(path) => path,
            Err(e) => {
                let reason = SyncError::from(e).to_string();
                workspace.release().await;
                return RecordOutcome::Skipped { stage, reason };
            }
        };

        // Last safe bail-out point: the transfer is complete but nothing
        // has touched the destination yet.
        if cancel.is_cancelled() {
            tracing::info!(asset = %record.name, "Cancelled after fetch, discarding staged file");
            workspace.release().await;
            return RecordOutcome::Skipped {
                stage,
                reason: "cancelled".to_string(),
            };
        }

        stage = SyncStage::Materializing;
        tracing::debug!(asset = %record.name, ?stage, file = %fetched.display(), "Materializing");
        let dest_dir = self.project_root.join(&record.location);
        if let Err(e) = tokio::fs::create_dir_all(&dest_dir).await {
            let e = SyncError::Filesystem(e);
            sink.emit(&format!("  ERROR: {e}"));
            workspace.release().await;
            return RecordOutcome::Skipped {
                stage,
                reason: e.to_string(),
            };
        }
        if let Err(e) = archive::materialize(&fetched, &dest_dir, sink).await {
            workspace.release().await;
            return RecordOutcome::Skipped {
                stage,
                reason: e.to_string(),
            };
        }

        stage = SyncStage::CleaningUp;
        tracing::debug!(asset = %record.name, ?stage, "Releasing workspace");
        workspace.release().await;
        RecordOutcome::Succeeded
    }
}
