//! Pipeline orchestration.
//!
//! Drives each scanned file through extract -> classify -> resolve -> plan ->
//! execute, with a bounded worker pool. Adapter failures fail one task and
//! the run continues; a ledger write failure aborts the run. Collision-name
//! generation is serialized per destination directory so parallel workers
//! cannot pick the same renamed candidate.

use crate::classify::Classifier;
use crate::config::OrganizerConfig;
use crate::error::{OrganizerError, Result};
use crate::execution::MoveExecutor;
use crate::extract::ContentExtractor;
use crate::ledger::entry::{LedgerEntry, Outcome};
use crate::ledger::store::LedgerStore;
use crate::planner;
use crate::resolver;
use crate::scanner::{FileScanner, FileTask, TaskStatus};
use dashmap::DashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Semaphore};

/// End-of-run report.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub processed: usize,
    pub moved: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl RunSummary {
    fn tally(&mut self, outcome: Outcome) {
        self.processed += 1;
        match outcome {
            Outcome::Moved => self.moved += 1,
            Outcome::Skipped => self.skipped += 1,
            Outcome::Failed => self.failed += 1,
        }
    }
}

/// Shared state cloned into each worker task.
struct Worker {
    config: Arc<OrganizerConfig>,
    classifier: Arc<dyn Classifier>,
    ledger: Arc<LedgerStore>,
    cancel: Arc<AtomicBool>,
    dir_locks: Arc<DashMap<PathBuf, Arc<Mutex<()>>>>,
}

/// A single organization run over the configured source directory.
pub struct Pipeline {
    config: Arc<OrganizerConfig>,
    classifier: Arc<dyn Classifier>,
    ledger: Arc<LedgerStore>,
    cancel: Arc<AtomicBool>,
    dir_locks: Arc<DashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl Pipeline {
    pub fn new(config: OrganizerConfig, classifier: Arc<dyn Classifier>) -> Result<Self> {
        config.validate()?;
        let ledger = Arc::new(LedgerStore::new(config.resolved_ledger_path()));
        Ok(Self {
            config: Arc::new(config),
            classifier,
            ledger,
            cancel: Arc::new(AtomicBool::new(false)),
            dir_locks: Arc::new(DashMap::new()),
        })
    }

    /// Handle to the run's ledger, for audit reads and undo.
    pub fn ledger(&self) -> Arc<LedgerStore> {
        Arc::clone(&self.ledger)
    }

    /// Cooperative stop flag. Setting it prevents any further relocation
    /// from starting; one already in flight completes or rolls back.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.cancel)
    }

    /// Scan the source directory and process every supported file.
    pub async fn run(&self) -> Result<RunSummary> {
        let source_dir = self.config.source_dir.clone();
        let tasks = tokio::task::spawn_blocking(move || FileScanner::new().scan(&source_dir))
            .await
            .map_err(|e| OrganizerError::Filesystem(std::io::Error::other(e.to_string())))?;

        tracing::info!(tasks = tasks.len(), "Starting organization run");

        let semaphore = Arc::new(Semaphore::new(self.config.worker_count().max(1)));
        let mut handles = Vec::new();

        for task in tasks {
            if self.cancel.load(Ordering::SeqCst) {
                tracing::info!("Cancellation requested, not queueing further files");
                break;
            }

            let permit = Arc::clone(&semaphore)
                .acquire_owned()
                .await
                .map_err(|e| OrganizerError::Filesystem(std::io::Error::other(e.to_string())))?;

            let worker = Worker {
                config: Arc::clone(&self.config),
                classifier: Arc::clone(&self.classifier),
                ledger: Arc::clone(&self.ledger),
                cancel: Arc::clone(&self.cancel),
                dir_locks: Arc::clone(&self.dir_locks),
            };

            handles.push(tokio::spawn(async move {
                let _permit = permit;
                process_task(worker, task).await
            }));
        }

        let mut summary = RunSummary::default();
        let mut fatal: Option<OrganizerError> = None;

        for joined in futures::future::join_all(handles).await {
            match joined {
                Ok(Ok(Some(outcome))) => summary.tally(outcome),
                Ok(Ok(None)) => {} // cancelled before processing began
                Ok(Err(e)) => {
                    if e.is_fatal() {
                        // Loss of the audit trail: stop everything.
                        self.cancel.store(true, Ordering::SeqCst);
                        fatal.get_or_insert(e);
                    } else {
                        tracing::warn!(error = %e, "Task error escaped outcome handling");
                        summary.tally(Outcome::Failed);
                    }
                }
                Err(join_err) => {
                    tracing::warn!(error = %join_err, "Worker task panicked");
                    summary.tally(Outcome::Failed);
                }
            }
        }

        if let Some(e) = fatal {
            return Err(e);
        }

        tracing::info!(
            processed = summary.processed,
            moved = summary.moved,
            skipped = summary.skipped,
            failed = summary.failed,
            "Organization run finished"
        );
        Ok(summary)
    }
}

/// Drive one task to its terminal state. Returns None when cancellation
/// prevented processing; otherwise exactly one ledger entry was appended.
async fn process_task(worker: Worker, mut task: FileTask) -> Result<Option<Outcome>> {
    if worker.cancel.load(Ordering::SeqCst) {
        return Ok(None);
    }

    // Extraction (blocking parse work off the async runtime).
    let extractor = ContentExtractor::new(worker.config.max_extraction_bytes);
    let path = task.source_path.clone();
    let detected = task.detected_type;
    let extracted =
        tokio::task::spawn_blocking(move || extractor.extract(&path, detected))
            .await
            .map_err(|e| OrganizerError::Filesystem(std::io::Error::other(e.to_string())))?;

    let text = match extracted {
        Ok(text) => text,
        Err(e) => {
            task.status = TaskStatus::Failed;
            return record_failure(&worker, &task, e).map(Some);
        }
    };
    task.extracted_text = Some(text);
    task.status = TaskStatus::Extracted;

    // Classification with the pipeline-owned retry policy.
    let classification = match classify_with_retry(&worker, task.extracted_text.as_deref().unwrap_or("")).await {
        Ok(result) => result,
        Err(e) => {
            task.status = TaskStatus::Failed;
            return record_failure(&worker, &task, e).map(Some);
        }
    };
    task.status = TaskStatus::Classified;

    let confidence = classification.top().map(|l| l.confidence).unwrap_or(0.0);
    let category = resolver::resolve(
        &classification,
        worker.config.min_confidence,
        &worker.config.allowed_categories,
        &worker.config.fallback_category,
    );

    // Serialize planning and execution per destination directory so two
    // tasks cannot claim the same renamed candidate.
    let base = worker.config.destination_dir.join(category.as_str());
    let lock = worker
        .dir_locks
        .entry(base)
        .or_insert_with(|| Arc::new(Mutex::new(())))
        .clone();
    let _guard = lock.lock().await;

    // Stop before the relocation begins if a cancel arrived meanwhile.
    if worker.cancel.load(Ordering::SeqCst) {
        return Ok(None);
    }

    let source = task.source_path.clone();
    let destination_root = worker.config.destination_dir.clone();
    let ledger = Arc::clone(&worker.ledger);
    let task_id = task.id;
    let category_name = category.as_str().to_string();

    let entry: Result<LedgerEntry> = tokio::task::spawn_blocking(move || {
        let plan = match planner::plan(&source, &category, &destination_root) {
            Ok(plan) => plan,
            Err(e) => {
                let entry = LedgerEntry::failed(
                    task_id,
                    source,
                    category_name,
                    confidence,
                    e.kind(),
                    e.to_string(),
                );
                ledger.append(&entry)?;
                return Ok(entry);
            }
        };
        MoveExecutor::new(ledger).execute(&plan, task_id, category_name.as_str(), confidence)
    })
    .await
    .map_err(|e| OrganizerError::Filesystem(std::io::Error::other(e.to_string())))?;

    let entry = entry?;
    task.status = match entry.outcome {
        Outcome::Moved => TaskStatus::Moved,
        Outcome::Skipped => TaskStatus::Skipped,
        Outcome::Failed => TaskStatus::Failed,
    };
    Ok(Some(entry.outcome))
}

/// Call the classifier, retrying `ClassifierUnavailable` failures with
/// exponential backoff per the configured policy.
async fn classify_with_retry(
    worker: &Worker,
    text: &str,
) -> Result<crate::classify::ClassificationResult> {
    let policy = &worker.config.retry;
    let attempts = policy.max_attempts.max(1);

    let mut last_err = None;
    for attempt in 0..attempts {
        if attempt > 0 {
            let delay = policy.backoff(attempt - 1);
            tracing::debug!(attempt, delay_ms = delay.as_millis() as u64, "Retrying classifier");
            tokio::time::sleep(delay).await;
        }
        match worker.classifier.classify(text).await {
            Ok(result) => return Ok(result),
            Err(e @ OrganizerError::ClassifierUnavailable(_)) => {
                tracing::warn!(attempt, error = %e, "Classifier attempt failed");
                last_err = Some(e);
            }
            Err(e) => return Err(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        OrganizerError::ClassifierUnavailable("no attempts were made".to_string())
    }))
}

/// Append the task's terminal `Failed` entry. Ledger errors propagate as
/// fatal; everything else is captured in the entry itself.
fn record_failure(worker: &Worker, task: &FileTask, error: OrganizerError) -> Result<Outcome> {
    tracing::warn!(
        path = %task.source_path.display(),
        error = %error,
        "Task failed, continuing with next file"
    );
    let entry = LedgerEntry::failed(
        task.id,
        task.source_path.clone(),
        worker.config.fallback_category.clone(),
        0.0,
        error.kind(),
        error.to_string(),
    );
    worker.ledger.append(&entry)?;
    Ok(Outcome::Failed)
}
