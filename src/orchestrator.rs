use crate::collection::Collection;
use crate::config::Config;
use crate::describer::{Describer, Description};
use crate::error::{AnalysisError, RenameError};
use crate::notifier::Notifier;
use crate::photo::{PhotoId, PhotoItem, Suggestion};
use crate::sanitizer::stem_or_fallback;
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

/// Result of one analysis, delivered back to the owning orchestrator.
struct AnalysisOutcome {
    id: PhotoId,
    result: Result<Description, AnalysisError>,
}

#[derive(Debug)]
pub enum RenameOutcome {
    Renamed(PathBuf),
    /// Item unknown, not `Suggested`, or already renamed.
    Skipped,
    Failed(RenameError),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RenameSummary {
    pub renamed: usize,
    pub failed: usize,
    pub skipped: usize,
}

/// Owns the photo collection and drives every state transition.
///
/// All mutation happens through `&mut self`. Analyses run as spawned tasks
/// and report back over a channel; their results are only applied when the
/// owner calls [`next_outcome`](Self::next_outcome),
/// [`settle`](Self::settle) or [`apply_ready`](Self::apply_ready).
/// Dispatching requires a running tokio runtime.
pub struct Orchestrator {
    collection: Collection,
    describer: Arc<dyn Describer>,
    notifier: Box<dyn Notifier>,
    fallback_stem: String,
    max_probes: usize,
    limiter: Option<Arc<Semaphore>>,
    outcome_tx: mpsc::UnboundedSender<AnalysisOutcome>,
    outcome_rx: mpsc::UnboundedReceiver<AnalysisOutcome>,
    in_flight: usize,
}

impl Orchestrator {
    pub fn new(describer: Arc<dyn Describer>, notifier: Box<dyn Notifier>, config: &Config) -> Self {
        let (outcome_tx, outcome_rx) = mpsc::unbounded_channel();
        let limiter = config
            .analysis
            .max_concurrent
            .map(|n| Arc::new(Semaphore::new(n.max(1))));

        log::info!(
            "Initialized orchestrator with {} describer ({})",
            describer.name(),
            match config.analysis.max_concurrent {
                Some(n) => format!("at most {} concurrent analyses", n.max(1)),
                None => "unbounded concurrency".to_string(),
            }
        );

        Self {
            collection: Collection::new(),
            describer,
            notifier,
            fallback_stem: config.rename.fallback_stem.clone(),
            max_probes: config.rename.max_collision_probes,
            limiter,
            outcome_tx,
            outcome_rx,
            in_flight: 0,
        }
    }

    /// Adds every path not already tracked and starts analysing it.
    /// Returns the ids of the newly created items.
    pub fn add_items<I, P>(&mut self, paths: I) -> Vec<PhotoId>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        let mut added = Vec::new();
        for path in paths {
            let path = path.into();
            match self.collection.insert(path.clone()) {
                Some(id) => {
                    log::info!("Added photo {:?}", path);
                    self.dispatch(id);
                    added.push(id);
                }
                None => log::debug!("Photo already in collection: {:?}", path),
            }
        }
        added
    }

    /// Requests a fresh suggestion. Ignored while the item is analysing,
    /// once it has been renamed, or if the id is unknown.
    pub fn regenerate(&mut self, id: PhotoId) -> bool {
        log::info!("Regenerating suggestion for {}", id);
        self.dispatch(id)
    }

    pub fn rename_one(&mut self, id: PhotoId) -> RenameOutcome {
        let Some(item) = self.collection.get_mut(id) else {
            return RenameOutcome::Skipped;
        };

        match item.rename(self.max_probes) {
            Ok(Some(destination)) => {
                let file_name = destination
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                if let Err(e) = self
                    .notifier
                    .notify("Rename successful", &format!("File renamed to {}", file_name))
                {
                    log::warn!("Failed to deliver rename notification: {}", e);
                }
                RenameOutcome::Renamed(destination)
            }
            Ok(None) => {
                log::debug!("Photo {} is {:?}, nothing to rename", id, item.state());
                RenameOutcome::Skipped
            }
            Err(e) => {
                log::error!("Failed to rename {:?}: {}", item.source_path(), e);
                RenameOutcome::Failed(e)
            }
        }
    }

    /// Renames every item that is `Suggested` right now, in collection
    /// order. Failures do not stop the remaining renames.
    pub fn rename_all(&mut self) -> RenameSummary {
        let mut summary = RenameSummary::default();

        for id in self.collection.ids() {
            match self.rename_one(id) {
                RenameOutcome::Renamed(_) => summary.renamed += 1,
                RenameOutcome::Skipped => summary.skipped += 1,
                RenameOutcome::Failed(_) => summary.failed += 1,
            }
        }

        log::info!(
            "Renamed {} photo(s), {} failed, {} skipped",
            summary.renamed,
            summary.failed,
            summary.skipped
        );
        summary
    }

    /// Drops an item. An analysis still running for it is discarded when
    /// it reports back. Files on disk are not touched.
    pub fn remove(&mut self, id: PhotoId) -> Option<PhotoItem> {
        let removed = self.collection.remove(id)?;
        log::info!("Removed photo {:?}", removed.source_path());
        Some(removed)
    }

    /// Waits for the next analysis to finish and applies it. Returns `None`
    /// when nothing is in flight.
    pub async fn next_outcome(&mut self) -> Option<PhotoId> {
        if self.in_flight == 0 {
            return None;
        }
        let outcome = self.outcome_rx.recv().await?;
        Some(self.apply(outcome))
    }

    /// Applies results until no analysis is in flight.
    pub async fn settle(&mut self) {
        while self.next_outcome().await.is_some() {}
    }

    /// Applies every result that has already arrived, without waiting.
    pub fn apply_ready(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(outcome) = self.outcome_rx.try_recv() {
            self.apply(outcome);
            applied += 1;
        }
        applied
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    pub fn items(&self) -> impl Iterator<Item = &PhotoItem> {
        self.collection.iter()
    }

    pub fn get(&self, id: PhotoId) -> Option<&PhotoItem> {
        self.collection.get(id)
    }

    pub fn len(&self) -> usize {
        self.collection.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collection.is_empty()
    }

    pub fn focused(&self) -> Option<&PhotoItem> {
        self.collection.focused()
    }

    pub fn set_focus(&mut self, id: PhotoId) -> bool {
        self.collection.set_focus(id)
    }

    fn dispatch(&mut self, id: PhotoId) -> bool {
        let Some(item) = self.collection.get_mut(id) else {
            return false;
        };
        if !item.begin_analysis() {
            log::debug!("Photo {} is {:?}, not starting analysis", id, item.state());
            return false;
        }

        let path = item.source_path().to_path_buf();
        let describer = Arc::clone(&self.describer);
        let limiter = self.limiter.clone();
        let tx = self.outcome_tx.clone();

        log::debug!("Dispatching {:?} to {}", path, describer.name());
        tokio::spawn(async move {
            // Held until the describe call returns
            let _permit = match limiter {
                Some(semaphore) => semaphore.acquire_owned().await.ok(),
                None => None,
            };
            // Every dispatch must report back, even if the describer panics
            let result = match AssertUnwindSafe(describer.describe(&path)).catch_unwind().await {
                Ok(result) => result,
                Err(payload) => {
                    let reason = panic_message(payload.as_ref());
                    log::error!("Describer panicked on {:?}: {}", path, reason);
                    Err(AnalysisError::Aborted(reason))
                }
            };
            if tx.send(AnalysisOutcome { id, result }).is_err() {
                log::debug!("Orchestrator gone, dropping analysis of {:?}", path);
            }
        });

        self.in_flight += 1;
        true
    }

    fn apply(&mut self, outcome: AnalysisOutcome) -> PhotoId {
        self.in_flight = self.in_flight.saturating_sub(1);
        let AnalysisOutcome { id, result } = outcome;

        let Some(item) = self.collection.get_mut(id) else {
            log::debug!("Discarding analysis for removed photo {}", id);
            return id;
        };

        match result {
            Ok(description) => {
                let stem = stem_or_fallback(&description.suggested_name_raw, &self.fallback_stem);
                log::info!("Suggested name for {:?}: {}", item.source_path(), stem);
                item.complete_analysis(Suggestion {
                    description: description.description,
                    stem,
                });
            }
            Err(e) => {
                log::warn!("Analysis failed for {:?}: {}", item.source_path(), e);
                item.fail_analysis(e.to_string());
            }
        }
        id
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "describer panicked".to_string()
    }
}
