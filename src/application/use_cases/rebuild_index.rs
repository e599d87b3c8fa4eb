use crate::ports::outbound::{AssetStore, ProgressReporter};
use crate::reference_index::services::{GraphBuilder, ProgressCallback, RebuildOutcome};
use crate::shared::Result;
use std::sync::Arc;

/// Degraded assets listed individually before the list is summarised
const MAX_LISTED_ASSETS: usize = 10;

/// RebuildIndexUseCase - one full pass over the asset store
///
/// Wraps [`GraphBuilder`] with user-facing progress and warning output.
/// Merging the outcome into the index is left to the caller, which owns
/// the store.
///
/// # Type Parameters
/// * `PR` - ProgressReporter implementation
pub struct RebuildIndexUseCase<PR> {
    builder: GraphBuilder,
    progress_reporter: Arc<PR>,
}

impl<PR> RebuildIndexUseCase<PR>
where
    PR: ProgressReporter + 'static,
{
    pub fn new(builder: GraphBuilder, progress_reporter: Arc<PR>) -> Self {
        Self {
            builder,
            progress_reporter,
        }
    }

    pub fn progress_reporter(&self) -> &PR {
        &self.progress_reporter
    }

    /// Executes one rebuild pass against `assets`
    pub async fn execute<S>(&self, assets: Arc<S>) -> Result<RebuildOutcome>
    where
        S: AssetStore + ?Sized + 'static,
    {
        self.progress_reporter
            .report("🔍 Scanning asset dependencies...");

        let reporter = Arc::clone(&self.progress_reporter);
        let progress: ProgressCallback = Arc::new(move |done, total| {
            reporter.report_progress(done, total, Some("indexing assets"));
        });

        let outcome = match self.builder.build(assets, Some(progress)).await {
            Ok(outcome) => outcome,
            Err(e) => {
                self.progress_reporter
                    .report_error(&format!("❌ Rebuild failed: {:#}", e));
                return Err(e);
            }
        };

        self.report_degraded(&outcome);
        if !outcome.unresolved.is_empty() {
            self.progress_reporter.report(&format!(
                "   {} referenced asset(s) could not be resolved; their edges are kept",
                outcome.unresolved.len()
            ));
        }

        self.progress_reporter.report_completion(&format!(
            "✅ Indexed {} asset(s) with {} reference(s)",
            outcome.total_units,
            outcome.edge_count()
        ));
        Ok(outcome)
    }

    fn report_degraded(&self, outcome: &RebuildOutcome) {
        if outcome.degraded.is_empty() {
            return;
        }
        self.progress_reporter.report_error(&format!(
            "⚠️  Warning: {} asset(s) could not be fully read:",
            outcome.degraded.len()
        ));
        for id in outcome.degraded.iter().take(MAX_LISTED_ASSETS) {
            self.progress_reporter.report_error(&format!("   - {}", id));
        }
        if outcome.degraded.len() > MAX_LISTED_ASSETS {
            self.progress_reporter.report_error(&format!(
                "   ... and {} more",
                outcome.degraded.len() - MAX_LISTED_ASSETS
            ));
        }
    }
}
