use crate::application::dto::{AssetReferences, IndexStats, NeighbourView, RebuildSummary};
use crate::reference_index::domain::{AssetId, BuildStatus, SymmetryViolation};
use owo_colors::OwoColorize;
use std::fmt::Write;

/// Renders index query results as terminal text
///
/// Colors are only emitted when `color` is set, so output piped to a file
/// stays plain.
#[derive(Debug, Clone, Copy)]
pub struct TextRenderer {
    color: bool,
}

impl TextRenderer {
    pub fn new(color: bool) -> Self {
        Self { color }
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    pub fn references(&self, view: &AssetReferences) -> String {
        let mut out = String::new();
        let _ = write!(out, "{}", self.heading(view.id.as_str()));
        if let Some(kind) = &view.kind {
            let _ = write!(out, "  ({})", kind);
        }
        let _ = writeln!(out, "  [{}]", self.status(Some(view.build_status)));

        let _ = writeln!(out, "  Dependencies ({}):", view.dependencies.len());
        self.neighbours(&mut out, "→", &view.dependencies);
        let _ = writeln!(out, "  Referenced by ({}):", view.referencers.len());
        self.neighbours(&mut out, "←", &view.referencers);
        out
    }

    pub fn summary(&self, summary: &RebuildSummary) -> String {
        let mut out = format!(
            "Indexed {} asset(s) with {} reference(s) in {:.2?}",
            summary.assets, summary.edges, summary.elapsed
        );
        if summary.passes > 1 {
            let _ = write!(out, " ({} passes)", summary.passes);
        }
        if !summary.degraded.is_empty() {
            let _ = write!(out, "\n{} asset(s) degraded", summary.degraded.len());
        }
        if !summary.unresolved.is_empty() {
            let _ = write!(
                out,
                "\n{} unresolved reference target(s)",
                summary.unresolved.len()
            );
        }
        if !summary.fresh {
            let note = "Index is still stale: the asset tree changed during every pass";
            let _ = write!(out, "\n{}", self.warning(note));
        }
        out
    }

    pub fn unused(&self, ids: &[AssetId]) -> String {
        let mut out = String::new();
        for id in ids {
            let _ = writeln!(out, "{}", id);
        }
        out
    }

    pub fn stats(&self, stats: &IndexStats) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{}", self.heading("Reference index"));
        let _ = writeln!(out, "  Assets:          {}", stats.assets);
        let _ = writeln!(out, "  References:      {}", stats.edges);
        let _ = writeln!(out, "  Dangling:        {}", stats.dangling);
        let fresh = if stats.fresh { "yes" } else { "no" };
        let _ = writeln!(out, "  Fresh:           {}", fresh);
        if let Some(build_id) = stats.build_id {
            let _ = writeln!(out, "  Build id:        {}", build_id);
        }
        if let Some(path) = &stats.snapshot_path {
            let _ = writeln!(out, "  Snapshot:        {}", path.display());
        }
        out
    }

    pub fn violations(&self, violations: &[SymmetryViolation]) -> String {
        let mut out = String::new();
        for violation in violations {
            let _ = writeln!(out, "  - {}", violation);
        }
        out
    }

    fn neighbours(&self, out: &mut String, arrow: &str, list: &[NeighbourView]) {
        if list.is_empty() {
            let _ = writeln!(out, "    (none)");
            return;
        }
        for neighbour in list {
            let status = if neighbour.tracked {
                self.status(neighbour.build_status)
            } else {
                self.missing()
            };
            let _ = writeln!(out, "    {} {}  [{}]", arrow, neighbour.id, status);
        }
    }

    fn heading(&self, text: &str) -> String {
        if self.color {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn warning(&self, text: &str) -> String {
        if self.color {
            text.yellow().to_string()
        } else {
            text.to_string()
        }
    }

    fn missing(&self) -> String {
        if self.color {
            "missing".red().to_string()
        } else {
            "missing".to_string()
        }
    }

    fn status(&self, status: Option<BuildStatus>) -> String {
        let Some(status) = status else {
            return self.missing();
        };
        let text = status.to_string();
        if !self.color {
            return text;
        }
        match status {
            BuildStatus::Included => text.green().to_string(),
            BuildStatus::ExcludedExplicit => text.yellow().to_string(),
            BuildStatus::ExcludedUnreferenced => text.dimmed().to_string(),
        }
    }
}
