use std::ops::RangeInclusive;
use std::path::PathBuf;
use std::sync::Arc;

use crate::data::error::LoadError;
use crate::data::group::GroupKey;
use crate::data::kpi::Measure;
use crate::data::model::Dataset;
use crate::data::report::Report;
use crate::data::store::DatasetStore;

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    Campaign,
    Channel,
    Demographics,
    Time,
}

impl Tab {
    pub const ALL: [Tab; 4] = [Tab::Campaign, Tab::Channel, Tab::Demographics, Tab::Time];

    pub fn title(self) -> &'static str {
        match self {
            Tab::Campaign => "Campaign Performance",
            Tab::Channel => "Channel Analysis",
            Tab::Demographics => "Demographics",
            Tab::Time => "Time Analysis",
        }
    }
}

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded dataset source (None until a file loads).
    pub store: Option<DatasetStore>,

    /// Aggregations for the current snapshot, rebuilt on every (re)load.
    pub report: Option<Report>,

    pub active_tab: Tab,

    /// Ranking view settings.
    pub top_n: usize,
    pub ranking_measure: Measure,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(10)
    }
}

impl AppState {
    pub fn new(top_n: usize) -> Self {
        Self {
            store: None,
            report: None,
            active_tab: Tab::Campaign,
            top_n,
            ranking_measure: Measure::Conversions,
            status_message: None,
        }
    }

    /// Current snapshot, if anything is loaded.
    pub fn dataset(&self) -> Option<Arc<Dataset>> {
        self.store.as_ref().map(DatasetStore::snapshot)
    }

    /// Load `path`, replacing the current source on success.
    pub fn open_path(&mut self, path: PathBuf) {
        let result = match self.store.as_mut() {
            Some(store) => store.replace(path),
            None => DatasetStore::open(path).map(|store| {
                let snapshot = store.snapshot();
                self.store = Some(store);
                snapshot
            }),
        };
        self.finish_load(result);
    }

    /// Re-read the current source file.
    pub fn reload(&mut self) {
        let Some(store) = self.store.as_mut() else {
            self.status_message = Some("Nothing to reload".to_string());
            return;
        };
        let result = store.reload();
        self.finish_load(result);
    }

    fn finish_load(&mut self, result: Result<Arc<Dataset>, LoadError>) {
        match result {
            Ok(dataset) => {
                self.report = Some(Report::build(&dataset, self.ranking_measure, self.top_n));
                self.status_message = None;
            }
            Err(e) => {
                log::error!("Failed to load campaign data: {e:#}");
                self.status_message = Some(format!("Error: {e}"));
            }
        }
    }

    /// Bounds for the top-N slider. Always contains the current `top_n`, so
    /// showing the slider never rewrites a configured value.
    pub fn ranking_range(&self) -> RangeInclusive<usize> {
        let campaigns = self
            .report
            .as_ref()
            .map_or(0, |r| r.groups(GroupKey::Campaign).len());
        1..=campaigns.max(self.top_n).max(1)
    }

    /// Change the ranking view; only the ranking is recomputed.
    pub fn set_ranking(&mut self, measure: Measure, n: usize) {
        if measure == self.ranking_measure && n == self.top_n {
            return;
        }
        self.ranking_measure = measure;
        self.top_n = n;
        if let Some(report) = &mut self.report {
            report.rerank(measure, n);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const HEADER: &str = "Campaign_Name,Marketing_Channel,Start_Date,End_Date,Age_Group,Gender,Location,Impressions,Clicks,Conversions,Total_Spend,Revenue_Generated";

    fn temp_csv(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        write!(file, "{HEADER}\n{body}").unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn opening_a_file_builds_the_report() {
        let file = temp_csv(
            "A,Email,2024-03-15,2024-03-30,18-24,Male,Paris,1000,50,5,100,500\n\
             B,Social,2024-06-01,2024-06-20,25-34,Female,Rome,2000,100,20,300,1800\n",
        );
        let mut state = AppState::default();
        state.open_path(file.path().to_path_buf());

        assert!(state.status_message.is_none());
        let report = state.report.as_ref().unwrap();
        assert_eq!(report.kpis.get("ROAS"), Some("5.75x"));
        assert_eq!(state.dataset().unwrap().len(), 2);
    }

    #[test]
    fn failed_open_keeps_previous_report() {
        let good = temp_csv("A,Email,2024-03-15,2024-03-30,18-24,Male,Paris,1000,50,5,100,500\n");
        let mut state = AppState::default();
        state.open_path(good.path().to_path_buf());

        state.open_path(PathBuf::from("/missing/campaigns.csv"));
        assert!(state.status_message.as_deref().unwrap().starts_with("Error:"));
        assert_eq!(state.report.as_ref().unwrap().rows, 1);
    }

    #[test]
    fn reload_without_source_sets_status() {
        let mut state = AppState::default();
        state.reload();
        assert_eq!(state.status_message.as_deref(), Some("Nothing to reload"));
    }

    #[test]
    fn set_ranking_reranks_in_place() {
        let file = temp_csv(
            "A,Email,2024-03-15,2024-03-30,18-24,Male,Paris,1000,50,5,100,500\n\
             B,Email,2024-03-15,2024-03-30,18-24,Male,Paris,10,5,1,100,900\n",
        );
        let mut state = AppState::new(1);
        state.open_path(file.path().to_path_buf());
        assert_eq!(state.report.as_ref().unwrap().top_campaigns.groups[0].label, "A");

        state.set_ranking(Measure::Revenue, 1);
        assert_eq!(state.report.as_ref().unwrap().top_campaigns.groups[0].label, "B");
    }

    #[test]
    fn ranking_range_keeps_a_configured_top_n() {
        let file = temp_csv(
            "A,Email,2024-03-15,2024-03-30,18-24,Male,Paris,1000,50,5,100,500\n\
             B,Social,2024-06-01,2024-06-20,25-34,Female,Rome,2000,100,20,300,1800\n",
        );
        let mut state = AppState::new(100);
        state.open_path(file.path().to_path_buf());

        let range = state.ranking_range();
        assert!(range.contains(&100));
        assert_eq!(*range.start(), 1);
        assert_eq!(state.report.as_ref().unwrap().top_campaigns.n, 100);

        let few = AppState::new(1);
        assert_eq!(few.ranking_range(), 1..=1);
    }
}
