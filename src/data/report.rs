use serde::Serialize;

use super::group::{compute_grouped_metrics, top_n, GroupKey, GroupMetrics};
use super::kpi::{compute_global_kpis, GlobalKpis, KpiSet, Measure};
use super::model::Dataset;

// ---------------------------------------------------------------------------
// Report – every aggregation the dashboard shows, computed once per load
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct GroupSection {
    pub key: GroupKey,
    pub column: &'static str,
    pub groups: Vec<GroupMetrics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Ranking {
    pub measure: Measure,
    pub n: usize,
    pub groups: Vec<GroupMetrics>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub rows: usize,
    pub kpis: KpiSet,
    pub global: GlobalKpis,
    pub sections: Vec<GroupSection>,
    pub top_campaigns: Ranking,
}

impl Report {
    pub fn build(dataset: &Dataset, ranking_measure: Measure, n: usize) -> Self {
        let global = compute_global_kpis(dataset);
        let sections: Vec<GroupSection> = GroupKey::ALL
            .into_iter()
            .map(|key| GroupSection {
                key,
                column: key.column(),
                groups: compute_grouped_metrics(dataset, key),
            })
            .collect();

        let mut report = Report {
            rows: dataset.len(),
            kpis: global.to_kpi_set(),
            global,
            sections,
            top_campaigns: Ranking {
                measure: ranking_measure,
                n,
                groups: Vec::new(),
            },
        };
        report.rerank(ranking_measure, n);
        report
    }

    /// Groups for `key`, in the order the engine produced them.
    pub fn groups(&self, key: GroupKey) -> &[GroupMetrics] {
        self.sections
            .iter()
            .find(|s| s.key == key)
            .map(|s| s.groups.as_slice())
            .unwrap_or(&[])
    }

    /// Recompute the top-campaign ranking without re-aggregating.
    pub fn rerank(&mut self, measure: Measure, n: usize) {
        let groups = top_n(self.groups(GroupKey::Campaign), measure, n);
        self.top_campaigns = Ranking { measure, n, groups };
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::data::kpi::tests::{record, two_channel_dataset};

    #[test]
    fn report_has_every_grouping() {
        let report = Report::build(&two_channel_dataset(), Measure::Conversions, 10);
        assert_eq!(report.rows, 2);
        for key in GroupKey::ALL {
            assert!(!report.groups(key).is_empty(), "{key} missing");
        }
        assert_eq!(report.groups(GroupKey::Month).len(), 2);
    }

    #[test]
    fn rerank_orders_campaigns() {
        let ds = Dataset::new(vec![
            record("A", "Email", (2024, 1, 1), (0, 0, 50, 0.0, 0.0)),
            record("B", "Email", (2024, 1, 1), (0, 0, 120, 0.0, 900.0)),
            record("C", "Email", (2024, 1, 1), (0, 0, 80, 0.0, 1000.0)),
        ]);
        let mut report = Report::build(&ds, Measure::Conversions, 2);
        let names: Vec<_> = report
            .top_campaigns
            .groups
            .iter()
            .map(|g| g.label.clone())
            .collect();
        assert_eq!(names, ["B", "C"]);

        report.rerank(Measure::Revenue, 1);
        assert_eq!(report.top_campaigns.groups[0].label, "C");
        assert_eq!(report.top_campaigns.n, 1);
    }

    #[test]
    fn json_renders_undefined_rates_as_null() {
        let ds = Dataset::new(vec![record("A", "Email", (2024, 1, 1), (100, 0, 0, 0.0, 0.0))]);
        let text = Report::build(&ds, Measure::Clicks, 5).to_json().unwrap();
        let json: Value = serde_json::from_str(&text).unwrap();

        assert_eq!(json["kpis"]["CTR"], "0.00%");
        assert_eq!(json["kpis"]["ROAS"], "n/a");
        assert!(json["global"]["roas"].is_null());
        assert_eq!(json["sections"][1]["key"], "channel");
        assert!(json["sections"][1]["groups"][0]["rates"]["conversion_rate"].is_null());
        assert!(json["sections"][2]["groups"][0].get("rates").is_none());
    }
}
