use std::fmt;
use std::str::FromStr;

use serde::ser::SerializeMap;
use serde::Serialize;

use super::error::AggregateError;
use super::format::{
    format_count, format_currency, format_currency_opt, format_multiplier, format_percent,
};
use super::model::{CampaignRecord, Dataset};

// ---------------------------------------------------------------------------
// Ratio policy
// ---------------------------------------------------------------------------

/// `num / den`, or `None` when the denominator is zero.
///
/// Every derived rate in the dashboard goes through here, so a zero
/// denominator is always reported as undefined rather than inf/NaN.
pub fn ratio(num: f64, den: f64) -> Option<f64> {
    if den == 0.0 {
        None
    } else {
        Some(num / den)
    }
}

fn percent(num: f64, den: f64) -> Option<f64> {
    ratio(num, den).map(|r| r * 100.0)
}

// ---------------------------------------------------------------------------
// Totals – the five base measures summed over a set of rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Totals {
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub spend: f64,
    pub revenue: f64,
}

impl Totals {
    pub fn add(&mut self, rec: &CampaignRecord) {
        self.impressions = self.impressions.saturating_add(rec.impressions);
        self.clicks = self.clicks.saturating_add(rec.clicks);
        self.conversions = self.conversions.saturating_add(rec.conversions);
        self.spend += rec.total_spend;
        self.revenue += rec.revenue_generated;
    }

    pub fn from_records<'a>(records: impl IntoIterator<Item = &'a CampaignRecord>) -> Self {
        let mut totals = Totals::default();
        for rec in records {
            totals.add(rec);
        }
        totals
    }

    /// Click-through rate in percent.
    pub fn ctr(&self) -> Option<f64> {
        percent(self.clicks as f64, self.impressions as f64)
    }

    /// Conversions per click, in percent.
    pub fn conversion_rate(&self) -> Option<f64> {
        percent(self.conversions as f64, self.clicks as f64)
    }

    pub fn cpc(&self) -> Option<f64> {
        ratio(self.spend, self.clicks as f64)
    }

    pub fn cpa(&self) -> Option<f64> {
        ratio(self.spend, self.conversions as f64)
    }

    pub fn roas(&self) -> Option<f64> {
        ratio(self.revenue, self.spend)
    }

    pub fn get(&self, measure: Measure) -> f64 {
        match measure {
            Measure::Impressions => self.impressions as f64,
            Measure::Clicks => self.clicks as f64,
            Measure::Conversions => self.conversions as f64,
            Measure::Spend => self.spend,
            Measure::Revenue => self.revenue,
        }
    }
}

// ---------------------------------------------------------------------------
// Measure – a base column that groups can be ranked by
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Measure {
    Impressions,
    Clicks,
    Conversions,
    Spend,
    Revenue,
}

impl Measure {
    pub const ALL: [Measure; 5] = [
        Measure::Impressions,
        Measure::Clicks,
        Measure::Conversions,
        Measure::Spend,
        Measure::Revenue,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Measure::Impressions => "Impressions",
            Measure::Clicks => "Clicks",
            Measure::Conversions => "Conversions",
            Measure::Spend => "Total Spend",
            Measure::Revenue => "Revenue",
        }
    }
}

impl fmt::Display for Measure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Measure {
    type Err = AggregateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "impressions" => Ok(Measure::Impressions),
            "clicks" => Ok(Measure::Clicks),
            "conversions" => Ok(Measure::Conversions),
            "spend" | "total_spend" => Ok(Measure::Spend),
            "revenue" | "revenue_generated" => Ok(Measure::Revenue),
            _ => Err(AggregateError::InvalidArgument {
                kind: "measure",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Global KPIs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GlobalKpis {
    pub totals: Totals,
    pub ctr: Option<f64>,
    pub conversion_rate: Option<f64>,
    pub cpc: Option<f64>,
    pub cpa: Option<f64>,
    pub roas: Option<f64>,
}

pub fn compute_global_kpis(dataset: &Dataset) -> GlobalKpis {
    let totals = Totals::from_records(&dataset.records);
    GlobalKpis {
        totals,
        ctr: totals.ctr(),
        conversion_rate: totals.conversion_rate(),
        cpc: totals.cpc(),
        cpa: totals.cpa(),
        roas: totals.roas(),
    }
}

impl GlobalKpis {
    /// The labelled, display-formatted KPI strip.
    pub fn to_kpi_set(&self) -> KpiSet {
        let t = &self.totals;
        KpiSet {
            entries: vec![
                ("Total Impressions", format_count(t.impressions)),
                ("Total Clicks", format_count(t.clicks)),
                ("Total Conversions", format_count(t.conversions)),
                ("Total Spend", format_currency(t.spend)),
                ("Total Revenue", format_currency(t.revenue)),
                ("CTR", format_percent(self.ctr)),
                ("Conversion Rate", format_percent(self.conversion_rate)),
                ("CPC", format_currency_opt(self.cpc)),
                ("CPA", format_currency_opt(self.cpa)),
                ("ROAS", format_multiplier(self.roas)),
            ],
        }
    }
}

/// Ordered metric label → formatted value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KpiSet {
    entries: Vec<(&'static str, String)>,
}

impl KpiSet {
    pub fn get(&self, label: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(l, _)| *l == label)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        self.entries.iter().map(|(l, v)| (*l, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for KpiSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (label, value) in &self.entries {
            map.serialize_entry(label, value)?;
        }
        map.end()
    }
}

// ---------------------------------------------------------------------------
// Per-row rates (campaign scatter view)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RecordRates {
    pub conversion_rate: Option<f64>,
    pub roas: Option<f64>,
}

pub fn record_rates(rec: &CampaignRecord) -> RecordRates {
    RecordRates {
        conversion_rate: percent(rec.conversions as f64, rec.clicks as f64),
        roas: ratio(rec.revenue_generated, rec.total_spend),
    }
}
