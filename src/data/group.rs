use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use super::error::AggregateError;
use super::kpi::{Measure, Totals};
use super::model::{columns, CampaignRecord, Dataset};

// ---------------------------------------------------------------------------
// GroupKey – which attribute partitions the rows
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    Campaign,
    Channel,
    AgeGroup,
    Gender,
    Location,
    /// Start date truncated to year-month.
    Month,
}

impl GroupKey {
    pub const ALL: [GroupKey; 6] = [
        GroupKey::Campaign,
        GroupKey::Channel,
        GroupKey::AgeGroup,
        GroupKey::Gender,
        GroupKey::Location,
        GroupKey::Month,
    ];

    /// Source column name, as it appears in the input file.
    pub fn column(self) -> &'static str {
        match self {
            GroupKey::Campaign => columns::CAMPAIGN_NAME,
            GroupKey::Channel => columns::MARKETING_CHANNEL,
            GroupKey::AgeGroup => columns::AGE_GROUP,
            GroupKey::Gender => columns::GENDER,
            GroupKey::Location => columns::LOCATION,
            GroupKey::Month => columns::START_DATE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            GroupKey::Campaign => "Campaign",
            GroupKey::Channel => "Channel",
            GroupKey::AgeGroup => "Age Group",
            GroupKey::Gender => "Gender",
            GroupKey::Location => "Location",
            GroupKey::Month => "Month",
        }
    }

    /// Campaign and channel groups carry CTR, conversion rate and ROAS.
    pub fn derives_rates(self) -> bool {
        matches!(self, GroupKey::Campaign | GroupKey::Channel)
    }

    fn category<'a>(self, rec: &'a CampaignRecord) -> &'a str {
        match self {
            GroupKey::Campaign => &rec.campaign_name,
            GroupKey::Channel => &rec.marketing_channel,
            GroupKey::AgeGroup => &rec.age_group,
            GroupKey::Gender => &rec.gender,
            GroupKey::Location => &rec.location,
            GroupKey::Month => "",
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GroupKey {
    type Err = AggregateError;

    /// Accepts short names (`channel`) and source column names (`Marketing_Channel`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace([' ', '-'], "_").as_str() {
            "campaign" | "campaign_name" => Ok(GroupKey::Campaign),
            "channel" | "marketing_channel" => Ok(GroupKey::Channel),
            "age_group" | "age" => Ok(GroupKey::AgeGroup),
            "gender" => Ok(GroupKey::Gender),
            "location" => Ok(GroupKey::Location),
            "month" | "start_month" => Ok(GroupKey::Month),
            _ => Err(AggregateError::InvalidArgument {
                kind: "group key",
                value: s.to_string(),
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// YearMonth – the time-series bucket
// ---------------------------------------------------------------------------

/// Orders chronologically; displays as `YYYY-MM`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        YearMonth {
            year: date.year(),
            month: date.month(),
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

// ---------------------------------------------------------------------------
// Grouped metrics
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GroupRates {
    pub ctr: Option<f64>,
    pub conversion_rate: Option<f64>,
    pub roas: Option<f64>,
}

impl GroupRates {
    fn of(totals: &Totals) -> Self {
        GroupRates {
            ctr: totals.ctr(),
            conversion_rate: totals.conversion_rate(),
            roas: totals.roas(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupMetrics {
    /// Group value: a category, or `YYYY-MM` for months.
    pub label: String,
    pub rows: usize,
    pub totals: Totals,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rates: Option<GroupRates>,
}

impl GroupMetrics {
    fn new(label: String) -> Self {
        GroupMetrics {
            label,
            rows: 0,
            totals: Totals::default(),
            rates: None,
        }
    }

    fn push(&mut self, rec: &CampaignRecord) {
        self.rows += 1;
        self.totals.add(rec);
    }

    fn finish(mut self, key: GroupKey) -> Self {
        if key.derives_rates() {
            self.rates = Some(GroupRates::of(&self.totals));
        }
        self
    }
}

/// Sum the base measures per distinct value of `key`.
///
/// Categories come back in first-seen order; months in ascending
/// chronological order.
pub fn compute_grouped_metrics(dataset: &Dataset, key: GroupKey) -> Vec<GroupMetrics> {
    let groups = match key {
        GroupKey::Month => {
            let mut by_month: BTreeMap<YearMonth, GroupMetrics> = BTreeMap::new();
            for rec in &dataset.records {
                let bucket = YearMonth::of(rec.start_date);
                by_month
                    .entry(bucket)
                    .or_insert_with(|| GroupMetrics::new(bucket.to_string()))
                    .push(rec);
            }
            by_month.into_values().collect::<Vec<_>>()
        }
        _ => {
            let mut groups: Vec<GroupMetrics> = Vec::new();
            let mut index: HashMap<&str, usize> = HashMap::new();
            for rec in &dataset.records {
                let value = key.category(rec);
                let slot = *index.entry(value).or_insert_with(|| {
                    groups.push(GroupMetrics::new(value.to_string()));
                    groups.len() - 1
                });
                groups[slot].push(rec);
            }
            groups
        }
    };

    groups.into_iter().map(|g| g.finish(key)).collect()
}

/// Parse `key` and group by it.
pub fn compute_grouped_metrics_by(
    dataset: &Dataset,
    key: &str,
) -> Result<Vec<GroupMetrics>, AggregateError> {
    let key: GroupKey = key.parse()?;
    Ok(compute_grouped_metrics(dataset, key))
}

/// The `n` largest groups by `measure`, descending.  Ties keep their
/// original relative order.
pub fn top_n(groups: &[GroupMetrics], measure: Measure, n: usize) -> Vec<GroupMetrics> {
    let mut ranked = groups.to_vec();
    ranked.sort_by(|a, b| b.totals.get(measure).total_cmp(&a.totals.get(measure)));
    ranked.truncate(n);
    ranked
}
