use std::fmt;

use chrono::{DateTime, NaiveDate, NaiveDateTime};

use super::error::LoadError;

// ---------------------------------------------------------------------------
// Column contract
// ---------------------------------------------------------------------------

pub mod columns {
    pub const CAMPAIGN_NAME: &str = "Campaign_Name";
    pub const MARKETING_CHANNEL: &str = "Marketing_Channel";
    pub const START_DATE: &str = "Start_Date";
    pub const END_DATE: &str = "End_Date";
    pub const AGE_GROUP: &str = "Age_Group";
    pub const GENDER: &str = "Gender";
    pub const LOCATION: &str = "Location";
    pub const IMPRESSIONS: &str = "Impressions";
    pub const CLICKS: &str = "Clicks";
    pub const CONVERSIONS: &str = "Conversions";
    pub const TOTAL_SPEND: &str = "Total_Spend";
    pub const REVENUE_GENERATED: &str = "Revenue_Generated";

    /// Every column a dataset must carry, in the order loaders hand cells
    /// to [`super::CampaignRecord::from_cells`].
    pub const REQUIRED: [&str; 12] = [
        CAMPAIGN_NAME,
        MARKETING_CHANNEL,
        START_DATE,
        END_DATE,
        AGE_GROUP,
        GENDER,
        LOCATION,
        IMPRESSIONS,
        CLICKS,
        CONVERSIONS,
        TOTAL_SPEND,
        REVENUE_GENERATED,
    ];
}

// ---------------------------------------------------------------------------
// CellValue – a raw cell as it comes out of a file
// ---------------------------------------------------------------------------

/// A loosely-typed cell, before coercion into a [`CampaignRecord`] field.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Date(NaiveDate),
    Null,
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Text(s) => write!(f, "{s}"),
            CellValue::Integer(i) => write!(f, "{i}"),
            CellValue::Float(v) => write!(f, "{v}"),
            CellValue::Date(d) => write!(f, "{d}"),
            CellValue::Null => write!(f, "<null>"),
        }
    }
}

/// Text date layouts accepted for `Start_Date` / `End_Date`.
const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"];

fn invalid(row: usize, column: &str, value: &CellValue, reason: &str) -> LoadError {
    LoadError::InvalidValue {
        row,
        column: column.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl CellValue {
    fn text(&self, row: usize, column: &str) -> Result<String, LoadError> {
        match self {
            CellValue::Text(s) => Ok(s.clone()),
            CellValue::Integer(_) | CellValue::Float(_) | CellValue::Date(_) => {
                Ok(self.to_string())
            }
            CellValue::Null => Err(invalid(row, column, self, "missing value")),
        }
    }

    fn count(&self, row: usize, column: &str) -> Result<u64, LoadError> {
        let as_float = match self {
            CellValue::Integer(i) => {
                return u64::try_from(*i).map_err(|_| invalid(row, column, self, "negative count"));
            }
            CellValue::Float(v) => *v,
            CellValue::Text(s) => {
                let cleaned = s.trim().replace(',', "");
                if let Ok(n) = cleaned.parse::<u64>() {
                    return Ok(n);
                }
                cleaned
                    .parse::<f64>()
                    .map_err(|_| invalid(row, column, self, "not a number"))?
            }
            CellValue::Date(_) | CellValue::Null => {
                return Err(invalid(row, column, self, "expected a count"));
            }
        };
        if !as_float.is_finite() || as_float < 0.0 || as_float.fract() != 0.0 {
            return Err(invalid(row, column, self, "expected a non-negative integer"));
        }
        Ok(as_float as u64)
    }

    fn amount(&self, row: usize, column: &str) -> Result<f64, LoadError> {
        let value = match self {
            CellValue::Integer(i) => *i as f64,
            CellValue::Float(v) => *v,
            CellValue::Text(s) => s
                .trim()
                .replace([',', '$'], "")
                .parse::<f64>()
                .map_err(|_| invalid(row, column, self, "not a number"))?,
            CellValue::Date(_) | CellValue::Null => {
                return Err(invalid(row, column, self, "expected an amount"));
            }
        };
        if !value.is_finite() {
            return Err(invalid(row, column, self, "amount is not finite"));
        }
        Ok(value)
    }

    fn date(&self, row: usize, column: &str) -> Result<NaiveDate, LoadError> {
        match self {
            CellValue::Date(d) => Ok(*d),
            CellValue::Text(s) => {
                parse_date(s.trim()).ok_or_else(|| invalid(row, column, self, "unrecognised date"))
            }
            _ => Err(invalid(row, column, self, "expected a date")),
        }
    }
}

/// Parse a calendar date from the text layouts spreadsheets commonly export.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}

// ---------------------------------------------------------------------------
// CampaignRecord – one row of the dataset
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct CampaignRecord {
    pub campaign_name: String,
    pub marketing_channel: String,
    pub start_date: NaiveDate,
    /// Not checked against `start_date`.
    pub end_date: NaiveDate,
    pub age_group: String,
    pub gender: String,
    pub location: String,
    pub impressions: u64,
    pub clicks: u64,
    pub conversions: u64,
    pub total_spend: f64,
    pub revenue_generated: f64,
}

impl CampaignRecord {
    /// Coerce one row of raw cells, ordered as [`columns::REQUIRED`].
    pub fn from_cells(row: usize, cells: &[CellValue]) -> Result<Self, LoadError> {
        use columns::*;

        let cell = |i: usize| cells.get(i).unwrap_or(&CellValue::Null);

        Ok(CampaignRecord {
            campaign_name: cell(0).text(row, CAMPAIGN_NAME)?,
            marketing_channel: cell(1).text(row, MARKETING_CHANNEL)?,
            start_date: cell(2).date(row, START_DATE)?,
            end_date: cell(3).date(row, END_DATE)?,
            age_group: cell(4).text(row, AGE_GROUP)?,
            gender: cell(5).text(row, GENDER)?,
            location: cell(6).text(row, LOCATION)?,
            impressions: cell(7).count(row, IMPRESSIONS)?,
            clicks: cell(8).count(row, CLICKS)?,
            conversions: cell(9).count(row, CONVERSIONS)?,
            total_spend: cell(10).amount(row, TOTAL_SPEND)?,
            revenue_generated: cell(11).amount(row, REVENUE_GENERATED)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Dataset – the complete loaded table
// ---------------------------------------------------------------------------

/// All campaign rows in file order. Never mutated after load.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub records: Vec<CampaignRecord>,
}

impl Dataset {
    pub fn new(records: Vec<CampaignRecord>) -> Self {
        Dataset { records }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> CellValue {
        CellValue::Text(s.to_string())
    }

    fn sample_cells() -> Vec<CellValue> {
        vec![
            text("Spring Sale"),
            text("Email"),
            text("2024-03-15"),
            text("2024-04-01"),
            text("25-34"),
            text("Female"),
            text("Berlin"),
            text("1,000"),
            CellValue::Integer(50),
            CellValue::Float(5.0),
            text("$1,250.50"),
            CellValue::Integer(500),
        ]
    }

    #[test]
    fn coerces_mixed_cells() {
        let rec = CampaignRecord::from_cells(0, &sample_cells()).unwrap();
        assert_eq!(rec.campaign_name, "Spring Sale");
        assert_eq!(rec.start_date, NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());
        assert_eq!(rec.impressions, 1000);
        assert_eq!(rec.clicks, 50);
        assert_eq!(rec.conversions, 5);
        assert_eq!(rec.total_spend, 1250.5);
        assert_eq!(rec.revenue_generated, 500.0);
    }

    #[test]
    fn rejects_fractional_and_negative_counts() {
        let mut cells = sample_cells();
        cells[8] = CellValue::Float(1.5);
        let err = CampaignRecord::from_cells(3, &cells).unwrap_err();
        assert!(matches!(err, LoadError::InvalidValue { row: 3, ref column, .. } if column == "Clicks"));

        cells[8] = CellValue::Integer(-1);
        assert!(CampaignRecord::from_cells(3, &cells).is_err());
    }

    #[test]
    fn rejects_missing_and_non_finite_values() {
        let mut cells = sample_cells();
        cells[0] = CellValue::Null;
        assert!(CampaignRecord::from_cells(0, &cells).is_err());

        let mut cells = sample_cells();
        cells[10] = text("NaN");
        assert!(CampaignRecord::from_cells(0, &cells).is_err());
    }

    #[test]
    fn parses_common_date_layouts() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 15);
        assert_eq!(parse_date("2024-03-15"), expected);
        assert_eq!(parse_date("2024/03/15"), expected);
        assert_eq!(parse_date("03/15/2024"), expected);
        assert_eq!(parse_date("2024-03-15 00:00:00"), expected);
        assert_eq!(parse_date("2024-03-15T10:30:00"), expected);
        assert_eq!(parse_date("2024-03-15T10:30:00+02:00"), expected);
        assert_eq!(parse_date("15 March"), None);
    }
}
