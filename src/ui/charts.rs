use std::ops::RangeInclusive;

use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, GridMark, Legend, Line, Plot, PlotPoint, PlotPoints, Points};

use crate::color::{generate_palette, ColorMap};
use crate::data::format::{format_count, format_currency, format_multiplier, format_percent};
use crate::data::group::{GroupKey, GroupMetrics};
use crate::data::kpi::{record_rates, Measure};
use crate::data::model::Dataset;
use crate::data::report::Report;
use crate::state::AppState;

const CHART_HEIGHT: f32 = 300.0;

// ---------------------------------------------------------------------------
// Tabs
// ---------------------------------------------------------------------------

pub fn campaign_tab(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Campaign Performance Overview");

    let mut measure = state.ranking_measure;
    let mut n = state.top_n;
    let range = state.ranking_range();
    ui.horizontal(|ui: &mut Ui| {
        ui.label("Rank by");
        egui::ComboBox::from_id_salt("ranking_measure")
            .selected_text(measure.label())
            .show_ui(ui, |ui: &mut Ui| {
                for m in Measure::ALL {
                    ui.selectable_value(&mut measure, m, m.label());
                }
            });
        ui.add(
            egui::Slider::new(&mut n, range)
                .clamping(egui::SliderClamping::Edits)
                .text("top campaigns"),
        );
    });
    state.set_ranking(measure, n);

    let (Some(report), Some(dataset)) = (&state.report, state.dataset()) else {
        return;
    };
    let ranked = &report.top_campaigns.groups;

    grouped_bars(
        ui,
        "campaign_metrics",
        "Campaign Metrics Comparison",
        ranked,
        &[
            ("Conversions", |g| Some(g.totals.conversions as f64)),
            ("Clicks", |g| Some(g.totals.clicks as f64)),
            ("Impressions", |g| Some(g.totals.impressions as f64)),
        ],
    );

    campaign_scatter(ui, &dataset);
    metrics_table(ui, "campaign_table", ranked, GroupKey::Campaign);
}

pub fn channel_tab(ui: &mut Ui, report: &Report) {
    ui.heading("Marketing Channel Performance");
    let channels = report.groups(GroupKey::Channel);

    grouped_bars(
        ui,
        "channel_metrics",
        "Channel Performance Metrics",
        channels,
        &[
            ("CTR %", |g| g.rates.and_then(|r| r.ctr)),
            ("Conversion Rate %", |g| g.rates.and_then(|r| r.conversion_rate)),
            ("ROAS", |g| g.rates.and_then(|r| r.roas)),
        ],
    );

    group_scatter(ui, "channel_roi", "Channel ROI Analysis", channels);
    metrics_table(ui, "channel_table", channels, GroupKey::Channel);
}

pub fn demographics_tab(ui: &mut Ui, report: &Report) {
    ui.heading("Demographics Analysis");

    ui.columns(2, |cols| {
        grouped_bars(
            &mut cols[0],
            "age_conversions",
            "Conversions by Age Group",
            report.groups(GroupKey::AgeGroup),
            &[("Conversions", |g| Some(g.totals.conversions as f64))],
        );
        grouped_bars(
            &mut cols[1],
            "gender_revenue",
            "Revenue by Gender",
            report.groups(GroupKey::Gender),
            &[("Revenue", |g| Some(g.totals.revenue))],
        );
    });

    grouped_bars(
        ui,
        "location_metrics",
        "Performance by Location",
        report.groups(GroupKey::Location),
        &[
            ("Conversions", |g| Some(g.totals.conversions as f64)),
            ("Revenue", |g| Some(g.totals.revenue)),
            ("Total Spend", |g| Some(g.totals.spend)),
        ],
    );
}

pub fn time_tab(ui: &mut Ui, report: &Report) {
    ui.heading("Time-Based Analysis");
    let months = report.groups(GroupKey::Month);

    line_chart(
        ui,
        "time_metrics",
        "Campaign Metrics Over Time",
        months,
        &[
            ("Impressions", |g| g.totals.impressions as f64),
            ("Clicks", |g| g.totals.clicks as f64),
            ("Conversions", |g| g.totals.conversions as f64),
        ],
    );
    line_chart(
        ui,
        "revenue_trend",
        "Revenue Trend Over Time",
        months,
        &[("Revenue", |g| g.totals.revenue)],
    );
}

// ---------------------------------------------------------------------------
// Chart building blocks
// ---------------------------------------------------------------------------

type BarValue = fn(&GroupMetrics) -> Option<f64>;
type LineValue = fn(&GroupMetrics) -> f64;

/// X-axis labels for categorical charts plotted at integer positions.
fn category_axis(labels: Vec<String>) -> impl Fn(GridMark, &RangeInclusive<f64>) -> String {
    move |mark, _range| {
        let idx = mark.value.round();
        if (mark.value - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        labels.get(idx as usize).cloned().unwrap_or_default()
    }
}

fn group_labels(groups: &[GroupMetrics]) -> Vec<String> {
    groups.iter().map(|g| g.label.clone()).collect()
}

/// One bar per group and series, series side by side.  Undefined values
/// (zero-denominator rates) are left out.
fn grouped_bars(
    ui: &mut Ui,
    id: &str,
    title: &str,
    groups: &[GroupMetrics],
    series: &[(&str, BarValue)],
) {
    ui.strong(title);
    let colors = generate_palette(series.len());
    let width = 0.8 / series.len().max(1) as f64;

    Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_formatter(category_axis(group_labels(groups)))
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (i, (name, value)) in series.iter().enumerate() {
                let offset = (i as f64 - (series.len() as f64 - 1.0) / 2.0) * width;
                let bars: Vec<Bar> = groups
                    .iter()
                    .enumerate()
                    .filter_map(|(x, g)| match value(g) {
                        Some(v) => Some(Bar::new(x as f64 + offset, v).width(width).name(&g.label)),
                        None => {
                            log::debug!("{title}: {name} undefined for '{}'", g.label);
                            None
                        }
                    })
                    .collect();
                plot_ui.bar_chart(BarChart::new(bars).name(*name).color(colors[i]));
            }
        });
}

fn line_chart(
    ui: &mut Ui,
    id: &str,
    title: &str,
    groups: &[GroupMetrics],
    series: &[(&str, LineValue)],
) {
    ui.strong(title);
    let colors = generate_palette(series.len());

    Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_formatter(category_axis(group_labels(groups)))
        .allow_scroll(false)
        .show(ui, |plot_ui| {
            for (i, (name, value)) in series.iter().enumerate() {
                let points: PlotPoints = groups
                    .iter()
                    .enumerate()
                    .map(|(x, g)| [x as f64, value(g)])
                    .collect();
                plot_ui.line(Line::new(points).name(*name).color(colors[i]).width(2.0));
            }
        });
}

struct ScatterPoint {
    label: String,
    spend: f64,
    revenue: f64,
    conversions: u64,
    detail: String,
}

/// Spend vs revenue, marker area scaled by conversions.
fn scatter(ui: &mut Ui, id: &str, title: &str, points: Vec<ScatterPoint>) {
    ui.strong(title);
    let colors = ColorMap::new(points.iter().map(|p| p.label.as_str()));
    let max_conv = points.iter().map(|p| p.conversions).max().unwrap_or(0).max(1) as f64;

    let hover: Vec<(String, f64, f64, String)> = points
        .iter()
        .map(|p| (p.label.clone(), p.spend, p.revenue, p.detail.clone()))
        .collect();

    Plot::new(id)
        .height(CHART_HEIGHT)
        .legend(Legend::default())
        .x_axis_label("Total Spend")
        .y_axis_label("Revenue")
        .allow_scroll(false)
        .label_formatter(move |name: &str, value: &PlotPoint| {
            let nearest = hover
                .iter()
                .filter(|(label, ..)| label == name)
                .min_by(|a, b| {
                    let da = (a.1 - value.x).hypot(a.2 - value.y);
                    let db = (b.1 - value.x).hypot(b.2 - value.y);
                    da.total_cmp(&db)
                });
            match nearest {
                Some((label, spend, revenue, detail)) => format!(
                    "{label}\nspend {}\nrevenue {}\n{detail}",
                    format_currency(*spend),
                    format_currency(*revenue)
                ),
                None => format!("{}\n{}", format_currency(value.x), format_currency(value.y)),
            }
        })
        .show(ui, |plot_ui| {
            for p in &points {
                let radius = 3.0 + 9.0 * (p.conversions as f64 / max_conv).sqrt();
                plot_ui.points(
                    Points::new(vec![[p.spend, p.revenue]])
                        .radius(radius as f32)
                        .filled(true)
                        .color(colors.color_for(&p.label))
                        .name(&p.label),
                );
            }
        });
}

/// One marker per campaign row, as the rows appear in the file.
fn campaign_scatter(ui: &mut Ui, dataset: &Dataset) {
    let points = dataset
        .records
        .iter()
        .map(|rec| {
            let rates = record_rates(rec);
            ScatterPoint {
                label: rec.campaign_name.clone(),
                spend: rec.total_spend,
                revenue: rec.revenue_generated,
                conversions: rec.conversions,
                detail: format!(
                    "conversion rate {}\nROAS {}",
                    format_percent(rates.conversion_rate),
                    format_multiplier(rates.roas)
                ),
            }
        })
        .collect();
    scatter(ui, "campaign_roas", "Campaign ROAS Analysis", points);
}

fn group_scatter(ui: &mut Ui, id: &str, title: &str, groups: &[GroupMetrics]) {
    let points = groups
        .iter()
        .map(|g| ScatterPoint {
            label: g.label.clone(),
            spend: g.totals.spend,
            revenue: g.totals.revenue,
            conversions: g.totals.conversions,
            detail: format!("ROAS {}", format_multiplier(g.totals.roas())),
        })
        .collect();
    scatter(ui, id, title, points);
}

// ---------------------------------------------------------------------------
// Table
// ---------------------------------------------------------------------------

fn metrics_table(ui: &mut Ui, id: &str, groups: &[GroupMetrics], key: GroupKey) {
    let mut titles = vec![
        key.label(),
        "Rows",
        "Impressions",
        "Clicks",
        "Conversions",
        "Spend",
        "Revenue",
    ];
    if key.derives_rates() {
        titles.extend(["CTR", "Conv. Rate", "ROAS"]);
    }

    ui.add_space(8.0);
    ui.push_id(id, |ui: &mut Ui| {
        TableBuilder::new(ui)
            .striped(true)
            .vscroll(false)
            .column(Column::auto().at_least(140.0))
            .columns(Column::auto().at_least(70.0), titles.len() - 1)
            .header(20.0, |mut header| {
                for title in &titles {
                    header.col(|ui: &mut Ui| {
                        ui.strong(*title);
                    });
                }
            })
            .body(|mut body| {
                for g in groups {
                    let mut cells = vec![
                        g.label.clone(),
                        g.rows.to_string(),
                        format_count(g.totals.impressions),
                        format_count(g.totals.clicks),
                        format_count(g.totals.conversions),
                        format_currency(g.totals.spend),
                        format_currency(g.totals.revenue),
                    ];
                    if let Some(rates) = g.rates {
                        cells.push(format_percent(rates.ctr));
                        cells.push(format_percent(rates.conversion_rate));
                        cells.push(format_multiplier(rates.roas));
                    }
                    body.row(18.0, |mut row| {
                        for cell in &cells {
                            row.col(|ui: &mut Ui| {
                                ui.label(cell.as_str());
                            });
                        }
                    });
                }
            });
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mark(value: f64) -> GridMark {
        GridMark {
            value,
            step_size: 1.0,
        }
    }

    #[test]
    fn category_axis_labels_integer_ticks_only() {
        let fmt = category_axis(vec!["Email".to_string(), "Social".to_string()]);
        assert_eq!(fmt(mark(0.0), &(0.0..=1.0)), "Email");
        assert_eq!(fmt(mark(1.0), &(0.0..=1.0)), "Social");
        assert_eq!(fmt(mark(0.5), &(0.0..=1.0)), "");
        assert_eq!(fmt(mark(2.0), &(0.0..=1.0)), "");
        assert_eq!(fmt(mark(-1.0), &(0.0..=1.0)), "");
    }
}
