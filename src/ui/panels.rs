use eframe::egui::{self, Color32, RichText, Ui};

use crate::data::kpi::KpiSet;
use crate::state::{AppState, Tab};

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
            let can_reload = state.store.is_some();
            if ui
                .add_enabled(can_reload, egui::Button::new("Reload"))
                .clicked()
            {
                state.reload();
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(store) = &state.store {
            let rows = state.report.as_ref().map_or(0, |r| r.rows);
            ui.label(format!(
                "{rows} campaigns loaded from {}",
                store
                    .path()
                    .file_name()
                    .map(|n| n.to_string_lossy())
                    .unwrap_or_default()
            ))
            .on_hover_text(format!(
                "{}\nloaded {}",
                store.path().display(),
                store.loaded_at().format("%Y-%m-%d %H:%M:%S")
            ));
        }

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// KPI strip
// ---------------------------------------------------------------------------

/// Render the KPI set as a five-column grid of metric cards.
pub fn kpi_strip(ui: &mut Ui, kpis: &KpiSet) {
    ui.heading("Key Performance Indicators");
    ui.add_space(4.0);

    egui::Grid::new("kpi_grid")
        .num_columns(5)
        .spacing([32.0, 12.0])
        .show(ui, |ui: &mut Ui| {
            for (i, (label, value)) in kpis.iter().enumerate() {
                ui.vertical(|ui: &mut Ui| {
                    ui.label(RichText::new(label).small().weak());
                    ui.label(RichText::new(value).size(20.0).strong());
                });
                if i % 5 == 4 {
                    ui.end_row();
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Tab selector
// ---------------------------------------------------------------------------

pub fn tab_bar(ui: &mut Ui, active: &mut Tab) {
    ui.horizontal(|ui: &mut Ui| {
        for tab in Tab::ALL {
            ui.selectable_value(active, tab, RichText::new(tab.title()).strong());
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open campaign data")
        .add_filter("Supported files", &["csv", "json", "parquet", "pq"])
        .add_filter("CSV", &["csv"])
        .add_filter("JSON", &["json"])
        .add_filter("Parquet", &["parquet", "pq"])
        .pick_file();

    if let Some(path) = file {
        log::info!("Opening {}", path.display());
        state.open_path(path);
    }
}
