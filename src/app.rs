use eframe::egui::{self, ScrollArea, Ui};

use crate::state::{AppState, Tab};
use crate::ui::{charts, panels};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct CampaignDashApp {
    pub state: AppState,
}

impl CampaignDashApp {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }
}

impl eframe::App for CampaignDashApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // ---- Top panel: menu bar ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &mut self.state);
        });

        // ---- Central panel: KPIs + tabs ----
        egui::CentralPanel::default().show(ctx, |ui| {
            let Some(report) = &self.state.report else {
                ui.centered_and_justified(|ui: &mut Ui| {
                    ui.heading("Open a campaign file to begin  (File → Open…)");
                });
                return;
            };

            panels::kpi_strip(ui, &report.kpis);
            ui.separator();
            panels::tab_bar(ui, &mut self.state.active_tab);
            ui.separator();

            ScrollArea::vertical()
                .auto_shrink([false, false])
                .show(ui, |ui: &mut Ui| match self.state.active_tab {
                    Tab::Campaign => charts::campaign_tab(ui, &mut self.state),
                    Tab::Channel => {
                        if let Some(report) = &self.state.report {
                            charts::channel_tab(ui, report);
                        }
                    }
                    Tab::Demographics => {
                        if let Some(report) = &self.state.report {
                            charts::demographics_tab(ui, report);
                        }
                    }
                    Tab::Time => {
                        if let Some(report) = &self.state.report {
                            charts::time_tab(ui, report);
                        }
                    }
                });
        });
    }
}
