//! egui rendering: toolbar and KPI strip (`panels`), tab contents (`charts`).

pub mod charts;
pub mod panels;
