//! Main application window and persistent user settings.

use chrono::{Local, NaiveDate};
use dirs_next as dirs;
use eframe::{App, Frame, NativeOptions, egui};
use egui_extras::DatePickerButton;
use egui_plot::{Corner, Legend, Plot, Points};
use log::{error, info, warn};
use rfd::FileDialog;
use serde::{Deserialize, Serialize};

mod bmi;
use bmi::{BmiProfile, compute_bmi};
mod error;
use error::TrackerError;
mod input;
use input::{format_date, parse_iso_date};
mod plotting;
use plotting::{CHART_TITLE, WeightChart, nearest_point, render_time_series, x_to_label};
mod report;
use report::save_chart_png;
mod store;
use store::{RecordStore, WeightRecord, default_db_path};
mod table;
use table::{WeightTable, format_table, format_weight};

const ABOUT_TEXT: &str = "A simple weight tracker.\n\n\
Add your weight and the date of the measurement, then view the records \
in a table or plot them over time. Enter your height and press \
\"Add BMI to plot\" to shade the underweight, normal, overweight and obese \
ranges on the chart.\n\n\
Records are stored in weight.db next to the program.";

fn default_plot_width() -> f32 {
    480.0
}

fn default_plot_height() -> f32 {
    320.0
}

fn default_export_width() -> u32 {
    1000
}

fn default_export_height() -> u32 {
    600
}

/// Persistent user preferences.
///
/// Stored as JSON in the user config directory. Every field has a serde
/// default so files written by older versions still load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Settings {
    #[serde(default = "default_plot_width")]
    plot_width: f32,
    #[serde(default = "default_plot_height")]
    plot_height: f32,
    #[serde(default = "default_export_width")]
    export_width: u32,
    #[serde(default = "default_export_height")]
    export_height: u32,
}

impl Settings {
    const FILE: &'static str = "weight_tracker_settings.json";

    fn path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|p| p.join(Self::FILE))
    }

    /// Load settings, falling back to defaults when the file is missing or
    /// unreadable.
    fn load() -> Self {
        if let Some(path) = Self::path() {
            if let Ok(data) = std::fs::read_to_string(&path) {
                match serde_json::from_str(&data) {
                    Ok(cfg) => return cfg,
                    Err(e) => warn!("Ignoring invalid settings file {}: {e}", path.display()),
                }
            }
        }
        Self::default()
    }

    fn save(&self) {
        if let Some(path) = Self::path() {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            match serde_json::to_string_pretty(self) {
                Ok(data) => {
                    if let Err(e) = std::fs::write(&path, data) {
                        error!("Failed to save settings to {}: {e}", path.display());
                    }
                }
                Err(e) => error!("Failed to serialize settings: {e}"),
            }
        }
    }

    fn export_size(&self) -> (u32, u32) {
        (self.export_width.max(100), self.export_height.max(100))
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            plot_width: default_plot_width(),
            plot_height: default_plot_height(),
            export_width: default_export_width(),
            export_height: default_export_height(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NoticeLevel {
    Info,
    Warning,
    Error,
}

impl NoticeLevel {
    fn title(self) -> &'static str {
        match self {
            NoticeLevel::Info => "Success",
            NoticeLevel::Warning => "Warning",
            NoticeLevel::Error => "Error",
        }
    }
}

/// One-shot message shown in a modal dialog.
#[derive(Debug, Clone, PartialEq)]
struct Notice {
    level: NoticeLevel,
    text: String,
}

impl Notice {
    fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }

    fn from_error(err: &TrackerError) -> Self {
        let level = match err {
            TrackerError::EmptyInput => NoticeLevel::Warning,
            _ => NoticeLevel::Error,
        };
        Self {
            level,
            text: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Menu,
    About,
}

struct WeightTrackerApp {
    store: Result<RecordStore, String>,
    settings: Settings,
    settings_dirty: bool,
    show_settings: bool,
    tab: Tab,
    weight_text: String,
    date_text: String,
    picked_date: NaiveDate,
    height_text: String,
    bmi: Option<BmiProfile>,
    table: Option<WeightTable>,
    chart: Option<WeightChart>,
    notice: Option<Notice>,
}

impl WeightTrackerApp {
    fn new(store: Result<RecordStore, String>, settings: Settings) -> Self {
        let today = Local::now().date_naive();
        let notice = store
            .as_ref()
            .err()
            .map(|e| Notice::from_error(&TrackerError::StoreUnavailable(e.clone())));
        Self {
            store,
            settings,
            settings_dirty: false,
            show_settings: false,
            tab: Tab::Menu,
            weight_text: String::new(),
            date_text: format_date(today),
            picked_date: today,
            height_text: String::new(),
            bmi: None,
            table: None,
            chart: None,
            notice,
        }
    }

    fn store_mut(&mut self) -> Result<&mut RecordStore, TrackerError> {
        self.store
            .as_mut()
            .map_err(|e| TrackerError::StoreUnavailable(e.clone()))
    }

    fn records(&mut self) -> Result<Vec<WeightRecord>, TrackerError> {
        self.store_mut()?.fetch_all()
    }

    fn report(&mut self, err: TrackerError) {
        if err.is_user_error() {
            warn!("{err}");
        } else {
            error!("{err}");
        }
        self.notice = Some(Notice::from_error(&err));
    }

    fn add_record(&mut self) {
        let (date, weight) = (self.date_text.clone(), self.weight_text.clone());
        let result = self.store_mut().and_then(|s| s.upsert(&date, &weight));
        match result {
            Ok(outcome) => {
                self.notice = Some(Notice::info(outcome.message()));
                self.refresh_open_views();
            }
            Err(e) => self.report(e),
        }
    }

    fn view_table(&mut self) {
        match self.records().and_then(|r| format_table(&r)) {
            Ok(table) => self.table = Some(table),
            Err(e) => self.report(e),
        }
    }

    fn view_plot(&mut self) {
        let bmi = self.bmi;
        match self
            .records()
            .and_then(|r| render_time_series(&r, bmi.as_ref()))
        {
            Ok(chart) => self.chart = Some(chart),
            Err(e) => self.report(e),
        }
    }

    fn calculate_bmi(&mut self) {
        match compute_bmi(&self.weight_text, &self.height_text) {
            Ok(profile) => {
                self.notice = Some(Notice::info(format!(
                    "Your BMI is {:.2} ({}). BMI ranges will be shown on the plot.",
                    profile.bmi,
                    profile.category().label()
                )));
                self.bmi = Some(profile);
                self.refresh_open_views();
            }
            Err(e) => self.report(e),
        }
    }

    /// Rebuild the table and chart windows that are currently open.
    fn refresh_open_views(&mut self) {
        if self.table.is_some() {
            self.view_table();
        }
        if self.chart.is_some() {
            self.view_plot();
        }
    }

    fn export_plot(&mut self, path: &std::path::Path) {
        let Some(chart) = self.chart.as_ref() else {
            return;
        };
        match save_chart_png(chart, path, self.settings.export_size()) {
            Ok(()) => {
                self.notice = Some(Notice::info(format!("Plot saved to {}", path.display())));
            }
            Err(e) => {
                error!("Failed to save plot: {e}");
                self.notice = Some(Notice::error(format!("Failed to save plot: {e}")));
            }
        }
    }

    /// A pending notice blocks every other control until it is dismissed.
    fn is_modal(&self) -> bool {
        self.notice.is_some()
    }

    /// Point the date picker at the typed date once it is a valid date.
    fn sync_picked_date(&mut self) {
        if let Ok(date) = parse_iso_date(&self.date_text) {
            self.picked_date = date;
        }
    }

    fn menu_tab(&mut self, ui: &mut egui::Ui) {
        let button = [180.0, 32.0];
        ui.vertical_centered(|ui| {
            ui.label("Enter your weight (Kg):");
            ui.text_edit_singleline(&mut self.weight_text);

            ui.label("Enter the date (YYYY-MM-DD):");
            ui.horizontal(|ui| {
                if ui.text_edit_singleline(&mut self.date_text).changed() {
                    self.sync_picked_date();
                }
                if ui
                    .add(DatePickerButton::new(&mut self.picked_date).id_source("record_date"))
                    .changed()
                {
                    self.date_text = format_date(self.picked_date);
                }
            });

            if ui.add_sized(button, egui::Button::new("Add record")).clicked() {
                self.add_record();
            }
            if ui.add_sized(button, egui::Button::new("View table")).clicked() {
                self.view_table();
            }
            if ui.add_sized(button, egui::Button::new("View plot")).clicked() {
                self.view_plot();
            }

            ui.separator();
            ui.label("Enter your height (cm):");
            ui.text_edit_singleline(&mut self.height_text);
            if ui
                .add_sized(button, egui::Button::new("Add BMI to plot"))
                .clicked()
            {
                self.calculate_bmi();
            }
            if let Some(profile) = self.bmi {
                ui.horizontal(|ui| {
                    ui.label(format!(
                        "BMI {:.2} ({}) at {} cm",
                        profile.bmi,
                        profile.category().label(),
                        profile.height_cm
                    ));
                    if ui.small_button("Clear").clicked() {
                        self.bmi = None;
                        self.refresh_open_views();
                    }
                });
            }
        });
    }

    fn table_window(&mut self, ctx: &egui::Context) {
        let Some(table) = self.table.as_ref() else {
            return;
        };
        let mut open = true;
        egui::Window::new("Weight Records")
            .open(&mut open)
            .enabled(!self.is_modal())
            .default_size([400.0, 400.0])
            .vscroll(true)
            .show(ctx, |ui| {
                if ui.button("Copy as text").clicked() {
                    ui.output_mut(|o| o.copied_text = table.to_string());
                }
                let row_height = ui.text_style_height(&egui::TextStyle::Body);
                egui_extras::TableBuilder::new(ui)
                    .striped(true)
                    .resizable(true)
                    .column(egui_extras::Column::auto())
                    .column(egui_extras::Column::auto())
                    .column(egui_extras::Column::auto())
                    .header(row_height, |mut header| {
                        header.col(|ui| {
                            ui.strong("#");
                        });
                        header.col(|ui| {
                            ui.strong("Date");
                        });
                        header.col(|ui| {
                            ui.strong("Weight (kg)");
                        });
                    })
                    .body(|mut body| {
                        for row in &table.rows {
                            body.row(row_height, |mut r| {
                                r.col(|ui| {
                                    ui.label(row.index.to_string());
                                });
                                r.col(|ui| {
                                    ui.label(format_date(row.date));
                                });
                                r.col(|ui| {
                                    ui.label(format_weight(row.weight));
                                });
                            });
                        }
                    });
            });
        if !open {
            self.table = None;
        }
    }

    fn plot_window(&mut self, ctx: &egui::Context) {
        let Some(chart) = self.chart.as_ref() else {
            return;
        };
        let mut open = true;
        let mut save_clicked = false;
        egui::Window::new("Weight Progress Plot")
            .open(&mut open)
            .enabled(!self.is_modal())
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.heading(CHART_TITLE);
                    if ui.button("Save PNG...").clicked() {
                        save_clicked = true;
                    }
                });
                let mut highlight: Option<[f64; 2]> = None;
                let resp = Plot::new("weight_plot")
                    .width(self.settings.plot_width)
                    .height(self.settings.plot_height)
                    .x_axis_label("Date")
                    .y_axis_label("Weight")
                    .x_axis_formatter(|mark, _chars, _| x_to_label(mark.value))
                    .legend(Legend::default().position(Corner::RightBottom))
                    .show(ui, |plot_ui| {
                        let pointer = plot_ui.pointer_coordinate();
                        chart.show(plot_ui);
                        if let Some(p) = pointer.and_then(|ptr| nearest_point(ptr, &chart.points))
                        {
                            highlight = Some(p);
                            plot_ui.points(
                                Points::new(vec![p])
                                    .color(egui::Color32::YELLOW)
                                    .highlight(true),
                            );
                        }
                    });
                if let Some(p) = highlight {
                    if resp.response.hovered() {
                        egui::show_tooltip_at_pointer(ctx, egui::Id::new("plot_tip_weight"), |ui| {
                            ui.label(format!("{}: {} kg", x_to_label(p[0]), format_weight(p[1])));
                        });
                    }
                }
            });
        if !open {
            self.chart = None;
        } else if save_clicked {
            if let Some(path) = FileDialog::new()
                .add_filter("PNG", &["png"])
                .set_file_name("weight_plot.png")
                .save_file()
            {
                self.export_plot(&path);
            }
        }
    }

    fn settings_window(&mut self, ctx: &egui::Context) {
        if !self.show_settings {
            return;
        }
        let mut open = self.show_settings;
        let mut dirty = false;
        let enabled = !self.is_modal();
        let settings = &mut self.settings;
        egui::Window::new("Settings")
            .open(&mut open)
            .enabled(enabled)
            .show(ctx, |ui| {
                egui::Grid::new("settings_grid").num_columns(2).show(ui, |ui| {
                    ui.label("Plot width");
                    dirty |= ui
                        .add(egui::DragValue::new(&mut settings.plot_width).clamp_range(200.0..=2000.0))
                        .changed();
                    ui.end_row();
                    ui.label("Plot height");
                    dirty |= ui
                        .add(egui::DragValue::new(&mut settings.plot_height).clamp_range(150.0..=1500.0))
                        .changed();
                    ui.end_row();
                    ui.label("PNG width");
                    dirty |= ui
                        .add(egui::DragValue::new(&mut settings.export_width).clamp_range(100..=4000))
                        .changed();
                    ui.end_row();
                    ui.label("PNG height");
                    dirty |= ui
                        .add(egui::DragValue::new(&mut settings.export_height).clamp_range(100..=4000))
                        .changed();
                    ui.end_row();
                });
                if ui.button("Reset to defaults").clicked() {
                    *settings = Settings::default();
                    dirty = true;
                }
            });
        self.show_settings = open;
        self.settings_dirty |= dirty;
    }

    fn notice_dialog(&mut self, ctx: &egui::Context) {
        let Some(notice) = self.notice.as_ref() else {
            return;
        };
        let mut dismissed = false;
        egui::Window::new(notice.level.title())
            .id(egui::Id::new("notice_dialog"))
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(&notice.text);
                ui.vertical_centered(|ui| {
                    if ui.button("OK").clicked() {
                        dismissed = true;
                    }
                });
            });
        if dismissed {
            self.notice = None;
        }
    }

    fn draw(&mut self, ctx: &egui::Context) {
        let enabled = !self.is_modal();
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            ui.set_enabled(enabled);
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Settings").clicked() {
                        self.show_settings = true;
                        ui.close_menu();
                    }
                    if ui.button("Quit").clicked() {
                        ui.ctx().send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.set_enabled(enabled);
            ui.horizontal(|ui| {
                ui.selectable_value(&mut self.tab, Tab::Menu, "Menu");
                ui.selectable_value(&mut self.tab, Tab::About, "About");
            });
            ui.separator();
            match self.tab {
                Tab::Menu => self.menu_tab(ui),
                Tab::About => {
                    ui.label(egui::RichText::new(ABOUT_TEXT).size(14.0));
                }
            }
        });

        self.table_window(ctx);
        self.plot_window(ctx);
        self.settings_window(ctx);
        self.notice_dialog(ctx);

        if self.settings_dirty {
            self.settings.save();
            self.settings_dirty = false;
        }
    }
}

impl App for WeightTrackerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.draw(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.settings.save();
    }
}

fn main() -> eframe::Result<()> {
    env_logger::init();
    let settings = Settings::load();
    let db_path = default_db_path();
    let store = RecordStore::open(&db_path).map_err(|e| {
        error!("Failed to open {}: {e}", db_path.display());
        format!("{} ({e})", db_path.display())
    });
    info!("Starting weight tracker");
    let options = NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Weight Tracker")
            .with_inner_size([500.0, 500.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Weight Tracker",
        options,
        Box::new(move |_cc| Box::new(WeightTrackerApp::new(store, settings))),
    )
}
