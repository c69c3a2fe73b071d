use eframe::egui::{self, Align, Align2, Color32, RichText};
use rfd::FileDialog;

use super::{DashboardApp, Tab};
use crate::registry::{UploadRecord, UploadStatus};
use crate::utils::file_size::format_size;
use crate::utils::style;
use crate::worker::WorkerCommand;

impl DashboardApp {
    pub fn render(&mut self, ctx: &egui::Context) {
        self.render_sidebar(ctx);
        self.render_central(ctx);
        self.render_delete_modal(ctx);
    }

    fn render_sidebar(&mut self, ctx: &egui::Context) {
        egui::SidePanel::left("sidebar")
            .resizable(false)
            .exact_width(230.0)
            .show(ctx, |ui| {
                ui.add_space(14.0);
                ui.heading("Apriel Lab");
                ui.label(
                    RichText::new("PDF research console")
                        .small()
                        .color(ui.visuals().text_color().gamma_multiply(0.7)),
                );
                ui.add_space(10.0);
                ui.separator();

                for tab in [Tab::Dashboard, Tab::Database, Tab::Analysis] {
                    let label = format!("{} {}", tab_glyph(tab), tab.title());
                    if ui.selectable_label(self.view.tab == tab, label).clicked() {
                        self.view.tab = tab;
                    }
                }

                ui.add_space(10.0);
                ui.separator();
                ui.horizontal(|ui| {
                    ui.label(
                        RichText::new(format!("Documents ({})", self.registry.len()))
                            .small()
                            .strong(),
                    );
                    if ui
                        .small_button("🔄")
                        .on_hover_text("Refresh from backend")
                        .clicked()
                    {
                        self.worker.send(WorkerCommand::PollNow);
                    }
                });
                ui.add_space(4.0);

                egui::ScrollArea::vertical()
                    .id_source("sidebar_documents")
                    .max_height((ui.available_height() - 70.0).max(40.0))
                    .show(ui, |ui| {
                        for record in self.registry.records() {
                            ui.horizontal(|ui| {
                                ui.label(style::status_glyph(&record.status));
                                ui.label(RichText::new(short_name(&record.name)).small())
                                    .on_hover_text(&record.name);
                            });
                        }
                    });

                ui.with_layout(egui::Layout::bottom_up(Align::Min), |ui| {
                    ui.add_space(8.0);
                    ui.label(
                        RichText::new("Local Engine: Ollama 3.2")
                            .small()
                            .color(style::PENDING),
                    );
                    ui.label(
                        RichText::new(format!("Backend: {}", self.config.base_url))
                            .small()
                            .color(style::PENDING),
                    );
                });
            });
    }

    fn render_central(&mut self, ctx: &egui::Context) {
        let tab = self.view.tab;
        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| match tab {
                Tab::Dashboard => self.render_dashboard(ui),
                Tab::Database => self.render_database(ui),
                Tab::Analysis => self.render_analysis(ui),
            });
        });
    }

    fn render_dashboard(&mut self, ui: &mut egui::Ui) {
        ui.add_space(16.0);
        ui.vertical_centered(|ui| {
            ui.heading("PDF Management Dashboard");
            ui.add_space(4.0);
            ui.label(
                RichText::new("Upload and manage PDF documents for embedding and vectorization")
                    .color(ui.visuals().text_color().gamma_multiply(0.7)),
            );
        });

        ui.add_space(16.0);
        let stats = self.registry.stats();
        ui.columns(4, |columns| {
            let text = columns[0].visuals().text_color();
            stat_card(&mut columns[0], "Total Files", stats.total, text);
            stat_card(&mut columns[1], "Completed", stats.completed, style::SUCCESS);
            stat_card(&mut columns[2], "Processing", stats.processing, style::INFO);
            stat_card(&mut columns[3], "Errors", stats.errors, style::ERROR);
        });

        ui.add_space(16.0);
        self.render_drop_zone(ui);

        if let Some(rejected) = self.view.rejected_notice {
            ui.add_space(6.0);
            ui.vertical_centered(|ui| {
                ui.colored_label(
                    style::PENDING,
                    format!("⏩ Skipped {rejected} non-PDF file(s)"),
                );
            });
        }

        if let Some(line) = activity_line(self.registry.records()) {
            ui.add_space(6.0);
            ui.vertical_centered(|ui| {
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label(line);
                });
            });
        }

        ui.add_space(16.0);
        self.render_upload_rows(ui);
        ui.add_space(20.0);
    }

    fn render_drop_zone(&mut self, ui: &mut egui::Ui) {
        let hovering = ui.ctx().input(|i| !i.raw.hovered_files.is_empty());
        let stroke = if hovering {
            egui::Stroke::new(2.0, style::ACCENT)
        } else {
            egui::Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color)
        };

        egui::Frame::none()
            .stroke(stroke)
            .rounding(8.0)
            .inner_margin(egui::Margin::symmetric(16.0, 28.0))
            .show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.label(RichText::new("📄").size(34.0));
                    ui.add_space(4.0);
                    if hovering {
                        ui.label(RichText::new("Drop the PDF files here...").strong());
                    } else {
                        ui.label("Drag & drop PDF files or folders here");
                    }
                    ui.label(
                        RichText::new("Only PDF files are supported")
                            .small()
                            .color(style::PENDING),
                    );
                    ui.add_space(8.0);
                    ui.horizontal(|ui| {
                        if ui.button("📁 Select Files").clicked() {
                            if let Some(paths) = FileDialog::new()
                                .add_filter("PDF documents", &["pdf"])
                                .pick_files()
                            {
                                self.ingest_paths(paths);
                            }
                        }
                        if ui.button("📂 Select Folder").clicked() {
                            if let Some(dir) = FileDialog::new().pick_folder() {
                                self.ingest_paths(vec![dir]);
                            }
                        }
                    });
                });
            });
    }

    fn render_upload_rows(&mut self, ui: &mut egui::Ui) {
        if self.registry.is_empty() {
            ui.vertical_centered(|ui| {
                ui.label(
                    RichText::new("No documents yet. Drop a PDF to get started.")
                        .color(style::PENDING),
                );
            });
            return;
        }

        let mut delete_intent: Option<(String, String)> = None;
        egui::Frame::none()
            .fill(ui.style().visuals.extreme_bg_color)
            .rounding(6.0)
            .inner_margin(8.0)
            .show(ui, |ui| {
                for record in self.registry.records() {
                    ui.horizontal(|ui| {
                        ui.label(style::status_glyph(&record.status));
                        ui.colored_label(style::status_color(&record.status), &record.name);
                        ui.label(
                            RichText::new(format_size(record.size))
                                .small()
                                .color(style::PENDING),
                        );
                        if let Some(message) = record.status.error_message() {
                            ui.colored_label(style::ERROR, message);
                        }
                        ui.with_layout(egui::Layout::right_to_left(Align::Center), |ui| {
                            if ui.small_button("🗑").clicked() {
                                delete_intent = Some((record.id.clone(), record.name.clone()));
                            }
                        });
                    });
                    ui.add_space(4.0);
                }
            });
        if let Some((id, name)) = delete_intent {
            self.request_delete(id, name);
        }
    }

    fn render_database(&mut self, ui: &mut egui::Ui) {
        ui.add_space(16.0);
        ui.heading("SQL Database");
        ui.label(
            RichText::new("Metadata for every stored document")
                .color(ui.visuals().text_color().gamma_multiply(0.7)),
        );
        ui.add_space(12.0);

        if self.registry.is_empty() {
            ui.label(RichText::new("Nothing stored yet.").color(style::PENDING));
            return;
        }

        let mut delete_intent: Option<(String, String)> = None;
        egui::Grid::new("database_table")
            .striped(true)
            .min_col_width(60.0)
            .spacing([24.0, 8.0])
            .show(ui, |ui| {
                for header in ["Name", "Size", "Uploaded", "Status", "Details", ""] {
                    ui.label(RichText::new(header).strong());
                }
                ui.end_row();

                for record in self.registry.records() {
                    ui.label(&record.name);
                    ui.label(format_size(record.size));
                    ui.label(record.upload_date.format("%Y-%m-%d %H:%M").to_string());
                    ui.colored_label(style::status_color(&record.status), record.status.label());
                    if let Some(message) = record.status.error_message() {
                        ui.colored_label(style::ERROR, message);
                    } else if let Some(preview) = &record.preview {
                        ui.label(RichText::new(short_name(preview)).small())
                            .on_hover_text(preview);
                    } else {
                        ui.label("-");
                    }
                    if ui.small_button("🗑").clicked() {
                        delete_intent = Some((record.id.clone(), record.name.clone()));
                    }
                    ui.end_row();
                }
            });
        if let Some((id, name)) = delete_intent {
            self.request_delete(id, name);
        }
    }

    fn render_analysis(&mut self, ui: &mut egui::Ui) {
        ui.add_space(16.0);
        ui.heading("Swing Analysis");
        ui.label(
            RichText::new("Free-form notes are sent to the backend for analysis")
                .color(ui.visuals().text_color().gamma_multiply(0.7)),
        );
        ui.add_space(12.0);

        ui.group(|ui| {
            ui.label("Notes");
            ui.add(
                egui::TextEdit::multiline(&mut self.view.analysis.notes)
                    .desired_width(ui.available_width())
                    .desired_rows(6)
                    .hint_text("Describe what happened..."),
            );
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                ui.label("Incident id");
                ui.add(
                    egui::TextEdit::singleline(&mut self.view.analysis.incident_id)
                        .desired_width(180.0)
                        .hint_text("optional"),
                );
            });
            ui.add_space(8.0);
            let can_submit = self.view.analysis.can_submit();
            ui.add_enabled_ui(can_submit, |ui| {
                if ui.button("🔍 Analyze").clicked() {
                    self.submit_analysis();
                }
            });
        });

        ui.add_space(12.0);
        if self.view.analysis.in_flight {
            render_skeleton(ui);
        } else if let Some(error) = &self.view.analysis.error {
            ui.colored_label(style::ERROR, error);
        } else if let Some(result) = &self.view.analysis.result {
            ui.group(|ui| {
                ui.label(RichText::new("Analysis").strong());
                ui.add_space(4.0);
                egui::ScrollArea::vertical()
                    .id_source("analysis_result")
                    .max_height(320.0)
                    .show(ui, |ui| {
                        // rendered verbatim, whitespace and newlines intact
                        ui.add(egui::Label::new(RichText::new(result).monospace()).wrap(true));
                    });
            });
        }
    }

    fn render_delete_modal(&mut self, ctx: &egui::Context) {
        if let Some(pending) = self.view.pending_delete.clone() {
            // the record can vanish mid-confirm if a poll removed it
            if self.registry.get(&pending.id).is_none() {
                self.view.pending_delete = None;
                return;
            }
            egui::Window::new("Confirm deletion")
                .collapsible(false)
                .resizable(false)
                .anchor(Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
                .show(ctx, |ui| {
                    ui.label("Are you sure you want to delete this research?");
                    ui.label(RichText::new(&pending.name).strong());
                    ui.add_space(10.0);
                    ui.horizontal(|ui| {
                        if ui.button("🗑 Delete").clicked() {
                            self.confirm_delete();
                        }
                        if ui.button("Cancel").clicked() {
                            self.cancel_delete();
                        }
                    });
                });
        }
    }
}

fn tab_glyph(tab: Tab) -> &'static str {
    match tab {
        Tab::Dashboard => "🏠",
        Tab::Database => "🗄",
        Tab::Analysis => "📊",
    }
}

/// Spinner caption while files are queued or uploading. Worded for both
/// states, since a full pool leaves the backlog entirely queued.
fn activity_line(records: &[UploadRecord]) -> Option<String> {
    let active = records
        .iter()
        .filter(|r| matches!(r.status, UploadStatus::Queued | UploadStatus::Uploading))
        .count();
    (active > 0).then(|| format!("📤 {active} file(s) in progress..."))
}

fn stat_card(ui: &mut egui::Ui, title: &str, value: usize, color: Color32) {
    ui.group(|ui| {
        ui.vertical_centered(|ui| {
            ui.label(RichText::new(title).small().color(style::PENDING));
            ui.label(
                RichText::new(value.to_string())
                    .size(26.0)
                    .strong()
                    .color(color),
            );
        });
    });
}

/// Gray placeholder bars shown while the analysis request is in flight.
fn render_skeleton(ui: &mut egui::Ui) {
    ui.group(|ui| {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label(RichText::new("Analyzing notes...").color(style::PENDING));
        });
        ui.add_space(6.0);
        for width in [0.9, 0.75, 0.6] {
            let (rect, _) = ui.allocate_exact_size(
                egui::vec2(ui.available_width() * width, 10.0),
                egui::Sense::hover(),
            );
            ui.painter()
                .rect_filled(rect, 4.0, ui.visuals().faint_bg_color);
            ui.add_space(4.0);
        }
    });
}

fn short_name(name: &str) -> String {
    const MAX: usize = 26;
    if name.chars().count() <= MAX {
        name.to_string()
    } else {
        let head: String = name.chars().take(MAX - 1).collect();
        format!("{head}…")
    }
}
