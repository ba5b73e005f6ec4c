use eframe::egui;
use std::sync::mpsc::Receiver;

use webp2png::cli::DEFAULT_OUTPUT_DIR_NAME;
use webp2png::CancelToken;

#[path = "app_processing.rs"]
mod app_processing;

pub struct ConverterApp {
    // Input/Output paths
    input_path: String,
    output_name: String,

    // Conversion options
    overwrite: bool,
    compression_level: u8,

    // Processing state
    is_converting: bool,
    progress: f32,
    current_file: String,
    processed_count: usize,
    total_count: usize,

    // Transcript and results
    transcript: Vec<String>,
    results_message: String,
    error_message: String,
    show_summary_window: bool,

    // Communication with the background worker
    progress_receiver: Option<Receiver<ProgressMessage>>,
    cancel_token: Option<CancelToken>,
}

#[derive(Debug)]
pub(crate) enum ProgressMessage {
    Started {
        total: usize,
    },
    Progress {
        current: usize,
        total: usize,
        file: String,
    },
    Line(String),
    Complete {
        converted: usize,
        skipped: usize,
        failed: usize,
        message: String,
    },
    Error(String),
}

impl ConverterApp {
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        Self {
            input_path: String::new(),
            output_name: DEFAULT_OUTPUT_DIR_NAME.to_string(),
            overwrite: false,
            compression_level: 6,
            is_converting: false,
            progress: 0.0,
            current_file: String::new(),
            processed_count: 0,
            total_count: 0,
            transcript: Vec::new(),
            results_message: String::new(),
            error_message: String::new(),
            show_summary_window: false,
            progress_receiver: None,
            cancel_token: None,
        }
    }

    fn output_dir(&self) -> std::path::PathBuf {
        std::path::PathBuf::from(&self.input_path).join(self.output_name.trim())
    }

    fn render_folder_selection(&mut self, ui: &mut egui::Ui) {
        ui.heading("Folders");
        ui.separator();

        ui.horizontal(|ui| {
            ui.label("Input:");
            ui.text_edit_singleline(&mut self.input_path);
            if ui.button("Browse...").clicked() {
                if let Some(path) = rfd::FileDialog::new().pick_folder() {
                    self.input_path = path.display().to_string();
                }
            }
        });

        ui.horizontal(|ui| {
            ui.label("Output folder name:");
            ui.text_edit_singleline(&mut self.output_name);
        });
        ui.label("(created inside the input folder)");

        ui.add_space(10.0);
    }

    fn render_options(&mut self, ui: &mut egui::Ui) {
        ui.heading("Options");
        ui.separator();

        ui.checkbox(&mut self.overwrite, "Overwrite existing PNG files");

        ui.horizontal(|ui| {
            ui.label("PNG compression level:");
            ui.add(
                egui::Slider::new(&mut self.compression_level, 0..=9)
                    .integer()
                    .text("0 = fastest, 9 = smallest"),
            );
        });

        ui.add_space(10.0);
    }

    fn render_actions(&mut self, ui: &mut egui::Ui) {
        ui.separator();

        ui.horizontal(|ui| {
            let start_text = if self.is_converting {
                "Converting..."
            } else {
                "Start"
            };
            let start_button = egui::Button::new(start_text).min_size(egui::vec2(120.0, 32.0));
            if ui.add_enabled(!self.is_converting, start_button).clicked() {
                self.start_conversion();
            }

            let stop_button = egui::Button::new("Stop").min_size(egui::vec2(80.0, 32.0));
            if ui.add_enabled(self.is_converting, stop_button).clicked() {
                self.stop_conversion();
            }

            if ui
                .add(egui::Button::new("Open output folder").min_size(egui::vec2(140.0, 32.0)))
                .clicked()
            {
                self.open_output_folder();
            }
        });

        ui.add_space(10.0);
    }

    fn render_progress(&mut self, ui: &mut egui::Ui) {
        if self.is_converting || !self.results_message.is_empty() || !self.transcript.is_empty() {
            ui.heading("Progress");
            ui.separator();

            if self.is_converting {
                ui.label(format!(
                    "Converting: {}/{}",
                    self.processed_count, self.total_count
                ));
                ui.label(&self.current_file);

                let progress_bar = egui::ProgressBar::new(self.progress)
                    .show_percentage()
                    .animate(true);
                ui.add(progress_bar);
            }

            if !self.results_message.is_empty() {
                ui.label(&self.results_message);
            }

            if !self.error_message.is_empty() {
                ui.colored_label(egui::Color32::RED, &self.error_message);
            }

            if !self.transcript.is_empty() {
                ui.add_space(5.0);
                egui::ScrollArea::vertical()
                    .stick_to_bottom(true)
                    .max_height(180.0)
                    .show(ui, |ui| {
                        for line in &self.transcript {
                            ui.monospace(line);
                        }
                    });
            }
        }
    }

    fn render_summary_window(&mut self, ctx: &egui::Context) {
        if !self.show_summary_window {
            return;
        }

        let mut open_folder = false;
        let mut close = false;

        egui::Window::new("Conversion finished")
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(&self.results_message);
                ui.add_space(10.0);
                ui.horizontal(|ui| {
                    if ui.button("Open output folder").clicked() {
                        open_folder = true;
                        close = true;
                    }
                    if ui.button("Close").clicked() {
                        close = true;
                    }
                });
            });

        if open_folder {
            self.open_output_folder();
        }
        if close {
            self.show_summary_window = false;
        }
    }

    fn open_output_folder(&mut self) {
        if self.input_path.is_empty() {
            self.error_message = "Select an input folder first".to_string();
            return;
        }
        let output_dir = self.output_dir();
        if !output_dir.exists() {
            self.error_message = format!("Output folder does not exist: {}", output_dir.display());
            return;
        }
        if let Err(e) = open::that(&output_dir) {
            self.error_message = format!("Failed to open folder: {}", e);
        }
    }
}

impl eframe::App for ConverterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Check for progress updates from the background worker
        self.check_progress();

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.heading("WebP to PNG Converter");
                ui.label("Batch-convert every .webp file in a folder");
                ui.add_space(20.0);

                self.render_folder_selection(ui);
                self.render_options(ui);
                self.render_actions(ui);
                self.render_progress(ui);
            });
        });

        self.render_summary_window(ctx);

        // Request repaint if converting
        if self.is_converting {
            ctx.request_repaint();
        }
    }
}
