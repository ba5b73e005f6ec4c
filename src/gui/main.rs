// GUI entry point for webp2png
// This binary provides a graphical interface for the batch converter

use eframe::egui;

mod app;
use app::ConverterApp;

fn main() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([560.0, 540.0])
            .with_min_inner_size([440.0, 420.0]),
        ..Default::default()
    };

    eframe::run_native(
        "WebP to PNG Converter",
        options,
        Box::new(|cc| Ok(Box::new(ConverterApp::new(cc)))),
    )
}
