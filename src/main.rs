use eframe::egui;
use tokio::runtime::Builder;
use tracing_subscriber::EnvFilter;

mod app;
mod store;

fn main() -> Result<(), eframe::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // sqlx needs an async runtime; the UI thread blocks on it for every
    // store round trip, so a current-thread runtime is enough.
    let rt = Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("failed to build async runtime");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([1100.0, 620.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Bank Management System",
        options,
        Box::new(|cc| Box::new(app::App::new(cc, rt))),
    )
}
