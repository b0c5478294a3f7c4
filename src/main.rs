mod app;
mod ui;
mod utils;

use adw::Application;
use adw::prelude::*;

static GLIB_LOGGER: glib::GlibLogger = glib::GlibLogger::new(
    glib::GlibLoggerFormat::Plain,
    glib::GlibLoggerDomain::CrateTarget,
);

fn main() -> glib::ExitCode {
    let _ = log::set_logger(&GLIB_LOGGER);
    log::set_max_level(log::LevelFilter::Info);
    let settings = simple_chat_gtk::Settings::load();
    log::set_max_level(settings.log_filter());

    let app = Application::builder()
        .application_id("com.example.SimpleChat")
        .build();
    app.connect_activate(move |app| {
        crate::app::build_ui(app, &settings);
    });
    app.run()
}
