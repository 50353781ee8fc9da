mod app;
mod ui;

use iced::window;

fn main() -> iced::Result {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    iced::application(app::DownloadApp::default, app::update, app::view)
        .title("File Downloader")
        .window(window::Settings {
            size: iced::Size::new(560.0, 480.0),
            ..Default::default()
        })
        .run()
}
