use iced::{
    widget::{button, column, progress_bar, row, text, text_input, Space},
    Element, Length,
};

/// Main view state
pub struct DownloadView {
    pub url: String,
    pub dir: String,
    pub overwrite: bool,
    pub status_message: String,
    pub is_downloading: bool,
    /// Fraction done, when the server announced a length
    pub download_progress: Option<f32>,
}

impl Default for DownloadView {
    fn default() -> Self {
        Self {
            url: String::new(),
            dir: String::new(),
            overwrite: false,
            status_message: "Enter a URL to download".to_string(),
            is_downloading: false,
            download_progress: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum DownloadMessage {
    UrlChanged(String),
    DirChanged(String),
    BrowsePressed,
    OverwriteToggled,
    DownloadPressed,
    CancelPressed,
}

impl DownloadView {
    pub fn update(&mut self, message: DownloadMessage) {
        match message {
            DownloadMessage::UrlChanged(url) => {
                self.url = url;
            }
            DownloadMessage::DirChanged(dir) => {
                self.dir = dir;
            }
            DownloadMessage::OverwriteToggled => {
                if !self.is_downloading {
                    self.overwrite = !self.overwrite;
                }
            }
            DownloadMessage::BrowsePressed
            | DownloadMessage::DownloadPressed
            | DownloadMessage::CancelPressed => {
                // Will be handled by the app
            }
        }
    }

    pub fn view(&self) -> Element<'_, DownloadMessage> {
        let overwrite_label = if self.overwrite {
            "Overwrite existing: on"
        } else {
            "Overwrite existing: off"
        };

        let idle = !self.is_downloading;

        column![
            text("File Downloader").size(32),
            Space::new().height(Length::Fixed(20.0)),
            text("URL:").size(16),
            text_input("https://example.com/file.zip", &self.url)
                .on_input(DownloadMessage::UrlChanged)
                .padding(10),
            text("Save to (empty for current directory):").size(16),
            row![
                text_input("Directory...", &self.dir)
                    .on_input(DownloadMessage::DirChanged)
                    .padding(10),
                button("Browse")
                    .on_press_maybe(idle.then_some(DownloadMessage::BrowsePressed))
                    .padding([10, 20]),
            ]
            .spacing(10),
            button(overwrite_label)
                .on_press_maybe(idle.then_some(DownloadMessage::OverwriteToggled))
                .padding([6, 12]),
            Space::new().height(Length::Fixed(10.0)),
            progress_bar(0.0..=1.0, self.download_progress.unwrap_or(0.0)),
            text(&self.status_message).size(14),
            Space::new().height(Length::Fixed(20.0)),
            row![
                button("Download")
                    .on_press_maybe(idle.then_some(DownloadMessage::DownloadPressed))
                    .padding([10, 20]),
                button("Cancel")
                    .on_press_maybe(self.is_downloading.then_some(DownloadMessage::CancelPressed))
                    .padding([10, 20]),
            ]
            .spacing(10),
        ]
        .padding(20)
        .spacing(10)
        .into()
    }
}
