use std::convert::Infallible;
use std::time::Duration;

use iced::{
    Alignment::Center,
    Color, Element, Length, Subscription, Task, Theme, border,
    widget::{button, column, container, image, progress_bar, row, text},
};
use iced_widget::container::bordered_box;
use rfd::AsyncFileDialog;

use crate::acquisition::{IMAGE_EXTENSIONS, SelectedFile};
use crate::camera::{self, CameraBackend};
use crate::config::PanelConfig;
use crate::gui::{
    AppState,
    screens::{Screen, ScreenMessage},
    widgets::error_box,
};
use crate::models::{ClassificationError, ClassificationResult};
use crate::pipeline::{DetectionPipeline, SubmissionId};
use crate::presenter::{PanelView, ResultView, present};

const PREVIEW_HEIGHT: f32 = 320.0;
const ADVISORY_COLOR: Color = Color::from_rgb(0.71, 0.33, 0.04);

pub struct DetectionScreen {
    pipeline: DetectionPipeline<Box<dyn CameraBackend>>,
    frame_interval: Duration,
    live_frame: Option<image::Handle>,
    /// Decoded preview, keyed by the id of the preview handle it was built from
    preview: Option<(u64, image::Handle)>,
}

#[derive(Debug, Clone)]
pub enum DetectionMessage {
    PickFile,
    FilePicked(Option<SelectedFile>),
    OpenCamera,
    FrameTick,
    Capture,
    CloseCamera,
    Submit,
    Classified(SubmissionId, Result<ClassificationResult, ClassificationError>),
}

fn screen_message(message: DetectionMessage) -> ScreenMessage<DetectionScreen> {
    ScreenMessage::ScreenMessage(message)
}

impl DetectionScreen {
    pub fn new(config: &PanelConfig) -> Self {
        Self {
            pipeline: DetectionPipeline::new(camera::default_backend(), config.camera_request()),
            frame_interval: config.frame_interval,
            live_frame: None,
            preview: None,
        }
    }

    fn sync_preview(&mut self) {
        let current = self.pipeline.acquisition().preview();
        if self.preview.as_ref().map(|(id, _)| *id) == current.map(|p| p.id()) {
            return;
        }
        self.preview = current.map(|p| (p.id(), image::Handle::from_bytes(p.bytes().to_vec())));
    }

    fn image_area(&self) -> Element<'_, ScreenMessage<Self>> {
        let shown = if self.pipeline.camera_active() {
            self.live_frame.clone()
        } else {
            self.preview.as_ref().map(|(_, handle)| handle.clone())
        };
        let inner: Element<'_, ScreenMessage<Self>> = match shown {
            Some(handle) => image(handle).height(Length::Fixed(PREVIEW_HEIGHT)).into(),
            None if self.pipeline.camera_active() => text("Starting camera...").into(),
            None => text("📷 No image selected").into(),
        };
        container(inner)
            .style(bordered_box)
            .padding(8)
            .center_x(Length::Fill)
            .height(Length::Fixed(PREVIEW_HEIGHT + 16.0))
            .into()
    }

    fn controls(&self) -> Element<'_, ScreenMessage<Self>> {
        if self.pipeline.camera_active() {
            let name = self.pipeline.acquisition().camera_name().unwrap_or("camera").to_string();
            column![
                text(format!("Live: {}", name)).size(14),
                row![
                    button(text("📸 Capture")).on_press(screen_message(DetectionMessage::Capture)),
                    button(text("Close Camera"))
                        .on_press(screen_message(DetectionMessage::CloseCamera))
                        .style(button::secondary),
                ]
                .spacing(10),
            ]
            .spacing(6)
            .into()
        } else {
            row![
                button(text("📁 Upload Image")).on_press(screen_message(DetectionMessage::PickFile)),
                button(text("📷 Open Camera"))
                    .on_press(screen_message(DetectionMessage::OpenCamera))
                    .style(button::secondary),
            ]
            .spacing(10)
            .into()
        }
    }
}

fn result_panel<'a>(view: ResultView) -> Element<'a, ScreenMessage<DetectionScreen>> {
    let [r, g, b] = view.band.rgb();
    let bar_color = Color::from_rgb8(r, g, b);

    let mut content = column![
        text(format!("{} {}", view.badge.icon(), view.label)).size(24),
        text(view.badge.text()),
        row![
            text("Confidence"),
            text(format!("{}%", view.confidence_percent)).color(bar_color),
        ]
        .spacing(10),
        progress_bar(0.0..=1.0, view.bar_fill).style(move |theme: &Theme| progress_bar::Style {
            background: theme.extended_palette().background.weak.color.into(),
            bar: bar_color.into(),
            border: border::rounded(4),
        }),
    ]
    .spacing(8);

    if !view.predictions.is_empty() {
        let mut ranked = column![text("Top Predictions").size(16)].spacing(4);
        for p in view.predictions {
            let marker = p.medal.map(|m| m.marker()).unwrap_or("");
            ranked = ranked.push(
                row![
                    text(marker),
                    text(p.name).width(Length::Fill),
                    text(format!("{:.2}%", p.confidence_percent)),
                ]
                .spacing(8),
            );
        }
        content = content.push(ranked);
    }

    if let Some(advisory) = view.low_confidence_advisory {
        content = content.push(text(format!("⚠️ {}", advisory)).color(ADVISORY_COLOR));
    }

    container(content)
        .style(bordered_box)
        .padding(12)
        .width(Length::Fill)
        .into()
}

fn frame_handle(frame: ::image::RgbImage) -> image::Handle {
    let (width, height) = frame.dimensions();
    let rgba = ::image::DynamicImage::ImageRgb8(frame).into_rgba8();
    image::Handle::from_rgba(width, height, rgba.into_raw())
}

impl Screen for DetectionScreen {
    type Message = DetectionMessage;
    type ParentMessage = Infallible;

    fn view(&self) -> Element<'_, ScreenMessage<Self>> {
        let submitting = self.pipeline.is_submitting();
        let submit = button(text(if submitting {
            "Analyzing..."
        } else {
            "🔍 Detect Disease"
        }))
        .on_press_maybe(
            self.pipeline
                .can_submit()
                .then(|| screen_message(DetectionMessage::Submit)),
        )
        .width(Length::Fill);

        let outcome: Element<'_, ScreenMessage<Self>> = match present(&self.pipeline.state()) {
            PanelView::Prompt(message) | PanelView::Ready(message) | PanelView::Progress(message) => {
                text(message).into()
            }
            PanelView::Error { message, .. } => error_box(message),
            PanelView::Result(view) => result_panel(view),
        };

        let mut content = column![
            text("Upload or capture a tomato leaf image").size(14),
            self.image_area(),
            self.controls(),
            submit,
            outcome,
        ]
        .spacing(14)
        .align_x(Center);
        if let Some(notice) = self.pipeline.device_notice() {
            content = content.push(error_box(notice.message.clone()));
        }
        content.into()
    }

    fn update(
        &mut self,
        message: Self::Message,
        state: &mut AppState,
    ) -> Task<ScreenMessage<Self>> {
        let task = match message {
            DetectionMessage::PickFile => Task::perform(
                async {
                    let handle = AsyncFileDialog::new()
                        .set_title("Select a leaf image")
                        .add_filter("Images", IMAGE_EXTENSIONS)
                        .pick_file()
                        .await?;
                    let bytes = handle.read().await;
                    Some(SelectedFile::new(handle.file_name(), bytes))
                },
                |file| screen_message(DetectionMessage::FilePicked(file)),
            ),
            DetectionMessage::FilePicked(file) => {
                // Cancelling the dialog leaves everything as it was
                self.pipeline.select_file(file);
                Task::none()
            }
            DetectionMessage::OpenCamera => {
                self.live_frame = None;
                self.pipeline.open_camera();
                Task::none()
            }
            DetectionMessage::FrameTick => {
                if let Some(frame) = self.pipeline.poll_frame() {
                    self.live_frame = Some(frame_handle(frame));
                }
                Task::none()
            }
            DetectionMessage::Capture => {
                self.pipeline.capture();
                self.live_frame = None;
                Task::none()
            }
            DetectionMessage::CloseCamera => {
                self.pipeline.close_camera();
                self.live_frame = None;
                Task::none()
            }
            DetectionMessage::Submit => match self.pipeline.begin_submit() {
                Some(submission) => {
                    let client = state.classifier.clone();
                    let id = submission.id;
                    Task::perform(
                        async move { client.classify(Some(&submission.image)).await },
                        move |result| screen_message(DetectionMessage::Classified(id, result)),
                    )
                }
                None => Task::none(),
            },
            DetectionMessage::Classified(id, result) => {
                self.pipeline.complete(id, result);
                Task::none()
            }
        };
        if !self.pipeline.camera_active() {
            self.live_frame = None;
        }
        self.sync_preview();
        task
    }

    fn subscription(&self) -> Subscription<ScreenMessage<Self>> {
        if self.pipeline.camera_active() {
            iced::time::every(self.frame_interval)
                .map(|_| ScreenMessage::ScreenMessage(DetectionMessage::FrameTick))
        } else {
            Subscription::none()
        }
    }
}
