use std::convert::Infallible;

use iced::{
    Color, Element, Task,
    widget::{button, column, container, row, text},
};
use iced_widget::container::bordered_box;

use crate::gui::{
    AppState,
    screens::{Screen, ScreenMessage},
    widgets::error_box,
};
use crate::robot::ServoAction;

#[derive(Debug, Clone, Default)]
pub struct ServoScreen {
    running: bool,
    pending: Option<ServoAction>,
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum ServoMessage {
    Send(ServoAction),
    Sent(ServoAction, Result<(), String>),
}

impl Screen for ServoScreen {
    type Message = ServoMessage;
    type ParentMessage = Infallible;

    fn view(&self) -> Element<'_, ScreenMessage<Self>> {
        let (marker, status, color) = if self.running {
            ("🟢", "Running", Color::from_rgb8(22, 101, 52))
        } else {
            ("🔴", "Stopped", Color::from_rgb8(31, 41, 55))
        };
        let idle = self.pending.is_none();
        let send = |action| ScreenMessage::ScreenMessage(ServoMessage::Send(action));

        let mut content = column![
            text("Control the fertilizer dispensing servo motor"),
            container(text(format!("{} Status: {}", marker, status)).color(color))
                .style(bordered_box)
                .padding(12)
                .center_x(iced::Length::Fill),
            row![
                button(text("▶️ Start Dispensing"))
                    .on_press_maybe((idle && !self.running).then(|| send(ServoAction::Start)))
                    .style(button::success)
                    .padding(14),
                button(text("⏹️ Stop Dispensing"))
                    .on_press_maybe((idle && self.running).then(|| send(ServoAction::Stop)))
                    .style(button::danger)
                    .padding(14),
            ]
            .spacing(16),
        ]
        .spacing(20);

        if let Some(error) = &self.error {
            content = content.push(error_box(error.clone()));
        }
        container(content).into()
    }

    fn update(
        &mut self,
        message: Self::Message,
        state: &mut AppState,
    ) -> Task<ScreenMessage<Self>> {
        match message {
            ServoMessage::Send(action) => {
                if self.pending.is_some() {
                    return Task::none();
                }
                self.pending = Some(action);
                self.error = None;
                let robot = state.robot.clone();
                Task::perform(
                    async move { robot.servo(action).await.map_err(|e| e.to_string()) },
                    move |result| ScreenMessage::ScreenMessage(ServoMessage::Sent(action, result)),
                )
            }
            ServoMessage::Sent(action, result) => {
                self.pending = None;
                match result {
                    // Only a confirmed command changes the displayed status
                    Ok(()) => self.running = action == ServoAction::Start,
                    Err(e) => {
                        tracing::warn!(error = %e, %action, "servo command failed");
                        self.error = Some(format!("Servo control error: {}", e));
                    }
                }
                Task::none()
            }
        }
    }
}
