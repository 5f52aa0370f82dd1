use std::convert::Infallible;
use std::time::Duration;

use iced::{
    Alignment::Center,
    Element, Task,
    widget::{button, column, container, row, text},
};

use crate::gui::{
    AppState,
    screens::{Screen, ScreenMessage},
    widgets::error_box,
};
use crate::robot::Direction;

/// How long a direction stays highlighted after its command returns
const FEEDBACK_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Default)]
pub struct MotorScreen {
    moving: Option<Direction>,
    /// Sequence number of the latest command; older resets are ignored
    command: u64,
    error: Option<String>,
}

#[derive(Debug, Clone)]
pub enum MotorMessage {
    Drive(Direction),
    Sent(u64, Result<(), String>),
    Reset(u64),
}

impl Screen for MotorScreen {
    type Message = MotorMessage;
    type ParentMessage = Infallible;

    fn view(&self) -> Element<'_, ScreenMessage<Self>> {
        let busy = self.moving.is_some();
        let pad = |direction: Direction| {
            let label = match direction {
                Direction::Front => "⬆️ Forward",
                Direction::Back => "⬇️ Backward",
                Direction::Left => "⬅️ Left",
                Direction::Right => "➡️ Right",
                Direction::Stop => "⏹️ Stop",
            };
            let on_press = ScreenMessage::ScreenMessage(MotorMessage::Drive(direction));
            let style = if self.moving == Some(direction) {
                button::success
            } else {
                button::primary
            };
            // Stop is always available
            button(text(label))
                .on_press_maybe((!busy || direction == Direction::Stop).then_some(on_press))
                .style(style)
                .padding(14)
        };

        let mut content = column![
            text("Control the robot's movement direction"),
            column![
                pad(Direction::Front),
                row![pad(Direction::Left), pad(Direction::Stop), pad(Direction::Right)].spacing(16),
                pad(Direction::Back),
            ]
            .spacing(8)
            .align_x(Center),
        ]
        .spacing(20);

        if let Some(direction) = self.moving {
            content = content.push(text(format!("Moving: {}", direction.as_str().to_uppercase())));
        }
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
            MotorMessage::Drive(direction) => {
                if self.moving.is_some() && direction != Direction::Stop {
                    return Task::none();
                }
                self.moving = Some(direction);
                self.command += 1;
                self.error = None;
                let robot = state.robot.clone();
                let command = self.command;
                Task::perform(
                    async move { robot.drive(direction).await.map_err(|e| e.to_string()) },
                    move |result| ScreenMessage::ScreenMessage(MotorMessage::Sent(command, result)),
                )
            }
            MotorMessage::Sent(command, result) => {
                if let Err(e) = result {
                    tracing::warn!(error = %e, "motor command failed");
                    self.error = Some(format!("Motor control error: {}", e));
                }
                Task::perform(tokio::time::sleep(FEEDBACK_DELAY), move |_| {
                    ScreenMessage::ScreenMessage(MotorMessage::Reset(command))
                })
            }
            MotorMessage::Reset(command) => {
                if command == self.command {
                    self.moving = None;
                }
                Task::none()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PanelConfig;

    #[tokio::test]
    async fn test_stop_outlives_superseded_reset() {
        let mut state = AppState::new(PanelConfig::default()).unwrap();
        let mut screen = MotorScreen::default();

        let _ = screen.update(MotorMessage::Drive(Direction::Front), &mut state);
        // Other directions are ignored while a command is in flight
        let _ = screen.update(MotorMessage::Drive(Direction::Left), &mut state);
        assert_eq!(screen.moving, Some(Direction::Front));

        let _ = screen.update(MotorMessage::Drive(Direction::Stop), &mut state);
        let _ = screen.update(MotorMessage::Sent(1, Ok(())), &mut state);
        let _ = screen.update(MotorMessage::Reset(1), &mut state);
        assert_eq!(screen.moving, Some(Direction::Stop));

        let _ = screen.update(MotorMessage::Reset(2), &mut state);
        assert_eq!(screen.moving, None);
    }
}
