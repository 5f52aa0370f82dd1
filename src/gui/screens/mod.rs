pub mod detection;
pub mod motor;
pub mod servo;

use std::fmt;

use iced::{Element, Subscription, Task};

use crate::gui::{AppState, Message, widgets::Panel};

pub enum ScreenMessage<S: Screen> {
    ScreenMessage(S::Message),
    ParentMessage(S::ParentMessage),
}

// Written by hand: derive would also require `S: Clone`, and screens that own
// a camera are not clonable.
impl<S: Screen> Clone for ScreenMessage<S> {
    fn clone(&self) -> Self {
        match self {
            Self::ScreenMessage(msg) => Self::ScreenMessage(msg.clone()),
            Self::ParentMessage(msg) => Self::ParentMessage(msg.clone()),
        }
    }
}

impl<S: Screen> fmt::Debug for ScreenMessage<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScreenMessage(msg) => f.debug_tuple("ScreenMessage").field(msg).finish(),
            Self::ParentMessage(msg) => f.debug_tuple("ParentMessage").field(msg).finish(),
        }
    }
}

pub trait Screen: Sized {
    type Message: fmt::Debug + Clone + Send + 'static;
    type ParentMessage: fmt::Debug + Clone + Send + 'static;
    fn view(&self) -> Element<'_, ScreenMessage<Self>>;
    fn update(&mut self, message: Self::Message, state: &mut AppState)
    -> Task<ScreenMessage<Self>>;
    fn subscription(&self) -> Subscription<ScreenMessage<Self>> {
        Subscription::none()
    }
}

pub enum ScreenData {
    Motor(motor::MotorScreen),
    Servo(servo::ServoScreen),
    Detection(detection::DetectionScreen),
}

impl ScreenData {
    pub fn open(panel: Panel, state: &AppState) -> Self {
        match panel {
            Panel::Motor => ScreenData::Motor(motor::MotorScreen::default()),
            Panel::Servo => ScreenData::Servo(servo::ServoScreen::default()),
            Panel::Detection => ScreenData::Detection(detection::DetectionScreen::new(&state.config)),
        }
    }

    pub fn panel(&self) -> Panel {
        match self {
            ScreenData::Motor(_) => Panel::Motor,
            ScreenData::Servo(_) => Panel::Servo,
            ScreenData::Detection(_) => Panel::Detection,
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        match self {
            ScreenData::Motor(screen) => screen.view().map(Message::Motor),
            ScreenData::Servo(screen) => screen.view().map(Message::Servo),
            ScreenData::Detection(screen) => screen.view().map(Message::Detection),
        }
    }

    pub fn subscription(&self) -> Subscription<Message> {
        match self {
            ScreenData::Motor(screen) => screen.subscription().map(Message::Motor),
            ScreenData::Servo(screen) => screen.subscription().map(Message::Servo),
            ScreenData::Detection(screen) => screen.subscription().map(Message::Detection),
        }
    }

    pub fn update(&mut self, message: Message, state: &mut AppState) -> Task<Message> {
        match (self, message) {
            (x, Message::ChangeScreen(panel)) => {
                if x.panel() != panel {
                    tracing::debug!(?panel, "switching panel");
                    // Replacing the screen drops it, which tears down its camera and previews
                    *x = ScreenData::open(panel, state);
                }
                Task::none()
            }
            (ScreenData::Motor(page), Message::Motor(msg)) => match msg {
                ScreenMessage::ScreenMessage(msg) => page.update(msg, state).map(Message::Motor),
                ScreenMessage::ParentMessage(never) => match never {},
            },
            (ScreenData::Servo(page), Message::Servo(msg)) => match msg {
                ScreenMessage::ScreenMessage(msg) => page.update(msg, state).map(Message::Servo),
                ScreenMessage::ParentMessage(never) => match never {},
            },
            (ScreenData::Detection(page), Message::Detection(msg)) => match msg {
                ScreenMessage::ScreenMessage(msg) => {
                    page.update(msg, state).map(Message::Detection)
                }
                ScreenMessage::ParentMessage(never) => match never {},
            },
            // Late replies addressed to a panel that is no longer on screen
            (_, msg) => {
                tracing::debug!(?msg, "dropping message for inactive panel");
                Task::none()
            }
        }
    }
}
