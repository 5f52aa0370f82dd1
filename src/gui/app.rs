use iced::{Element, Subscription, Task};

use crate::config::PanelConfig;
use crate::gui::{
    AppState, Message,
    screens::ScreenData,
    widgets::{Panel, layout},
};

pub struct AgriRoboApp {
    state: AppState,
    screen: ScreenData,
}

impl AgriRoboApp {
    pub fn new(state: AppState) -> (Self, Task<Message>) {
        let screen = ScreenData::open(Panel::Detection, &state);
        (Self { state, screen }, Task::none())
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        self.screen.update(message, &mut self.state)
    }

    pub fn view(&self) -> Element<'_, Message> {
        layout(self.screen.panel(), Message::ChangeScreen, self.screen.view())
    }

    pub fn subscription(&self) -> Subscription<Message> {
        self.screen.subscription()
    }
}

/// Open the operator panel and block until its window is closed
pub fn run(config: PanelConfig) -> anyhow::Result<()> {
    let state = AppState::new(config)?;
    tracing::info!(server = %state.config.server_url, "starting operator panel");
    iced::application(
        move || AgriRoboApp::new(state.clone()),
        AgriRoboApp::update,
        AgriRoboApp::view,
    )
    .title("Agri ROBO")
    .subscription(AgriRoboApp::subscription)
    .run()?;
    Ok(())
}
