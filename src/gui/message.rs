use crate::gui::{
    screens::{
        ScreenMessage, detection::DetectionScreen, motor::MotorScreen, servo::ServoScreen,
    },
    widgets::Panel,
};

#[derive(Debug, Clone)]
pub enum Message {
    Motor(ScreenMessage<MotorScreen>),
    Servo(ScreenMessage<ServoScreen>),
    Detection(ScreenMessage<DetectionScreen>),
    ChangeScreen(Panel),
}
