use iced::{
    Color, Element, Theme, border,
    widget::{button, column, container, container::Style, row, text},
};
use iced_widget::container::bordered_box;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Motor,
    Servo,
    Detection,
}

impl Panel {
    pub const ALL: [Panel; 3] = [Panel::Motor, Panel::Servo, Panel::Detection];

    pub fn title(self) -> &'static str {
        match self {
            Panel::Motor => "Robot Motor Control",
            Panel::Servo => "Fertilizer Dispenser",
            Panel::Detection => "Leaf Disease Detection",
        }
    }

    fn style(self, active: Self) -> impl Fn(&Theme) -> Style {
        move |theme: &Theme| {
            let style = bordered_box(theme).border(border::width(2));
            // darken the entry of the panel on screen
            if self == active {
                let mut color_rgba = theme.palette().background.into_rgba8();
                color_rgba[0] /= 2;
                color_rgba[1] /= 2;
                color_rgba[2] /= 2;
                style.background(Color::from_rgb8(color_rgba[0], color_rgba[1], color_rgba[2]))
            } else {
                style.background(theme.palette().background)
            }
        }
    }
}

/// Dashboard frame: header, a sidebar listing the panels, and the active panel.
pub fn layout<'a, Message>(
    active: Panel,
    on_select: impl Fn(Panel) -> Message,
    main_content: impl Into<Element<'a, Message>>,
) -> Element<'a, Message>
where
    Message: Clone + 'a,
{
    let mut sidebar = column![].spacing(8);
    for panel in Panel::ALL {
        let entry = button(text(panel.title()))
            .on_press(on_select(panel))
            .style(button::text)
            .width(iced::Length::Fill);
        sidebar = sidebar.push(container(entry).style(active.style(panel)).padding(6));
    }

    let header = column![
        text("🍅 Agri ROBO").size(32),
        text("Tomato Disease Detection & Robot Control System"),
    ]
    .spacing(4);

    container(column![
        header,
        row![
            container(sidebar).width(iced::Length::FillPortion(1)),
            container(main_content.into())
                .padding(10)
                .width(iced::Length::FillPortion(4)),
        ]
        .spacing(20),
    ]
    .spacing(20)
    .padding(20))
    .center_x(iced::Length::Fill)
    .center_y(iced::Length::Fill)
    .into()
}

/// Rounded error box used by all panels
pub fn error_box<'a, Message: 'a>(message: String) -> Element<'a, Message> {
    container(column![
        text("❌ Error").color(Color::from_rgb8(185, 28, 28)),
        text(message).size(14),
    ])
    .style(bordered_box)
    .padding(12)
    .width(iced::Length::Fill)
    .into()
}
