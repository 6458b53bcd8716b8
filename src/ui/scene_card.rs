/// Selectable card for one destination era
use iced::widget::{button, column, text};
use iced::{gradient, Background, Border, Color, Element, Gradient, Length, Radians, Shadow, Theme};

use crate::scenes::Scene;
use crate::Message;

pub fn rgb(color: [u8; 3]) -> Color {
    Color::from_rgb8(color[0], color[1], color[2])
}

/// The scene's accent gradient, dimmed unless the card is active
fn accent(scene: &Scene, alpha: f32) -> Background {
    let linear = gradient::Linear::new(Radians(std::f32::consts::FRAC_PI_4))
        .add_stop(0.0, Color { a: alpha, ..rgb(scene.color_tag.from) })
        .add_stop(1.0, Color { a: alpha, ..rgb(scene.color_tag.to) });
    Background::Gradient(Gradient::Linear(linear))
}

fn style(scene: &'static Scene, selected: bool, status: button::Status) -> button::Style {
    let alpha = match (selected, status) {
        (true, _) => 1.0,
        (false, button::Status::Hovered | button::Status::Pressed) => 0.75,
        (false, _) => 0.45,
    };

    button::Style {
        background: Some(accent(scene, alpha)),
        text_color: Color::WHITE,
        border: Border {
            color: if selected {
                Color::WHITE
            } else {
                Color::from_rgba(1.0, 1.0, 1.0, 0.1)
            },
            width: if selected { 3.0 } else { 1.0 },
            radius: 14.0.into(),
        },
        shadow: Shadow::default(),
    }
}

pub fn view(scene: &'static Scene, selected: bool) -> Element<'static, Message> {
    let content = column![
        text(scene.icon).size(32),
        text(scene.title).size(20),
        text(scene.description).size(14),
    ]
    .spacing(6);

    button(content)
        .on_press(Message::SelectScene(scene.id))
        .width(Length::Fill)
        .padding(16)
        .style(move |_theme: &Theme, status| style(scene, selected, status))
        .into()
}
