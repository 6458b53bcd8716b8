/// One view per step of the booth flow
///
/// Views are pure functions of the data they are given; every button maps to
/// a `Message` the shell feeds into the state machine.
use iced::widget::image::Handle;
use iced::widget::{
    button, canvas, column, container, horizontal_space, image, row, scrollable, text, Column,
};
use iced::{Alignment, Color, ContentFit, Element, Length};

use super::loader::Spinner;
use super::scene_card;
use crate::scenes::{self, Scene};
use crate::state::GeneratedResult;
use crate::Message;

const MUTED: Color = Color::from_rgb(0.58, 0.64, 0.72);
const ERROR: Color = Color::from_rgb(0.99, 0.65, 0.65);
const ACCENT: Color = Color::from_rgb(0.75, 0.52, 0.99);

/// Product name with a reset button on every screen but the first
pub fn header<'a>(show_reset: bool) -> Element<'a, Message> {
    let title = row![
        text("Chrono").size(24),
        text("Snap").size(24).color(ACCENT),
    ];

    let mut bar = row![title, horizontal_space()].align_y(Alignment::Center);
    if show_reset {
        bar = bar.push(button("Reset").on_press(Message::Reset).style(button::text));
    }

    container(bar).padding(20).width(Length::Fill).into()
}

pub fn start<'a>(notice: Option<&'a str>) -> Element<'a, Message> {
    let actions = row![
        button(text("📷  Take Photo").size(18))
            .on_press(Message::TakePhoto)
            .padding([14, 28])
            .style(button::primary),
        button(text("⬆  Upload").size(18))
            .on_press(Message::UploadPhoto)
            .padding([14, 28])
            .style(button::secondary),
    ]
    .spacing(16);

    let mut content: Column<Message> = column![
        text("Time Travel Photo Booth").size(56),
        text("Take a selfie, choose an era, and let AI transport you through history.")
            .size(18)
            .color(MUTED),
        actions,
    ]
    .spacing(24)
    .align_x(Alignment::Center);

    if let Some(notice) = notice {
        content = content.push(text(notice).color(ERROR));
    }

    centered(content)
}

/// Live camera view, or the reason the camera could not be used
pub fn capturing<'a>(
    preview: Option<&'a Handle>,
    device_error: Option<&'a str>,
) -> Element<'a, Message> {
    if let Some(reason) = device_error {
        let content = column![
            text(crate::error::CAMERA_DENIED_MESSAGE).size(20).color(ERROR),
            text(reason).size(14).color(MUTED),
            row![
                button("Go Back").on_press(Message::CancelCapture),
                button("Upload Instead")
                    .on_press(Message::UploadPhoto)
                    .style(button::secondary),
            ]
            .spacing(12),
        ]
        .spacing(16)
        .align_x(Alignment::Center);
        return centered(content);
    }

    let top = row![
        button("✕").on_press(Message::CancelCapture).style(button::text),
        horizontal_space(),
        text("ALIGN FACE").size(16),
        horizontal_space(),
    ]
    .align_y(Alignment::Center);

    let live: Element<Message> = match preview {
        Some(handle) => image(handle.clone())
            .width(Length::Fill)
            .height(Length::Fill)
            .content_fit(ContentFit::Contain)
            .into(),
        None => centered(text("Starting camera...").color(MUTED)),
    };

    // Shutter stays disabled until the first frame arrives
    let shutter = button(text("●").size(40))
        .on_press_maybe(preview.map(|_| Message::Shutter))
        .padding([8, 22])
        .style(button::primary);

    column![
        top,
        container(live).width(Length::Fill).height(Length::Fill),
        container(shutter).center_x(Length::Fill),
    ]
    .spacing(12)
    .padding(16)
    .into()
}

/// Photo on the left, era picker on the right
pub fn configuring<'a>(
    photo: Option<&'a Handle>,
    selected: Option<&'static Scene>,
    error: Option<&'a str>,
) -> Element<'a, Message> {
    let mut photo_column: Column<Message> = column![].spacing(12).width(Length::FillPortion(1));
    if let Some(handle) = photo {
        photo_column = photo_column.push(
            container(image(handle.clone()).width(Length::Fill))
                .padding(8)
                .style(container::rounded_box),
        );
    }
    photo_column = photo_column.push(
        button("Retake / Change Photo")
            .on_press(Message::Retake)
            .style(button::text),
    );

    let mut cards: Column<Message> = column![].spacing(12);
    for pair in scenes::all().chunks(2) {
        let mut line = row![].spacing(12);
        for scene in pair {
            let is_selected = selected.is_some_and(|s| s.id == scene.id);
            line = line.push(scene_card::view(scene, is_selected));
        }
        cards = cards.push(line);
    }

    let picker = column![
        text("Where to?").size(28),
        text("Choose your destination era.").color(MUTED),
        cards,
    ]
    .spacing(12)
    .width(Length::FillPortion(2));

    let activate = button(text("Activate Time Machine  ⚡").size(18))
        .on_press_maybe(selected.map(|_| Message::Confirm))
        .padding([14, 28])
        .style(button::primary);

    let mut content: Column<Message> = column![
        row![photo_column, picker].spacing(32),
        container(activate).align_right(Length::Fill),
    ]
    .spacing(20)
    .padding(24);

    if let Some(error) = error {
        content = content.push(
            container(text(error).color(ERROR))
                .padding(16)
                .width(Length::Fill)
                .style(container::bordered_box),
        );
    }

    scrollable(content).into()
}

pub fn processing<'a>(scene: Option<&'static Scene>, spinner: Spinner) -> Element<'a, Message> {
    let title = scene.map_or("your destination", |s| s.title);

    let content = column![
        canvas(spinner).width(96).height(96),
        text(format!("Constructing {} environment...", title)).size(20),
        text("This can take a little while.").color(MUTED),
    ]
    .spacing(24)
    .align_x(Alignment::Center);

    centered(content)
}

pub fn result<'a>(
    picture: Option<&'a Handle>,
    result: &'a GeneratedResult,
    notice: Option<&'a str>,
) -> Element<'a, Message> {
    let mut content: Column<Message> = column![text("Arrival Confirmed").size(32)]
        .spacing(20)
        .align_x(Alignment::Center);

    if let Some(handle) = picture {
        content = content.push(
            container(image(handle.clone()).width(Length::Fill))
                .max_width(560)
                .padding(8)
                .style(container::rounded_box),
        );
    }

    let actions = row![
        button("⬇  Download")
            .on_press(Message::Download)
            .padding([12, 24])
            .style(button::primary),
        button("Try Another Era")
            .on_press(Message::TryAnother)
            .padding([12, 24])
            .style(button::secondary),
    ]
    .spacing(16);

    content = content.push(
        column![
            text(result.scene.title).size(22),
            text(result.scene.description).size(14).color(MUTED),
            actions,
        ]
        .spacing(10)
        .align_x(Alignment::Center),
    );

    if let Some(notice) = notice {
        content = content.push(text(notice).size(14).color(MUTED));
    }

    scrollable(container(content).padding(24).center_x(Length::Fill)).into()
}

fn centered<'a>(content: impl Into<Element<'a, Message>>) -> Element<'a, Message> {
    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}
