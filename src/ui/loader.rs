/// Spinning arc shown while the time machine is working
use iced::widget::canvas::{self, path::Arc, LineCap, Path, Stroke};
use iced::{mouse, Color, Radians, Rectangle, Renderer, Theme};
use std::f32::consts::TAU;

/// Width of the ring in logical pixels
const RING_WIDTH: f32 = 6.0;

/// Length of the moving arc, in radians
const ARC_LENGTH: f32 = 1.6;

/// Rotation per animation tick
const STEP: f32 = 0.09;

#[derive(Debug, Clone, Copy, Default)]
pub struct Spinner {
    angle: f32,
}

impl Spinner {
    /// Advance one animation tick
    pub fn advance(&mut self) {
        self.angle = (self.angle + STEP) % TAU;
    }

    pub fn angle(&self) -> f32 {
        self.angle
    }
}

impl<Message> canvas::Program<Message> for Spinner {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());

        let center = frame.center();
        let radius = (bounds.width.min(bounds.height) / 2.0 - RING_WIDTH).max(1.0);

        // Faint full ring
        let track = Path::circle(center, radius);
        frame.stroke(
            &track,
            Stroke::default()
                .with_color(Color::from_rgba(1.0, 1.0, 1.0, 0.1))
                .with_width(RING_WIDTH),
        );

        // Moving arc on top
        let arc = Path::new(|builder| {
            builder.arc(Arc {
                center,
                radius,
                start_angle: Radians(self.angle),
                end_angle: Radians(self.angle + ARC_LENGTH),
            });
        });
        frame.stroke(
            &arc,
            Stroke::default()
                .with_color(Color::from_rgb8(0xa8, 0x55, 0xf7))
                .with_width(RING_WIDTH)
                .with_line_cap(LineCap::Round),
        );

        vec![frame.into_geometry()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angle_wraps() {
        let mut spinner = Spinner::default();
        for _ in 0..1000 {
            spinner.advance();
            assert!(spinner.angle() >= 0.0 && spinner.angle() < TAU);
        }
    }
}
