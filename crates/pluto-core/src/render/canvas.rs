//! Display capability consumed by the renderer

use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_graphics::geometry::Point;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::primitives::Rectangle;

use super::commands::{DrawCommand, FontSize, TextDatum, label};

/// Opaque drawing back end
///
/// Mirrors the panel driver's primitive set. Implementations decide how
/// (and whether) to buffer; [`flush`](Canvas::flush) is called once per
/// rendered frame.
pub trait Canvas {
    type Error;

    fn fill_rect(&mut self, area: Rectangle, color: Rgb565) -> Result<(), Self::Error>;

    fn fill_round_rect(
        &mut self,
        area: Rectangle,
        radius: u32,
        color: Rgb565,
    ) -> Result<(), Self::Error>;

    fn draw_line(
        &mut self,
        from: Point,
        to: Point,
        color: Rgb565,
        width: u32,
    ) -> Result<(), Self::Error>;

    fn draw_circle(
        &mut self,
        center: Point,
        diameter: u32,
        color: Rgb565,
        filled: bool,
    ) -> Result<(), Self::Error>;

    fn set_text_color(&mut self, fg: Rgb565, bg: Option<Rgb565>) -> Result<(), Self::Error>;

    fn draw_text(
        &mut self,
        text: &str,
        at: Point,
        datum: TextDatum,
        size: FontSize,
    ) -> Result<(), Self::Error>;

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Replay a command list onto a canvas
pub fn execute<C: Canvas + ?Sized>(commands: &[DrawCommand], canvas: &mut C) -> Result<(), C::Error> {
    for command in commands {
        match command {
            DrawCommand::FillRect { area, color } => canvas.fill_rect(*area, *color)?,
            DrawCommand::FillRoundRect {
                area,
                radius,
                color,
            } => canvas.fill_round_rect(*area, *radius, *color)?,
            DrawCommand::DrawLine {
                from,
                to,
                color,
                width,
            } => canvas.draw_line(*from, *to, *color, *width)?,
            DrawCommand::DrawCircle {
                center,
                diameter,
                color,
                filled,
            } => canvas.draw_circle(*center, *diameter, *color, *filled)?,
            DrawCommand::SetTextColor { fg, bg } => canvas.set_text_color(*fg, *bg)?,
            DrawCommand::DrawText {
                text,
                at,
                datum,
                size,
            } => canvas.draw_text(text, *at, *datum, *size)?,
        }
    }
    Ok(())
}

/// Canvas that records every call as a [`DrawCommand`]
///
/// Used by tests and headless runs to inspect frames without a panel.
#[derive(Debug, Default)]
pub struct RecordingCanvas {
    pub commands: Vec<DrawCommand>,
    pub flushes: u32,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Text runs drawn so far, in order
    pub fn texts(&self) -> impl Iterator<Item = &str> + '_ {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::DrawText { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn clear(&mut self) {
        self.commands.clear();
        self.flushes = 0;
    }
}

impl Canvas for RecordingCanvas {
    type Error = Infallible;

    fn fill_rect(&mut self, area: Rectangle, color: Rgb565) -> Result<(), Self::Error> {
        self.commands.push(DrawCommand::FillRect { area, color });
        Ok(())
    }

    fn fill_round_rect(
        &mut self,
        area: Rectangle,
        radius: u32,
        color: Rgb565,
    ) -> Result<(), Self::Error> {
        self.commands.push(DrawCommand::FillRoundRect {
            area,
            radius,
            color,
        });
        Ok(())
    }

    fn draw_line(
        &mut self,
        from: Point,
        to: Point,
        color: Rgb565,
        width: u32,
    ) -> Result<(), Self::Error> {
        self.commands.push(DrawCommand::DrawLine {
            from,
            to,
            color,
            width,
        });
        Ok(())
    }

    fn draw_circle(
        &mut self,
        center: Point,
        diameter: u32,
        color: Rgb565,
        filled: bool,
    ) -> Result<(), Self::Error> {
        self.commands.push(DrawCommand::DrawCircle {
            center,
            diameter,
            color,
            filled,
        });
        Ok(())
    }

    fn set_text_color(&mut self, fg: Rgb565, bg: Option<Rgb565>) -> Result<(), Self::Error> {
        self.commands.push(DrawCommand::SetTextColor { fg, bg });
        Ok(())
    }

    fn draw_text(
        &mut self,
        text: &str,
        at: Point,
        datum: TextDatum,
        size: FontSize,
    ) -> Result<(), Self::Error> {
        self.commands.push(DrawCommand::DrawText {
            text: label(text),
            at,
            datum,
            size,
        });
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::colors::{COLOR_GOLD, COLOR_PANEL};
    use alloc::vec;
    use embedded_graphics::geometry::Size;

    #[test]
    fn test_execute_replays_in_order() {
        let commands = vec![
            DrawCommand::FillRect {
                area: Rectangle::new(Point::zero(), Size::new(320, 240)),
                color: COLOR_PANEL,
            },
            DrawCommand::SetTextColor {
                fg: COLOR_GOLD,
                bg: None,
            },
            DrawCommand::DrawText {
                text: label("BTC/USD"),
                at: Point::new(16, 12),
                datum: TextDatum::TopLeft,
                size: FontSize::Medium,
            },
        ];

        let mut canvas = RecordingCanvas::new();
        execute(&commands, &mut canvas).unwrap();

        assert_eq!(canvas.commands, commands);
        assert!(canvas.texts().eq(["BTC/USD"]));
        assert_eq!(canvas.flushes, 0);
    }
}
