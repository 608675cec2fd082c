//! [`Canvas`] over any `embedded-graphics` draw target
//!
//! Works with the panel driver on the device and with
//! `SimulatorDisplay` on the desktop.

use embedded_graphics::{
    Drawable,
    geometry::{Point, Size},
    mono_font::{
        MonoFont, MonoTextStyleBuilder,
        ascii::{FONT_6X10, FONT_9X15, FONT_10X20},
    },
    pixelcolor::Rgb565,
    prelude::*,
    primitives::{Circle, Line, PrimitiveStyle, Rectangle, RoundedRectangle},
    text::{Alignment, Baseline, Text, TextStyleBuilder},
};

use super::canvas::Canvas;
use super::colors::COLOR_TEXT;
use super::commands::{FontSize, TextDatum};

pub struct GraphicsCanvas<D> {
    target: D,
    text_fg: Rgb565,
    text_bg: Option<Rgb565>,
}

impl<D> GraphicsCanvas<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    pub fn new(target: D) -> Self {
        Self {
            target,
            text_fg: COLOR_TEXT,
            text_bg: None,
        }
    }

    pub fn target(&self) -> &D {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut D {
        &mut self.target
    }

    pub fn into_inner(self) -> D {
        self.target
    }
}

fn font(size: FontSize) -> &'static MonoFont<'static> {
    match size {
        FontSize::Small => &FONT_6X10,
        FontSize::Medium => &FONT_9X15,
        FontSize::Large => &FONT_10X20,
    }
}

fn anchor(datum: TextDatum) -> (Alignment, Baseline) {
    match datum {
        TextDatum::TopLeft => (Alignment::Left, Baseline::Top),
        TextDatum::TopCenter => (Alignment::Center, Baseline::Top),
        TextDatum::TopRight => (Alignment::Right, Baseline::Top),
        TextDatum::MiddleCenter => (Alignment::Center, Baseline::Middle),
    }
}

impl<D> Canvas for GraphicsCanvas<D>
where
    D: DrawTarget<Color = Rgb565>,
{
    type Error = D::Error;

    fn fill_rect(&mut self, area: Rectangle, color: Rgb565) -> Result<(), Self::Error> {
        self.target.fill_solid(&area, color)
    }

    fn fill_round_rect(
        &mut self,
        area: Rectangle,
        radius: u32,
        color: Rgb565,
    ) -> Result<(), Self::Error> {
        RoundedRectangle::with_equal_corners(area, Size::new(radius, radius))
            .into_styled(PrimitiveStyle::with_fill(color))
            .draw(&mut self.target)
    }

    fn draw_line(
        &mut self,
        from: Point,
        to: Point,
        color: Rgb565,
        width: u32,
    ) -> Result<(), Self::Error> {
        Line::new(from, to)
            .into_styled(PrimitiveStyle::with_stroke(color, width))
            .draw(&mut self.target)
    }

    fn draw_circle(
        &mut self,
        center: Point,
        diameter: u32,
        color: Rgb565,
        filled: bool,
    ) -> Result<(), Self::Error> {
        let style = if filled {
            PrimitiveStyle::with_fill(color)
        } else {
            PrimitiveStyle::with_stroke(color, 1)
        };
        Circle::with_center(center, diameter)
            .into_styled(style)
            .draw(&mut self.target)
    }

    fn set_text_color(&mut self, fg: Rgb565, bg: Option<Rgb565>) -> Result<(), Self::Error> {
        self.text_fg = fg;
        self.text_bg = bg;
        Ok(())
    }

    fn draw_text(
        &mut self,
        text: &str,
        at: Point,
        datum: TextDatum,
        size: FontSize,
    ) -> Result<(), Self::Error> {
        let mut character_style = MonoTextStyleBuilder::new()
            .font(font(size))
            .text_color(self.text_fg);
        if let Some(bg) = self.text_bg {
            character_style = character_style.background_color(bg);
        }

        let (alignment, baseline) = anchor(datum);
        let text_style = TextStyleBuilder::new()
            .alignment(alignment)
            .baseline(baseline)
            .build();

        Text::with_text_style(text, at, character_style.build(), text_style)
            .draw(&mut self.target)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::colors::{COLOR_GREEN, COLOR_RED};
    use embedded_graphics::mock_display::MockDisplay;

    fn mock_canvas() -> GraphicsCanvas<MockDisplay<Rgb565>> {
        let mut display = MockDisplay::new();
        display.set_allow_overdraw(true);
        display.set_allow_out_of_bounds_drawing(true);
        GraphicsCanvas::new(display)
    }

    #[test]
    fn test_fill_rect_paints_area() {
        let mut canvas = mock_canvas();
        canvas
            .fill_rect(Rectangle::new(Point::new(2, 2), Size::new(4, 4)), COLOR_RED)
            .unwrap();

        let display = canvas.target();
        assert_eq!(display.get_pixel(Point::new(3, 3)), Some(COLOR_RED));
        assert_eq!(display.get_pixel(Point::new(7, 7)), None);
    }

    #[test]
    fn test_filled_and_outlined_circle() {
        let mut canvas = mock_canvas();
        canvas
            .draw_circle(Point::new(10, 10), 9, COLOR_GREEN, true)
            .unwrap();
        assert_eq!(canvas.target().get_pixel(Point::new(10, 10)), Some(COLOR_GREEN));

        let mut canvas = mock_canvas();
        canvas
            .draw_circle(Point::new(10, 10), 9, COLOR_GREEN, false)
            .unwrap();
        assert_eq!(canvas.target().get_pixel(Point::new(10, 10)), None);
    }

    #[test]
    fn test_text_uses_selected_colour() {
        let mut canvas = mock_canvas();
        canvas.set_text_color(COLOR_RED, None).unwrap();
        canvas
            .draw_text("X", Point::new(0, 0), TextDatum::TopLeft, FontSize::Small)
            .unwrap();

        let display = canvas.into_inner();
        let painted = (0..10)
            .flat_map(|y| (0..6).map(move |x| Point::new(x, y)))
            .filter_map(|p| display.get_pixel(p))
            .collect::<alloc::vec::Vec<_>>();
        assert!(!painted.is_empty());
        assert!(painted.iter().all(|&c| c == COLOR_RED));
    }
}
