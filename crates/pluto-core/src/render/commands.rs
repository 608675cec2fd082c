//! Draw command vocabulary
//!
//! A rendered screen is a plain list of [`DrawCommand`]s. Keeping the
//! output as data lets tests assert on exactly what would hit the panel.

use embedded_graphics::geometry::Point;
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::primitives::Rectangle;

/// Short text carried by a draw command
pub type Label = heapless::String<32>;

/// Build a [`Label`], truncating anything past its capacity
pub fn label(text: &str) -> Label {
    let mut out = Label::new();
    for c in text.chars() {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Anchor point of a text run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDatum {
    TopLeft,
    TopCenter,
    TopRight,
    MiddleCenter,
}

/// Font size classes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontSize {
    /// 6x10
    Small,
    /// 9x15
    Medium,
    /// 10x20
    Large,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillRect {
        area: Rectangle,
        color: Rgb565,
    },
    FillRoundRect {
        area: Rectangle,
        radius: u32,
        color: Rgb565,
    },
    DrawLine {
        from: Point,
        to: Point,
        color: Rgb565,
        width: u32,
    },
    DrawCircle {
        center: Point,
        diameter: u32,
        color: Rgb565,
        filled: bool,
    },
    /// Colours used by every following `DrawText`
    SetTextColor {
        fg: Rgb565,
        bg: Option<Rgb565>,
    },
    DrawText {
        text: Label,
        at: Point,
        datum: TextDatum,
        size: FontSize,
    },
}
