//! Panel palette
//!
//! RGB565 constants converted from 8-bit RGB (R>>3, G>>2, B>>3).

use embedded_graphics::pixelcolor::Rgb565;

// ============================================================================
// Surfaces
// ============================================================================

/// Screen background - near black with a blue tint
pub const COLOR_PANEL: Rgb565 = Rgb565::new(20 >> 3, 20 >> 2, 24 >> 3);

/// Raised surface for the chart well and footer
pub const COLOR_RAISED: Rgb565 = Rgb565::new(36 >> 3, 36 >> 2, 44 >> 3);

/// Screensaver sky
pub const COLOR_SKY: Rgb565 = Rgb565::new(0, 0, 0);

// ============================================================================
// Accents
// ============================================================================

/// Titles and the BTC accent
pub const COLOR_GOLD: Rgb565 = Rgb565::new(255 >> 3, 193 >> 2, 7 >> 3);

/// Positive values and the online banner
pub const COLOR_GREEN: Rgb565 = Rgb565::new(76 >> 3, 175 >> 2, 80 >> 3);

/// Negative values, offline banner and the error screen
pub const COLOR_RED: Rgb565 = Rgb565::new(244 >> 3, 67 >> 2, 54 >> 3);

/// Secondary labels
pub const COLOR_GRAY: Rgb565 = Rgb565::new(140 >> 3, 140 >> 2, 140 >> 3);

/// Primary text
pub const COLOR_TEXT: Rgb565 = Rgb565::new(31, 63, 31);

/// Dim star on the screensaver
pub const COLOR_STAR_DIM: Rgb565 = Rgb565::new(90 >> 3, 90 >> 2, 110 >> 3);

/// Colour for a signed value
pub fn signed_color(value: f32) -> Rgb565 {
    if value >= 0.0 { COLOR_GREEN } else { COLOR_RED }
}
