//! Per-screen layout descriptors
//!
//! All screens share one frame: title row, primary value, secondary value,
//! a content well and a footer. Each [`ScreenLayout`] only says which parts
//! are used and how they are coloured, so the dispatcher has one code path
//! per screen kind rather than per panel variant.

use embedded_graphics::geometry::{Point, Size};
use embedded_graphics::pixelcolor::Rgb565;
use embedded_graphics::primitives::Rectangle;

use super::colors::{COLOR_GOLD, COLOR_PANEL, COLOR_RED, COLOR_SKY};
use crate::display::DisplayScreen;

pub const PANEL_WIDTH: u32 = 320;
pub const PANEL_HEIGHT: u32 = 240;

/// Whole panel
pub const PANEL_AREA: Rectangle =
    Rectangle::new(Point::new(0, 0), Size::new(PANEL_WIDTH, PANEL_HEIGHT));

pub const MARGIN: i32 = 16;
pub const TITLE_AT: Point = Point::new(MARGIN, 12);
pub const PRIMARY_AT: Point = Point::new(MARGIN, 48);
pub const SECONDARY_AT: Point = Point::new(MARGIN, 84);

/// Chart well on the btc screen, profit details on the profit screen
pub const WELL_AREA: Rectangle = Rectangle::new(Point::new(MARGIN, 112), Size::new(288, 92));
pub const WELL_RADIUS: u32 = 6;

/// Link banner in the top right corner
pub const BANNER_AREA: Rectangle = Rectangle::new(Point::new(212, 8), Size::new(92, 22));

pub const FOOTER_AREA: Rectangle = Rectangle::new(Point::new(0, 216), Size::new(PANEL_WIDTH, 24));

pub const PANEL_CENTER: Point = Point::new(PANEL_WIDTH as i32 / 2, PANEL_HEIGHT as i32 / 2);

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenLayout {
    pub background: Rgb565,
    pub title: Option<&'static str>,
    pub accent: Rgb565,
    /// Show the bot mode footer
    pub footer: bool,
}

pub const BTC_LAYOUT: ScreenLayout = ScreenLayout {
    background: COLOR_PANEL,
    title: Some("BTC/USD"),
    accent: COLOR_GOLD,
    footer: true,
};

pub const PROFIT_LAYOUT: ScreenLayout = ScreenLayout {
    background: COLOR_PANEL,
    title: Some("PROFIT"),
    accent: COLOR_GOLD,
    footer: true,
};

pub const SCREENSAVER_LAYOUT: ScreenLayout = ScreenLayout {
    background: COLOR_SKY,
    title: None,
    accent: COLOR_GOLD,
    footer: false,
};

pub const ERROR_LAYOUT: ScreenLayout = ScreenLayout {
    background: COLOR_PANEL,
    title: None,
    accent: COLOR_RED,
    footer: false,
};

impl ScreenLayout {
    pub fn for_screen(screen: DisplayScreen) -> &'static ScreenLayout {
        match screen {
            DisplayScreen::Btc => &BTC_LAYOUT,
            DisplayScreen::Profit => &PROFIT_LAYOUT,
            DisplayScreen::Screensaver => &SCREENSAVER_LAYOUT,
            DisplayScreen::Error => &ERROR_LAYOUT,
        }
    }
}
