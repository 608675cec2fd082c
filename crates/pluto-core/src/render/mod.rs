//! Rendering: screen + snapshot to draw commands, and the canvas that
//! executes them

pub mod canvas;
pub mod colors;
pub mod commands;
pub mod dispatcher;
pub mod format;
pub mod graphics;
pub mod layout;
pub mod sparkline;

pub use canvas::{Canvas, RecordingCanvas, execute};
pub use commands::{DrawCommand, FontSize, Label, TextDatum, label};
pub use dispatcher::{Frame, RenderDispatcher};
pub use graphics::GraphicsCanvas;
pub use layout::{PANEL_HEIGHT, PANEL_WIDTH, ScreenLayout};
