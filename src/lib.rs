//! Blockfall - a grid block-placement puzzle
//!
//! Core modules:
//! - `game`: Deterministic puzzle state machine (grid, tray, scoring)
//! - `scene`: Retained scene graph with actions and particles
//! - `render`: 2D primitive surface the scene draws through
//! - `services`: Injected persistence and haptic feedback
//! - `settings`: Player-facing effect settings

pub mod color;
pub mod game;
pub mod render;
pub mod scene;
pub mod services;
pub mod settings;

pub use color::Color;
pub use game::BlockFall;
pub use settings::Settings;

/// Game configuration constants
pub mod consts {
    /// Logical screen dimensions (iPhone-class portrait at 3x scale)
    pub const SCREEN_WIDTH: f32 = 1179.0;
    pub const SCREEN_HEIGHT: f32 = 2556.0;

    /// Safe-area insets (notch / home indicator)
    pub const SAFE_TOP: f32 = 162.0;
    pub const SAFE_BOTTOM: f32 = 102.0;

    /// Playfield dimensions
    pub const GRID_SIZE: usize = 8;
    /// Size of one grid cell in logical pixels
    pub const CELL_SIZE: f32 = 120.0;
    /// Inner margin between the grid and its backdrop
    pub const GRID_PADDING: f32 = 30.0;

    /// Shapes offered per tray batch
    pub const TRAY_SLOTS: usize = 3;
    /// Resting scale of a tray shape
    pub const TRAY_SCALE: f32 = 0.6;
    /// Scale while a shape is being dragged
    pub const DRAG_SCALE: f32 = 1.2;
    /// Touch distance within which a tray shape is grabbed
    pub const GRAB_RADIUS: f32 = 150.0;

    /// Delay before a fresh batch replaces a fully placed tray (ms)
    pub const RESPAWN_DELAY_MS: f32 = 300.0;

    /// Points per cell for placing a shape
    pub const PLACE_POINTS_PER_CELL: u64 = 10;
    /// Points per cell emptied by a line clear
    pub const CLEAR_POINTS_PER_CELL: u64 = 20;
    /// Extra points per line when clearing more than one line at once
    pub const MULTI_LINE_BONUS: u64 = 50;
    /// Flat bonus when a clear leaves the grid completely empty
    pub const PERFECT_CLEAR_BONUS: u64 = 500;

    /// Score thresholds that fire a one-shot celebration, ascending
    pub const MILESTONES: [u64; 7] = [100, 250, 500, 1000, 2500, 5000, 10000];
}

/// Linear interpolation between two scalars
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
