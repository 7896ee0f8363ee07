//! Deterministic puzzle core
//!
//! All gameplay logic lives here. The module is deterministic and
//! platform-free:
//! - Seeded RNG only
//! - Milliseconds-based timers advanced by the host's `update(dt)`
//! - No rendering or platform dependencies beyond the injected services

pub mod grid;
pub mod shapes;
pub mod state;

pub use grid::{Grid, LineClear};
pub use shapes::{PALETTE, SHAPES, Shape};
pub use state::{BlockFall, Mode, TouchPhase};
