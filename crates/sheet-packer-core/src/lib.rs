//! Core library for packing sprites into a single, near-minimal sheet.
//!
//! - Engine: MaxRects with five free-rectangle heuristics (BSSF/BLSF/BAF/BL/CP)
//! - Search: [`Packager`] grows then shrinks the sheet under every heuristic, in parallel,
//!   and keeps the smallest result
//! - Progress: [`PackProgress`] is a lock-free, monotonic progress value for UIs
//! - Data model is serde-serializable; JSON exporters and an image compositor are included.
//!
//! Quick example:
//! ```
//! use sheet_packer_core::{pack_sprites, PackerOptions, SpriteRect};
//! # fn main() -> sheet_packer_core::Result<()> {
//! let sprites = vec![
//!     SpriteRect::new("a".to_string(), 2, 4),
//!     SpriteRect::new("b".to_string(), 2, 4),
//! ];
//! let sheet = pack_sprites(sprites, PackerOptions::default())?;
//! assert_eq!(sheet.placements.len(), 2);
//! println!("{}x{}", sheet.width, sheet.height);
//! # Ok(()) }
//! ```

#[cfg(feature = "image")]
pub mod compositing;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod model;
pub mod packager;
pub mod packer;
pub mod progress;

pub use config::*;
pub use error::*;
pub use export::*;
pub use geometry::{FreeRect, Rect, Size};
pub use model::*;
pub use packager::{CancelToken, Packager, pack_sprites};
pub use packer::MaxRectsBinPack;
pub use progress::PackProgress;

/// Convenience prelude for common types and functions.
/// Importing `sheet_packer_core::prelude::*` brings the primary APIs into scope.
pub mod prelude {
    pub use crate::config::{Heuristic, PackerOptions, PackerOptionsBuilder};
    pub use crate::error::{Result, SheetPackerError};
    pub use crate::model::{Placement, Sheet, SheetStats, SpriteRect};
    pub use crate::packager::{CancelToken, Packager, pack_sprites};
    pub use crate::progress::PackProgress;
    pub use crate::{to_json_array, to_json_hash};
}
