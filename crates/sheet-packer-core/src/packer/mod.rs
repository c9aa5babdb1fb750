//! Packing engines.
//!
//! Only MaxRects is provided: it keeps an explicit list of maximal free rectangles and
//! gives the best density of the classic free-list packers.

pub mod maxrects;

pub use maxrects::MaxRectsBinPack;
