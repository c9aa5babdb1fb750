use crate::config::Heuristic;
use crate::geometry::Rect;
use serde::{Deserialize, Serialize};

/// A sprite to pack: caller key plus its unrotated size in pixels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpriteRect<K = String> {
    pub key: K,
    pub width: u32,
    pub height: u32,
}

impl<K> SpriteRect<K> {
    pub fn new(key: K, width: u32, height: u32) -> Self {
        Self { key, width, height }
    }
}

/// Where one sprite ended up.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Placement<K = String> {
    pub key: K,
    pub x: u32,
    pub y: u32,
    /// Post-rotation width (the input height when `rotated`).
    pub width: u32,
    /// Post-rotation height.
    pub height: u32,
    /// True if the sprite was turned 90° to fit.
    pub rotated: bool,
    /// Sheet index; single-sheet packing always yields 0.
    pub sheet: usize,
}

impl<K> Placement<K> {
    pub(crate) fn from_rect<T>(key: K, rect: &Rect<T>) -> Self {
        Self {
            key,
            x: rect.x(),
            y: rect.y(),
            width: rect.width(),
            height: rect.height(),
            rotated: rect.rotated(),
            sheet: rect.sheet(),
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }
    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
    pub fn overlaps<T>(&self, other: &Placement<T>) -> bool {
        !(self.x >= other.right()
            || other.x >= self.right()
            || self.y >= other.bottom()
            || other.y >= self.bottom())
    }
}

/// A packed sheet. Placements are listed in the caller's input order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sheet<K = String> {
    pub width: u32,
    pub height: u32,
    /// Heuristic that produced the winning layout; `None` for an empty sheet.
    pub heuristic: Option<Heuristic>,
    pub placements: Vec<Placement<K>>,
}

/// Statistics about how well a sheet is filled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct SheetStats {
    pub num_sprites: usize,
    /// Sheet width * height.
    pub sheet_area: u64,
    /// Sum of sprite areas.
    pub used_area: u64,
    /// used_area / sheet_area (0.0 to 1.0); 0 for an empty sheet.
    pub occupancy: f64,
    pub num_rotated: usize,
}

impl<K> Sheet<K> {
    pub fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            heuristic: None,
            placements: Vec::new(),
        }
    }

    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn stats(&self) -> SheetStats {
        let sheet_area = self.area();
        let used_area: u64 = self
            .placements
            .iter()
            .map(|p| p.width as u64 * p.height as u64)
            .sum();
        let occupancy = if sheet_area > 0 {
            used_area as f64 / sheet_area as f64
        } else {
            0.0
        };
        SheetStats {
            num_sprites: self.placements.len(),
            sheet_area,
            used_area,
            occupancy,
            num_rotated: self.placements.iter().filter(|p| p.rotated).count(),
        }
    }
}

impl SheetStats {
    /// Returns a human-readable summary of the statistics.
    pub fn summary(&self) -> String {
        format!(
            "Sprites: {}, Occupancy: {:.2}%, Sheet Area: {} px², Used Area: {} px², Rotated: {}",
            self.num_sprites,
            self.occupancy * 100.0,
            self.sheet_area,
            self.used_area,
            self.num_rotated,
        )
    }

    pub fn wasted_area(&self) -> u64 {
        self.sheet_area.saturating_sub(self.used_area)
    }
}
