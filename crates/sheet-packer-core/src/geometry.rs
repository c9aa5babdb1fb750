use serde::{Deserialize, Serialize};

/// Width/height pair with a rotation flag. Toggling the flag swaps the two sides.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
pub struct Size {
    width: u32,
    height: u32,
    rotated: bool,
}

impl Size {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            rotated: false,
        }
    }
    pub fn width(&self) -> u32 {
        self.width
    }
    pub fn height(&self) -> u32 {
        self.height
    }
    pub fn rotated(&self) -> bool {
        self.rotated
    }
    /// Sets the rotation flag; width and height swap only when the flag actually changes.
    pub fn set_rotated(&mut self, rotated: bool) {
        if self.rotated != rotated {
            self.rotated = rotated;
            std::mem::swap(&mut self.width, &mut self.height);
        }
    }
    pub fn area(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Axis-aligned rectangle in sheet pixels, carrying a caller handle `K`.
///
/// `x,y` is the top-left corner. The exclusive far corner (`far_x`, `far_y`) is cached and
/// kept in sync by every mutator, which is why the fields are private.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rect<K = ()> {
    size: Size,
    x: u32,
    y: u32,
    far_x: u32,
    far_y: u32,
    sheet: usize,
    item: K,
}

/// Free space inside a bin. Never escapes a single packing run.
pub type FreeRect = Rect<()>;

impl FreeRect {
    pub fn free(x: u32, y: u32, width: u32, height: u32) -> Self {
        Rect::with_item(x, y, width, height, ())
    }
}

impl<K> Rect<K> {
    /// Unplaced rectangle at the origin.
    pub fn sized(width: u32, height: u32, item: K) -> Self {
        Self::with_item(0, 0, width, height, item)
    }

    pub fn with_item(x: u32, y: u32, width: u32, height: u32, item: K) -> Self {
        Self {
            size: Size::new(width, height),
            x,
            y,
            far_x: x + width,
            far_y: y + height,
            sheet: 0,
            item,
        }
    }

    fn refresh_far(&mut self) {
        self.far_x = self.x + self.size.width();
        self.far_y = self.y + self.size.height();
    }

    pub fn x(&self) -> u32 {
        self.x
    }
    pub fn y(&self) -> u32 {
        self.y
    }
    pub fn width(&self) -> u32 {
        self.size.width()
    }
    pub fn height(&self) -> u32 {
        self.size.height()
    }
    /// Exclusive right edge (`x + width`).
    pub fn far_x(&self) -> u32 {
        self.far_x
    }
    /// Exclusive bottom edge (`y + height`).
    pub fn far_y(&self) -> u32 {
        self.far_y
    }
    pub fn size(&self) -> Size {
        self.size
    }
    pub fn rotated(&self) -> bool {
        self.size.rotated()
    }
    pub fn sheet(&self) -> usize {
        self.sheet
    }
    pub fn item(&self) -> &K {
        &self.item
    }
    pub fn area(&self) -> u64 {
        self.size.area()
    }

    pub fn set_position(&mut self, x: u32, y: u32) {
        self.x = x;
        self.y = y;
        self.refresh_far();
    }
    pub fn set_rotated(&mut self, rotated: bool) {
        self.size.set_rotated(rotated);
        self.refresh_far();
    }

    /// Same geometry, different handle.
    pub fn with_handle<T>(&self, item: T) -> Rect<T> {
        Rect {
            size: self.size,
            x: self.x,
            y: self.y,
            far_x: self.far_x,
            far_y: self.far_y,
            sheet: self.sheet,
            item,
        }
    }

    /// True if `other` lies completely inside `self` (edges may touch).
    pub fn contains<T>(&self, other: &Rect<T>) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.far_x <= self.far_x
            && other.far_y <= self.far_y
    }

    /// Separating-axis test on half-open boxes; touching edges don't intersect.
    pub fn intersects<T>(&self, other: &Rect<T>) -> bool {
        !(other.x >= self.far_x
            || other.far_x <= self.x
            || other.y >= self.far_y
            || other.far_y <= self.y)
    }
}
