use crate::config::{Heuristic, PackerOptions};
use crate::model::{Placement, Sheet};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Sheet-level metadata written next to the frames.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Meta {
    pub app: String,
    pub version: String,
    pub size: SheetSize,
    pub max_side: u32,
    pub allow_rotation: bool,
    pub heuristic: Option<Heuristic>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SheetSize {
    pub w: u32,
    pub h: u32,
}

impl Meta {
    pub fn new<K>(sheet: &Sheet<K>, options: &PackerOptions) -> Self {
        Self {
            app: env!("CARGO_PKG_NAME").into(),
            version: env!("CARGO_PKG_VERSION").into(),
            size: SheetSize {
                w: sheet.width,
                h: sheet.height,
            },
            max_side: options.max_side,
            allow_rotation: options.allow_rotation,
            heuristic: sheet.heuristic,
        }
    }
}

// `sourceSize` is the sprite as loaded, i.e. before rotation.
fn frame_fields<K>(p: &Placement<K>) -> (Value, Value) {
    let frame = json!({"x": p.x, "y": p.y, "w": p.width, "h": p.height});
    let source_size = if p.rotated {
        json!({"w": p.height, "h": p.width})
    } else {
        json!({"w": p.width, "h": p.height})
    };
    (frame, source_size)
}

/// Serialize the sheet as `{ frames: [...], meta }`, frames in input order.
pub fn to_json_array<K: ToString>(sheet: &Sheet<K>, options: &PackerOptions) -> Value {
    let frames: Vec<Value> = sheet
        .placements
        .iter()
        .map(|p| {
            let (frame, source_size) = frame_fields(p);
            json!({
                "filename": p.key.to_string(),
                "frame": frame,
                "rotated": p.rotated,
                "sourceSize": source_size,
                "sheet": p.sheet,
            })
        })
        .collect();
    json!({"frames": frames, "meta": Meta::new(sheet, options)})
}

/// Frames keyed by name: `{ frames: { name: { frame, rotated, sourceSize, sheet } }, meta }`.
/// Compatible with engine pipelines expecting TexturePacker-like JSON hash.
pub fn to_json_hash<K: ToString>(sheet: &Sheet<K>, options: &PackerOptions) -> Value {
    let mut frames = serde_json::Map::new();
    for p in &sheet.placements {
        let (frame, source_size) = frame_fields(p);
        frames.insert(
            p.key.to_string(),
            json!({
                "frame": frame,
                "rotated": p.rotated,
                "sourceSize": source_size,
                "sheet": p.sheet,
            }),
        );
    }
    json!({"frames": frames, "meta": Meta::new(sheet, options)})
}
