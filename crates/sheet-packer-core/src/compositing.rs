use crate::error::Result;
use crate::model::Sheet;
use image::RgbaImage;
use std::fs;
use std::path::Path;

/// Copies `src` into `canvas` with its top-left at (dx, dy), turning it 90° clockwise
/// when `rotated`. Pixels falling outside the canvas are dropped.
pub fn blit_sprite(src: &RgbaImage, canvas: &mut RgbaImage, dx: u32, dy: u32, rotated: bool) {
    let (cw, ch) = canvas.dimensions();
    let (sw, sh) = src.dimensions();
    let (rw, rh) = if rotated { (sh, sw) } else { (sw, sh) };
    for yy in 0..rh {
        for xx in 0..rw {
            let (cx, cy) = (dx + xx, dy + yy);
            if cx >= cw || cy >= ch {
                continue;
            }
            // clockwise: destination column xx reads source row sh-1-xx
            let (ix, iy) = if rotated { (yy, sh - 1 - xx) } else { (xx, yy) };
            canvas.put_pixel(cx, cy, *src.get_pixel(ix, iy));
        }
    }
}

/// Draws every placed sprite onto a transparent sheet-sized canvas.
///
/// `lookup` maps a placement key to its source image; keys it can't resolve are
/// skipped.
pub fn render_sheet<'a, K, F>(sheet: &Sheet<K>, mut lookup: F) -> RgbaImage
where
    F: FnMut(&K) -> Option<&'a RgbaImage>,
{
    let mut canvas = RgbaImage::new(sheet.width, sheet.height);
    for p in &sheet.placements {
        let Some(img) = lookup(&p.key) else {
            tracing::warn!(x = p.x, y = p.y, "no image for placement, leaving it blank");
            continue;
        };
        blit_sprite(img, &mut canvas, p.x, p.y, p.rotated);
    }
    canvas
}

/// Writes a rendered sheet, creating missing parent directories. The format follows the
/// file extension.
pub fn save_sheet(canvas: &RgbaImage, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    canvas.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    fn strip() -> RgbaImage {
        // 2x1: red then green
        let mut img = RgbaImage::new(2, 1);
        img.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        img.put_pixel(1, 0, Rgba([0, 255, 0, 255]));
        img
    }

    #[test]
    fn upright_blit_copies_in_place() {
        let mut canvas = RgbaImage::new(4, 4);
        blit_sprite(&strip(), &mut canvas, 1, 2, false);
        assert_eq!(canvas.get_pixel(1, 2), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(2, 2), &Rgba([0, 255, 0, 255]));
    }

    #[test]
    fn rotated_blit_turns_clockwise() {
        let mut canvas = RgbaImage::new(4, 4);
        blit_sprite(&strip(), &mut canvas, 0, 0, true);
        // left pixel ends up on top
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
        assert_eq!(canvas.get_pixel(0, 1), &Rgba([0, 255, 0, 255]));
        assert_eq!(canvas.get_pixel(1, 0), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn render_places_each_sprite() {
        let sheet = Sheet {
            width: 3,
            height: 2,
            heuristic: None,
            placements: vec![
                crate::model::Placement {
                    key: 0usize,
                    x: 0,
                    y: 0,
                    width: 2,
                    height: 1,
                    rotated: false,
                    sheet: 0,
                },
                crate::model::Placement {
                    key: 1usize,
                    x: 2,
                    y: 0,
                    width: 1,
                    height: 2,
                    rotated: true,
                    sheet: 0,
                },
                crate::model::Placement {
                    key: 7usize,
                    x: 0,
                    y: 1,
                    width: 1,
                    height: 1,
                    rotated: false,
                    sheet: 0,
                },
            ],
        };
        let images = [strip(), strip()];
        let canvas = render_sheet(&sheet, |&k| images.get(k));
        assert_eq!(canvas.dimensions(), (3, 2));
        assert_eq!(canvas.get_pixel(1, 0), &Rgba([0, 255, 0, 255]));
        assert_eq!(canvas.get_pixel(2, 1), &Rgba([0, 255, 0, 255]));
        // unknown key stays transparent
        assert_eq!(canvas.get_pixel(0, 1), &Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn clips_at_canvas_edge() {
        let mut canvas = RgbaImage::new(1, 1);
        blit_sprite(&strip(), &mut canvas, 0, 0, false);
        assert_eq!(canvas.get_pixel(0, 0), &Rgba([255, 0, 0, 255]));
    }

    #[test]
    fn save_creates_directories_and_round_trips() {
        let dir = std::env::temp_dir().join(format!("sheet-packer-save-{}", std::process::id()));
        let path = dir.join("nested").join("sheet.png");
        save_sheet(&strip(), &path).unwrap();
        let back = image::open(&path).unwrap().to_rgba8();
        assert_eq!(back, strip());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn save_rejects_empty_canvas() {
        let path = std::env::temp_dir().join(format!("sheet-packer-empty-{}.png", std::process::id()));
        let err = save_sheet(&RgbaImage::new(0, 0), &path).unwrap_err();
        assert!(matches!(err, crate::error::SheetPackerError::Image(_)), "{err}");
        let _ = fs::remove_file(&path);
    }
}
