use std::path::Path;

use image::{Rgba, RgbaImage};
use veriface_types::DetectionBox;

use crate::capture::CaptureError;

pub const BOX_COLOR: Rgba<u8> = Rgba([0, 0, 255, 255]);
pub const LINE_WIDTH: u32 = 2;

/// Boxes from one detection cycle, sized to the frame they came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overlay {
    pub width: u32,
    pub height: u32,
    pub boxes: Vec<DetectionBox>,
}

impl Overlay {
    pub fn new(width: u32, height: u32, boxes: Vec<DetectionBox>) -> Self {
        Self {
            width,
            height,
            boxes,
        }
    }

    /// Draw box outlines on a transparent surface of the frame's size
    pub fn render(&self) -> RgbaImage {
        let mut surface = RgbaImage::new(self.width, self.height);
        for b in &self.boxes {
            stroke_rect(&mut surface, b);
        }
        surface
    }

    pub fn save_png(&self, path: &Path) -> Result<(), CaptureError> {
        if self.width == 0 || self.height == 0 {
            return Err(CaptureError::NotReady);
        }
        self.render().save(path)?;
        Ok(())
    }
}

fn stroke_rect(surface: &mut RgbaImage, b: &DetectionBox) {
    let (w, h) = (surface.width() as i64, surface.height() as i64);
    let x0 = b.x.floor() as i64;
    let y0 = b.y.floor() as i64;
    let x1 = (b.x + b.width).ceil() as i64;
    let y1 = (b.y + b.height).ceil() as i64;
    if x1 <= x0 || y1 <= y0 {
        return;
    }

    let mut put = |x: i64, y: i64| {
        if (0..w).contains(&x) && (0..h).contains(&y) {
            surface.put_pixel(x as u32, y as u32, BOX_COLOR);
        }
    };

    for t in 0..LINE_WIDTH as i64 {
        for x in x0..x1 {
            put(x, y0 + t);
            put(x, y1 - 1 - t);
        }
        for y in y0..y1 {
            put(x0 + t, y);
            put(x1 - 1 - t, y);
        }
    }
}
