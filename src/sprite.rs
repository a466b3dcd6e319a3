use anyhow::{Context, Result};
use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};
use std::path::Path;

/// An RGBA bitmap with the handful of transforms the game needs.
#[derive(Clone, Debug, PartialEq)]
pub struct Sprite {
    image: RgbaImage,
}

impl Sprite {
    pub fn from_fn(width: u32, height: u32, mut f: impl FnMut(u32, u32) -> [u8; 4]) -> Self {
        Self {
            image: RgbaImage::from_fn(width, height, |x, y| Rgba(f(x, y))),
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let image = image::open(path)
            .with_context(|| format!("failed to load sprite {}", path.display()))?
            .to_rgba8();
        Ok(Self { image })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    pub fn flip_vertical(&self) -> Self {
        Self {
            image: imageops::flip_vertical(&self.image),
        }
    }

    pub fn scale(&self, width: u32, height: u32) -> Self {
        Self {
            image: imageops::resize(&self.image, width, height, FilterType::Nearest),
        }
    }

    /// Doubles the size with the Scale2x (AdvanceMAME) edge rule, which keeps
    /// pixel-art diagonals crisp instead of blocky.
    pub fn scale2x(&self) -> Self {
        let (w, h) = (self.width(), self.height());
        let at = |x: i64, y: i64| {
            let x = x.clamp(0, w as i64 - 1) as u32;
            let y = y.clamp(0, h as i64 - 1) as u32;
            *self.image.get_pixel(x, y)
        };
        let mut out = RgbaImage::new(w * 2, h * 2);
        for y in 0..h {
            for x in 0..w {
                let (xi, yi) = (x as i64, y as i64);
                let e = at(xi, yi);
                let b = at(xi, yi - 1);
                let d = at(xi - 1, yi);
                let f = at(xi + 1, yi);
                let hh = at(xi, yi + 1);
                let (mut e0, mut e1, mut e2, mut e3) = (e, e, e, e);
                if b != hh && d != f {
                    if d == b {
                        e0 = d;
                    }
                    if b == f {
                        e1 = f;
                    }
                    if d == hh {
                        e2 = d;
                    }
                    if hh == f {
                        e3 = f;
                    }
                }
                out.put_pixel(2 * x, 2 * y, e0);
                out.put_pixel(2 * x + 1, 2 * y, e1);
                out.put_pixel(2 * x, 2 * y + 1, e2);
                out.put_pixel(2 * x + 1, 2 * y + 1, e3);
            }
        }
        Self { image: out }
    }

    /// Rotates counter-clockwise by `degrees`. The result grows to the
    /// bounding box of the rotated bitmap; uncovered pixels are transparent.
    pub fn rotate(&self, degrees: f64) -> Self {
        if degrees.rem_euclid(360.0) == 0.0 {
            return self.clone();
        }
        let (w, h) = (self.width() as f64, self.height() as f64);
        let (sin, cos) = degrees.to_radians().sin_cos();
        let out_w = ((w * cos.abs() + h * sin.abs()) - 1e-6).ceil().max(1.0) as u32;
        let out_h = ((w * sin.abs() + h * cos.abs()) - 1e-6).ceil().max(1.0) as u32;
        let (cx, cy) = (out_w as f64 / 2.0, out_h as f64 / 2.0);

        let image = RgbaImage::from_fn(out_w, out_h, |ox, oy| {
            let u = ox as f64 + 0.5 - cx;
            let v = oy as f64 + 0.5 - cy;
            let sx = (u * cos - v * sin + w / 2.0).floor();
            let sy = (u * sin + v * cos + h / 2.0).floor();
            if sx < 0.0 || sy < 0.0 || sx >= w || sy >= h {
                Rgba([0, 0, 0, 0])
            } else {
                *self.image.get_pixel(sx as u32, sy as u32)
            }
        });
        Self { image }
    }
}
