use crate::sprite::Sprite;

/// Opacity bitmap for pixel-perfect collision.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Mask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl Mask {
    /// A pixel counts as solid when its alpha is above half.
    pub fn from_sprite(sprite: &Sprite) -> Self {
        let (width, height) = (sprite.width(), sprite.height());
        let mut bits = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            for x in 0..width {
                bits.push(sprite.pixel(x, y)[3] > 127);
            }
        }
        Self { width, height, bits }
    }

    pub fn get(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height && self.bits[(y * self.width + x) as usize]
    }

    /// First solid pixel shared with `other` placed at `offset` relative to
    /// this mask's top-left corner, in this mask's coordinates.
    pub fn overlap(&self, other: &Mask, offset: (i32, i32)) -> Option<(u32, u32)> {
        let (dx, dy) = (offset.0 as i64, offset.1 as i64);
        let x0 = dx.max(0);
        let y0 = dy.max(0);
        let x1 = (dx + other.width as i64).min(self.width as i64);
        let y1 = (dy + other.height as i64).min(self.height as i64);
        for y in y0..y1 {
            for x in x0..x1 {
                if self.get(x as u32, y as u32) && other.get((x - dx) as u32, (y - dy) as u32) {
                    return Some((x as u32, y as u32));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Solid where `f` says so, fully transparent elsewhere.
    fn mask(w: u32, h: u32, f: impl Fn(u32, u32) -> bool) -> Mask {
        Mask::from_sprite(&Sprite::from_fn(w, h, |x, y| {
            if f(x, y) { [0, 0, 0, 255] } else { [0, 0, 0, 0] }
        }))
    }

    #[test]
    fn alpha_threshold() {
        let s = Sprite::from_fn(3, 1, |x, _| [0, 0, 0, [127, 128, 255][x as usize]]);
        let m = Mask::from_sprite(&s);
        assert!(!m.get(0, 0));
        assert!(m.get(1, 0));
        assert!(m.get(2, 0));
    }

    #[test]
    fn overlapping_squares_hit() {
        let a = mask(10, 10, |_, _| true);
        let b = mask(10, 10, |_, _| true);
        assert_eq!(a.overlap(&b, (5, 7)), Some((5, 7)));
        assert_eq!(a.overlap(&b, (-9, -9)), Some((0, 0)));
    }

    #[test]
    fn disjoint_or_out_of_range_misses() {
        let a = mask(10, 10, |_, _| true);
        let b = mask(4, 4, |_, _| true);
        assert_eq!(a.overlap(&b, (10, 0)), None);
        assert_eq!(a.overlap(&b, (0, -4)), None);
        assert_eq!(a.overlap(&b, (-100, 300)), None);
    }

    #[test]
    fn transparent_pixels_never_collide() {
        // a ring: hollow in the middle
        let ring = mask(9, 9, |x, y| x == 0 || y == 0 || x == 8 || y == 8);
        let dot = mask(1, 1, |_, _| true);
        assert_eq!(ring.overlap(&dot, (4, 4)), None);
        assert_eq!(ring.overlap(&dot, (8, 4)), Some((8, 4)));
    }
}
