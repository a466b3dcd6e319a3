use crate::sprite::Sprite;

pub type Rgba = [u8; 4];

/// Drawing primitives over a `pixels` RGBA frame. Everything clips to the
/// frame, so callers may pass coordinates partly or fully off-screen.
pub struct Canvas<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
}

impl<'a> Canvas<'a> {
    pub fn new(frame: &'a mut [u8], width: u32, height: u32) -> Self {
        debug_assert_eq!(frame.len(), (width * height * 4) as usize);
        Self { frame, width, height }
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some(((y as u32 * self.width + x as u32) * 4) as usize)
    }

    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgba> {
        let i = self.index(x, y)?;
        let mut px = [0; 4];
        px.copy_from_slice(&self.frame[i..i + 4]);
        Some(px)
    }

    /// Source-over blend; the frame stays opaque.
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        let a = color[3] as u16;
        if a == 0 {
            return;
        }
        let ia = 255 - a;
        for c in 0..3 {
            let dst = self.frame[i + c] as u16;
            self.frame[i + c] = ((color[c] as u16 * a + dst * ia) / 255) as u8;
        }
        self.frame[i + 3] = 255;
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: u32, h: u32, color: Rgba) {
        for py in y..y + h as i32 {
            for px in x..x + w as i32 {
                self.blend_pixel(px, py, color);
            }
        }
    }

    /// Draws `sprite` with its top-left corner at `(x, y)`.
    pub fn blit(&mut self, sprite: &Sprite, x: i32, y: i32) {
        let (w, h) = (sprite.width() as i32, sprite.height() as i32);
        let sx0 = (-x).max(0);
        let sy0 = (-y).max(0);
        let sx1 = w.min(self.width as i32 - x);
        let sy1 = h.min(self.height as i32 - y);
        for sy in sy0..sy1 {
            for sx in sx0..sx1 {
                self.blend_pixel(x + sx, y + sy, sprite.pixel(sx as u32, sy as u32));
            }
        }
    }

    /// Returns the advance in pixels.
    pub fn draw_char(&mut self, ch: char, x: i32, y: i32, scale: u32, color: Rgba) -> i32 {
        if let Some(rows) = glyph(ch) {
            let s = scale as i32;
            for (ry, row) in rows.iter().enumerate() {
                for rx in 0..5 {
                    if (row >> (4 - rx)) & 1 == 1 {
                        self.fill_rect(x + rx * s, y + ry as i32 * s, scale, scale, color);
                    }
                }
            }
        }
        char_advance(scale)
    }

    pub fn draw_text(&mut self, text: &str, x: i32, y: i32, scale: u32, color: Rgba) {
        let mut cx = x;
        for ch in text.chars() {
            cx += self.draw_char(ch, cx, y, scale, color);
        }
    }

    /// Text with a one-pixel-per-scale drop shadow, readable on the sky.
    pub fn draw_text_shadowed(&mut self, text: &str, x: i32, y: i32, scale: u32, color: Rgba) {
        let s = scale as i32;
        self.draw_text(text, x + s, y + s, scale, [0, 0, 0, 160]);
        self.draw_text(text, x, y, scale, color);
    }
}

fn char_advance(scale: u32) -> i32 {
    6 * scale as i32
}

pub fn text_width(text: &str, scale: u32) -> i32 {
    text.chars().count() as i32 * char_advance(scale)
}

const FONT: &[(char, [u8; 7])] = &[
    ('A', [0x0e, 0x11, 0x11, 0x1f, 0x11, 0x11, 0x11]),
    ('B', [0x1e, 0x11, 0x1e, 0x11, 0x11, 0x11, 0x1e]),
    ('C', [0x0e, 0x11, 0x10, 0x10, 0x10, 0x11, 0x0e]),
    ('D', [0x1c, 0x12, 0x11, 0x11, 0x11, 0x12, 0x1c]),
    ('E', [0x1f, 0x10, 0x1e, 0x10, 0x10, 0x10, 0x1f]),
    ('F', [0x1f, 0x10, 0x1e, 0x10, 0x10, 0x10, 0x10]),
    ('G', [0x0e, 0x11, 0x10, 0x17, 0x11, 0x11, 0x0e]),
    ('H', [0x11, 0x11, 0x1f, 0x11, 0x11, 0x11, 0x11]),
    ('I', [0x1f, 0x04, 0x04, 0x04, 0x04, 0x04, 0x1f]),
    ('J', [0x07, 0x02, 0x02, 0x02, 0x12, 0x12, 0x0c]),
    ('K', [0x11, 0x12, 0x14, 0x18, 0x14, 0x12, 0x11]),
    ('L', [0x10, 0x10, 0x10, 0x10, 0x10, 0x10, 0x1f]),
    ('M', [0x11, 0x1b, 0x15, 0x15, 0x11, 0x11, 0x11]),
    ('N', [0x11, 0x19, 0x15, 0x13, 0x11, 0x11, 0x11]),
    ('O', [0x0e, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0e]),
    ('P', [0x1e, 0x11, 0x11, 0x1e, 0x10, 0x10, 0x10]),
    ('Q', [0x0e, 0x11, 0x11, 0x11, 0x15, 0x12, 0x0d]),
    ('R', [0x1e, 0x11, 0x11, 0x1e, 0x14, 0x12, 0x11]),
    ('S', [0x0f, 0x10, 0x10, 0x0e, 0x01, 0x01, 0x1e]),
    ('T', [0x1f, 0x04, 0x04, 0x04, 0x04, 0x04, 0x04]),
    ('U', [0x11, 0x11, 0x11, 0x11, 0x11, 0x11, 0x0e]),
    ('V', [0x11, 0x11, 0x11, 0x11, 0x11, 0x0a, 0x04]),
    ('W', [0x11, 0x11, 0x11, 0x15, 0x15, 0x1b, 0x11]),
    ('X', [0x11, 0x11, 0x0a, 0x04, 0x0a, 0x11, 0x11]),
    ('Y', [0x11, 0x11, 0x0a, 0x04, 0x04, 0x04, 0x04]),
    ('Z', [0x1f, 0x01, 0x02, 0x04, 0x08, 0x10, 0x1f]),
    ('0', [0x0e, 0x11, 0x13, 0x15, 0x19, 0x11, 0x0e]),
    ('1', [0x04, 0x0c, 0x04, 0x04, 0x04, 0x04, 0x0e]),
    ('2', [0x0e, 0x11, 0x01, 0x02, 0x04, 0x08, 0x1f]),
    ('3', [0x1e, 0x01, 0x01, 0x0e, 0x01, 0x01, 0x1e]),
    ('4', [0x02, 0x06, 0x0a, 0x12, 0x1f, 0x02, 0x02]),
    ('5', [0x1f, 0x10, 0x1e, 0x01, 0x01, 0x11, 0x0e]),
    ('6', [0x06, 0x08, 0x10, 0x1e, 0x11, 0x11, 0x0e]),
    ('7', [0x1f, 0x01, 0x02, 0x04, 0x08, 0x08, 0x08]),
    ('8', [0x0e, 0x11, 0x11, 0x0e, 0x11, 0x11, 0x0e]),
    ('9', [0x0e, 0x11, 0x11, 0x0f, 0x01, 0x02, 0x0c]),
    (':', [0x00, 0x04, 0x00, 0x00, 0x04, 0x00, 0x00]),
    ('.', [0x00, 0x00, 0x00, 0x00, 0x00, 0x0c, 0x0c]),
    ('/', [0x01, 0x01, 0x02, 0x04, 0x08, 0x10, 0x10]),
    ('-', [0x00, 0x00, 0x00, 0x1f, 0x00, 0x00, 0x00]),
    ('!', [0x04, 0x04, 0x04, 0x04, 0x04, 0x00, 0x04]),
];

fn glyph(ch: char) -> Option<[u8; 7]> {
    let ch = ch.to_ascii_uppercase();
    FONT.iter().find(|(c, _)| *c == ch).map(|(_, rows)| *rows)
}
