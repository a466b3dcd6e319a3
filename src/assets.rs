use crate::mask::Mask;
use crate::sprite::Sprite;
use crate::{HEIGHT, WIDTH};
use std::path::Path;

pub const BIRD_FILES: [&str; 3] = ["player0.png", "player1.png", "player2.png"];
pub const PIPE_FILE: &str = "pipe.png";
pub const BASE_FILE: &str = "base.png";
pub const BACKGROUND_FILE: &str = "background.png";

/// Every sprite and collision mask the game draws or tests against.
pub struct Assets {
    pub bird_frames: [Sprite; 3],
    pub bird_masks: [Mask; 3],
    pub pipe_bottom: Sprite,
    pub pipe_top: Sprite,
    pub pipe_bottom_mask: Mask,
    pub pipe_top_mask: Mask,
    pub ground: Sprite,
    pub background: Sprite,
}

impl Assets {
    /// Loads the sprites from `dir`. A missing or unreadable file falls back
    /// to the built-in sprite for that role.
    pub fn load(dir: &Path) -> Self {
        let bird_frames = [0, 1, 2].map(|i| load_or(dir, BIRD_FILES[i], || builtin_bird(i)));
        let pipe = load_or(dir, PIPE_FILE, builtin_pipe);
        let ground = load_or(dir, BASE_FILE, builtin_base).scale2x();
        let background = load_or(dir, BACKGROUND_FILE, builtin_background).scale(WIDTH, HEIGHT);
        Self::assemble(bird_frames, pipe, ground, background)
    }

    pub fn builtin() -> Self {
        Self::assemble(
            [0, 1, 2].map(builtin_bird),
            builtin_pipe(),
            builtin_base().scale2x(),
            builtin_background().scale(WIDTH, HEIGHT),
        )
    }

    fn assemble(bird_frames: [Sprite; 3], pipe: Sprite, ground: Sprite, background: Sprite) -> Self {
        let bird_masks = [0, 1, 2].map(|i| Mask::from_sprite(&bird_frames[i]));
        let pipe_top = pipe.flip_vertical();
        Self {
            bird_masks,
            pipe_top_mask: Mask::from_sprite(&pipe_top),
            pipe_bottom_mask: Mask::from_sprite(&pipe),
            pipe_top,
            pipe_bottom: pipe,
            bird_frames,
            ground,
            background,
        }
    }

    pub fn pipe_width(&self) -> i32 {
        self.pipe_bottom.width() as i32
    }

    pub fn pipe_height(&self) -> i32 {
        self.pipe_bottom.height() as i32
    }
}

fn load_or(dir: &Path, name: &str, fallback: impl FnOnce() -> Sprite) -> Sprite {
    let path = dir.join(name);
    match Sprite::load(&path) {
        Ok(sprite) => {
            tracing::debug!(path = %path.display(), "loaded sprite");
            sprite
        }
        Err(err) => {
            tracing::warn!("using built-in {name}: {err:#}");
            fallback()
        }
    }
}

const CLEAR: [u8; 4] = [0, 0, 0, 0];
const OUTLINE: [u8; 4] = [83, 56, 71, 255];

/// 34x24 yellow bird; the wing sits high, level or low depending on the
/// frame.
fn builtin_bird(frame: usize) -> Sprite {
    let wing_y = [9.0, 13.0, 17.0][frame.min(2)];
    Sprite::from_fn(34, 24, |x, y| {
        let (fx, fy) = (x as f64 + 0.5, y as f64 + 0.5);
        let body = ((fx - 16.0) / 15.0).powi(2) + ((fy - 12.0) / 11.0).powi(2);
        if body > 1.0 {
            return CLEAR;
        }
        let eye = (fx - 23.0).powi(2) + (fy - 8.0).powi(2);
        let wing = ((fx - 9.0) / 6.0).powi(2) + ((fy - wing_y) / 3.5).powi(2);
        if body > 0.82 {
            OUTLINE
        } else if eye < 4.0 {
            if eye < 1.5 { [0, 0, 0, 255] } else { [255, 255, 255, 255] }
        } else if x >= 28 && (13..=16).contains(&y) {
            [250, 120, 40, 255]
        } else if wing < 1.0 {
            [250, 250, 220, 255]
        } else {
            [248, 200, 40, 255]
        }
    })
}

/// 52x320 green pipe with a lip along the top edge.
fn builtin_pipe() -> Sprite {
    Sprite::from_fn(52, 320, |x, y| {
        let lip = y < 24;
        let inset = if lip { 0 } else { 3 };
        if x < inset || x >= 52 - inset {
            return CLEAR;
        }
        if x == inset || x == 51 - inset || y == 0 || y == 23 {
            return OUTLINE;
        }
        let shade = (x as i32 - 26).unsigned_abs() as u8;
        [116u8.saturating_sub(shade), 191u8.saturating_sub(shade * 2), 46, 255]
    })
}

/// 336x112 ground strip; doubled to 672x224 by the loader.
fn builtin_base() -> Sprite {
    Sprite::from_fn(336, 112, |x, y| match y {
        0 => OUTLINE,
        1..=7 => {
            if (x + y) % 16 < 8 {
                [155, 227, 89, 255]
            } else {
                [115, 191, 46, 255]
            }
        }
        8 => [84, 128, 36, 255],
        _ => [222, 216, 149, 255],
    })
}

/// Sky gradient with a band of pale city blocks near the bottom.
fn builtin_background() -> Sprite {
    Sprite::from_fn(144, 256, |x, y| {
        let skyline = 180 + ((x / 12) * 7 % 23);
        if y >= skyline {
            [200, 230, 205, 255]
        } else {
            let t = y as f64 / 256.0;
            [
                (78.0 + 60.0 * t) as u8,
                (192.0 + 20.0 * t) as u8,
                (202.0 + 10.0 * t) as u8,
                255,
            ]
        }
    })
}
