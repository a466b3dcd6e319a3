use crate::assets::Assets;
use crate::mask::Mask;
use crate::sprite::Sprite;

pub const MAX_ROTATION: f64 = 25.0;
pub const ROT_VEL: f64 = 20.0;
pub const ANIMATION_TIME: u32 = 5;
pub const JUMP_VELOCITY: f64 = -10.5;
pub const TERMINAL_DISPLACEMENT: f64 = 16.0;

/// Vertical displacement `t` ticks after a jump with velocity `vel`.
/// Falls are capped at the terminal displacement; rises get an extra 2px.
pub fn displacement(vel: f64, t: u32) -> f64 {
    let t = t as f64;
    let d = (vel * t + 1.5 * t * t).min(TERMINAL_DISPLACEMENT);
    if d < 0.0 { d - 2.0 } else { d }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bird {
    pub x: i32,
    pub y: f64,
    pub tilt: f64,
    pub tick_count: u32,
    pub vel: f64,
    pub height: f64,
    pub img_count: u32,
    pub frame: usize,
}

impl Bird {
    pub fn new(x: i32, y: f64) -> Self {
        Self {
            x,
            y,
            tilt: 0.0,
            tick_count: 0,
            vel: 0.0,
            height: y,
            img_count: 0,
            frame: 0,
        }
    }

    pub fn jump(&mut self) {
        self.vel = JUMP_VELOCITY;
        self.tick_count = 0;
        self.height = self.y;
    }

    pub fn step(&mut self) {
        self.tick_count += 1;
        let d = displacement(self.vel, self.tick_count);
        self.y += d;

        if d < 0.0 || self.y < self.height + 50.0 {
            if self.tilt < MAX_ROTATION {
                self.tilt = MAX_ROTATION;
            }
        } else if self.tilt > -90.0 {
            self.tilt -= ROT_VEL;
        }
    }

    /// Advances the wing animation by one drawn frame: frames 0, 1, 2, 1
    /// for `ANIMATION_TIME` ticks each, then around again. A steep dive
    /// holds the wings level.
    pub fn animate(&mut self) {
        self.img_count += 1;
        let t = ANIMATION_TIME;
        self.frame = match self.img_count {
            c if c < t => 0,
            c if c < 2 * t => 1,
            c if c < 3 * t => 2,
            c if c < 4 * t => 1,
            _ => {
                self.img_count = 0;
                0
            }
        };
        if self.tilt <= -80.0 {
            self.frame = 1;
            self.img_count = 2 * t;
        }
    }

    pub fn mask<'a>(&self, assets: &'a Assets) -> &'a Mask {
        &assets.bird_masks[self.frame]
    }

    pub fn sprite<'a>(&self, assets: &'a Assets) -> &'a Sprite {
        &assets.bird_frames[self.frame]
    }

    /// Top-left corner at which the tilted sprite is drawn so that it stays
    /// centred on the unrotated sprite.
    pub fn draw_origin(&self, unrotated: &Sprite, rotated: &Sprite) -> (i32, i32) {
        let cx = self.x as f64 + unrotated.width() as f64 / 2.0;
        let cy = self.y + unrotated.height() as f64 / 2.0;
        (
            (cx - rotated.width() as f64 / 2.0).round() as i32,
            (cy - rotated.height() as f64 / 2.0).round() as i32,
        )
    }
}

impl AsRef<Bird> for Bird {
    fn as_ref(&self) -> &Bird {
        self
    }
}
