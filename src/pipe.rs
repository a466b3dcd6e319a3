use crate::assets::Assets;
use crate::bird::Bird;
use rand::Rng;

pub const GAP: i32 = 135;
pub const VEL: i32 = 5;
/// Range of the gap's upper edge.
pub const HEIGHT_RANGE: std::ops::Range<i32> = 50..300;

#[derive(Clone, Debug, PartialEq)]
pub struct Pipe {
    pub x: i32,
    /// Upper edge of the gap.
    pub height: i32,
    /// y of the top pipe sprite (negative: it hangs off-screen).
    pub top: i32,
    /// y of the bottom pipe sprite, the lower edge of the gap.
    pub bottom: i32,
    pub passed: bool,
    width: i32,
}

impl Pipe {
    pub fn new(x: i32, rng: &mut impl Rng, assets: &Assets) -> Self {
        Self::with_height(x, rng.gen_range(HEIGHT_RANGE), assets)
    }

    pub fn with_height(x: i32, height: i32, assets: &Assets) -> Self {
        Self {
            x,
            height,
            top: height - assets.pipe_height(),
            bottom: height + GAP,
            passed: false,
            width: assets.pipe_width(),
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn advance(&mut self) {
        self.x -= VEL;
    }

    pub fn is_offscreen(&self) -> bool {
        self.x + self.width < 0
    }

    /// Pixel-perfect test of the bird's current frame against both pipe
    /// sprites.
    pub fn collide(&self, bird: &Bird, assets: &Assets) -> bool {
        let mask = bird.mask(assets);
        let bird_y = bird.y.round() as i32;
        let top_offset = (self.x - bird.x, self.top - bird_y);
        let bottom_offset = (self.x - bird.x, self.bottom - bird_y);
        mask.overlap(&assets.pipe_bottom_mask, bottom_offset).is_some()
            || mask.overlap(&assets.pipe_top_mask, top_offset).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn heights_stay_in_range() {
        let assets = Assets::builtin();
        let mut rng = SmallRng::seed_from_u64(5);
        for _ in 0..1000 {
            let p = Pipe::new(500, &mut rng, &assets);
            assert!(HEIGHT_RANGE.contains(&p.height));
            assert_eq!(p.top, p.height - 320);
            assert_eq!(p.bottom, p.height + GAP);
            assert!(!p.passed);
        }
    }

    #[test]
    fn bird_in_the_gap_is_safe() {
        let assets = Assets::builtin();
        let pipe = Pipe::with_height(60, 200, &assets);
        // bird spans y 250..274, well inside 200..335
        let bird = Bird::new(75, 250.0);
        assert!(!pipe.collide(&bird, &assets));
    }

    #[test]
    fn bird_hits_either_pipe() {
        let assets = Assets::builtin();
        let pipe = Pipe::with_height(60, 200, &assets);
        assert!(pipe.collide(&Bird::new(75, 190.0), &assets));
        assert!(pipe.collide(&Bird::new(75, 330.0), &assets));
        // fractional y rounds before the test
        assert!(!pipe.collide(&Bird::new(75, 300.4), &assets));
    }

    #[test]
    fn bird_clear_of_the_pipe_column_is_safe() {
        let assets = Assets::builtin();
        let pipe = Pipe::with_height(200, 200, &assets);
        assert!(!pipe.collide(&Bird::new(75, 10.0), &assets));
        let mut pipe = pipe;
        pipe.x = -50;
        assert!(!pipe.is_offscreen());
        pipe.advance();
        assert!(pipe.is_offscreen());
    }
}
