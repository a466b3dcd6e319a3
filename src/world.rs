use crate::assets::Assets;
use crate::bird::Bird;
use crate::ground::Ground;
use crate::pipe::Pipe;
use crate::{FLOOR_Y, WIDTH};
use rand::rngs::SmallRng;

/// Pipes, ground and score shared by every bird in a round.
pub struct World {
    pub pipes: Vec<Pipe>,
    pub ground: Ground,
    pub score: u32,
    rng: SmallRng,
}

impl World {
    pub fn new(mut rng: SmallRng, assets: &Assets) -> Self {
        let first = Pipe::new(WIDTH as i32 + 100, &mut rng, assets);
        Self {
            pipes: vec![first],
            ground: Ground::new(FLOOR_Y, assets.ground.width() as i32),
            score: 0,
            rng,
        }
    }

    /// Index of the pipe a bird at `bird_x` should steer for: the second one
    /// once the first is behind it.
    pub fn target_pipe(&self, bird_x: i32) -> usize {
        match self.pipes.as_slice() {
            [first, _, ..] if bird_x > first.x + first.width() => 1,
            _ => 0,
        }
    }

    /// Moves every pipe one tick. Birds that hit a pipe leave `birds` and are
    /// handed to `on_crash`. Returns whether a pipe was passed this tick, in
    /// which case the score went up and a new pipe entered on the right.
    pub fn advance_pipes<T: AsRef<Bird>>(
        &mut self,
        birds: &mut Vec<T>,
        assets: &Assets,
        mut on_crash: impl FnMut(T),
    ) -> bool {
        let mut passed = false;
        let mut expired = Vec::new();
        for (i, pipe) in self.pipes.iter_mut().enumerate() {
            let (hit, safe): (Vec<T>, Vec<T>) = birds
                .drain(..)
                .partition(|b| pipe.collide(b.as_ref(), assets));
            *birds = safe;
            hit.into_iter().for_each(&mut on_crash);

            if !pipe.passed && birds.iter().any(|b| pipe.x < b.as_ref().x) {
                pipe.passed = true;
                passed = true;
            }
            if pipe.is_offscreen() {
                expired.push(i);
            }
            pipe.advance();
        }

        if passed {
            self.score += 1;
            let pipe = Pipe::new(WIDTH as i32, &mut self.rng, assets);
            self.pipes.push(pipe);
        }
        let mut i = 0;
        self.pipes.retain(|_| {
            let keep = !expired.contains(&i);
            i += 1;
            keep
        });
        passed
    }

    pub fn advance_ground(&mut self) {
        self.ground.advance();
    }

    /// True once the bird touches the floor or leaves the top of the screen.
    pub fn out_of_bounds(bird: &Bird, assets: &Assets) -> bool {
        let h = bird.sprite(assets).height() as f64;
        bird.y + h >= FLOOR_Y as f64 || bird.y < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn world(assets: &Assets) -> World {
        World::new(SmallRng::seed_from_u64(11), assets)
    }

    #[test]
    fn first_pipe_starts_off_screen() {
        let assets = Assets::builtin();
        let w = world(&assets);
        assert_eq!(w.pipes.len(), 1);
        assert_eq!(w.pipes[0].x, 600);
        assert_eq!(w.score, 0);
        assert_eq!(w.ground.x2, 672);
    }

    #[test]
    fn target_switches_once_the_first_pipe_is_behind() {
        let assets = Assets::builtin();
        let mut w = world(&assets);
        assert_eq!(w.target_pipe(75), 0);
        w.pipes[0].x = 20;
        // only one pipe: stays on it
        assert_eq!(w.target_pipe(75), 0);
        w.pipes.push(Pipe::with_height(300, 100, &assets));
        assert_eq!(w.target_pipe(75), 1);
        w.pipes[0].x = 23;
        // 75 is not past 23 + 52
        assert_eq!(w.target_pipe(75), 0);
    }

    #[test]
    fn passing_a_pipe_scores_and_spawns() {
        let assets = Assets::builtin();
        let mut w = world(&assets);
        w.pipes[0] = Pipe::with_height(74, 200, &assets);
        let mut birds = vec![Bird::new(75, 250.0)];
        assert!(w.advance_pipes(&mut birds, &assets, |_| panic!("no crash expected")));
        assert_eq!(birds.len(), 1);
        assert_eq!(w.score, 1);
        assert_eq!(w.pipes.len(), 2);
        assert_eq!(w.pipes[0].x, 69);
        assert_eq!(w.pipes[1].x, WIDTH as i32);

        // already passed: no second point
        assert!(!w.advance_pipes(&mut birds, &assets, |_| {}));
        assert_eq!(w.score, 1);
    }

    #[test]
    fn crashed_birds_are_handed_back() {
        let assets = Assets::builtin();
        let mut w = world(&assets);
        w.pipes[0] = Pipe::with_height(60, 200, &assets);
        let mut birds = vec![Bird::new(75, 250.0), Bird::new(75, 190.0), Bird::new(75, 260.0)];
        let mut crashed = Vec::new();
        w.advance_pipes(&mut birds, &assets, |b| crashed.push(b.y));
        assert_eq!(crashed, vec![190.0]);
        assert_eq!(birds.iter().map(|b| b.y).collect::<Vec<_>>(), vec![250.0, 260.0]);
    }

    #[test]
    fn expired_pipes_are_dropped() {
        let assets = Assets::builtin();
        let mut w = world(&assets);
        w.pipes[0] = Pipe::with_height(-53, 200, &assets);
        w.pipes[0].passed = true;
        w.pipes.push(Pipe::with_height(250, 200, &assets));
        let mut birds: Vec<Bird> = Vec::new();
        w.advance_pipes(&mut birds, &assets, |_| {});
        assert_eq!(w.pipes.len(), 1);
        assert_eq!(w.pipes[0].x, 245);
    }

    #[test]
    fn floor_and_ceiling() {
        let assets = Assets::builtin();
        assert!(!World::out_of_bounds(&Bird::new(75, 457.9), &assets));
        assert!(World::out_of_bounds(&Bird::new(75, 458.0), &assets));
        assert!(World::out_of_bounds(&Bird::new(75, -0.5), &assets));
        assert!(!World::out_of_bounds(&Bird::new(75, 0.0), &assets));
    }
}
