use crate::assets::Assets;
use crate::bird::Bird;
use crate::world::World;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

pub const SPAWN_X: i32 = 230;
pub const SPAWN_Y: f64 = 350.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Hovering at the start line until the first flap.
    Ready,
    Flying,
    Paused,
    Over,
}

/// The single-player game.
pub struct PlayGame {
    pub bird: Bird,
    pub world: World,
    pub phase: Phase,
    pub best: u32,
    rng: SmallRng,
}

impl PlayGame {
    pub fn new(seed: Option<u64>, assets: &Assets) -> Self {
        let mut rng = match seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let world = World::new(SmallRng::seed_from_u64(rng.r#gen()), assets);
        Self {
            bird: Bird::new(SPAWN_X, SPAWN_Y),
            world,
            phase: Phase::Ready,
            best: 0,
            rng,
        }
    }

    pub fn score(&self) -> u32 {
        self.world.score
    }

    pub fn flap(&mut self) {
        match self.phase {
            Phase::Ready => {
                self.phase = Phase::Flying;
                self.bird.jump();
            }
            Phase::Flying => self.bird.jump(),
            Phase::Paused | Phase::Over => {}
        }
    }

    pub fn toggle_pause(&mut self) {
        self.phase = match self.phase {
            Phase::Flying => Phase::Paused,
            Phase::Paused => Phase::Flying,
            other => other,
        };
    }

    /// New bird and pipes; the session best survives.
    pub fn restart(&mut self, assets: &Assets) {
        self.world = World::new(SmallRng::seed_from_u64(self.rng.r#gen()), assets);
        self.bird = Bird::new(SPAWN_X, SPAWN_Y);
        self.phase = Phase::Ready;
    }

    pub fn tick(&mut self, assets: &Assets) {
        match self.phase {
            Phase::Ready => self.world.advance_ground(),
            Phase::Flying => {
                self.bird.step();
                let mut flock = vec![self.bird];
                self.world.advance_pipes(&mut flock, assets, |_| {});
                if flock.is_empty() || World::out_of_bounds(&self.bird, assets) {
                    self.game_over();
                } else {
                    self.world.advance_ground();
                }
            }
            Phase::Paused | Phase::Over => {}
        }
    }

    /// Once per drawn frame.
    pub fn animate(&mut self) {
        if matches!(self.phase, Phase::Ready | Phase::Flying) {
            self.bird.animate();
        }
    }

    fn game_over(&mut self) {
        self.phase = Phase::Over;
        let score = self.world.score;
        if score > self.best {
            self.best = score;
            tracing::info!(score, "new best");
        } else {
            tracing::info!(score, best = self.best, "game over");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipe::Pipe;

    fn game(assets: &Assets) -> PlayGame {
        PlayGame::new(Some(7), assets)
    }

    #[test]
    fn waits_for_the_first_flap() {
        let assets = Assets::builtin();
        let mut g = game(&assets);
        for _ in 0..50 {
            g.tick(&assets);
        }
        assert_eq!(g.phase, Phase::Ready);
        assert_eq!(g.bird.y, SPAWN_Y);
        assert_eq!(g.world.pipes[0].x, 600);
        assert_eq!(g.world.ground.x1, -250);

        g.flap();
        g.tick(&assets);
        assert_eq!(g.phase, Phase::Flying);
        assert_eq!(g.bird.y, SPAWN_Y - 11.0);
    }

    #[test]
    fn falling_to_the_floor_ends_the_game() {
        let assets = Assets::builtin();
        let mut g = game(&assets);
        g.flap();
        let mut ticks = 0;
        while g.phase == Phase::Flying {
            g.tick(&assets);
            ticks += 1;
        }
        // up 96 over seven ticks, +12, then 16 a tick down to 458
        assert_eq!(ticks, 20);
        assert_eq!(g.phase, Phase::Over);
        g.flap();
        assert_eq!(g.phase, Phase::Over);
    }

    #[test]
    fn passing_a_pipe_scores_and_restart_keeps_best() {
        let assets = Assets::builtin();
        let mut g = game(&assets);
        g.world.pipes[0] = Pipe::with_height(229, 300, &assets);
        g.flap();
        g.tick(&assets);
        assert_eq!(g.score(), 1);
        assert_eq!(g.phase, Phase::Flying);

        while g.phase != Phase::Over {
            g.tick(&assets);
        }
        assert_eq!(g.best, 1);
        g.restart(&assets);
        assert_eq!(g.phase, Phase::Ready);
        assert_eq!(g.score(), 0);
        assert_eq!(g.best, 1);
        assert_eq!(g.bird, Bird::new(SPAWN_X, SPAWN_Y));
    }

    #[test]
    fn pause_freezes_everything() {
        let assets = Assets::builtin();
        let mut g = game(&assets);
        g.toggle_pause();
        assert_eq!(g.phase, Phase::Ready);
        g.flap();
        g.toggle_pause();
        let before = (g.bird, g.world.pipes[0].x);
        for _ in 0..10 {
            g.tick(&assets);
            g.flap();
        }
        assert_eq!((g.bird, g.world.pipes[0].x), before);
        g.toggle_pause();
        assert_eq!(g.phase, Phase::Flying);
    }

    #[test]
    fn hitting_a_pipe_ends_the_game() {
        let assets = Assets::builtin();
        let mut g = game(&assets);
        g.world.pipes[0] = Pipe::with_height(220, 100, &assets);
        g.flap();
        g.tick(&assets);
        assert_eq!(g.phase, Phase::Over);
        assert_eq!(g.best, 0);
    }
}
