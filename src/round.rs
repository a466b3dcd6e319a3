use crate::assets::Assets;
use crate::bird::Bird;
use crate::pipe::GAP;
use crate::world::World;
use neuroevo::{FeedForwardNetwork, GenomeKey};

pub const SPAWN_X: i32 = 75;
pub const SPAWN_Y: f64 = 270.0;

pub const SURVIVAL_REWARD: f64 = 0.1;
pub const PIPE_REWARD: f64 = 5.0;
pub const CRASH_PENALTY: f64 = 1.0;

/// Decides whether a bird flaps, given its height and its distances to the
/// upper and lower edges of the gap ahead.
pub trait Brain {
    fn decide(&mut self, inputs: &[f64; 3]) -> bool;
}

impl Brain for FeedForwardNetwork {
    fn decide(&mut self, inputs: &[f64; 3]) -> bool {
        self.activate(inputs)
            .is_ok_and(|out| out.first().is_some_and(|&o| o > 0.5))
    }
}

pub struct Agent<B> {
    pub bird: Bird,
    pub brain: B,
    pub genome: GenomeKey,
    pub fitness: f64,
}

impl<B> AsRef<Bird> for Agent<B> {
    fn as_ref(&self) -> &Bird {
        &self.bird
    }
}

/// One generation flying the same pipes. Agents leave the list when they
/// crash; their fitness is kept until the round is collected.
pub struct Round<B = FeedForwardNetwork> {
    pub world: World,
    agents: Vec<Agent<B>>,
    retired: Vec<(GenomeKey, f64)>,
    max_score: Option<u32>,
    ticks: u64,
}

impl<B: Brain> Round<B> {
    pub fn new(brains: impl IntoIterator<Item = (GenomeKey, B)>, world: World, max_score: Option<u32>) -> Self {
        let agents = brains
            .into_iter()
            .map(|(genome, brain)| Agent {
                bird: Bird::new(SPAWN_X, SPAWN_Y),
                brain,
                genome,
                fitness: 0.0,
            })
            .collect();
        Self {
            world,
            agents,
            retired: Vec::new(),
            max_score,
            ticks: 0,
        }
    }

    pub fn agents(&self) -> &[Agent<B>] {
        &self.agents
    }

    pub fn alive(&self) -> usize {
        self.agents.len()
    }

    pub fn score(&self) -> u32 {
        self.world.score
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn is_over(&self) -> bool {
        self.agents.is_empty() || self.max_score.is_some_and(|cap| self.world.score >= cap)
    }

    pub fn step(&mut self, assets: &Assets) -> bool {
        if self.is_over() {
            return false;
        }

        let target = self.world.target_pipe(self.agents[0].bird.x);
        let (gap_top, gap_bottom) = self
            .world
            .pipes
            .get(target)
            .map_or((0.0, GAP as f64), |p| (p.height as f64, p.bottom as f64));
        for agent in &mut self.agents {
            agent.bird.step();
            agent.fitness += SURVIVAL_REWARD;
            let y = agent.bird.y;
            if agent.brain.decide(&[y, (y - gap_top).abs(), (y - gap_bottom).abs()]) {
                agent.bird.jump();
            }
        }

        let retired = &mut self.retired;
        let passed = self.world.advance_pipes(&mut self.agents, assets, |a| {
            retired.push((a.genome, a.fitness - CRASH_PENALTY));
        });
        if passed {
            for agent in &mut self.agents {
                agent.fitness += PIPE_REWARD;
            }
        }

        let (gone, alive): (Vec<_>, Vec<_>) = self
            .agents
            .drain(..)
            .partition(|a| World::out_of_bounds(&a.bird, assets));
        self.agents = alive;
        self.retired.extend(gone.into_iter().map(|a| (a.genome, a.fitness)));

        self.world.advance_ground();
        self.ticks += 1;
        !self.is_over()
    }

    pub fn animate(&mut self) {
        for agent in &mut self.agents {
            agent.bird.animate();
        }
    }

    pub fn take_fitness(&mut self) -> Vec<(GenomeKey, f64)> {
        let mut all = std::mem::take(&mut self.retired);
        all.extend(self.agents.drain(..).map(|a| (a.genome, a.fitness)));
        all
    }
}
