//! Flappy Bird, flown by hand or by a population of birds whose networks
//! evolve with NEAT.

pub mod app;
pub mod assets;
pub mod bird;
pub mod canvas;
pub mod ground;
pub mod mask;
pub mod pipe;
pub mod play;
pub mod round;
pub mod scene;
pub mod sprite;
pub mod train;
pub mod world;

pub const WIDTH: u32 = 500;
pub const HEIGHT: u32 = 600;
/// Top of the ground strip; a bird touching it is out.
pub const FLOOR_Y: i32 = 482;
pub const TICKS_PER_SECOND: u32 = 30;
