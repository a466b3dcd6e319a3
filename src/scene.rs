use crate::assets::Assets;
use crate::bird::Bird;
use crate::canvas::{Canvas, Rgba, text_width};
use crate::play::{Phase, PlayGame};
use crate::round::{Brain, Round};
use crate::world::World;
use crate::WIDTH;

const HUD_SCALE: u32 = 3;
const WHITE: Rgba = [255, 255, 255, 255];
const MARGIN: i32 = 10;

/// Background, pipes and ground.
pub fn draw_world(canvas: &mut Canvas, assets: &Assets, world: &World) {
    canvas.blit(&assets.background, 0, 0);
    for pipe in &world.pipes {
        canvas.blit(&assets.pipe_top, pipe.x, pipe.top);
        canvas.blit(&assets.pipe_bottom, pipe.x, pipe.bottom);
    }
    let ground = &world.ground;
    canvas.blit(&assets.ground, ground.x1, ground.y);
    canvas.blit(&assets.ground, ground.x2, ground.y);
}

pub fn draw_bird(canvas: &mut Canvas, assets: &Assets, bird: &Bird) {
    let sprite = bird.sprite(assets);
    let rotated = sprite.rotate(bird.tilt);
    let (x, y) = bird.draw_origin(sprite, &rotated);
    canvas.blit(&rotated, x, y);
}

fn draw_score(canvas: &mut Canvas, score: u32) {
    let text = format!("Score: {score}");
    let x = WIDTH as i32 - MARGIN - text_width(&text, HUD_SCALE);
    canvas.draw_text_shadowed(&text, x, MARGIN, HUD_SCALE, WHITE);
}

fn draw_centered(canvas: &mut Canvas, text: &str, y: i32, scale: u32, color: Rgba) {
    let x = (WIDTH as i32 - text_width(text, scale)) / 2;
    canvas.draw_text_shadowed(text, x, y, scale, color);
}

pub fn draw_round<B: Brain>(canvas: &mut Canvas, assets: &Assets, round: &Round<B>, generation: usize) {
    draw_world(canvas, assets, &round.world);
    for agent in round.agents() {
        draw_bird(canvas, assets, &agent.bird);
    }
    draw_score(canvas, round.score());
    canvas.draw_text_shadowed(&format!("Gen: {generation}"), MARGIN, MARGIN, HUD_SCALE, WHITE);
    canvas.draw_text_shadowed(&format!("Alive: {}", round.alive()), MARGIN, 40, HUD_SCALE, WHITE);
}

pub fn draw_play(canvas: &mut Canvas, assets: &Assets, game: &PlayGame) {
    draw_world(canvas, assets, &game.world);
    draw_bird(canvas, assets, &game.bird);
    draw_score(canvas, game.score());
    canvas.draw_text_shadowed(&format!("Best: {}", game.best), MARGIN, MARGIN, HUD_SCALE, WHITE);

    match game.phase {
        Phase::Ready => draw_centered(canvas, "Press space", 200, HUD_SCALE, WHITE),
        Phase::Flying => {}
        Phase::Paused => draw_centered(canvas, "Paused", 200, 4, [255, 255, 120, 255]),
        Phase::Over => {
            draw_centered(canvas, "Game over", 180, 5, [255, 110, 90, 255]);
            draw_centered(canvas, "Press R to restart", 240, 2, WHITE);
        }
    }
}

/// Shown once training stops while the window is still open.
pub fn draw_finished(canvas: &mut Canvas, solved: bool) {
    let label = if solved { "Solved!" } else { "Training done" };
    draw_centered(canvas, label, 260, 4, [255, 230, 120, 255]);
    draw_centered(canvas, "Esc to quit", 310, 2, WHITE);
}
