use crate::assets::Assets;
use crate::canvas::Canvas;
use crate::play::PlayGame;
use crate::scene;
use crate::train::{self, Status, Trainer};
use crate::{HEIGHT, TICKS_PER_SECOND, WIDTH};
use anyhow::{Context, Result};
use pixels::{Pixels, SurfaceTexture};
use std::path::PathBuf;
use std::time::{Duration, Instant};
use winit::dpi::LogicalSize;
use winit::event::{Event, VirtualKeyCode};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::window::{Window, WindowBuilder};
use winit_input_helper::WinitInputHelper;

const MAX_TICKS_PER_FRAME: u32 = 64;

fn tick_duration() -> Duration {
    Duration::from_secs(1) / TICKS_PER_SECOND
}

fn open_window(event_loop: &EventLoop<()>, title: &str) -> Result<(Window, Pixels)> {
    let window = WindowBuilder::new()
        .with_title(title)
        .with_inner_size(LogicalSize::new(WIDTH, HEIGHT))
        .with_resizable(false)
        .build(event_loop)
        .context("failed to create window")?;
    let pixels = {
        let size = window.inner_size();
        let surface_texture = SurfaceTexture::new(size.width, size.height, &window);
        Pixels::new(WIDTH, HEIGHT, surface_texture).context("failed to create pixel buffer")?
    };
    Ok((window, pixels))
}

fn wants_exit(input: &WinitInputHelper) -> bool {
    input.key_pressed(VirtualKeyCode::Escape) || input.close_requested() || input.destroyed()
}

pub fn run_play(assets: Assets, seed: Option<u64>) -> Result<()> {
    let event_loop = EventLoop::new();
    let mut input = WinitInputHelper::new();
    let (window, mut pixels) = open_window(&event_loop, "Flappy Bird")?;

    let mut game = PlayGame::new(seed, &assets);
    let mut last_tick = Instant::now();

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        if let Event::RedrawRequested(_) = event {
            let mut canvas = Canvas::new(pixels.frame_mut(), WIDTH, HEIGHT);
            scene::draw_play(&mut canvas, &assets, &game);
            if let Err(err) = pixels.render() {
                tracing::error!("render failed: {err}");
                *control_flow = ControlFlow::Exit;
                return;
            }
        }

        if input.update(&event) {
            if wants_exit(&input) {
                *control_flow = ControlFlow::Exit;
                return;
            }
            if input.key_pressed(VirtualKeyCode::Space)
                || input.key_pressed(VirtualKeyCode::Up)
                || input.key_pressed(VirtualKeyCode::W)
            {
                game.flap();
            }
            if input.key_pressed(VirtualKeyCode::P) {
                game.toggle_pause();
            }
            if input.key_pressed(VirtualKeyCode::R) {
                game.restart(&assets);
            }

            if last_tick.elapsed() >= tick_duration() {
                last_tick = Instant::now();
                game.tick(&assets);
                game.animate();
                window.request_redraw();
            }
        }
    });
}

pub fn run_train(assets: Assets, mut trainer: Trainer, report: Option<PathBuf>) -> Result<()> {
    let event_loop = EventLoop::new();
    let mut input = WinitInputHelper::new();
    let (window, mut pixels) = open_window(&event_loop, "Flappy Bird NEAT")?;

    let mut last_tick = Instant::now();
    let mut ticks_per_frame: u32 = 1;
    let mut paused = false;
    let mut reported = false;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Poll;

        if let Event::RedrawRequested(_) = event {
            let mut canvas = Canvas::new(pixels.frame_mut(), WIDTH, HEIGHT);
            scene::draw_round(&mut canvas, &assets, trainer.round(), trainer.generation());
            if trainer.is_finished() {
                scene::draw_finished(&mut canvas, trainer.is_solved());
            }
            if let Err(err) = pixels.render() {
                tracing::error!("render failed: {err}");
                *control_flow = ControlFlow::Exit;
                return;
            }
        }

        if input.update(&event) {
            if wants_exit(&input) {
                *control_flow = ControlFlow::Exit;
                return;
            }
            if input.key_pressed(VirtualKeyCode::P) {
                paused = !paused;
            }
            if input.key_pressed(VirtualKeyCode::NumpadAdd) || input.key_pressed(VirtualKeyCode::Equals) {
                ticks_per_frame = (ticks_per_frame * 2).min(MAX_TICKS_PER_FRAME);
                tracing::info!(ticks_per_frame, "speed");
            }
            if input.key_pressed(VirtualKeyCode::NumpadSubtract) || input.key_pressed(VirtualKeyCode::Minus) {
                ticks_per_frame = (ticks_per_frame / 2).max(1);
                tracing::info!(ticks_per_frame, "speed");
            }

            if trainer.is_finished() {
                if !reported {
                    reported = true;
                    if let Some(path) = &report {
                        if let Err(err) = train::write_report(path, &trainer.summary()) {
                            tracing::error!("{err:#}");
                        }
                    }
                    window.request_redraw();
                }
                return;
            }

            if !paused && last_tick.elapsed() >= tick_duration() {
                last_tick = Instant::now();
                for _ in 0..ticks_per_frame {
                    match trainer.tick(&assets) {
                        Ok(Status::Running) => {}
                        Ok(Status::NextGeneration | Status::Finished) => break,
                        Err(err) => {
                            tracing::error!("training stopped: {err:#}");
                            *control_flow = ControlFlow::Exit;
                            return;
                        }
                    }
                }
                trainer.round_mut().animate();
                window.request_redraw();
            }
        }
    });
}
