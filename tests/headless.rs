use flappy_neat::assets::Assets;
use flappy_neat::play::{Phase, PlayGame};
use flappy_neat::train::{self, TrainOptions, Trainer};
use std::path::Path;

fn shipped_config() -> &'static Path {
    Path::new(concat!(env!("CARGO_MANIFEST_DIR"), "/config.txt"))
}

#[test]
fn headless_training_writes_a_report() {
    let assets = Assets::builtin();
    let options = TrainOptions {
        generations: 2,
        max_score: Some(2),
        seed: Some(9),
    };
    let mut trainer = Trainer::from_file(shipped_config(), options, &assets).unwrap();
    let summary = trainer.run_headless(&assets).unwrap();
    assert_eq!(summary.generations, 2);
    assert!(!summary.solved);

    let path = std::env::temp_dir().join(format!("flappy-neat-report-{}.json", std::process::id()));
    train::write_report(&path, &summary).unwrap();
    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(json["generations"], 2);
    assert_eq!(json["history"].as_array().map(Vec::len), Some(2));
}

#[test]
fn missing_config_is_an_error() {
    let assets = Assets::builtin();
    let err = Trainer::from_file(Path::new("no-such-config.txt"), TrainOptions::default(), &assets)
        .err()
        .unwrap();
    assert!(format!("{err:#}").contains("no-such-config.txt"));
}

#[test]
fn idle_player_drops_to_the_floor() {
    let assets = Assets::builtin();
    let mut game = PlayGame::new(Some(3), &assets);
    game.flap();
    for _ in 0..100 {
        game.tick(&assets);
    }
    assert_eq!(game.phase, Phase::Over);
    assert_eq!(game.score(), 0);
}
