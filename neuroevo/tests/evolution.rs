use neuroevo::{Config, Evolution, FeedForwardNetwork, Population, StatisticsReporter};
use std::cell::RefCell;
use std::rc::Rc;

const INPUTS: [[f64; 2]; 4] = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];

fn config() -> Config {
    Config::from_file(concat!(env!("CARGO_MANIFEST_DIR"), "/tests/config-feedforward")).unwrap()
}

/// 4 minus the squared error against `target` over the four input pairs.
fn score(net: &mut FeedForwardNetwork, target: impl Fn([f64; 2]) -> f64) -> f64 {
    4.0 - INPUTS
        .iter()
        .map(|&x| {
            let out = net.activate(&x).unwrap()[0];
            (out - target(x)).powi(2)
        })
        .sum::<f64>()
}

#[test]
fn learns_constant_output() {
    let mut pop = Population::with_seed(config(), 42);
    let best = pop
        .run(
            |genomes, config| {
                for g in genomes.iter_mut() {
                    let mut net = FeedForwardNetwork::create(g, &config.genome);
                    g.fitness = Some(score(&mut net, |_| 1.0));
                }
            },
            Some(100),
        )
        .unwrap()
        .unwrap();
    assert!(best.fitness.unwrap() >= 3.9);
}

#[test]
fn xor_run_records_statistics() {
    let mut pop = Population::with_seed(config(), 7);
    let stats = Rc::new(RefCell::new(StatisticsReporter::new()));
    pop.add_reporter(Box::new(stats.clone()));

    let xor = |x: [f64; 2]| if (x[0] > 0.5) != (x[1] > 0.5) { 1.0 } else { 0.0 };
    let best = pop
        .run(
            |genomes, config| {
                for g in genomes.iter_mut() {
                    let mut net = FeedForwardNetwork::create(g, &config.genome);
                    g.fitness = Some(score(&mut net, xor));
                }
            },
            Some(15),
        )
        .unwrap()
        .unwrap();

    let stats = stats.borrow();
    assert!(!stats.generations.is_empty());
    assert!(stats.generations.len() <= 15);
    let history = stats.best_fitness_history();
    let peak = history.iter().copied().fold(f64::MIN, f64::max);
    assert_eq!(best.fitness, Some(peak));
    assert!(stats.generations.iter().all(|g| g.species_sizes.iter().sum::<usize>() > 0));
    for g in &stats.generations {
        assert_eq!(g.species_fitness.len(), g.species_sizes.len());
        // no species averages above the generation's best
        assert!(g.species_fitness.values().all(|&f| f <= g.best_fitness + 1e-9));
    }
    let first_species = *stats.generations[0].species_fitness.keys().next().unwrap();
    let history = stats.species_fitness(first_species);
    assert_eq!(history.len(), stats.generations.len());
    assert!(history[0].is_some());
    let json = serde_json::to_string(&stats.generations[0]).unwrap();
    assert!(json.contains("\"best_fitness\""));
    assert!(json.contains("\"species_fitness\""));
}

#[test]
fn stepwise_driving_matches_the_callback_loop() {
    let mut pop = Population::with_seed(config(), 9);
    for _ in 0..3 {
        pop.start_generation();
        let config = pop.config().clone();
        for g in pop.genomes_mut() {
            let mut net = FeedForwardNetwork::create(g, &config.genome);
            g.fitness = Some(score(&mut net, |_| 0.0) - 3.0);
        }
        match pop.evolve().unwrap() {
            Evolution::Continue => {}
            Evolution::Solved(g) => panic!("threshold is out of reach, got {:?}", g.fitness),
        }
    }
    assert_eq!(pop.generation(), 3);
}
