use crate::config::{GenomeConfig, InitialConnection};
use crate::genes::{ConnectionGene, ConnectionKey, NodeGene, NodeKey};
use crate::graph::creates_cycle;
use rand::Rng;
use rand::seq::SliceRandom;
use std::collections::BTreeMap;

pub type GenomeKey = usize;
pub type Genomes = BTreeMap<GenomeKey, Genome>;

/// Hands out node keys for add-node mutations across the whole population,
/// so independent splits never share a key.
#[derive(Clone, Debug, Default)]
pub struct NodeIndexer {
    next: NodeKey,
}

impl NodeIndexer {
    pub fn next_key(&mut self, genome: &Genome) -> NodeKey {
        let key = self.next.max(genome.next_node_key());
        self.next = key + 1;
        key
    }
}

/// A network encoding: node genes for every non-input node and connection
/// genes keyed by `(from, to)`. Inputs are implicit pins with negative keys.
#[derive(Clone, Debug, PartialEq)]
pub struct Genome {
    pub key: GenomeKey,
    pub nodes: BTreeMap<NodeKey, NodeGene>,
    pub connections: BTreeMap<ConnectionKey, ConnectionGene>,
    pub fitness: Option<f64>,
}

impl Genome {
    pub fn new(key: GenomeKey) -> Self {
        Self {
            key,
            nodes: BTreeMap::new(),
            connections: BTreeMap::new(),
            fitness: None,
        }
    }

    pub fn configure_new(&mut self, config: &GenomeConfig, rng: &mut impl Rng) {
        for key in config.output_keys() {
            self.nodes.insert(key, NodeGene::new(key, config, rng));
        }
        for _ in 0..config.num_hidden {
            let key = self.next_node_key();
            self.nodes.insert(key, NodeGene::new(key, config, rng));
        }

        let wiring = match config.initial_connection {
            InitialConnection::Unconnected => Vec::new(),
            InitialConnection::FsNeatNoHidden => self.fs_neat_connections(config, false, rng),
            InitialConnection::FsNeatHidden => self.fs_neat_connections(config, true, rng),
            InitialConnection::FullNoDirect => self.full_connections(config, false),
            InitialConnection::FullDirect => self.full_connections(config, true),
            InitialConnection::PartialNoDirect(p) => self.partial_connections(config, false, p, rng),
            InitialConnection::PartialDirect(p) => self.partial_connections(config, true, p, rng),
        };
        for key in wiring {
            self.connections.insert(key, ConnectionGene::new(key, config, rng));
        }
    }

    fn fs_neat_connections(&self, config: &GenomeConfig, hidden: bool, rng: &mut impl Rng) -> Vec<ConnectionKey> {
        let inputs = config.input_keys();
        let Some(&input) = inputs.choose(rng) else {
            return Vec::new();
        };
        self.nodes
            .keys()
            .filter(|&&k| hidden || config.is_output(k))
            .map(|&k| (input, k))
            .collect()
    }

    /// Every input to every hidden node, every hidden node to every output,
    /// and input→output links when `direct` or when there are no hidden
    /// nodes. Recurrent genomes additionally get self-loops.
    fn full_connections(&self, config: &GenomeConfig, direct: bool) -> Vec<ConnectionKey> {
        let inputs = config.input_keys();
        let outputs = config.output_keys();
        let hidden: Vec<NodeKey> = self.nodes.keys().copied().filter(|&k| !config.is_output(k)).collect();
        let mut conns = Vec::new();
        for &h in &hidden {
            for &i in &inputs {
                conns.push((i, h));
            }
        }
        for &h in &hidden {
            for &o in &outputs {
                conns.push((h, o));
            }
        }
        if direct || hidden.is_empty() {
            for &i in &inputs {
                for &o in &outputs {
                    conns.push((i, o));
                }
            }
        }
        if !config.feed_forward {
            conns.extend(self.nodes.keys().map(|&k| (k, k)));
        }
        conns
    }

    fn partial_connections(
        &self,
        config: &GenomeConfig,
        direct: bool,
        fraction: f64,
        rng: &mut impl Rng,
    ) -> Vec<ConnectionKey> {
        let mut all = self.full_connections(config, direct);
        all.shuffle(rng);
        let keep = (fraction * all.len() as f64).round() as usize;
        all.truncate(keep);
        all
    }

    fn next_node_key(&self) -> NodeKey {
        self.nodes.keys().next_back().map_or(0, |&k| k.max(-1) + 1)
    }

    pub fn configure_crossover(&mut self, a: &Genome, b: &Genome, rng: &mut impl Rng) {
        let fa = a.fitness.unwrap_or(f64::NEG_INFINITY);
        let fb = b.fitness.unwrap_or(f64::NEG_INFINITY);
        let (fit, other) = if fa > fb { (a, b) } else { (b, a) };

        for (key, cg) in &fit.connections {
            let gene = match other.connections.get(key) {
                Some(og) => cg.crossover(og, rng),
                None => cg.clone(),
            };
            self.connections.insert(*key, gene);
        }
        for (key, ng) in &fit.nodes {
            let gene = match other.nodes.get(key) {
                Some(og) => ng.crossover(og, rng),
                None => ng.clone(),
            };
            self.nodes.insert(*key, gene);
        }
    }

    pub fn mutate(&mut self, config: &GenomeConfig, indexer: &mut NodeIndexer, rng: &mut impl Rng) {
        if config.single_structural_mutation {
            let total = config.node_add_prob + config.node_delete_prob + config.conn_add_prob + config.conn_delete_prob;
            let div = total.max(1.0);
            let r = rng.r#gen::<f64>();
            if r < config.node_add_prob / div {
                self.mutate_add_node(config, indexer, rng);
            } else if r < (config.node_add_prob + config.node_delete_prob) / div {
                self.mutate_delete_node(config, rng);
            } else if r < (config.node_add_prob + config.node_delete_prob + config.conn_add_prob) / div {
                self.mutate_add_connection(config, rng);
            } else if r < total / div {
                self.mutate_delete_connection(rng);
            }
        } else {
            if rng.r#gen::<f64>() < config.node_add_prob {
                self.mutate_add_node(config, indexer, rng);
            }
            if rng.r#gen::<f64>() < config.node_delete_prob {
                self.mutate_delete_node(config, rng);
            }
            if rng.r#gen::<f64>() < config.conn_add_prob {
                self.mutate_add_connection(config, rng);
            }
            if rng.r#gen::<f64>() < config.conn_delete_prob {
                self.mutate_delete_connection(rng);
            }
        }

        for cg in self.connections.values_mut() {
            cg.mutate(config, rng);
        }
        for ng in self.nodes.values_mut() {
            ng.mutate(config, rng);
        }
    }

    /// Splits a random connection `a→b` into `a→new` (weight 1) and
    /// `new→b` (the old weight), disabling the original.
    pub fn mutate_add_node(&mut self, config: &GenomeConfig, indexer: &mut NodeIndexer, rng: &mut impl Rng) {
        if self.connections.is_empty() {
            if config.structural_surer() {
                self.mutate_add_connection(config, rng);
            }
            return;
        }
        let idx = rng.gen_range(0..self.connections.len());
        let Some(split) = self.connections.values_mut().nth(idx) else {
            return;
        };
        split.enabled = false;
        let (from, to) = split.key;
        let weight = split.weight;

        let key = indexer.next_key(self);
        self.nodes.insert(key, NodeGene::new(key, config, rng));
        self.add_connection((from, key), 1.0, true);
        self.add_connection((key, to), weight, true);
    }

    fn add_connection(&mut self, key: ConnectionKey, weight: f64, enabled: bool) {
        self.connections.insert(key, ConnectionGene { key, weight, enabled });
    }

    pub fn mutate_add_connection(&mut self, config: &GenomeConfig, rng: &mut impl Rng) {
        let outputs: Vec<NodeKey> = self.nodes.keys().copied().collect();
        let Some(&to) = outputs.choose(rng) else {
            return;
        };
        let mut inputs = outputs.clone();
        inputs.extend(config.input_keys());
        let Some(&from) = inputs.choose(rng) else {
            return;
        };
        let key = (from, to);

        if let Some(existing) = self.connections.get_mut(&key) {
            if config.structural_surer() {
                existing.enabled = true;
            }
            return;
        }
        if config.is_output(from) && config.is_output(to) {
            return;
        }
        if config.feed_forward {
            let keys: Vec<ConnectionKey> = self.connections.keys().copied().collect();
            if creates_cycle(&keys, key) {
                return;
            }
        }
        self.connections.insert(key, ConnectionGene::new(key, config, rng));
    }

    pub fn mutate_delete_node(&mut self, config: &GenomeConfig, rng: &mut impl Rng) -> Option<NodeKey> {
        let hidden: Vec<NodeKey> = self.nodes.keys().copied().filter(|&k| !config.is_output(k)).collect();
        let &victim = hidden.choose(rng)?;
        self.connections.retain(|&(a, b), _| a != victim && b != victim);
        self.nodes.remove(&victim);
        Some(victim)
    }

    pub fn mutate_delete_connection(&mut self, rng: &mut impl Rng) {
        if self.connections.is_empty() {
            return;
        }
        let idx = rng.gen_range(0..self.connections.len());
        if let Some(&key) = self.connections.keys().nth(idx) {
            self.connections.remove(&key);
        }
    }

    /// NEAT compatibility distance, normalised by the larger genome.
    pub fn distance(&self, other: &Genome, config: &GenomeConfig) -> f64 {
        let mut node_distance = 0.0;
        if !self.nodes.is_empty() || !other.nodes.is_empty() {
            let mut disjoint = other.nodes.keys().filter(|k| !self.nodes.contains_key(k)).count();
            for (k, n1) in &self.nodes {
                match other.nodes.get(k) {
                    Some(n2) => node_distance += n1.distance(n2, config),
                    None => disjoint += 1,
                }
            }
            let max_nodes = self.nodes.len().max(other.nodes.len()) as f64;
            node_distance = (node_distance + config.compatibility_disjoint_coefficient * disjoint as f64) / max_nodes;
        }

        let mut connection_distance = 0.0;
        if !self.connections.is_empty() || !other.connections.is_empty() {
            let mut disjoint = other
                .connections
                .keys()
                .filter(|k| !self.connections.contains_key(k))
                .count();
            for (k, c1) in &self.connections {
                match other.connections.get(k) {
                    Some(c2) => connection_distance += c1.distance(c2, config),
                    None => disjoint += 1,
                }
            }
            let max_conns = self.connections.len().max(other.connections.len()) as f64;
            connection_distance =
                (connection_distance + config.compatibility_disjoint_coefficient * disjoint as f64) / max_conns;
        }

        node_distance + connection_distance
    }

    pub fn size(&self) -> (usize, usize) {
        (self.nodes.len(), self.connections.values().filter(|c| c.enabled).count())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::config::tests::SAMPLE;
    use crate::graph::feed_forward_layers;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    fn config() -> GenomeConfig {
        Config::parse(SAMPLE).unwrap().genome
    }

    fn fresh(key: GenomeKey, config: &GenomeConfig, rng: &mut SmallRng) -> Genome {
        let mut g = Genome::new(key);
        g.configure_new(config, rng);
        g
    }

    fn assert_acyclic(g: &Genome) {
        let keys: Vec<ConnectionKey> = g.connections.keys().copied().collect();
        for (i, &k) in keys.iter().enumerate() {
            let mut rest = keys.clone();
            rest.remove(i);
            assert!(!creates_cycle(&rest, k), "cycle through {k:?}");
        }
    }

    #[test]
    fn full_initial_connection_links_inputs_to_outputs() {
        let config = config();
        let mut rng = SmallRng::seed_from_u64(3);
        let g = fresh(1, &config, &mut rng);
        assert_eq!(g.nodes.keys().copied().collect::<Vec<_>>(), vec![0]);
        assert_eq!(g.connections.keys().copied().collect::<Vec<_>>(), vec![(-2, 0), (-1, 0)]);
        assert_eq!(g.size(), (1, 2));
    }

    #[test]
    fn hidden_nodes_get_fresh_keys() {
        let mut config = config();
        config.num_hidden = 2;
        config.num_outputs = 2;
        let mut rng = SmallRng::seed_from_u64(4);
        let g = fresh(1, &config, &mut rng);
        assert_eq!(g.nodes.keys().copied().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
        // 2 inputs x 2 hidden + 2 hidden x 2 outputs, no direct links
        assert_eq!(g.connections.len(), 8);
        assert!(!g.connections.contains_key(&(-1, 0)));
    }

    #[test]
    fn add_node_splits_a_connection() {
        let config = config();
        let mut rng = SmallRng::seed_from_u64(5);
        let mut g = fresh(1, &config, &mut rng);
        g.mutate_add_node(&config, &mut NodeIndexer::default(), &mut rng);
        assert_eq!(g.nodes.len(), 2);
        assert_eq!(g.connections.len(), 4);
        assert_eq!(g.connections.values().filter(|c| !c.enabled).count(), 1);
        assert!(g.connections.contains_key(&(1, 0)));
        assert!(g.connections[&(1, 0)].enabled);
    }

    #[test]
    fn delete_node_removes_its_connections() {
        let config = config();
        let mut rng = SmallRng::seed_from_u64(6);
        let mut g = fresh(1, &config, &mut rng);
        g.mutate_add_node(&config, &mut NodeIndexer::default(), &mut rng);
        assert_eq!(g.mutate_delete_node(&config, &mut rng), Some(1));
        assert!(g.connections.keys().all(|&(a, b)| a != 1 && b != 1));
        // outputs are never deleted
        assert_eq!(g.mutate_delete_node(&config, &mut rng), None);
        assert_eq!(g.nodes.len(), 1);
    }

    #[test]
    fn mutation_keeps_feed_forward_genomes_acyclic() {
        let config = config();
        let mut rng = SmallRng::seed_from_u64(8);
        let mut g = fresh(1, &config, &mut rng);
        let mut indexer = NodeIndexer::default();
        for _ in 0..300 {
            g.mutate(&config, &mut indexer, &mut rng);
            assert_acyclic(&g);
            assert!(g.nodes.contains_key(&0));
            assert!(g.connections.keys().all(|(_, to)| *to >= 0));
        }
        let keys: Vec<ConnectionKey> = g.connections.keys().copied().collect();
        // every required node lands in some layer
        let layers = feed_forward_layers(&config.input_keys(), &config.output_keys(), &keys);
        assert!(layers.iter().all(|l| !l.is_empty()));
    }

    #[test]
    fn crossover_follows_fitter_parent() {
        let config = config();
        let mut rng = SmallRng::seed_from_u64(9);
        let mut a = fresh(1, &config, &mut rng);
        let mut b = fresh(2, &config, &mut rng);
        a.mutate_add_node(&config, &mut NodeIndexer::default(), &mut rng);
        a.fitness = Some(10.0);
        b.fitness = Some(1.0);

        let mut child = Genome::new(3);
        child.configure_crossover(&a, &b, &mut rng);
        assert_eq!(child.nodes.keys().collect::<Vec<_>>(), a.nodes.keys().collect::<Vec<_>>());
        assert_eq!(
            child.connections.keys().collect::<Vec<_>>(),
            a.connections.keys().collect::<Vec<_>>()
        );
        assert_eq!(child.fitness, None);
    }

    #[test]
    fn distance_is_symmetric_and_zero_for_self() {
        let config = config();
        let mut rng = SmallRng::seed_from_u64(10);
        let a = fresh(1, &config, &mut rng);
        let mut b = a.clone();
        b.mutate_add_node(&config, &mut NodeIndexer::default(), &mut rng);
        assert_eq!(a.distance(&a, &config), 0.0);
        let d_ab = a.distance(&b, &config);
        let d_ba = b.distance(&a, &config);
        assert!(d_ab > 0.0);
        assert!((d_ab - d_ba).abs() < 1e-12);
    }

    #[test]
    fn separate_splits_get_separate_node_keys() {
        let config = config();
        let mut rng = SmallRng::seed_from_u64(11);
        let base = fresh(1, &config, &mut rng);
        let mut a = base.clone();
        let mut b = base.clone();
        a.connections.remove(&(-2, 0));
        b.connections.remove(&(-1, 0));

        let mut indexer = NodeIndexer::default();
        a.mutate_add_node(&config, &mut indexer, &mut rng);
        b.mutate_add_node(&config, &mut indexer, &mut rng);

        assert!(a.connections.contains_key(&(-1, 1)));
        assert!(b.connections.contains_key(&(-2, 2)));
        assert_eq!(a.nodes.keys().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(b.nodes.keys().copied().collect::<Vec<_>>(), vec![0, 2]);
        // the new hidden nodes are disjoint, not homologous
        let mut bare = a.clone();
        bare.connections.clear();
        let mut other = b.clone();
        other.connections.clear();
        assert!(bare.distance(&other, &config) > 0.0);
    }
}
