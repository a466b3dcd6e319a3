use crate::activation::{Activation, Aggregation};
use crate::config::{BoolAttributeConfig, ChoiceAttributeConfig, FloatAttributeConfig, GenomeConfig, InitType};
use rand::Rng;

pub type NodeKey = i64;
pub type ConnectionKey = (NodeKey, NodeKey);

// Box-Muller
pub(crate) fn gauss(rng: &mut impl Rng, mean: f64, stdev: f64) -> f64 {
    let u1: f64 = 1.0 - rng.r#gen::<f64>();
    let u2: f64 = rng.r#gen::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
    mean + stdev * z
}

impl FloatAttributeConfig {
    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min_value, self.max_value)
    }

    pub fn init_value(&self, rng: &mut impl Rng) -> f64 {
        match self.init_type {
            InitType::Gaussian => self.clamp(gauss(rng, self.init_mean, self.init_stdev)),
            InitType::Uniform => {
                let lo = self.min_value.max(self.init_mean - 2.0 * self.init_stdev);
                let hi = self.max_value.min(self.init_mean + 2.0 * self.init_stdev);
                if hi > lo { rng.gen_range(lo..hi) } else { lo }
            }
        }
    }

    pub fn mutate_value(&self, value: f64, rng: &mut impl Rng) -> f64 {
        let r: f64 = rng.r#gen();
        if r < self.mutate_rate {
            self.clamp(value + gauss(rng, 0.0, self.mutate_power))
        } else if r < self.mutate_rate + self.replace_rate {
            self.init_value(rng)
        } else {
            value
        }
    }
}

impl<T: Copy> ChoiceAttributeConfig<T> {
    fn random_option(&self, rng: &mut impl Rng) -> T {
        self.options[rng.gen_range(0..self.options.len())]
    }

    pub fn init_value(&self, rng: &mut impl Rng) -> T {
        match self.default {
            Some(v) => v,
            None => self.random_option(rng),
        }
    }

    pub fn mutate_value(&self, value: T, rng: &mut impl Rng) -> T {
        if self.mutate_rate > 0.0 && rng.r#gen::<f64>() < self.mutate_rate {
            self.random_option(rng)
        } else {
            value
        }
    }
}

impl BoolAttributeConfig {
    pub fn init_value(&self, rng: &mut impl Rng) -> bool {
        self.default.unwrap_or_else(|| rng.gen_bool(0.5))
    }

    pub fn mutate_value(&self, value: bool, rng: &mut impl Rng) -> bool {
        let rate = self.mutate_rate + if value { self.rate_to_false_add } else { self.rate_to_true_add };
        if rate > 0.0 && rng.r#gen::<f64>() < rate {
            rng.gen_bool(0.5)
        } else {
            value
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NodeGene {
    pub key: NodeKey,
    pub bias: f64,
    pub response: f64,
    pub activation: Activation,
    pub aggregation: Aggregation,
}

impl NodeGene {
    pub fn new(key: NodeKey, config: &GenomeConfig, rng: &mut impl Rng) -> Self {
        Self {
            key,
            bias: config.bias.init_value(rng),
            response: config.response.init_value(rng),
            activation: config.activation.init_value(rng),
            aggregation: config.aggregation.init_value(rng),
        }
    }

    pub fn mutate(&mut self, config: &GenomeConfig, rng: &mut impl Rng) {
        self.bias = config.bias.mutate_value(self.bias, rng);
        self.response = config.response.mutate_value(self.response, rng);
        self.activation = config.activation.mutate_value(self.activation, rng);
        self.aggregation = config.aggregation.mutate_value(self.aggregation, rng);
    }

    pub fn distance(&self, other: &NodeGene, config: &GenomeConfig) -> f64 {
        let mut d = (self.bias - other.bias).abs() + (self.response - other.response).abs();
        if self.activation != other.activation {
            d += 1.0;
        }
        if self.aggregation != other.aggregation {
            d += 1.0;
        }
        d * config.compatibility_weight_coefficient
    }

    /// Homologous genes: each attribute comes from either parent with equal
    /// probability. The key is kept from `self`.
    pub fn crossover(&self, other: &NodeGene, rng: &mut impl Rng) -> NodeGene {
        NodeGene {
            key: self.key,
            bias: if rng.gen_bool(0.5) { self.bias } else { other.bias },
            response: if rng.gen_bool(0.5) { self.response } else { other.response },
            activation: if rng.gen_bool(0.5) { self.activation } else { other.activation },
            aggregation: if rng.gen_bool(0.5) { self.aggregation } else { other.aggregation },
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionGene {
    pub key: ConnectionKey,
    pub weight: f64,
    pub enabled: bool,
}

impl ConnectionGene {
    pub fn new(key: ConnectionKey, config: &GenomeConfig, rng: &mut impl Rng) -> Self {
        Self {
            key,
            weight: config.weight.init_value(rng),
            enabled: config.enabled.init_value(rng),
        }
    }

    pub fn mutate(&mut self, config: &GenomeConfig, rng: &mut impl Rng) {
        self.weight = config.weight.mutate_value(self.weight, rng);
        self.enabled = config.enabled.mutate_value(self.enabled, rng);
    }

    pub fn distance(&self, other: &ConnectionGene, config: &GenomeConfig) -> f64 {
        let mut d = (self.weight - other.weight).abs();
        if self.enabled != other.enabled {
            d += 1.0;
        }
        d * config.compatibility_weight_coefficient
    }

    /// A gene disabled in either parent stays disabled three times out of
    /// four.
    pub fn crossover(&self, other: &ConnectionGene, rng: &mut impl Rng) -> ConnectionGene {
        let mut enabled = if rng.gen_bool(0.5) { self.enabled } else { other.enabled };
        if !self.enabled || !other.enabled {
            enabled = rng.r#gen::<f64>() > 0.75;
        }
        ConnectionGene {
            key: self.key,
            weight: if rng.gen_bool(0.5) { self.weight } else { other.weight },
            enabled,
        }
    }
}
