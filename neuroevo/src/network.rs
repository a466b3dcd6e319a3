use crate::activation::{Activation, Aggregation};
use crate::config::GenomeConfig;
use crate::error::NeatError;
use crate::genes::NodeKey;
use crate::genome::Genome;
use crate::graph::feed_forward_layers;
use std::collections::HashMap;

#[derive(Clone, Debug)]
struct NodeEval {
    node: NodeKey,
    activation: Activation,
    aggregation: Aggregation,
    bias: f64,
    response: f64,
    links: Vec<(NodeKey, f64)>,
}

/// The phenotype of a feed-forward genome. Nodes are evaluated layer by
/// layer; only nodes that can reach an output are kept.
#[derive(Clone, Debug)]
pub struct FeedForwardNetwork {
    inputs: Vec<NodeKey>,
    outputs: Vec<NodeKey>,
    evals: Vec<NodeEval>,
    values: HashMap<NodeKey, f64>,
    scratch: Vec<f64>,
}

impl FeedForwardNetwork {
    pub fn create(genome: &Genome, config: &GenomeConfig) -> Self {
        let inputs = config.input_keys();
        let outputs = config.output_keys();
        let enabled: Vec<_> = genome
            .connections
            .values()
            .filter(|c| c.enabled)
            .map(|c| c.key)
            .collect();

        let mut evals = Vec::new();
        for layer in feed_forward_layers(&inputs, &outputs, &enabled) {
            for node in layer {
                let Some(gene) = genome.nodes.get(&node) else {
                    continue;
                };
                let links = genome
                    .connections
                    .values()
                    .filter(|c| c.enabled && c.key.1 == node)
                    .map(|c| (c.key.0, c.weight))
                    .collect();
                evals.push(NodeEval {
                    node,
                    activation: gene.activation,
                    aggregation: gene.aggregation,
                    bias: gene.bias,
                    response: gene.response,
                    links,
                });
            }
        }

        let values = inputs
            .iter()
            .chain(outputs.iter())
            .map(|&k| (k, 0.0))
            .collect();
        Self {
            inputs,
            outputs,
            evals,
            values,
            scratch: Vec::new(),
        }
    }

    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Runs one forward pass. Outputs with no path from the inputs read 0.
    pub fn activate(&mut self, inputs: &[f64]) -> Result<Vec<f64>, NeatError> {
        if inputs.len() != self.inputs.len() {
            return Err(NeatError::InputMismatch {
                expected: self.inputs.len(),
                actual: inputs.len(),
            });
        }
        for (&k, &v) in self.inputs.iter().zip(inputs) {
            self.values.insert(k, v);
        }

        for eval in &self.evals {
            self.scratch.clear();
            for &(from, weight) in &eval.links {
                let v = self.values.get(&from).copied().unwrap_or(0.0);
                self.scratch.push(v * weight);
            }
            let s = eval.aggregation.apply(&self.scratch);
            let out = eval.activation.apply(eval.bias + eval.response * s);
            self.values.insert(eval.node, out);
        }

        Ok(self
            .outputs
            .iter()
            .map(|k| self.values.get(k).copied().unwrap_or(0.0))
            .collect())
    }
}
