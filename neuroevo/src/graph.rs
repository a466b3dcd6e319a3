//! Directed-graph helpers over connection keys.

use crate::genes::{ConnectionKey, NodeKey};
use std::collections::BTreeSet;

/// Whether adding `test` to `connections` would create a cycle.
pub fn creates_cycle(connections: &[ConnectionKey], test: ConnectionKey) -> bool {
    let (from, to) = test;
    if from == to {
        return true;
    }
    let mut visited = BTreeSet::from([to]);
    loop {
        let mut added = 0;
        for &(a, b) in connections {
            if visited.contains(&a) && !visited.contains(&b) {
                if b == from {
                    return true;
                }
                visited.insert(b);
                added += 1;
            }
        }
        if added == 0 {
            return false;
        }
    }
}

/// Nodes whose state can influence the outputs. Outputs are always included;
/// inputs never are.
pub fn required_for_output(
    inputs: &[NodeKey],
    outputs: &[NodeKey],
    connections: &[ConnectionKey],
) -> BTreeSet<NodeKey> {
    let mut required: BTreeSet<NodeKey> = outputs.iter().copied().collect();
    let mut seen = required.clone();
    loop {
        let frontier: BTreeSet<NodeKey> = connections
            .iter()
            .filter(|(a, b)| seen.contains(b) && !seen.contains(a))
            .map(|&(a, _)| a)
            .collect();
        if frontier.is_empty() {
            break;
        }
        let layer: BTreeSet<NodeKey> = frontier.iter().copied().filter(|n| !inputs.contains(n)).collect();
        if layer.is_empty() {
            break;
        }
        required.extend(layer);
        seen.extend(frontier);
    }
    required
}

/// Groups the required nodes into layers that can be evaluated in order:
/// every node's inputs live in earlier layers (or are network inputs).
pub fn feed_forward_layers(
    inputs: &[NodeKey],
    outputs: &[NodeKey],
    connections: &[ConnectionKey],
) -> Vec<BTreeSet<NodeKey>> {
    let required = required_for_output(inputs, outputs, connections);
    let mut layers = Vec::new();
    let mut seen: BTreeSet<NodeKey> = inputs.iter().copied().collect();
    loop {
        let candidates: BTreeSet<NodeKey> = connections
            .iter()
            .filter(|(a, b)| seen.contains(a) && !seen.contains(b))
            .map(|&(_, b)| b)
            .collect();
        let layer: BTreeSet<NodeKey> = candidates
            .into_iter()
            .filter(|n| {
                required.contains(n)
                    && connections
                        .iter()
                        .filter(|(_, b)| b == n)
                        .all(|(a, _)| seen.contains(a))
            })
            .collect();
        if layer.is_empty() {
            break;
        }
        seen.extend(layer.iter().copied());
        layers.push(layer);
    }
    layers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_cycles() {
        let conns = [(-1, 1), (1, 2), (2, 0)];
        assert!(creates_cycle(&conns, (0, 1)));
        assert!(creates_cycle(&conns, (2, 1)));
        assert!(creates_cycle(&conns, (1, 1)));
        assert!(!creates_cycle(&conns, (-1, 2)));
        assert!(!creates_cycle(&conns, (1, 0)));
    }

    #[test]
    fn dangling_hidden_nodes_are_not_required() {
        // 3 feeds nothing that reaches the output
        let conns = [(-1, 1), (1, 0), (-2, 3)];
        let required = required_for_output(&[-1, -2], &[0], &conns);
        assert_eq!(required, BTreeSet::from([0, 1]));
    }

    #[test]
    fn layers_respect_dependencies() {
        let conns = [(-1, 2), (-2, 2), (2, 3), (-1, 3), (3, 0), (2, 0)];
        let layers = feed_forward_layers(&[-1, -2], &[0], &conns);
        assert_eq!(layers, vec![BTreeSet::from([2]), BTreeSet::from([3]), BTreeSet::from([0])]);
    }

    #[test]
    fn unconnected_output_has_no_layer() {
        let layers = feed_forward_layers(&[-1], &[0], &[]);
        assert!(layers.is_empty());
    }
}
