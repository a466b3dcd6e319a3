use std::fmt;
use std::str::FromStr;

/// Node activation functions, scaled the same way neat-python scales them so
/// that configs tuned for it behave the same here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Activation {
    Sigmoid,
    Tanh,
    Sin,
    Gauss,
    Relu,
    Elu,
    Softplus,
    Identity,
    Clamped,
    Inv,
    Log,
    Exp,
    Abs,
    Hat,
    Square,
    Cube,
}

impl Activation {
    pub const ALL: [Activation; 16] = [
        Activation::Sigmoid,
        Activation::Tanh,
        Activation::Sin,
        Activation::Gauss,
        Activation::Relu,
        Activation::Elu,
        Activation::Softplus,
        Activation::Identity,
        Activation::Clamped,
        Activation::Inv,
        Activation::Log,
        Activation::Exp,
        Activation::Abs,
        Activation::Hat,
        Activation::Square,
        Activation::Cube,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Activation::Sigmoid => "sigmoid",
            Activation::Tanh => "tanh",
            Activation::Sin => "sin",
            Activation::Gauss => "gauss",
            Activation::Relu => "relu",
            Activation::Elu => "elu",
            Activation::Softplus => "softplus",
            Activation::Identity => "identity",
            Activation::Clamped => "clamped",
            Activation::Inv => "inv",
            Activation::Log => "log",
            Activation::Exp => "exp",
            Activation::Abs => "abs",
            Activation::Hat => "hat",
            Activation::Square => "square",
            Activation::Cube => "cube",
        }
    }

    pub fn apply(self, z: f64) -> f64 {
        match self {
            Activation::Sigmoid => {
                let z = (5.0 * z).clamp(-60.0, 60.0);
                1.0 / (1.0 + (-z).exp())
            }
            Activation::Tanh => (2.5 * z).clamp(-60.0, 60.0).tanh(),
            Activation::Sin => (5.0 * z).clamp(-60.0, 60.0).sin(),
            Activation::Gauss => {
                let z = z.clamp(-3.4, 3.4);
                (-5.0 * z * z).exp()
            }
            Activation::Relu => z.max(0.0),
            Activation::Elu => {
                if z > 0.0 {
                    z
                } else {
                    z.exp() - 1.0
                }
            }
            Activation::Softplus => {
                let z = (5.0 * z).clamp(-60.0, 60.0);
                0.2 * (1.0 + z.exp()).ln()
            }
            Activation::Identity => z,
            Activation::Clamped => z.clamp(-1.0, 1.0),
            Activation::Inv => {
                if z == 0.0 {
                    0.0
                } else {
                    1.0 / z
                }
            }
            Activation::Log => z.max(1e-7).ln(),
            Activation::Exp => z.clamp(-60.0, 60.0).exp(),
            Activation::Abs => z.abs(),
            Activation::Hat => (1.0 - z.abs()).max(0.0),
            Activation::Square => z * z,
            Activation::Cube => z * z * z,
        }
    }
}

impl FromStr for Activation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Activation::ALL
            .iter()
            .copied()
            .find(|a| a.name() == s)
            .ok_or_else(|| format!("unknown activation function `{s}`"))
    }
}

impl fmt::Display for Activation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a node combines its weighted inputs before activation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Aggregation {
    Sum,
    Product,
    Max,
    Min,
    MaxAbs,
    Median,
    Mean,
}

impl Aggregation {
    pub const ALL: [Aggregation; 7] = [
        Aggregation::Sum,
        Aggregation::Product,
        Aggregation::Max,
        Aggregation::Min,
        Aggregation::MaxAbs,
        Aggregation::Median,
        Aggregation::Mean,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Aggregation::Sum => "sum",
            Aggregation::Product => "product",
            Aggregation::Max => "max",
            Aggregation::Min => "min",
            Aggregation::MaxAbs => "maxabs",
            Aggregation::Median => "median",
            Aggregation::Mean => "mean",
        }
    }

    /// Empty input yields the identity of the operation (0 for everything but
    /// `product`), so unconnected nodes still produce `activation(bias)`.
    pub fn apply(self, values: &[f64]) -> f64 {
        if values.is_empty() {
            return match self {
                Aggregation::Product => 1.0,
                _ => 0.0,
            };
        }
        match self {
            Aggregation::Sum => values.iter().sum(),
            Aggregation::Product => values.iter().product(),
            Aggregation::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Aggregation::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Aggregation::MaxAbs => values
                .iter()
                .copied()
                .fold(0.0, |best: f64, v| if v.abs() > best.abs() { v } else { best }),
            Aggregation::Median => crate::stats::median(values),
            Aggregation::Mean => crate::stats::mean(values),
        }
    }
}

impl FromStr for Aggregation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Aggregation::ALL
            .iter()
            .copied()
            .find(|a| a.name() == s)
            .ok_or_else(|| format!("unknown aggregation function `{s}`"))
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
