//! neat-python style configuration.
//!
//! The file is INI-like: `[Section]` headers followed by `key = value` (or
//! `key: value`) lines. Lines starting with `#` or `;` are comments. Every
//! section maps onto one typed struct below; parsing fails with a
//! [`ConfigError`] naming the section and key at fault.

use crate::activation::{Activation, Aggregation};
use crate::error::ConfigError;
use crate::genes::NodeKey;
use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

const NEAT: &str = "NEAT";
const GENOME: &str = "DefaultGenome";
const SPECIES: &str = "DefaultSpeciesSet";
const STAGNATION: &str = "DefaultStagnation";
const REPRODUCTION: &str = "DefaultReproduction";

/// Reduces a set of fitness values to one number.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FitnessCriterion {
    Max,
    Min,
    Mean,
    Median,
}

impl FitnessCriterion {
    pub fn apply(self, values: &[f64]) -> f64 {
        match self {
            FitnessCriterion::Max => crate::stats::max(values),
            FitnessCriterion::Min => crate::stats::min(values),
            FitnessCriterion::Mean => crate::stats::mean(values),
            FitnessCriterion::Median => crate::stats::median(values),
        }
    }
}

impl FromStr for FitnessCriterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "max" => Ok(FitnessCriterion::Max),
            "min" => Ok(FitnessCriterion::Min),
            "mean" => Ok(FitnessCriterion::Mean),
            "median" => Ok(FitnessCriterion::Median),
            other => Err(format!("expected max, min, mean or median, got `{other}`")),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitType {
    Gaussian,
    Uniform,
}

#[derive(Clone, Debug, PartialEq)]
pub struct FloatAttributeConfig {
    pub init_mean: f64,
    pub init_stdev: f64,
    pub init_type: InitType,
    pub max_value: f64,
    pub min_value: f64,
    pub mutate_power: f64,
    pub mutate_rate: f64,
    pub replace_rate: f64,
}

/// An attribute picked from a fixed set of options (`activation_*`,
/// `aggregation_*`). `default == None` means "pick at random".
#[derive(Clone, Debug, PartialEq)]
pub struct ChoiceAttributeConfig<T> {
    pub default: Option<T>,
    pub options: Vec<T>,
    pub mutate_rate: f64,
}

/// The `enabled_*` attribute of connection genes. `default == None` means
/// "pick at random".
#[derive(Clone, Debug, PartialEq)]
pub struct BoolAttributeConfig {
    pub default: Option<bool>,
    pub mutate_rate: f64,
    pub rate_to_true_add: f64,
    pub rate_to_false_add: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InitialConnection {
    Unconnected,
    FsNeatNoHidden,
    FsNeatHidden,
    FullNoDirect,
    FullDirect,
    PartialNoDirect(f64),
    PartialDirect(f64),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StructuralMutationSurer {
    Default,
    Always,
    Never,
}

#[derive(Clone, Debug, PartialEq)]
pub struct NeatSection {
    pub fitness_criterion: FitnessCriterion,
    pub fitness_threshold: f64,
    pub no_fitness_termination: bool,
    pub pop_size: usize,
    pub reset_on_extinction: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GenomeConfig {
    pub num_inputs: usize,
    pub num_outputs: usize,
    pub num_hidden: usize,
    pub feed_forward: bool,
    pub compatibility_disjoint_coefficient: f64,
    pub compatibility_weight_coefficient: f64,
    pub conn_add_prob: f64,
    pub conn_delete_prob: f64,
    pub node_add_prob: f64,
    pub node_delete_prob: f64,
    pub single_structural_mutation: bool,
    pub structural_mutation_surer: StructuralMutationSurer,
    pub initial_connection: InitialConnection,
    pub bias: FloatAttributeConfig,
    pub response: FloatAttributeConfig,
    pub weight: FloatAttributeConfig,
    pub activation: ChoiceAttributeConfig<Activation>,
    pub aggregation: ChoiceAttributeConfig<Aggregation>,
    pub enabled: BoolAttributeConfig,
}

impl GenomeConfig {
    /// Input pins are numbered `-1, -2, ..., -num_inputs`.
    pub fn input_keys(&self) -> Vec<NodeKey> {
        (1..=self.num_inputs as NodeKey).map(|k| -k).collect()
    }

    /// Output nodes are numbered `0..num_outputs`.
    pub fn output_keys(&self) -> Vec<NodeKey> {
        (0..self.num_outputs as NodeKey).collect()
    }

    pub fn is_output(&self, key: NodeKey) -> bool {
        key >= 0 && (key as usize) < self.num_outputs
    }

    pub fn structural_surer(&self) -> bool {
        match self.structural_mutation_surer {
            StructuralMutationSurer::Always => true,
            StructuralMutationSurer::Never => false,
            StructuralMutationSurer::Default => self.single_structural_mutation,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SpeciesConfig {
    pub compatibility_threshold: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StagnationConfig {
    pub species_fitness_func: FitnessCriterion,
    pub max_stagnation: usize,
    pub species_elitism: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReproductionConfig {
    pub elitism: usize,
    pub survival_threshold: f64,
    pub min_species_size: usize,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub neat: NeatSection,
    pub genome: GenomeConfig,
    pub species: SpeciesConfig,
    pub stagnation: StagnationConfig,
    pub reproduction: ReproductionConfig,
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut ini = Ini::parse(text)?;

        let mut s = ini.section(NEAT)?;
        let neat = NeatSection {
            fitness_criterion: s.parse("fitness_criterion")?,
            fitness_threshold: s.parse("fitness_threshold")?,
            no_fitness_termination: s.parse_bool_or("no_fitness_termination", false)?,
            pop_size: s.parse("pop_size")?,
            reset_on_extinction: s.parse_bool("reset_on_extinction")?,
        };
        s.finish();
        if neat.pop_size == 0 {
            return Err(ConfigError::InvalidValue {
                section: NEAT,
                key: "pop_size".into(),
                value: "0".into(),
                reason: "population must not be empty".into(),
            });
        }

        let mut s = ini.section(GENOME)?;
        let genome = parse_genome(&mut s)?;
        s.finish();

        let mut s = ini.section(SPECIES)?;
        let species = SpeciesConfig {
            compatibility_threshold: s.parse("compatibility_threshold")?,
        };
        s.finish();

        let mut s = ini.section(STAGNATION)?;
        let stagnation = StagnationConfig {
            species_fitness_func: s.parse_or("species_fitness_func", FitnessCriterion::Mean)?,
            max_stagnation: s.parse_or("max_stagnation", 15)?,
            species_elitism: s.parse_or("species_elitism", 0)?,
        };
        s.finish();

        let mut s = ini.section(REPRODUCTION)?;
        let reproduction = ReproductionConfig {
            elitism: s.parse_or("elitism", 0)?,
            survival_threshold: s.parse_or("survival_threshold", 0.2)?,
            min_species_size: s.parse_or("min_species_size", 1)?,
        };
        s.finish();

        Ok(Config {
            neat,
            genome,
            species,
            stagnation,
            reproduction,
        })
    }
}

fn parse_genome(s: &mut SectionReader<'_>) -> Result<GenomeConfig, ConfigError> {
    let num_hidden: usize = s.parse("num_hidden")?;
    let initial_connection = parse_initial_connection(s, num_hidden)?;
    let structural_mutation_surer = match s.raw_or("structural_mutation_surer", "default").as_str() {
        "default" => StructuralMutationSurer::Default,
        v if parse_bool_text(v) == Some(true) => StructuralMutationSurer::Always,
        v if parse_bool_text(v) == Some(false) => StructuralMutationSurer::Never,
        v => return Err(s.invalid("structural_mutation_surer", v, "expected true, false or default")),
    };

    Ok(GenomeConfig {
        num_inputs: s.parse("num_inputs")?,
        num_outputs: s.parse("num_outputs")?,
        num_hidden,
        feed_forward: s.parse_bool("feed_forward")?,
        compatibility_disjoint_coefficient: s.parse("compatibility_disjoint_coefficient")?,
        compatibility_weight_coefficient: s.parse("compatibility_weight_coefficient")?,
        conn_add_prob: s.parse("conn_add_prob")?,
        conn_delete_prob: s.parse("conn_delete_prob")?,
        node_add_prob: s.parse("node_add_prob")?,
        node_delete_prob: s.parse("node_delete_prob")?,
        single_structural_mutation: s.parse_bool_or("single_structural_mutation", false)?,
        structural_mutation_surer,
        initial_connection,
        bias: parse_float_attribute(s, "bias")?,
        response: parse_float_attribute(s, "response")?,
        weight: parse_float_attribute(s, "weight")?,
        activation: parse_choice_attribute(s, "activation")?,
        aggregation: parse_choice_attribute(s, "aggregation")?,
        enabled: BoolAttributeConfig {
            default: match s.raw("enabled_default")?.as_str() {
                "random" | "none" => None,
                v => Some(parse_bool_text(v).ok_or_else(|| s.invalid("enabled_default", v, "expected a boolean"))?),
            },
            mutate_rate: s.parse("enabled_mutate_rate")?,
            rate_to_true_add: s.parse_or("enabled_rate_to_true_add", 0.0)?,
            rate_to_false_add: s.parse_or("enabled_rate_to_false_add", 0.0)?,
        },
    })
}

fn parse_initial_connection(
    s: &mut SectionReader<'_>,
    num_hidden: usize,
) -> Result<InitialConnection, ConfigError> {
    let raw = s.raw_or("initial_connection", "unconnected");
    let kind = raw.split_whitespace().next().unwrap_or("unconnected");
    let fraction = |s: &SectionReader<'_>| -> Result<f64, ConfigError> {
        let p: f64 = raw
            .split_whitespace()
            .nth(1)
            .and_then(|w| w.parse().ok())
            .ok_or_else(|| s.invalid("initial_connection", &raw, "partial connection needs a fraction"))?;
        if !(0.0..=1.0).contains(&p) {
            return Err(s.invalid("initial_connection", &raw, "fraction must be within [0, 1]"));
        }
        Ok(p)
    };
    let connection = match kind {
        "unconnected" => InitialConnection::Unconnected,
        "fs_neat" | "fs_neat_nohidden" => InitialConnection::FsNeatNoHidden,
        "fs_neat_hidden" => InitialConnection::FsNeatHidden,
        "full" | "full_nodirect" => {
            if kind == "full" && num_hidden > 0 {
                tracing::warn!("initial_connection = full with hidden nodes; assuming full_nodirect");
            }
            InitialConnection::FullNoDirect
        }
        "full_direct" => InitialConnection::FullDirect,
        "partial" | "partial_nodirect" => InitialConnection::PartialNoDirect(fraction(&*s)?),
        "partial_direct" => InitialConnection::PartialDirect(fraction(&*s)?),
        _ => return Err(s.invalid("initial_connection", &raw, "unknown connection scheme")),
    };
    Ok(connection)
}

fn parse_float_attribute(s: &mut SectionReader<'_>, name: &str) -> Result<FloatAttributeConfig, ConfigError> {
    let key = |suffix: &str| format!("{name}_{suffix}");
    let init_type = match s.raw_or(&key("init_type"), "gaussian").as_str() {
        "gaussian" | "normal" => InitType::Gaussian,
        "uniform" => InitType::Uniform,
        other => return Err(s.invalid(&key("init_type"), other, "expected gaussian or uniform")),
    };
    let attr = FloatAttributeConfig {
        init_mean: s.parse(&key("init_mean"))?,
        init_stdev: s.parse(&key("init_stdev"))?,
        init_type,
        max_value: s.parse(&key("max_value"))?,
        min_value: s.parse(&key("min_value"))?,
        mutate_power: s.parse(&key("mutate_power"))?,
        mutate_rate: s.parse(&key("mutate_rate"))?,
        replace_rate: s.parse(&key("replace_rate"))?,
    };
    if attr.min_value > attr.max_value {
        return Err(s.invalid(&key("min_value"), &attr.min_value.to_string(), "greater than max_value"));
    }
    Ok(attr)
}

fn parse_choice_attribute<T>(s: &mut SectionReader<'_>, name: &str) -> Result<ChoiceAttributeConfig<T>, ConfigError>
where
    T: FromStr<Err = String> + Copy,
{
    let options_key = format!("{name}_options");
    let default_key = format!("{name}_default");
    let raw_options = s.raw(&options_key)?;
    let options = raw_options
        .split_whitespace()
        .map(|w| w.parse::<T>().map_err(|e| s.invalid(&options_key, &raw_options, &e)))
        .collect::<Result<Vec<T>, _>>()?;
    if options.is_empty() {
        return Err(s.invalid(&options_key, &raw_options, "at least one option is required"));
    }
    let raw_default = s.raw(&default_key)?;
    let default = match raw_default.as_str() {
        "random" | "none" => None,
        v => Some(v.parse::<T>().map_err(|e| s.invalid(&default_key, v, &e))?),
    };
    Ok(ChoiceAttributeConfig {
        default,
        options,
        mutate_rate: s.parse(&format!("{name}_mutate_rate"))?,
    })
}

fn parse_bool_text(v: &str) -> Option<bool> {
    match v.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

struct Ini {
    sections: HashMap<String, HashMap<String, String>>,
}

impl Ini {
    fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
        let mut current: Option<String> = None;
        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with(';') {
                continue;
            }
            if let Some(rest) = line.strip_prefix('[') {
                let name = rest.strip_suffix(']').ok_or_else(|| ConfigError::Syntax {
                    line: line_no,
                    message: format!("unterminated section header `{line}`"),
                })?;
                sections.entry(name.trim().to_string()).or_default();
                current = Some(name.trim().to_string());
                continue;
            }
            let Some(section) = current.as_ref() else {
                return Err(ConfigError::Syntax {
                    line: line_no,
                    message: "key outside of any section".into(),
                });
            };
            let split = line.find(['=', ':']).ok_or_else(|| ConfigError::Syntax {
                line: line_no,
                message: format!("expected `key = value`, got `{line}`"),
            })?;
            let key = line[..split].trim().to_string();
            let value = line[split + 1..].trim().to_string();
            if key.is_empty() {
                return Err(ConfigError::Syntax {
                    line: line_no,
                    message: "empty key".into(),
                });
            }
            if let Some(values) = sections.get_mut(section) {
                values.insert(key, value);
            }
        }
        Ok(Self { sections })
    }

    fn section(&mut self, name: &'static str) -> Result<SectionReader<'_>, ConfigError> {
        let values = self.sections.get_mut(name).ok_or(ConfigError::MissingSection(name))?;
        Ok(SectionReader { name, values })
    }
}

/// Consumes keys from one section; anything left over at `finish` is
/// reported as unknown.
struct SectionReader<'a> {
    name: &'static str,
    values: &'a mut HashMap<String, String>,
}

impl SectionReader<'_> {
    fn raw(&mut self, key: &str) -> Result<String, ConfigError> {
        self.values.remove(key).ok_or_else(|| ConfigError::MissingKey {
            section: self.name,
            key: key.to_string(),
        })
    }

    fn raw_or(&mut self, key: &str, default: &str) -> String {
        self.values.remove(key).unwrap_or_else(|| default.to_string())
    }

    fn parse<T>(&mut self, key: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let raw = self.raw(key)?;
        raw.parse().map_err(|e: T::Err| self.invalid(key, &raw, &e.to_string()))
    }

    fn parse_or<T>(&mut self, key: &str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        match self.values.remove(key) {
            Some(raw) => raw.parse().map_err(|e: T::Err| self.invalid(key, &raw, &e.to_string())),
            None => Ok(default),
        }
    }

    fn parse_bool(&mut self, key: &str) -> Result<bool, ConfigError> {
        let raw = self.raw(key)?;
        parse_bool_text(&raw).ok_or_else(|| self.invalid(key, &raw, "expected a boolean"))
    }

    fn parse_bool_or(&mut self, key: &str, default: bool) -> Result<bool, ConfigError> {
        match self.values.remove(key) {
            Some(raw) => parse_bool_text(&raw).ok_or_else(|| self.invalid(key, &raw, "expected a boolean")),
            None => Ok(default),
        }
    }

    fn invalid(&self, key: &str, value: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            section: self.name,
            key: key.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn finish(self) {
        let mut unknown: Vec<&String> = self.values.keys().collect();
        unknown.sort();
        for key in unknown {
            tracing::warn!(section = self.name, key = %key, "ignoring unknown config key");
        }
    }
}
