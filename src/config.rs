use std::collections::HashSet;
use std::path::PathBuf;

use crate::error::{Error, Result};
use crate::truncate::BitWidth;

pub const DEFAULT_WIDTHS: [u32; 8] = [8, 10, 12, 14, 16, 18, 20, 22];
pub const DEFAULT_SAMPLES: usize = 50;
pub const DEFAULT_RESULTS_DIR: &str = "results";

pub const USAGE: &str = "\
Usage: hash-attack [options]
  --results <dir>          directory holding trial records (default: results)
  --widths <w1,w2,...>     truncation widths in bits (default: 8,10,...,22)
  --samples <n>            samples per phase per width (default: 50)
  --max-iterations <n>     abort a search after n draws (default: unlimited)
  --seed <n>               seed the candidate generator for a reproducible run
  --help                   print this message";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExperimentConfig {
    pub results_dir: PathBuf,
    pub widths: Vec<BitWidth>,
    pub samples: usize,
    pub iteration_ceiling: Option<u64>,
    pub seed: Option<u64>,
}

impl Default for ExperimentConfig {
    fn default() -> Self {
        Self {
            results_dir: PathBuf::from(DEFAULT_RESULTS_DIR),
            widths: DEFAULT_WIDTHS
                .iter()
                .filter_map(|&bits| BitWidth::new(bits).ok())
                .collect(),
            samples: DEFAULT_SAMPLES,
            iteration_ceiling: None,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    Run(ExperimentConfig),
    Help,
}

impl ExperimentConfig {
    /// Parses command-line arguments, excluding the program name.
    pub fn from_args<I>(args: I) -> Result<Invocation>
    where
        I: IntoIterator<Item = String>,
    {
        let mut config = Self::default();
        let mut args = args.into_iter();
        while let Some(flag) = args.next() {
            let mut value = || {
                args.next()
                    .ok_or_else(|| Error::Config(format!("{flag} expects a value")))
            };
            match flag.as_str() {
                "--help" | "-h" => return Ok(Invocation::Help),
                "--results" => config.results_dir = PathBuf::from(value()?),
                "--widths" => config.widths = parse_widths(&value()?)?,
                "--samples" => config.samples = parse_number(&flag, &value()?)?,
                "--max-iterations" => {
                    config.iteration_ceiling = Some(parse_number(&flag, &value()?)?)
                }
                "--seed" => config.seed = Some(parse_number(&flag, &value()?)?),
                other => return Err(Error::Config(format!("unknown argument {other}"))),
            }
        }
        config.validate()?;
        Ok(Invocation::Run(config))
    }

    pub fn validate(&self) -> Result<()> {
        if self.widths.is_empty() {
            return Err(Error::Config("at least one width is required".into()));
        }
        let mut seen = HashSet::new();
        for width in &self.widths {
            if width.bits() == 0 {
                return Err(Error::Config("widths must be positive".into()));
            }
            if !seen.insert(*width) {
                return Err(Error::Config(format!("width {width} listed twice")));
            }
        }
        if self.samples == 0 {
            return Err(Error::Config("samples must be positive".into()));
        }
        if self.iteration_ceiling == Some(0) {
            return Err(Error::Config("max iterations must be positive".into()));
        }
        Ok(())
    }
}

fn parse_number<T: std::str::FromStr>(flag: &str, text: &str) -> Result<T> {
    text.trim()
        .parse()
        .map_err(|_| Error::Config(format!("{flag}: invalid number {text:?}")))
}

fn parse_widths(text: &str) -> Result<Vec<BitWidth>> {
    text.split(',')
        .map(|part| BitWidth::new(parse_number("--widths", part)?))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn run(list: &[&str]) -> Result<ExperimentConfig> {
        match ExperimentConfig::from_args(args(list))? {
            Invocation::Run(config) => Ok(config),
            Invocation::Help => panic!("unexpected help"),
        }
    }

    #[test]
    fn defaults_match_the_standard_experiment() {
        let config = run(&[]).unwrap();
        let widths: Vec<u32> = config.widths.iter().map(|w| w.bits()).collect();
        assert_eq!(widths, DEFAULT_WIDTHS);
        assert_eq!(config.samples, 50);
        assert_eq!(config.results_dir, PathBuf::from("results"));
        assert_eq!(config.iteration_ceiling, None);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn parses_every_flag() {
        let config = run(&[
            "--results",
            "/tmp/out",
            "--widths",
            "4, 6",
            "--samples",
            "3",
            "--max-iterations",
            "1000",
            "--seed",
            "9",
        ])
        .unwrap();
        let widths: Vec<u32> = config.widths.iter().map(|w| w.bits()).collect();
        assert_eq!(widths, vec![4, 6]);
        assert_eq!(config.results_dir, PathBuf::from("/tmp/out"));
        assert_eq!(config.samples, 3);
        assert_eq!(config.iteration_ceiling, Some(1000));
        assert_eq!(config.seed, Some(9));
    }

    #[test]
    fn help_short_circuits() {
        assert_eq!(
            ExperimentConfig::from_args(args(&["--help", "--bogus"])).unwrap(),
            Invocation::Help
        );
    }

    #[test]
    fn rejects_bad_input() {
        assert!(matches!(run(&["--widths", "8,300"]), Err(Error::InvalidWidth(300))));
        assert!(matches!(run(&["--widths", "8,8"]), Err(Error::Config(_))));
        assert!(matches!(run(&["--widths", "0"]), Err(Error::Config(_))));
        assert!(matches!(run(&["--samples", "0"]), Err(Error::Config(_))));
        assert!(matches!(run(&["--samples"]), Err(Error::Config(_))));
        assert!(matches!(run(&["--frobnicate"]), Err(Error::Config(_))));
        assert!(matches!(run(&["--seed", "x"]), Err(Error::Config(_))));
    }
}
