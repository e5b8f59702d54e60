use crate::trial::{Phase, Trial};

/// Renders a fixed-width summary table, one row per trial and phase.
pub fn summary_table(trials: &[Trial]) -> String {
    let mut out = format!(
        "{w:>5} {p:>9} {n:>7} {min:>10} {mean:>12} {max:>10} {exp:>10} {r:>6}",
        w = "bits",
        p = "phase",
        n = "samples",
        min = "min",
        mean = "mean",
        max = "max",
        exp = "2^bits",
        r = "ratio",
    );
    out.push('\n');
    for trial in trials {
        for phase in [Phase::Collision, Phase::PreImage] {
            let stats = trial.stats(phase);
            out.push_str(&format!(
                "{w:>5} {p:>9} {n:>7} {min:>10} {mean:>12} {max:>10} {exp:>10.0} {r:>6}",
                w = stats.width,
                p = phase.to_string(),
                n = format!("{}/{}", stats.samples, trial.sample_target()),
                min = dash_or(stats.min),
                mean = stats.mean.map_or_else(|| "-".to_string(), |m| format!("{m:.1}")),
                max = dash_or(stats.max),
                exp = stats.expected(),
                r = stats.ratio().map_or_else(|| "-".to_string(), |r| format!("{r:.2}")),
            ));
            out.push('\n');
        }
    }
    out
}

fn dash_or(value: Option<u64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::truncate::BitWidth;

    #[test]
    fn empty_trial_rows() {
        let trial = Trial::new(BitWidth::new(8).unwrap(), [0u8; 32], 50);
        let table = summary_table(&[trial]);
        let lines: Vec<&str> = table.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("samples"));
        assert!(lines[1].contains("collision"));
        assert!(lines[1].contains("0/50"));
        assert!(lines[1].contains("256"));
        assert!(lines[2].contains("pre-image"));
    }
}
