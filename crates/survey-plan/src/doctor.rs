use anyhow::Result;

use crate::PlannerConfig;

/// Highest altitude the vehicle will accept for a waypoint (metres above ground).
pub const MAX_ALT_M: f64 = 100.0;

pub fn check_planner(cfg: &PlannerConfig) -> Result<()> {
    anyhow::ensure!(
        cfg.sweep_spacing_m.is_finite() && (0.5..=100.0).contains(&cfg.sweep_spacing_m),
        "planner.sweep_spacing_m should be 0.5..100, got {}",
        cfg.sweep_spacing_m
    );
    anyhow::ensure!(
        cfg.default_alt_m.is_finite() && (0.0..=MAX_ALT_M).contains(&cfg.default_alt_m),
        "planner.default_alt_m should be 0..{}, got {}",
        MAX_ALT_M,
        cfg.default_alt_m
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_pass() {
        check_planner(&PlannerConfig::default()).unwrap();
    }

    #[test]
    fn rejects_bad_spacing_and_altitude() {
        let cfg = PlannerConfig { sweep_spacing_m: 0.0, ..PlannerConfig::default() };
        assert!(check_planner(&cfg).is_err());
        let cfg = PlannerConfig { default_alt_m: 400.0, ..PlannerConfig::default() };
        assert!(check_planner(&cfg).is_err());
        let cfg = PlannerConfig { sweep_spacing_m: f64::NAN, ..PlannerConfig::default() };
        assert!(check_planner(&cfg).is_err());
    }
}
