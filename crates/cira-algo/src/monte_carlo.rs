//! Monte-Carlo yield estimation.
//!
//! Sweeps the electrical yield and, for each point, samples random fault
//! populations over the interface: `Nc = (1 − y)·N` expected faulty bumps
//! per sample, split between `⌊Nc⌋` and `⌊Nc⌋ + 1` so the average over the
//! sample set matches the expectation. Each sample is classified and, when
//! a repair is needed, resolved by the capacity solver (or the bundle
//! solver in bundle mode).
//!
//! All randomness draws from one seeded generator, so a fixed seed gives
//! bit-identical sweeps.

use cira_core::{BumpId, BumpTable, CiraError, CiraResult, RepairTag, RouteTable};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::bundle::bundle_solve;
use crate::capacity::capacity_solve;
use crate::classify::classify_fault;
use crate::enumerate::FaultKind;

/// Parameters of a yield sweep.
#[derive(Debug, Clone)]
pub struct YieldConfig {
    pub min_yield: f64,
    pub max_yield: f64,
    /// Samples per yield point (M)
    pub samples: usize,
    /// Number of yield steps; the linear sweep emits `steps + 1` points
    pub steps: usize,
    /// Sweep `1 - 10^-i` for `i = 1..=steps` instead of a linear range
    pub log_scale: bool,
    /// Resolve repairs with the bundle solver instead of the capacity solver
    pub bundle_mode: bool,
    /// Fixed seed for reproducible sweeps; `None` draws from entropy
    pub seed: Option<u64>,
}

impl Default for YieldConfig {
    fn default() -> Self {
        Self {
            min_yield: 0.95,
            max_yield: 1.0,
            samples: 100,
            steps: 10,
            log_scale: false,
            bundle_mode: false,
            seed: None,
        }
    }
}

impl YieldConfig {
    pub fn validate(&self) -> CiraResult<()> {
        if self.samples == 0 {
            return Err(CiraError::InvalidParameter(
                "Number_of_faults_tested must be at least 1".into(),
            ));
        }
        if self.steps == 0 {
            return Err(CiraError::InvalidParameter(
                "Number_of_electrical_yield_tested must be at least 1".into(),
            ));
        }
        if !self.log_scale {
            if !(0.0..=1.0).contains(&self.min_yield) || !(0.0..=1.0).contains(&self.max_yield) {
                return Err(CiraError::InvalidParameter(
                    "yield bounds must lie in [0, 1]".into(),
                ));
            }
            if self.min_yield > self.max_yield {
                return Err(CiraError::InvalidParameter(format!(
                    "Min_Yield ({}) must not exceed Max_Yield ({})",
                    self.min_yield, self.max_yield
                )));
            }
        }
        Ok(())
    }

    pub fn make_rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

/// The swept electrical-yield values: linear over `[min, max]` inclusive,
/// or logarithmic `1 - 10^-i`.
pub fn yield_range(config: &YieldConfig) -> Vec<f64> {
    if config.log_scale {
        (1..=config.steps).map(|exp| 1.0 - 10f64.powi(-(exp as i32))).collect()
    } else {
        let n = config.steps;
        (0..=n)
            .map(|i| {
                config.min_yield + (config.max_yield - config.min_yield) * i as f64 / n as f64
            })
            .collect()
    }
}

/// One point of a yield curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct YieldPoint {
    pub electrical_yield: f64,
    pub without_repair: f64,
    pub with_repair: f64,
}

/// Benign / repairable counts over one sample batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SampleCounters {
    pub benign: usize,
    pub repairable: usize,
}

fn round8(x: f64) -> f64 {
    (x * 1e8).round() / 1e8
}

/// Draw `k` distinct indices in `0..n`, in draw order.
fn sample_indices(rng: &mut StdRng, n: usize, k: usize) -> Vec<usize> {
    let mut pool: Vec<usize> = (0..n).collect();
    let mut picked = Vec::with_capacity(k);
    for _ in 0..k {
        let slot = rng.gen_range(0..pool.len());
        picked.push(pool.swap_remove(slot));
    }
    picked
}

/// Sample and classify `config.samples` random fault populations at one
/// electrical yield.
pub fn classify_samples(
    electrical_yield: f64,
    bumps: &BumpTable,
    routes: &RouteTable,
    config: &YieldConfig,
    rng: &mut StdRng,
) -> SampleCounters {
    let n = bumps.len();
    let nc = round8((1.0 - electrical_yield) * n as f64);
    let whole = nc.floor() as usize;
    let frac = round8(nc - whole as f64);

    let nsup = (config.samples as f64 * frac).floor() as usize;
    let ninf = config.samples - nsup;

    let mut draws: Vec<Vec<usize>> = Vec::with_capacity(config.samples);
    for _ in 0..ninf {
        draws.push(sample_indices(rng, n, whole));
    }
    for _ in 0..nsup {
        draws.push(sample_indices(rng, n, whole + 1));
    }
    draws.shuffle(rng);

    let mut counters = SampleCounters::default();
    for draw in draws {
        let fault: Vec<BumpId> = draw.into_iter().map(BumpId::new).collect();
        // An empty draw endangers nothing and classifies Benign.
        let classification = classify_fault(&fault, FaultKind::Open, bumps, routes);
        match classification.tag {
            RepairTag::Benign => counters.benign += 1,
            RepairTag::Repair => {
                let verdict = if config.bundle_mode {
                    bundle_solve(&fault, bumps, routes)
                } else {
                    let names: Vec<&str> =
                        fault.iter().map(|&id| bumps.bump(id).name.as_str()).collect();
                    capacity_solve(&classification.chains, &names, bumps, routes)
                };
                if verdict == RepairTag::Repairable {
                    counters.repairable += 1;
                }
            }
            _ => {}
        }
    }
    counters
}

/// Sweep the electrical yield over one interface.
pub fn estimate_interface_yield(
    bumps: &BumpTable,
    routes: &RouteTable,
    config: &YieldConfig,
) -> CiraResult<Vec<YieldPoint>> {
    config.validate()?;
    if bumps.is_empty() {
        return Err(CiraError::InvalidParameter(
            "cannot estimate yield over an empty bump map".into(),
        ));
    }

    let mut rng = config.make_rng();
    let mut points = Vec::new();
    for y in yield_range(config) {
        let counters = classify_samples(y, bumps, routes, config, &mut rng);
        let m = config.samples as f64;
        points.push(YieldPoint {
            electrical_yield: y,
            without_repair: counters.benign as f64 / m,
            with_repair: (counters.benign + counters.repairable) as f64 / m,
        });
    }
    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cira_core::{Bump, BumpType, RouteRow, RouteStatus};

    /// 100 bumps in a row: 90 DATA signals with default routes, 8 GND, 2
    /// spares reachable by every signal.
    fn fixture() -> (BumpTable, RouteTable) {
        let mut records = Vec::new();
        let mut rows = Vec::new();
        for i in 0..90 {
            let conn = format!("d{i}_phy");
            records.push(Bump::new(conn.clone(), 25.0 * i as f64, 0.0, BumpType::Data));
            rows.push(RouteRow {
                signal: format!("d{i}"),
                connection: conn,
                mux: format!("M{i}"),
                sel: "0".into(),
                status: RouteStatus::Default,
                chain: "Chain_0".into(),
            });
        }
        for i in 0..8 {
            records.push(Bump::new(
                format!("VSS_phy_{i}"),
                25.0 * (90 + i) as f64,
                0.0,
                BumpType::Gnd,
            ));
        }
        for s in 0..2 {
            let spare = format!("spare{s}_phy");
            records.push(
                Bump::new(spare.clone(), 25.0 * (98 + s) as f64, 0.0, BumpType::Spare)
                    .with_spare(true),
            );
            for i in 0..90 {
                rows.push(RouteRow {
                    signal: format!("d{i}"),
                    connection: spare.clone(),
                    mux: format!("M{i}"),
                    sel: format!("{}", s + 1),
                    status: RouteStatus::Repair,
                    chain: "Chain_0".into(),
                });
            }
        }
        (
            BumpTable::from_records(records, 1.0, 1.0).unwrap(),
            RouteTable::from_rows(rows),
        )
    }

    #[test]
    fn test_yield_range_linear_inclusive() {
        let config = YieldConfig {
            min_yield: 0.95,
            max_yield: 1.0,
            steps: 5,
            ..YieldConfig::default()
        };
        let range = yield_range(&config);
        assert_eq!(range.len(), 6);
        assert!((range[0] - 0.95).abs() < 1e-12);
        assert!((range[5] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_yield_range_log_scale() {
        let config = YieldConfig {
            log_scale: true,
            steps: 3,
            ..YieldConfig::default()
        };
        let range = yield_range(&config);
        assert_eq!(range.len(), 3);
        assert!((range[0] - 0.9).abs() < 1e-12);
        assert!((range[1] - 0.99).abs() < 1e-12);
        assert!((range[2] - 0.999).abs() < 1e-12);
    }

    #[test]
    fn test_sample_split_arithmetic() {
        // y = 0.985, N = 100 -> Nc = 1.5: half the samples draw 1 bump,
        // half draw 2.
        let nc = round8((1.0 - 0.985) * 100.0);
        assert!((nc - 1.5).abs() < 1e-9);
        let whole = nc.floor() as usize;
        let frac = round8(nc - whole as f64);
        assert_eq!(whole, 1);
        let nsup = (1000.0 * frac).floor() as usize;
        assert_eq!(nsup, 500);
    }

    #[test]
    fn test_perfect_yield_is_all_benign() {
        let (bumps, routes) = fixture();
        let config = YieldConfig {
            min_yield: 1.0,
            max_yield: 1.0,
            samples: 200,
            steps: 1,
            seed: Some(42),
            ..YieldConfig::default()
        };
        let points = estimate_interface_yield(&bumps, &routes, &config).unwrap();
        // Nc = 0 at y = 1: every sample is empty, hence Benign
        for point in points {
            assert_eq!(point.without_repair, 1.0);
            assert_eq!(point.with_repair, 1.0);
        }
    }

    #[test]
    fn test_with_repair_dominates_without() {
        let (bumps, routes) = fixture();
        let config = YieldConfig {
            min_yield: 0.95,
            max_yield: 1.0,
            samples: 300,
            steps: 5,
            seed: Some(42),
            ..YieldConfig::default()
        };
        let points = estimate_interface_yield(&bumps, &routes, &config).unwrap();
        assert_eq!(points.len(), 6);
        for point in &points {
            assert!(point.with_repair >= point.without_repair);
            assert!((0.0..=1.0).contains(&point.with_repair));
        }
        assert_eq!(points.last().unwrap().with_repair, 1.0);
    }

    #[test]
    fn test_yields_non_decreasing_in_electrical_yield() {
        // With 90 endangered signals out of 100 bumps the benign and
        // repairable rates collapse to ~0 away from y = 1, so the sampled
        // curves rise monotonically over a coarse sweep.
        let (bumps, routes) = fixture();
        let config = YieldConfig {
            min_yield: 0.9,
            max_yield: 1.0,
            samples: 400,
            steps: 2,
            seed: Some(42),
            ..YieldConfig::default()
        };
        let points = estimate_interface_yield(&bumps, &routes, &config).unwrap();
        for pair in points.windows(2) {
            assert!(pair[1].without_repair >= pair[0].without_repair);
            assert!(pair[1].with_repair >= pair[0].with_repair);
        }
    }

    #[test]
    fn test_fixed_seed_is_deterministic() {
        let (bumps, routes) = fixture();
        let config = YieldConfig {
            samples: 150,
            steps: 4,
            seed: Some(7),
            ..YieldConfig::default()
        };
        let a = estimate_interface_yield(&bumps, &routes, &config).unwrap();
        let b = estimate_interface_yield(&bumps, &routes, &config).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_usually_differ() {
        let (bumps, routes) = fixture();
        let base = YieldConfig {
            min_yield: 0.96,
            max_yield: 0.99,
            samples: 100,
            steps: 3,
            ..YieldConfig::default()
        };
        let a = estimate_interface_yield(
            &bumps,
            &routes,
            &YieldConfig { seed: Some(1), ..base.clone() },
        )
        .unwrap();
        let b = estimate_interface_yield(
            &bumps,
            &routes,
            &YieldConfig { seed: Some(2), ..base },
        )
        .unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let (bumps, routes) = fixture();
        let config = YieldConfig {
            min_yield: 0.99,
            max_yield: 0.95,
            ..YieldConfig::default()
        };
        assert!(estimate_interface_yield(&bumps, &routes, &config).is_err());

        let config = YieldConfig { samples: 0, ..YieldConfig::default() };
        assert!(estimate_interface_yield(&bumps, &routes, &config).is_err());
    }
}
