//! System-level yield composition.
//!
//! A system is a set of dies, each contributing one interface description
//! (bump map + IRL) replicated `interface_number` times. Per electrical
//! yield, the system yield is the product of the per-interface yields; the
//! surface figures compare the silicon wasted without repair against the
//! area spent on spare bumps.

use cira_core::{BumpTable, CiraResult, RouteTable};
use serde::Serialize;

use crate::monte_carlo::{classify_samples, yield_range, YieldConfig};

/// One die's interface, loaded and ready to sample.
#[derive(Debug)]
pub struct SystemInterface {
    pub die_id: String,
    pub bumps: BumpTable,
    pub routes: RouteTable,
    pub die_number: u32,
    pub interface_number: u32,
    /// Die surface in mm²
    pub die_surface: f64,
}

/// Surface accounting over the whole system.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SurfaceFigures {
    /// Σ die surface × die count, in mm²
    pub total_die_surface: f64,
    /// Σ spare fraction × interface surface × interface count, in mm²
    pub total_repair_surface: f64,
}

/// One point of the system yield curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SystemYieldPoint {
    pub electrical_yield: f64,
    pub without_repair: f64,
    pub with_repair: f64,
    /// Wasted surface (no repair) over repair overhead surface; `None` when
    /// the system carries no spares
    pub surface_ratio: Option<f64>,
}

/// Compute the system's surface figures.
pub fn surface_figures(interfaces: &[SystemInterface]) -> SurfaceFigures {
    let mut figures = SurfaceFigures::default();
    for interface in interfaces {
        figures.total_die_surface += interface.die_surface * interface.die_number as f64;

        let bump_count = interface.bumps.len();
        if bump_count == 0 {
            continue;
        }
        let interface_surface = interface
            .bumps
            .bounds()
            .map(|b| b.surface_mm2())
            .unwrap_or(0.0);
        let spare_fraction = interface.bumps.spare_count() as f64 / bump_count as f64;
        figures.total_repair_surface +=
            spare_fraction * interface_surface * interface.interface_number as f64;
    }
    figures
}

/// Sweep the electrical yield over a whole system.
///
/// Interfaces are sampled sequentially from the single seeded generator, so
/// system sweeps are as reproducible as interface sweeps.
pub fn estimate_system_yield(
    interfaces: &[SystemInterface],
    config: &YieldConfig,
) -> CiraResult<Vec<SystemYieldPoint>> {
    config.validate()?;
    let figures = surface_figures(interfaces);

    let mut rng = config.make_rng();
    let mut points = Vec::new();
    for y in yield_range(config) {
        let mut without_repair = 1.0;
        let mut with_repair = 1.0;
        for interface in interfaces {
            let counters =
                classify_samples(y, &interface.bumps, &interface.routes, config, &mut rng);
            let m = config.samples as f64;
            without_repair *= counters.benign as f64 / m;
            with_repair *= (counters.benign + counters.repairable) as f64 / m;
        }

        let wasted_surface = (1.0 - without_repair) * figures.total_die_surface;
        let surface_ratio = if figures.total_repair_surface > 0.0 {
            Some(wasted_surface / figures.total_repair_surface)
        } else {
            None
        };

        points.push(SystemYieldPoint {
            electrical_yield: y,
            without_repair,
            with_repair,
            surface_ratio,
        });
    }
    Ok(points)
}
