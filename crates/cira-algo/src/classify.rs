//! Fault classification.
//!
//! Derives the preliminary tag of a candidate fault and the set of repair
//! chains it touches. A POWER/GND short is unrecoverable by design and wins
//! over everything else; otherwise each bump's effective type decides
//! whether a solver has to act.

use cira_core::{Bump, BumpId, BumpTable, BumpType, RepairTag, RouteTable};

use crate::enumerate::FaultKind;

/// Preliminary verdict for one fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    /// `Benign`, `Repair` or `Catastrophic`
    pub tag: RepairTag,
    /// Involved repair chains, first-seen order, deduplicated
    pub chains: Vec<String>,
}

/// Effective type of a bump for classification purposes.
///
/// A spare-flagged bump acts as `SPARE` whatever its nominal type. A bump
/// with no `Default` route acts as `NONE` — it carries no signal in the
/// unrepaired interface — except for `DATA` bumps, which stay functional
/// (DBI-style connections are routed even without a default row).
pub fn effective_type(bump: &Bump, routes: &RouteTable) -> BumpType {
    if bump.spare {
        return BumpType::Spare;
    }
    if bump.kind != BumpType::Data && !routes.has_default_row(&bump.name) {
        return BumpType::None;
    }
    bump.kind
}

/// Does a bump of this effective type endanger a functional signal?
fn needs_repair(kind: BumpType) -> bool {
    // POWER, GND, SPARE, NONE -> Benign; DATA, CLK, ADDR, SIDEBAND -> Repair
    kind.is_functional()
}

/// Classify a candidate fault: preliminary tag plus involved chains.
pub fn classify_fault(
    fault: &[BumpId],
    kind: FaultKind,
    bumps: &BumpTable,
    routes: &RouteTable,
) -> Classification {
    let mut has_power = false;
    let mut has_gnd = false;
    let mut any_repair = false;
    let mut chains: Vec<String> = Vec::new();

    for &id in fault {
        let bump = bumps.bump(id);

        match bump.kind {
            BumpType::Power => has_power = true,
            BumpType::Gnd => has_gnd = true,
            _ => {}
        }

        for chain in routes.chains_for_connection(&bump.name) {
            if !chains.iter().any(|c| c == chain) {
                chains.push(chain.to_string());
            }
        }

        if needs_repair(effective_type(bump, routes)) {
            any_repair = true;
        }
    }

    let tag = if kind == FaultKind::Short && has_power && has_gnd {
        RepairTag::Catastrophic
    } else if any_repair {
        RepairTag::Repair
    } else {
        RepairTag::Benign
    };

    Classification { tag, chains }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cira_core::{Bump, RouteRow, RouteStatus};

    fn bump_table() -> BumpTable {
        BumpTable::from_records(
            vec![
                Bump::new("rxdata0_phy", 0.0, 0.0, BumpType::Data),
                Bump::new("rxclk_phy", 25.0, 0.0, BumpType::Clk),
                Bump::new("VDD_phy", 50.0, 0.0, BumpType::Power),
                Bump::new("VSS_phy", 75.0, 0.0, BumpType::Gnd),
                Bump::new("spare0_phy", 100.0, 0.0, BumpType::Spare).with_spare(true),
                Bump::new("dangling_phy", 125.0, 0.0, BumpType::Sideband),
            ],
            1.0,
            1.0,
        )
        .unwrap()
    }

    fn route_table() -> RouteTable {
        let row = |signal: &str, connection: &str, status: RouteStatus| RouteRow {
            signal: signal.into(),
            connection: connection.into(),
            mux: "M0".into(),
            sel: "0".into(),
            status,
            chain: "Chain_0".into(),
        };
        RouteTable::from_rows(vec![
            row("rxdata0", "rxdata0_phy", RouteStatus::Default),
            row("rxdata0", "spare0_phy", RouteStatus::Repair),
            row("rxclk", "rxclk_phy", RouteStatus::Default),
            row("rxclk", "spare0_phy", RouteStatus::Repair),
        ])
    }

    fn ids(bumps: &BumpTable, names: &[&str]) -> Vec<BumpId> {
        names.iter().map(|n| bumps.id_of(n).unwrap()).collect()
    }

    #[test]
    fn test_gnd_open_is_benign() {
        let bumps = bump_table();
        let routes = route_table();
        let c = classify_fault(&ids(&bumps, &["VSS_phy"]), FaultKind::Open, &bumps, &routes);
        assert_eq!(c.tag, RepairTag::Benign);
        assert!(c.chains.is_empty());
    }

    #[test]
    fn test_data_fault_needs_repair() {
        let bumps = bump_table();
        let routes = route_table();
        let c = classify_fault(
            &ids(&bumps, &["rxdata0_phy"]),
            FaultKind::Open,
            &bumps,
            &routes,
        );
        assert_eq!(c.tag, RepairTag::Repair);
        assert_eq!(c.chains, vec!["Chain_0".to_string()]);
    }

    #[test]
    fn test_power_gnd_short_is_catastrophic() {
        let bumps = bump_table();
        let routes = route_table();
        let c = classify_fault(
            &ids(&bumps, &["VDD_phy", "VSS_phy"]),
            FaultKind::Short,
            &bumps,
            &routes,
        );
        assert_eq!(c.tag, RepairTag::Catastrophic);
    }

    #[test]
    fn test_catastrophic_wins_over_repair() {
        // Monotonicity: adding POWER and GND to a short always yields
        // Catastrophic, regardless of the other bumps and their order.
        let bumps = bump_table();
        let routes = route_table();
        for fault in [
            vec!["VDD_phy", "VSS_phy", "rxdata0_phy"],
            vec!["rxdata0_phy", "VDD_phy", "VSS_phy"],
            vec!["VDD_phy", "rxclk_phy", "VSS_phy"],
        ] {
            let c = classify_fault(&ids(&bumps, &fault), FaultKind::Short, &bumps, &routes);
            assert_eq!(c.tag, RepairTag::Catastrophic, "fault {fault:?}");
        }
    }

    #[test]
    fn test_power_gnd_open_is_not_catastrophic() {
        let bumps = bump_table();
        let routes = route_table();
        let c = classify_fault(
            &ids(&bumps, &["VDD_phy", "VSS_phy"]),
            FaultKind::Open,
            &bumps,
            &routes,
        );
        assert_eq!(c.tag, RepairTag::Benign);
    }

    #[test]
    fn test_spare_flag_neutralizes_type() {
        let bumps = bump_table();
        let routes = route_table();
        // spare0_phy is SPARE-typed and flagged; effective type SPARE -> Benign
        let c = classify_fault(
            &ids(&bumps, &["spare0_phy"]),
            FaultKind::Open,
            &bumps,
            &routes,
        );
        assert_eq!(c.tag, RepairTag::Benign);
        // but it still pulls its repair chain in
        assert_eq!(c.chains, vec!["Chain_0".to_string()]);
    }

    #[test]
    fn test_no_default_route_normalizes_to_none() {
        let bumps = bump_table();
        let routes = route_table();
        // dangling_phy is SIDEBAND but has no route rows at all
        let c = classify_fault(
            &ids(&bumps, &["dangling_phy"]),
            FaultKind::Open,
            &bumps,
            &routes,
        );
        assert_eq!(c.tag, RepairTag::Benign);
    }

    #[test]
    fn test_data_exempt_from_none_normalization() {
        let bumps = BumpTable::from_records(
            vec![Bump::new("dbi0_phy", 0.0, 0.0, BumpType::Data)],
            1.0,
            1.0,
        )
        .unwrap();
        let routes = RouteTable::default();
        let c = classify_fault(
            &[bumps.id_of("dbi0_phy").unwrap()],
            FaultKind::Open,
            &bumps,
            &routes,
        );
        assert_eq!(c.tag, RepairTag::Repair);
    }

    #[test]
    fn test_empty_fault_is_benign() {
        let bumps = bump_table();
        let routes = route_table();
        let c = classify_fault(&[], FaultKind::Open, &bumps, &routes);
        assert_eq!(c.tag, RepairTag::Benign);
    }
}
