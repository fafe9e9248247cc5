//! Fault-pattern enumeration.
//!
//! Produces every fault pattern consistent with the fault model, in
//! deterministic lexicographic index order:
//!
//! - opens: every m-combination of distinct bumps (k is 1 for opens);
//! - k-shorts: every k-combination whose induced geometric graph is
//!   connected under the distance threshold;
//! - multi-shorts (m ≥ 2): m k-combinations combined per
//!   [`MultiFaultMode`].
//!
//! Patterns are classified during emission, so consumers receive the bump
//! list, the involved repair chains and the preliminary tag together.

use cira_core::{forms_short, BumpId, BumpTable, CiraError, CiraResult, RouteTable};
use serde::{Deserialize, Serialize};

use crate::classify::classify_fault;

/// Fault mechanism under analysis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaultKind {
    /// Bumps bridged together; constrained by geometric proximity
    Short,
    /// Connections gone dead; position-independent
    Open,
}

impl FaultKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultKind::Short => "Short",
            FaultKind::Open => "Open",
        }
    }
}

impl std::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FaultKind {
    type Err = CiraError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Short" | "short" => Ok(FaultKind::Short),
            "Open" | "open" => Ok(FaultKind::Open),
            other => Err(CiraError::InvalidParameter(format!(
                "unknown fault type '{other}' (expected Short or Open)"
            ))),
        }
    }
}

/// How m simultaneous sub-faults combine into one pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MultiFaultMode {
    /// Merge the m sub-combinations into a single k·m-bump fault before the
    /// connectivity check. Sub-faults may overlap (duplicate bumps appear
    /// once per sub-fault in the flattened list).
    #[default]
    Flatten,
    /// Keep each sub-fault a separate object: every sub-fault must pass the
    /// connectivity check on its own and sub-faults must not overlap.
    Distinct,
}

/// Parameters of the fault model driving the enumeration.
#[derive(Debug, Clone)]
pub struct FaultModel {
    pub kind: FaultKind,
    /// Bumps per short (k); opens always affect one bump each
    pub shorted_bumps: usize,
    /// Simultaneous faults per pattern (m)
    pub multiplicity: usize,
    /// Upper distance threshold for shorts, in micrometers
    pub short_distance: f64,
    pub multi_mode: MultiFaultMode,
}

impl FaultModel {
    pub fn new(kind: FaultKind) -> Self {
        Self {
            kind,
            shorted_bumps: 2,
            multiplicity: 1,
            short_distance: 26.0,
            multi_mode: MultiFaultMode::Flatten,
        }
    }

    pub fn with_shorted_bumps(mut self, k: usize) -> Self {
        self.shorted_bumps = k;
        self
    }

    pub fn with_multiplicity(mut self, m: usize) -> Self {
        self.multiplicity = m;
        self
    }

    pub fn with_short_distance(mut self, d: f64) -> Self {
        self.short_distance = d;
        self
    }

    pub fn with_multi_mode(mut self, mode: MultiFaultMode) -> Self {
        self.multi_mode = mode;
        self
    }

    /// Bumps per individual sub-fault.
    pub fn bumps_per_fault(&self) -> usize {
        match self.kind {
            FaultKind::Open => 1,
            FaultKind::Short => self.shorted_bumps,
        }
    }

    pub fn validate(&self, bump_count: usize) -> CiraResult<()> {
        if self.shorted_bumps < 1 || self.shorted_bumps > bump_count {
            return Err(CiraError::InvalidParameter(format!(
                "Shorted_Bumps_Number must be between 1 and {bump_count}, got {}",
                self.shorted_bumps
            )));
        }
        if self.multiplicity < 1 {
            return Err(CiraError::InvalidParameter(
                "Faults_Number must be at least 1".into(),
            ));
        }
        if self.kind == FaultKind::Short && !(self.short_distance > 0.0) {
            return Err(CiraError::InvalidParameter(format!(
                "Short_Distance must be positive, got {}",
                self.short_distance
            )));
        }
        Ok(())
    }
}

/// Lexicographic k-combinations of `0..n`.
#[derive(Debug, Clone)]
pub struct Combinations {
    n: usize,
    k: usize,
    indices: Vec<usize>,
    started: bool,
    done: bool,
}

impl Combinations {
    pub fn new(n: usize, k: usize) -> Self {
        Self {
            n,
            k,
            indices: (0..k).collect(),
            started: false,
            done: k > n,
        }
    }
}

impl Iterator for Combinations {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }
        if !self.started {
            self.started = true;
            return Some(self.indices.clone());
        }

        // Advance the rightmost index that still has room
        let mut i = self.k;
        loop {
            if i == 0 {
                self.done = true;
                return None;
            }
            i -= 1;
            if self.indices[i] != i + self.n - self.k {
                break;
            }
        }
        self.indices[i] += 1;
        for j in (i + 1)..self.k {
            self.indices[j] = self.indices[j - 1] + 1;
        }
        Some(self.indices.clone())
    }
}

/// One emitted fault pattern: the affected bumps, the sub-faults it is made
/// of, the involved repair chains and the preliminary classifier tag.
#[derive(Debug, Clone)]
pub struct FaultPattern {
    pub bumps: Vec<BumpId>,
    pub sub_faults: Vec<Vec<BumpId>>,
    pub tag: cira_core::RepairTag,
    pub chains: Vec<String>,
}

enum EnumState {
    /// m = 1: plain k-combinations
    Single(Combinations),
    /// m ≥ 2: m-combinations over a materialized group list
    Multi {
        groups: Vec<Vec<usize>>,
        outer: Combinations,
    },
}

/// Lazy fault-pattern generator. See [`enumerate_faults`].
pub struct FaultEnumerator<'a> {
    model: FaultModel,
    bumps: &'a BumpTable,
    routes: &'a RouteTable,
    state: EnumState,
}

/// Build the lazy enumerator for a fault model over the given tables.
pub fn enumerate_faults<'a>(
    model: &FaultModel,
    bumps: &'a BumpTable,
    routes: &'a RouteTable,
) -> CiraResult<FaultEnumerator<'a>> {
    model.validate(bumps.len())?;

    let n = bumps.len();
    let k = model.bumps_per_fault();
    let state = if model.multiplicity == 1 {
        EnumState::Single(Combinations::new(n, k))
    } else {
        let groups: Vec<Vec<usize>> = match model.multi_mode {
            // Source parity: every k-combination participates; validity is
            // only checked on the flattened union.
            MultiFaultMode::Flatten => Combinations::new(n, k).collect(),
            // Redesigned behavior: only individually valid sub-faults combine.
            MultiFaultMode::Distinct => Combinations::new(n, k)
                .filter(|combo| {
                    if model.kind != FaultKind::Short {
                        return true;
                    }
                    let members: Vec<_> =
                        combo.iter().map(|&i| bumps.bump(BumpId::new(i))).collect();
                    forms_short(&members, model.short_distance)
                })
                .collect(),
        };
        let outer = Combinations::new(groups.len(), model.multiplicity);
        EnumState::Multi { groups, outer }
    };

    Ok(FaultEnumerator {
        model: model.clone(),
        bumps,
        routes,
        state,
    })
}

impl<'a> FaultEnumerator<'a> {
    fn accept(&self, indices: &[usize]) -> bool {
        if self.model.kind != FaultKind::Short {
            return true;
        }
        let members: Vec<_> = indices
            .iter()
            .map(|&i| self.bumps.bump(BumpId::new(i)))
            .collect();
        forms_short(&members, self.model.short_distance)
    }

    fn emit(&self, sub_indices: Vec<Vec<usize>>) -> FaultPattern {
        let bumps: Vec<BumpId> = sub_indices
            .iter()
            .flatten()
            .map(|&i| BumpId::new(i))
            .collect();
        let classification =
            classify_fault(&bumps, self.model.kind, self.bumps, self.routes);
        FaultPattern {
            sub_faults: sub_indices
                .into_iter()
                .map(|sub| sub.into_iter().map(BumpId::new).collect())
                .collect(),
            bumps,
            tag: classification.tag,
            chains: classification.chains,
        }
    }
}

impl<'a> Iterator for FaultEnumerator<'a> {
    type Item = FaultPattern;

    fn next(&mut self) -> Option<FaultPattern> {
        loop {
            match &mut self.state {
                EnumState::Single(combos) => {
                    let combo = combos.next()?;
                    if !self.accept(&combo) {
                        continue;
                    }
                    return Some(self.emit(vec![combo]));
                }
                EnumState::Multi { groups, outer } => {
                    let picks = outer.next()?;
                    let subs: Vec<Vec<usize>> =
                        picks.iter().map(|&g| groups[g].clone()).collect();
                    match self.model.multi_mode {
                        MultiFaultMode::Flatten => {
                            let flat: Vec<usize> = subs.iter().flatten().copied().collect();
                            if !self.accept(&flat) {
                                continue;
                            }
                        }
                        MultiFaultMode::Distinct => {
                            let flat: Vec<usize> = subs.iter().flatten().copied().collect();
                            let mut dedup = flat.clone();
                            dedup.sort_unstable();
                            dedup.dedup();
                            if dedup.len() != flat.len() {
                                // Overlapping sub-faults are rejected
                                continue;
                            }
                        }
                    }
                    return Some(self.emit(subs));
                }
            }
        }
    }
}
