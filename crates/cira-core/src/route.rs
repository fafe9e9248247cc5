//! Flattened Interconnect Repair List: route rows and their indexes.
//!
//! A route row says "signal S can reach connection C through mux M at select
//! value V, inside repair chain R". The table keeps rows in IRL document
//! order (the routing solver explores candidates in that order) and builds
//! hash indexes by signal, connection and chain at load time.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{BumpTable, CiraError, CiraResult};

/// Strip the physical-port marker from a connection name to get its signal.
///
/// Every occurrence of `_phy` is removed, so a disambiguated name such as
/// `VSS_phy_0` maps to `VSS_0`.
pub fn signal_name(connection: &str) -> String {
    connection.replace("_phy", "")
}

/// Role of a route row inside its multiplexer tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RouteStatus {
    /// The connection carrying the signal when no repair is active
    Default,
    /// An alternative connection reachable by reprogramming the mux
    Repair,
}

impl RouteStatus {
    /// Map an IRL physical-port key to a status. The key `Default` is the
    /// default route; every other key names a repair alternative.
    pub fn from_port_key(key: &str) -> Self {
        if key == "Default" {
            RouteStatus::Default
        } else {
            RouteStatus::Repair
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RouteStatus::Default => "Default",
            RouteStatus::Repair => "Repair",
        }
    }
}

impl std::fmt::Display for RouteStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One flattened IRL entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRow {
    /// Functional port name (no `_phy` suffix)
    pub signal: String,
    /// Physical bump name this route lands on
    pub connection: String,
    /// Multiplexer identifier
    pub mux: String,
    /// Select value activating this route through `mux`
    pub sel: String,
    pub status: RouteStatus,
    /// Repair chain this row belongs to; rerouting never leaves a chain
    pub chain: String,
}

/// Immutable, indexed collection of route rows.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    rows: Vec<RouteRow>,
    by_signal: HashMap<String, Vec<usize>>,
    by_connection: HashMap<String, Vec<usize>>,
    by_chain: HashMap<String, Vec<usize>>,
    default_connections: HashSet<String>,
}

impl RouteTable {
    pub fn from_rows(rows: Vec<RouteRow>) -> Self {
        let mut table = Self {
            rows,
            ..Self::default()
        };
        table.rebuild_indexes();
        table
    }

    fn rebuild_indexes(&mut self) {
        self.by_signal.clear();
        self.by_connection.clear();
        self.by_chain.clear();
        self.default_connections.clear();
        for (i, row) in self.rows.iter().enumerate() {
            self.by_signal.entry(row.signal.clone()).or_default().push(i);
            self.by_connection
                .entry(row.connection.clone())
                .or_default()
                .push(i);
            self.by_chain.entry(row.chain.clone()).or_default().push(i);
            if row.status == RouteStatus::Default {
                self.default_connections.insert(row.connection.clone());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All rows in IRL document order.
    pub fn rows(&self) -> &[RouteRow] {
        &self.rows
    }

    pub fn rows_for_signal(&self, signal: &str) -> impl Iterator<Item = &RouteRow> {
        self.by_signal
            .get(signal)
            .into_iter()
            .flatten()
            .map(move |&i| &self.rows[i])
    }

    pub fn rows_for_connection(&self, connection: &str) -> impl Iterator<Item = &RouteRow> {
        self.by_connection
            .get(connection)
            .into_iter()
            .flatten()
            .map(move |&i| &self.rows[i])
    }

    pub fn rows_for_chain(&self, chain: &str) -> impl Iterator<Item = &RouteRow> {
        self.by_chain
            .get(chain)
            .into_iter()
            .flatten()
            .map(move |&i| &self.rows[i])
    }

    /// Does this connection carry a signal by default? Connections appearing
    /// only in `Repair` rows are spare-only.
    pub fn has_default_row(&self, connection: &str) -> bool {
        self.default_connections.contains(connection)
    }

    /// Does this signal have at least one non-default (repair) route?
    pub fn has_repair_row_for_signal(&self, signal: &str) -> bool {
        self.rows_for_signal(signal)
            .any(|row| row.status != RouteStatus::Default)
    }

    /// Repair chains referencing this connection, first-seen order, deduplicated.
    pub fn chains_for_connection(&self, connection: &str) -> Vec<&str> {
        let mut chains = Vec::new();
        for row in self.rows_for_connection(connection) {
            if !chains.contains(&row.chain.as_str()) {
                chains.push(row.chain.as_str());
            }
        }
        chains
    }

    /// All distinct chain ids, first-seen order.
    pub fn chains(&self) -> Vec<&str> {
        let mut chains = Vec::new();
        for row in &self.rows {
            if !chains.contains(&row.chain.as_str()) {
                chains.push(row.chain.as_str());
            }
        }
        chains
    }

    /// Check that every connection named by a row exists in the bump map.
    pub fn validate_references(&self, bumps: &BumpTable) -> CiraResult<()> {
        for row in &self.rows {
            if bumps.get(&row.connection).is_none() {
                return Err(CiraError::MissingReference(format!(
                    "route row for signal '{}' names connection '{}' which is not in the bump map",
                    row.signal, row.connection
                )));
            }
        }
        Ok(())
    }

    /// A copy of this table without the rows touching the given connections.
    /// Solvers mutate copies; the loaded table stays shared and immutable.
    pub fn without_connections(&self, removed: &HashSet<&str>) -> RouteTable {
        let rows = self
            .rows
            .iter()
            .filter(|row| !removed.contains(row.connection.as_str()))
            .cloned()
            .collect();
        RouteTable::from_rows(rows)
    }

    /// A copy restricted to rows whose signal is in `signals`.
    pub fn restricted_to_signals(&self, signals: &HashSet<&str>) -> RouteTable {
        let rows = self
            .rows
            .iter()
            .filter(|row| signals.contains(row.signal.as_str()))
            .cloned()
            .collect();
        RouteTable::from_rows(rows)
    }
}
