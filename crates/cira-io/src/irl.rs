//! Interconnect Repair List loader.
//!
//! The IRL is a nested mapping: repair chain → functional port → physical
//! port → `{To, Control: {Mux, Sel}}`. A leading `#` comment block is
//! allowed and stripped before parsing. The loader flattens the nesting
//! into [`RouteRow`]s in document order and loads every chain.

use std::fs;
use std::path::Path;

use anyhow::Context;
use cira_core::{CiraError, CiraResult, RouteRow, RouteStatus, RouteTable};
use serde_yaml::{Mapping, Value};

fn scalar_to_string(value: &Value, what: &str) -> CiraResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(CiraError::Parse(format!(
            "expected a scalar for {what}, got {other:?}"
        ))),
    }
}

fn as_mapping<'a>(value: &'a Value, what: &str) -> CiraResult<&'a Mapping> {
    value
        .as_mapping()
        .ok_or_else(|| CiraError::Parse(format!("expected a mapping for {what}")))
}

/// Parse IRL content (comments already allowed) into a flattened route table.
pub fn parse_irl(content: &str) -> CiraResult<RouteTable> {
    let clean: String = content
        .lines()
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect::<Vec<_>>()
        .join("\n");

    let doc: Mapping = serde_yaml::from_str(clean.trim())
        .map_err(|e| CiraError::Parse(format!("malformed IRL: {e}")))?;

    let mut rows = Vec::new();
    for (chain_key, chain_value) in &doc {
        let chain = scalar_to_string(chain_key, "a repair-chain id")?;
        let ports = as_mapping(chain_value, &format!("repair chain '{chain}'"))?;

        for (port_key, port_value) in ports {
            let port_id = scalar_to_string(port_key, "a functional-port key")?;
            let port = as_mapping(port_value, &format!("functional port '{port_id}'"))?;

            let signal = port
                .get("Name")
                .ok_or_else(|| {
                    CiraError::Parse(format!(
                        "functional port '{port_id}' in chain '{chain}' has no 'Name'"
                    ))
                })
                .and_then(|v| scalar_to_string(v, "a signal name"))?;

            for (phys_key, phys_value) in port {
                let key = scalar_to_string(phys_key, "a physical-port key")?;
                if key == "Name" {
                    continue;
                }
                let phys = as_mapping(
                    phys_value,
                    &format!("physical port '{key}' of signal '{signal}'"),
                )?;

                let connection = phys
                    .get("To")
                    .ok_or_else(|| {
                        CiraError::Parse(format!(
                            "physical port '{key}' of signal '{signal}' has no 'To'"
                        ))
                    })
                    .and_then(|v| scalar_to_string(v, "a connection name"))?;

                let control = phys
                    .get("Control")
                    .map(|v| as_mapping(v, &format!("control block of '{connection}'")))
                    .transpose()?;

                let lookup = |field: &str| -> CiraResult<String> {
                    match control.and_then(|c| c.get(field)) {
                        Some(v) => scalar_to_string(v, field),
                        None => Ok(String::new()),
                    }
                };

                rows.push(RouteRow {
                    signal: signal.clone(),
                    connection,
                    mux: lookup("Mux")?,
                    sel: lookup("Sel")?,
                    status: RouteStatus::from_port_key(&key),
                    chain: chain.clone(),
                });
            }
        }
    }

    Ok(RouteTable::from_rows(rows))
}

/// Load and flatten an IRL file.
pub fn load_irl(path: &Path) -> CiraResult<RouteTable> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading IRL '{}'", path.display()))
        .map_err(CiraError::from)?;
    parse_irl(&content)
}
