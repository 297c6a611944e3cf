//! Reference absorption-edge energies used as calibration targets.
//!
//! Soft X-ray beamlines calibrate against the K edge of light elements and
//! the L3 edge of the 3d transition metals. Energies are in eV.

use crate::domain::{XasError, XasResult};

const EDGE_TABLE: [(&str, &str, f64); 20] = [
    ("C", "K", 284.2),
    ("N", "K", 409.9),
    ("O", "K", 543.1),
    ("F", "K", 696.7),
    ("Ne", "K", 870.2),
    ("Na", "K", 1070.8),
    ("Mg", "K", 1303.0),
    ("Al", "K", 1559.6),
    ("Si", "K", 1839.0),
    ("Ca", "L3", 346.2),
    ("Sc", "L3", 398.7),
    ("Ti", "L3", 453.8),
    ("V", "L3", 512.1),
    ("Cr", "L3", 574.1),
    ("Mn", "L3", 638.7),
    ("Fe", "L3", 706.8),
    ("Co", "L3", 778.1),
    ("Ni", "L3", 852.7),
    ("Cu", "L3", 932.7),
    ("Zn", "L3", 1021.8),
];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeEnergy {
    pub symbol: &'static str,
    pub edge: &'static str,
    pub energy: f64,
}

pub fn edge_for_symbol(symbol: &str) -> Option<EdgeEnergy> {
    let symbol = symbol.trim();
    EDGE_TABLE
        .iter()
        .find(|(candidate, _, _)| candidate.eq_ignore_ascii_case(symbol))
        .map(|&(symbol, edge, energy)| EdgeEnergy {
            symbol,
            edge,
            energy,
        })
}

pub fn known_symbols() -> impl Iterator<Item = &'static str> {
    EDGE_TABLE.iter().map(|(symbol, _, _)| *symbol)
}

/// Accepts an element symbol from the table or a literal energy such as `"285.3"`.
pub fn resolve_edge(spec: &str) -> XasResult<f64> {
    if let Some(edge) = edge_for_symbol(spec) {
        return Ok(edge.energy);
    }

    match spec.trim().parse::<f64>() {
        Ok(energy) if energy.is_finite() => Ok(energy),
        _ => Err(XasError::lookup(
            "LOOKUP.EDGE",
            format!(
                "'{spec}' is neither a numeric energy nor a known element symbol ({})",
                known_symbols().collect::<Vec<_>>().join(", ")
            ),
        )),
    }
}
