//! Field elevation lookup for density altitude.
//!
//! A small built-in table, overridable per station from configuration.

use std::collections::BTreeMap;

use crate::station::StationCode;

/// Built-in field elevations (ft MSL).
const BUILTIN_ELEVATIONS_FT: &[(&str, i32)] = &[
    ("KCLT", 748),
    ("KINT", 969),
    ("KRUQ", 772),
    ("KEXX", 733),
];

/// Station → field elevation in feet.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ElevationTable {
    elevations: BTreeMap<StationCode, f64>,
}

impl ElevationTable {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in table.
    pub fn builtin() -> Self {
        let elevations = BUILTIN_ELEVATIONS_FT
            .iter()
            .filter_map(|(code, ft)| StationCode::new(code).map(|c| (c, *ft as f64)))
            .collect();
        ElevationTable { elevations }
    }

    /// Built-in table with `overrides` applied on top.
    pub fn with_overrides<'a, I>(overrides: I) -> Self
    where
        I: IntoIterator<Item = (&'a StationCode, &'a f64)>,
    {
        let mut table = Self::builtin();
        for (code, ft) in overrides {
            table.insert(code.clone(), *ft);
        }
        table
    }

    pub fn insert(&mut self, station: StationCode, elevation_ft: f64) {
        self.elevations.insert(station, elevation_ft);
    }

    pub fn get(&self, station: &StationCode) -> Option<f64> {
        self.elevations.get(station).copied()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
