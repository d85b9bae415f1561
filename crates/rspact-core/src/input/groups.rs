//! Energy group structures keyed by group count.
//!
//! Boundaries are stored in the engine's native order (descending energy, eV).
//! Consumers ask for [`GroupRegistry::ascending_boundaries`] and never depend on
//! the storage order.

use super::serialization::parse_float_token;
use crate::domain::{PactError, PactResult};
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

/// Group counts shipped in the standard registry.
pub const STANDARD_GROUPS: [usize; 13] = [
    66, 69, 100, 162, 172, 175, 211, 315, 351, 586, 616, 709, 1102,
];

pub const STANDARD_LOWER_ENERGY_EV: f64 = 1.0e-5;

const MAX_TEXT_GROUPS: usize = 1 << 20;

// (group count, upper energy in eV)
const STANDARD_GROUP_SPANS: [(usize, f64); 13] = [
    (66, 2.0e7),
    (69, 1.0e7),
    (100, 2.0e7),
    (162, 1.0e9),
    (172, 1.96403e7),
    (175, 1.96403e7),
    (211, 5.5e7),
    (315, 1.96403e7),
    (351, 5.5e7),
    (586, 2.0e7),
    (616, 1.0e9),
    (709, 1.0e9),
    (1102, 1.0e9),
];

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GroupRegistry {
    structures: BTreeMap<usize, Vec<f64>>,
    approximate: BTreeSet<usize>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a structure after checking it has `group + 1` finite,
    /// non-negative and strictly monotonic boundaries. Replaces any existing
    /// entry with the same key.
    pub fn insert(&mut self, group: usize, boundaries: Vec<f64>) -> PactResult<()> {
        validate_structure(group, &boundaries)?;
        self.structures.insert(group, boundaries);
        self.approximate.remove(&group);
        Ok(())
    }

    /// True for the generated stand-ins of [`GroupRegistry::standard`] until
    /// an explicit table replaces them.
    pub fn is_approximate(&self, group: usize) -> bool {
        self.approximate.contains(&group)
    }

    pub fn contains(&self, group: usize) -> bool {
        self.structures.contains_key(&group)
    }

    /// Boundaries in storage order.
    pub fn get(&self, group: usize) -> Option<&[f64]> {
        self.structures.get(&group).map(Vec::as_slice)
    }

    pub fn ascending_boundaries(&self, group: usize) -> Option<Vec<f64>> {
        let stored = self.structures.get(&group)?;
        let descending = stored.first() > stored.last();
        let mut boundaries = stored.clone();
        if descending {
            boundaries.reverse();
        }
        Some(boundaries)
    }

    pub fn keys(&self) -> impl Iterator<Item = usize> + '_ {
        self.structures.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.structures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.structures.is_empty()
    }

    /// Lowest and highest boundary energy of a structure.
    pub fn span(&self, group: usize) -> Option<(f64, f64)> {
        let stored = self.structures.get(&group)?;
        let first = *stored.first()?;
        let last = *stored.last()?;
        Some((first.min(last), first.max(last)))
    }

    /// Builds the registry shipped with the crate: equal-lethargy structures
    /// for every count in [`STANDARD_GROUPS`], starting at
    /// [`STANDARD_LOWER_ENERGY_EV`]. They approximate the library grids and
    /// are flagged by [`GroupRegistry::is_approximate`]; library-exact tables
    /// are loaded with [`GroupRegistry::from_path`].
    pub fn standard() -> Self {
        let structures: BTreeMap<usize, Vec<f64>> = STANDARD_GROUP_SPANS
            .iter()
            .map(|&(group, upper)| {
                (
                    group,
                    equal_lethargy_boundaries(group, STANDARD_LOWER_ENERGY_EV, upper),
                )
            })
            .collect();
        let approximate = structures.keys().copied().collect();
        Self {
            structures,
            approximate,
        }
    }

    /// Parses a JSON object mapping group counts to boundary arrays, e.g.
    /// `{"2": [20.0, 10.0, 1.0]}`.
    pub fn from_json_str(source: &str) -> PactResult<Self> {
        let raw: BTreeMap<String, Vec<f64>> = serde_json::from_str(source).map_err(|source| {
            PactError::deserialize_format(
                "GROUPS.JSON_PARSE",
                format!("failed to parse group structure JSON: {}", source),
            )
        })?;

        let mut registry = Self::new();
        for (key, boundaries) in raw {
            let group = key.trim().parse::<usize>().map_err(|_| {
                PactError::deserialize_format(
                    "GROUPS.JSON_KEY",
                    format!("group key '{}' is not a positive integer", key),
                )
            })?;
            registry
                .insert(group, boundaries)
                .map_err(as_format_error)?;
        }

        debug!(structures = registry.len(), "loaded group structures from JSON");
        Ok(registry)
    }

    /// Parses whitespace-separated blocks: a group count `n` followed by its
    /// `n + 1` boundary values. `#` starts a comment running to end of line.
    pub fn from_text(source: &str) -> PactResult<Self> {
        let mut tokens = source
            .lines()
            .map(|line| line.split('#').next().unwrap_or_default())
            .flat_map(str::split_whitespace);

        let mut registry = Self::new();
        while let Some(count_token) = tokens.next() {
            let group = count_token.parse::<usize>().map_err(|_| {
                PactError::deserialize_format(
                    "GROUPS.TEXT_COUNT",
                    format!("expected a group count, found '{}'", count_token),
                )
            })?;
            if group > MAX_TEXT_GROUPS {
                return Err(PactError::deserialize_format(
                    "GROUPS.TEXT_COUNT",
                    format!("group count {} exceeds {}", group, MAX_TEXT_GROUPS),
                ));
            }

            let mut boundaries = Vec::with_capacity(group + 1);
            for _ in 0..=group {
                let token = tokens.next().ok_or_else(|| {
                    PactError::deserialize_format(
                        "GROUPS.TEXT_TRUNCATED",
                        format!(
                            "group {} ends after {} of {} boundaries",
                            group,
                            boundaries.len(),
                            group + 1
                        ),
                    )
                })?;
                let value = parse_float_token(token).ok_or_else(|| {
                    PactError::deserialize_format(
                        "GROUPS.TEXT_VALUE",
                        format!("boundary '{}' of group {} is not a float", token, group),
                    )
                })?;
                boundaries.push(value);
            }

            registry
                .insert(group, boundaries)
                .map_err(as_format_error)?;
        }

        debug!(structures = registry.len(), "loaded group structures from text");
        Ok(registry)
    }

    /// Loads a registry file, choosing JSON for a `.json` extension and the
    /// block text layout otherwise.
    pub fn from_path(path: &Path) -> PactResult<Self> {
        let source = fs::read_to_string(path).map_err(|source| {
            PactError::io(
                "IO.GROUPS_READ",
                format!("failed to read group structures '{}': {}", path.display(), source),
            )
        })?;

        let is_json = path
            .extension()
            .and_then(|extension| extension.to_str())
            .is_some_and(|extension| extension.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json_str(&source)
        } else {
            Self::from_text(&source)
        }
    }
}

/// Process-wide standard registry, built on first use and never mutated.
pub fn standard_registry() -> &'static GroupRegistry {
    static REGISTRY: OnceLock<GroupRegistry> = OnceLock::new();
    REGISTRY.get_or_init(GroupRegistry::standard)
}

/// `groups + 1` boundaries equally spaced in lethargy between `lower` and
/// `upper`, returned in descending order. Both end points are exact.
pub fn equal_lethargy_boundaries(groups: usize, lower: f64, upper: f64) -> Vec<f64> {
    let ratio = (upper / lower).ln();
    let mut boundaries = (0..=groups)
        .map(|index| match index {
            0 => lower,
            _ if index == groups => upper,
            _ => lower * (ratio * index as f64 / groups as f64).exp(),
        })
        .collect::<Vec<_>>();
    boundaries.reverse();
    boundaries
}

fn validate_structure(group: usize, boundaries: &[f64]) -> PactResult<()> {
    if group == 0 {
        return Err(PactError::out_of_range(
            "GROUPS.EMPTY",
            "group structures need at least one group",
        ));
    }

    if boundaries.len() != group + 1 {
        return Err(PactError::out_of_range(
            "GROUPS.BOUNDARY_COUNT",
            format!(
                "group {} needs {} boundaries, found {}",
                group,
                group + 1,
                boundaries.len()
            ),
        ));
    }

    if let Some(bad) = boundaries
        .iter()
        .find(|value| !value.is_finite() || **value < 0.0)
    {
        return Err(PactError::out_of_range(
            "GROUPS.BOUNDARY_VALUE",
            format!("group {} has invalid boundary energy {}", group, bad),
        ));
    }

    let increasing = boundaries.windows(2).all(|pair| pair[0] < pair[1]);
    let decreasing = boundaries.windows(2).all(|pair| pair[0] > pair[1]);
    if !(increasing || decreasing) {
        return Err(PactError::out_of_range(
            "GROUPS.BOUNDARY_ORDER",
            format!("group {} boundaries are not strictly monotonic", group),
        ));
    }

    Ok(())
}

fn as_format_error(error: PactError) -> PactError {
    PactError::deserialize_format(error.placeholder(), error.message().to_string())
}
