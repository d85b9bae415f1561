//! Group-wise neutron flux spectrum (the engine's `fluxes` file).
//!
//! Text layout, one entry per line:
//!
//! ```text
//! <value_1>
//! ...
//! <value_N>
//! <normalisation>
//! <name>
//! ```
//!
//! Values run from the lowest-energy bin upwards. The file carries no bin count
//! or boundaries; readers recover the group structure from the number of
//! values.

use super::groups::{GroupRegistry, standard_registry};
use super::serialization::{
    TextSerializable, format_float, parse_float_token, read_all_lines, write_text,
};
use crate::domain::{PactError, PactResult};
use serde::Serialize;
use std::io::{BufRead, Write};
use tracing::debug;

pub const DEFAULT_FLUXES_NAME: &str = "fluxes";
pub const DEFAULT_NORMALIZATION: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct FluxesFile<'r> {
    registry: &'r GroupRegistry,
    name: String,
    normalization: f64,
    boundaries: Vec<f64>,
    midpoints: Vec<f64>,
    values: Vec<f64>,
}

/// A bin carrying a non-zero flux.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FluxBin {
    pub index: usize,
    pub lower: f64,
    pub upper: f64,
    pub value: f64,
}

#[derive(Serialize)]
struct FluxesSnapshot<'a> {
    name: &'a str,
    normalization: f64,
    group_count: usize,
    boundaries: &'a [f64],
    midpoints: &'a [f64],
    values: &'a [f64],
}

impl FluxesFile<'static> {
    /// Empty spectrum bound to the process-wide standard registry.
    pub fn new(name: impl Into<String>, normalization: f64) -> PactResult<Self> {
        Self::with_registry(standard_registry(), name, normalization)
    }
}

impl Default for FluxesFile<'static> {
    fn default() -> Self {
        Self {
            registry: standard_registry(),
            name: DEFAULT_FLUXES_NAME.to_string(),
            normalization: DEFAULT_NORMALIZATION,
            boundaries: Vec::new(),
            midpoints: Vec::new(),
            values: Vec::new(),
        }
    }
}

impl<'r> FluxesFile<'r> {
    pub fn with_registry(
        registry: &'r GroupRegistry,
        name: impl Into<String>,
        normalization: f64,
    ) -> PactResult<Self> {
        check_normalization(normalization)?;
        let name = name.into();
        check_name(&name)?;
        Ok(Self {
            registry,
            name,
            normalization,
            boundaries: Vec::new(),
            midpoints: Vec::new(),
            values: Vec::new(),
        })
    }

    pub fn registry(&self) -> &'r GroupRegistry {
        self.registry
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name is written as the last line, so it cannot hold a line break.
    pub fn set_name(&mut self, name: impl Into<String>) -> PactResult<()> {
        let name = name.into();
        check_name(&name)?;
        self.name = name;
        Ok(())
    }

    pub fn normalization(&self) -> f64 {
        self.normalization
    }

    pub fn set_normalization(&mut self, normalization: f64) -> PactResult<()> {
        check_normalization(normalization)?;
        self.normalization = normalization;
        Ok(())
    }

    /// Zero until a group structure is installed.
    pub fn group_count(&self) -> usize {
        self.values.len()
    }

    /// Bin edges in ascending energy (eV), `group_count() + 1` of them.
    pub fn boundaries(&self) -> &[f64] {
        &self.boundaries
    }

    pub fn midpoints(&self) -> &[f64] {
        &self.midpoints
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Drops the group structure and all values; keeps the name and
    /// restores the default normalisation.
    pub fn reset(&mut self) {
        self.normalization = DEFAULT_NORMALIZATION;
        self.boundaries.clear();
        self.midpoints.clear();
        self.values.clear();
    }

    /// Installs a registered group structure and zeroes every bin.
    pub fn set_group(&mut self, group: usize) -> PactResult<()> {
        let boundaries = self.registry.ascending_boundaries(group).ok_or_else(|| {
            PactError::out_of_range(
                "FLUX.GROUP_UNKNOWN",
                format!("group {} is not a valid group", group),
            )
        })?;

        self.install_boundaries(boundaries);
        self.values = vec![0.0; group];
        debug!(group, name = %self.name, "installed flux group structure");
        Ok(())
    }

    /// Index of the bin `[boundaries[i], boundaries[i + 1])` holding `energy`.
    pub fn bin_index(&self, energy: f64) -> PactResult<usize> {
        let (Some(&lower), Some(&upper)) = (self.boundaries.first(), self.boundaries.last())
        else {
            return Err(PactError::illegal_state(
                "FLUX.NO_GROUP",
                "no group set, cannot locate an energy bin",
            ));
        };

        if !energy.is_finite() {
            return Err(PactError::out_of_range(
                "FLUX.ENERGY_INVALID",
                format!("energy {} is not a finite number", energy),
            ));
        }
        if energy < lower {
            return Err(PactError::out_of_range(
                "FLUX.ENERGY_BELOW_MIN",
                format!(
                    "energy value {} below minimum for group, group min is {}",
                    energy, lower
                ),
            ));
        }
        if energy >= upper {
            return Err(PactError::out_of_range(
                "FLUX.ENERGY_ABOVE_MAX",
                format!(
                    "energy value {} exceeds maximum for group, group max is {}",
                    energy, upper
                ),
            ));
        }

        Ok(self.boundaries.partition_point(|boundary| *boundary <= energy) - 1)
    }

    /// Sets the flux of the bin containing `energy`, overwriting any
    /// previous value for that bin.
    pub fn set_value(&mut self, energy: f64, value: f64) -> PactResult<()> {
        if self.boundaries.is_empty() {
            return Err(PactError::illegal_state(
                "FLUX.NO_GROUP",
                "no group set, cannot set value",
            ));
        }
        if !value.is_finite() || value < 0.0 {
            return Err(PactError::out_of_range(
                "FLUX.VALUE_NEGATIVE",
                format!("flux value {} must be a non-negative number", value),
            ));
        }

        let index = self.bin_index(energy)?;
        self.values[index] = value;
        Ok(())
    }

    /// Read-only consistency check of the bin layout and values.
    pub fn validate(&self) -> PactResult<()> {
        if self.boundaries.len() != self.values.len() + 1 {
            return Err(PactError::out_of_range(
                "FLUX.BOUNDARY_COUNT",
                format!(
                    "bin boundaries must be of size one greater than values size ({} boundaries, {} values)",
                    self.boundaries.len(),
                    self.values.len()
                ),
            ));
        }
        if self.midpoints.len() != self.values.len() {
            return Err(PactError::out_of_range(
                "FLUX.MIDPOINT_COUNT",
                format!(
                    "{} midpoint energies for {} values",
                    self.midpoints.len(),
                    self.values.len()
                ),
            ));
        }
        if let Some((index, value)) = self
            .values
            .iter()
            .enumerate()
            .find(|(_, value)| !value.is_finite() || **value < 0.0)
        {
            return Err(PactError::out_of_range(
                "FLUX.VALUE_NEGATIVE",
                format!("flux value {} in bin {} must be non-negative", value, index),
            ));
        }
        if let Some(index) = self
            .boundaries
            .windows(2)
            .position(|pair| pair[0] >= pair[1])
        {
            return Err(PactError::out_of_range(
                "FLUX.BOUNDARY_ORDER",
                format!(
                    "bin boundaries must increase strictly, boundary {} is {} and boundary {} is {}",
                    index,
                    self.boundaries[index],
                    index + 1,
                    self.boundaries[index + 1]
                ),
            ));
        }
        Ok(())
    }

    pub fn total_flux(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn nonzero_bins(&self) -> Vec<FluxBin> {
        self.values
            .iter()
            .enumerate()
            .filter(|(_, value)| **value != 0.0)
            .map(|(index, value)| FluxBin {
                index,
                lower: self.boundaries[index],
                upper: self.boundaries[index + 1],
                value: *value,
            })
            .collect()
    }

    pub fn to_json(&self) -> PactResult<String> {
        let snapshot = FluxesSnapshot {
            name: &self.name,
            normalization: self.normalization,
            group_count: self.group_count(),
            boundaries: &self.boundaries,
            midpoints: &self.midpoints,
            values: &self.values,
        };
        serde_json::to_string_pretty(&snapshot).map_err(|source| {
            PactError::illegal_state(
                "FLUX.JSON_ENCODE",
                format!("failed to encode fluxes as JSON: {}", source),
            )
        })
    }

    fn install_boundaries(&mut self, boundaries: Vec<f64>) {
        self.midpoints = boundaries
            .windows(2)
            .map(|pair| (pair[0] + pair[1]) / 2.0)
            .collect();
        self.boundaries = boundaries;
    }
}

impl TextSerializable for FluxesFile<'_> {
    /// An empty name is refused: its line would vanish on reading and the
    /// normalisation line would be taken for the name.
    fn serialize(&self, writer: &mut dyn Write) -> PactResult<()> {
        check_name(&self.name)?;
        if self.name.is_empty() {
            return Err(PactError::out_of_range(
                "FLUX.NAME_EMPTY",
                "fluxes with an empty name cannot be written",
            ));
        }

        let mut text = String::new();
        for value in &self.values {
            text.push_str(&format_float(*value));
            text.push('\n');
        }
        text.push_str(&format_float(self.normalization));
        text.push('\n');
        text.push_str(&self.name);
        write_text(writer, &text)
    }

    /// Replaces the whole spectrum with the reader's content. The name is the
    /// last line without its terminator; any other whitespace in it is kept.
    fn deserialize(&mut self, reader: &mut dyn BufRead) -> PactResult<()> {
        let lines = read_all_lines(reader)?;
        let [value_lines @ .., normalization_line, name_line] = lines.as_slice() else {
            return Err(PactError::deserialize_format(
                "FLUX.TRUNCATED",
                format!(
                    "fluxes text needs a normalisation and a name line, found {} lines",
                    lines.len()
                ),
            ));
        };

        let normalization = parse_float_token(normalization_line).ok_or_else(|| {
            PactError::deserialize_format(
                "FLUX.NORMALISATION",
                format!("normalisation '{}' is not a float", normalization_line),
            )
        })?;
        if normalization < 0.0 {
            return Err(PactError::deserialize_format(
                "FLUX.NORMALISATION",
                format!("normalisation {} must be non-negative", normalization),
            ));
        }

        let mut values = Vec::new();
        for (line_index, line) in value_lines.iter().enumerate() {
            for token in line.split_whitespace() {
                let value = parse_float_token(token).ok_or_else(|| {
                    PactError::deserialize_format(
                        "FLUX.VALUE_TOKEN",
                        format!(
                            "entry '{}' in line {} ('{}') is not a float",
                            token,
                            line_index + 1,
                            line
                        ),
                    )
                })?;
                if value < 0.0 {
                    return Err(PactError::deserialize_format(
                        "FLUX.VALUE_TOKEN",
                        format!(
                            "entry '{}' in line {} is a negative flux",
                            token,
                            line_index + 1
                        ),
                    ));
                }
                values.push(value);
            }
        }

        let group = values.len();
        let boundaries = self.registry.ascending_boundaries(group).ok_or_else(|| {
            PactError::deserialize_format(
                "FLUX.GROUP_UNKNOWN",
                format!("group structure {} not known", group),
            )
        })?;

        self.name = name_line.clone();
        self.normalization = normalization;
        self.values = values;
        self.install_boundaries(boundaries);
        debug!(group, name = %self.name, "read fluxes");
        Ok(())
    }
}

fn check_name(name: &str) -> PactResult<()> {
    if name.contains(['\n', '\r']) {
        return Err(PactError::out_of_range(
            "FLUX.NAME_LINE_BREAK",
            format!("fluxes name {:?} must fit on one line", name),
        ));
    }
    Ok(())
}

fn check_normalization(normalization: f64) -> PactResult<()> {
    if !normalization.is_finite() || normalization < 0.0 {
        return Err(PactError::out_of_range(
            "FLUX.NORMALISATION",
            format!("normalisation {} must be a non-negative number", normalization),
        ));
    }
    Ok(())
}
