//! The engine's `files` manifest: where to find nuclear data and where to put
//! the run's auxiliary files.
//!
//! Each set entry is written as a comment line followed by `keyword path`.

use super::serialization::{TextSerializable, read_all_lines, write_text};
use crate::domain::{PactError, PactResult};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FilesKeyword {
    IndNuc,
    XsEndf,
    ProbTab,
    FyEndf,
    SfEndf,
    DkEndf,
    Hazards,
    Clear,
    A2Data,
    Absorp,
    GgBins,
    Fluxes,
    ArbFlux,
    Collapxi,
    Collapxo,
    Arrayx,
}

impl FilesKeyword {
    pub const ALL: [Self; 16] = [
        Self::IndNuc,
        Self::XsEndf,
        Self::ProbTab,
        Self::FyEndf,
        Self::SfEndf,
        Self::DkEndf,
        Self::Hazards,
        Self::Clear,
        Self::A2Data,
        Self::Absorp,
        Self::GgBins,
        Self::Fluxes,
        Self::ArbFlux,
        Self::Collapxi,
        Self::Collapxo,
        Self::Arrayx,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IndNuc => "ind_nuc",
            Self::XsEndf => "xs_endf",
            Self::ProbTab => "prob_tab",
            Self::FyEndf => "fy_endf",
            Self::SfEndf => "sf_endf",
            Self::DkEndf => "dk_endf",
            Self::Hazards => "hazards",
            Self::Clear => "clear",
            Self::A2Data => "a2data",
            Self::Absorp => "absorp",
            Self::GgBins => "ggbins",
            Self::Fluxes => "fluxes",
            Self::ArbFlux => "arb_flux",
            Self::Collapxi => "collapxi",
            Self::Collapxo => "collapxo",
            Self::Arrayx => "arrayx",
        }
    }

    pub const fn description(self) -> &'static str {
        match self {
            Self::IndNuc => "index of nuclides to be included",
            Self::XsEndf => "library cross section data",
            Self::ProbTab => "library probability tables for self-shielding",
            Self::FyEndf => "neutron induced fission yields",
            Self::SfEndf => "spontaneous fission yields",
            Self::DkEndf => "decay data",
            Self::Hazards => "ingestion and inhalation doses",
            Self::Clear => "clearance data",
            Self::A2Data => "transport (A2) limits",
            Self::Absorp => "gamma absorption data",
            Self::GgBins => "gamma group bin structure",
            Self::Fluxes => "fluxes file",
            Self::ArbFlux => "arbitrary flux file",
            Self::Collapxi => "collapsed cross section data (input)",
            Self::Collapxo => "collapsed cross section data (output)",
            Self::Arrayx => "condensed decay data (output)",
        }
    }

    /// Files the engine writes; they need not exist before a run.
    pub const fn is_output(self) -> bool {
        matches!(self, Self::Collapxo | Self::Arrayx)
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.as_str().eq_ignore_ascii_case(keyword))
    }
}

impl Display for FilesKeyword {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

// Paths are relative to the nuclear data base directory.
const XS_LIBRARIES: [(&str, &str, &str); 3] = [
    (
        "TENDL2015",
        "TENDL2015data/tendl15_decay12_index",
        "TENDL2015data/tal2015-n/gxs-709",
    ),
    (
        "TENDL2014",
        "TENDL2014data/tendl14_decay12_index",
        "TENDL2014data/tal2014-n/gxs-709",
    ),
    (
        "EAF2010",
        "EAF2010data/eaf_index_20100",
        "EAF2010data/eaf_n_gxs_211_flt_20100",
    ),
];

const PROB_TAB_LIBRARIES: [(&str, &str); 2] = [
    ("TENDL2015", "TENDL2015data/tal2015-n/tp-709-294"),
    ("TENDL2014", "TENDL2014data/tal2014-n/tp-709-294"),
];

const FISSION_YIELD_LIBRARIES: [(&str, &str, &str); 2] = [
    ("GEFY52", "GEFY52data/gefy52_nfy", "GEFY52data/gefy52_sfy"),
    ("UKFY41", "UKFY41data/ukfy4_1n", "UKFY41data/ukfy4_1s"),
];

const DECAY_DIRECTORIES: [(&str, &str); 1] = [("DECAY", "decay")];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilesFile {
    base_dir: PathBuf,
    entries: BTreeMap<FilesKeyword, PathBuf>,
}

impl FilesFile {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            entries: BTreeMap::new(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn path(&self, keyword: FilesKeyword) -> Option<&Path> {
        self.entries.get(&keyword).map(PathBuf::as_path)
    }

    pub fn entries(&self) -> impl Iterator<Item = (FilesKeyword, &Path)> {
        self.entries
            .iter()
            .map(|(keyword, path)| (*keyword, path.as_path()))
    }

    /// Sets an entry verbatim, without joining it to the base directory.
    pub fn set_path(&mut self, keyword: FilesKeyword, path: impl Into<PathBuf>) {
        self.entries.insert(keyword, path.into());
    }

    pub fn clear_path(&mut self, keyword: FilesKeyword) -> Option<PathBuf> {
        self.entries.remove(&keyword)
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }

    /// Cross sections and the matching nuclide index.
    pub fn set_xs(&mut self, library: &str) -> PactResult<()> {
        let (_, index, xs) =
            lookup_library(&XS_LIBRARIES, library, |entry| entry.0, "cross section")?;
        self.set_data_path(FilesKeyword::IndNuc, index);
        self.set_data_path(FilesKeyword::XsEndf, xs);
        Ok(())
    }

    pub fn set_prob_tab(&mut self, library: &str) -> PactResult<()> {
        let (_, tables) =
            lookup_library(&PROB_TAB_LIBRARIES, library, |entry| entry.0, "probability table")?;
        self.set_data_path(FilesKeyword::ProbTab, tables);
        Ok(())
    }

    pub fn set_fission_yield(&mut self, library: &str) -> PactResult<()> {
        let (_, induced, spontaneous) =
            lookup_library(&FISSION_YIELD_LIBRARIES, library, |entry| entry.0, "fission yield")?;
        self.set_data_path(FilesKeyword::FyEndf, induced);
        self.set_data_path(FilesKeyword::SfEndf, spontaneous);
        Ok(())
    }

    pub fn set_decay(&mut self, library: &str) -> PactResult<()> {
        let directory = decay_directory(library)?;
        self.set_data_path(FilesKeyword::DkEndf, &format!("{}/decay_2012", directory));
        Ok(())
    }

    /// Hazard, clearance and transport limit tables.
    pub fn set_regulatory(&mut self, library: &str) -> PactResult<()> {
        let directory = decay_directory(library)?;
        self.set_data_path(FilesKeyword::Hazards, &format!("{}/hazards_2012", directory));
        self.set_data_path(FilesKeyword::Clear, &format!("{}/clear_2012", directory));
        self.set_data_path(FilesKeyword::A2Data, &format!("{}/a2_2012", directory));
        Ok(())
    }

    pub fn set_gamma_absorb(&mut self, library: &str) -> PactResult<()> {
        let directory = decay_directory(library)?;
        self.set_data_path(FilesKeyword::Absorp, &format!("{}/abs_2012", directory));
        Ok(())
    }

    /// Input entries whose path does not exist on disk, in keyword order.
    pub fn invalid_paths(&self) -> Vec<(FilesKeyword, PathBuf)> {
        self.entries
            .iter()
            .filter(|(keyword, path)| !keyword.is_output() && !path.exists())
            .map(|(keyword, path)| (*keyword, path.clone()))
            .collect()
    }

    pub fn to_json(&self) -> PactResult<String> {
        let entries = self
            .entries
            .iter()
            .map(|(keyword, path)| (keyword.as_str(), path.to_string_lossy().into_owned()))
            .collect::<BTreeMap<_, _>>();
        serde_json::to_string_pretty(&entries).map_err(|source| {
            PactError::illegal_state(
                "FILES.JSON_ENCODE",
                format!("failed to encode files manifest as JSON: {}", source),
            )
        })
    }

    fn set_data_path(&mut self, keyword: FilesKeyword, relative: &str) {
        let path = self.base_dir.join(relative);
        self.entries.insert(keyword, path);
    }
}

impl TextSerializable for FilesFile {
    fn serialize(&self, writer: &mut dyn Write) -> PactResult<()> {
        let mut text = String::new();
        for (keyword, path) in &self.entries {
            text.push_str(&format!("# {}\n", keyword.description()));
            text.push_str(&format!("{} {}\n", keyword, path.display()));
        }
        write_text(writer, &text)
    }

    /// Keeps the base directory; replaces every entry.
    fn deserialize(&mut self, reader: &mut dyn BufRead) -> PactResult<()> {
        let lines = read_all_lines(reader)?;
        let mut entries = BTreeMap::new();

        for (line_index, line) in lines.iter().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let (keyword_token, path) = trimmed
                .split_once(char::is_whitespace)
                .map(|(keyword, path)| (keyword, path.trim()))
                .unwrap_or((trimmed, ""));
            let keyword = FilesKeyword::from_keyword(keyword_token).ok_or_else(|| {
                PactError::deserialize_format(
                    "FILES.KEYWORD",
                    format!(
                        "unknown files keyword '{}' in line {}",
                        keyword_token,
                        line_index + 1
                    ),
                )
            })?;
            if path.is_empty() {
                return Err(PactError::deserialize_format(
                    "FILES.PATH",
                    format!(
                        "files keyword '{}' in line {} has no path",
                        keyword,
                        line_index + 1
                    ),
                ));
            }
            entries.insert(keyword, PathBuf::from(path));
        }

        debug!(entries = entries.len(), "read files manifest");
        self.entries = entries;
        Ok(())
    }
}

fn lookup_library<T: Copy>(
    table: &[T],
    library: &str,
    key: impl Fn(&T) -> &'static str,
    kind: &str,
) -> PactResult<T> {
    table
        .iter()
        .copied()
        .find(|entry| key(entry).eq_ignore_ascii_case(library.trim()))
        .ok_or_else(|| {
            let known = table.iter().map(&key).collect::<Vec<_>>().join(", ");
            PactError::out_of_range(
                "FILES.LIBRARY_UNKNOWN",
                format!(
                    "{} library '{}' is not known, expected one of: {}",
                    kind, library, known
                ),
            )
        })
}

fn decay_directory(library: &str) -> PactResult<&'static str> {
    let (_, directory) = lookup_library(&DECAY_DIRECTORIES, library, |entry| entry.0, "decay")?;
    Ok(directory)
}

#[cfg(test)]
mod tests {
    use super::{FilesFile, FilesKeyword};
    use crate::domain::PactErrorCategory;
    use crate::input::serialization::{TextSerializable, serialize_to_string};
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    #[test]
    fn keywords_round_trip_through_their_names() {
        for keyword in FilesKeyword::ALL {
            assert_eq!(FilesKeyword::from_keyword(keyword.as_str()), Some(keyword));
        }
        assert_eq!(FilesKeyword::from_keyword("XS_ENDF"), Some(FilesKeyword::XsEndf));
        assert_eq!(FilesKeyword::from_keyword("ggbins"), Some(FilesKeyword::GgBins));
        assert_eq!(FilesKeyword::from_keyword("gg_bins"), None);
        assert!(!FilesKeyword::GgBins.is_output());
    }

    #[test]
    fn gamma_bin_entry_round_trips_and_counts_as_input() {
        let mut files = FilesFile::new("/data");
        files.set_xs("TENDL2015").unwrap();
        files.set_path(FilesKeyword::GgBins, "ggbin_dir");

        let text = serialize_to_string(&files).unwrap();
        assert!(text.contains("# gamma group bin structure\nggbins ggbin_dir\n"));

        let mut restored = FilesFile::new("/data");
        restored.deserialize(&mut text.as_bytes()).unwrap();
        assert_eq!(restored, files);
        assert_eq!(restored.path(FilesKeyword::GgBins), Some(Path::new("ggbin_dir")));
        assert!(
            restored
                .invalid_paths()
                .contains(&(FilesKeyword::GgBins, PathBuf::from("ggbin_dir")))
        );
    }

    #[test]
    fn library_selectors_join_the_base_directory() {
        let mut files = FilesFile::new("/data");
        files.set_xs("TENDL2015").unwrap();
        files.set_fission_yield("gefy52").unwrap();
        files.set_decay("DECAY").unwrap();
        files.set_regulatory("DECAY").unwrap();

        assert_eq!(
            files.path(FilesKeyword::XsEndf),
            Some(Path::new("/data/TENDL2015data/tal2015-n/gxs-709"))
        );
        assert_eq!(
            files.path(FilesKeyword::IndNuc),
            Some(Path::new("/data/TENDL2015data/tendl15_decay12_index"))
        );
        assert_eq!(
            files.path(FilesKeyword::SfEndf),
            Some(Path::new("/data/GEFY52data/gefy52_sfy"))
        );
        assert_eq!(
            files.path(FilesKeyword::DkEndf),
            Some(Path::new("/data/decay/decay_2012"))
        );
        assert_eq!(
            files.path(FilesKeyword::A2Data),
            Some(Path::new("/data/decay/a2_2012"))
        );
        assert_eq!(files.entries().count(), 8);
    }

    #[test]
    fn unknown_library_is_out_of_range_and_leaves_entries_alone() {
        let mut files = FilesFile::new("/data");
        let error = files.set_xs("JEFF99").unwrap_err();
        assert_eq!(error.category(), PactErrorCategory::OutOfRange);
        assert!(error.message().contains("TENDL2015"));
        assert_eq!(files.entries().count(), 0);

        assert!(files.set_gamma_absorb("EAF").is_err());
        assert!(files.set_prob_tab("GEFY52").is_err());
    }

    #[test]
    fn invalid_paths_skip_existing_and_output_entries() {
        let temp = TempDir::new().expect("tempdir should be created");
        let existing = temp.path().join("fluxes");
        fs::write(&existing, "1.0\nname").expect("fluxes should be written");

        let mut files = FilesFile::new(temp.path());
        files.set_path(FilesKeyword::Fluxes, &existing);
        files.set_path(FilesKeyword::Arrayx, temp.path().join("ARRAYX"));
        files.set_xs("TENDL2015").unwrap();

        let invalid = files.invalid_paths();
        assert_eq!(
            invalid,
            vec![
                (
                    FilesKeyword::IndNuc,
                    temp.path().join("TENDL2015data/tendl15_decay12_index")
                ),
                (
                    FilesKeyword::XsEndf,
                    temp.path().join("TENDL2015data/tal2015-n/gxs-709")
                ),
            ]
        );
    }

    #[test]
    fn serialized_manifest_reads_back() {
        let mut files = FilesFile::new("/nd");
        files.set_path(FilesKeyword::Fluxes, "fluxes");
        files.set_xs("EAF2010").unwrap();

        let text = serialize_to_string(&files).unwrap();
        assert_eq!(
            text,
            "# index of nuclides to be included\n\
             ind_nuc /nd/EAF2010data/eaf_index_20100\n\
             # library cross section data\n\
             xs_endf /nd/EAF2010data/eaf_n_gxs_211_flt_20100\n\
             # fluxes file\n\
             fluxes fluxes\n"
        );

        let mut restored = FilesFile::new("/nd");
        restored.deserialize(&mut text.as_bytes()).unwrap();
        assert_eq!(restored, files);
    }

    #[test]
    fn deserialize_rejects_unknown_keywords_and_missing_paths() {
        let mut files = FilesFile::new("/nd");
        files.set_path(FilesKeyword::Fluxes, "fluxes");

        let unknown = files
            .deserialize(&mut "# comment\ngg_bins somewhere\n".as_bytes())
            .unwrap_err();
        assert_eq!(unknown.category(), PactErrorCategory::DeserializeFormat);
        assert!(unknown.message().contains("line 2"));

        let missing = files.deserialize(&mut "fluxes   \n".as_bytes()).unwrap_err();
        assert_eq!(missing.placeholder(), "FILES.PATH");
        assert_eq!(files.path(FilesKeyword::Fluxes), Some(Path::new("fluxes")));
    }

    #[test]
    fn json_export_uses_keyword_names() {
        let mut files = FilesFile::new("/nd");
        files.set_path(FilesKeyword::ArbFlux, PathBuf::from("arb"));
        let parsed: serde_json::Value = serde_json::from_str(&files.to_json().unwrap()).unwrap();
        assert_eq!(parsed["arb_flux"], "arb");
    }
}
