use super::CliError;
use anyhow::Context;
use rspact_core::input::{GroupRegistry, standard_registry};
use std::borrow::Cow;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

pub(super) const NUCLEAR_DATA_ENV: &str = "NUCLEAR_DATA";

pub(super) fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    // A subscriber may already be installed when the CLI runs inside a test harness.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub(super) fn load_registry(path: Option<&Path>) -> Result<Cow<'static, GroupRegistry>, CliError> {
    match path {
        Some(path) => {
            let registry = GroupRegistry::from_path(path)?;
            debug!(
                path = %path.display(),
                structures = registry.len(),
                "using group structures from file"
            );
            Ok(Cow::Owned(registry))
        }
        None => Ok(Cow::Borrowed(standard_registry())),
    }
}

/// `--basedir`, else `$NUCLEAR_DATA`, else the filesystem root.
pub(super) fn resolve_base_dir(explicit: Option<PathBuf>) -> PathBuf {
    explicit
        .or_else(|| std::env::var_os(NUCLEAR_DATA_ENV).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(std::path::MAIN_SEPARATOR_STR))
}

pub(super) fn ensure_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Parses `energy=flux`, e.g. `14.0e6=1.0`.
pub(super) fn parse_energy_value(raw: &str) -> Result<(f64, f64), String> {
    let (energy, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected <energy>=<flux>, got '{}'", raw))?;
    let energy = energy
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("energy '{}' is not a number", energy.trim()))?;
    let value = value
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("flux '{}' is not a number", value.trim()))?;
    Ok((energy, value))
}

#[cfg(test)]
mod tests {
    use super::{ensure_parent_dir, load_registry, parse_energy_value, resolve_base_dir};
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn energy_value_pairs_parse() {
        assert_eq!(parse_energy_value("14.0e6=1.0"), Ok((14.0e6, 1.0)));
        assert_eq!(parse_energy_value(" 2 = 0.5 "), Ok((2.0, 0.5)));
        assert!(parse_energy_value("14.0e6").is_err());
        assert!(parse_energy_value("x=1").is_err());
        assert!(parse_energy_value("1=y").is_err());
    }

    #[test]
    fn explicit_base_dir_wins() {
        assert_eq!(
            resolve_base_dir(Some(PathBuf::from("/opt/nd"))),
            PathBuf::from("/opt/nd")
        );
    }

    #[test]
    fn registry_defaults_to_standard_table() {
        let registry = load_registry(None).expect("standard registry should load");
        assert!(registry.contains(709));
    }

    #[test]
    fn registry_loads_from_json_file() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("groups.json");
        fs::write(&path, r#"{"2": [3.0, 2.0, 1.0]}"#).expect("groups should be written");

        let registry = load_registry(Some(path.as_path())).expect("registry file should load");
        assert_eq!(registry.keys().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn parent_directories_are_created() {
        let temp = TempDir::new().expect("tempdir should be created");
        let path = temp.path().join("nested/dir/fluxes");
        ensure_parent_dir(&path).expect("parent should be created");
        assert!(temp.path().join("nested/dir").is_dir());
        ensure_parent_dir(&PathBuf::from("fluxes")).expect("bare file name needs no parent");
    }
}
