use super::CliError;
use super::helpers::{ensure_parent_dir, parse_energy_value, resolve_base_dir};
use rspact_core::input::{
    FilesFile, FilesKeyword, FluxesFile, GroupRegistry, deserialize_from_path, serialize_to_path,
};
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(clap::Args)]
pub(super) struct FluxesCreateArgs {
    /// Fluxes file to write
    output: PathBuf,

    /// Group structure (number of energy groups). The built-in structures are
    /// approximate equal-lethargy grids; pass --groups for library-exact bins
    #[arg(long)]
    group: usize,

    /// Spectrum name written on the last line
    #[arg(long, default_value = "fluxes")]
    name: String,

    /// Normalisation factor
    #[arg(long, default_value_t = 1.0)]
    norm: f64,

    /// Flux for the bin containing an energy in eV, as <energy>=<flux>; repeatable
    #[arg(long = "value", value_name = "energy=flux", value_parser = parse_energy_value)]
    values: Vec<(f64, f64)>,
}

#[derive(clap::Args)]
pub(super) struct FluxesInspectArgs {
    /// Fluxes file to read
    input: PathBuf,

    /// Print the spectrum as JSON
    #[arg(long)]
    json: bool,
}

#[derive(clap::Args)]
pub(super) struct FilesArgs {
    /// Files manifest to write
    output: PathBuf,

    /// Nuclear data base directory (defaults to $NUCLEAR_DATA, then the filesystem root)
    #[arg(short = 'd', long)]
    basedir: Option<PathBuf>,

    /// Cross section library
    #[arg(long, default_value = "TENDL2015")]
    xs: String,

    /// Probability table library
    #[arg(long)]
    prob_tab: Option<String>,

    /// Fission yield library
    #[arg(long)]
    fission_yield: Option<String>,

    /// Decay library, also used for regulatory and gamma absorption data
    #[arg(long, default_value = "DECAY")]
    decay: String,

    /// Fluxes file referenced by the manifest
    #[arg(long, default_value = "fluxes")]
    fluxes: PathBuf,
}

pub(super) fn run_fluxes_create_command(
    args: FluxesCreateArgs,
    registry: &GroupRegistry,
) -> Result<i32, CliError> {
    let mut fluxes = FluxesFile::with_registry(registry, args.name, args.norm)?;
    fluxes.set_group(args.group)?;
    for (energy, value) in args.values {
        fluxes.set_value(energy, value)?;
    }
    fluxes.validate()?;
    if registry.is_approximate(args.group) {
        warn!(
            group = args.group,
            "binning on an approximate built-in group structure, pass --groups for exact bins"
        );
    }

    ensure_parent_dir(&args.output)?;
    serialize_to_path(&fluxes, &args.output)?;
    info!(
        path = %args.output.display(),
        group = fluxes.group_count(),
        "wrote fluxes file"
    );
    println!(
        "Wrote {} group fluxes '{}' to {}",
        fluxes.group_count(),
        fluxes.name(),
        args.output.display()
    );
    Ok(0)
}

pub(super) fn run_fluxes_inspect_command(
    args: FluxesInspectArgs,
    registry: &GroupRegistry,
) -> Result<i32, CliError> {
    let mut fluxes = FluxesFile::with_registry(registry, "", 1.0)?;
    deserialize_from_path(&mut fluxes, &args.input)?;
    fluxes.validate()?;
    info!(path = %args.input.display(), "read fluxes file");

    if args.json {
        println!("{}", fluxes.to_json()?);
        return Ok(0);
    }

    println!("Name: {}", fluxes.name());
    println!("Groups: {}", fluxes.group_count());
    println!("Normalisation: {:e}", fluxes.normalization());
    println!("Total flux: {:e}", fluxes.total_flux());
    let bins = fluxes.nonzero_bins();
    println!("Non-zero bins: {}", bins.len());
    for bin in bins {
        println!(
            "  {:>5}  [{:.6e}, {:.6e}) eV  {:e}",
            bin.index, bin.lower, bin.upper, bin.value
        );
    }
    Ok(0)
}

pub(super) fn run_files_command(args: FilesArgs) -> Result<i32, CliError> {
    let base_dir = resolve_base_dir(args.basedir);
    let mut files = FilesFile::new(base_dir);
    files.set_xs(&args.xs)?;
    if let Some(library) = args.prob_tab.as_deref() {
        files.set_prob_tab(library)?;
    }
    if let Some(library) = args.fission_yield.as_deref() {
        files.set_fission_yield(library)?;
    }
    files.set_decay(&args.decay)?;
    files.set_regulatory(&args.decay)?;
    files.set_gamma_absorb(&args.decay)?;
    files.set_path(FilesKeyword::Fluxes, args.fluxes);

    let invalid = files.invalid_paths();
    for (keyword, path) in &invalid {
        warn!(
            keyword = %keyword,
            path = %path.display(),
            "missing file referenced by files manifest"
        );
    }

    ensure_parent_dir(&args.output)?;
    serialize_to_path(&files, &args.output)?;
    info!(
        path = %args.output.display(),
        base_dir = %files.base_dir().display(),
        "wrote files manifest"
    );
    println!(
        "Wrote files manifest with {} entries to {} ({} missing)",
        files.entries().count(),
        args.output.display(),
        invalid.len()
    );
    Ok(0)
}

pub(super) fn run_groups_command(registry: &GroupRegistry) -> Result<i32, CliError> {
    for group in registry.keys() {
        if let Some((lower, upper)) = registry.span(group) {
            let note = if registry.is_approximate(group) {
                "  (approximate)"
            } else {
                ""
            };
            println!(
                "{:>5} groups  {:.4e} - {:.4e} eV{}",
                group, lower, upper, note
            );
        }
    }
    Ok(0)
}
