use rspact_core::PactErrorCategory;
use rspact_core::input::{
    FilesFile, FilesKeyword, FluxesFile, GroupRegistry, TextSerializable, deserialize_from_path,
    serialize_to_path, standard_registry,
};
use std::fs;
use tempfile::TempDir;

#[test]
fn monoenergetic_fluxes_file_round_trips_through_disk() {
    let temp = TempDir::new().expect("tempdir should be created");
    let path = temp.path().join("fluxes");

    let mut fluxes = FluxesFile::new("14 MeV (almost) monoenergetic", 1.0).unwrap();
    fluxes.set_group(709).unwrap();
    fluxes.set_value(12.0e6, 0.1).unwrap();
    fluxes.set_value(13.0e6, 0.4).unwrap();
    fluxes.set_value(14.0e6, 1.0).unwrap();
    fluxes.validate().unwrap();
    serialize_to_path(&fluxes, &path).expect("fluxes should be written");

    let written = fs::read_to_string(&path).expect("fluxes should be readable");
    assert!(!written.ends_with('\n'));
    assert_eq!(written.lines().count(), 711);

    let mut restored = FluxesFile::default();
    deserialize_from_path(&mut restored, &path).expect("fluxes should read back");
    restored.validate().unwrap();
    assert_eq!(restored, fluxes);
    assert_eq!(restored.nonzero_bins().len(), 3);
    assert!((restored.total_flux() - 1.5).abs() < 1.0e-12);
}

#[test]
fn fluxes_written_by_other_tools_are_accepted() {
    let mut registry = GroupRegistry::new();
    registry.insert(4, vec![16.0, 8.0, 4.0, 2.0, 1.0]).unwrap();

    let source = "1.00000E+00  2.50000E-01\n 0.0  7.5D-1\n3.0\nlegacy spectrum\n";
    let mut fluxes = FluxesFile::with_registry(&registry, "", 1.0).unwrap();
    fluxes.deserialize(&mut source.as_bytes()).unwrap();

    assert_eq!(fluxes.values(), &[1.0, 0.25, 0.0, 0.75]);
    assert_eq!(fluxes.normalization(), 3.0);
    assert_eq!(fluxes.name(), "legacy spectrum");
    assert_eq!(fluxes.boundaries(), &[1.0, 2.0, 4.0, 8.0, 16.0]);
}

#[test]
fn missing_fluxes_file_is_an_io_error() {
    let temp = TempDir::new().expect("tempdir should be created");
    let mut fluxes = FluxesFile::default();
    let error = deserialize_from_path(&mut fluxes, &temp.path().join("absent")).unwrap_err();
    assert_eq!(error.category(), PactErrorCategory::Io);
}

#[test]
fn every_standard_group_survives_a_round_trip() {
    let registry = standard_registry();
    for group in registry.keys() {
        let (lower, upper) = registry.span(group).unwrap();
        let mut fluxes = FluxesFile::new(format!("group {}", group), 0.5).unwrap();
        fluxes.set_group(group).unwrap();
        fluxes.set_value(lower, 1.0).unwrap();
        fluxes.set_value(upper * 0.999, 2.0).unwrap();

        let mut text = Vec::new();
        fluxes.serialize(&mut text).unwrap();
        let mut restored = FluxesFile::default();
        restored.deserialize(&mut text.as_slice()).unwrap();
        assert_eq!(restored, fluxes, "group {}", group);
    }
}

#[test]
fn files_manifest_round_trips_through_disk() {
    let temp = TempDir::new().expect("tempdir should be created");
    let path = temp.path().join("files");

    let mut files = FilesFile::new("/opt/fispact/nuclear_data");
    files.set_xs("TENDL2015").unwrap();
    files.set_fission_yield("GEFY52").unwrap();
    files.set_prob_tab("TENDL2015").unwrap();
    files.set_decay("DECAY").unwrap();
    files.set_regulatory("DECAY").unwrap();
    files.set_gamma_absorb("DECAY").unwrap();
    files.set_path(FilesKeyword::Fluxes, "fluxes");
    serialize_to_path(&files, &path).unwrap();

    let mut restored = FilesFile::new("/opt/fispact/nuclear_data");
    deserialize_from_path(&mut restored, &path).unwrap();
    assert_eq!(restored, files);
    assert_eq!(restored.entries().count(), 11);
}
