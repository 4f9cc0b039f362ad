//! Integration tests for filtered files and Ulysses exports.

mod common;

use std::fs;

use approx::assert_relative_eq;
use bigplanet::export::csv_to_map;
use bigplanet::{
    create_archive, extract_column, extract_units, filter, BplFile, BplInput, Column, Error,
    FileKind,
};
use tempfile::TempDir;

const INCLUDE: &str = "saKeyInclude earth:Obliquity:final earth:TMan:forward earth:TMan:mean sun:dMass:option\n";

fn check_filtered(file: &BplFile) {
    assert_eq!(file.kind(), FileKind::Filtered);
    assert_eq!(
        extract_column(file, "earth:Obliquity:final").unwrap(),
        Column::Numbers(vec![0.1, 0.2, 0.2, 0.4])
    );
    assert_eq!(
        extract_column(file, "sun:dMass:option").unwrap(),
        Column::Numbers(vec![1.0, 1.0, 2.0, 2.0])
    );

    let Column::Numbers(means) = extract_column(file, "earth:TMan:mean").unwrap() else {
        panic!("expected numbers");
    };
    assert_eq!(means.len(), 4);
    for (index, mean) in means.iter().enumerate() {
        let temps = common::mantle_temperatures(index);
        assert_relative_eq!(*mean, temps.iter().sum::<f64>() / temps.len() as f64);
    }
    assert_eq!(extract_units(file, "earth:TMan:mean").unwrap(), "K");

    let Column::Series(series) = extract_column(file, "earth:TMan:forward").unwrap() else {
        panic!("expected series");
    };
    assert_eq!(series[2], common::mantle_temperatures(2));
}

#[test]
fn test_filter_from_raw_data() {
    let dir = TempDir::new().unwrap();
    let input = BplInput::load(common::build_sweep(dir.path(), INCLUDE)).unwrap();

    let path = filter(&input, &common::options()).unwrap();
    assert_eq!(path, dir.path().join("sweep.bpf"));

    let file = BplFile::open(&path).unwrap();
    check_filtered(&file);
    let root = file.first_group().unwrap();
    assert_eq!(root.len(), 4);
}

#[test]
fn test_filter_from_archive() {
    let dir = TempDir::new().unwrap();
    let input = BplInput::load(common::build_sweep(dir.path(), INCLUDE)).unwrap();
    create_archive(&input, &common::options()).unwrap();

    // The archive is used even once the raw data is gone.
    fs::remove_dir_all(input.folder_path()).unwrap();

    let path = filter(&input, &common::options()).unwrap();
    check_filtered(&BplFile::open(&path).unwrap());
}

#[test]
fn test_filter_exclude_from_archive() {
    let dir = TempDir::new().unwrap();
    let input = BplInput::load(common::build_sweep(
        dir.path(),
        "saKeyExclude earth:TMan:forward\n",
    ))
    .unwrap();
    create_archive(&input, &common::options()).unwrap();

    let path = filter(&input, &common::options()).unwrap();
    let file = BplFile::open(&path).unwrap();
    let root = file.first_group().unwrap();
    assert!(!root.contains("earth:TMan:forward"));
    assert!(root.contains("earth:Obliquity:final"));
    assert!(root.contains("earth:OutputOrder"));
}

#[test]
fn test_output_exists() {
    let dir = TempDir::new().unwrap();
    let input = BplInput::load(common::build_sweep(dir.path(), INCLUDE)).unwrap();
    filter(&input, &common::options()).unwrap();

    let result = filter(&input, &common::options());
    assert!(matches!(result, Err(Error::OutputExists(_))));

    assert!(filter(&input, &common::options().with_overwrite(true)).is_ok());
}

#[test]
fn test_filter_requires_key_list() {
    let dir = TempDir::new().unwrap();
    let input = BplInput::load(common::build_sweep(dir.path(), "")).unwrap();

    let result = filter(&input, &common::options());
    assert!(matches!(result, Err(Error::InvalidInput(_))));
}

#[test]
fn test_ulysses_from_raw_data() {
    let dir = TempDir::new().unwrap();
    let extra = format!("bUlysses 1\n{}", INCLUDE);
    let input = BplInput::load(common::build_sweep(dir.path(), &extra)).unwrap();

    let path = filter(&input, &common::options()).unwrap();
    assert_eq!(path, dir.path().join("User.csv"));

    let header = fs::read_to_string(&path).unwrap();
    assert!(header.starts_with("earth:Obliquity:final[rad],"));

    let data = csv_to_map(&path, 1).unwrap();
    assert_eq!(data["earth:Obliquity:final"], vec!["0.1", "0.2", "0.2", "0.4"]);
    assert_eq!(data["earth:TMan:mean"].len(), 4);
    assert_eq!(data["earth:TMan:forward"].len(), 12);
}

#[test]
fn test_ulysses_single_simulation_from_archive() {
    let dir = TempDir::new().unwrap();
    let extra = format!("bUlysses 1\nsSimName sim_02\n{}", INCLUDE);
    let input = BplInput::load(common::build_sweep(dir.path(), &extra)).unwrap();
    create_archive(&input, &common::options()).unwrap();

    let path = filter(&input, &common::options()).unwrap();
    let data = csv_to_map(&path, 1).unwrap();
    assert_eq!(data["earth:Obliquity:final"], vec!["0.2"]);
    assert_eq!(data["sun:dMass:option"], vec!["2.0"]);
    assert_eq!(data["earth:TMan:forward"].len(), 3);
}

#[test]
fn test_filter_exclude_from_raw_data() {
    let dir = TempDir::new().unwrap();
    let input = BplInput::load(common::build_sweep(
        dir.path(),
        "saKeyExclude earth:TMan:forward\n",
    ))
    .unwrap();

    let path = filter(&input, &common::options()).unwrap();
    let file = BplFile::open(&path).unwrap();
    let root = file.first_group().unwrap();
    assert!(!root.contains("earth:TMan:forward"));
    assert!(root.contains("earth:Time:forward"));
    assert_eq!(
        extract_column(&file, "earth:Obliquity:final").unwrap(),
        Column::Numbers(vec![0.1, 0.2, 0.2, 0.4])
    );
}

#[test]
fn test_archive_still_verifies_after_filter() {
    let dir = TempDir::new().unwrap();
    let input = BplInput::load(common::build_sweep(dir.path(), INCLUDE)).unwrap();
    create_archive(&input, &common::options()).unwrap();
    assert!(BplFile::open(input.archive_path()).is_ok());

    filter(&input, &common::options()).unwrap();
    filter(&input, &common::options().with_overwrite(true)).unwrap();

    let archive = BplFile::open(input.archive_path()).unwrap();
    assert_eq!(archive.len(), 4);
    assert!(BplFile::open(input.output_path()).is_ok());
    bigplanet::delete_raw_data(&input).unwrap();
    assert!(!input.folder_path().exists());
}
