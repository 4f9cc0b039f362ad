//! Integration tests for extraction, matrices and exports on a real archive.

mod common;

use std::fs;

use bigplanet::export::csv_to_map;
use bigplanet::store::{compact, ArchiveWriter};
use bigplanet::{
    archive_to_csv, columns_to_json, create_archive, create_matrix, delete_raw_data,
    extract_column, extract_unique_values, list_datasets, write_output, BplFile, BplInput, Error,
    JsonFormat, OutputOptions,
};
use tempfile::TempDir;

fn archived(dir: &TempDir) -> (BplInput, BplFile) {
    let input = BplInput::load(common::build_sweep(dir.path(), "")).unwrap();
    create_archive(&input, &common::options()).unwrap();
    let file = BplFile::open(input.archive_path()).unwrap();
    (input, file)
}

#[test]
fn test_contour_matrix() {
    let dir = TempDir::new().unwrap();
    let (_, file) = archived(&dir);

    let x = extract_unique_values(&file, "earth:dObliquity:option").unwrap();
    let y = extract_unique_values(&file, "sun:dMass:option").unwrap();
    let z = extract_column(&file, "earth:Obliquity:final").unwrap().numbers();
    assert_eq!(x, common::OBLIQUITIES.to_vec());
    assert_eq!(y, common::SUN_MASSES.to_vec());

    let matrix = create_matrix(&x, &y, &z, 0).unwrap();
    assert_eq!(matrix, vec![vec![0.1, 0.2], vec![0.2, 0.4]]);

    let rotated = create_matrix(&x, &y, &z, 2).unwrap();
    assert_eq!(rotated, vec![vec![0.4, 0.2], vec![0.2, 0.1]]);

    assert!(matches!(
        create_matrix(&x, &y, &z[..3], 0),
        Err(Error::ShapeMismatch { expected: 4, actual: 3 })
    ));
}

#[test]
fn test_list_datasets() {
    let dir = TempDir::new().unwrap();
    let (_, file) = archived(&dir);

    let names = list_datasets(&file);
    for name in [
        "earth:Obliquity:initial",
        "earth:Obliquity:final",
        "earth:OutputOrder",
        "earth:TMan:forward",
        "earth:TMan:stddev",
        "earth:Time:mode",
        "sun:Mass:final",
        "system:Age:final",
        "vpl:sSystemName:option",
    ] {
        assert!(names.iter().any(|n| n == name), "missing {}", name);
    }
}

#[test]
fn test_write_output_and_bptocsv() {
    let dir = TempDir::new().unwrap();
    let (_, file) = archived(&dir);
    let keys = ["earth:Obliquity:final", "earth:TMan:min"];

    let out = dir.path().join("columns.txt");
    write_output(&file, &keys, &OutputOptions::new(&out).with_delimiter("\t")).unwrap();
    let content = fs::read_to_string(&out).unwrap();
    assert_eq!(content.lines().next(), Some("0.1\t2800.0"));
    assert_eq!(content.lines().count(), 4);

    let csv = dir.path().join("User.csv");
    archive_to_csv(&file, &keys, &csv, None).unwrap();
    let data = csv_to_map(&csv, 1).unwrap();
    assert_eq!(data["earth:TMan:min"], vec!["2800.0"; 4]);
}

#[test]
fn test_write_output_filtered_file() {
    let dir = TempDir::new().unwrap();
    let (_, file) = archived(&dir);

    let out = dir.path().join("subset.bpf");
    let path = write_output(&file, &["earth:TMan:max"], &OutputOptions::new(&out)).unwrap();
    let subset = BplFile::open(path).unwrap();
    assert!(!subset.is_archive());
    assert_eq!(
        extract_column(&subset, "earth:TMan:max").unwrap().numbers(),
        vec![3000.0; 4]
    );
}

#[test]
fn test_json_export() {
    let dir = TempDir::new().unwrap();
    let (_, file) = archived(&dir);

    let json = columns_to_json(&file, &["sun:dMass:option"], JsonFormat::Compact).unwrap();
    assert_eq!(
        json,
        r#"[{"key":"sun:dMass:option","units":"nd","values":[1.0,1.0,2.0,2.0]}]"#
    );
}

#[test]
fn test_compact_after_resume() {
    let dir = TempDir::new().unwrap();
    let (input, _) = archived(&dir);
    let path = input.archive_path();

    let mut writer = ArchiveWriter::open(&path).unwrap();
    assert!(writer.delete_group("sim_00").unwrap());
    writer.finish().unwrap();

    let before = fs::metadata(&path).unwrap().len();
    let reclaimed = compact(&path).unwrap();
    assert!(reclaimed > 0);
    assert_eq!(fs::metadata(&path).unwrap().len(), before - reclaimed);

    let file = BplFile::open(&path).unwrap();
    assert_eq!(file.groups(), vec!["sim_01", "sim_02", "sim_03"]);
}

#[test]
fn test_delete_raw_data() {
    let dir = TempDir::new().unwrap();
    let (input, _) = archived(&dir);
    fs::write(input.marker_path(), "").unwrap();

    delete_raw_data(&input).unwrap();
    assert!(!input.folder_path().exists());
    assert!(!input.marker_path().exists());
    assert!(input.archive_path().is_file());
}

#[test]
fn test_delete_raw_data_requires_archive() {
    let dir = TempDir::new().unwrap();
    let input = BplInput::load(common::build_sweep(dir.path(), "")).unwrap();

    assert!(matches!(delete_raw_data(&input), Err(Error::InvalidInput(_))));
    assert!(input.folder_path().exists());
}
