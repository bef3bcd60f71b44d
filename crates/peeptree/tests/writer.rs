#![cfg(feature = "image")]

use std::fs;
use std::path::Path;

use image::{Rgb, RgbImage};
use peeptree::writer::{ImageTileWriter, ManifestEntry, MANIFEST_FILE};
use peeptree::{BlockLabel, SkipStage, TileParams, TrainingDataGenerator};

fn write_record(dir: &Path, id: &str, image: &str) {
    let xml = format!(
        "<annotation><filename>{image}</filename><path>{image}</path>\
         <size><width>640</width><height>480</height><depth>3</depth></size>\
         <object><name>trunk</name><bndbox><xmin>100</xmin><ymin>100</ymin>\
         <xmax>300</xmax><ymax>300</ymax></bndbox></object></annotation>"
    );
    fs::write(dir.join(format!("{id}.xml")), xml).expect("xml");
}

#[test]
fn writes_tiles_manifest_and_overlay() {
    let src = tempfile::tempdir().expect("src");
    let out = tempfile::tempdir().expect("out");
    let overlay = out.path().join("overlay");

    RgbImage::from_pixel(640, 480, Rgb([90, 60, 30]))
        .save(src.path().join("a.png"))
        .expect("png");
    fs::write(src.path().join("predefined_classes.txt"), "trunk\n").expect("classes");
    write_record(src.path(), "a", "a.png");
    write_record(src.path(), "b", "missing.png");

    let params = TileParams::default();
    let generator = TrainingDataGenerator::new(src.path(), params.clone()).expect("generator");
    let mut writer = ImageTileWriter::new(out.path(), params.resize)
        .expect("writer")
        .with_overlay(&overlay)
        .expect("overlay");
    let report = generator.run(&mut writer).expect("run");

    assert_eq!(report.records_seen, 2);
    assert_eq!(report.records_mapped, 1);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.skipped[0].file, "b.xml");
    assert_eq!(report.skipped[0].stage, SkipStage::ImageLoad);
    assert_eq!(report.positive_tiles, 48);
    assert_eq!(report.background_tiles, 1);

    let count = |label: &str| fs::read_dir(out.path().join(label)).expect("dir").count();
    assert_eq!(count("positive"), 48);
    assert_eq!(count("background"), 1);

    let corner = image::open(out.path().join("background/a_r3_c3.png"))
        .expect("corner tile")
        .to_rgb8();
    assert_eq!(corner.dimensions(), (15, 15));

    let manifest: Vec<ManifestEntry> =
        serde_json::from_str(&fs::read_to_string(out.path().join(MANIFEST_FILE)).expect("read"))
            .expect("manifest");
    assert_eq!(manifest.len(), 49);
    assert_eq!(manifest.len(), writer.manifest().len());
    assert!(manifest.iter().all(|e| e.source_id == "a"));
    let positive = manifest
        .iter()
        .find(|e| e.label == BlockLabel::Positive)
        .expect("positive entry");
    assert_eq!(positive.class_name.as_deref(), Some("trunk"));
    assert_eq!(positive.class_id, Some(0));

    let overlay_img = image::open(overlay.join("a.png")).expect("overlay").to_rgb8();
    assert_eq!(overlay_img.dimensions(), (320, 240));
    assert!(!overlay.join("b.png").exists());
}

#[test]
fn empty_folder_still_writes_a_manifest() {
    let src = tempfile::tempdir().expect("src");
    let out = tempfile::tempdir().expect("out");
    let params = TileParams::default();
    let generator = TrainingDataGenerator::new(src.path(), params.clone()).expect("generator");
    let mut writer = ImageTileWriter::new(out.path().join("tiles"), params.resize).expect("writer");

    let report = generator.run(&mut writer).expect("run");
    assert_eq!(report.records_seen, 0);
    let manifest = fs::read_to_string(out.path().join("tiles").join(MANIFEST_FILE)).expect("read");
    assert_eq!(manifest.trim(), "[]");
}
