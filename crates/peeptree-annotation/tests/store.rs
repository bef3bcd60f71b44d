use std::fs;
use std::path::Path;

use peeptree_annotation::{image_path_for, AnnotationParseError, AnnotationStore, ClassList};

fn voc(path: &str, filename: &str) -> String {
    format!(
        "<annotation><filename>{filename}</filename><path>{path}</path>\
         <size><width>640</width><height>480</height><depth>3</depth></size>\
         <object><name>trunk</name><bndbox><xmin>1</xmin><ymin>2</ymin><xmax>30</xmax><ymax>40</ymax></bndbox></object>\
         </annotation>"
    )
}

fn write(dir: &Path, name: &str, body: &str) {
    fs::write(dir.join(name), body).expect("write fixture");
}

#[test]
fn lists_xml_files_sorted_and_skips_others() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "b.xml", &voc("b.jpg", "b.jpg"));
    write(dir.path(), "a.XML", &voc("a.jpg", "a.jpg"));
    write(dir.path(), "notes.txt", "ignored");
    write(dir.path(), "c.jpg", "not an image either");
    fs::create_dir(dir.path().join("nested.xml")).expect("dir");

    let store = AnnotationStore::open(dir.path()).expect("store");
    let names: Vec<String> = store
        .paths()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, ["a.XML", "b.xml"]);
    assert_eq!(store.len(), 2);
    assert_eq!(store.dir(), dir.path());
}

#[test]
fn one_bad_record_does_not_hide_the_others() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "01.xml", &voc("01.jpg", "01.jpg"));
    write(
        dir.path(),
        "02.xml",
        "<annotation><size><width>10</width><height>10</height></size></annotation>",
    );
    write(dir.path(), "03.xml", &voc("03.jpg", "03.jpg"));

    let store = AnnotationStore::open(dir.path()).expect("store");
    let results: Vec<_> = store.records().collect();
    assert_eq!(results.len(), 3);
    assert!(results[0].1.is_ok());
    assert!(matches!(
        results[1].1,
        Err(AnnotationParseError::MissingField("path"))
    ));
    let third = results[2].1.as_ref().expect("third record");
    assert_eq!(third.source_id, "03");
    assert_eq!(third.objects.len(), 1);
}

#[test]
fn missing_folder_is_an_error() {
    let dir = tempfile::tempdir().expect("tempdir");
    assert!(AnnotationStore::open(dir.path().join("missing")).is_err());
}

#[test]
fn image_path_falls_back_to_local_filename() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(
        dir.path(),
        "img.xml",
        &voc("/home/someone/elsewhere/img.jpg", "img.jpg"),
    );
    write(dir.path(), "img.jpg", "");
    write(dir.path(), "rel.xml", &voc("sub/rel.jpg", "rel.jpg"));

    let store = AnnotationStore::open(dir.path()).expect("store");
    let records: Vec<_> = store
        .records()
        .map(|(_, r)| r.expect("record"))
        .collect();

    assert_eq!(image_path_for(&records[0], dir.path()), dir.path().join("img.jpg"));
    // neither declared nor local file exists: keep the declared path
    assert_eq!(
        image_path_for(&records[1], dir.path()),
        dir.path().join("sub/rel.jpg")
    );
}

#[test]
fn classes_file_is_loaded_from_disk() {
    let dir = tempfile::tempdir().expect("tempdir");
    write(dir.path(), "predefined_classes.txt", "trunk\nbranch\n");
    let list = ClassList::load(dir.path().join("predefined_classes.txt")).expect("classes");
    assert_eq!(list.len(), 2);
    assert_eq!(list.index_of("trunk"), Some(0));
}
