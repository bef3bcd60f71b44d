//! Pascal VOC annotation parsing.

use std::fs;
use std::path::Path;

use peeptree_core::{BoundingBox, ImageSize};
use roxmltree::{Document, Node};
use serde::{Deserialize, Serialize};

#[cfg(feature = "tracing")]
use tracing::instrument;

use crate::AnnotationParseError;

/// One annotated image.
///
/// Box coordinates are in original-image pixels.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// Annotation file stem, used to name the tiles of this image.
    pub source_id: String,
    /// Declared original image size (`size/width`, `size/height`).
    pub size: ImageSize,
    /// Source image location (`path`).
    pub path: String,
    /// Source image file name (`filename`), if present.
    #[serde(default)]
    pub filename: Option<String>,
    pub objects: Vec<BoundingBox>,
}

impl AnnotationRecord {
    /// Read and parse an annotation file; `source_id` is the file stem.
    #[cfg_attr(
        feature = "tracing",
        instrument(level = "trace", skip_all, fields(path = %path.as_ref().display()))
    )]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AnnotationParseError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| AnnotationParseError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let source_id = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::parse_str(&raw, source_id)
    }

    /// Parse VOC XML text.
    pub fn parse_str(
        xml: &str,
        source_id: impl Into<String>,
    ) -> Result<Self, AnnotationParseError> {
        let doc = Document::parse(xml)?;
        let root = doc.root_element();

        let width = parse_required_u32(root, &["size", "width"], "size/width")?;
        let height = parse_required_u32(root, &["size", "height"], "size/height")?;
        let size = ImageSize::new(width, height)?;

        let path = text_at(root, &["path"])
            .filter(|p| !p.is_empty())
            .ok_or(AnnotationParseError::MissingField("path"))?
            .to_string();
        let filename = text_at(root, &["filename"])
            .filter(|f| !f.is_empty())
            .map(str::to_string);

        let objects = root
            .children()
            .filter(|n| n.has_tag_name("object"))
            .enumerate()
            .map(|(index, node)| parse_object(index, node))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            source_id: source_id.into(),
            size,
            path,
            filename,
            objects,
        })
    }
}

fn parse_object(index: usize, node: Node<'_, '_>) -> Result<BoundingBox, AnnotationParseError> {
    let label = text_at(node, &["name"])
        .filter(|n| !n.is_empty())
        .ok_or(AnnotationParseError::MissingField("object/name"))?
        .to_string();

    let xmin = parse_coord(node, "xmin", "object/bndbox/xmin")?;
    let ymin = parse_coord(node, "ymin", "object/bndbox/ymin")?;
    let xmax = parse_coord(node, "xmax", "object/bndbox/xmax")?;
    let ymax = parse_coord(node, "ymax", "object/bndbox/ymax")?;

    let b = BoundingBox::new(label, xmin, ymin, xmax, ymax);
    if !b.has_positive_extent() {
        return Err(AnnotationParseError::InvalidBox {
            index,
            label: b.label,
            xmin,
            ymin,
            xmax,
            ymax,
        });
    }
    Ok(b)
}

fn child<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.children().find(|n| n.has_tag_name(name))
}

fn text_at<'a>(node: Node<'a, '_>, path: &[&str]) -> Option<&'a str> {
    let mut cur = node;
    for name in path {
        cur = child(cur, name)?;
    }
    Some(cur.text().unwrap_or("").trim())
}

/// Non-negative integer field.
///
/// LabelImg sometimes writes `"12.0"`; a fractional part is accepted only when
/// it is all zeros. Signs, exponents and real fractions are rejected.
fn parse_non_negative(field: &str, text: &str) -> Result<i64, AnnotationParseError> {
    let invalid = || AnnotationParseError::InvalidNumber {
        field: field.to_string(),
        value: text.to_string(),
    };
    let (int, frac) = text.split_once('.').unwrap_or((text, ""));
    if int.is_empty()
        || !int.bytes().all(|b| b.is_ascii_digit())
        || !frac.bytes().all(|b| b == b'0')
    {
        return Err(invalid());
    }
    int.parse::<i64>().map_err(|_| invalid())
}

fn parse_required_u32(
    node: Node<'_, '_>,
    path: &[&str],
    field: &'static str,
) -> Result<u32, AnnotationParseError> {
    let text = text_at(node, path).ok_or(AnnotationParseError::MissingField(field))?;
    let value = parse_non_negative(field, text)?;
    u32::try_from(value).map_err(|_| AnnotationParseError::InvalidNumber {
        field: field.to_string(),
        value: text.to_string(),
    })
}

fn parse_coord(
    object: Node<'_, '_>,
    name: &str,
    field: &'static str,
) -> Result<i32, AnnotationParseError> {
    let text = text_at(object, &["bndbox", name]).ok_or(AnnotationParseError::MissingField(field))?;
    let value = parse_non_negative(field, text)?;
    i32::try_from(value).map_err(|_| AnnotationParseError::InvalidNumber {
        field: field.to_string(),
        value: text.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const LABELIMG_XML: &str = r#"<annotation>
	<folder>OriginalImages</folder>
	<filename>DJI_0042.JPG</filename>
	<path>/data/OriginalImages/DJI_0042.JPG</path>
	<source><database>Unknown</database></source>
	<size>
		<width>640</width>
		<height>480</height>
		<depth>3</depth>
	</size>
	<segmented>0</segmented>
	<object>
		<name>trunk</name>
		<pose>Unspecified</pose>
		<truncated>0</truncated>
		<difficult>0</difficult>
		<bndbox>
			<xmin>100</xmin>
			<ymin>100</ymin>
			<xmax>300</xmax>
			<ymax>300</ymax>
		</bndbox>
	</object>
	<object>
		<name> trunk </name>
		<bndbox>
			<xmin>10.0</xmin>
			<ymin>12</ymin>
			<xmax>40</xmax>
			<ymax>90</ymax>
		</bndbox>
	</object>
</annotation>"#;

    #[test]
    fn parses_labelimg_record() {
        let rec = AnnotationRecord::parse_str(LABELIMG_XML, "DJI_0042").expect("parse");
        assert_eq!(rec.source_id, "DJI_0042");
        assert_eq!(rec.size, ImageSize::new(640, 480).unwrap());
        assert_eq!(rec.path, "/data/OriginalImages/DJI_0042.JPG");
        assert_eq!(rec.filename.as_deref(), Some("DJI_0042.JPG"));
        assert_eq!(
            rec.objects,
            vec![
                BoundingBox::new("trunk", 100, 100, 300, 300),
                BoundingBox::new("trunk", 10, 12, 40, 90),
            ]
        );
    }

    #[test]
    fn missing_path_is_reported() {
        let xml = LABELIMG_XML.replace("<path>/data/OriginalImages/DJI_0042.JPG</path>", "");
        let err = AnnotationRecord::parse_str(&xml, "x").unwrap_err();
        assert!(matches!(err, AnnotationParseError::MissingField("path")));
    }

    #[test]
    fn missing_size_is_reported() {
        let xml = r#"<annotation><path>a.jpg</path></annotation>"#;
        let err = AnnotationRecord::parse_str(xml, "x").unwrap_err();
        assert!(matches!(err, AnnotationParseError::MissingField("size/width")));
    }

    #[test]
    fn zero_size_is_rejected() {
        let xml = r#"<annotation><path>a.jpg</path><size><width>0</width><height>10</height></size></annotation>"#;
        let err = AnnotationRecord::parse_str(xml, "x").unwrap_err();
        assert!(matches!(err, AnnotationParseError::InvalidSize(_)));
    }

    #[test]
    fn unparsable_coordinate_is_reported() {
        let xml = LABELIMG_XML.replace("<xmax>300</xmax>", "<xmax>lots</xmax>");
        let err = AnnotationRecord::parse_str(&xml, "x").unwrap_err();
        match err {
            AnnotationParseError::InvalidNumber { field, value } => {
                assert_eq!(field, "object/bndbox/xmax");
                assert_eq!(value, "lots");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn negative_and_inverted_boxes_are_rejected() {
        let xml = LABELIMG_XML.replace("<xmin>100</xmin>", "<xmin>-3</xmin>");
        assert!(matches!(
            AnnotationRecord::parse_str(&xml, "x"),
            Err(AnnotationParseError::InvalidNumber { .. })
        ));

        let xml = LABELIMG_XML.replace("<xmin>100</xmin>", "<xmin>300</xmin>");
        match AnnotationRecord::parse_str(&xml, "x") {
            Err(AnnotationParseError::InvalidBox { index, label, .. }) => {
                assert_eq!(index, 0);
                assert_eq!(label, "trunk");
            }
            other => panic!("unexpected result {other:?}"),
        }
    }

    #[test]
    fn only_whole_number_coordinates_are_accepted() {
        for ok in ["12", "12.0", "12.000"] {
            let xml = LABELIMG_XML.replace("<ymin>12</ymin>", &format!("<ymin>{ok}</ymin>"));
            let rec = AnnotationRecord::parse_str(&xml, "x").expect(ok);
            assert_eq!(rec.objects[1].ymin, 12);
        }
        for bad in ["12.9", "-0.4", "1e3", "+12", ".5", "0x10"] {
            let xml = LABELIMG_XML.replace("<ymin>12</ymin>", &format!("<ymin>{bad}</ymin>"));
            match AnnotationRecord::parse_str(&xml, "x") {
                Err(AnnotationParseError::InvalidNumber { field, value }) => {
                    assert_eq!(field, "object/bndbox/ymin");
                    assert_eq!(value, bad);
                }
                other => panic!("{bad}: unexpected result {other:?}"),
            }
        }
    }

    #[test]
    fn record_without_objects_is_valid() {
        let xml = r#"<annotation><path>a.jpg</path><size><width>64</width><height>48</height></size></annotation>"#;
        let rec = AnnotationRecord::parse_str(xml, "empty").expect("parse");
        assert!(rec.objects.is_empty());
        assert_eq!(rec.filename, None);
    }

    #[test]
    fn broken_xml_is_reported() {
        let err = AnnotationRecord::parse_str("<annotation><size>", "x").unwrap_err();
        assert!(matches!(err, AnnotationParseError::Xml(_)));
    }
}
