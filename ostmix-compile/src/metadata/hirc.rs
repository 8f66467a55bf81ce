//! Object database dump parser
//!
//! Every object element (at any depth) is a candidate record. A field value is
//! taken from the first descendant field element carrying the requested name,
//! so an object nested inside another contributes to both.

use super::LoopMetadataRecord;
use crate::error::{Error, Result};
use ostmix_common::config::HircLayout;
use roxmltree::{Document, Node, ParsingOptions};
use std::path::Path;

/// Parse one dump into `(source id, record)` pairs
///
/// Objects without a source id or without a begin-trim field do not describe
/// loop points and are skipped. An object that has a begin-trim field but is
/// missing the other timing fields is an incomplete record and fails the load.
pub fn parse_database(
    path: &Path,
    text: &str,
    layout: &HircLayout,
) -> Result<Vec<(String, LoopMetadataRecord)>> {
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(text, options)
        .map_err(|e| Error::metadata(path, e.to_string()))?;

    let mut records = Vec::new();
    for obj in doc
        .descendants()
        .filter(|n| n.is_element() && n.tag_name().name() == layout.object_tag)
    {
        let Some(source_id) = field_value(obj, layout, &layout.source_id_field) else {
            continue;
        };
        let Some(begin) = field_value(obj, layout, &layout.begin_trim_field) else {
            continue;
        };

        let begin = parse_number(path, source_id, &layout.begin_trim_field, begin)?;
        let end = required_number(path, obj, layout, source_id, &layout.end_trim_field)?;
        let src_duration =
            required_number(path, obj, layout, source_id, &layout.src_duration_field)?;

        records.push((
            source_id.to_string(),
            LoopMetadataRecord::new(begin, end, src_duration),
        ));
    }

    Ok(records)
}

fn field_value<'a, 'input>(
    obj: Node<'a, 'input>,
    layout: &HircLayout,
    name: &str,
) -> Option<&'a str> {
    obj.descendants()
        .find(|n| {
            n.is_element()
                && n.tag_name().name() == layout.field_tag
                && n.attribute(layout.name_attr.as_str()) == Some(name)
        })
        .and_then(|n| n.attribute(layout.value_attr.as_str()))
}

fn required_number(
    path: &Path,
    obj: Node<'_, '_>,
    layout: &HircLayout,
    source_id: &str,
    name: &str,
) -> Result<f64> {
    let value = field_value(obj, layout, name).ok_or_else(|| {
        Error::metadata(
            path,
            format!("incomplete record for source {}: missing {}", source_id, name),
        )
    })?;
    parse_number(path, source_id, name, value)
}

fn parse_number(path: &Path, source_id: &str, name: &str, value: &str) -> Result<f64> {
    value.trim().parse::<f64>().map_err(|_| {
        Error::metadata(
            path,
            format!(
                "invalid {} value {:?} for source {}",
                name, value, source_id
            ),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<Vec<(String, LoopMetadataRecord)>> {
        parse_database(Path::new("test.xml"), text, &HircLayout::default())
    }

    #[test]
    fn test_parses_loop_record() {
        let records = parse(
            r#"<root><obj na="CAkSound">
                 <fld na="sourceID" va="217525265"/>
                 <fld na="fBeginTrimOffset" va="12500.5"/>
                 <fld na="fEndTrimOffset" va="-1500"/>
                 <fld na="fSrcDuration" va="90000"/>
               </obj></root>"#,
        )
        .unwrap();

        assert_eq!(
            records,
            vec![(
                "217525265".to_string(),
                LoopMetadataRecord::new(12500.5, -1500.0, 90000.0)
            )]
        );
    }

    #[test]
    fn test_fields_may_be_nested_deeper() {
        let records = parse(
            r#"<root><obj>
                 <lst><obj na="AkBankSourceData">
                   <fld na="sourceID" va="7"/>
                 </obj></lst>
                 <obj na="TrimInfo">
                   <fld na="fBeginTrimOffset" va="0"/>
                   <fld na="fEndTrimOffset" va="0"/>
                   <fld na="fSrcDuration" va="1000"/>
                 </obj>
               </obj></root>"#,
        )
        .unwrap();

        // Only the outer object sees both the id and the trim fields
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].0, "7");
    }

    #[test]
    fn test_object_without_begin_trim_is_skipped() {
        let records = parse(
            r#"<root><obj>
                 <fld na="sourceID" va="1"/>
                 <fld na="fSrcDuration" va="1000"/>
               </obj></root>"#,
        )
        .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_object_without_source_id_is_skipped() {
        let records = parse(
            r#"<root><obj>
                 <fld na="fBeginTrimOffset" va="0"/>
                 <fld na="fEndTrimOffset" va="0"/>
                 <fld na="fSrcDuration" va="1000"/>
               </obj></root>"#,
        )
        .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_incomplete_record_fails() {
        let result = parse(
            r#"<root><obj>
                 <fld na="sourceID" va="1"/>
                 <fld na="fBeginTrimOffset" va="0"/>
                 <fld na="fSrcDuration" va="1000"/>
               </obj></root>"#,
        );
        match result {
            Err(Error::MetadataLoad { reason, .. }) => {
                assert!(reason.contains("fEndTrimOffset"), "got: {}", reason)
            }
            other => panic!("expected MetadataLoad error, got {:?}", other),
        }
    }

    #[test]
    fn test_non_numeric_value_fails() {
        let result = parse(
            r#"<root><obj>
                 <fld na="sourceID" va="1"/>
                 <fld na="fBeginTrimOffset" va="soon"/>
                 <fld na="fEndTrimOffset" va="0"/>
                 <fld na="fSrcDuration" va="1000"/>
               </obj></root>"#,
        );
        assert!(matches!(result, Err(Error::MetadataLoad { .. })));
    }

    #[test]
    fn test_custom_layout() {
        let layout = HircLayout {
            object_tag: "object".to_string(),
            field_tag: "field".to_string(),
            name_attr: "name".to_string(),
            value_attr: "value".to_string(),
            source_id_field: "ulSourceID".to_string(),
            ..HircLayout::default()
        };
        let records = parse_database(
            Path::new("custom.xml"),
            r#"<dump><object>
                 <field name="ulSourceID" value="42"/>
                 <field name="fBeginTrimOffset" value="100"/>
                 <field name="fEndTrimOffset" value="200"/>
                 <field name="fSrcDuration" value="300"/>
               </object></dump>"#,
            &layout,
        )
        .unwrap();
        assert_eq!(records[0], ("42".to_string(), LoopMetadataRecord::new(100.0, 200.0, 300.0)));
    }

    #[test]
    fn test_unparsable_xml_fails() {
        assert!(matches!(parse("<root>"), Err(Error::MetadataLoad { .. })));
    }
}
