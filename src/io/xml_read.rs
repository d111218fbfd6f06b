//! Reader for analytics report definitions stored as XML.
//!
//! Columns and filters carry their expressions in `sawx:expr` elements typed
//! `sawx:sqlExpression`; the subject area of the `saw:criteria` element is the
//! report's data source.

use std::fs;
use std::path::Path;

use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};
use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};

use crate::error::{Result, ToolError};
use crate::model::{ExtractedReport, normalize_identifier};

pub const REPORT_NS: &str = "com.siebel.analytics.web/report/v1.1";
pub const EXPRESSION_NS: &str = "com.siebel.analytics.web/expression/v1.1";
pub const INSTANCE_NS: &str = "http://www.w3.org/2001/XMLSchema-instance";

const SQL_EXPRESSION_TYPE: &str = "sawx:sqlExpression";
const SUBJECT_AREA_ATTR: &[u8] = b"subjectArea";
/// Bytes searched for the XML declaration.
const DECLARATION_WINDOW: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ElementKind {
    Criteria,
    Column,
    Filter,
    Expr,
    Other,
}

impl ElementKind {
    fn classify(namespace: &ResolveResult, local_name: &[u8]) -> Self {
        let uri = match namespace {
            ResolveResult::Bound(Namespace(uri)) => *uri,
            _ => return ElementKind::Other,
        };

        match (uri, local_name) {
            (uri, b"criteria") if uri == REPORT_NS.as_bytes() => ElementKind::Criteria,
            (uri, b"column") if uri == REPORT_NS.as_bytes() => ElementKind::Column,
            (uri, b"filter") if uri == REPORT_NS.as_bytes() => ElementKind::Filter,
            (uri, b"expr") if uri == EXPRESSION_NS.as_bytes() => ElementKind::Expr,
            _ => ElementKind::Other,
        }
    }
}

/// Expression element whose leading text is being collected.
struct Capture {
    in_column: bool,
    in_filter: bool,
    text: Option<String>,
}

#[derive(Default)]
struct Collector {
    depth: usize,
    column_depth: usize,
    filter_depth: usize,
    criteria: Option<Option<String>>,
    capture: Option<Capture>,
    fields: Vec<String>,
    filters: Vec<String>,
}

impl Collector {
    fn finish_capture(&mut self, path: &Path) -> Result<()> {
        let Some(capture) = self.capture.take() else {
            return Ok(());
        };
        let text = capture
            .text
            .ok_or_else(|| ToolError::malformed(path, "SQL expression element has no text"))?;
        let value = normalize_identifier(&text);
        if capture.in_column {
            self.fields.push(value.clone());
        }
        if capture.in_filter {
            self.filters.push(value);
        }
        Ok(())
    }

    fn push_text(&mut self, text: &str) {
        if let Some(capture) = self.capture.as_mut() {
            capture.text.get_or_insert_with(String::new).push_str(text);
        }
    }
}

/// Extracts column expressions, filter expressions and the subject area from
/// a report definition.
///
/// A document without a `saw:criteria` element, or whose criteria lacks a
/// `subjectArea` attribute, is rejected as malformed.
pub fn extract(path: &Path) -> Result<ExtractedReport> {
    let bytes = fs::read(path)?;
    let source = decode_document(&bytes, path)?;
    let mut reader = NsReader::from_str(&source);
    reader.config_mut().trim_text(false);

    let mut collector = Collector::default();

    loop {
        let (namespace, event) = reader
            .read_resolved_event()
            .map_err(|err| ToolError::malformed(path, err))?;
        let kind = match &event {
            Event::Start(element) | Event::Empty(element) => {
                ElementKind::classify(&namespace, element.local_name().as_ref())
            }
            Event::End(element) => ElementKind::classify(&namespace, element.local_name().as_ref()),
            _ => ElementKind::Other,
        };

        match event {
            Event::Start(element) => {
                collector.finish_capture(path)?;
                collector.depth += 1;
                open_element(&reader, &mut collector, kind, &element, path)?;
                match kind {
                    ElementKind::Column => collector.column_depth += 1,
                    ElementKind::Filter => collector.filter_depth += 1,
                    _ => {}
                }
            }
            Event::Empty(element) => {
                collector.finish_capture(path)?;
                collector.depth += 1;
                open_element(&reader, &mut collector, kind, &element, path)?;
                collector.depth -= 1;
                collector.finish_capture(path)?;
            }
            Event::End(_) => {
                collector.finish_capture(path)?;
                collector.depth = collector.depth.saturating_sub(1);
                match kind {
                    ElementKind::Column => {
                        collector.column_depth = collector.column_depth.saturating_sub(1)
                    }
                    ElementKind::Filter => {
                        collector.filter_depth = collector.filter_depth.saturating_sub(1)
                    }
                    _ => {}
                }
            }
            Event::Text(text) => {
                let text = text
                    .unescape()
                    .map_err(|err| ToolError::malformed(path, err))?;
                collector.push_text(&text);
            }
            Event::CData(data) => {
                collector.push_text(&String::from_utf8_lossy(&data));
            }
            Event::Eof => break,
            _ => {}
        }
    }
    collector.finish_capture(path)?;

    let subject_area = match collector.criteria {
        Some(Some(subject_area)) => subject_area,
        Some(None) => {
            return Err(ToolError::malformed(
                path,
                "saw:criteria element has no subjectArea attribute",
            ));
        }
        None => return Err(ToolError::malformed(path, "missing saw:criteria element")),
    };

    Ok(ExtractedReport {
        field_identifiers: collector.fields,
        filter_expressions: collector.filters,
        data_sources: vec![normalize_identifier(&subject_area)],
    })
}

/// Decodes the raw document to UTF-8 following its byte order mark, the
/// UTF-16 signature of `<?`, or the `encoding` of its XML declaration.
fn decode_document(bytes: &[u8], path: &Path) -> Result<String> {
    let (encoding, body) = match Encoding::for_bom(bytes) {
        Some((encoding, bom_len)) => (encoding, &bytes[bom_len..]),
        None if bytes.starts_with(&[0x3C, 0x00, 0x3F, 0x00]) => (UTF_16LE, bytes),
        None if bytes.starts_with(&[0x00, 0x3C, 0x00, 0x3F]) => (UTF_16BE, bytes),
        None => (declared_encoding(bytes, path)?, bytes),
    };

    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .map(|text| text.into_owned())
        .ok_or_else(|| {
            ToolError::malformed(path, format!("invalid {} byte sequence", encoding.name()))
        })
}

fn declared_encoding(bytes: &[u8], path: &Path) -> Result<&'static Encoding> {
    if !bytes.starts_with(b"<?xml") {
        return Ok(UTF_8);
    }
    let window = &bytes[..bytes.len().min(DECLARATION_WINDOW)];
    let Some(end) = window.windows(2).position(|pair| pair == b"?>") else {
        return Ok(UTF_8);
    };
    let declaration = String::from_utf8_lossy(&window[..end]);

    let Some(label) = declaration_attribute(&declaration, "encoding") else {
        return Ok(UTF_8);
    };
    Encoding::for_label(label.as_bytes())
        .ok_or_else(|| ToolError::malformed(path, format!("unsupported encoding '{label}'")))
}

fn declaration_attribute<'a>(declaration: &'a str, name: &str) -> Option<&'a str> {
    let start = declaration.find(name)? + name.len();
    let rest = declaration[start..].trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|ch| *ch == '"' || *ch == '\'')?;
    let value = &rest[1..];
    value.find(quote).map(|end| &value[..end])
}

fn open_element(
    reader: &NsReader<&[u8]>,
    collector: &mut Collector,
    kind: ElementKind,
    element: &BytesStart,
    path: &Path,
) -> Result<()> {
    match kind {
        ElementKind::Criteria if collector.criteria.is_none() && collector.depth > 1 => {
            collector.criteria = Some(attribute(element, path, SUBJECT_AREA_ATTR)?);
        }
        ElementKind::Expr if collector.column_depth > 0 || collector.filter_depth > 0 => {
            if is_sql_expression(reader, element, path)? {
                collector.capture = Some(Capture {
                    in_column: collector.column_depth > 0,
                    in_filter: collector.filter_depth > 0,
                    text: None,
                });
            }
        }
        _ => {}
    }
    Ok(())
}

fn attribute(element: &BytesStart, path: &Path, key: &[u8]) -> Result<Option<String>> {
    for attr in element.attributes() {
        let attr = attr.map_err(|err| ToolError::malformed(path, err))?;
        if attr.key.as_ref() == key {
            let value = attr
                .unescape_value()
                .map_err(|err| ToolError::malformed(path, err))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn is_sql_expression(reader: &NsReader<&[u8]>, element: &BytesStart, path: &Path) -> Result<bool> {
    for attr in element.attributes() {
        let attr = attr.map_err(|err| ToolError::malformed(path, err))?;
        let (namespace, local_name) = reader.resolve_attribute(attr.key);
        let in_instance_ns = matches!(
            namespace,
            ResolveResult::Bound(Namespace(uri)) if uri == INSTANCE_NS.as_bytes()
        );
        if in_instance_ns && local_name.as_ref() == b"type" {
            let value = attr
                .unescape_value()
                .map_err(|err| ToolError::malformed(path, err))?;
            return Ok(value == SQL_EXPRESSION_TYPE);
        }
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use tempfile::tempdir;

    const REPORT: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<saw:report xmlns:saw="com.siebel.analytics.web/report/v1.1"
            xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"
            xmlns:sawx="com.siebel.analytics.web/expression/v1.1">
  <saw:criteria xsi:type="saw:simpleCriteria" subjectArea="&quot;Sales Analytics&quot;">
    <saw:columns>
      <saw:column xsi:type="saw:regularColumn" columnID="c1">
        <saw:columnFormula>
          <sawx:expr xsi:type="sawx:sqlExpression">"Customer"."Name"</sawx:expr>
        </saw:columnFormula>
      </saw:column>
      <saw:column xsi:type="saw:regularColumn" columnID="c2">
        <saw:columnFormula>
          <sawx:expr xsi:type="sawx:sqlExpression">"Orders"."Revenue"</sawx:expr>
        </saw:columnFormula>
      </saw:column>
    </saw:columns>
    <saw:filter>
      <sawx:expr xsi:type="sawx:logical" op="and">
        <sawx:expr xsi:type="sawx:comparison" op="equal">
          <sawx:expr xsi:type="sawx:sqlExpression">"Time"."Year"</sawx:expr>
          <sawx:expr xsi:type="xsd:decimal">2024</sawx:expr>
        </sawx:expr>
      </sawx:expr>
    </saw:filter>
  </saw:criteria>
</saw:report>"#;

    fn write_xml(contents: &str) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("report.xml");
        fs::write(&path, contents).expect("XML written");
        (dir, path)
    }

    #[test]
    fn extracts_columns_filters_and_subject_area() {
        let (_dir, path) = write_xml(REPORT);
        let report = extract(&path).expect("XML extracted");

        assert_eq!(
            report.field_identifiers,
            vec!["customer.name", "orders.revenue"]
        );
        assert_eq!(report.filter_expressions, vec!["time.year"]);
        assert_eq!(report.data_sources, vec!["sales analytics"]);
    }

    #[test]
    fn prefixes_are_resolved_by_namespace() {
        let renamed = REPORT
            .replace("saw:", "r:")
            .replace("xmlns:saw=", "xmlns:r=")
            .replace("r:simpleCriteria", "saw:simpleCriteria")
            .replace("r:regularColumn", "saw:regularColumn");
        let (_dir, path) = write_xml(&renamed);
        let report = extract(&path).expect("XML extracted");

        assert_eq!(report.field_identifiers.len(), 2);
        assert_eq!(report.data_sources, vec!["sales analytics"]);
    }

    #[test]
    fn missing_criteria_is_malformed() {
        let (_dir, path) = write_xml(
            r#"<saw:report xmlns:saw="com.siebel.analytics.web/report/v1.1"><saw:other/></saw:report>"#,
        );
        let err = extract(&path).expect_err("criteria required");
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn missing_subject_area_is_malformed() {
        let (_dir, path) = write_xml(
            r#"<saw:report xmlns:saw="com.siebel.analytics.web/report/v1.1"><saw:criteria/></saw:report>"#,
        );
        let err = extract(&path).expect_err("subjectArea required");
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
        assert!(err.to_string().contains("subjectArea"));
    }

    #[test]
    fn latin1_declared_document_is_decoded() {
        let latin1 = REPORT
            .replace("encoding=\"utf-8\"", "encoding=\"ISO-8859-1\"")
            .replace("\"Customer\".\"Name\"", "\"Client\".\"Société\"");
        let (encoded, _, unmappable) = encoding_rs::WINDOWS_1252.encode(&latin1);
        assert!(!unmappable);
        assert!(std::str::from_utf8(&encoded).is_err());

        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("latin1.xml");
        fs::write(&path, &encoded).expect("XML written");

        let report = extract(&path).expect("XML extracted");
        assert_eq!(
            report.field_identifiers,
            vec!["client.société", "orders.revenue"]
        );
        assert_eq!(report.data_sources, vec!["sales analytics"]);
    }

    #[test]
    fn utf16_document_with_bom_is_decoded() {
        let utf16 = REPORT.replace("encoding=\"utf-8\"", "encoding=\"UTF-16\"");
        let mut bytes = vec![0xFF, 0xFE];
        for unit in utf16.encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }

        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("utf16.xml");
        fs::write(&path, &bytes).expect("XML written");

        let report = extract(&path).expect("XML extracted");
        assert_eq!(
            report.field_identifiers,
            vec!["customer.name", "orders.revenue"]
        );
        assert_eq!(report.filter_expressions, vec!["time.year"]);
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        let mut bytes = REPORT.as_bytes().to_vec();
        let at = REPORT.find("Customer").expect("fixture text");
        bytes[at] = 0xFF;

        let dir = tempdir().expect("temporary directory");
        let path = dir.path().join("broken.xml");
        fs::write(&path, &bytes).expect("XML written");

        let err = extract(&path).expect_err("invalid UTF-8");
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }

    #[test]
    fn broken_markup_is_malformed() {
        let (_dir, path) = write_xml("<saw:report><unclosed></saw:report>");
        let err = extract(&path).expect_err("broken XML");
        assert_eq!(err.kind(), ErrorKind::MalformedInput);
    }
}
