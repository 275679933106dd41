//! Serialisierung des Instanzdokuments als XML.
//!
//! Zwei Varianten:
//! - `document_to_xml()` / `write_document()`: kompakt, eine Zeile.
//! - `document_to_pretty_xml()` / `write_document_pretty()`: mit
//!   Einrueckung (2 Spaces), fuer das Ergebnis-File, das Sachbearbeiter
//!   noch von Hand sichten.
//!
//! Beide schreiben eine XML-Deklaration voran; der Aufrufer schreibt den
//! String unveraendert in die Zieldatei.

use std::io::Write;

use crate::builder::{XmlDocument, XmlNode};
use crate::error::{Error, Result};

const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";

/// Serialisiert das Dokument kompakt als String.
pub fn document_to_xml(doc: &XmlDocument) -> Result<String> {
    let mut buf = Vec::new();
    write_document(doc, &mut buf)?;
    String::from_utf8(buf).map_err(|_| Error::Io("XML output is not valid UTF-8".into()))
}

/// Serialisiert das Dokument pretty-printed als String (2 Spaces Einzug).
pub fn document_to_pretty_xml(doc: &XmlDocument) -> Result<String> {
    let mut buf = Vec::new();
    write_document_pretty(doc, &mut buf)?;
    String::from_utf8(buf).map_err(|_| Error::Io("XML output is not valid UTF-8".into()))
}

/// Schreibt das Dokument kompakt in einen Writer.
pub fn write_document(doc: &XmlDocument, mut writer: impl Write) -> Result<()> {
    w(&mut writer, XML_DECLARATION)?;
    write_node(&mut writer, doc.root())?;
    w(&mut writer, "\n")
}

/// Schreibt das Dokument pretty-printed in einen Writer.
pub fn write_document_pretty(doc: &XmlDocument, mut writer: impl Write) -> Result<()> {
    w(&mut writer, XML_DECLARATION)?;
    write_node_pretty(&mut writer, doc.root(), 0)
}

/// io::Error → Error Konvertierung.
fn io_err(e: std::io::Error) -> Error {
    Error::Io(e.to_string())
}

/// Schreibt einen String als Bytes in den Writer.
#[inline]
fn w(writer: &mut impl Write, s: &str) -> Result<()> {
    writer.write_all(s.as_bytes()).map_err(io_err)
}

fn write_node(writer: &mut impl Write, node: &XmlNode) -> Result<()> {
    w(writer, "<")?;
    w(writer, node.name())?;
    w(writer, ">")?;
    write_escaped_text(writer, node.text())?;
    for child in node.children() {
        write_node(writer, child)?;
    }
    w(writer, "</")?;
    w(writer, node.name())?;
    w(writer, ">")
}

fn write_node_pretty(writer: &mut impl Write, node: &XmlNode, depth: usize) -> Result<()> {
    for _ in 0..depth {
        w(writer, "  ")?;
    }
    w(writer, "<")?;
    w(writer, node.name())?;
    w(writer, ">")?;
    write_escaped_text(writer, node.text())?;

    if node.children().is_empty() {
        w(writer, "</")?;
        w(writer, node.name())?;
        return w(writer, ">\n");
    }

    w(writer, "\n")?;
    for child in node.children() {
        write_node_pretty(writer, child, depth + 1)?;
    }
    for _ in 0..depth {
        w(writer, "  ")?;
    }
    w(writer, "</")?;
    w(writer, node.name())?;
    w(writer, ">\n")
}

/// XML-Escaping fuer Text-Inhalt: & < > → &amp; &lt; &gt;
///
/// memchr3 sucht alle drei Zeichen gleichzeitig; Bloecke ohne
/// Escape-Zeichen gehen in einem Stueck in den Writer.
fn write_escaped_text(writer: &mut impl Write, s: &str) -> Result<()> {
    const NEEDLE: [u8; 3] = [b'&', b'<', b'>'];
    const REPLACEMENT: [&[u8]; 3] = [b"&amp;", b"&lt;", b"&gt;"];

    let bytes = s.as_bytes();
    let mut start = 0;
    while start < bytes.len() {
        match memchr::memchr3(NEEDLE[0], NEEDLE[1], NEEDLE[2], &bytes[start..]) {
            Some(offset) => {
                let pos = start + offset;
                if start < pos {
                    writer.write_all(&bytes[start..pos]).map_err(io_err)?;
                }
                let idx = NEEDLE.iter().position(|&n| n == bytes[pos]).unwrap();
                writer.write_all(REPLACEMENT[idx]).map_err(io_err)?;
                start = pos + 1;
            }
            None => {
                writer.write_all(&bytes[start..]).map_err(io_err)?;
                break;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::XmlInstanceBuilder;
    use crate::document::SchemaDocument;
    use crate::imports::ImportRegistry;
    use std::collections::BTreeMap;

    fn sample_document(values: &[(&str, &str)]) -> XmlDocument {
        let schema = SchemaDocument::from_xml_str(
            r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
                   <xsd:element name="Raport">
                       <xsd:complexType>
                           <xsd:sequence>
                               <xsd:element name="P_1"/>
                           </xsd:sequence>
                       </xsd:complexType>
                   </xsd:element>
               </xsd:schema>"#,
        )
        .unwrap();
        let mut registry = ImportRegistry::new();
        let values: BTreeMap<String, String> = values
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        XmlInstanceBuilder::new(&mut registry, &values).build(&schema).unwrap()
    }

    #[test]
    fn compact_output_has_declaration_and_nesting() {
        let doc = sample_document(&[("Raport", "1"), ("P_1", "47")]);
        let xml = document_to_xml(&doc).unwrap();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Raport>1<P_1>47</P_1></Raport>\n"
        );
    }

    #[test]
    fn pretty_output_indents_children() {
        let doc = sample_document(&[("Raport", "1"), ("P_1", "47")]);
        let xml = document_to_pretty_xml(&doc).unwrap();
        assert_eq!(
            xml,
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<Raport>1\n  <P_1>47</P_1>\n</Raport>\n"
        );
    }

    #[test]
    fn text_content_is_escaped() {
        let doc = sample_document(&[("P_1", "a < b & c > d")]);
        let xml = document_to_xml(&doc).unwrap();
        assert!(xml.contains("<P_1>a &lt; b &amp; c &gt; d</P_1>"), "got: {xml}");
    }
}
