//! Schema-driven XML instance construction.
//!
//! Zweiter rekursiver Walk ueber denselben Schema-Baum mit derselben
//! Tag-Dispatch-Tabelle wie [`SchemaWalker`](crate::walker::SchemaWalker):
//! statt Tabellenzeilen entstehen XML-Knoten, deren Text aus einer extern
//! gelieferten Name→Wert-Map gefuellt wird. Fehlt ein Name in der Map,
//! bekommt der Knoten den Platzhalter [`NO_USER_INPUT`]; das erzeugte
//! Dokument ist damit auch bei Teil-Eingaben immer vollstaendig und
//! wohlgeformt, der Platzhaltertext muss vom Aufrufer gesichtet werden.
//!
//! Invariante gegenueber dem Flatten-Walk: beide Walks treffen fuer jeden
//! Schema-Knoten dieselbe "ist das ein Feld"-Entscheidung, die Element-
//! Reihenfolge des Instanzdokuments ist isomorph zur Tabellenreihenfolge.

use std::collections::BTreeMap;

use crate::document::SchemaDocument;
use crate::error::{Error, Result};
use crate::imports::{ImportRegistry, is_builtin_base};
use crate::node::{NodeKind, SchemaNode, complex_type_is_field};
use crate::walker::{MAX_WALK_DEPTH, split_qualified};

/// Platzhaltertext fuer Felder ohne Eintrag in der Wert-Map.
pub const NO_USER_INPUT: &str = "No user input";

/// One element of the generated instance document.
///
/// Text wird bei der Erzeugung gesetzt und danach nie mehr veraendert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlNode {
    name: String,
    text: String,
    children: Vec<XmlNode>,
}

impl XmlNode {
    fn new(name: String, text: String) -> XmlNode {
        XmlNode { name, text, children: Vec::new() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn children(&self) -> &[XmlNode] {
        &self.children
    }

    /// Elementnamen in Dokumentreihenfolge (Tiefensuche, Eltern zuerst).
    pub fn names_in_document_order(&self) -> Vec<&str> {
        let mut names = Vec::new();
        self.collect_names(&mut names);
        names
    }

    fn collect_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        out.push(&self.name);
        for child in &self.children {
            child.collect_names(out);
        }
    }
}

/// The generated instance document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    root: XmlNode,
}

impl XmlDocument {
    pub fn root(&self) -> &XmlNode {
        &self.root
    }
}

/// Dual walk over the schema tree, building an [`XmlDocument`].
pub struct XmlInstanceBuilder<'reg, 'v> {
    registry: &'reg mut ImportRegistry,
    values: &'v BTreeMap<String, String>,
}

impl<'reg, 'v> XmlInstanceBuilder<'reg, 'v> {
    pub fn new(
        registry: &'reg mut ImportRegistry,
        values: &'v BTreeMap<String, String>,
    ) -> XmlInstanceBuilder<'reg, 'v> {
        XmlInstanceBuilder { registry, values }
    }

    /// Baut das Instanzdokument fuer ein Schema.
    ///
    /// Das erste feldtragende Element des Walks wird die Dokumentwurzel.
    pub fn build(&mut self, doc: &SchemaDocument) -> Result<XmlDocument> {
        // Platzhalter-Elternknoten; das Schema liefert genau eine Wurzel.
        let mut holder = XmlNode::new(String::new(), String::new());
        self.walk(doc.root(), doc, &mut holder, 0)?;

        let mut roots = holder.children.into_iter();
        let root = roots.next().ok_or_else(|| {
            Error::MalformedElement("schema walk produced no root element".into())
        })?;
        if roots.next().is_some() {
            return Err(Error::MalformedElement(
                "schema walk produced more than one root element".into(),
            ));
        }
        Ok(XmlDocument { root })
    }

    fn walk(
        &mut self,
        node: &SchemaNode,
        doc: &SchemaDocument,
        parent: &mut XmlNode,
        depth: usize,
    ) -> Result<()> {
        if depth > MAX_WALK_DEPTH {
            return Err(Error::SchemaTooDeep { depth });
        }

        match node.kind() {
            NodeKind::Element => self.materialize(node, doc, parent, depth),
            NodeKind::ComplexType => {
                if complex_type_is_field(node) {
                    self.materialize(node, doc, parent, depth)
                } else {
                    self.walk_children(node, doc, parent, depth)
                }
            }
            NodeKind::Extension => self.walk_extension(node, doc, parent, depth),
            NodeKind::Import | NodeKind::Annotation | NodeKind::Documentation => Ok(()),
            NodeKind::ComplexContent
            | NodeKind::Sequence
            | NodeKind::SimpleType
            | NodeKind::Restriction
            | NodeKind::Other => self.walk_children(node, doc, parent, depth),
        }
    }

    fn walk_children(
        &mut self,
        node: &SchemaNode,
        doc: &SchemaDocument,
        parent: &mut XmlNode,
        depth: usize,
    ) -> Result<()> {
        for child in node.children() {
            self.walk(child, doc, parent, depth + 1)?;
        }
        Ok(())
    }

    /// Erzeugt den XML-Knoten fuer ein feldtragendes Schema-Element und
    /// haengt dessen Nachfahren darunter.
    fn materialize(
        &mut self,
        node: &SchemaNode,
        doc: &SchemaDocument,
        parent: &mut XmlNode,
        depth: usize,
    ) -> Result<()> {
        let name = node
            .name()
            .ok_or_else(|| Error::MalformedElement("element tag without name attribute".into()))?;

        let text = self
            .values
            .get(name)
            .cloned()
            .unwrap_or_else(|| NO_USER_INPUT.to_string());
        let mut element = XmlNode::new(name.to_string(), text);

        for child in node.children() {
            match child.kind() {
                NodeKind::Annotation | NodeKind::Documentation => {}
                _ => self.walk(child, doc, &mut element, depth + 1)?,
            }
        }

        parent.children.push(element);
        Ok(())
    }

    /// `extension`: die Basis-Felder werden unter dem *aktuellen* Eltern-
    /// knoten eingefuegt, eine Extension erzeugt keine eigene
    /// Verschachtelungsebene im Instanzdokument.
    fn walk_extension(
        &mut self,
        node: &SchemaNode,
        doc: &SchemaDocument,
        parent: &mut XmlNode,
        depth: usize,
    ) -> Result<()> {
        let base = node
            .base()
            .ok_or_else(|| Error::MalformedElement("extension tag without base attribute".into()))?;

        if !is_builtin_base(base, doc) {
            let (prefix, local) = split_qualified(base)?;
            let (base_doc, base_node) = self.registry.resolve(prefix, local, doc)?;
            self.walk(&base_node, &base_doc, parent, depth + 1)?;
        }

        self.walk_children(node, doc, parent, depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imports::testing::StubFetcher;
    use crate::walker::SchemaWalker;

    fn build_with(
        schema: &str,
        values: &[(&str, &str)],
        responses: &[(&str, &str)],
    ) -> Result<XmlDocument> {
        let doc = SchemaDocument::from_xml_str(schema).unwrap();
        let (fetcher, _) = StubFetcher::new(responses);
        let mut registry = ImportRegistry::with_fetcher(Box::new(fetcher));
        let values: BTreeMap<String, String> = values
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        XmlInstanceBuilder::new(&mut registry, &values).build(&doc)
    }

    const PLAIN: &str = r#"
        <xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
            <xsd:element name="Raport">
                <xsd:complexType>
                    <xsd:sequence>
                        <xsd:element name="DataOd" type="xsd:date"/>
                        <xsd:element name="DataDo" type="xsd:date"/>
                    </xsd:sequence>
                </xsd:complexType>
            </xsd:element>
        </xsd:schema>
    "#;

    #[test]
    fn builds_nested_instance_with_values() {
        let doc = build_with(
            PLAIN,
            &[("DataOd", "2025-01-01"), ("DataDo", "2025-12-31"), ("Raport", "1")],
            &[],
        )
        .unwrap();

        let root = doc.root();
        assert_eq!(root.name(), "Raport");
        assert_eq!(root.text(), "1");
        assert_eq!(root.children().len(), 2);
        assert_eq!(root.children()[0].name(), "DataOd");
        assert_eq!(root.children()[0].text(), "2025-01-01");
        assert_eq!(root.children()[1].text(), "2025-12-31");
    }

    #[test]
    fn missing_values_become_placeholder_text() {
        let doc = build_with(PLAIN, &[], &[]).unwrap();
        let root = doc.root();
        assert_eq!(root.text(), NO_USER_INPUT);
        for child in root.children() {
            assert_eq!(child.text(), NO_USER_INPUT);
        }
    }

    #[test]
    fn instance_order_is_isomorphic_to_flattened_schema() {
        let schema_doc = SchemaDocument::from_xml_str(PLAIN).unwrap();

        let (fetcher, _) = StubFetcher::new(&[]);
        let mut registry = ImportRegistry::with_fetcher(Box::new(fetcher));
        let flat = SchemaWalker::new(&mut registry).flatten(&schema_doc).unwrap();

        let doc = build_with(PLAIN, &[], &[]).unwrap();
        let instance_names = doc.root().names_in_document_order();
        let flat_names: Vec<_> = flat.names().collect();
        assert_eq!(instance_names, flat_names);
    }

    const EXT_OWNER: &str = r#"
        <xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema"
                    xmlns:etd="http://example.org/etd">
            <xsd:import namespace="http://example.org/etd"
                        schemaLocation="http://example.org/etd.xsd"/>
            <xsd:element name="Raport">
                <xsd:complexType>
                    <xsd:complexContent>
                        <xsd:extension base="etd:TBaza">
                            <xsd:sequence>
                                <xsd:element name="Z"/>
                            </xsd:sequence>
                        </xsd:extension>
                    </xsd:complexContent>
                </xsd:complexType>
            </xsd:element>
        </xsd:schema>
    "#;

    const EXT_BASE: &str = r#"
        <xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema"
                    targetNamespace="http://example.org/etd">
            <xsd:complexType name="TBaza">
                <xsd:sequence>
                    <xsd:element name="X"/>
                    <xsd:element name="Y"/>
                </xsd:sequence>
            </xsd:complexType>
        </xsd:schema>
    "#;

    #[test]
    fn extension_fields_share_the_parent_of_the_extension() {
        let doc = build_with(
            EXT_OWNER,
            &[("X", "x")],
            &[("http://example.org/etd.xsd", EXT_BASE)],
        )
        .unwrap();

        let root = doc.root();
        let child_names: Vec<_> = root.children().iter().map(XmlNode::name).collect();
        assert_eq!(child_names, ["X", "Y", "Z"], "no extra nesting level for the extension");
        assert_eq!(root.children()[0].text(), "x");
        assert_eq!(root.children()[1].text(), NO_USER_INPUT);
    }

    #[test]
    fn builtin_extension_base_adds_no_node() {
        let doc = build_with(
            r#"<xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
                   <xsd:element name="P_6A">
                       <xsd:complexType>
                           <xsd:complexContent>
                               <xsd:extension base="xsd:boolean"/>
                           </xsd:complexContent>
                       </xsd:complexType>
                   </xsd:element>
               </xsd:schema>"#,
            &[("P_6A", "true")],
            &[],
        )
        .unwrap();
        assert_eq!(doc.root().name(), "P_6A");
        assert_eq!(doc.root().text(), "true");
        assert!(doc.root().children().is_empty());
    }

    #[test]
    fn resolution_failure_aborts_the_build() {
        let err = build_with(EXT_OWNER, &[], &[]).unwrap_err();
        assert!(matches!(err, Error::Fetch { .. }), "got: {err:?}");
    }
}
