//! Owned schema tree model.
//!
//! `roxmltree` borrows from the input text, deshalb wird jedes geparste
//! Dokument einmalig in einen eigenen Baum aus [`SchemaNode`]s konvertiert.
//! Die Tag-Dispatch-Entscheidung faellt dabei genau einmal: jeder Knoten im
//! XSD-Namespace bekommt seine [`NodeKind`]-Variante, alles andere wird
//! [`NodeKind::Other`] (Abstieg ohne Seiteneffekte).
//!
//! Knoten haengen als `Rc` im Baum, damit die Import-Aufloesung ein
//! Basis-Element aus einem gecachten Dokument herausreichen kann, ohne den
//! Cache selbst zu borgen.

use std::rc::Rc;

use roxmltree::Node;

/// XML Schema Namespace.
pub(crate) const XS_NS: &str = "http://www.w3.org/2001/XMLSchema";

/// Closed set of schema tags the walks dispatch on.
///
/// Nur die Teilmenge, die die Report-Schemas tatsaechlich verwenden.
/// Unbekannte Tags landen in `Other` und werden transparent durchlaufen,
/// damit strukturell irrelevante Wrapper nie echten Inhalt verdecken.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Element,
    ComplexType,
    ComplexContent,
    Sequence,
    Extension,
    Import,
    Annotation,
    Documentation,
    SimpleType,
    Restriction,
    Other,
}

impl NodeKind {
    /// Klassifiziert einen Tag-Namen aus dem XSD-Namespace.
    fn classify(local_name: &str) -> Self {
        match local_name {
            "element" => Self::Element,
            "complexType" => Self::ComplexType,
            "complexContent" => Self::ComplexContent,
            "sequence" => Self::Sequence,
            "extension" => Self::Extension,
            "import" => Self::Import,
            "annotation" => Self::Annotation,
            "documentation" => Self::Documentation,
            "simpleType" => Self::SimpleType,
            "restriction" => Self::Restriction,
            _ => Self::Other,
        }
    }
}

/// One node of an owned schema tree.
///
/// Traegt nur die Attribut-Teilmenge, die Walker und Builder brauchen.
/// Attributwerte bleiben rohe Strings; geparst wird erst am Verwendungsort
/// (mit Fehlerkontext des betroffenen Elements).
#[derive(Debug)]
pub struct SchemaNode {
    kind: NodeKind,
    name: Option<String>,
    type_name: Option<String>,
    base: Option<String>,
    min_occurs: Option<String>,
    max_occurs: Option<String>,
    namespace: Option<String>,
    schema_location: Option<String>,
    text: Option<String>,
    children: Vec<Rc<SchemaNode>>,
}

impl SchemaNode {
    /// Konvertiert einen roxmltree-Knoten rekursiv in den owned Baum.
    ///
    /// Nicht-Element-Knoten (Text, Kommentare, PIs) werden uebersprungen;
    /// Text wird nur fuer `documentation`-Knoten uebernommen.
    pub(crate) fn from_xml(node: Node<'_, '_>) -> Rc<SchemaNode> {
        let kind = if node.tag_name().namespace() == Some(XS_NS) {
            NodeKind::classify(node.tag_name().name())
        } else {
            NodeKind::Other
        };

        let text = if kind == NodeKind::Documentation {
            node.text().map(|t| t.trim().to_string())
        } else {
            None
        };

        let children = node
            .children()
            .filter(|n| n.is_element())
            .map(Self::from_xml)
            .collect();

        Rc::new(SchemaNode {
            kind,
            name: node.attribute("name").map(str::to_string),
            type_name: node.attribute("type").map(str::to_string),
            base: node.attribute("base").map(str::to_string),
            min_occurs: node.attribute("minOccurs").map(str::to_string),
            max_occurs: node.attribute("maxOccurs").map(str::to_string),
            namespace: node.attribute("namespace").map(str::to_string),
            schema_location: node.attribute("schemaLocation").map(str::to_string),
            text,
            children,
        })
    }

    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// `name`-Attribut, falls vorhanden und nicht leer.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    /// `type`-Attribut (qualifizierter Typname).
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// `base`-Attribut einer Extension.
    pub fn base(&self) -> Option<&str> {
        self.base.as_deref()
    }

    /// Rohes `minOccurs`-Attribut.
    pub fn min_occurs(&self) -> Option<&str> {
        self.min_occurs.as_deref()
    }

    /// Rohes `maxOccurs`-Attribut.
    pub fn max_occurs(&self) -> Option<&str> {
        self.max_occurs.as_deref()
    }

    /// `namespace`-Attribut einer Import-Deklaration.
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// `schemaLocation`-Attribut einer Import-Deklaration.
    pub fn schema_location(&self) -> Option<&str> {
        self.schema_location.as_deref()
    }

    /// Textinhalt (nur fuer `documentation`-Knoten gesetzt).
    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn children(&self) -> &[Rc<SchemaNode>] {
        &self.children
    }

    /// Erstes Kind einer bestimmten Art.
    pub fn child_of_kind(&self, kind: NodeKind) -> Option<&Rc<SchemaNode>> {
        self.children.iter().find(|c| c.kind() == kind)
    }
}

/// Shared field-bearing rule for `complexType` nodes.
///
/// Ein benannter complexType mit mehr als einem Kind beschreibt ein eigenes
/// zusammengesetztes Feld (typisch: annotation + sequence); ein unbenannter
/// oder einkindriger ist nur ein transparenter Wrapper. Walker und Builder
/// muessen hier zwingend dieselbe Entscheidung treffen, sonst laufen
/// Tabellen- und Instanz-Reihenfolge auseinander.
pub(crate) fn complex_type_is_field(node: &SchemaNode) -> bool {
    node.kind() == NodeKind::ComplexType && node.name().is_some() && node.children().len() > 1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_first(xml: &str) -> Rc<SchemaNode> {
        let doc = roxmltree::Document::parse(xml).unwrap();
        SchemaNode::from_xml(doc.root_element())
    }

    #[test]
    fn classifies_xsd_tags() {
        let node = parse_first(
            r#"<xsd:element xmlns:xsd="http://www.w3.org/2001/XMLSchema"
                           name="P_1" type="etd:TTekstowy" minOccurs="1" maxOccurs="unbounded"/>"#,
        );
        assert_eq!(node.kind(), NodeKind::Element);
        assert_eq!(node.name(), Some("P_1"));
        assert_eq!(node.type_name(), Some("etd:TTekstowy"));
        assert_eq!(node.min_occurs(), Some("1"));
        assert_eq!(node.max_occurs(), Some("unbounded"));
    }

    #[test]
    fn non_xsd_namespace_is_other() {
        let node = parse_first(r#"<foo:element xmlns:foo="http://example.org" name="x"/>"#);
        assert_eq!(node.kind(), NodeKind::Other);
    }

    #[test]
    fn unknown_xsd_tag_is_other() {
        let node =
            parse_first(r#"<xsd:choice xmlns:xsd="http://www.w3.org/2001/XMLSchema"/>"#);
        assert_eq!(node.kind(), NodeKind::Other);
    }

    #[test]
    fn documentation_text_is_captured() {
        let node = parse_first(
            r#"<xsd:documentation xmlns:xsd="http://www.w3.org/2001/XMLSchema">
                 Okres sprawozdawczy
               </xsd:documentation>"#,
        );
        assert_eq!(node.kind(), NodeKind::Documentation);
        assert_eq!(node.text(), Some("Okres sprawozdawczy"));
    }

    #[test]
    fn empty_name_attribute_reads_as_absent() {
        let node =
            parse_first(r#"<xsd:element xmlns:xsd="http://www.w3.org/2001/XMLSchema" name=""/>"#);
        assert_eq!(node.name(), None);
    }

    #[test]
    fn complex_type_field_rule_requires_name_and_multiple_children() {
        let named_multi = parse_first(
            r#"<xsd:complexType xmlns:xsd="http://www.w3.org/2001/XMLSchema" name="TNaglowek">
                 <xsd:annotation/>
                 <xsd:sequence/>
               </xsd:complexType>"#,
        );
        assert!(complex_type_is_field(&named_multi));

        let anonymous = parse_first(
            r#"<xsd:complexType xmlns:xsd="http://www.w3.org/2001/XMLSchema">
                 <xsd:annotation/>
                 <xsd:sequence/>
               </xsd:complexType>"#,
        );
        assert!(!complex_type_is_field(&anonymous));

        let single_child = parse_first(
            r#"<xsd:complexType xmlns:xsd="http://www.w3.org/2001/XMLSchema" name="TWrapper">
                 <xsd:sequence/>
               </xsd:complexType>"#,
        );
        assert!(!complex_type_is_field(&single_child));
    }
}
