//! Loading and exposing a single XSD document.
//!
//! Ein [`SchemaDocument`] ist nach dem Laden unveraenderlich: es besitzt den
//! konvertierten Schema-Baum, die Namespace-Map des Wurzelelements und kennt
//! das deklarierte Report-Wurzelelement. Dasselbe Modell dient fuer das lokale
//! Hauptschema und fuer per Import nachgeladene Dokumente, damit verschachtelte
//! Importe gegen die nsmap und die Import-Deklarationen *ihres* Dokuments
//! aufgeloest werden koennen.

use std::collections::BTreeMap;
use std::path::Path;
use std::rc::Rc;

use roxmltree::{Document, ParsingOptions};

use crate::error::{Error, Result};
use crate::node::{NodeKind, SchemaNode, XS_NS};

/// Maximale Groesse eines XSD-Dokuments (16 MiB), Eingabegroessenbeschraenkung.
const MAX_XSD_SIZE: usize = 16 * 1024 * 1024;

/// A loaded, immutable XSD document.
#[derive(Debug)]
pub struct SchemaDocument {
    origin: String,
    root: Rc<SchemaNode>,
    nsmap: BTreeMap<String, String>,
}

impl SchemaDocument {
    /// Laedt ein Schema aus einer lokalen Datei.
    ///
    /// Schlaegt mit [`Error::Load`] fehl, wenn die Datei fehlt, kein
    /// wohlgeformtes XML enthaelt oder keine `schema`-Wurzel im
    /// XSD-Namespace hat.
    pub fn load(path: impl AsRef<Path>) -> Result<SchemaDocument> {
        let path = path.as_ref();
        let origin = path.display().to_string();
        let content = std::fs::read_to_string(path).map_err(|e| Error::Load {
            path: origin.clone(),
            reason: e.to_string(),
        })?;
        Self::parse(&content, &origin).map_err(|reason| Error::Load { path: origin, reason })
    }

    /// Wie [`SchemaDocument::load`], aber aus einem bereits vorliegenden String.
    pub fn from_xml_str(xml: &str) -> Result<SchemaDocument> {
        Self::parse(xml, "<string>").map_err(|reason| Error::Load {
            path: "<string>".into(),
            reason,
        })
    }

    /// Parst ein Schema-Dokument; Fehlerursache als String, damit der
    /// Aufrufer sie je nach Herkunft als Load- oder Fetch-Fehler einordnet.
    pub(crate) fn parse(xml: &str, origin: &str) -> std::result::Result<SchemaDocument, String> {
        if xml.len() > MAX_XSD_SIZE {
            return Err(format!(
                "XSD document too large: {} bytes (max {} bytes)",
                xml.len(),
                MAX_XSD_SIZE
            ));
        }

        let opts = ParsingOptions { allow_dtd: true, ..Default::default() };
        let doc = Document::parse_with_options(xml, opts).map_err(|e| format!("XML: {e}"))?;
        let root = doc.root_element();

        if root.tag_name().name() != "schema" || root.tag_name().namespace() != Some(XS_NS) {
            return Err("root element must be xsd:schema".to_string());
        }

        let nsmap: BTreeMap<String, String> = root
            .namespaces()
            .map(|ns| (ns.name().unwrap_or("").to_string(), ns.uri().to_string()))
            .collect();

        let root = SchemaNode::from_xml(root);
        if root.children().is_empty() {
            return Err("schema has no top-level declarations".to_string());
        }

        Ok(SchemaDocument { origin: origin.to_string(), root, nsmap })
    }

    /// Herkunft des Dokuments (Dateipfad oder URL), fuer Fehlermeldungen.
    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Das `schema`-Wurzelelement als Schema-Baum.
    pub fn root(&self) -> &Rc<SchemaNode> {
        &self.root
    }

    /// Das deklarierte Report-Wurzelelement.
    ///
    /// Per Konvention dieser Report-Schemas immer das *letzte* Top-Level-Kind
    /// des Schemas, nach allen Import-Deklarationen. `parse` stellt sicher,
    /// dass mindestens ein Kind existiert.
    pub fn report_root(&self) -> &Rc<SchemaNode> {
        self.root
            .children()
            .last()
            .expect("parse guarantees at least one top-level child")
    }

    /// Name des Report-Wurzelelements, falls deklariert.
    pub fn report_root_name(&self) -> Option<&str> {
        self.report_root().name()
    }

    /// Prefix→URI-Map der Namespace-Deklarationen des Wurzelelements.
    pub fn nsmap(&self) -> &BTreeMap<String, String> {
        &self.nsmap
    }

    /// Loest einen Namespace-Prefix gegen die nsmap auf.
    pub fn namespace_uri(&self, prefix: &str) -> Option<&str> {
        self.nsmap.get(prefix).map(String::as_str)
    }

    /// Der Namespace, an dem Schema-Tags erkannt werden.
    ///
    /// Entspricht dem `{uri}`-Tag-Prefix des Quellmodells; die eigentliche
    /// Klassifikation passiert einmalig bei der Baumkonvertierung.
    pub fn schema_namespace(&self) -> &str {
        XS_NS
    }

    /// Top-Level `import`-Deklarationen dieses Dokuments.
    pub fn imports(&self) -> impl Iterator<Item = &Rc<SchemaNode>> {
        self.root
            .children()
            .iter()
            .filter(|c| c.kind() == NodeKind::Import)
    }
}
