//! Recursive schema walk producing the flattened field table.
//!
//! Der Walker steigt per Tag-Dispatch ueber [`NodeKind`] durch den
//! Schema-Baum und haengt fuer jedes feldtragende Element eine Zeile an.
//! Anhaengereihenfolge = Dokumentreihenfolge (Tiefensuche, Eltern vor
//! Kindern); das ist die Reihenfolge, die der Tabellen-Konsument erwartet.
//!
//! Zustand ueber die Rekursion: die wachsende Zeilenliste plus ein
//! expliziter Stack der offenen Deskriptor-Indizes. `sequence` und
//! Builtin-Extensions adressieren darueber den naechsten offenen Vorfahren
//! statt blind "die zuletzt angehaengte Zeile" zu mutieren; der Walk bleibt
//! dadurch re-entrant.

use log::warn;

use crate::document::SchemaDocument;
use crate::error::{Error, Result};
use crate::imports::{ImportRegistry, is_builtin_base};
use crate::node::{NodeKind, SchemaNode, complex_type_is_field};

/// Sentinel fuer Elemente ohne `type`-Attribut.
pub const NO_TYPE: &str = "No type specified";

/// Sentinel fuer Elemente ohne Dokumentation.
pub const NO_DOCUMENTATION: &str = "No documentation";

/// `maxOccurs="unbounded"` in der Zeile.
pub const UNBOUNDED: i32 = -1;

/// Rekursionsschranke fuer beide Walks.
///
/// Reale Import-Ketten dieser Report-Schemas sind ein bis zwei Hops tief;
/// die Schranke faengt zyklische Selbst-Importe ab, bevor der Stack es tut.
pub const MAX_WALK_DEPTH: usize = 128;

/// One flattened row: a reportable field of the schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Elementname (nie leer).
    pub name: String,
    /// Qualifizierter Typname oder [`NO_TYPE`].
    pub type_name: String,
    /// Dokumentationstext oder [`NO_DOCUMENTATION`].
    pub documentation: String,
    /// True wenn der Knoten geordnete, wiederholbare Kinder deklariert.
    pub is_sequence: bool,
    /// Index der Elternzeile in der flachen Liste (nicht-besitzend).
    pub parent: Option<usize>,
    /// `minOccurs`, 0 wenn nicht angegeben.
    pub min_occurs: u32,
    /// `maxOccurs`; 0 wenn nicht angegeben, [`UNBOUNDED`] fuer `unbounded`.
    pub max_occurs: i32,
}

/// Ordered list of field descriptors in depth-first document order.
///
/// Keine Duplikat-Unterdrueckung: wiederholt das Schema einen Namen,
/// erscheint er mehrfach.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenedSchema {
    rows: Vec<FieldDescriptor>,
}

impl FlattenedSchema {
    pub fn rows(&self) -> &[FieldDescriptor] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.rows.iter()
    }

    /// Feldnamen in Tabellenreihenfolge.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rows.iter().map(|r| r.name.as_str())
    }
}

/// Walk-Zustand, durch die Rekursion gereicht.
struct FlattenState {
    rows: Vec<FieldDescriptor>,
    /// Indizes der offenen Deskriptoren, innerster zuletzt.
    open: Vec<usize>,
}

/// The recursive tag-dispatch engine.
pub struct SchemaWalker<'reg> {
    registry: &'reg mut ImportRegistry,
}

impl<'reg> SchemaWalker<'reg> {
    pub fn new(registry: &'reg mut ImportRegistry) -> SchemaWalker<'reg> {
        SchemaWalker { registry }
    }

    /// Laeuft das Schema ab und liefert die flache Feldtabelle.
    ///
    /// Bricht beim ersten Fehler ab; es gibt kein Teilergebnis.
    pub fn flatten(&mut self, doc: &SchemaDocument) -> Result<FlattenedSchema> {
        let mut state = FlattenState { rows: Vec::new(), open: Vec::new() };
        self.walk(doc.root(), doc, &mut state, 0)?;
        Ok(FlattenedSchema { rows: state.rows })
    }

    fn walk(
        &mut self,
        node: &SchemaNode,
        doc: &SchemaDocument,
        state: &mut FlattenState,
        depth: usize,
    ) -> Result<()> {
        if depth > MAX_WALK_DEPTH {
            return Err(Error::SchemaTooDeep { depth });
        }

        match node.kind() {
            NodeKind::Element => self.walk_field_node(node, doc, state, depth),
            NodeKind::ComplexType => {
                if complex_type_is_field(node) {
                    self.walk_field_node(node, doc, state, depth)
                } else {
                    self.walk_children(node, doc, state, depth)
                }
            }
            NodeKind::Sequence => {
                match state.open.last() {
                    Some(&idx) => state.rows[idx].is_sequence = true,
                    None => warn!("sequence tag without an open ancestor descriptor"),
                }
                self.walk_children(node, doc, state, depth)
            }
            NodeKind::Extension => self.walk_extension(node, doc, state, depth),
            // Importe werden lazy ueber die Extension-Aufloesung konsultiert,
            // nie als Vorab-Pass verarbeitet.
            NodeKind::Import => Ok(()),
            // Vom umschliessenden Element geerntet.
            NodeKind::Annotation | NodeKind::Documentation => Ok(()),
            NodeKind::ComplexContent
            | NodeKind::SimpleType
            | NodeKind::Restriction
            | NodeKind::Other => self.walk_children(node, doc, state, depth),
        }
    }

    fn walk_children(
        &mut self,
        node: &SchemaNode,
        doc: &SchemaDocument,
        state: &mut FlattenState,
        depth: usize,
    ) -> Result<()> {
        for child in node.children() {
            self.walk(child, doc, state, depth + 1)?;
        }
        Ok(())
    }

    /// Verarbeitet ein feldtragendes `element` (oder element-aequivalentes
    /// `complexType`): Zeile anlegen, Dokumentation ernten, genau einmal
    /// anhaengen, und zwar vor den strukturellen Kindern, damit jede Zeile ihren
    /// Nachfahren vorausgeht.
    fn walk_field_node(
        &mut self,
        node: &SchemaNode,
        doc: &SchemaDocument,
        state: &mut FlattenState,
        depth: usize,
    ) -> Result<()> {
        let name = node
            .name()
            .ok_or_else(|| Error::MalformedElement("element tag without name attribute".into()))?
            .to_string();
        let (min_occurs, max_occurs) = parse_occurs(node, &name)?;

        let documentation = harvest_documentation(node);

        let idx = state.rows.len();
        state.rows.push(FieldDescriptor {
            name,
            type_name: node.type_name().unwrap_or(NO_TYPE).to_string(),
            documentation,
            is_sequence: false,
            parent: state.open.last().copied(),
            min_occurs,
            max_occurs,
        });

        state.open.push(idx);
        let result: Result<()> = (|| {
            for child in node.children() {
                match child.kind() {
                    NodeKind::Annotation | NodeKind::Documentation => {}
                    _ => self.walk(child, doc, state, depth + 1)?,
                }
            }
            Ok(())
        })();
        state.open.pop();
        result
    }

    /// `extension`: Builtin-Basen werden als Typ uebernommen, alles andere
    /// wird ueber die Registry aufgeloest und an dieser Stelle eingefuegt:
    /// Basis-Felder vor den eigenen `sequence`-Kindern der Extension, und
    /// im Namespace-Kontext des importierten Dokuments.
    fn walk_extension(
        &mut self,
        node: &SchemaNode,
        doc: &SchemaDocument,
        state: &mut FlattenState,
        depth: usize,
    ) -> Result<()> {
        let base = node
            .base()
            .ok_or_else(|| Error::MalformedElement("extension tag without base attribute".into()))?;

        if is_builtin_base(base, doc) {
            match state.open.last() {
                Some(&idx) => state.rows[idx].type_name = base.to_string(),
                None => warn!("builtin extension base '{base}' without an open descriptor"),
            }
        } else {
            let (prefix, local) = split_qualified(base)?;
            let (base_doc, base_node) = self.registry.resolve(prefix, local, doc)?;
            self.walk(&base_node, &base_doc, state, depth + 1)?;
        }

        self.walk_children(node, doc, state, depth)
    }
}

/// Zerlegt `prefix:local`; eine unqualifizierte, nicht-builtin Basis ist
/// in diesem Schema-Subset nicht aufloesbar.
pub(crate) fn split_qualified(base: &str) -> Result<(&str, &str)> {
    base.split_once(':').ok_or_else(|| {
        Error::MalformedElement(format!("extension base '{base}' has no namespace prefix"))
    })
}

/// Erntet den Dokumentationstext eines Elements: `annotation` →
/// `documentation`, oder direktes `documentation`-Kind. Sentinel, wenn
/// keines vorhanden ist; leerer Text bleibt leer.
fn harvest_documentation(node: &SchemaNode) -> String {
    let doc_node = node
        .child_of_kind(NodeKind::Annotation)
        .and_then(|a| a.child_of_kind(NodeKind::Documentation))
        .or_else(|| node.child_of_kind(NodeKind::Documentation));

    match doc_node {
        Some(d) => d.text().unwrap_or("").to_string(),
        None => NO_DOCUMENTATION.to_string(),
    }
}

/// Parst `minOccurs`/`maxOccurs` mit den Default-Sentineln der Tabelle:
/// fehlendes `minOccurs` → 0, fehlendes `maxOccurs` → 0, `unbounded` → -1.
fn parse_occurs(node: &SchemaNode, name: &str) -> Result<(u32, i32)> {
    let min_occurs = match node.min_occurs() {
        None => 0,
        Some(raw) => raw.parse::<u32>().map_err(|_| {
            Error::MalformedElement(format!("element '{name}' has invalid minOccurs '{raw}'"))
        })?,
    };

    let max_occurs = match node.max_occurs() {
        None => 0,
        Some("unbounded") => UNBOUNDED,
        Some(raw) => match raw.parse::<i32>() {
            Ok(n) if n >= 0 => n,
            _ => {
                return Err(Error::MalformedElement(format!(
                    "element '{name}' has invalid maxOccurs '{raw}'"
                )));
            }
        },
    };

    Ok((min_occurs, max_occurs))
}
