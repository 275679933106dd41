//! xsdform – regulatory report XSD flattener and XML instance builder.
//!
//! Liest ein XSD eines Regulierungs-Reports, laeuft es rekursiv ab und
//! erzeugt (a) eine flache Feldtabelle (Name, Typ, Dokumentation,
//! Kardinalitaet) und (b) ein schema-konformes XML-Instanzdokument mit
//! extern gelieferten Werten. Typ-Extensions, deren Basis in einem anderen
//! Namespace definiert ist, werden per HTTP nachgeladen und pro Lauf
//! gecacht.
//!
//! # Beispiel
//!
//! ```
//! use std::collections::BTreeMap;
//! use xsdform::{ImportRegistry, SchemaDocument, SchemaWalker, XmlInstanceBuilder};
//!
//! let schema = SchemaDocument::from_xml_str(r#"
//!     <xsd:schema xmlns:xsd="http://www.w3.org/2001/XMLSchema">
//!         <xsd:element name="Raport">
//!             <xsd:complexType>
//!                 <xsd:sequence>
//!                     <xsd:element name="P_1" type="xsd:string"/>
//!                 </xsd:sequence>
//!             </xsd:complexType>
//!         </xsd:element>
//!     </xsd:schema>
//! "#).unwrap();
//!
//! // Beide Walks teilen sich eine Registry: jeder Namespace wird pro Lauf
//! // hoechstens einmal geholt.
//! let mut registry = ImportRegistry::new();
//!
//! let table = SchemaWalker::new(&mut registry).flatten(&schema).unwrap();
//! assert_eq!(table.names().collect::<Vec<_>>(), ["Raport", "P_1"]);
//!
//! let values = BTreeMap::from([("P_1".to_string(), "47".to_string())]);
//! let instance = XmlInstanceBuilder::new(&mut registry, &values)
//!     .build(&schema)
//!     .unwrap();
//! assert_eq!(instance.root().children()[0].text(), "47");
//! ```

pub mod builder;
pub mod document;
pub mod error;
pub mod imports;
pub mod node;
pub mod walker;
pub mod xml_writer;

pub use error::{Error, Result};

/// HashMap mit ahash (schneller, nicht DoS-resistent; fuer interne Caches).
pub(crate) type FastHashMap<K, V> = hashbrown::HashMap<K, V, ahash::RandomState>;

// Public API: Schema-Seite
pub use document::SchemaDocument;
pub use imports::{HttpFetcher, ImportRegistry, SchemaFetcher};
pub use node::{NodeKind, SchemaNode};

// Public API: Walks
pub use builder::{NO_USER_INPUT, XmlDocument, XmlInstanceBuilder, XmlNode};
pub use walker::{
    FieldDescriptor, FlattenedSchema, NO_DOCUMENTATION, NO_TYPE, SchemaWalker, UNBOUNDED,
};

// Public API: Serialisierung
pub use xml_writer::{
    document_to_pretty_xml, document_to_xml, write_document, write_document_pretty,
};
