//! Central error types for the schema walk and instance build.
//!
//! Jede Resolution-Stufe hat ihre eigene Variante, damit ein fehlgeschlagener
//! Walk genau benennt, an welchem Schema-Knoten und welcher Stufe er scheiterte.
//! Alle Fehler sind terminal: es gibt keine Retries und kein Teilergebnis.

use core::fmt;

/// All error conditions a schema walk or instance build can report.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A local schema document could not be loaded (missing file or not well-formed XML).
    Load {
        /// Pfad bzw. Herkunft des Dokuments.
        path: String,
        /// Ursache (IO- oder XML-Parse-Fehler).
        reason: String,
    },
    /// A namespace prefix is not declared in the owning schema's nsmap.
    UnknownNamespace {
        /// Der nicht aufloesbare Prefix.
        prefix: String,
    },
    /// No `import` declaration of the owning schema covers the namespace URI.
    ImportNotFound {
        /// Die gesuchte Namespace-URI.
        namespace: String,
    },
    /// The matching `import` declaration carries no `schemaLocation` URL.
    MissingSchemaLocation {
        /// Namespace-URI des Imports ohne schemaLocation.
        namespace: String,
    },
    /// Fetching a remote schema failed (network error, non-2xx status, or malformed XML body).
    Fetch {
        /// Die angefragte URL.
        url: String,
        /// Ursache.
        reason: String,
    },
    /// The imported document has no top-level child with the requested `name`.
    TypeNotFound {
        /// Gesuchter lokaler Typname.
        name: String,
        /// Namespace-URI des durchsuchten Dokuments.
        namespace: String,
    },
    /// A schema node violates the subset this walker handles (e.g. `element` without `name`).
    MalformedElement(String),
    /// Recursion depth bound exceeded: the schema nests deeper than any real
    /// report schema, or an import chain is cyclic.
    SchemaTooDeep {
        /// Tiefe bei Abbruch.
        depth: usize,
    },
    /// Writing serialized output failed.
    Io(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Load { path, reason } => {
                write!(f, "cannot load schema document '{path}': {reason}")
            }
            Self::UnknownNamespace { prefix } => {
                write!(f, "namespace prefix '{prefix}' is not declared in the schema's nsmap")
            }
            Self::ImportNotFound { namespace } => {
                write!(f, "no import declaration covers namespace '{namespace}'")
            }
            Self::MissingSchemaLocation { namespace } => {
                write!(f, "import for namespace '{namespace}' has no schemaLocation attribute")
            }
            Self::Fetch { url, reason } => {
                write!(f, "fetching imported schema '{url}' failed: {reason}")
            }
            Self::TypeNotFound { name, namespace } => {
                write!(f, "type '{name}' not found among top-level declarations of namespace '{namespace}'")
            }
            Self::MalformedElement(what) => write!(f, "malformed schema node: {what}"),
            Self::SchemaTooDeep { depth } => {
                write!(f, "schema nesting exceeds the supported depth ({depth})")
            }
            Self::Io(reason) => write!(f, "output error: {reason}"),
        }
    }
}

impl std::error::Error for Error {}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;
