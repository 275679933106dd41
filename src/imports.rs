//! Cross-document type resolution for `import` declarations.
//!
//! Die Report-Schemas erweitern Typen, die in fremden Namespaces definiert
//! sind und nur per URL erreichbar sind. [`ImportRegistry`] loest einen
//! qualifizierten Typnamen gegen das besitzende Schema auf und cacht jedes
//! geholte Dokument pro Namespace-URI; ein Namespace wird pro Registry
//! hoechstens einmal uebers Netz geladen.
//!
//! Die Registry ist instanz-gebunden (eine pro Lauf, von beiden Walks
//! geteilt), nicht prozessweit: zwei unabhaengige Laeufe im selben Prozess
//! teilen sich keinen Cache.

use std::rc::Rc;
use std::time::Duration;

use log::debug;

use crate::FastHashMap;
use crate::document::SchemaDocument;
use crate::error::{Error, Result};
use crate::node::{SchemaNode, XS_NS};

/// Timeout fuer einen einzelnen Schema-Fetch.
///
/// Der Walk selbst kennt keine Fristen; die Schranke lebt an der
/// HTTP-Grenze, damit ein haengender Import nicht den ganzen Lauf blockiert.
const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Builtin-Primitivtypen, deren Aufloesung nie uebers Netz geht.
///
/// Ein Extension-`base`, dessen lokaler Name hier steht und dessen Prefix
/// auf den XSD-Namespace zeigt, wird unveraendert als Typ uebernommen.
const BUILTIN_PRIMITIVES: &[&str] = &[
    "anyURI",
    "boolean",
    "byte",
    "date",
    "dateTime",
    "decimal",
    "double",
    "float",
    "gYear",
    "gYearMonth",
    "int",
    "integer",
    "long",
    "nonNegativeInteger",
    "positiveInteger",
    "short",
    "string",
    "time",
    "token",
];

/// Fetching seam for remote schema documents.
///
/// Produktiv steht dahinter ein blockierender HTTP-GET; Tests haengen hier
/// einen In-Memory-Stub ein.
pub trait SchemaFetcher {
    /// Holt den Dokumenttext hinter `url`.
    ///
    /// Jeder Fehlschlag (Netz, Status, Encoding) ist [`Error::Fetch`].
    fn fetch(&self, url: &str) -> Result<String>;
}

/// Blocking HTTP fetcher used outside of tests.
#[derive(Debug, Default)]
pub struct HttpFetcher;

impl HttpFetcher {
    pub fn new() -> HttpFetcher {
        HttpFetcher
    }
}

impl SchemaFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<String> {
        let fetch_err = |reason: String| Error::Fetch { url: url.to_string(), reason };

        // Client pro Fetch: es gibt hoechstens eine Handvoll Imports pro
        // Lauf, Connection-Reuse lohnt sich nicht.
        let client = reqwest::blocking::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .build()
            .map_err(|e| fetch_err(e.to_string()))?;

        let response = client.get(url).send().map_err(|e| fetch_err(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(fetch_err(format!("HTTP status {status}")));
        }
        response.text().map_err(|e| fetch_err(e.to_string()))
    }
}

/// Instance-scoped cache and resolver for imported schema documents.
pub struct ImportRegistry {
    cache: FastHashMap<String, Rc<SchemaDocument>>,
    fetcher: Box<dyn SchemaFetcher>,
}

impl ImportRegistry {
    /// Registry mit dem produktiven HTTP-Fetcher.
    pub fn new() -> ImportRegistry {
        Self::with_fetcher(Box::new(HttpFetcher::new()))
    }

    /// Registry mit einem eigenen Fetcher (Tests, alternative Transporte).
    pub fn with_fetcher(fetcher: Box<dyn SchemaFetcher>) -> ImportRegistry {
        ImportRegistry { cache: FastHashMap::default(), fetcher }
    }

    /// Anzahl der gecachten Namespaces.
    pub fn cached_namespaces(&self) -> usize {
        self.cache.len()
    }

    /// Loest `prefix:local` gegen das besitzende Schema auf.
    ///
    /// Stufen und Fehler:
    /// 1. Prefix in der nsmap des Besitzers → [`Error::UnknownNamespace`]
    /// 2. `import`-Deklaration des Besitzers fuer die URI → [`Error::ImportNotFound`]
    /// 3. `schemaLocation` der Deklaration → [`Error::MissingSchemaLocation`]
    /// 4. Fetch + Parse (nur bei Cache-Miss) → [`Error::Fetch`]
    /// 5. Top-Level-Kind mit passendem `name` → [`Error::TypeNotFound`]
    ///
    /// Liefert neben dem gefundenen Element auch das importierte Dokument,
    /// damit der Aufrufer in *dessen* Kontext weiterlaufen kann (Extensions
    /// innerhalb eines Imports loesen gegen dessen eigene nsmap auf).
    pub fn resolve(
        &mut self,
        prefix: &str,
        local_name: &str,
        owning: &SchemaDocument,
    ) -> Result<(Rc<SchemaDocument>, Rc<SchemaNode>)> {
        let namespace = owning
            .namespace_uri(prefix)
            .ok_or_else(|| Error::UnknownNamespace { prefix: prefix.to_string() })?
            .to_string();

        let imported = self.document_for(&namespace, owning)?;

        let found = imported
            .root()
            .children()
            .iter()
            .find(|c| c.name() == Some(local_name))
            .cloned()
            .ok_or_else(|| Error::TypeNotFound {
                name: local_name.to_string(),
                namespace: namespace.clone(),
            })?;

        Ok((imported, found))
    }

    /// Liefert das Dokument fuer eine Namespace-URI, laedt es bei Bedarf.
    ///
    /// Eager-once: ist die URI gecacht, wird nie erneut gefetcht, auch dann
    /// nicht, wenn eine spaetere Suche nach einem anderen lokalen Namen
    /// fehlschlaegt.
    fn document_for(
        &mut self,
        namespace: &str,
        owning: &SchemaDocument,
    ) -> Result<Rc<SchemaDocument>> {
        // Die Import-Deklaration wird vor dem Cache geprueft: ein Namespace,
        // den das besitzende Schema nicht importiert, schlaegt auch dann
        // fehl, wenn ihn ein anderes Dokument schon geladen hat.
        let import = owning
            .imports()
            .find(|i| i.namespace() == Some(namespace))
            .ok_or_else(|| Error::ImportNotFound { namespace: namespace.to_string() })?;

        let url = import
            .schema_location()
            .ok_or_else(|| Error::MissingSchemaLocation { namespace: namespace.to_string() })?;

        if let Some(cached) = self.cache.get(namespace) {
            debug!("namespace '{namespace}' served from cache");
            return Ok(cached.clone());
        }

        debug!("fetching imported schema for namespace '{namespace}' from '{url}'");
        let content = self.fetcher.fetch(url)?;
        let parsed = SchemaDocument::parse(&content, url).map_err(|reason| Error::Fetch {
            url: url.to_string(),
            reason,
        })?;

        let parsed = Rc::new(parsed);
        self.cache.insert(namespace.to_string(), parsed.clone());
        Ok(parsed)
    }
}

impl Default for ImportRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Prueft ob ein Extension-`base` ein Builtin-Primitivtyp ist.
///
/// Der Prefix gilt als XSD-Namespace, wenn er konventionell `xs`/`xsd`
/// lautet oder die nsmap des Besitzers ihn auf den XSD-Namespace abbildet.
/// Ein unpraefixierter Name zaehlt nur, wenn der Default-Namespace des
/// Schemas der XSD-Namespace ist.
pub(crate) fn is_builtin_base(base: &str, owning: &SchemaDocument) -> bool {
    let (prefix, local) = match base.split_once(':') {
        Some((p, l)) => (p, l),
        None => ("", base),
    };

    if !BUILTIN_PRIMITIVES.contains(&local) {
        return false;
    }

    prefix == "xs" || prefix == "xsd" || owning.namespace_uri(prefix) == Some(XS_NS)
}
