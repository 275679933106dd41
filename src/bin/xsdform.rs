//! xsdform CLI: XSD-Feldtabelle und Instanz-Generierung.

use clap::{Args, Parser, Subcommand};
use std::collections::BTreeMap;
use std::io::Write;
use std::process;

use xsdform::{
    FlattenedSchema, ImportRegistry, SchemaDocument, SchemaWalker, XmlInstanceBuilder,
    document_to_pretty_xml, document_to_xml,
};

#[derive(Parser)]
#[command(name = "xsdform", about = "Regulatory report XSD flattener and XML instance builder")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Flatten the schema into a CSV field table
    Flatten(FlattenArgs),
    /// Build a conforming XML instance from a value map
    Build(BuildArgs),
}

#[derive(Args)]
struct FlattenArgs {
    /// Schema file (XSD)
    #[arg(short, long)]
    schema: String,

    /// Output file (- = stdout)
    #[arg(short, long, default_value = "-")]
    output: String,
}

#[derive(Args)]
struct BuildArgs {
    /// Schema file (XSD)
    #[arg(short, long)]
    schema: String,

    /// JSON object file mapping field names to values (omit for placeholders only)
    #[arg(short, long)]
    values: Option<String>,

    /// Output file (- = stdout)
    #[arg(short, long, default_value = "-")]
    output: String,

    /// Pretty-printed XML output (2-space indent)
    #[arg(long)]
    pretty: bool,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Fehler: {e}");
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Flatten(args) => run_flatten(args),
        Command::Build(args) => run_build(args),
    }
}

fn run_flatten(args: FlattenArgs) -> Result<(), String> {
    let schema = SchemaDocument::load(&args.schema).map_err(|e| e.to_string())?;
    let mut registry = ImportRegistry::new();
    let flat = SchemaWalker::new(&mut registry)
        .flatten(&schema)
        .map_err(|e| e.to_string())?;

    write_output(&args.output, flattened_to_csv(&flat).as_bytes())
}

fn run_build(args: BuildArgs) -> Result<(), String> {
    let schema = SchemaDocument::load(&args.schema).map_err(|e| e.to_string())?;

    let values = match args.values.as_deref() {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .map_err(|e| format!("Lesefehler '{path}': {e}"))?;
            values_from_json(&text)?
        }
        None => BTreeMap::new(),
    };

    let mut registry = ImportRegistry::new();
    let instance = XmlInstanceBuilder::new(&mut registry, &values)
        .build(&schema)
        .map_err(|e| e.to_string())?;

    let xml = if args.pretty {
        document_to_pretty_xml(&instance)
    } else {
        document_to_xml(&instance)
    }
    .map_err(|e| e.to_string())?;

    write_output(&args.output, xml.as_bytes())
}

/// Liest eine Name→Wert-Map aus einem JSON-Objekt. Skalare Werte werden
/// als Text uebernommen (die Quell-Spreadsheets liefern auch Zahlen).
fn values_from_json(text: &str) -> Result<BTreeMap<String, String>, String> {
    let parsed: serde_json::Value =
        serde_json::from_str(text).map_err(|e| format!("Werte-JSON: {e}"))?;
    let object = parsed
        .as_object()
        .ok_or_else(|| "Werte-JSON muss ein Objekt sein".to_string())?;

    let mut values = BTreeMap::new();
    for (name, value) in object {
        let text = match value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            serde_json::Value::Null => String::new(),
            _ => return Err(format!("Wert fuer '{name}' ist kein Skalar")),
        };
        values.insert(name.clone(), text);
    }
    Ok(values)
}

/// Rendert die Feldtabelle als CSV (eine Kopfzeile, eine Zeile pro Feld).
fn flattened_to_csv(flat: &FlattenedSchema) -> String {
    let mut out = String::from("name,type,documentation,is_sequence,parent,min_occurs,max_occurs\n");
    for row in flat.iter() {
        let parent = row.parent.map(|p| p.to_string()).unwrap_or_default();
        let min_occurs = row.min_occurs.to_string();
        let max_occurs = row.max_occurs.to_string();
        let fields = [
            row.name.as_str(),
            row.type_name.as_str(),
            row.documentation.as_str(),
            if row.is_sequence { "true" } else { "false" },
            parent.as_str(),
            min_occurs.as_str(),
            max_occurs.as_str(),
        ];
        let mut first = true;
        for field in fields {
            if !first {
                out.push(',');
            }
            first = false;
            push_csv_field(&mut out, field);
        }
        out.push('\n');
    }
    out
}

/// Quotet ein CSV-Feld nur wenn noetig (Komma, Quote oder Zeilenumbruch).
fn push_csv_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\n', '\r']) {
        out.push('"');
        for c in field.chars() {
            if c == '"' {
                out.push('"');
            }
            out.push(c);
        }
        out.push('"');
    } else {
        out.push_str(field);
    }
}

fn write_output(path: &str, content: &[u8]) -> Result<(), String> {
    if path == "-" {
        std::io::stdout()
            .write_all(content)
            .map_err(|e| format!("Schreibfehler (stdout): {e}"))
    } else {
        std::fs::write(path, content).map_err(|e| format!("Schreibfehler '{path}': {e}"))
    }
}
