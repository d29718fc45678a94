//! Serializable views of parse results for the command line.

use kopi_core::{Diagnostic, LineIndex, Severity, SourceDocument, Token};
use kopi_hir::{Member, MethodDecl, TypeDecl};
use kopi_parse::ParsedUnit;
use kopi_types::TypeStore;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct DiagnosticRecord {
    pub file: String,
    /// One-based.
    pub line: u32,
    /// One-based.
    pub column: u32,
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
}

impl DiagnosticRecord {
    fn new(file: &str, index: &LineIndex, diagnostic: &Diagnostic) -> Self {
        let pos = index.line_col(diagnostic.range.start());
        Self {
            file: file.to_string(),
            line: pos.line + 1,
            column: pos.col + 1,
            severity: diagnostic.severity,
            code: diagnostic.code,
            message: diagnostic.message.clone(),
        }
    }

    fn render(&self) -> String {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        format!(
            "{}:{}:{}: {severity}[{}] {}",
            self.file, self.line, self.column, self.code, self.message
        )
    }
}

#[derive(Debug, Default, Serialize)]
pub struct Summary {
    pub files: usize,
    pub errors: usize,
    pub warnings: usize,
}

impl Summary {
    fn count(&mut self, diagnostics: &[DiagnosticRecord]) {
        self.files += 1;
        for d in diagnostics {
            match d.severity {
                Severity::Error => self.errors += 1,
                Severity::Warning => self.warnings += 1,
                Severity::Info => {}
            }
        }
    }
}

fn records(doc: &SourceDocument, unit: &ParsedUnit) -> Vec<DiagnosticRecord> {
    let index = LineIndex::new(&doc.text);
    unit.diagnostics
        .iter()
        .map(|d| DiagnosticRecord::new(&doc.uri, &index, d))
        .collect()
}

#[derive(Debug, Serialize)]
pub struct DiagnosticsReport {
    pub diagnostics: Vec<DiagnosticRecord>,
    pub summary: Summary,
}

impl DiagnosticsReport {
    pub fn new(docs: &[SourceDocument], units: &[ParsedUnit]) -> Self {
        let mut diagnostics = Vec::new();
        let mut summary = Summary::default();
        for (doc, unit) in docs.iter().zip(units) {
            let file = records(doc, unit);
            summary.count(&file);
            diagnostics.extend(file);
        }
        Self {
            diagnostics,
            summary,
        }
    }

    pub fn print_human(&self) {
        for d in &self.diagnostics {
            println!("{}", d.render());
        }
        println!(
            "summary: {} files, {} errors, {} warnings",
            self.summary.files, self.summary.errors, self.summary.warnings
        );
    }
}

#[derive(Debug, Serialize)]
pub struct TypeOutline {
    pub kind: &'static str,
    pub name: String,
    pub extends: Vec<String>,
    pub implements: Vec<String>,
    pub enum_constants: Vec<String>,
    pub fields: Vec<String>,
    pub methods: Vec<String>,
    pub types: Vec<TypeOutline>,
}

impl TypeOutline {
    fn new(store: &TypeStore, decl: &TypeDecl) -> Self {
        let mut outline = Self {
            kind: decl.kind.keyword(),
            name: store.qualified_name(decl.id),
            extends: decl.extends.iter().map(|t| t.source.clone()).collect(),
            implements: decl.implements.iter().map(|t| t.source.clone()).collect(),
            enum_constants: decl.enum_constants.iter().map(|c| c.name.clone()).collect(),
            fields: Vec::new(),
            methods: Vec::new(),
            types: Vec::new(),
        };
        for member in &decl.members {
            match member {
                Member::Field(field) => outline
                    .fields
                    .push(format!("{} {}", field.ty.source, field.name)),
                Member::Method(method) | Member::Constructor(method) => {
                    outline.methods.push(method_signature(method))
                }
                Member::Initializer(_) => {}
                Member::Type(nested) => outline.types.push(TypeOutline::new(store, nested)),
            }
        }
        outline
    }

    fn print(&self, depth: usize) {
        let indent = "  ".repeat(depth);
        let mut header = format!("{indent}{} {}", self.kind, self.name);
        if !self.extends.is_empty() {
            header.push_str(&format!(" extends {}", self.extends.join(", ")));
        }
        if !self.implements.is_empty() {
            header.push_str(&format!(" implements {}", self.implements.join(", ")));
        }
        println!("{header}");
        for constant in &self.enum_constants {
            println!("{indent}  constant {constant}");
        }
        for field in &self.fields {
            println!("{indent}  field {field}");
        }
        for method in &self.methods {
            println!("{indent}  method {method}");
        }
        for nested in &self.types {
            nested.print(depth + 1);
        }
    }
}

fn method_signature(method: &MethodDecl) -> String {
    let params: Vec<String> = method
        .params
        .iter()
        .map(|p| format!("{} {}", p.ty.source, p.name))
        .collect();
    match &method.return_type {
        Some(ret) => format!("{} {}({})", ret.source, method.name, params.join(", ")),
        None => format!("{}({})", method.name, params.join(", ")),
    }
}

#[derive(Debug, Serialize)]
pub struct FileOutline {
    pub file: String,
    pub package: Option<String>,
    pub imports: Vec<String>,
    pub types: Vec<TypeOutline>,
    pub diagnostics: Vec<DiagnosticRecord>,
}

#[derive(Debug, Serialize)]
pub struct ParseReport {
    pub files: Vec<FileOutline>,
    pub summary: Summary,
}

impl ParseReport {
    pub fn new(store: &TypeStore, docs: &[SourceDocument], units: &[ParsedUnit]) -> Self {
        let mut summary = Summary::default();
        let files = docs
            .iter()
            .zip(units)
            .map(|(doc, unit)| {
                let diagnostics = records(doc, unit);
                summary.count(&diagnostics);
                FileOutline {
                    file: doc.uri.clone(),
                    package: unit.unit.package.as_ref().map(|p| p.name.clone()),
                    imports: unit
                        .unit
                        .imports
                        .iter()
                        .map(|i| {
                            let mut name = i.name.clone();
                            if i.wildcard {
                                name.push_str(".*");
                            }
                            if i.is_static {
                                name.insert_str(0, "static ");
                            }
                            name
                        })
                        .collect(),
                    types: unit
                        .unit
                        .types
                        .iter()
                        .map(|t| TypeOutline::new(store, t))
                        .collect(),
                    diagnostics,
                }
            })
            .collect();
        Self { files, summary }
    }

    pub fn print_human(&self) {
        for file in &self.files {
            println!("{}", file.file);
            if let Some(package) = &file.package {
                println!("  package {package}");
            }
            for import in &file.imports {
                println!("  import {import}");
            }
            for ty in &file.types {
                ty.print(1);
            }
            for d in &file.diagnostics {
                println!("{}", d.render());
            }
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenRecord<'a> {
    pub start: u32,
    pub end: u32,
    #[serde(flatten)]
    pub token: &'a Token,
}

pub fn token_records(tokens: &[Token], trivia: bool) -> Vec<TokenRecord<'_>> {
    tokens
        .iter()
        .filter(|t| trivia || !t.is_trivia())
        .map(|token| TokenRecord {
            start: token.range.start().into(),
            end: token.range.end().into(),
            token,
        })
        .collect()
}

pub fn print_tokens(records: &[TokenRecord<'_>]) {
    for record in records {
        let token = record.token;
        let mut line = format!("{}..{} {:?} {:?}", record.start, record.end, token.kind, token.text.as_str());
        if let Some(loc) = &token.loc {
            line.push_str(&format!(" -> {:?} {}", loc.kind, loc.target));
        }
        println!("{line}");
    }
}
