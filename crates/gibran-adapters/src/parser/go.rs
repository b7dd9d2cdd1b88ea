//! Go source parser built on tree-sitter.
//!
//! Syntax only: it reports the package clause, imports, top-level
//! definitions and identifier references. Deciding which references are
//! uses of another package is left to the extractor.

use gibran_core::{
    application::{ApplicationError, ports::SourceParser},
    domain::{
        DefinitionKind, DefinitionRecord, ImportRecord, ParsedFile, Position, Reference,
        is_exported,
    },
    error::GibranResult,
};
use std::collections::HashSet;

use tree_sitter::{Node, Parser, TreeCursor};

pub struct GoParser;

impl GoParser {
    pub fn new() -> GibranResult<Self> {
        let _ = create_ts_parser()?;
        Ok(Self)
    }
}

fn create_ts_parser() -> GibranResult<Parser> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_go::LANGUAGE.into())
        .map_err(|e| ApplicationError::ParseFailed {
            file: String::new(),
            message: format!("Failed to set Go language: {e}"),
        })?;
    Ok(parser)
}

impl SourceParser for GoParser {
    fn parse(&self, file_name: &str, contents: &str) -> GibranResult<ParsedFile> {
        let fail = |message: String| ApplicationError::ParseFailed {
            file: file_name.to_string(),
            message,
        };

        let mut parser = create_ts_parser()?;
        let tree = parser
            .parse(contents, None)
            .ok_or_else(|| fail("parser returned no tree".into()))?;
        let root = tree.root_node();

        if root.has_error() {
            let at = first_error(root)
                .map(|n| position(n, file_name).to_string())
                .unwrap_or_else(|| file_name.to_string());
            return Err(fail(format!("syntax error at {at}")).into());
        }

        let src = contents.as_bytes();
        let mut file = ParsedFile {
            file_name: file_name.to_string(),
            ..Default::default()
        };
        let mut has_dot_import = false;

        let mut cursor = root.walk();
        for decl in root.named_children(&mut cursor) {
            match decl.kind() {
                "package_clause" => {
                    if let Some(id) = decl.named_child(0) {
                        file.package_name = text(id, src).to_string();
                    }
                }
                "import_declaration" => {
                    collect_imports(decl, src, file_name, &mut file.imports);
                    has_dot_import |= file
                        .imports
                        .iter()
                        .any(|i| i.alias.as_deref() == Some("."));
                }
                "function_declaration" => {
                    if let Some(name) = decl.child_by_field_name("name") {
                        let name_text = text(name, src);
                        if name_text != "init" && name_text != "_" {
                            file.definitions.push(DefinitionRecord::new(
                                name_text,
                                DefinitionKind::Func,
                                position(name, file_name),
                            ));
                        }
                    }
                }
                "method_declaration" => {
                    let receiver = decl
                        .child_by_field_name("receiver")
                        .and_then(|r| receiver_type(r, src));
                    if let (Some(name), Some(receiver)) =
                        (decl.child_by_field_name("name"), receiver)
                    {
                        file.definitions.push(DefinitionRecord::method(
                            text(name, src),
                            receiver,
                            position(name, file_name),
                        ));
                    }
                }
                "type_declaration" => {
                    collect_specs(
                        decl,
                        &["type_spec", "type_alias"],
                        src,
                        file_name,
                        DefinitionKind::Type,
                        &mut file.definitions,
                    );
                }
                "const_declaration" => {
                    collect_specs(
                        decl,
                        &["const_spec"],
                        src,
                        file_name,
                        DefinitionKind::Const,
                        &mut file.definitions,
                    );
                }
                "var_declaration" => {
                    collect_specs(
                        decl,
                        &["var_spec"],
                        src,
                        file_name,
                        DefinitionKind::Var,
                        &mut file.definitions,
                    );
                }
                _ => {}
            }
        }

        if file.package_name.is_empty() {
            return Err(fail("missing package clause".into()).into());
        }

        let mut cursor = root.walk();
        for decl in root.named_children(&mut cursor) {
            if matches!(decl.kind(), "package_clause" | "import_declaration") {
                continue;
            }
            let mut refs = Vec::new();
            collect_references(decl, src, file_name, has_dot_import, &mut refs);

            let mut locals = HashSet::new();
            local_names(decl, src, &mut locals);
            refs.retain(|r| match r {
                Reference::Qualified { qualifier, .. } => !locals.contains(qualifier.as_str()),
                Reference::Bare { name, .. } => !locals.contains(name.as_str()),
            });
            file.references.extend(refs);
        }

        Ok(file)
    }
}

fn text<'a>(node: Node, src: &'a [u8]) -> &'a str {
    node.utf8_text(src).unwrap_or("")
}

/// 1-based line and byte column.
fn position(node: Node, file: &str) -> Position {
    let p = node.start_position();
    Position::new(file, p.row as u32 + 1, p.column as u32 + 1)
}

fn first_error(node: Node) -> Option<Node> {
    if node.is_error() || node.is_missing() {
        return Some(node);
    }
    let mut cursor = node.walk();
    let children: Vec<Node> = node.children(&mut cursor).collect();
    children
        .into_iter()
        .filter(|c| c.has_error() || c.is_missing())
        .find_map(first_error)
}

fn collect_imports(decl: Node, src: &[u8], file: &str, out: &mut Vec<ImportRecord>) {
    let mut cursor = decl.walk();
    for child in decl.named_children(&mut cursor) {
        match child.kind() {
            "import_spec" => push_import(child, src, file, out),
            "import_spec_list" => {
                let mut inner = child.walk();
                for spec in child.named_children(&mut inner) {
                    if spec.kind() == "import_spec" {
                        push_import(spec, src, file, out);
                    }
                }
            }
            _ => {}
        }
    }
}

fn push_import(spec: Node, src: &[u8], file: &str, out: &mut Vec<ImportRecord>) {
    let Some(path) = spec.child_by_field_name("path") else {
        return;
    };
    let alias = spec
        .child_by_field_name("name")
        .map(|n| text(n, src).to_string());
    out.push(ImportRecord::new(
        text(path, src).trim_matches(|c| c == '"' || c == '`'),
        alias,
        position(path, file),
    ));
}

/// Base type name of a method receiver: `T`, `*T`, `T[K]` and `*T[K]` all give `T`.
fn receiver_type(receiver: Node, src: &[u8]) -> Option<String> {
    let mut cursor = receiver.walk();
    let param = receiver
        .named_children(&mut cursor)
        .find(|c| c.kind() == "parameter_declaration")?;
    let mut node = param.child_by_field_name("type")?;
    loop {
        match node.kind() {
            "type_identifier" => return Some(text(node, src).to_string()),
            "pointer_type" | "parenthesized_type" => node = node.named_child(0)?,
            "generic_type" => node = node.child_by_field_name("type")?,
            _ => return None,
        }
    }
}

/// Names declared by the `spec_kinds` children of a grouped declaration.
fn collect_specs(
    decl: Node,
    spec_kinds: &[&str],
    src: &[u8],
    file: &str,
    kind: DefinitionKind,
    out: &mut Vec<DefinitionRecord>,
) {
    let mut cursor = decl.walk();
    for child in decl.named_children(&mut cursor) {
        if spec_kinds.contains(&child.kind()) {
            push_spec_names(child, src, file, kind, out);
        } else if child.kind().ends_with("_spec_list") {
            let mut inner = child.walk();
            for spec in child.named_children(&mut inner) {
                if spec_kinds.contains(&spec.kind()) {
                    push_spec_names(spec, src, file, kind, out);
                }
            }
        }
    }
}

fn push_spec_names(
    spec: Node,
    src: &[u8],
    file: &str,
    kind: DefinitionKind,
    out: &mut Vec<DefinitionRecord>,
) {
    let mut cursor = spec.walk();
    // The grammar also tags the commas of `a, b` with the `name` field.
    for name in spec
        .children_by_field_name("name", &mut cursor)
        .filter(|n| matches!(n.kind(), "identifier" | "type_identifier"))
    {
        let name_text = text(name, src);
        if name_text != "_" {
            out.push(DefinitionRecord::new(name_text, kind, position(name, file)));
        }
    }
}

/// Names bound anywhere inside `node`: parameters, receivers, `var` and
/// `const` specs, `:=`, `range`, `select` receives and type-switch aliases.
///
/// Scope is the whole top-level declaration, not the enclosing block, so a
/// name shadowed late in a function hides earlier package uses too.
fn local_names<'a>(node: Node, src: &'a [u8], out: &mut HashSet<&'a str>) {
    match node.kind() {
        "parameter_declaration"
        | "variadic_parameter_declaration"
        | "var_spec"
        | "const_spec" => {
            let mut cursor = node.walk();
            for name in node.children_by_field_name("name", &mut cursor) {
                if name.kind() == "identifier" {
                    out.insert(text(name, src));
                }
            }
        }
        "short_var_declaration" | "range_clause" | "receive_statement" => {
            if let Some(left) = node.child_by_field_name("left") {
                bound_identifiers(left, src, out);
            }
        }
        "type_switch_statement" => {
            if let Some(alias) = node.child_by_field_name("alias") {
                bound_identifiers(alias, src, out);
            }
        }
        // Parameter names of a signature type bind nothing outside it.
        "function_type" | "interface_type" => return,
        _ => {}
    }

    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        local_names(child, src, out);
    }
}

fn bound_identifiers<'a>(list: Node, src: &'a [u8], out: &mut HashSet<&'a str>) {
    if list.kind() == "identifier" {
        out.insert(text(list, src));
        return;
    }
    let mut cursor = list.walk();
    for child in list.named_children(&mut cursor) {
        if child.kind() == "identifier" {
            out.insert(text(child, src));
        }
    }
}

/// Record `pkg.Name` selectors and, when `bare` is set, unqualified
/// exported identifiers. Declaration names and labels are skipped, and
/// composite-literal keys never count as bare references.
fn collect_references(node: Node, src: &[u8], file: &str, bare: bool, out: &mut Vec<Reference>) {
    match node.kind() {
        "selector_expression" => {
            let operand = node.child_by_field_name("operand");
            let field = node.child_by_field_name("field");
            match (operand, field) {
                (Some(op), Some(field)) if op.kind() == "identifier" => {
                    out.push(Reference::Qualified {
                        qualifier: text(op, src).to_string(),
                        name: text(field, src).to_string(),
                        position: position(field, file),
                    });
                }
                (Some(op), _) => collect_references(op, src, file, bare, out),
                _ => {}
            }
            return;
        }
        "qualified_type" => {
            if let (Some(pkg), Some(name)) = (
                node.child_by_field_name("package"),
                node.child_by_field_name("name"),
            ) {
                out.push(Reference::Qualified {
                    qualifier: text(pkg, src).to_string(),
                    name: text(name, src).to_string(),
                    position: position(name, file),
                });
            }
            return;
        }
        "identifier" | "type_identifier" => {
            let name = text(node, src);
            if bare && is_exported(name) {
                out.push(Reference::Bare {
                    name: name.to_string(),
                    position: position(node, file),
                });
            }
            return;
        }
        _ => {}
    }

    let mut cursor: TreeCursor = node.walk();
    if !cursor.goto_first_child() {
        return;
    }
    loop {
        let field = cursor.field_name();
        if !matches!(field, Some("name") | Some("label")) {
            let child_bare = bare && field != Some("key");
            collect_references(cursor.node(), src, file, child_bare, out);
        }
        if !cursor.goto_next_sibling() {
            break;
        }
    }
}
