//! Per-package declaration collection.
//!
//! Each extraction unit is one directory of Go files. The collector parses
//! every file, runs the declaration-level checks that decide whether the
//! unit is usable, and lowers type expressions into [`GoType`]s.

use crate::core::errors::{Error, Result};
use crate::core::model::Position;
use crate::core::types::{
    is_predeclared, ChanDir, GoType, InterfaceLiteral, Param, Signature, StructField,
};
use crate::extraction::parser::{
    all_children, field_children, first_error_line, has_parse_errors, named_children, node_line,
    node_text, parse_source, unquote, GoAst,
};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tree_sitter::Node;

/// A directory of Go files forming one package.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SourceUnit {
    pub import_path: String,
    pub dir: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Declarations collected from one package that passed its checks.
#[derive(Clone, Debug, Default)]
pub struct PackageDecls {
    pub import_path: String,
    pub name: String,
    pub dir: PathBuf,
    pub types: Vec<TypeDecl>,
    pub methods: Vec<MethodDecl>,
}

#[derive(Clone, Debug)]
pub struct TypeDecl {
    pub name: String,
    pub type_params: Vec<String>,
    pub ty: GoType,
    pub position: Position,
    pub alias: bool,
    /// Declaration sites of interface methods, keyed by method name.
    pub member_positions: HashMap<String, Position>,
}

#[derive(Clone, Debug)]
pub struct MethodDecl {
    pub receiver: String,
    pub pointer_receiver: bool,
    pub receiver_params: Vec<String>,
    pub name: String,
    pub signature: Signature,
    pub position: Position,
}

impl PackageDecls {
    pub fn type_decl(&self, name: &str) -> Option<&TypeDecl> {
        self.types.iter().find(|t| t.name == name)
    }
}

/// Read and parse every file of `unit`, then run the declaration checks:
/// syntax, package name agreement, duplicate types and method receivers.
pub fn collect_unit(unit: &SourceUnit, position_segments: usize) -> Result<PackageDecls> {
    let mut asts = Vec::with_capacity(unit.files.len());
    for file in &unit.files {
        let content = fs::read_to_string(file).map_err(|e| {
            Error::file_system_with_source("failed to read Go source", file.clone(), e)
        })?;
        if is_ignored_by_build_tag(&content) {
            debug!(file = %file.display(), "skipping file excluded by build constraint");
            continue;
        }
        let ast = parse_source(&content, file)?;
        if has_parse_errors(&ast.tree) {
            let line = first_error_line(&ast.tree).unwrap_or(1);
            return Err(Error::parse(file, line, "syntax error"));
        }
        asts.push(ast);
    }

    let files = package_files(asts)?;
    let name = match files.first() {
        Some((name, _)) => name.clone(),
        None => String::new(),
    };

    let local_types = declared_type_names(&files)?;
    let mut decls = PackageDecls {
        import_path: unit.import_path.clone(),
        name,
        dir: unit.dir.clone(),
        ..PackageDecls::default()
    };

    for (_, ast) in &files {
        let root = ast.tree.root_node();
        let imports = file_imports(&root, &ast.source);
        let lowering = Lowering {
            source: &ast.source,
            package: &unit.import_path,
            imports: &imports,
            local_types: &local_types,
            type_params: Vec::new(),
        };
        for item in named_children(&root) {
            match item.kind() {
                "type_declaration" => {
                    for spec in named_children(&item) {
                        if let Some(decl) =
                            lowering.type_spec(&spec, &ast.path, position_segments)
                        {
                            decls.types.push(decl);
                        }
                    }
                }
                "method_declaration" => {
                    let method = lowering.method_declaration(&item, &ast.path, position_segments)?;
                    decls.methods.push(method);
                }
                _ => {}
            }
        }
    }

    check_methods(&decls, &files)?;
    decls.types.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(decls)
}

/// `//go:build ignore` files are standalone programs kept next to a package.
fn is_ignored_by_build_tag(content: &str) -> bool {
    content
        .lines()
        .take_while(|line| !line.trim_start().starts_with("package "))
        .any(|line| {
            let line = line.trim();
            line == "//go:build ignore" || line == "// +build ignore"
        })
}

/// Pair every file with its package name and check that they agree.
/// External test packages (`foo_test`) are dropped from the unit.
fn package_files(asts: Vec<GoAst>) -> Result<Vec<(String, GoAst)>> {
    let mut named: Vec<(String, GoAst)> = Vec::with_capacity(asts.len());
    for ast in asts {
        let root = ast.tree.root_node();
        let name = named_children(&root)
            .into_iter()
            .find(|n| n.kind() == "package_clause")
            .and_then(|clause| named_children(&clause).into_iter().next())
            .map(|ident| node_text(&ident, &ast.source).to_string())
            .ok_or_else(|| Error::parse(&ast.path, 1, "missing package clause"))?;
        named.push((name, ast));
    }

    let primary = named
        .iter()
        .find(|(_, ast)| !is_test_file(&ast.path))
        .or_else(|| named.first())
        .map(|(name, _)| name.clone());
    let Some(primary) = primary else {
        return Ok(named);
    };

    let external_test = format!("{}_test", primary);
    let mut kept = Vec::with_capacity(named.len());
    for (name, ast) in named {
        if name == primary {
            kept.push((name, ast));
        } else if name == external_test && is_test_file(&ast.path) {
            debug!(file = %ast.path.display(), "skipping external test package file");
        } else {
            return Err(Error::parse(
                &ast.path,
                1,
                format!("found packages {} and {} in the same directory", primary, name),
            ));
        }
    }
    Ok(kept)
}

fn is_test_file(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().ends_with("_test.go"))
        .unwrap_or(false)
}

/// Names of all types declared at package level, rejecting redeclarations.
fn declared_type_names(files: &[(String, GoAst)]) -> Result<HashSet<String>> {
    let mut names = HashSet::new();
    for (_, ast) in files {
        let root = ast.tree.root_node();
        for item in named_children(&root) {
            if item.kind() != "type_declaration" {
                continue;
            }
            for spec in named_children(&item) {
                let Some(name_node) = spec.child_by_field_name("name") else {
                    continue;
                };
                let name = node_text(&name_node, &ast.source);
                if name == "_" {
                    continue;
                }
                if !names.insert(name.to_string()) {
                    return Err(Error::parse(
                        &ast.path,
                        node_line(&name_node),
                        format!("{} redeclared in this block", name),
                    ));
                }
            }
        }
    }
    Ok(names)
}

/// Receivers must name a local defined type, and a type cannot declare
/// the same method twice.
fn check_methods(decls: &PackageDecls, files: &[(String, GoAst)]) -> Result<()> {
    let file_of = |position: &Position| {
        files
            .iter()
            .map(|(_, ast)| ast.path.clone())
            .find(|p| p.to_string_lossy().replace('\\', "/").ends_with(&position.path))
            .unwrap_or_else(|| PathBuf::from(&position.path))
    };

    let mut seen: HashSet<(&str, &str)> = HashSet::new();
    for method in &decls.methods {
        let Some(receiver) = decls.type_decl(&method.receiver) else {
            return Err(Error::parse(
                file_of(&method.position),
                method.position.line,
                format!("undefined: {}", method.receiver),
            ));
        };
        if receiver.alias || matches!(receiver.ty, GoType::Pointer(_) | GoType::Interface(_)) {
            return Err(Error::parse(
                file_of(&method.position),
                method.position.line,
                format!("invalid receiver type {}", method.receiver),
            ));
        }
        if !seen.insert((method.receiver.as_str(), method.name.as_str())) {
            return Err(Error::parse(
                file_of(&method.position),
                method.position.line,
                format!("method {}.{} already declared", method.receiver, method.name),
            ));
        }
    }
    Ok(())
}

/// Import alias to import path for one file. Blank and dot imports are
/// not addressable by name and are left out.
fn file_imports(root: &Node, source: &str) -> HashMap<String, String> {
    let mut imports = HashMap::new();
    for item in named_children(root) {
        if item.kind() != "import_declaration" {
            continue;
        }
        let mut specs = Vec::new();
        for child in named_children(&item) {
            match child.kind() {
                "import_spec" => specs.push(child),
                "import_spec_list" => specs.extend(
                    named_children(&child)
                        .into_iter()
                        .filter(|n| n.kind() == "import_spec"),
                ),
                _ => {}
            }
        }
        for spec in specs {
            let Some(path_node) = spec.child_by_field_name("path") else {
                continue;
            };
            let path = unquote(node_text(&path_node, source)).to_string();
            match spec.child_by_field_name("name") {
                Some(alias) => {
                    let alias = node_text(&alias, source);
                    if alias != "_" && alias != "." {
                        imports.insert(alias.to_string(), path);
                    }
                }
                None => {
                    imports.insert(default_import_name(&path), path);
                }
            }
        }
    }
    imports
}

/// Package name Go would bind for an unaliased import: the last path
/// element, skipping a major-version suffix and `go-`/`.vN` decorations.
pub fn default_import_name(path: &str) -> String {
    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    if segments.len() > 1 {
        if let Some(last) = segments.last() {
            if is_major_version(last) {
                segments.pop();
            }
        }
    }
    let last = segments.last().copied().unwrap_or(path);
    let last = last.strip_prefix("go-").unwrap_or(last);
    match last.rsplit_once(".v") {
        Some((stem, version)) if !version.is_empty() && version.chars().all(|c| c.is_ascii_digit()) => {
            stem.to_string()
        }
        _ => last.to_string(),
    }
}

fn is_major_version(segment: &str) -> bool {
    segment.len() > 1
        && segment.starts_with('v')
        && segment[1..].chars().all(|c| c.is_ascii_digit())
}

/// Lowers tree-sitter type expressions for one file.
struct Lowering<'a> {
    source: &'a str,
    package: &'a str,
    imports: &'a HashMap<String, String>,
    local_types: &'a HashSet<String>,
    type_params: Vec<String>,
}

impl<'a> Lowering<'a> {
    fn text(&self, node: &Node) -> &'a str {
        node_text(node, self.source)
    }

    fn with_type_params(&self, params: Vec<String>) -> Lowering<'a> {
        Lowering {
            source: self.source,
            package: self.package,
            imports: self.imports,
            local_types: self.local_types,
            type_params: params,
        }
    }

    fn type_spec(&self, spec: &Node, path: &Path, segments: usize) -> Option<TypeDecl> {
        let alias = match spec.kind() {
            "type_spec" => false,
            "type_alias" => true,
            _ => return None,
        };
        let name_node = spec.child_by_field_name("name")?;
        let type_node = spec.child_by_field_name("type")?;
        let name = self.text(&name_node).to_string();
        if name == "_" {
            return None;
        }

        let type_params = spec
            .child_by_field_name("type_parameters")
            .map(|list| self.type_parameter_names(&list))
            .unwrap_or_default();
        let scoped = self.with_type_params(type_params.clone());
        let ty = scoped.lower_type(&type_node);

        let member_positions = if type_node.kind() == "interface_type" {
            scoped.interface_member_positions(&type_node, path, segments)
        } else {
            HashMap::new()
        };

        Some(TypeDecl {
            name,
            type_params,
            ty,
            position: Position::from_path(path, node_line(&name_node), segments),
            alias,
            member_positions,
        })
    }

    fn type_parameter_names(&self, list: &Node) -> Vec<String> {
        named_children(list)
            .into_iter()
            .filter(|n| n.kind() == "type_parameter_declaration")
            .flat_map(|decl| field_children(&decl, "name"))
            .map(|n| self.text(&n).to_string())
            .collect()
    }

    fn interface_member_positions(
        &self,
        node: &Node,
        path: &Path,
        segments: usize,
    ) -> HashMap<String, Position> {
        let mut positions = HashMap::new();
        for elem in named_children(node) {
            if !matches!(elem.kind(), "method_elem" | "method_spec") {
                continue;
            }
            if let Some(name) = elem.child_by_field_name("name") {
                positions
                    .entry(self.text(&name).to_string())
                    .or_insert_with(|| Position::from_path(path, node_line(&name), segments));
            }
        }
        positions
    }

    fn method_declaration(&self, node: &Node, path: &Path, segments: usize) -> Result<MethodDecl> {
        let line = node_line(node);
        let malformed = || Error::parse(path, line, "malformed method declaration");

        let receiver_list = node.child_by_field_name("receiver").ok_or_else(malformed)?;
        let receiver_param = named_children(&receiver_list)
            .into_iter()
            .find(|n| n.kind() == "parameter_declaration")
            .ok_or_else(malformed)?;
        let mut receiver_type = receiver_param
            .child_by_field_name("type")
            .ok_or_else(malformed)?;

        let mut pointer_receiver = false;
        loop {
            match receiver_type.kind() {
                "parenthesized_type" => {
                    receiver_type = named_children(&receiver_type)
                        .into_iter()
                        .next()
                        .ok_or_else(malformed)?;
                }
                "pointer_type" if !pointer_receiver => {
                    pointer_receiver = true;
                    receiver_type = named_children(&receiver_type)
                        .into_iter()
                        .next()
                        .ok_or_else(malformed)?;
                }
                _ => break,
            }
        }

        let (receiver, receiver_params) = match receiver_type.kind() {
            "type_identifier" => (self.text(&receiver_type).to_string(), Vec::new()),
            "generic_type" => {
                let base = receiver_type
                    .child_by_field_name("type")
                    .ok_or_else(malformed)?;
                let params = receiver_type
                    .child_by_field_name("type_arguments")
                    .map(|args| {
                        named_children(&args)
                            .into_iter()
                            .map(|arg| {
                                let inner = if arg.kind() == "type_elem" {
                                    named_children(&arg).into_iter().next().unwrap_or(arg)
                                } else {
                                    arg
                                };
                                self.text(&inner).to_string()
                            })
                            .collect()
                    })
                    .unwrap_or_default();
                (self.text(&base).to_string(), params)
            }
            _ => {
                return Err(Error::parse(
                    path,
                    line,
                    format!("invalid receiver type {}", self.text(&receiver_type)),
                ))
            }
        };

        let name_node = node.child_by_field_name("name").ok_or_else(malformed)?;
        let scoped = self.with_type_params(receiver_params.clone());
        let signature = scoped.signature(
            node.child_by_field_name("parameters"),
            node.child_by_field_name("result"),
        );

        Ok(MethodDecl {
            receiver,
            pointer_receiver,
            receiver_params,
            name: self.text(&name_node).to_string(),
            signature,
            position: Position::from_path(path, node_line(&name_node), segments),
        })
    }

    fn signature(&self, params: Option<Node>, result: Option<Node>) -> Signature {
        let (params, variadic) = params
            .map(|list| self.parameter_list(&list))
            .unwrap_or_default();
        let results = match result {
            Some(node) if node.kind() == "parameter_list" => self.parameter_list(&node).0,
            Some(node) => vec![Param::unnamed(self.lower_type(&node))],
            None => Vec::new(),
        };
        Signature {
            params,
            results,
            variadic,
        }
    }

    fn parameter_list(&self, list: &Node) -> (Vec<Param>, bool) {
        let mut params = Vec::new();
        let mut variadic = false;
        for decl in named_children(list) {
            match decl.kind() {
                "parameter_declaration" => {
                    let Some(type_node) = decl.child_by_field_name("type") else {
                        continue;
                    };
                    let ty = self.lower_type(&type_node);
                    let names = field_children(&decl, "name");
                    if names.is_empty() {
                        params.push(Param::unnamed(ty));
                    } else {
                        for name in names {
                            params.push(Param::new(self.text(&name), ty.clone()));
                        }
                    }
                }
                "variadic_parameter_declaration" => {
                    let Some(type_node) = decl.child_by_field_name("type") else {
                        continue;
                    };
                    let name = decl
                        .child_by_field_name("name")
                        .map(|n| self.text(&n).to_string())
                        .unwrap_or_default();
                    params.push(Param::new(name, GoType::slice(self.lower_type(&type_node))));
                    variadic = true;
                }
                _ => {}
            }
        }
        (params, variadic)
    }

    fn resolve_identifier(&self, name: &str) -> GoType {
        if self.type_params.iter().any(|p| p == name) {
            GoType::TypeParam(name.to_string())
        } else if !self.local_types.contains(name) && is_predeclared(name) {
            GoType::basic(name)
        } else {
            GoType::named(self.package, name)
        }
    }

    fn first_named(&self, node: &Node) -> GoType {
        match named_children(node).into_iter().next() {
            Some(inner) => self.lower_type(&inner),
            None => GoType::Constraint(self.text(node).to_string()),
        }
    }

    fn field_type(&self, node: &Node, field: &str) -> GoType {
        match node.child_by_field_name(field) {
            Some(inner) => self.lower_type(&inner),
            None => GoType::Constraint(self.text(node).to_string()),
        }
    }

    fn lower_type(&self, node: &Node) -> GoType {
        match node.kind() {
            "type_identifier" | "identifier" => self.resolve_identifier(self.text(node)),
            "qualified_type" => {
                let alias = node
                    .child_by_field_name("package")
                    .map(|n| self.text(&n))
                    .unwrap_or_default();
                let name = node
                    .child_by_field_name("name")
                    .map(|n| self.text(&n))
                    .unwrap_or_default();
                let package = self
                    .imports
                    .get(alias)
                    .cloned()
                    .unwrap_or_else(|| alias.to_string());
                GoType::named(package, name)
            }
            "generic_type" => {
                let base = self.field_type(node, "type");
                let args: Vec<GoType> = node
                    .child_by_field_name("type_arguments")
                    .map(|list| {
                        named_children(&list)
                            .iter()
                            .map(|arg| self.lower_type(arg))
                            .collect()
                    })
                    .unwrap_or_default();
                match base {
                    GoType::Named { package, name, .. } => GoType::Named {
                        package,
                        name,
                        args,
                    },
                    other => other,
                }
            }
            "pointer_type" => GoType::pointer(self.first_named(node)),
            "slice_type" => GoType::slice(self.field_type(node, "element")),
            "array_type" => GoType::Array {
                len: node
                    .child_by_field_name("length")
                    .map(|n| self.text(&n).to_string())
                    .unwrap_or_default(),
                elem: Box::new(self.field_type(node, "element")),
            },
            "implicit_length_array_type" => GoType::Array {
                len: "...".to_string(),
                elem: Box::new(self.field_type(node, "element")),
            },
            "map_type" => GoType::Map {
                key: Box::new(self.field_type(node, "key")),
                value: Box::new(self.field_type(node, "value")),
            },
            "channel_type" => GoType::Chan {
                dir: channel_direction(self.text(node)),
                elem: Box::new(self.field_type(node, "value")),
            },
            "function_type" => GoType::Func(Box::new(self.signature(
                node.child_by_field_name("parameters"),
                node.child_by_field_name("result"),
            ))),
            "interface_type" => GoType::Interface(self.interface_literal(node)),
            "struct_type" => GoType::Struct(self.struct_fields(node)),
            "parenthesized_type" => self.first_named(node),
            "type_elem" | "constraint_elem" => {
                let terms = named_children(node);
                match terms.as_slice() {
                    [single] => self.lower_type(single),
                    _ => GoType::Constraint(normalize_spaces(self.text(node))),
                }
            }
            _ => GoType::Constraint(normalize_spaces(self.text(node))),
        }
    }

    fn interface_literal(&self, node: &Node) -> InterfaceLiteral {
        let mut literal = InterfaceLiteral::default();
        for elem in named_children(node) {
            match elem.kind() {
                "method_elem" | "method_spec" => {
                    let Some(name) = elem.child_by_field_name("name") else {
                        continue;
                    };
                    let signature = self.signature(
                        elem.child_by_field_name("parameters"),
                        elem.child_by_field_name("result"),
                    );
                    literal
                        .methods
                        .push((self.text(&name).to_string(), signature));
                }
                "comment" => {}
                _ => literal.embeds.push(self.lower_type(&elem)),
            }
        }
        literal
    }

    fn struct_fields(&self, node: &Node) -> Vec<StructField> {
        let Some(list) = named_children(node)
            .into_iter()
            .find(|n| n.kind() == "field_declaration_list")
        else {
            return Vec::new();
        };

        let mut fields = Vec::new();
        for decl in named_children(&list) {
            if decl.kind() != "field_declaration" {
                continue;
            }
            let Some(type_node) = decl.child_by_field_name("type") else {
                continue;
            };
            let ty = self.lower_type(&type_node);
            let names = field_children(&decl, "name");
            if names.is_empty() {
                let pointer = all_children(&decl).iter().any(|c| c.kind() == "*");
                let name = match &ty {
                    GoType::Named { name, .. } => name.clone(),
                    other => other.render(),
                };
                let ty = if pointer { GoType::pointer(ty) } else { ty };
                fields.push(StructField {
                    name,
                    ty,
                    embedded: true,
                });
            } else {
                for name in names {
                    fields.push(StructField {
                        name: self.text(&name).to_string(),
                        ty: ty.clone(),
                        embedded: false,
                    });
                }
            }
        }
        fields
    }
}

fn channel_direction(text: &str) -> ChanDir {
    let text = text.trim_start();
    if text.starts_with("<-") {
        return ChanDir::Recv;
    }
    match text.strip_prefix("chan") {
        Some(rest) if rest.trim_start().starts_with("<-") => ChanDir::Send,
        _ => ChanDir::Both,
    }
}

fn normalize_spaces(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
