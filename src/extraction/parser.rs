//! Tree-sitter parser integration for Go
//!
//! Provides parsing using the tree-sitter Go grammar plus small node helpers
//! shared by the declaration collector.

use crate::core::errors::{Error, Result};
use std::path::{Path, PathBuf};
use tree_sitter::{Node, Parser, Tree};

/// A parsed Go source file
pub struct GoAst {
    pub tree: Tree,
    pub path: PathBuf,
    pub source: String,
}

/// Parse Go source code into a tree-sitter AST
pub fn parse_source(content: &str, path: &Path) -> Result<GoAst> {
    let mut parser = Parser::new();
    let language: tree_sitter::Language = tree_sitter_go::LANGUAGE.into();

    parser
        .set_language(&language)
        .map_err(|e| Error::parse(path, 0, format!("failed to load Go grammar: {}", e)))?;

    let tree = parser
        .parse(content, None)
        .ok_or_else(|| Error::parse(path, 0, "parser returned no tree"))?;

    Ok(GoAst {
        tree,
        path: path.to_path_buf(),
        source: content.to_string(),
    })
}

/// Check if a parse tree has errors
pub fn has_parse_errors(tree: &Tree) -> bool {
    tree.root_node().has_error()
}

/// Line of the first syntax error, if any (1-indexed)
pub fn first_error_line(tree: &Tree) -> Option<usize> {
    fn find(node: Node) -> Option<usize> {
        if node.is_error() || node.is_missing() {
            return Some(node_line(&node));
        }
        if !node.has_error() {
            return None;
        }
        let mut cursor = node.walk();
        let children: Vec<Node> = node.children(&mut cursor).collect();
        children.into_iter().find_map(find)
    }
    find(tree.root_node())
}

/// Get text for a tree-sitter node
pub fn node_text<'a>(node: &Node, source: &'a str) -> &'a str {
    let start = node.start_byte();
    let end = node.end_byte();
    &source[start..end]
}

/// Get the line number for a tree-sitter node (1-indexed)
pub fn node_line(node: &Node) -> usize {
    node.start_position().row + 1
}

/// Named children of a node, collected so callers can iterate freely
pub fn named_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let children = node.named_children(&mut cursor).collect();
    children
}

/// All children of a node (named and anonymous)
pub fn all_children<'t>(node: &Node<'t>) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let children = node.children(&mut cursor).collect();
    children
}

/// Children attached to a repeated field, such as the names in `a, b int`
pub fn field_children<'t>(node: &Node<'t>, field: &str) -> Vec<Node<'t>> {
    let mut cursor = node.walk();
    let children = node.children_by_field_name(field, &mut cursor).collect();
    children
}

/// Strip the quotes from an import path literal
pub fn unquote(literal: &str) -> &str {
    literal.trim_matches(|c| c == '"' || c == '`')
}
