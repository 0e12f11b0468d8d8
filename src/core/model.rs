//! Serializable result graph.
//!
//! Every sequence field deserializes with an empty default so consumers can
//! iterate unconditionally, and every value is owned: a returned
//! [`AnalysisResult`] shares nothing with the engine that produced it.

use crate::core::types::Signature;
use serde::{Deserialize, Serialize};

/// Source location used for display and navigation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub path: String,
    pub line: usize,
}

impl Position {
    pub fn new(path: impl Into<String>, line: usize) -> Self {
        Self {
            path: path.into(),
            line,
        }
    }

    /// Build a position from a full file path, keeping only the last
    /// `segments` path components.
    pub fn from_path(path: &std::path::Path, line: usize, segments: usize) -> Self {
        Self {
            path: relative_display_path(&path.to_string_lossy(), segments),
            line,
        }
    }
}

impl std::fmt::Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.path, self.line)
    }
}

/// Keep the last `segments` components of a path, normalizing separators.
pub fn relative_display_path(path: &str, segments: usize) -> String {
    let normalized = path.replace('\\', "/");
    let parts: Vec<&str> = normalized.split('/').filter(|p| !p.is_empty()).collect();
    if segments == 0 || parts.len() <= segments {
        return parts.join("/");
    }
    parts[parts.len() - segments..].join("/")
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParamInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

impl ParamInfo {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Reference to another entity's declaration site.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Declaration {
    pub name: String,
    pub position: Position,
}

impl Declaration {
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            position,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodInfo {
    pub name: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub parameters: Vec<ParamInfo>,
    #[serde(default)]
    pub return_types: Vec<String>,
    #[serde(default)]
    pub implemented_from: Vec<Declaration>,
}

impl MethodInfo {
    pub fn new(name: impl Into<String>, position: Position) -> Self {
        Self {
            name: name.into(),
            position,
            ..Self::default()
        }
    }

    /// Record for a method with a lowered signature. Parameter types and
    /// return types are rendered canonically.
    pub fn from_signature(name: impl Into<String>, position: Position, signature: &Signature) -> Self {
        Self::new(name, position)
            .with_parameters(
                signature
                    .params
                    .iter()
                    .map(|p| ParamInfo::new(p.name.clone(), p.ty.render()))
                    .collect(),
            )
            .with_return_types(signature.result_types())
    }

    pub fn with_parameters(mut self, parameters: Vec<ParamInfo>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn with_return_types(mut self, return_types: Vec<String>) -> Self {
        self.return_types = return_types;
        self
    }

    /// Record that this method satisfies `declaration`. Returns `false` when
    /// the link was already present.
    pub fn add_implemented_from(&mut self, declaration: Declaration) -> bool {
        push_unique(&mut self.implemented_from, declaration)
    }
}

/// Interface methods share the method record shape; their
/// `implemented_from` stays empty.
pub type InterfaceMethodInfo = MethodInfo;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceInfo {
    pub name: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub methods: Vec<InterfaceMethodInfo>,
}

impl InterfaceInfo {
    pub fn declaration(&self) -> Declaration {
        Declaration::new(self.name.clone(), self.position.clone())
    }

    /// Cross-link for one of this interface's methods, e.g. `Shape.Area`.
    pub fn method_declaration(&self, method: &InterfaceMethodInfo) -> Declaration {
        Declaration::new(
            format!("{}.{}", self.name, method.name),
            method.position.clone(),
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructInfo {
    pub name: String,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub methods: Vec<MethodInfo>,
    #[serde(default)]
    pub embedded_types: Vec<String>,
    #[serde(default)]
    pub implemented_interfaces: Vec<Declaration>,
}

impl StructInfo {
    pub fn method(&self, name: &str) -> Option<&MethodInfo> {
        self.methods.iter().find(|m| m.name == name)
    }

    pub fn implements(&self, interface_name: &str) -> bool {
        self.implemented_interfaces
            .iter()
            .any(|d| d.name == interface_name)
    }

    /// Returns `false` when the link was already present.
    pub fn add_implemented_interface(&mut self, declaration: Declaration) -> bool {
        push_unique(&mut self.implemented_interfaces, declaration)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(default)]
    pub interfaces: Vec<InterfaceInfo>,
    #[serde(default)]
    pub structs: Vec<StructInfo>,
}

impl AnalysisResult {
    pub fn new(interfaces: Vec<InterfaceInfo>, structs: Vec<StructInfo>) -> Self {
        Self {
            interfaces,
            structs,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.interfaces.is_empty() && self.structs.is_empty()
    }

    /// First struct declared under `name`, in result order.
    pub fn find_struct(&self, name: &str) -> Option<&StructInfo> {
        self.structs.iter().find(|s| s.name == name)
    }

    pub fn find_interface(&self, name: &str) -> Option<&InterfaceInfo> {
        self.interfaces.iter().find(|i| i.name == name)
    }

    /// Structs implementing `interface_name`, sorted and deduplicated by name.
    pub fn implementors_of(&self, interface_name: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .structs
            .iter()
            .filter(|s| s.implements(interface_name))
            .map(|s| s.name.as_str())
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

fn push_unique(links: &mut Vec<Declaration>, declaration: Declaration) -> bool {
    if links.contains(&declaration) {
        return false;
    }
    links.push(declaration);
    true
}
