//! Go type expressions as seen by the extractor.
//!
//! `GoType` keeps enough structure for the type-checker-backed matcher to
//! decide identity, and renders to the same canonical strings that
//! `go/types.TypeString` produces without a qualifier.

use std::collections::HashMap;
use std::fmt::{self, Write as _};

/// Identifiers predeclared in Go's universe scope that name types.
pub const PREDECLARED_TYPES: &[&str] = &[
    "any",
    "bool",
    "byte",
    "comparable",
    "complex64",
    "complex128",
    "error",
    "float32",
    "float64",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "rune",
    "string",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
];

pub fn is_predeclared(name: &str) -> bool {
    PREDECLARED_TYPES.contains(&name)
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ChanDir {
    #[default]
    Both,
    Send,
    Recv,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum GoType {
    /// Predeclared type such as `int`, `error` or `any`.
    Basic(String),
    /// Defined type, qualified by its package import path.
    Named {
        package: String,
        name: String,
        args: Vec<GoType>,
    },
    /// Type parameter in scope at the point of use.
    TypeParam(String),
    Pointer(Box<GoType>),
    Slice(Box<GoType>),
    Array {
        len: String,
        elem: Box<GoType>,
    },
    Map {
        key: Box<GoType>,
        value: Box<GoType>,
    },
    Chan {
        dir: ChanDir,
        elem: Box<GoType>,
    },
    Func(Box<Signature>),
    Interface(InterfaceLiteral),
    Struct(Vec<StructField>),
    /// Type-set terms (`~int | string`) that only occur in constraints.
    Constraint(String),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Param {
    pub name: String,
    pub ty: GoType,
}

impl Default for GoType {
    fn default() -> Self {
        GoType::Interface(InterfaceLiteral::default())
    }
}

/// Parameters and results of a function or method. For a variadic
/// signature the last parameter's type is the slice type `[]T`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Signature {
    pub params: Vec<Param>,
    pub results: Vec<Param>,
    pub variadic: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct InterfaceLiteral {
    pub methods: Vec<(String, Signature)>,
    pub embeds: Vec<GoType>,
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StructField {
    pub name: String,
    pub ty: GoType,
    pub embedded: bool,
}

impl GoType {
    pub fn basic(name: impl Into<String>) -> Self {
        GoType::Basic(name.into())
    }

    pub fn named(package: impl Into<String>, name: impl Into<String>) -> Self {
        GoType::Named {
            package: package.into(),
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn pointer(elem: GoType) -> Self {
        GoType::Pointer(Box::new(elem))
    }

    pub fn slice(elem: GoType) -> Self {
        GoType::Slice(Box::new(elem))
    }

    pub fn empty_interface() -> Self {
        GoType::Interface(InterfaceLiteral::default())
    }

    /// Strip one level of pointer indirection.
    pub fn deref(&self) -> (&GoType, bool) {
        match self {
            GoType::Pointer(inner) => (inner, true),
            other => (other, false),
        }
    }

    /// Canonical rendering, matching `types.TypeString(t, nil)`.
    pub fn render(&self) -> String {
        let mut out = String::new();
        self.write_to(&mut out);
        out
    }

    fn write_to(&self, out: &mut String) {
        match self {
            GoType::Basic(name) | GoType::TypeParam(name) | GoType::Constraint(name) => {
                out.push_str(name)
            }
            GoType::Named {
                package,
                name,
                args,
            } => {
                if !package.is_empty() {
                    out.push_str(package);
                    out.push('.');
                }
                out.push_str(name);
                if !args.is_empty() {
                    out.push('[');
                    write_list(out, args, ", ");
                    out.push(']');
                }
            }
            GoType::Pointer(elem) => {
                out.push('*');
                elem.write_to(out);
            }
            GoType::Slice(elem) => {
                out.push_str("[]");
                elem.write_to(out);
            }
            GoType::Array { len, elem } => {
                let _ = write!(out, "[{}]", len);
                elem.write_to(out);
            }
            GoType::Map { key, value } => {
                out.push_str("map[");
                key.write_to(out);
                out.push(']');
                value.write_to(out);
            }
            GoType::Chan { dir, elem } => {
                out.push_str(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                });
                // chan (<-chan T) needs parentheses to stay unambiguous
                let needs_parens = *dir == ChanDir::Both
                    && matches!(**elem, GoType::Chan { dir: ChanDir::Recv, .. });
                if needs_parens {
                    out.push('(');
                }
                elem.write_to(out);
                if needs_parens {
                    out.push(')');
                }
            }
            GoType::Func(sig) => {
                out.push_str("func");
                sig.write_to(out);
            }
            GoType::Interface(literal) => {
                out.push_str("interface{");
                let mut first = true;
                for embed in &literal.embeds {
                    if !first {
                        out.push_str("; ");
                    }
                    first = false;
                    embed.write_to(out);
                }
                for (name, sig) in &literal.methods {
                    if !first {
                        out.push_str("; ");
                    }
                    first = false;
                    out.push_str(name);
                    sig.write_to(out);
                }
                out.push('}');
            }
            GoType::Struct(fields) => {
                out.push_str("struct{");
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    if !field.embedded {
                        out.push_str(&field.name);
                        out.push(' ');
                    }
                    field.ty.write_to(out);
                }
                out.push('}');
            }
        }
    }

    /// Replace type parameters by name. Unmapped parameters are kept.
    pub fn substitute(&self, map: &HashMap<String, GoType>) -> GoType {
        if map.is_empty() {
            return self.clone();
        }
        match self {
            GoType::TypeParam(name) => map.get(name).cloned().unwrap_or_else(|| self.clone()),
            GoType::Basic(_) | GoType::Constraint(_) => self.clone(),
            GoType::Named {
                package,
                name,
                args,
            } => GoType::Named {
                package: package.clone(),
                name: name.clone(),
                args: args.iter().map(|a| a.substitute(map)).collect(),
            },
            GoType::Pointer(elem) => GoType::Pointer(Box::new(elem.substitute(map))),
            GoType::Slice(elem) => GoType::Slice(Box::new(elem.substitute(map))),
            GoType::Array { len, elem } => GoType::Array {
                len: len.clone(),
                elem: Box::new(elem.substitute(map)),
            },
            GoType::Map { key, value } => GoType::Map {
                key: Box::new(key.substitute(map)),
                value: Box::new(value.substitute(map)),
            },
            GoType::Chan { dir, elem } => GoType::Chan {
                dir: *dir,
                elem: Box::new(elem.substitute(map)),
            },
            GoType::Func(sig) => GoType::Func(Box::new(sig.substitute(map))),
            GoType::Interface(literal) => GoType::Interface(InterfaceLiteral {
                methods: literal
                    .methods
                    .iter()
                    .map(|(n, s)| (n.clone(), s.substitute(map)))
                    .collect(),
                embeds: literal.embeds.iter().map(|e| e.substitute(map)).collect(),
            }),
            GoType::Struct(fields) => GoType::Struct(
                fields
                    .iter()
                    .map(|f| StructField {
                        name: f.name.clone(),
                        ty: f.ty.substitute(map),
                        embedded: f.embedded,
                    })
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for GoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl Param {
    pub fn new(name: impl Into<String>, ty: GoType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    pub fn unnamed(ty: GoType) -> Self {
        Self::new(String::new(), ty)
    }
}

impl Signature {
    pub fn new(params: Vec<Param>, results: Vec<Param>) -> Self {
        Self {
            params,
            results,
            variadic: false,
        }
    }

    pub fn substitute(&self, map: &HashMap<String, GoType>) -> Signature {
        let sub = |p: &Param| Param::new(p.name.clone(), p.ty.substitute(map));
        Signature {
            params: self.params.iter().map(sub).collect(),
            results: self.results.iter().map(sub).collect(),
            variadic: self.variadic,
        }
    }

    /// Rendered parameter types, in order.
    pub fn param_types(&self) -> Vec<String> {
        self.params.iter().map(|p| p.ty.render()).collect()
    }

    /// Rendered result types, in order.
    pub fn result_types(&self) -> Vec<String> {
        self.results.iter().map(|p| p.ty.render()).collect()
    }

    fn write_to(&self, out: &mut String) {
        out.push('(');
        let last = self.params.len().saturating_sub(1);
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            if !param.name.is_empty() {
                out.push_str(&param.name);
                out.push(' ');
            }
            match (&param.ty, self.variadic && i == last) {
                (GoType::Slice(elem), true) => {
                    out.push_str("...");
                    elem.write_to(out);
                }
                (ty, _) => ty.write_to(out),
            }
        }
        out.push(')');

        match self.results.as_slice() {
            [] => {}
            [single] if single.name.is_empty() => {
                out.push(' ');
                single.ty.write_to(out);
            }
            results => {
                out.push_str(" (");
                for (i, result) in results.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    if !result.name.is_empty() {
                        out.push_str(&result.name);
                        out.push(' ');
                    }
                    result.ty.write_to(out);
                }
                out.push(')');
            }
        }
    }
}

fn write_list(out: &mut String, types: &[GoType], sep: &str) {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        ty.write_to(out);
    }
}
