//! Cross-package view over every extracted unit.
//!
//! The universe is only built once all units have been collected, so name
//! resolution never depends on the order units were discovered in.

use crate::core::model::Position;
use crate::core::types::{GoType, Param, Signature};
use crate::extraction::declarations::{MethodDecl, PackageDecls, TypeDecl};
use std::collections::HashMap;

/// Bound on named-type chains and embedding depth; guards against cycles
/// the declaration checks do not reject.
pub const MAX_DEPTH: usize = 32;

#[derive(Clone, Copy, Debug)]
pub struct TypeRef<'a> {
    pub package: &'a str,
    pub decl: &'a TypeDecl,
}

/// Underlying form of a type, with the declaration that defined it when
/// the type was reached through a named type.
#[derive(Clone, Debug)]
pub struct Underlying<'a> {
    pub ty: GoType,
    pub origin: Option<TypeRef<'a>>,
}

/// A method of an interface's flattened method set.
#[derive(Clone, Debug, PartialEq)]
pub struct InterfaceMethod {
    pub name: String,
    pub signature: Signature,
    pub position: Option<Position>,
    pub package: Option<String>,
}

#[derive(Debug, Default)]
pub struct TypeUniverse<'a> {
    types: HashMap<&'a str, HashMap<&'a str, &'a TypeDecl>>,
    methods: HashMap<&'a str, HashMap<&'a str, Vec<&'a MethodDecl>>>,
}

impl<'a> TypeUniverse<'a> {
    pub fn new(packages: &'a [PackageDecls]) -> Self {
        let mut universe = Self::default();
        for package in packages {
            let path = package.import_path.as_str();
            let types = universe.types.entry(path).or_default();
            for decl in &package.types {
                types.insert(decl.name.as_str(), decl);
            }
            let methods = universe.methods.entry(path).or_default();
            for method in &package.methods {
                methods
                    .entry(method.receiver.as_str())
                    .or_default()
                    .push(method);
            }
        }
        universe
    }

    pub fn lookup(&self, package: &str, name: &str) -> Option<TypeRef<'a>> {
        let (package, decl) = self
            .types
            .get_key_value(package)
            .and_then(|(path, types)| types.get(name).map(|decl| (*path, *decl)))?;
        Some(TypeRef { package, decl })
    }

    pub fn declared_methods(&self, package: &str, name: &str) -> &[&'a MethodDecl] {
        self.methods
            .get(package)
            .and_then(|by_receiver| by_receiver.get(name))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Follow alias declarations to the defined type they stand for.
    pub fn resolve_alias(&self, ty: &GoType) -> GoType {
        let mut current = ty.clone();
        for _ in 0..MAX_DEPTH {
            let next = match &current {
                GoType::Named {
                    package,
                    name,
                    args,
                } => match self.lookup(package, name) {
                    Some(found) if found.decl.alias => Some(
                        found
                            .decl
                            .ty
                            .substitute(&bind_type_args(&found.decl.type_params, args)),
                    ),
                    _ => None,
                },
                _ => None,
            };
            match next {
                Some(next) => current = next,
                None => break,
            }
        }
        current
    }

    /// Resolve a type to its underlying form. Returns `None` for named types
    /// declared outside the corpus.
    pub fn underlying(&self, ty: &GoType) -> Option<Underlying<'a>> {
        let mut current = ty.clone();
        let mut origin = None;
        for _ in 0..MAX_DEPTH {
            let step = match &current {
                GoType::Named {
                    package,
                    name,
                    args,
                } => Some(self.lookup(package, name).map(|found| {
                    let next = found
                        .decl
                        .ty
                        .substitute(&bind_type_args(&found.decl.type_params, args));
                    (found, next)
                })),
                _ => None,
            };
            match step {
                None => {
                    return Some(Underlying {
                        ty: current,
                        origin,
                    })
                }
                Some(None) => return None,
                Some(Some((found, next))) => {
                    origin = Some(found);
                    current = next;
                }
            }
        }
        None
    }

    /// Flattened method set of an interface type: declared methods in
    /// declaration order, then methods of embedded interfaces in embedding
    /// order. Duplicate names keep the first occurrence.
    ///
    /// Returns `None` when the type is not an interface, embeds an interface
    /// the corpus does not declare, or carries type-set terms.
    pub fn interface_methods(&self, ty: &GoType) -> Option<Vec<InterfaceMethod>> {
        let mut methods = Vec::new();
        let mut visiting = Vec::new();
        if self.collect_interface(ty, &mut visiting, &mut methods, 0) {
            Some(methods)
        } else {
            None
        }
    }

    fn collect_interface(
        &self,
        ty: &GoType,
        visiting: &mut Vec<String>,
        out: &mut Vec<InterfaceMethod>,
        depth: usize,
    ) -> bool {
        if depth > MAX_DEPTH {
            return false;
        }
        let Some(underlying) = self.underlying(ty) else {
            return false;
        };
        let literal = match &underlying.ty {
            GoType::Interface(literal) => literal,
            GoType::Basic(name) if name == "any" => return true,
            GoType::Basic(name) if name == "error" => {
                push_method(out, error_method());
                return true;
            }
            _ => return false,
        };

        if let Some(origin) = underlying.origin {
            let key = format!("{}.{}", origin.package, origin.decl.name);
            if visiting.contains(&key) {
                return false;
            }
            visiting.push(key);
        }

        for (name, signature) in &literal.methods {
            let position = underlying.origin.map(|o| {
                o.decl
                    .member_positions
                    .get(name)
                    .cloned()
                    .unwrap_or_else(|| o.decl.position.clone())
            });
            push_method(
                out,
                InterfaceMethod {
                    name: name.clone(),
                    signature: signature.clone(),
                    position,
                    package: underlying.origin.map(|o| o.package.to_string()),
                },
            );
        }

        for embed in &literal.embeds {
            if !self.collect_interface(embed, visiting, out, depth + 1) {
                return false;
            }
        }

        if underlying.origin.is_some() {
            visiting.pop();
        }
        true
    }
}

fn push_method(out: &mut Vec<InterfaceMethod>, method: InterfaceMethod) {
    if !out.iter().any(|m| m.name == method.name) {
        out.push(method);
    }
}

/// `error` is the one predeclared interface: `interface{ Error() string }`.
fn error_method() -> InterfaceMethod {
    InterfaceMethod {
        name: "Error".to_string(),
        signature: Signature::new(Vec::new(), vec![Param::unnamed(GoType::basic("string"))]),
        position: None,
        package: None,
    }
}

/// Map declared type parameter names to instantiation arguments. An
/// uninstantiated reference binds nothing.
pub fn bind_type_args(params: &[String], args: &[GoType]) -> HashMap<String, GoType> {
    params
        .iter()
        .cloned()
        .zip(args.iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::{InterfaceLiteral, StructField};

    const PKG: &str = "example.com/app/io";

    fn decl(name: &str, ty: GoType) -> TypeDecl {
        TypeDecl {
            name: name.to_string(),
            type_params: Vec::new(),
            ty,
            position: Position::new("app/io/io.go", 1),
            alias: false,
            member_positions: HashMap::new(),
        }
    }

    fn method(name: &str) -> (String, Signature) {
        (name.to_string(), Signature::default())
    }

    fn package(types: Vec<TypeDecl>) -> PackageDecls {
        PackageDecls {
            import_path: PKG.to_string(),
            name: "io".to_string(),
            types,
            ..PackageDecls::default()
        }
    }

    #[test]
    fn test_flattens_embedded_interfaces() {
        let reader = decl(
            "Reader",
            GoType::Interface(InterfaceLiteral {
                methods: vec![method("Read")],
                embeds: vec![],
            }),
        );
        let read_closer = decl(
            "ReadCloser",
            GoType::Interface(InterfaceLiteral {
                methods: vec![method("Close")],
                embeds: vec![GoType::named(PKG, "Reader")],
            }),
        );
        let packages = vec![package(vec![reader, read_closer])];
        let universe = TypeUniverse::new(&packages);

        let methods = universe
            .interface_methods(&GoType::named(PKG, "ReadCloser"))
            .unwrap();
        let names: Vec<&str> = methods.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Close", "Read"]);
    }

    #[test]
    fn test_unknown_embedded_interface_is_incomplete() {
        let iface = decl(
            "Wrapped",
            GoType::Interface(InterfaceLiteral {
                methods: vec![method("Close")],
                embeds: vec![GoType::named("io", "Reader")],
            }),
        );
        let packages = vec![package(vec![iface])];
        let universe = TypeUniverse::new(&packages);
        assert!(universe
            .interface_methods(&GoType::named(PKG, "Wrapped"))
            .is_none());
    }

    #[test]
    fn test_embedded_error_contributes_error_method() {
        let iface = decl(
            "Coded",
            GoType::Interface(InterfaceLiteral {
                methods: vec![method("Code")],
                embeds: vec![GoType::basic("error")],
            }),
        );
        let packages = vec![package(vec![iface])];
        let universe = TypeUniverse::new(&packages);
        let methods = universe
            .interface_methods(&GoType::named(PKG, "Coded"))
            .unwrap();
        assert_eq!(methods.len(), 2);
        assert_eq!(methods[1].name, "Error");
    }

    #[test]
    fn test_underlying_follows_named_chain() {
        let base = decl(
            "Base",
            GoType::Struct(vec![StructField {
                name: "ID".into(),
                ty: GoType::basic("int"),
                embedded: false,
            }]),
        );
        let derived = decl("Derived", GoType::named(PKG, "Base"));
        let packages = vec![package(vec![base, derived])];
        let universe = TypeUniverse::new(&packages);

        let underlying = universe.underlying(&GoType::named(PKG, "Derived")).unwrap();
        assert!(matches!(underlying.ty, GoType::Struct(_)));
        assert_eq!(underlying.origin.unwrap().decl.name, "Base");
        assert!(universe.underlying(&GoType::named("sync", "Mutex")).is_none());
    }

    #[test]
    fn test_cyclic_interfaces_rejected() {
        let a = decl(
            "A",
            GoType::Interface(InterfaceLiteral {
                methods: vec![method("M")],
                embeds: vec![GoType::named(PKG, "B")],
            }),
        );
        let b = decl(
            "B",
            GoType::Interface(InterfaceLiteral {
                methods: vec![],
                embeds: vec![GoType::named(PKG, "A")],
            }),
        );
        let packages = vec![package(vec![a, b])];
        let universe = TypeUniverse::new(&packages);
        assert!(universe.interface_methods(&GoType::named(PKG, "A")).is_none());
    }
}
