//! Method signature compatibility.
//!
//! Two strategies sit behind [`SignatureMatcher`]. [`TypeCheckerBacked`]
//! compares lowered Go types under type identity and is used for native
//! analysis. [`StringHeuristic`] only sees rendered strings and is used when
//! re-resolving serialized results that carry no type information.

use crate::core::model::MethodInfo;
use crate::core::typed::{TypedCorpus, TypedMethod};
use crate::core::types::{GoType, InterfaceLiteral, Signature, StructField};
use std::collections::HashMap;

/// Which record a method belongs to, by index into the result lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Owner {
    Interface(usize),
    Struct(usize),
}

/// A method together with where it lives in the result.
#[derive(Clone, Copy, Debug)]
pub struct MethodSite<'a> {
    pub owner: Owner,
    pub index: usize,
    pub method: &'a MethodInfo,
}

impl<'a> MethodSite<'a> {
    pub fn interface(interface: usize, index: usize, method: &'a MethodInfo) -> Self {
        Self {
            owner: Owner::Interface(interface),
            index,
            method,
        }
    }

    pub fn structure(owner: usize, index: usize, method: &'a MethodInfo) -> Self {
        Self {
            owner: Owner::Struct(owner),
            index,
            method,
        }
    }
}

/// Type-parameter bindings accumulated while checking one struct against
/// one interface.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeBindings {
    bound: HashMap<String, GoType>,
}

impl TypeBindings {
    pub fn get(&self, param: &str) -> Option<&GoType> {
        self.bound.get(param)
    }

    pub fn bind(&mut self, param: impl Into<String>, ty: GoType) {
        self.bound.insert(param.into(), ty);
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }

    pub fn len(&self) -> usize {
        self.bound.len()
    }
}

pub trait SignatureMatcher: Send + Sync {
    /// Whether `candidate` (a struct method) can satisfy `target` (an
    /// interface method). A failed check leaves `bindings` unchanged.
    fn matches(
        &self,
        candidate: MethodSite<'_>,
        target: MethodSite<'_>,
        bindings: &mut TypeBindings,
    ) -> bool;

    fn name(&self) -> &'static str;
}

/// Portable matcher over rendered type strings.
///
/// A target type written as a single upper-case ASCII letter is taken to be
/// a type parameter and matches any candidate type. No other normalization
/// is done, so `interface{}` and `any` are different strings here.
#[derive(Clone, Copy, Debug, Default)]
pub struct StringHeuristic;

impl StringHeuristic {
    fn type_matches(candidate: &str, target: &str) -> bool {
        is_wildcard(target) || candidate == target
    }
}

pub fn is_wildcard(type_name: &str) -> bool {
    let mut chars = type_name.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_uppercase())
}

impl SignatureMatcher for StringHeuristic {
    fn matches(
        &self,
        candidate: MethodSite<'_>,
        target: MethodSite<'_>,
        _bindings: &mut TypeBindings,
    ) -> bool {
        let (c, t) = (candidate.method, target.method);
        c.name == t.name
            && c.parameters.len() == t.parameters.len()
            && c.return_types.len() == t.return_types.len()
            && c.parameters
                .iter()
                .zip(&t.parameters)
                .all(|(cp, tp)| Self::type_matches(&cp.type_name, &tp.type_name))
            && c.return_types
                .iter()
                .zip(&t.return_types)
                .all(|(cr, tr)| Self::type_matches(cr, tr))
    }

    fn name(&self) -> &'static str {
        "string-heuristic"
    }
}

/// Authoritative matcher over the typed side table.
#[derive(Clone, Debug, Default)]
pub struct TypeCheckerBacked {
    corpus: TypedCorpus,
}

impl TypeCheckerBacked {
    pub fn new(corpus: TypedCorpus) -> Self {
        Self { corpus }
    }

    pub fn corpus(&self) -> &TypedCorpus {
        &self.corpus
    }

    fn typed(&self, site: &MethodSite<'_>) -> Option<&TypedMethod> {
        match site.owner {
            Owner::Interface(i) => self.corpus.interface_method(i, site.index),
            Owner::Struct(i) => self.corpus.struct_method(i, site.index),
        }
    }

    fn type_params(&self, site: &MethodSite<'_>) -> &[String] {
        match site.owner {
            Owner::Interface(i) => self
                .corpus
                .interfaces
                .get(i)
                .map(|iface| iface.type_params.as_slice())
                .unwrap_or(&[]),
            Owner::Struct(_) => &[],
        }
    }
}

impl SignatureMatcher for TypeCheckerBacked {
    fn matches(
        &self,
        candidate: MethodSite<'_>,
        target: MethodSite<'_>,
        bindings: &mut TypeBindings,
    ) -> bool {
        if candidate.method.name != target.method.name {
            return false;
        }
        let (Some(have), Some(want)) = (self.typed(&candidate), self.typed(&target)) else {
            return false;
        };
        if !is_exported(&target.method.name) && have.package != want.package {
            return false;
        }

        let mut unifier = Unifier {
            vars: self.type_params(&target),
            bindings: bindings.clone(),
        };
        if unifier.signatures(&have.signature, &want.signature) {
            *bindings = unifier.bindings;
            true
        } else {
            false
        }
    }

    fn name(&self) -> &'static str {
        "type-checker"
    }
}

pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

/// Go type identity, with the target side's type parameters treated as
/// variables that bind on first use.
struct Unifier<'v> {
    vars: &'v [String],
    bindings: TypeBindings,
}

impl Unifier<'_> {
    fn signatures(&mut self, have: &Signature, want: &Signature) -> bool {
        have.variadic == want.variadic
            && have.params.len() == want.params.len()
            && have.results.len() == want.results.len()
            && have
                .params
                .iter()
                .zip(&want.params)
                .chain(have.results.iter().zip(&want.results))
                .all(|(h, w)| self.identical(&h.ty, &w.ty))
    }

    fn identical(&mut self, have: &GoType, want: &GoType) -> bool {
        if let GoType::TypeParam(param) = want {
            if self.vars.contains(param) {
                return match self.bindings.get(param) {
                    Some(bound) => {
                        // bound types come from the struct side and hold no variables
                        let bound = bound.clone();
                        let vars = std::mem::replace(&mut self.vars, &[]);
                        let same = self.identical(have, &bound);
                        self.vars = vars;
                        same
                    }
                    None => {
                        self.bindings.bind(param.clone(), have.clone());
                        true
                    }
                };
            }
        }

        let have = canonical(have);
        let want = canonical(want);
        match (have.as_ref(), want.as_ref()) {
            (GoType::Basic(a), GoType::Basic(b)) => a == b,
            (GoType::TypeParam(a), GoType::TypeParam(b)) => a == b,
            (GoType::Constraint(a), GoType::Constraint(b)) => a == b,
            (
                GoType::Named {
                    package: pa,
                    name: na,
                    args: aa,
                },
                GoType::Named {
                    package: pb,
                    name: nb,
                    args: ab,
                },
            ) => {
                pa == pb
                    && na == nb
                    && aa.len() == ab.len()
                    && aa.iter().zip(ab).all(|(a, b)| self.identical(a, b))
            }
            (GoType::Pointer(a), GoType::Pointer(b)) | (GoType::Slice(a), GoType::Slice(b)) => {
                self.identical(a, b)
            }
            (GoType::Array { len: la, elem: ea }, GoType::Array { len: lb, elem: eb }) => {
                la == lb && self.identical(ea, eb)
            }
            (GoType::Map { key: ka, value: va }, GoType::Map { key: kb, value: vb }) => {
                self.identical(ka, kb) && self.identical(va, vb)
            }
            (GoType::Chan { dir: da, elem: ea }, GoType::Chan { dir: db, elem: eb }) => {
                da == db && self.identical(ea, eb)
            }
            (GoType::Func(a), GoType::Func(b)) => self.signatures(a, b),
            (GoType::Interface(a), GoType::Interface(b)) => self.interfaces(a, b),
            (GoType::Struct(a), GoType::Struct(b)) => self.structs(a, b),
            _ => false,
        }
    }

    /// Interface literals are identical when they have the same methods,
    /// regardless of order.
    fn interfaces(&mut self, have: &InterfaceLiteral, want: &InterfaceLiteral) -> bool {
        if have.methods.len() != want.methods.len() || have.embeds.len() != want.embeds.len() {
            return false;
        }
        let methods_match = want.methods.iter().all(|(name, want_sig)| {
            match have.methods.iter().find(|(n, _)| n == name) {
                Some((_, have_sig)) => self.signatures(have_sig, want_sig),
                None => false,
            }
        });
        methods_match
            && have
                .embeds
                .iter()
                .zip(&want.embeds)
                .all(|(a, b)| self.identical(a, b))
    }

    fn structs(&mut self, have: &[StructField], want: &[StructField]) -> bool {
        have.len() == want.len()
            && have.iter().zip(want).all(|(a, b)| {
                a.name == b.name && a.embedded == b.embedded && self.identical(&a.ty, &b.ty)
            })
    }
}

/// Resolve predeclared aliases: `byte` is `uint8`, `rune` is `int32` and
/// `any` is `interface{}`.
fn canonical(ty: &GoType) -> std::borrow::Cow<'_, GoType> {
    use std::borrow::Cow;
    match ty {
        GoType::Basic(name) => match name.as_str() {
            "byte" => Cow::Owned(GoType::basic("uint8")),
            "rune" => Cow::Owned(GoType::basic("int32")),
            "any" => Cow::Owned(GoType::empty_interface()),
            _ => Cow::Borrowed(ty),
        },
        _ => Cow::Borrowed(ty),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{ParamInfo, Position};
    use crate::core::typed::{TypedInterface, TypedStruct};
    use crate::core::types::Param;

    fn method(name: &str, params: &[&str], returns: &[&str]) -> MethodInfo {
        MethodInfo::new(name, Position::new("a.go", 1))
            .with_parameters(
                params
                    .iter()
                    .enumerate()
                    .map(|(i, t)| ParamInfo::new(format!("p{}", i), *t))
                    .collect(),
            )
            .with_return_types(returns.iter().map(|r| r.to_string()).collect())
    }

    fn check(matcher: &dyn SignatureMatcher, candidate: &MethodInfo, target: &MethodInfo) -> bool {
        matcher.matches(
            MethodSite::structure(0, 0, candidate),
            MethodSite::interface(0, 0, target),
            &mut TypeBindings::default(),
        )
    }

    #[test]
    fn test_heuristic_exact_match() {
        let area = method("Area", &[], &["float64"]);
        assert!(check(&StringHeuristic, &area, &area.clone()));
        assert!(!check(&StringHeuristic, &method("Perimeter", &[], &["float64"]), &area));
        assert!(!check(&StringHeuristic, &method("Area", &[], &["int"]), &area));
    }

    #[test]
    fn test_heuristic_wildcards() {
        let target = method("Get", &["K"], &["V", "error"]);
        let candidate = method("Get", &["string"], &["*User", "error"]);
        assert!(check(&StringHeuristic, &candidate, &target));

        let strict_error = method("Get", &["string"], &["*User", "Err"]);
        assert!(!check(&StringHeuristic, &candidate, &strict_error));
    }

    #[test]
    fn test_heuristic_count_mismatch() {
        let target = method("Put", &["K", "V"], &[]);
        assert!(!check(&StringHeuristic, &method("Put", &["string"], &[]), &target));
        assert!(!check(
            &StringHeuristic,
            &method("Put", &["string", "int"], &["error"]),
            &target
        ));
    }

    #[test]
    fn test_heuristic_performs_no_normalization() {
        let target = method("Handle", &["interface{}"], &[]);
        assert!(!check(&StringHeuristic, &method("Handle", &["any"], &[]), &target));
    }

    #[test]
    fn test_is_wildcard() {
        assert!(is_wildcard("T"));
        assert!(!is_wildcard("t"));
        assert!(!is_wildcard("TT"));
        assert!(!is_wildcard(""));
        assert!(!is_wildcard("É"));
    }

    fn typed_method(package: &str, params: Vec<GoType>, results: Vec<GoType>) -> TypedMethod {
        TypedMethod {
            signature: Signature::new(
                params.into_iter().map(Param::unnamed).collect(),
                results.into_iter().map(Param::unnamed).collect(),
            ),
            package: package.to_string(),
        }
    }

    fn corpus(
        type_params: &[&str],
        interface: Vec<TypedMethod>,
        structure: Vec<TypedMethod>,
    ) -> TypeCheckerBacked {
        TypeCheckerBacked::new(TypedCorpus {
            interfaces: vec![TypedInterface {
                package: "example.com/app".into(),
                type_params: type_params.iter().map(|p| p.to_string()).collect(),
                methods: interface,
            }],
            structs: vec![TypedStruct {
                package: "example.com/app".into(),
                methods: structure,
            }],
        })
    }

    #[test]
    fn test_typed_identity_aliases() {
        let matcher = corpus(
            &[],
            vec![typed_method(
                "p",
                vec![GoType::slice(GoType::basic("byte"))],
                vec![GoType::basic("any")],
            )],
            vec![typed_method(
                "p",
                vec![GoType::slice(GoType::basic("uint8"))],
                vec![GoType::empty_interface()],
            )],
        );
        let m = method("Write", &[], &[]);
        assert!(check(&matcher, &m, &m));
    }

    #[test]
    fn test_typed_unexported_requires_same_package() {
        let matcher = corpus(
            &[],
            vec![typed_method("example.com/a", vec![], vec![])],
            vec![typed_method("example.com/b", vec![], vec![])],
        );
        let hidden = method("close", &[], &[]);
        assert!(!check(&matcher, &hidden, &hidden));

        let exported = method("Close", &[], &[]);
        assert!(check(&matcher, &exported, &exported));
    }

    #[test]
    fn test_typed_bindings_consistent_across_methods() {
        let k = GoType::TypeParam("K".into());
        let v = GoType::TypeParam("V".into());
        let user = GoType::pointer(GoType::named("example.com/app", "User"));
        let matcher = TypeCheckerBacked::new(TypedCorpus {
            interfaces: vec![TypedInterface {
                package: "example.com/app".into(),
                type_params: vec!["K".into(), "V".into()],
                methods: vec![
                    typed_method("example.com/app", vec![k.clone()], vec![v.clone()]),
                    typed_method("example.com/app", vec![k, v], vec![]),
                ],
            }],
            structs: vec![TypedStruct {
                package: "example.com/app".into(),
                methods: vec![
                    typed_method("example.com/app", vec![GoType::basic("string")], vec![user.clone()]),
                    typed_method("example.com/app", vec![GoType::basic("int"), user.clone()], vec![]),
                    typed_method("example.com/app", vec![GoType::basic("string"), user], vec![]),
                ],
            }],
        });

        let get = method("Get", &[], &[]);
        let put = method("Put", &[], &[]);
        let mut bindings = TypeBindings::default();
        assert!(matcher.matches(
            MethodSite::structure(0, 0, &get),
            MethodSite::interface(0, 0, &get),
            &mut bindings
        ));
        assert_eq!(bindings.get("K"), Some(&GoType::basic("string")));

        // K already bound to string: the int overload fails and leaves bindings intact
        assert!(!matcher.matches(
            MethodSite::structure(0, 1, &put),
            MethodSite::interface(0, 1, &put),
            &mut bindings
        ));
        assert_eq!(bindings.len(), 2);
        assert!(matcher.matches(
            MethodSite::structure(0, 2, &put),
            MethodSite::interface(0, 1, &put),
            &mut bindings
        ));
    }

    #[test]
    fn test_typed_variadic_must_agree() {
        let mut variadic = typed_method("p", vec![GoType::slice(GoType::basic("string"))], vec![]);
        variadic.signature.variadic = true;
        let plain = typed_method("p", vec![GoType::slice(GoType::basic("string"))], vec![]);
        let matcher = corpus(&[], vec![variadic], vec![plain]);
        let m = method("Log", &[], &[]);
        assert!(!check(&matcher, &m, &m));
    }

    #[test]
    fn test_typed_missing_side_table_never_matches() {
        let matcher = TypeCheckerBacked::default();
        let m = method("Close", &[], &[]);
        assert!(!check(&matcher, &m, &m));
    }
}
