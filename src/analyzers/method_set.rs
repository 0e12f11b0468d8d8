//! Method sets for struct types.
//!
//! Go gives every defined type two method sets: the one reachable through a
//! value of type `T` and the larger one reachable through `*T`. Promoted
//! methods are found breadth-first through embedded fields, where a name at
//! a shallower depth shadows deeper ones and a name found twice at the same
//! depth is ambiguous and promotes nothing.

use crate::core::model::{MethodInfo, Position};
use crate::core::types::{GoType, Signature};
use crate::extraction::universe::{bind_type_args, TypeUniverse, MAX_DEPTH};
use std::collections::{BTreeMap, HashSet};

/// One entry of a computed method set.
#[derive(Clone, Debug, PartialEq)]
pub struct MethodEntry {
    pub name: String,
    pub signature: Signature,
    pub position: Position,
    /// Import path of the declaring package.
    pub package: String,
}

impl MethodEntry {
    pub fn to_method_info(&self) -> MethodInfo {
        MethodInfo::from_signature(self.name.clone(), self.position.clone(), &self.signature)
    }
}

/// Anything that can take part in a method-set merge.
pub trait NamedMethod {
    fn method_name(&self) -> &str;
}

impl NamedMethod for MethodEntry {
    fn method_name(&self) -> &str {
        &self.name
    }
}

impl NamedMethod for MethodInfo {
    fn method_name(&self) -> &str {
        &self.name
    }
}

/// Merge value-receiver and pointer-receiver method sets into one list with
/// unique names. The value set is taken first, so its entry wins when both
/// sets carry the same name.
pub fn merge_method_sets<M: NamedMethod + Clone>(value: &[M], pointer: &[M]) -> Vec<M> {
    let mut merged: Vec<M> = Vec::with_capacity(value.len() + pointer.len());
    for method in value.iter().chain(pointer) {
        if !merged
            .iter()
            .any(|existing| existing.method_name() == method.method_name())
        {
            merged.push(method.clone());
        }
    }
    merged
}

#[derive(Clone, Debug, Default)]
pub struct MethodSets {
    pub value: Vec<MethodEntry>,
    pub pointer: Vec<MethodEntry>,
}

impl MethodSets {
    /// The canonical, name-deduplicated method list.
    pub fn canonical(&self) -> Vec<MethodEntry> {
        merge_method_sets(&self.value, &self.pointer)
    }
}

#[derive(Clone, Debug)]
struct Candidate {
    entry: MethodEntry,
    pointer_receiver: bool,
    indirect: bool,
    collides: bool,
}

pub struct MethodSetBuilder<'u, 'a> {
    universe: &'u TypeUniverse<'a>,
}

impl<'u, 'a> MethodSetBuilder<'u, 'a> {
    pub fn new(universe: &'u TypeUniverse<'a>) -> Self {
        Self { universe }
    }

    /// Method sets of the named type `package.name`, instantiated with its
    /// own type parameters.
    pub fn build(&self, package: &str, name: &str) -> MethodSets {
        let args = self
            .universe
            .lookup(package, name)
            .map(|found| {
                found
                    .decl
                    .type_params
                    .iter()
                    .map(|p| GoType::TypeParam(p.clone()))
                    .collect()
            })
            .unwrap_or_default();
        let root = GoType::Named {
            package: package.to_string(),
            name: name.to_string(),
            args,
        };
        MethodSets {
            value: self.collect(&root, false),
            pointer: self.collect(&root, true),
        }
    }

    /// Breadth-first walk over the embedding tree of `root`.
    fn collect(&self, root: &GoType, pointer_root: bool) -> Vec<MethodEntry> {
        let mut found: BTreeMap<String, Option<Candidate>> = BTreeMap::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut current = vec![(root.clone(), pointer_root)];

        for _ in 0..MAX_DEPTH {
            if current.is_empty() {
                break;
            }
            let mut level: BTreeMap<String, Vec<Candidate>> = BTreeMap::new();
            let mut level_fields: Vec<String> = Vec::new();
            let mut next = Vec::new();

            for (ty, indirect, multiples) in consolidate(self.universe, current) {
                if let GoType::Named { package, name, .. } = &ty {
                    if !seen.insert(format!("{}.{}", package, name)) {
                        continue;
                    }
                }
                self.declared_candidates(&ty, indirect, multiples, &mut level);

                let Some(underlying) = self.universe.underlying(&ty) else {
                    continue;
                };
                match underlying.ty {
                    GoType::Struct(fields) => {
                        for field in fields {
                            level_fields.push(field.name.clone());
                            if field.embedded {
                                let (inner, via_pointer) = field.ty.deref();
                                next.push((inner.clone(), indirect || via_pointer));
                            }
                        }
                    }
                    GoType::Interface(_) => {
                        self.interface_candidates(&ty, indirect, multiples, &mut level);
                    }
                    _ => {}
                }
            }

            for (name, mut candidates) in level {
                if found.contains_key(&name) {
                    continue;
                }
                let unique = candidates.len() == 1
                    && !candidates[0].collides
                    && !level_fields.contains(&name);
                found.insert(name, if unique { candidates.pop() } else { None });
            }
            for field in level_fields {
                found.entry(field).or_insert(None);
            }
            current = next;
        }

        found
            .into_values()
            .flatten()
            .filter(|c| !c.pointer_receiver || c.indirect)
            .map(|c| c.entry)
            .collect()
    }

    fn declared_candidates(
        &self,
        ty: &GoType,
        indirect: bool,
        collides: bool,
        level: &mut BTreeMap<String, Vec<Candidate>>,
    ) {
        let GoType::Named {
            package,
            name,
            args,
        } = ty
        else {
            return;
        };
        for method in self.universe.declared_methods(package, name) {
            let bindings = bind_type_args(&method.receiver_params, args);
            level.entry(method.name.clone()).or_default().push(Candidate {
                entry: MethodEntry {
                    name: method.name.clone(),
                    signature: method.signature.substitute(&bindings),
                    position: method.position.clone(),
                    package: package.clone(),
                },
                pointer_receiver: method.pointer_receiver,
                indirect,
                collides,
            });
        }
    }

    fn interface_candidates(
        &self,
        ty: &GoType,
        indirect: bool,
        collides: bool,
        level: &mut BTreeMap<String, Vec<Candidate>>,
    ) {
        let Some(methods) = self.universe.interface_methods(ty) else {
            return;
        };
        let fallback_package = match ty {
            GoType::Named { package, .. } => package.clone(),
            _ => String::new(),
        };
        for method in methods {
            level.entry(method.name.clone()).or_default().push(Candidate {
                entry: MethodEntry {
                    name: method.name,
                    signature: method.signature,
                    position: method.position.unwrap_or_default(),
                    package: method.package.unwrap_or_else(|| fallback_package.clone()),
                },
                pointer_receiver: false,
                indirect,
                collides,
            });
        }
    }
}

/// Collapse repeated embedded types at one depth. A type embedded more than
/// once at the same depth makes all of its methods ambiguous.
fn consolidate(
    universe: &TypeUniverse<'_>,
    level: Vec<(GoType, bool)>,
) -> Vec<(GoType, bool, bool)> {
    let mut out: Vec<(GoType, bool, bool)> = Vec::with_capacity(level.len());
    for (ty, indirect) in level {
        let ty = universe.resolve_alias(&ty);
        let key = type_key(&ty);
        let existing = key.as_ref().and_then(|key| {
            out.iter_mut()
                .find(|(other, _, _)| type_key(other).as_ref() == Some(key))
        });
        match existing {
            Some(entry) => entry.2 = true,
            None => out.push((ty, indirect, false)),
        }
    }
    out
}

fn type_key(ty: &GoType) -> Option<String> {
    match ty {
        GoType::Named { package, name, .. } => Some(format!("{}.{}", package, name)),
        _ => None,
    }
}
