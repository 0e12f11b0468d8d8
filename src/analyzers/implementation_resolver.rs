/// Two-phase resolution of the implements relation.
///
/// The resolver is constructed from the complete interface list; only then
/// can structs be resolved against it. Structs are independent of each other
/// and are resolved in parallel, interfaces are only read.
use crate::analyzers::signature_matcher::{
    MethodSite, SignatureMatcher, StringHeuristic, TypeBindings, TypeCheckerBacked,
};
use crate::core::model::{AnalysisResult, InterfaceInfo, StructInfo};
use crate::core::typed::TypedCorpus;
use rayon::prelude::*;
use tracing::{debug, info_span};

/// Counts of links added by one resolution pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolutionStats {
    pub interface_links: usize,
    pub method_links: usize,
}

impl std::ops::Add for ResolutionStats {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self {
            interface_links: self.interface_links + other.interface_links,
            method_links: self.method_links + other.method_links,
        }
    }
}

pub struct ImplementationResolver<M: SignatureMatcher> {
    interfaces: Vec<InterfaceInfo>,
    matcher: M,
    parallel: bool,
}

impl ImplementationResolver<TypeCheckerBacked> {
    /// Resolver backed by the typed side table of the same extraction.
    pub fn typed(interfaces: &[InterfaceInfo], corpus: TypedCorpus) -> Self {
        Self::new(interfaces, TypeCheckerBacked::new(corpus))
    }
}

impl ImplementationResolver<StringHeuristic> {
    pub fn heuristic(interfaces: &[InterfaceInfo]) -> Self {
        Self::new(interfaces, StringHeuristic)
    }
}

impl<M: SignatureMatcher> ImplementationResolver<M> {
    pub fn new(interfaces: &[InterfaceInfo], matcher: M) -> Self {
        Self {
            interfaces: interfaces.to_vec(),
            matcher,
            parallel: true,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn interfaces(&self) -> &[InterfaceInfo] {
        &self.interfaces
    }

    /// Resolve every struct against every interface, adding links in place.
    /// Struct indices must line up with the matcher's side table.
    pub fn resolve(&self, structs: &mut [StructInfo]) -> ResolutionStats {
        let _span = info_span!(
            "resolve",
            matcher = self.matcher.name(),
            interfaces = self.interfaces.len(),
            structs = structs.len()
        )
        .entered();

        let stats = if self.parallel {
            structs
                .par_iter_mut()
                .enumerate()
                .map(|(index, s)| self.resolve_struct(index, s))
                .reduce(ResolutionStats::default, |a, b| a + b)
        } else {
            structs
                .iter_mut()
                .enumerate()
                .map(|(index, s)| self.resolve_struct(index, s))
                .fold(ResolutionStats::default(), |a, b| a + b)
        };

        debug!(
            interface_links = stats.interface_links,
            method_links = stats.method_links,
            "resolution finished"
        );
        stats
    }

    fn resolve_struct(&self, index: usize, target: &mut StructInfo) -> ResolutionStats {
        let mut stats = ResolutionStats::default();
        for (i, interface) in self.interfaces.iter().enumerate() {
            // Zero-method interfaces never produce links.
            if interface.methods.is_empty() {
                continue;
            }
            let Some(matched) = self.match_interface(index, target, i, interface) else {
                continue;
            };
            if target.add_implemented_interface(interface.declaration()) {
                stats.interface_links += 1;
            }
            for (method_index, struct_method) in matched {
                let link = interface.method_declaration(&interface.methods[method_index]);
                if target.methods[struct_method].add_implemented_from(link) {
                    stats.method_links += 1;
                }
            }
        }
        stats
    }

    /// Pairs of (interface method, struct method) indices when every method
    /// of `interface` has a compatible candidate, searched first-match.
    fn match_interface(
        &self,
        index: usize,
        target: &StructInfo,
        interface_index: usize,
        interface: &InterfaceInfo,
    ) -> Option<Vec<(usize, usize)>> {
        let mut bindings = TypeBindings::default();
        interface
            .methods
            .iter()
            .enumerate()
            .map(|(j, wanted)| {
                let site = MethodSite::interface(interface_index, j, wanted);
                target
                    .methods
                    .iter()
                    .enumerate()
                    .position(|(k, candidate)| {
                        self.matcher.matches(
                            MethodSite::structure(index, k, candidate),
                            site,
                            &mut bindings,
                        )
                    })
                    .map(|k| (j, k))
            })
            .collect()
    }
}

/// Resolve all structs of `result` against its own interfaces.
pub fn resolve_all<M: SignatureMatcher>(
    result: &mut AnalysisResult,
    matcher: M,
    parallel: bool,
) -> ResolutionStats {
    let resolver = ImplementationResolver::new(&result.interfaces, matcher).with_parallel(parallel);
    resolver.resolve(&mut result.structs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{Declaration, MethodInfo, ParamInfo, Position};
    use pretty_assertions::assert_eq;

    fn interface(name: &str, line: usize, methods: Vec<MethodInfo>) -> InterfaceInfo {
        InterfaceInfo {
            name: name.into(),
            position: Position::new("shapes/shape.go", line),
            methods,
        }
    }

    fn structure(name: &str, methods: Vec<MethodInfo>) -> StructInfo {
        StructInfo {
            name: name.into(),
            position: Position::new(format!("shapes/{}.go", name.to_lowercase()), 1),
            methods,
            ..StructInfo::default()
        }
    }

    fn float_method(name: &str, line: usize) -> MethodInfo {
        MethodInfo::new(name, Position::new("shapes/shape.go", line))
            .with_return_types(vec!["float64".into()])
    }

    fn shapes() -> AnalysisResult {
        AnalysisResult::new(
            vec![interface(
                "Shape",
                3,
                vec![float_method("Area", 4), float_method("Perimeter", 5)],
            )],
            vec![
                structure(
                    "Circle",
                    vec![float_method("Area", 10), float_method("Perimeter", 14)],
                ),
                structure("Square", vec![float_method("Area", 20)]),
            ],
        )
    }

    #[test]
    fn test_shape_circle_square() {
        let mut result = shapes();
        let stats = resolve_all(&mut result, StringHeuristic, true);
        assert_eq!(stats.interface_links, 1);
        assert_eq!(stats.method_links, 2);

        let circle = result.find_struct("Circle").unwrap();
        assert_eq!(
            circle.implemented_interfaces,
            vec![Declaration::new("Shape", Position::new("shapes/shape.go", 3))]
        );
        assert_eq!(
            circle.method("Area").unwrap().implemented_from,
            vec![Declaration::new("Shape.Area", Position::new("shapes/shape.go", 4))]
        );

        let square = result.find_struct("Square").unwrap();
        assert!(square.implemented_interfaces.is_empty());
        assert!(square.methods[0].implemented_from.is_empty());
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let mut once = shapes();
        resolve_all(&mut once, StringHeuristic, false);
        let mut twice = once.clone();
        let stats = resolve_all(&mut twice, StringHeuristic, false);
        assert_eq!(stats, ResolutionStats::default());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_first_matching_candidate_wins() {
        let target = interface(
            "Getter",
            1,
            vec![MethodInfo::new("Get", Position::new("g.go", 2))
                .with_parameters(vec![ParamInfo::new("key", "K")])],
        );
        let mut result = AnalysisResult::new(
            vec![target],
            vec![structure(
                "Store",
                vec![
                    MethodInfo::new("Get", Position::new("s.go", 5))
                        .with_parameters(vec![ParamInfo::new("id", "int")]),
                ],
            )],
        );
        resolve_all(&mut result, StringHeuristic, false);
        let store = &result.structs[0];
        assert!(store.implements("Getter"));
        assert_eq!(store.methods[0].implemented_from[0].name, "Getter.Get");
    }

    #[test]
    fn test_empty_interface_is_never_linked() {
        let mut result = AnalysisResult::new(
            vec![interface("Empty", 1, Vec::new())],
            vec![
                structure("Circle", vec![float_method("Area", 10)]),
                structure("Marker", Vec::new()),
            ],
        );
        let stats = resolve_all(&mut result, StringHeuristic, true);
        assert_eq!(stats, ResolutionStats::default());
        assert!(result.structs.iter().all(|s| s.implemented_interfaces.is_empty()));
    }

    #[test]
    fn test_parallel_and_sequential_agree() {
        let mut parallel = shapes();
        let mut sequential = shapes();
        resolve_all(&mut parallel, StringHeuristic, true);
        resolve_all(&mut sequential, StringHeuristic, false);
        assert_eq!(parallel, sequential);
    }

    #[test]
    fn test_links_follow_interface_order() {
        let closer = interface("Closer", 1, vec![MethodInfo::new("Close", Position::new("c.go", 2))]);
        let flusher = interface("Flusher", 4, vec![MethodInfo::new("Flush", Position::new("c.go", 5))]);
        let mut result = AnalysisResult::new(
            vec![flusher, closer],
            vec![structure(
                "File",
                vec![
                    MethodInfo::new("Close", Position::new("f.go", 3)),
                    MethodInfo::new("Flush", Position::new("f.go", 7)),
                ],
            )],
        );
        resolve_all(&mut result, StringHeuristic, true);
        let names: Vec<&str> = result.structs[0]
            .implemented_interfaces
            .iter()
            .map(|d| d.name.as_str())
            .collect();
        assert_eq!(names, vec!["Flusher", "Closer"]);
    }
}
