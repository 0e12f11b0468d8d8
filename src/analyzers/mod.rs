pub mod implementation_resolver;
pub mod method_set;
pub mod signature_matcher;

pub use implementation_resolver::{resolve_all, ImplementationResolver, ResolutionStats};
pub use method_set::{merge_method_sets, MethodEntry, MethodSetBuilder, MethodSets, NamedMethod};
pub use signature_matcher::{
    MethodSite, Owner, SignatureMatcher, StringHeuristic, TypeBindings, TypeCheckerBacked,
};
