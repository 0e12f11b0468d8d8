//! Typed side table kept next to an extracted [`AnalysisResult`].
//!
//! Entries are parallel to the result: `interfaces[i].methods[j]` describes
//! `result.interfaces[i].methods[j]`, and likewise for structs and their
//! canonical method lists.
//!
//! [`AnalysisResult`]: crate::core::model::AnalysisResult

use crate::core::types::Signature;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypedMethod {
    pub signature: Signature,
    /// Import path of the package declaring the method.
    pub package: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypedInterface {
    pub package: String,
    /// Declared type parameters; they act as variables during matching.
    pub type_params: Vec<String>,
    pub methods: Vec<TypedMethod>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypedStruct {
    pub package: String,
    pub methods: Vec<TypedMethod>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypedCorpus {
    pub interfaces: Vec<TypedInterface>,
    pub structs: Vec<TypedStruct>,
}

impl TypedCorpus {
    pub fn interface_method(&self, interface: usize, method: usize) -> Option<&TypedMethod> {
        self.interfaces.get(interface)?.methods.get(method)
    }

    pub fn struct_method(&self, owner: usize, method: usize) -> Option<&TypedMethod> {
        self.structs.get(owner)?.methods.get(method)
    }
}
