//! implmap finds which Go structs implement which interfaces.
//!
//! Analysis runs in two phases. Every package under a corpus root is parsed
//! and checked first; only then is each struct's method set matched against
//! every interface. The result is a serializable graph of interfaces,
//! structs, and the links between them at type and method level.
//!
//! ```ignore
//! use implmap::{analyze_corpus, AnalysisOptions};
//!
//! let analysis = analyze_corpus(Path::new("./service"), &AnalysisOptions::default())?;
//! for s in &analysis.result.structs {
//!     println!("{} implements {:?}", s.name, s.implemented_interfaces);
//! }
//! ```

pub mod analyzers;
pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod core;
pub mod engine;
pub mod extraction;
pub mod io;
pub mod observability;

pub use crate::core::errors::{Error, Result};
pub use crate::core::model::{
    AnalysisResult, Declaration, InterfaceInfo, InterfaceMethodInfo, MethodInfo, ParamInfo,
    Position, StructInfo,
};
pub use crate::core::CancellationToken;
pub use crate::engine::{
    analyze_corpus, lookup_struct, reverify, reverify_result, validate_result, Analysis,
    AnalysisOptions,
};
pub use crate::extraction::Diagnostic;
