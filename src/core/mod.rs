pub mod cancellation;
pub mod errors;
pub mod model;
pub mod typed;
pub mod types;

pub use cancellation::CancellationToken;
pub use model::{
    AnalysisResult, Declaration, InterfaceInfo, InterfaceMethodInfo, MethodInfo, ParamInfo,
    Position, StructInfo,
};
