// Data structures and types

pub mod diagnostic;
pub mod operation;

pub use diagnostic::{
    Diagnostic, DiagnosticResponse, DiagnosticStage, FlatStage, OperationContext, Performance,
    Priority, Recommendation, RecommendationKind,
};
pub use operation::{ObservedMetrics, OperationType, ProfiledOperation};
