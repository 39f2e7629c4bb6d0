pub mod analyzer;
pub mod patterns;

pub use analyzer::{
    AnalysisInput, ChainAnalysis, Strategy, StrategyDecision, analyze, analyze_chain,
    analyze_clip, analyze_node,
};
pub use patterns::{KnownKernel, TransferShape, classify_kernel, classify_transfer};
