//! Clarity evaluation of the candidate's spoken explanation
//!
//! - `ClarityEvaluator` - trait over evaluators (deterministic stub, OpenAI-compatible API)
//! - `ClarityPipeline` - producer that evaluates transcript chunks into CLARITY events
//! - `TranscriptBuffer` - full transcript kept for the final analysis

mod evaluator;
mod openai;
mod pipeline;
mod stub;

pub use evaluator::{
    check_transcript, parse_scores, ClarityEvaluator, EvaluatorFactory, MAX_COMMENT_CHARS,
    MIN_TRANSCRIPT_CHARS,
};
pub use openai::OpenAiEvaluator;
pub use pipeline::{ClarityPipeline, TranscriptBuffer};
pub use stub::StubEvaluator;
