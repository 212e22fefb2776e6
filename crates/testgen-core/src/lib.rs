//! Testgen Core Library
//!
//! Turns a Figma design file into a list of functional test cases:
//!
//! 1. [`design`]: prune the raw node tree to structural nodes
//! 2. retrieval through [`semantic_rag::RagService`] (optional)
//! 3. [`prompt`]: assemble the generation prompt
//! 4. [`generation`]: call the model and validate its JSON reply
//! 5. [`export`]: write the records as CSV
//!
//! [`pipeline::TestCasePipeline`] chains the steps.

pub mod config;
pub mod design;
pub mod error;
pub mod export;
pub mod generation;
pub mod obs;
pub mod pipeline;
pub mod prompt;
pub mod record;
pub mod telemetry;

pub use config::{ConfigError, Settings};
pub use design::{simplify, simplify_node, DesignFile, DesignNode, NodeKind, RawNode, SimplifiedDesign};
pub use error::{Result, TestgenError};
pub use export::{output_file_name, to_csv, write_csv, ExportError};
pub use generation::{parse_response, strip_code_fences, GenerationClient, GenerationError};
pub use obs::{
    emit_export_failed, emit_export_written, emit_generation_failed, emit_generation_parsed,
    emit_pipeline_finished, emit_pipeline_started, emit_retrieval_completed,
    emit_retrieval_skipped, PipelineSpan,
};
pub use pipeline::{PipelineOutput, TestCasePipeline};
pub use prompt::{assemble, PromptAssembler, PromptOptions};
pub use record::{TestCaseRecord, COLUMN_ORDER};
