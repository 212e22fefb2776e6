//! End-to-end generation: design → context → prompt → records → file
//!
//! Steps run strictly one after another. Retrieval is optional and best
//! effort; generation and export failures end the run.

use std::path::{Path, PathBuf};
use std::time::Instant;

use semantic_rag::{RagService, DEFAULT_N_RESULTS};
use tracing::Instrument;
use uuid::Uuid;

use crate::design::{simplify, DesignFile, SimplifiedDesign};
use crate::error::Result;
use crate::export::write_csv;
use crate::generation::GenerationClient;
use crate::obs;
use crate::prompt::PromptAssembler;
use crate::record::TestCaseRecord;

/// Everything a run produced, for reporting and debugging.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub run_id: String,
    pub design: SimplifiedDesign,
    /// Knowledge documents used as context, best match first
    pub retrieved: Vec<String>,
    pub prompt: String,
    pub records: Vec<TestCaseRecord>,
}

/// Generation pipeline with optional retrieval.
pub struct TestCasePipeline {
    generation: GenerationClient,
    assembler: PromptAssembler,
    rag: Option<RagService>,
    n_results: usize,
}

impl TestCasePipeline {
    pub fn new(generation: GenerationClient) -> Self {
        TestCasePipeline {
            generation,
            assembler: PromptAssembler::new(),
            rag: None,
            n_results: DEFAULT_N_RESULTS,
        }
    }

    /// Look up `n_results` knowledge documents for every run.
    pub fn with_rag(mut self, rag: RagService, n_results: usize) -> Self {
        self.rag = Some(rag);
        self.n_results = n_results;
        self
    }

    pub fn with_assembler(mut self, assembler: PromptAssembler) -> Self {
        self.assembler = assembler;
        self
    }

    pub fn rag(&self) -> Option<&RagService> {
        self.rag.as_ref()
    }

    /// Generate test cases for a design file.
    pub async fn run(&self, file: &DesignFile) -> Result<PipelineOutput> {
        let run_id = Uuid::new_v4().to_string();
        let span = obs::PipelineSpan::new(&run_id);
        let started = Instant::now();

        let result = self.run_inner(&run_id, file).instrument(span.span()).await;

        obs::emit_pipeline_finished(
            &run_id,
            started.elapsed().as_millis() as u64,
            result.is_ok(),
        );
        result
    }

    /// [`run`](Self::run), then write the records as CSV into `output_dir`.
    pub async fn run_and_export(
        &self,
        file: &DesignFile,
        output_dir: &Path,
    ) -> Result<(PipelineOutput, PathBuf)> {
        let output = self.run(file).await?;
        match write_csv(output_dir, output.design.file_name.as_deref(), &output.records) {
            Ok(path) => {
                obs::emit_export_written(&output.run_id, &path, output.records.len());
                Ok((output, path))
            }
            Err(e) => {
                obs::emit_export_failed(&output.run_id, &e);
                Err(e.into())
            }
        }
    }

    async fn run_inner(&self, run_id: &str, file: &DesignFile) -> Result<PipelineOutput> {
        let design = simplify(file);
        obs::emit_pipeline_started(run_id, design.file_name.as_deref(), design.node_count());

        let retrieved = self.retrieve(run_id, &design).await;
        let prompt = self.assembler.assemble(&design, &retrieved);

        let records = match self.generation.generate(&prompt).await {
            Ok(records) => records,
            Err(e) => {
                obs::emit_generation_failed(run_id, &e);
                return Err(e.into());
            }
        };
        obs::emit_generation_parsed(run_id, records.len());

        Ok(PipelineOutput {
            run_id: run_id.to_string(),
            design,
            retrieved,
            prompt,
            records,
        })
    }

    async fn retrieve(&self, run_id: &str, design: &SimplifiedDesign) -> Vec<String> {
        let Some(rag) = &self.rag else {
            obs::emit_retrieval_skipped(run_id, "no knowledge index configured");
            return Vec::new();
        };

        let query = design.retrieval_query();
        if query.is_empty() {
            obs::emit_retrieval_skipped(run_id, "design has no named nodes");
            return Vec::new();
        }

        let documents = rag.query(&query, self.n_results).await;
        obs::emit_retrieval_completed(run_id, documents.len());
        documents
    }
}
