//! Testgen - Figma Test-Case Generator CLI
//!
//! The `testgen` command turns a Figma design into a CSV of functional test
//! cases, optionally grounded in a local knowledge base.
//!
//! ## Commands
//!
//! - `generate`: design → test cases → CSV
//! - `simplify`: print the pruned design tree as JSON
//! - `index build|query|stats`: manage the knowledge index

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use oracle_gateway::{Embedder, FigmaClient, GeminiClient};
use semantic_rag::{RagService, DEFAULT_N_RESULTS};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use testgen_core::config::{DEFAULT_INDEX_DIR, DEFAULT_KNOWLEDGE_DIR, DEFAULT_OUTPUT_DIR};
use testgen_core::{
    simplify, DesignFile, GenerationClient, PromptAssembler, PromptOptions, Settings,
    TestCasePipeline,
};
use tracing::{info, warn};
use vector_state::{SurrealVectorIndex, VectorIndex, DEFAULT_COLLECTION};

#[derive(Parser)]
#[command(name = "testgen")]
#[command(author = "Testgen Maintainers")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Generate functional test cases from Figma designs", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    config: ConfigArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Settings shared by every command; each can come from the environment.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Figma personal access token
    #[arg(long, env = "FIGMA_API_KEY", hide_env_values = true, global = true, default_value = "")]
    figma_api_key: String,

    /// Google Generative Language API key
    #[arg(long, env = "GOOGLE_API_KEY", hide_env_values = true, global = true, default_value = "")]
    google_api_key: String,

    /// Directory of markdown knowledge files
    #[arg(long, env = "TESTGEN_KNOWLEDGE_DIR", global = true, default_value = DEFAULT_KNOWLEDGE_DIR)]
    knowledge_dir: PathBuf,

    /// Directory of the persistent knowledge index
    #[arg(long, env = "TESTGEN_INDEX_DIR", global = true, default_value = DEFAULT_INDEX_DIR)]
    index_dir: PathBuf,

    /// Index collection name
    #[arg(long, global = true, default_value = DEFAULT_COLLECTION)]
    collection: String,

    /// Embedding model
    #[arg(long, env = "TESTGEN_EMBEDDING_MODEL", global = true, default_value = oracle_gateway::gemini::DEFAULT_EMBEDDING_MODEL)]
    embedding_model: String,

    /// Generation model
    #[arg(long, env = "TESTGEN_GENERATION_MODEL", global = true, default_value = oracle_gateway::gemini::DEFAULT_GENERATION_MODEL)]
    generation_model: String,

    /// Per-request HTTP timeout in seconds (default: wait indefinitely)
    #[arg(long, env = "TESTGEN_HTTP_TIMEOUT_SECS", global = true)]
    http_timeout_secs: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate test cases for a Figma design and write them as CSV
    Generate {
        /// Figma file URL (figma.com/design/<key>/...)
        #[arg(required_unless_present = "design_file")]
        url: Option<String>,

        /// Read the design from a local JSON export instead of the Figma API
        #[arg(long, conflicts_with = "url")]
        design_file: Option<PathBuf>,

        /// Skip knowledge retrieval
        #[arg(long)]
        no_rag: bool,

        /// Number of knowledge documents to include
        #[arg(short = 'n', long, default_value_t = DEFAULT_N_RESULTS)]
        n_results: usize,

        /// Directory for the CSV file
        #[arg(short, long, env = "TESTGEN_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,

        /// Approximate number of test cases to request
        #[arg(long, default_value_t = 10)]
        cases: usize,

        /// Language of the generated field values
        #[arg(long, default_value = "Traditional Chinese")]
        language: String,
    },

    /// Print the simplified design tree as JSON
    Simplify {
        /// Figma file URL
        #[arg(required_unless_present = "design_file")]
        url: Option<String>,

        /// Read the design from a local JSON export instead of the Figma API
        #[arg(long, conflicts_with = "url")]
        design_file: Option<PathBuf>,
    },

    /// Manage the knowledge index
    Index {
        #[command(subcommand)]
        action: IndexAction,
    },
}

#[derive(Subcommand)]
enum IndexAction {
    /// Embed knowledge files not yet in the index
    Build {
        /// Clear the collection first and re-embed everything
        #[arg(long)]
        rebuild: bool,
    },

    /// Show the documents most similar to a text
    Query {
        /// Query text
        text: String,

        /// Number of documents to return
        #[arg(short, default_value_t = DEFAULT_N_RESULTS)]
        k: usize,
    },

    /// Show collection size and dimensionality
    Stats,
}

impl ConfigArgs {
    fn settings(&self) -> Settings {
        Settings {
            figma_api_key: self.figma_api_key.clone(),
            google_api_key: self.google_api_key.clone(),
            knowledge_dir: self.knowledge_dir.clone(),
            index_dir: self.index_dir.clone(),
            collection: self.collection.clone(),
            embedding_model: self.embedding_model.clone(),
            generation_model: self.generation_model.clone(),
            http_timeout: self.http_timeout_secs.map(Duration::from_secs),
            ..Settings::default()
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    testgen_core::telemetry::init_tracing(cli.json, testgen_core::telemetry::default_level(cli.verbose));

    let mut settings = cli.config.settings();

    match cli.command {
        Commands::Generate {
            url,
            design_file,
            no_rag,
            n_results,
            output_dir,
            cases,
            language,
        } => {
            settings.n_results = n_results;
            settings.output_dir = output_dir;
            settings.prompt = PromptOptions {
                target_cases: cases,
                answer_language: language,
            };
            settings.validate()?;
            cmd_generate(&settings, url.as_deref(), design_file.as_deref(), no_rag).await
        }
        Commands::Simplify { url, design_file } => {
            settings.validate()?;
            cmd_simplify(&settings, url.as_deref(), design_file.as_deref()).await
        }
        Commands::Index { action } => {
            settings.validate()?;
            match action {
                IndexAction::Build { rebuild } => cmd_index_build(&settings, rebuild).await,
                IndexAction::Query { text, k } => cmd_index_query(&settings, &text, k).await,
                IndexAction::Stats => cmd_index_stats(&settings).await,
            }
        }
    }
}

/// Load a design from a local export or the Figma API.
async fn load_design(
    settings: &Settings,
    url: Option<&str>,
    design_file: Option<&Path>,
) -> Result<DesignFile> {
    if let Some(path) = design_file {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read design file {}", path.display()))?;
        return DesignFile::from_json(&text)
            .with_context(|| format!("{} is not a Figma file export", path.display()));
    }

    let url = url.context("A Figma URL or --design-file is required")?;
    settings.require_figma_key()?;
    let client = FigmaClient::new(settings.figma_config())?;
    let value = client
        .fetch_file(url)
        .await
        .context("Failed to fetch design from Figma")?;
    DesignFile::from_value(value).context("Figma returned an unexpected document shape")
}

async fn open_index(settings: &Settings) -> Result<Arc<SurrealVectorIndex>> {
    let index = SurrealVectorIndex::open_or_create(&settings.storage_location(), &settings.collection)
        .await
        .with_context(|| format!("Failed to open knowledge index at {}", settings.index_dir.display()))?;
    Ok(Arc::new(index))
}

async fn rag_service(settings: &Settings, embedder: Arc<dyn Embedder>) -> Result<RagService> {
    let index = open_index(settings).await?;
    Ok(RagService::new(embedder, index, settings.knowledge_dir.clone()))
}

/// Attach retrieval to `pipeline` when the knowledge index can be opened and
/// built; otherwise log and return it unchanged.
async fn with_knowledge(
    settings: &Settings,
    embedder: Arc<dyn Embedder>,
    pipeline: TestCasePipeline,
) -> TestCasePipeline {
    let rag = match rag_service(settings, embedder).await {
        Ok(rag) => rag,
        Err(e) => {
            warn!(error = %format!("{:#}", e), "Knowledge index unavailable; generating without retrieval");
            return pipeline;
        }
    };

    match rag.build_or_load_index().await {
        Ok(report) => {
            info!(added = report.added, already_indexed = report.already_indexed, "Knowledge index ready");
            pipeline.with_rag(rag, settings.n_results)
        }
        Err(e) => {
            warn!(error = %e, "Knowledge index build failed; generating without retrieval");
            pipeline
        }
    }
}

/// Generate test cases and write them to the output directory
async fn cmd_generate(
    settings: &Settings,
    url: Option<&str>,
    design_file: Option<&Path>,
    no_rag: bool,
) -> Result<()> {
    // Credentials are checked before any network call.
    settings.require_google_key()?;
    if design_file.is_none() {
        settings.require_figma_key()?;
    }

    let design = load_design(settings, url, design_file).await?;
    let gemini = Arc::new(GeminiClient::new(settings.gemini_config())?);

    let mut pipeline = TestCasePipeline::new(GenerationClient::new(gemini.clone()))
        .with_assembler(PromptAssembler::with_options(settings.prompt.clone()));

    if !no_rag {
        pipeline = with_knowledge(settings, gemini.clone(), pipeline).await;
    }

    let (output, path) = pipeline
        .run_and_export(&design, &settings.output_dir)
        .await
        .context("Test case generation failed")?;

    println!("Generated {} test cases", output.records.len());
    println!("Knowledge documents used: {}", output.retrieved.len());
    println!("Written to: {}", path.display());
    Ok(())
}

/// Print the simplified design tree
async fn cmd_simplify(settings: &Settings, url: Option<&str>, design_file: Option<&Path>) -> Result<()> {
    let design = load_design(settings, url, design_file).await?;
    println!("{}", simplified_json(&design)?);
    Ok(())
}

fn simplified_json(design: &DesignFile) -> Result<String> {
    simplify(design)
        .to_pretty_json()
        .context("Failed to serialize simplified design")
}

/// Build or rebuild the knowledge index
async fn cmd_index_build(settings: &Settings, rebuild: bool) -> Result<()> {
    settings.require_google_key()?;
    let gemini = Arc::new(GeminiClient::new(settings.gemini_config())?);
    let rag = rag_service(settings, gemini).await?;

    let result = if rebuild {
        rag.rebuild_index().await
    } else {
        rag.build_or_load_index().await
    };
    let report = result.context("Failed to build knowledge index")?;

    println!("Knowledge dir:   {}", settings.knowledge_dir.display());
    println!("Discovered:      {}", report.discovered);
    println!("Unreadable:      {}", report.skipped_files);
    println!("Already indexed: {}", report.already_indexed);
    println!("Added:           {}", report.added);
    Ok(())
}

/// Show the nearest knowledge documents for a text
async fn cmd_index_query(settings: &Settings, text: &str, k: usize) -> Result<()> {
    settings.require_google_key()?;
    let gemini = Arc::new(GeminiClient::new(settings.gemini_config())?);
    let rag = rag_service(settings, gemini).await?;

    let documents = rag.query(text, k).await;
    if documents.is_empty() {
        println!("No matching documents");
        return Ok(());
    }
    for (i, document) in documents.iter().enumerate() {
        println!("--- {} ---", i + 1);
        println!("{}", document.trim_end());
    }
    Ok(())
}

/// Show index statistics
async fn cmd_index_stats(settings: &Settings) -> Result<()> {
    let index = open_index(settings).await?;
    let entries = index.count().await?;
    let dimension = index.dimension().await?;

    println!("Location:   {}", settings.storage_location());
    println!("Collection: {}", index.collection());
    println!("Entries:    {}", entries);
    match dimension {
        Some(d) => println!("Dimension:  {}", d),
        None => println!("Dimension:  (empty)"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use oracle_gateway::fakes::{KeywordEmbedder, ScriptedGenerator};

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_generate_with_url() {
        let cli = Cli::try_parse_from([
            "testgen",
            "generate",
            "https://www.figma.com/design/Key42/Shop",
            "--no-rag",
            "-n",
            "5",
        ])
        .unwrap();

        match cli.command {
            Commands::Generate {
                url,
                design_file,
                no_rag,
                n_results,
                cases,
                ..
            } => {
                assert_eq!(url.as_deref(), Some("https://www.figma.com/design/Key42/Shop"));
                assert!(design_file.is_none());
                assert!(no_rag);
                assert_eq!(n_results, 5);
                assert_eq!(cases, 10);
            }
            _ => panic!("expected generate"),
        }
    }

    #[test]
    fn test_generate_requires_url_or_design_file() {
        assert!(Cli::try_parse_from(["testgen", "generate"]).is_err());
        assert!(Cli::try_parse_from(["testgen", "generate", "--design-file", "design.json"]).is_ok());
    }

    #[test]
    fn test_parse_index_subcommands() {
        let cli = Cli::try_parse_from(["testgen", "index", "query", "login button", "-k", "2"]).unwrap();
        match cli.command {
            Commands::Index {
                action: IndexAction::Query { text, k },
            } => {
                assert_eq!(text, "login button");
                assert_eq!(k, 2);
            }
            _ => panic!("expected index query"),
        }

        let cli = Cli::try_parse_from(["testgen", "index", "build", "--rebuild"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Index {
                action: IndexAction::Build { rebuild: true }
            }
        ));
    }

    #[test]
    fn test_global_config_flags_map_to_settings() {
        let cli = Cli::try_parse_from([
            "testgen",
            "index",
            "stats",
            "--index-dir",
            "/tmp/testgen-index",
            "--collection",
            "team_kb",
            "--http-timeout-secs",
            "30",
        ])
        .unwrap();

        let settings = cli.config.settings();
        assert_eq!(settings.index_dir, PathBuf::from("/tmp/testgen-index"));
        assert_eq!(settings.collection, "team_kb");
        assert_eq!(settings.http_timeout, Some(Duration::from_secs(30)));
    }

    #[tokio::test]
    async fn test_generate_rejects_placeholder_key_before_network() {
        let settings = Settings {
            google_api_key: "YOUR_GOOGLE_API_KEY".to_string(),
            figma_api_key: "figd_token".to_string(),
            ..Settings::default()
        };

        let err = cmd_generate(&settings, Some("https://www.figma.com/design/Key42/Shop"), None, true)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("GOOGLE_API_KEY"));
    }

    #[tokio::test]
    async fn test_load_design_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("design.json");
        std::fs::write(
            &path,
            r#"{"name": "Shop App", "document": {"children": [
                {"type": "CANVAS", "name": "Page 1", "children": [
                    {"type": "FRAME", "name": "Login"},
                    {"type": "GROUP", "name": "Dropped"}
                ]}
            ]}}"#,
        )
        .unwrap();

        let design = load_design(&Settings::default(), None, Some(&path)).await.unwrap();
        let json = simplified_json(&design).unwrap();
        assert!(json.contains("\"fileName\": \"Shop App\""));
        assert!(json.contains("Login"));
        assert!(!json.contains("Dropped"));
    }

    fn login_design_file(dir: &Path) -> PathBuf {
        let path = dir.join("design.json");
        std::fs::write(
            &path,
            r#"{"name": "Shop App", "document": {"children": [
                {"type": "CANVAS", "name": "Page 1", "children": [
                    {"type": "FRAME", "name": "Login"}
                ]}
            ]}}"#,
        )
        .unwrap();
        path
    }

    #[tokio::test]
    async fn test_unopenable_index_still_generates() {
        let dir = tempfile::tempdir().unwrap();
        // A regular file where the index directory should be.
        let index_path = dir.path().join("index");
        std::fs::write(&index_path, "not a directory").unwrap();
        let knowledge = dir.path().join("kb");
        std::fs::create_dir(&knowledge).unwrap();
        std::fs::write(knowledge.join("login.md"), "Login flow requires username and password.").unwrap();

        let settings = Settings {
            index_dir: index_path,
            knowledge_dir: knowledge,
            ..Settings::default()
        };
        let reply = r#"[{"Test Case ID": "TC-001", "Test Suite": "Login", "Test Section": "Valid login",
            "Priority": "P1", "Test Category": "Functional", "Precondition": "On login page",
            "Test Step": "1. Click Login", "Expect Result": "Home page shown"}]"#;
        let generator = Arc::new(ScriptedGenerator::new([reply]));
        let embedder = Arc::new(KeywordEmbedder::new(&["login", "password"]));

        let pipeline = TestCasePipeline::new(GenerationClient::new(generator.clone()));
        let pipeline = with_knowledge(&settings, embedder, pipeline).await;
        assert!(pipeline.rag().is_none());

        let design = load_design(&settings, None, Some(&login_design_file(dir.path())))
            .await
            .unwrap();
        let output = pipeline.run(&design).await.unwrap();

        assert_eq!(output.records.len(), 1);
        assert!(output.retrieved.is_empty());
        assert_eq!(generator.prompts().len(), 1);
    }

    #[tokio::test]
    async fn test_openable_index_attaches_retrieval() {
        let dir = tempfile::tempdir().unwrap();
        let knowledge = dir.path().join("kb");
        std::fs::create_dir(&knowledge).unwrap();
        std::fs::write(knowledge.join("login.md"), "Login flow requires username and password.").unwrap();

        let settings = Settings {
            index_dir: dir.path().join("index"),
            knowledge_dir: knowledge,
            ..Settings::default()
        };
        let generator = Arc::new(ScriptedGenerator::new(Vec::<String>::new()));
        let embedder = Arc::new(KeywordEmbedder::new(&["login", "password"]));

        let pipeline = TestCasePipeline::new(GenerationClient::new(generator));
        let pipeline = with_knowledge(&settings, embedder, pipeline).await;
        assert!(pipeline.rag().is_some());
    }

    #[tokio::test]
    async fn test_index_stats_on_fresh_directory() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            index_dir: dir.path().join("index"),
            ..Settings::default()
        };

        cmd_index_stats(&settings).await.unwrap();
        assert!(settings.index_dir.exists());
    }
}
