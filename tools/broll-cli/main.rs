use broll::prelude::*;
use clap::{Parser, Subcommand};
use itertools::Itertools;
use std::fs;
use std::path::PathBuf;
use std::time::Instant;

/// Converts editor workflows and generates b-roll images through a remote generation service
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Optional TOML configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Base URL of the generation service
    #[arg(long, global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate one image per scene prompt in `<story_dir>/broll-prompts.md`
    Generate {
        /// Story output directory
        story_dir: PathBuf,

        /// Editor-format workflow used as the job template
        #[arg(short, long)]
        workflow: Option<PathBuf>,

        /// Maximum number of status polls per job
        #[arg(long)]
        max_attempts: Option<u32>,

        /// Read images from the service's output directory instead of downloading them
        #[arg(long)]
        shared_output_dir: Option<PathBuf>,

        /// Only generate the first N prompts
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Convert an editor workflow to the execution format and print or save it
    Convert {
        /// Workflow file in editor (or execution) format
        workflow: PathBuf,

        /// Write the execution graph here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Replace the positive prompt text before printing
        #[arg(short, long)]
        prompt: Option<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => GeneratorConfig::from_file(path)
            .unwrap_or_else(|e| exit_with_error(&format!("Failed to load config: {}", e))),
        None => GeneratorConfig::default(),
    };
    if let Some(server) = cli.server {
        config.server_url = server;
    }

    match cli.command {
        Command::Generate {
            story_dir,
            workflow,
            max_attempts,
            shared_output_dir,
            limit,
        } => {
            if let Some(workflow) = workflow {
                config.workflow_path = Some(workflow);
            }
            if let Some(max_attempts) = max_attempts {
                config.max_poll_attempts = max_attempts;
            }
            if let Some(path) = shared_output_dir {
                config.artifact_source = ArtifactSource::SharedDirectory { path };
            }
            config
                .validate()
                .unwrap_or_else(|e| exit_with_error(&e.to_string()));
            run_generate(&config, &story_dir, limit);
        }
        Command::Convert {
            workflow,
            output,
            prompt,
        } => run_convert(&config, &workflow, output, prompt),
    }
}

fn run_generate(config: &GeneratorConfig, story_dir: &Path, limit: Option<usize>) {
    let total_start = Instant::now();

    // --- 1. Required inputs ---
    let broll_file = story_dir.join("broll-prompts.md");
    if !broll_file.exists() {
        exit_with_error(&format!("Broll prompts not found: {}", broll_file.display()));
    }
    let workflow_path = config.workflow_path.clone().unwrap_or_else(|| {
        exit_with_error("A workflow is required: pass --workflow or set workflow_path in the config.")
    });
    if !workflow_path.exists() {
        exit_with_error(&format!("Workflow not found: {}", workflow_path.display()));
    }

    // --- 2. Workflow conversion ---
    let template = load_execution_graph(config, &workflow_path);

    // --- 3. Prompt parsing ---
    let prompts = broll::prompts::load_scene_prompts(&broll_file)
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));
    println!("Found {} prompts in {}", prompts.len(), broll_file.display());

    // --- 4. Generation ---
    let client = JobClient::http(config)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to create client: {}", e)));
    let runner = BatchRunner::new(client, template)
        .with_text_encode_type(config.text_encode_type.clone())
        .with_inter_job_delay(config.inter_job_delay())
        .with_limit(limit);

    let summary = runner
        .run(&prompts, &story_dir.join("images"))
        .unwrap_or_else(|e| exit_with_error(&e.to_string()));

    // --- 5. Summary ---
    for outcome in &summary.outcomes {
        let label = format!(
            "Episode {}, Scene {}",
            outcome.prompt.episode, outcome.prompt.scene
        );
        match &outcome.result {
            Ok(path) => println!("  [ok]   {} -> {}", label, path.display()),
            Err(e) => println!("  [fail] {}: {}", label, e),
        }
    }
    println!(
        "\nComplete! Generated {}/{} images in {:?}",
        summary.generated,
        summary.total(),
        total_start.elapsed()
    );
}

fn run_convert(
    config: &GeneratorConfig,
    workflow_path: &Path,
    output: Option<PathBuf>,
    prompt: Option<String>,
) {
    let mut graph = load_execution_graph(config, workflow_path);

    if let Some(prompt) = prompt {
        let node_id = inject_prompt(&mut graph, &config.text_encode_type, &prompt)
            .unwrap_or_else(|e| exit_with_error(&e.to_string()));
        eprintln!("Updated positive prompt in node {}", node_id);
    }

    let json = graph
        .to_json_pretty()
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to serialize graph: {}", e)));

    match output {
        Some(path) => {
            fs::write(&path, json).unwrap_or_else(|e| {
                exit_with_error(&format!("Failed to write '{}': {}", path.display(), e))
            });
            eprintln!("Converted {} nodes into {}", graph.len(), path.display());
        }
        None => println!("{}", json),
    }
}

fn load_execution_graph(config: &GeneratorConfig, workflow_path: &Path) -> ExecutionGraph {
    let workflow_json = fs::read_to_string(workflow_path).unwrap_or_else(|e| {
        exit_with_error(&format!(
            "Failed to read workflow file '{}': {}",
            workflow_path.display(),
            e
        ))
    });
    let document = WorkflowDocument::from_json(&workflow_json)
        .unwrap_or_else(|e| exit_with_error(&format!("Failed to load workflow: {}", e)));

    let conversion = document.into_execution(&config.converter());
    if !conversion.warnings.is_empty() {
        eprintln!(
            "Conversion skipped {} input(s): {}",
            conversion.warnings.len(),
            conversion.warnings.iter().join("; ")
        );
    }
    conversion.graph
}

fn exit_with_error(message: &str) -> ! {
    eprintln!("\nError: {}", message);
    std::process::exit(1);
}
