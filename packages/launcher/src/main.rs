use std::path::PathBuf;

use clap::{Parser, Subcommand};
use crawl_core::{JobId, JobRequest};
use tracing_subscriber::EnvFilter;

use launcher::{Config, LaunchCommand, QueueRegistry, RunDir, SpiderLister};

#[derive(Parser, Debug)]
#[command(name = "scrapyd-launcher")]
#[command(version)]
#[command(about = "Project queues and crawl launching for scrapyd")]
struct Args {
    /// Config file (defaults to $SCRAPYD_CONFIG or the standard locations)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Directory that relative paths are resolved against
    #[arg(long, global = true)]
    rundir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List known projects
    Projects,

    /// Show pending job counts per project
    Queues,

    /// List the spiders of a project
    Spiders {
        project: String,

        /// Extra module search path for the runner
        #[arg(long)]
        pythonpath: Option<String>,
    },

    /// Add a job to a project's queue
    Schedule {
        project: String,
        spider: String,

        /// Spider argument (repeatable)
        #[arg(short = 'a', value_name = "KEY=VALUE", value_parser = parse_key_val)]
        arg: Vec<(String, String)>,

        /// Run-time setting (repeatable)
        #[arg(short = 's', value_name = "KEY=VALUE", value_parser = parse_key_val)]
        setting: Vec<(String, String)>,

        /// Higher priorities run first
        #[arg(long, default_value = "0")]
        priority: f64,

        /// Enqueue without checking that the spider exists
        #[arg(long)]
        skip_validation: bool,
    },

    /// Take the next job of a project and print its launch command
    Next { project: String },

    /// Print the crawl arguments for a JSON job request
    CrawlArgs {
        /// Job request, e.g. '{"_project":"p","_spider":"s","a":"1"}'
        request: String,
    },
}

fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{s}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{s}'"));
    }
    Ok((key.to_string(), value.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load_required(path)?,
        None => Config::load()?,
    };
    let run_dir = RunDir::from_override_or_args(args.rundir, std::env::args_os())?;

    match args.command {
        Commands::Projects => {
            for project in launcher::project_list(&config, &run_dir).await? {
                println!("{project}");
            }
        }

        Commands::Queues => {
            let registry = QueueRegistry::open(&config, &run_dir).await?;
            for (project, pending) in registry.pending_counts().await? {
                println!("{project}\t{pending}");
            }
        }

        Commands::Spiders {
            project,
            pythonpath,
        } => {
            let lister = SpiderLister::from_config(&config)?;
            for spider in lister.list(&project, None, pythonpath.as_deref()).await? {
                println!("{spider}");
            }
        }

        Commands::Schedule {
            project,
            spider,
            arg,
            setting,
            priority,
            skip_validation,
        } => {
            let registry = QueueRegistry::open(&config, &run_dir).await?;
            registry.queue(&project)?;

            if !skip_validation {
                let spiders = SpiderLister::from_config(&config)?
                    .list(&project, None, None)
                    .await?;
                if !spiders.contains(&spider) {
                    return Err(format!("spider '{spider}' not found in project '{project}'").into());
                }
            }

            let job_id = JobId::new();
            let mut request = JobRequest::new(&project, &spider).with_job_id(job_id);
            for (key, value) in arg {
                request = request.try_with_arg(key, value)?;
            }
            for (key, value) in setting {
                request = request.with_setting(key, value);
            }

            registry.enqueue(request, priority).await?;
            tracing::info!(%job_id, project = %project, spider = %spider, "Scheduled job");
            println!("{job_id}");
        }

        Commands::Next { project } => {
            let registry = QueueRegistry::open(&config, &run_dir).await?;
            match registry.queue(&project)?.pop().await? {
                Some(request) => {
                    println!("{}", LaunchCommand::for_request(&config, &request)?);
                }
                None => tracing::info!(project = %project, "No pending jobs"),
            }
        }

        Commands::CrawlArgs { request } => {
            let request: JobRequest = serde_json::from_str(&request)?;
            let crawl_args = request.crawl_args()?;
            println!("{}", serde_json::to_string(&crawl_args)?);
        }
    }

    Ok(())
}
