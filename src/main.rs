use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub mod assets;
pub mod canonical;
pub mod config;
pub mod document;
pub mod inputs;
pub mod overrides;
pub mod report;
pub mod schema;
pub mod targets;

use config::Config;
use report::{Failure, FailureKind, RunReport};
use targets::{MergeContext, ModulePath};

#[derive(Parser, Debug)]
#[command(name = "tfvars-merge")]
#[command(about = "Merge a YAML inputs file into Terraform JSON variable files")]
struct Args {
    /// Settings file describing inputs, target roots and assets
    #[arg(short, long, default_value = "./merge.yaml")]
    config: PathBuf,

    /// Inputs file, overrides `inputs` from the settings file
    #[arg(short, long)]
    inputs: Option<PathBuf>,

    /// Target root, may be repeated; replaces `roots` from the settings file
    #[arg(short, long = "root")]
    roots: Vec<PathBuf>,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tfvars_merge=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    return match run(args).await {
        Ok(report) if report.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    };
}

async fn run(args: Args) -> anyhow::Result<RunReport> {
    let mut config = config::parse(&args.config)
        .with_context(|| format!("Unable to load settings from {}", args.config.display()))?;
    if let Some(inputs) = args.inputs {
        config.inputs = inputs;
    }
    if !args.roots.is_empty() {
        config.roots = args.roots;
    }
    config::validate(&config)?;

    let overrides = inputs::load(&config.inputs)
        .with_context(|| format!("Unable to load inputs from {}", config.inputs.display()))?;
    info!(inputs = %config.inputs.display(), count = overrides.len(), "Loaded inputs");

    let mut report = RunReport::default();

    let (paths, failures) = targets::discover(&config.roots, &config.target_file_name);
    report.extend(failures);
    info!(count = paths.len(), file_name = %config.target_file_name, "Discovered target files");

    let module_path = resolve_module_path(&config, &mut report);
    propagate_assets(&config, module_path.as_ref(), &mut report);

    let (documents, failures) = targets::load_all(&paths);
    report.extend(failures);

    let trees: Vec<&serde_json::Value> = documents.iter().map(|d| &d.tree).collect();
    let array_fields = schema::detect_array_fields(&trees);
    info!(count = array_fields.len(), "Detected array fields");

    let ctx = Arc::new(MergeContext {
        overrides,
        array_fields,
        module_path,
    });
    for result in targets::process_all(documents, ctx).await {
        match result {
            Ok(path) => report.updated.push(path),
            Err(failure) => report.record(failure),
        }
    }

    summarize(&report);
    return Ok(report);
}

fn resolve_module_path(config: &Config, report: &mut RunReport) -> Option<ModulePath> {
    let module_folder = config.module_folder.as_ref()?;

    return match targets::locate_dir(&module_folder.search_root, &module_folder.name) {
        Some(path) => {
            info!(path = %path.display(), "Located module folder");
            Some(ModulePath {
                key: module_folder.key.clone(),
                path,
            })
        }
        None => {
            report.record(Failure::not_found(
                module_folder.search_root.join(&module_folder.name),
                "module folder not found, skipping path injection",
            ));
            None
        }
    };
}

fn propagate_assets(config: &Config, module_path: Option<&ModulePath>, report: &mut RunReport) {
    for asset in &config.assets.files {
        if let Err(err) = assets::propagate_file(&asset.source, &config.roots, &asset.target_name) {
            report.record(asset_failure(&asset.source, err));
        }
    }

    for asset in &config.assets.directories {
        let Some(module_path) = module_path else {
            report.record(Failure::not_found(
                &asset.destination,
                "module folder not found, skipping directory copy",
            ));
            continue;
        };

        let destination = module_path.path.join(&asset.destination);
        if let Err(err) = assets::replace_dir(&asset.source, &destination) {
            report.record(asset_failure(&asset.source, err));
        }
    }
}

fn asset_failure(source: &Path, err: assets::Error) -> Failure {
    if matches!(err, assets::Error::NotFound(_)) {
        return Failure::not_found(source, err);
    }

    return Failure::write(source, err);
}

fn summarize(report: &RunReport) {
    if report.is_success() {
        info!(updated = report.updated.len(), "All target files updated");
        return;
    }

    warn!(
        updated = report.updated.len(),
        parse = report.count(&FailureKind::Parse),
        not_found = report.count(&FailureKind::NotFound),
        write = report.count(&FailureKind::Write),
        "Finished with failures"
    );
}
