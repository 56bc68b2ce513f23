use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use asset_packager::compressor::{
  Compressor, DEFAULT_CLOSURE_JAR, DEFAULT_YUI_JAR, ScriptCompressor, StylesheetCompressor,
};
use asset_packager::config::{AssetKind, PackageConfig};
use asset_packager::manifest::load_manifest;
use asset_packager::registry::{BuildStatus, PackageRegistry};
use asset_packager::{Package, TargetOptions};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
  name = "asset-packager",
  version,
  about = "Order, compress and post-process stylesheet and script bundles"
)]
struct Cli {
  /// Enable verbose (debug) logging output.
  #[arg(short, long, default_value_t = false, global = true)]
  verbose: bool,

  /// Enable trace-level logging (more detailed than --verbose).
  #[arg(long, default_value_t = false, global = true)]
  trace: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Debug, Args)]
struct PackageArgs {
  /// Package manifests (YAML, or JSON when the extension is `.json`).
  #[arg(required = true)]
  manifests: Vec<PathBuf>,

  /// Directory that replaces the parent directory of every target.
  #[arg(long)]
  target_path: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct CompressorArgs {
  /// Java launcher used to run the compressors.
  #[arg(long, default_value = "java")]
  java: PathBuf,

  /// YUI Compressor jar for stylesheets.
  #[arg(long, default_value = DEFAULT_YUI_JAR)]
  yui_jar: PathBuf,

  /// Closure Compiler jar for scripts.
  #[arg(long, default_value = DEFAULT_CLOSURE_JAR)]
  closure_jar: PathBuf,

  /// Concatenate scripts into one scratch file before compiling them.
  #[arg(long, default_value_t = false)]
  concatenate_scripts: bool,
}

#[derive(Debug, Subcommand)]
enum Commands {
  /// Package every dirty package.
  Build {
    #[command(flatten)]
    packages: PackageArgs,
    #[command(flatten)]
    compressors: CompressorArgs,
    /// Package even when targets are up to date.
    #[arg(long, default_value_t = false)]
    force: bool,
  },
  /// Print the ordered source files of each package.
  Contents {
    #[command(flatten)]
    packages: PackageArgs,
  },
  /// Print target, staleness and identity of each package.
  Status {
    #[command(flatten)]
    packages: PackageArgs,
  },
}

fn main() -> ExitCode {
  let cli = Cli::parse();

  let default_level = if cli.trace {
    "trace"
  } else if cli.verbose {
    "debug"
  } else {
    "warn"
  };
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_env("ASSET_PACKAGER_LOG")
        .unwrap_or_else(|_| EnvFilter::new(default_level)),
    )
    .with_target(false)
    .without_time()
    .init();

  match run(cli.command) {
    Ok(code) => code,
    Err(err) => {
      eprintln!("error: {err:#}");
      ExitCode::FAILURE
    }
  }
}

fn run(command: Commands) -> Result<ExitCode> {
  match command {
    Commands::Build {
      packages,
      compressors,
      force,
    } => build(&packages, &compressors, force),
    Commands::Contents { packages } => {
      let registry = load_registry(&packages.manifests, None)?;
      let options = target_options(&packages);
      for package in &registry {
        println!("{}", display_target(package.target(&options).as_deref()));
        for path in package.contents(&options) {
          println!("  {}", path.display());
        }
      }
      Ok(ExitCode::SUCCESS)
    }
    Commands::Status { packages } => {
      let registry = load_registry(&packages.manifests, None)?;
      let options = target_options(&packages);
      for package in &registry {
        let state = if package.is_dirty(&options) { "dirty" } else { "fresh" };
        println!(
          "{}\t{state}\t{}",
          display_target(package.target(&options).as_deref()),
          package.id()
        );
      }
      Ok(ExitCode::SUCCESS)
    }
  }
}

fn build(packages: &PackageArgs, compressors: &CompressorArgs, force: bool) -> Result<ExitCode> {
  let registry = load_registry(&packages.manifests, Some(compressors))?;
  let options = target_options(packages);

  let mut failed = false;
  for report in registry.package_all(&options, force) {
    let target = display_target(report.target.as_deref());
    match report.status {
      BuildStatus::Skipped => println!("fresh    {target}"),
      BuildStatus::Packaged(outcome) => {
        for path in outcome.written() {
          println!("packaged {}", path.display());
        }
      }
      BuildStatus::Failed(err) => {
        failed = true;
        eprintln!("failed   {target}: {err}");
      }
    }
  }

  Ok(if failed {
    ExitCode::FAILURE
  } else {
    ExitCode::SUCCESS
  })
}

fn load_registry(
  manifests: &[PathBuf],
  compressors: Option<&CompressorArgs>,
) -> Result<PackageRegistry> {
  let mut registry = PackageRegistry::new();
  for path in manifests {
    let config = load_config(path)?;
    let kind = config.kind();
    let mut package = Package::new(config)
      .with_context(|| format!("failed to resolve package from {}", path.display()))?;
    if let Some(args) = compressors {
      package = package.with_compressor(compressor_for(kind, args));
    }
    registry.register(package);
  }
  Ok(registry)
}

fn load_config(path: &Path) -> Result<PackageConfig> {
  let is_json = path
    .extension()
    .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
  let config = if is_json {
    PackageConfig::from_json_path(path)?
  } else {
    load_manifest(path)?
  };
  Ok(config)
}

fn compressor_for(kind: AssetKind, args: &CompressorArgs) -> Box<dyn Compressor> {
  match kind {
    AssetKind::Stylesheet => Box::new(StylesheetCompressor {
      java: args.java.clone(),
      jar: args.yui_jar.clone(),
    }),
    AssetKind::Script => Box::new(ScriptCompressor {
      java: args.java.clone(),
      jar: args.closure_jar.clone(),
      pre_concatenate: args.concatenate_scripts,
    }),
  }
}

fn target_options(packages: &PackageArgs) -> TargetOptions {
  TargetOptions {
    target_path: packages.target_path.clone(),
  }
}

fn display_target(target: Option<&Path>) -> String {
  target
    .map(|path| path.display().to_string())
    .unwrap_or_else(|| "<no target>".to_string())
}
