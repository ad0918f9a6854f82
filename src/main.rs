use clap::Parser;
use keyword_annotate::app::registry::{check_registry, ensure_consistent, target_table};
use keyword_annotate::config::{CliCommand, CliConfig};
use keyword_annotate::utils::{logger, validation::Validate};
use keyword_annotate::{
    AddSamplesPipeline, AnnotateError, LaunchOptions, LaunchOutcome, Launcher, LocalStorage,
    Manifest, OverlapPipeline, PipelineEngine, PreparePipeline,
};

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    // 初始化日誌
    if config.json_logs {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(config.verbose);
    }

    tracing::debug!("CLI config: {:?}", config);

    if let Err(e) = run(config).await {
        tracing::error!(
            "❌ Command failed: {} (Category: {:?}, Severity: {:?})",
            e,
            e.category(),
            e.severity()
        );
        tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

        eprintln!("❌ {}", e.user_friendly_message());
        eprintln!("💡 Suggestion: {}", e.recovery_suggestion());

        let exit_code = e.exit_code();
        if exit_code > 0 {
            std::process::exit(exit_code);
        }
    }
}

async fn run(config: CliConfig) -> Result<(), AnnotateError> {
    let manifest_path = config.manifest.as_deref();

    match config.command {
        CliCommand::List => {
            let manifest = Manifest::load(manifest_path)?;
            manifest.validate()?;
            println!("📋 Annotation targets ({}):", manifest.server.program);
            for row in target_table(&manifest) {
                println!("  {}", row);
            }
        }
        CliCommand::Check(args) => {
            let findings = check_registry(manifest_path, &args.base_dir)?;
            for finding in &findings {
                println!("  {}", finding);
            }
            ensure_consistent(&findings)?;
            println!("✅ All annotation targets are consistent");
        }
        CliCommand::Launch(args) => {
            let manifest = Manifest::load(manifest_path)?;
            manifest.validate()?;
            let target = manifest.find(&args.target)?;
            let launcher = Launcher::new(manifest.server.clone());
            let options = LaunchOptions {
                port: args.port,
                wait_ready: args.wait_ready,
                dry_run: args.dry_run,
            };

            match launcher.launch(target, &options).await? {
                LaunchOutcome::DryRun { command, url } => {
                    println!("🔍 DRY RUN - would execute:");
                    println!("  {}", command.join(" "));
                    println!("🌐 Access URL: {}", url);
                    println!("📁 Output directory: {}", target.output_dir.display());
                }
                LaunchOutcome::Exited => println!("Annotation server stopped"),
                LaunchOutcome::Interrupted => println!("🛑 Annotation server interrupted"),
            }
        }
        CliCommand::Prepare(args) => {
            args.validate()?;
            let pipeline = PreparePipeline::new(LocalStorage::default(), args);
            let output = PipelineEngine::new_with_monitoring(pipeline, config.monitor)
                .run()
                .await?;
            println!("✅ Annotation data written to: {}", output);
        }
        CliCommand::AddSamples(args) => {
            args.validate()?;
            let pipeline = AddSamplesPipeline::new(LocalStorage::default(), args);
            let output = PipelineEngine::new_with_monitoring(pipeline, config.monitor)
                .run()
                .await?;
            println!("✅ Samples appended to: {}", output);
        }
        CliCommand::Overlap(args) => {
            let manifest = Manifest::load(manifest_path)?;
            let paths = args.resolve(&manifest)?;
            let pipeline = OverlapPipeline::new(LocalStorage::default(), paths);
            let output = PipelineEngine::new_with_monitoring(pipeline, config.monitor)
                .run()
                .await?;
            println!();
            println!("📁 Results saved to {}", output);
        }
    }

    Ok(())
}
