use clap::Parser;
use std::sync::Arc;
use vess_field::config::{Command, LogFormat};
use vess_field::core::report::{evaluation_summary, write_csv};
use vess_field::core::scoring::{classify_management, score_descriptor};
use vess_field::domain::model::EvaluationRecord;
use vess_field::domain::ports::{Clock, EvaluationGateway, SessionProvider};
use vess_field::utils::error::ErrorCategory;
use vess_field::utils::{logger, validation::Validate};
use vess_field::{
    AnonymousSession, AppConfig, CliConfig, EvaluationInput, EvaluationStore, RestGateway,
    StaticTokenSession, SystemClock, VessError,
};

#[tokio::main]
async fn main() {
    let cli = CliConfig::parse();

    let config = cli.app_config();
    let format = config
        .as_ref()
        .map(|c| c.logging.format)
        .unwrap_or_default();
    match format {
        LogFormat::Json => logger::init_json_logger(cli.verbose),
        LogFormat::Compact => logger::init_cli_logger(cli.verbose),
    }

    tracing::info!("Starting vess CLI");
    let config = match config.and_then(|c| c.validate().map(|_| c)) {
        Ok(config) => config,
        Err(e) => exit_with(&e),
    };
    tracing::debug!(
        "API: {}, page size {}",
        config.api.base_url,
        config.store.page_size
    );

    if let Err(e) = run(cli.command, config).await {
        exit_with(&e);
    }
}

fn exit_with(e: &VessError) -> ! {
    tracing::error!("❌ {} (Category: {:?})", e, e.category());
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.category() {
        ErrorCategory::Configuration => 1,
        ErrorCategory::Validation => 2,
        ErrorCategory::Network => 3,
        ErrorCategory::Remote => 4,
        ErrorCategory::Io => 5,
    };
    std::process::exit(exit_code)
}

async fn run(command: Command, config: AppConfig) -> vess_field::Result<()> {
    let session: Arc<dyn SessionProvider> = match &config.api.token {
        Some(token) => Arc::new(StaticTokenSession::new(token.clone())),
        None => Arc::new(AnonymousSession),
    };
    let gateway = RestGateway::with_timeout(&config.api.base_url, session, config.timeout())?;
    let options = config.store_options();
    let mut store = EvaluationStore::new(gateway, options);
    let clock = SystemClock;

    match command {
        Command::List { page } => {
            store.load_page(page.unwrap_or(options.initial_page)).await?;
            print_page(&store);
        }
        Command::Show { id } => {
            let record = store.get_by_id(&id).await?;
            print_record(&record, &clock);
        }
        Command::Delete { id, page } => {
            store.load_page(page.unwrap_or(options.initial_page)).await?;
            store.delete(&id).await?;
            println!("🗑️  Evaluation {} deleted", id);
            print_page(&store);
        }
        Command::Stats => {
            let stats = store.gateway().stats().await?;
            println!("Evaluations: {}", stats.total_evaluations);
            println!("Samples: {}", stats.total_samples);
            println!("Average score: {:.1}", stats.average_score);
            println!(
                "Distribution: {} good, {} reasonable, {} poor",
                stats.score_distribution.excellent,
                stats.score_distribution.reasonable,
                stats.score_distribution.poor
            );
            println!(
                "This month: {} (last: {})",
                stats.recent_activity.evaluations_this_month,
                stats.recent_activity.last_evaluation.as_deref().unwrap_or("-")
            );
        }
        Command::Health => {
            let health = store.gateway().health().await?;
            println!("✅ {} (version {})", health.message, health.version);
        }
        Command::Evaluate { input, submit } => {
            let input = EvaluationInput::from_file(&input)?;
            let workflow = input.drive(Arc::new(SystemClock))?;

            for sample in workflow.samples() {
                println!(
                    "{}: {:.1} ({})",
                    sample.name,
                    sample.sample_score,
                    classify_management(sample.sample_score)
                );
            }
            let average = workflow.running_average();
            let class = classify_management(average);
            println!("Average Qe-VESS score: {:.1} ({})", average, class);
            if let Some(advisory) = class.advisory() {
                println!("{}", advisory);
            }
            if let Some(elapsed) = workflow.elapsed() {
                println!(
                    "Elapsed: {}h{:02}min",
                    elapsed.num_hours(),
                    elapsed.num_minutes() % 60
                );
            }

            if submit {
                match workflow.submit(&mut store).await {
                    Ok(record) => {
                        println!("✅ Evaluation saved with id {}", record.id);
                        println!("{}", evaluation_summary(&record, &clock));
                    }
                    Err(failure) => {
                        let vess_field::core::workflow::SubmitFailure { error, .. } = *failure;
                        return Err(error);
                    }
                }
            }
        }
        Command::Export { output, page } => {
            store.load_page(page.unwrap_or(options.initial_page)).await?;
            let file = std::fs::File::create(&output)?;
            write_csv(store.evaluations(), file)?;
            println!(
                "📁 {} evaluations exported to {}",
                store.evaluations().len(),
                output.display()
            );
        }
    }

    Ok(())
}

fn print_page<G: EvaluationGateway>(store: &EvaluationStore<G>) {
    if store.evaluations().is_empty() {
        println!("No evaluations on this page");
    }
    for record in store.evaluations() {
        println!(
            "{}  {}  {}  {}  {:.1}",
            record.id, record.date, record.name, record.evaluator, record.average_score
        );
    }
    if let Some(pagination) = store.pagination() {
        println!(
            "Page {}/{} ({} evaluations)",
            pagination.current_page, pagination.total_pages, pagination.total_items
        );
    }
}

fn print_record(record: &EvaluationRecord, clock: &dyn Clock) {
    println!("{} ({})", record.name, record.id);
    println!("{}", evaluation_summary(record, clock));
    println!(
        "Average Qe-VESS score: {:.1} ({})",
        record.average_score,
        classify_management(record.average_score)
    );
    if let Some(description) = &record.management_description {
        println!("Management: {}", description);
    }

    for sample in &record.samples {
        println!();
        println!("{}: {:.1}", sample.name, sample.sample_score);
        if let Some(location) = &sample.location {
            println!("  Location: {}", location);
        }
        for layer in &sample.layers {
            let descriptor = score_descriptor(layer.score.value())
                .map(|d| format!(" - {}", d.characteristic))
                .unwrap_or_default();
            println!(
                "  Layer {}: {} cm, score {}{}",
                layer.order, layer.length, layer.score, descriptor
            );
        }
        if let Some(decision) = &sample.management_decision {
            println!("  Decision: {}", decision);
        }
    }
}
