//! PTMD CLI: database setup, seed bootstrap and the file lifecycle.
//!
//! Configuration comes from the environment (or `.env`): DATABASE_URL, the
//! drive backend settings and the optional SHEET_SCHEMA_PATH. `columns` only
//! reads SHEET_SCHEMA_PATH. Failures are printed as JSON on stderr; rejected
//! requests exit with status 2, other failures with 1.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use ptmd_cli::{init_tracing, AppContext, Cli, Commands, ErrorReport};
use ptmd_core::Config;
use ptmd_db::{run_migrations, setup_database, Bootstrapper, SeedData};
use serde::Serialize;

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize response")?;
    println!("{}", out);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    if let Commands::Columns = cli.command {
        return finish(print_columns(), false);
    }

    let config = match Config::from_env().context("Failed to load configuration") {
        Ok(config) => config,
        Err(err) => return finish(Err(err), false),
    };
    let production = config.is_production();
    finish(run(cli, &config).await, production)
}

fn finish(result: anyhow::Result<()>, production: bool) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => ErrorReport::from_anyhow(&err, production).emit(),
    }
}

fn print_columns() -> anyhow::Result<()> {
    let model = Config::column_model_from_env().context("Failed to load sheet schema")?;
    print_json(&model.sample_sheet_columns())
}

async fn run(cli: Cli, config: &Config) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Migrate => {
            let pool = setup_database(config).await?;
            run_migrations(&pool).await?;
            return print_json(&serde_json::json!({ "success": true }));
        }
        Commands::Boot { seed } => {
            let raw = std::fs::read_to_string(seed)
                .with_context(|| format!("Failed to read seed file {}", seed.display()))?;
            let seed: SeedData = serde_json::from_str(&raw).context("Invalid seed document")?;
            let pool = setup_database(config).await?;
            let report = Bootstrapper::new(pool).run(&seed).await;
            return print_json(&report);
        }
        _ => {}
    }

    let app = AppContext::build(config).await?;
    let user = cli.user.as_deref();

    match cli.command {
        Commands::Codes { names } => {
            let mapping = app.chemicals.code_mapping(&names.into_iter().collect()).await?;
            print_json(&mapping)?;
        }
        Commands::Register { gdrive_id, name } => {
            let caller = app.caller(user).await?;
            let file = app.files.register(&caller, &gdrive_id, name).await?;
            print_json(&app.files.view(&file).await?)?;
        }
        Commands::Upload { file, organisation } => {
            let caller = app.caller(user).await?;
            let filename = file
                .file_name()
                .and_then(|n| n.to_str())
                .context("Upload path has no file name")?
                .to_string();
            let data = std::fs::read(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let registered = app
                .files
                .upload_and_register(&caller, organisation, &filename, data)
                .await?;
            print_json(&app.files.view(&registered).await?)?;
        }
        Commands::Get { file_id } => {
            let file = app.files.get(file_id).await?;
            print_json(&app.files.view(&file).await?)?;
        }
        Commands::Validate { file_id } => {
            let report = app.files.validate(file_id).await?;
            print_json(&report)?;
        }
        Commands::Ship { file_id, at } => {
            let caller = app.caller(user).await?;
            let file = app.files.ship(&caller, file_id, at.as_deref()).await?;
            print_json(&app.files.view(&file).await?)?;
        }
        Commands::Receive { file_id, at } => {
            let caller = app.caller(user).await?;
            let file = app.files.receive(&caller, file_id, at.as_deref()).await?;
            print_json(&app.files.view(&file).await?)?;
        }
        Commands::Remove { file_id } => {
            let caller = app.caller(user).await?;
            app.files.remove(&caller, file_id).await?;
            print_json(
                &serde_json::json!({ "success": true, "message": format!("File {} removed", file_id) }),
            )?;
        }
        Commands::Search(args) => {
            let files = app.files.search(&args.filter()?).await?;
            let mut views = Vec::with_capacity(files.len());
            for file in &files {
                views.push(app.files.view(file).await?);
            }
            print_json(&views)?;
        }
        Commands::Batch {
            organisation,
            batch,
        } => {
            let available = app.files.batch_validation(organisation, &batch).await?;
            print_json(&serde_json::json!({ "batch": batch, "available": available }))?;
        }
        Commands::UpdateBatch { file_id, batch } => {
            let caller = app.caller(user).await?;
            let file = app.files.update_batch(&caller, file_id, &batch).await?;
            print_json(&app.files.view(&file).await?)?;
        }
        Commands::Columns | Commands::Migrate | Commands::Boot { .. } => {}
    }

    app.pool.close().await;
    Ok(())
}
