use anyhow::{Context, Result};
use clap::Parser;
use common::{
    database::{init_pool, run_migrations},
    telemetry::init_tracing,
};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::{info, warn};

mod config;
mod parser;

use crate::parser::IngredientRow;

/// Postgres accepts at most `u16::MAX` bind parameters per statement and each
/// row binds two
const MAX_BATCH_ROWS: usize = u16::MAX as usize / 2;

/// Import ingredient reference data into the Foodgram database
#[derive(Parser, Debug)]
#[command(name = "foodgram-loader", author, version, about)]
struct Args {
    /// Ingredient file, one `name,unit` pair per line (overrides config)
    path: Option<String>,

    /// Path to configuration file
    #[arg(long)]
    config: Option<String>,

    /// Rows per INSERT statement (overrides config)
    #[arg(long)]
    batch_size: Option<usize>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = config::Config::load(args.config)?;
    init_tracing(&config.logging)?;

    let path = args.path.unwrap_or(config.loader.file);
    let requested = args.batch_size.unwrap_or(config.loader.batch_size);
    let batch_size = effective_batch_size(requested);
    if batch_size != requested {
        warn!(requested, batch_size, "Batch size adjusted");
    }

    info!("Loading ingredients from {}", path);

    let contents = tokio::fs::read_to_string(&path)
        .await
        .with_context(|| format!("Failed to read {}", path))?;

    let parsed = parser::parse_contents(&contents);
    for (line, reason) in &parsed.rejected {
        warn!(line, "Skipping malformed line: {}", reason);
    }

    let pool = init_pool(&config.database).await?;
    run_migrations(&pool).await?;

    let inserted = insert_ingredients(&pool, &parsed.rows, batch_size).await?;

    info!(
        inserted,
        skipped = parsed.rejected.len(),
        "Ingredient import finished"
    );

    Ok(())
}

fn effective_batch_size(requested: usize) -> usize {
    requested.clamp(1, MAX_BATCH_ROWS)
}

/// Insert every row in batches inside one transaction
async fn insert_ingredients(pool: &PgPool, rows: &[IngredientRow], batch_size: usize) -> Result<u64> {
    let mut tx = pool.begin().await?;
    let mut inserted = 0;

    for batch in rows.chunks(batch_size) {
        let mut query =
            QueryBuilder::<Postgres>::new("INSERT INTO ingredients (name, measurement_unit) ");
        query.push_values(batch, |mut values, row| {
            values.push_bind(&row.name).push_bind(&row.measurement_unit);
        });

        inserted += query.build().execute(&mut *tx).await?.rows_affected();
    }

    tx.commit().await?;

    Ok(inserted)
}
