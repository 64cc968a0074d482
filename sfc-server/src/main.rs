use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use sfc_index::{Point2, Point, PointData, Registry};
use tracing_subscriber::EnvFilter;

use sfc_server::config::{Cli, IndexConfig, ServerConfig};
use sfc_server::ingest::csv::CsvIngestor;
use sfc_server::ingest::Ingestor;
use sfc_server::server::ConnServer;
use sfc_server::work::Work;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = ServerConfig::load(&cli).context("loading configuration")?;
    let registry = Arc::new(ingest_all(&config).context("ingesting configured indexes")?);

    tracing::info!(port = config.port, threads = config.threads, "registry ready, starting server");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(config.threads)
        .enable_all()
        .build()
        .context("building async runtime")?;

    let work = Arc::new(Work::new(registry, config.fields.clone()));
    let server = Arc::new(ConnServer::new(work));
    runtime.block_on(server.run(config.port))?;
    Ok(())
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Runs every active, configured index's CSV driver to completion, sealing
/// each `PointData` as it finishes and publishing it into a fresh registry.
fn ingest_all(config: &ServerConfig) -> anyhow::Result<Registry> {
    let mut registry = Registry::new();
    for (name, idx) in &config.indexes {
        tracing::info!(index = %name, "ingesting");
        let count = ingest_one(&mut registry, &config.fields, idx)
            .with_context(|| format!("ingesting index '{name}'"))?;
        tracing::info!(index = %name, points = count, "index sealed");
    }
    Ok(registry)
}

fn ingest_one(registry: &mut Registry, fields: &[String], idx: &IndexConfig) -> anyhow::Result<usize> {
    let delim = idx
        .delim
        .as_deref()
        .and_then(|s| s.chars().next())
        .unwrap_or(',');
    let filename = idx
        .filename
        .as_deref()
        .context("csv driver requires a 'filename' key")?;

    let x_pos = field_pos(fields, &idx.x)?;
    let y_pos = field_pos(fields, &idx.y)?;
    let z_pos = match &idx.z {
        Some(z) => Some(field_pos(fields, z)?),
        None => None,
    };

    let mut ingestor = CsvIngestor::new(filename, delim, fields.to_vec());
    let count;
    let path = filename.to_string();

    if let Some(z_pos) = z_pos {
        let mut pd: PointData<3> = PointData::new();
        ingestor.for_each_row(&mut |row| {
            let point = Point::<3>::new([
                parse_coord(&path, &idx.x, &row, x_pos)?,
                parse_coord(&path, &idx.y, &row, y_pos)?,
                parse_coord(&path, idx.z.as_deref().unwrap_or(""), &row, z_pos)?,
            ]);
            pd.add(point, row)?;
            Ok(())
        })?;
        count = pd.len();
        pd.lock()?;
        registry.insert_3d(idx.index.clone(), pd)?;
    } else {
        let mut pd: PointData<2> = PointData::new();
        ingestor.for_each_row(&mut |row| {
            let point = Point2::new([
                parse_coord(&path, &idx.x, &row, x_pos)?,
                parse_coord(&path, &idx.y, &row, y_pos)?,
            ]);
            pd.add(point, row)?;
            Ok(())
        })?;
        count = pd.len();
        pd.lock()?;
        registry.insert_2d(idx.index.clone(), pd)?;
    }

    Ok(count)
}

fn field_pos(fields: &[String], name: &str) -> anyhow::Result<usize> {
    fields
        .iter()
        .position(|f| f == name)
        .with_context(|| format!("field '{name}' is not in [system].fields"))
}

fn parse_coord(path: &str, field: &str, row: &[String], pos: usize) -> Result<i64, sfc_server::error::IngestError> {
    row[pos]
        .parse::<i64>()
        .map_err(|_| sfc_server::error::IngestError::BadCoordinate {
            path: path.to_string(),
            line: 0,
            field: field.to_string(),
            value: row[pos].clone(),
        })
}
