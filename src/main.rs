use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use fusionrec::{load_dataset_path, EngineConfig, ModelArtifact, ModelStore, Recommender};
use fusionrec_storage::DEFAULT_SAMPLE_CAP;
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Multi-modal product recommender
#[derive(Parser, Debug)]
#[command(name = "fusionrec")]
#[command(about = "Fit and query a tabular + text product recommender", long_about = None)]
struct Cli {
    /// Log level (overridden by RUST_LOG when set)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a dataset, fit a model and store it
    Train(TrainArgs),
    /// Recommend items similar to a stored item
    Recommend {
        #[command(flatten)]
        model: ModelArgs,
        /// Index of the query item
        #[arg(long)]
        item: usize,
        /// Number of recommendations (default: neighbor count - 1)
        #[arg(long)]
        k: Option<usize>,
    },
    /// Offline retrieval metrics for a stored model
    Metrics {
        #[command(flatten)]
        model: ModelArgs,
        #[arg(long, default_value_t = 5)]
        k: usize,
    },
    /// List the items a stored model indexes
    Items {
        #[command(flatten)]
        model: ModelArgs,
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
    /// Show whether a model is stored
    Status {
        #[command(flatten)]
        model: ModelArgs,
    },
    /// List the models in a store
    List {
        /// Model store directory
        #[arg(long, default_value = "./models")]
        store: PathBuf,
    },
    /// Remove a stored model
    Delete {
        #[command(flatten)]
        model: ModelArgs,
    },
}

#[derive(Args, Debug)]
struct ModelArgs {
    /// Model store directory
    #[arg(long, default_value = "./models")]
    store: PathBuf,

    /// Model name inside the store
    #[arg(long, default_value = "default")]
    name: String,
}

#[derive(Args, Debug)]
struct TrainArgs {
    /// Gzip-compressed JSON Lines product dump
    #[arg(long)]
    data: PathBuf,

    #[command(flatten)]
    model: ModelArgs,

    /// Maximum number of records to load
    #[arg(long, default_value_t = DEFAULT_SAMPLE_CAP)]
    samples: usize,

    /// Neighbor count remembered by the index
    #[arg(long, default_value_t = 6)]
    neighbors: usize,

    /// Disable the nutrient modality
    #[arg(long)]
    no_tabular: bool,

    /// Disable the text modality
    #[arg(long)]
    no_text: bool,

    /// Nutrient columns kept by the ANOVA selector
    #[arg(long, default_value_t = 4)]
    k_best: usize,

    /// Vocabulary cap of the text extractor
    #[arg(long, default_value_t = 100)]
    max_features: usize,
}

impl TrainArgs {
    fn engine_config(&self) -> EngineConfig {
        EngineConfig::default()
            .with_tabular(!self.no_tabular)
            .with_text(!self.no_text)
            .with_k_best(self.k_best)
            .with_max_features(self.max_features)
            .with_neighbor_count(self.neighbors)
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log_level)?;

    let output = match cli.command {
        Command::Train(args) => train(&args)?,
        Command::Recommend { model, item, k } => recommend(&model, item, k)?,
        Command::Metrics { model, k } => metrics(&model, k)?,
        Command::Items { model, limit } => items(&model, limit)?,
        Command::Status { model } => status(&model)?,
        Command::List { store } => list(&store)?,
        Command::Delete { model } => delete(&model)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn init_tracing(log_level: &str) -> anyhow::Result<()> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
        return Ok(());
    }

    let log_level = match log_level {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn train(args: &TrainArgs) -> anyhow::Result<serde_json::Value> {
    let config = args.engine_config();
    config.validate()?;

    let store = ModelStore::new(&args.model.store)?;
    let dataset = load_dataset_path(&args.data, args.samples)
        .with_context(|| format!("failed to load dataset {}", args.data.display()))?;

    let trained = Recommender::new(config).fit_dataset(
        &dataset.tabular,
        &dataset.texts,
        &dataset.labels,
    )?;
    let model = trained.model()?;

    let artifact = ModelArtifact::new(model, &dataset)?;
    let description = store.save(&args.model.name, &artifact.to_bytes()?)?;
    info!(name = %args.model.name, model_id = %model.id(), "training complete");

    Ok(json!({
        "status": "trained",
        "items_loaded": dataset.len(),
        "malformed_lines": dataset.stats.malformed,
        "modalities": model.modalities(),
        "model_id": model.id().to_string(),
        "blob": description,
    }))
}

fn open_artifact(args: &ModelArgs) -> anyhow::Result<ModelArtifact> {
    let store = ModelStore::new(&args.store)?;
    let bytes = store.load(&args.name)?;
    ModelArtifact::from_bytes(&bytes)
        .with_context(|| format!("model '{}' is not a readable artifact", args.name))
}

fn recommend(args: &ModelArgs, item: usize, k: Option<usize>) -> anyhow::Result<serde_json::Value> {
    let artifact = open_artifact(args)?;
    let model = artifact.model()?;
    let k = k.unwrap_or_else(|| model.config().default_k());

    let neighbors = model.recommend_with_distances(item, k)?;
    let recommendations: Vec<_> = neighbors
        .iter()
        .map(|n| {
            json!({
                "index": n.index,
                "product_name": artifact.item(n.index).map(|m| m.product_name.as_str()),
                "distance": n.distance,
            })
        })
        .collect();

    Ok(json!({
        "query_index": item,
        "product_name": artifact.item(item).map(|m| m.product_name.as_str()),
        "recommendations": recommendations,
    }))
}

fn metrics(args: &ModelArgs, k: usize) -> anyhow::Result<serde_json::Value> {
    let model = open_artifact(args)?.model()?;
    let report = model.evaluate(k)?;
    Ok(serde_json::to_value(report)?)
}

fn items(args: &ModelArgs, limit: usize) -> anyhow::Result<serde_json::Value> {
    let artifact = open_artifact(args)?;
    let listed: Vec<_> = artifact
        .items
        .iter()
        .take(limit)
        .enumerate()
        .map(|(index, meta)| {
            json!({
                "index": index,
                "product_name": meta.product_name,
                "category": meta.category,
            })
        })
        .collect();

    Ok(json!({
        "total": artifact.items.len(),
        "items": listed,
    }))
}

fn status(args: &ModelArgs) -> anyhow::Result<serde_json::Value> {
    let store = ModelStore::new(&args.store)?;
    let Some(description) = store.describe(&args.name)? else {
        return Ok(json!({ "name": args.name, "trained": false }));
    };

    let model = open_artifact(args)?.model()?;
    Ok(json!({
        "name": args.name,
        "trained": true,
        "model_id": model.id().to_string(),
        "items": model.len(),
        "modalities": model.modalities(),
        "config": model.config(),
        "blob": description,
    }))
}

fn list(store: &Path) -> anyhow::Result<serde_json::Value> {
    let models = ModelStore::new(store)?.list()?;
    Ok(json!({
        "total": models.len(),
        "models": models,
    }))
}

fn delete(args: &ModelArgs) -> anyhow::Result<serde_json::Value> {
    let store = ModelStore::new(&args.store)?;
    let deleted = store.delete(&args.name)?;
    if deleted {
        info!(name = %args.name, "model deleted");
    }
    Ok(json!({ "name": args.name, "deleted": deleted }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    const PRODUCTS: [(&str, &str, &str, [f64; 4]); 6] = [
        ("Oat drink", "water, oats, salt", "Beverages", [180.0, 1.5, 0.3, 6.8]),
        ("Oat barista", "water, oats, rapeseed oil", "Beverages", [210.0, 3.0, 1.0, 6.5]),
        ("Soy drink", "water, soybeans", "Beverages", [160.0, 1.8, 3.3, 2.5]),
        ("Milk chocolate", "sugar, cocoa butter, milk", "Snacks", [2250.0, 31.0, 7.0, 57.0]),
        ("Dark chocolate", "cocoa mass, sugar", "Snacks", [2400.0, 42.0, 9.0, 33.0]),
        ("Hazelnut bar", "sugar, hazelnuts, cocoa", "Snacks", [2300.0, 35.0, 8.0, 50.0]),
    ];

    fn write_dataset(dir: &TempDir) -> PathBuf {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        for (name, ingredients, category, n) in PRODUCTS {
            let line = json!({
                "product_name": name,
                "ingredients_text": ingredients,
                "categories": category,
                "nutriments": {
                    "energy_100g": n[0],
                    "fat_100g": n[1],
                    "proteins_100g": n[2],
                    "carbohydrates_100g": n[3],
                }
            });
            writeln!(encoder, "{line}").unwrap();
        }
        let path = dir.path().join("products.jsonl.gz");
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();
        path
    }

    fn model_args(dir: &TempDir, name: &str) -> ModelArgs {
        ModelArgs {
            store: dir.path().join("models"),
            name: name.to_string(),
        }
    }

    fn train_args(dir: &TempDir, name: &str) -> TrainArgs {
        TrainArgs {
            data: write_dataset(dir),
            model: model_args(dir, name),
            samples: 100,
            neighbors: 4,
            no_tabular: false,
            no_text: false,
            k_best: 4,
            max_features: 100,
        }
    }

    #[test]
    fn test_train_then_recommend() {
        let dir = TempDir::new().unwrap();
        let trained = train(&train_args(&dir, "catalog")).unwrap();
        assert_eq!(trained["items_loaded"], 6);

        let output = recommend(&model_args(&dir, "catalog"), 0, None).unwrap();
        let recs = output["recommendations"].as_array().unwrap();
        assert_eq!(recs.len(), 3);
        let mut top: Vec<u64> = recs[..2].iter().map(|r| r["index"].as_u64().unwrap()).collect();
        top.sort_unstable();
        assert_eq!(top, vec![1, 2]);
        assert!(recs.iter().all(|r| r["index"] != 0));
    }

    #[test]
    fn test_list_and_delete_models() {
        let dir = TempDir::new().unwrap();
        train(&train_args(&dir, "b")).unwrap();
        train(&train_args(&dir, "a")).unwrap();

        let listed = list(&dir.path().join("models")).unwrap();
        assert_eq!(listed["total"], 2);
        assert_eq!(listed["models"][0]["name"], "a");

        let deleted = delete(&model_args(&dir, "a")).unwrap();
        assert_eq!(deleted["deleted"], true);
        assert_eq!(status(&model_args(&dir, "a")).unwrap()["trained"], false);
        assert_eq!(delete(&model_args(&dir, "a")).unwrap()["deleted"], false);
        assert_eq!(list(&dir.path().join("models")).unwrap()["total"], 1);
    }
}
