use anyhow::{anyhow, Context};
use clap::Subcommand;
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;

use crate::app::Resources;
use crate::config::AppConfig;
use crate::models;
use crate::resource::ResourceHandler;
use crate::store::{PgStore, Store};
use crate::types::Document;

#[derive(Subcommand)]
pub enum SeedCommands {
    #[command(about = "Import tours, users and reviews from a JSON file")]
    Import {
        #[arg(long, help = "JSON file of {tours: [..], users: [..], reviews: [..]}; users need password and passwordConfirm")]
        file: PathBuf,
    },

    #[command(about = "Delete every tour, user, review and booking")]
    Delete,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SeedFile {
    tours: Vec<Document>,
    users: Vec<Document>,
    reviews: Vec<Document>,
}

async fn connect(config: &AppConfig) -> anyhow::Result<Arc<PgStore>> {
    let url = config
        .database
        .url
        .as_deref()
        .ok_or_else(|| anyhow!("DATABASE_URL must be set for seeding"))?;
    let store = PgStore::connect(url, &config.database).await?;
    store.migrate(&models::all().map(|schema| &schema.collection)).await?;
    Ok(Arc::new(store))
}

pub async fn handle(cmd: SeedCommands) -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let store = connect(&config).await?;

    match cmd {
        SeedCommands::Import { file } => import(store, &config, file).await,
        SeedCommands::Delete => delete(store.as_ref()).await,
    }
}

async fn import(store: Arc<PgStore>, config: &AppConfig, file: PathBuf) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&file).with_context(|| format!("reading {}", file.display()))?;
    let seed: SeedFile = serde_json::from_str(&raw).with_context(|| format!("parsing {}", file.display()))?;

    let resources = Resources::new(store, config);
    // Tours first: review hooks update tour ratings
    load(&resources.tours, seed.tours).await?;
    load(&resources.users, seed.users).await?;
    load(&resources.reviews, seed.reviews).await?;

    println!("Data successfully loaded!");
    Ok(())
}

async fn load(handler: &ResourceHandler, docs: Vec<Document>) -> anyhow::Result<()> {
    let entity = handler.schema().entity;
    let total = docs.len();
    for (index, doc) in docs.into_iter().enumerate() {
        handler
            .import(doc)
            .await
            .map_err(|e| anyhow!("{} #{}: {}", entity, index + 1, e))?;
    }
    tracing::info!("Imported {} {} documents", total, entity);
    Ok(())
}

async fn delete(store: &PgStore) -> anyhow::Result<()> {
    for schema in models::all() {
        let removed = store.delete_all(&schema.collection).await?;
        tracing::info!("Deleted {} {} documents", removed, schema.entity);
    }
    println!("Data successfully deleted!");
    Ok(())
}
