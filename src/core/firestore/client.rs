use crate::app::config::FirestoreConfig;
use anyhow::{Context, Error};
use firestore::{FirestoreDb, FirestoreDbOptions};
use tracing::info;

/// Connect to the configured Firestore database, using a service account
/// key file when given and application default credentials otherwise
pub async fn create_client(config: &FirestoreConfig) -> Result<FirestoreDb, Error> {
    let mut options = FirestoreDbOptions::new(config.project_id.clone());

    if let Some(db_id) = &config.database_id {
        options = options.with_database_id(db_id.clone());
    }

    if let Some(host) = &config.emulator_host {
        options = options.with_firebase_api_url(format!("http://{host}"));
    }

    let db = match &config.credentials_path {
        Some(path) => FirestoreDb::with_options_service_account_key_file(options, path.clone())
            .await
            .with_context(|| format!("firestore key file {}", path.display()))?,
        None => FirestoreDb::with_options(options)
            .await
            .context("firestore default credentials")?,
    };

    info!(
        "Connected to firestore project {} database {}",
        config.project_id,
        config.database_id.as_deref().unwrap_or("(default)")
    );

    Ok(db)
}
