//! Store configuration loaded from the environment.

use std::env;

/// Connection settings for the live Firestore adapter.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// GCP project id.
    pub project_id: String,
    /// Firestore database id. Almost always `(default)`.
    pub database: String,
    /// Collection holding the terminal records.
    pub collection: String,
    /// OAuth bearer token. Not needed against the emulator.
    pub access_token: Option<String>,
    /// `host:port` of a local Firestore emulator, when set.
    pub emulator_host: Option<String>,
}

impl StoreConfig {
    /// Loads configuration from the environment, reading a `.env` file
    /// first when one exists.
    ///
    /// # Errors
    ///
    /// Returns an error string when `FLEETFIX_PROJECT` is not set.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();

        let project_id = env::var("FLEETFIX_PROJECT")
            .map_err(|_| "FLEETFIX_PROJECT environment variable not set".to_string())?;

        Ok(Self {
            project_id,
            database: env::var("FLEETFIX_DATABASE").unwrap_or_else(|_| "(default)".to_string()),
            collection: env::var("FLEETFIX_COLLECTION")
                .unwrap_or_else(|_| "terminals".to_string()),
            access_token: env::var("FLEETFIX_ACCESS_TOKEN").ok(),
            emulator_host: env::var("FIRESTORE_EMULATOR_HOST").ok(),
        })
    }

    /// Base URL of the Firestore REST API, honoring the emulator override.
    #[must_use]
    pub fn base_url(&self) -> String {
        match &self.emulator_host {
            Some(host) => format!("http://{host}/v1"),
            None => "https://firestore.googleapis.com/v1".to_string(),
        }
    }

    /// Resource path of the parent database, without a trailing slash.
    #[must_use]
    pub fn database_path(&self) -> String {
        format!("projects/{}/databases/{}", self.project_id, self.database)
    }
}
