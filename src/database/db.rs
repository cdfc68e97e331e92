use log::{error, info};
use mongodb::bson::doc;
use mongodb::{Client, options::ClientOptions};

/// Name of the database holding the threads, users and communities collections.
pub const DB_NAME: &str = "threads_db";

pub struct Database {
    pub client: Client,
}

impl Database {
    pub async fn init() -> Result<Self, mongodb::error::Error> {
        let mongodb_uri = std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());

        let mut client_options = ClientOptions::parse(&mongodb_uri).await?;
        client_options.app_name = Some("threads_backend".to_string());

        let client = Client::with_options(client_options)?;

        // Ping the server to see if you can connect to the cluster
        client.database("admin").run_command(doc! {"ping": 1}).await?;

        info!("Connected successfully to MongoDB");

        Ok(Self { client })
    }
}

// Convenience wrapper around Database::init()
pub async fn connect_to_mongo() -> Result<Client, mongodb::error::Error> {
    let database = Database::init().await.map_err(|e| {
        error!("Failed to initialize database: {:?}", e);
        e
    })?;
    Ok(database.client)
}
