use shared_todo::{
    config::Config,
    core::models::todo::Todo,
    infrastructure::storage::{Storage, postgres::PostgresStorage},
};
use tracing::info;

const SAMPLE_TODOS: [&str; 3] = [
    "Complete Project Documentation",
    "Prepare for the presentation",
    "Fix application bugs",
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let config = Config::from_env();
    let url = config
        .database_url
        .ok_or("DATABASE_URL must be set to seed the database")?;

    let storage = PostgresStorage::connect(&url).await?;
    storage.migrate().await?;

    let removed = sqlx::query("DELETE FROM todos").execute(storage.pool()).await?;
    info!("Removed {} existing todos", removed.rows_affected());

    for title in SAMPLE_TODOS {
        let todo = storage.save_todo(Todo::new(title.to_string(), None)).await?;
        info!("Seeded todo {} ({})", todo.id, todo.title);
    }

    info!("Database seeded successfully");
    Ok(())
}
