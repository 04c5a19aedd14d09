use migration::{Migrator, MigratorTrait};
use sea_orm::Database;
use snapvite::config::get_config;
use snapvite::routes::create_routes;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let config = get_config();

    let db = Database::connect(config.database_url.as_str())
        .await
        .expect("Failed to connect to database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    // build our application using the routes module
    let app = create_routes(db);

    // run our app with hyper, listening globally on port 3000
    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
    println!("Listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.unwrap();
}
