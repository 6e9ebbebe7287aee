use std::sync::Arc;

#[tokio::main]
async fn main() {
    petstore_observability::init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
    let port: u16 = match std::env::var("PORT") {
        Ok(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!(port = %raw, "PORT is not a valid port number; using 8080");
            8080
        }),
        Err(_) => 8080,
    };

    let store = petstore_store::PostgresStore::connect(&database_url)
        .await
        .expect("failed to connect to database");

    let app = petstore_api::app::build_app(Arc::new(store));

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .unwrap_or_else(|e| panic!("failed to bind 0.0.0.0:{port}: {e}"));

    tracing::info!("listening on {}", listener.local_addr().unwrap());

    axum::serve(listener, app).await.unwrap();
}
