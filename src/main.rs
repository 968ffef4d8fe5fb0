use axum::{
    extract::DefaultBodyLimit,
    middleware,
    response::Redirect,
    routing::{get, get_service, post},
    Router,
};
use dotenvy::dotenv;
use http::header::{HeaderValue, CACHE_CONTROL};
use sqlx::sqlite::SqlitePoolOptions;
use std::env;
use std::net::SocketAddr;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;

use brouwgids::database::schema;
use brouwgids::services::image_store;
use brouwgids::web::middleware::auth as auth_middleware;
use brouwgids::web::routes::{breweries, brewery};

#[tokio::main]
async fn main() {
    // Laad .env bestand
    dotenv().ok();

    // 1. Start logging
    tracing_subscriber::fmt::init();

    // Dev marker: maakt zichtbaar of de draaiende server de nieuwste build is.
    println!("🔧 Build: {}", env!("BROUWGIDS_BUILD_ID"));

    // 2. Verbind met de Database
    let db_url = env::var("DATABASE_URL").expect("DATABASE_URL moet in .env staan");
    println!("Verbinden met database: {}", db_url);

    let pool = SqlitePoolOptions::new()
        .connect(&db_url)
        .await
        .expect("Kan niet verbinden met DB");

    schema::ensure_schema(&pool)
        .await
        .expect("Schema setup mislukt");

    // 3. Protected routes onder één middleware layer
    let protected_routes = Router::new()
        .route("/my/breweries", get(breweries::my_breweries_handler))
        .route(
            "/breweries/new",
            get(brewery::new_brewery_handler).post(brewery::create_brewery_handler),
        )
        .route(
            "/breweries/:identifier/edit",
            get(brewery::edit_brewery_handler).post(brewery::update_brewery_handler),
        )
        .route(
            "/breweries/:identifier/delete",
            post(brewery::delete_brewery_handler),
        )
        .layer(middleware::from_fn_with_state(
            pool.clone(),
            auth_middleware::require_auth,
        ));

    // 4. Bouw de hele applicatie
    let app = Router::new()
        // Public routes
        .route("/", get(|| async { Redirect::to("/breweries") }))
        .route("/breweries", get(breweries::breweries_handler))
        .route("/breweries/:identifier", get(brewery::brewery_detail_handler))
        // Protected routes
        .merge(protected_routes)
        // Uploaded images and other public files
        .nest_service(
            "/public",
            get_service(ServeDir::new(image_store::public_root())),
        )
        // Layers
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CatchPanicLayer::new())
        // Form uploads may carry an image up to 2048 KB plus the text fields.
        .layer(DefaultBodyLimit::max(4 * 1024 * 1024))
        // State
        .with_state(pool);

    // 5. Start de server (met fallback poort)
    let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .expect("Kan host/port niet parsen");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!(
                "⚠️  Kon niet binden op {}: {}. Probeer fallback {}:{}",
                addr,
                e,
                host,
                port + 1
            );
            let fallback: SocketAddr = format!("{}:{}", host, port + 1)
                .parse()
                .expect("Kan fallback niet parsen");
            tokio::net::TcpListener::bind(fallback)
                .await
                .expect("Kan niet binden op fallback poort")
        }
    };

    let bound_addr = listener.local_addr().unwrap();
    println!("🚀 Server draait op http://{}", bound_addr);
    println!("🍺 Ga naar http://{}/breweries om te beginnen", bound_addr);

    axum::serve(listener, app).await.unwrap();
}
