//! # Chat Relay Service
//!
//! Thin entry point that delegates to lib-web for server setup.

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    lib_web::start_server().await
}
