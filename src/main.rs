#![warn(clippy::pedantic)]

use std::sync::Arc;

use aws_config::BehaviorVersion;
use aws_config::meta::region::RegionProviderChain;

use crate::apis::bedrock::TitanImage;
use crate::apis::line::LineMessaging;
use crate::apis::s3::S3Bucket;
use crate::config::Config;
use crate::pipeline::Pipeline;

mod apis;
mod config;
mod error;
mod extract;
mod logging;
mod pipeline;
mod routes;
mod signature;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let config = Config::from_env();
    logging::init(config.log_level);

    let region = RegionProviderChain::default_provider().or_else("us-east-1");
    let aws_config = aws_config::defaults(BehaviorVersion::latest()).region(region).load().await;

    let pipeline = Arc::new(Pipeline::new(
        TitanImage::new(aws_sdk_bedrockruntime::Client::new(&aws_config), config.model_id),
        S3Bucket::new(aws_sdk_s3::Client::new(&aws_config), config.bucket_name),
        LineMessaging::new(reqwest::Client::new(), config.channel_access_token),
        config.channel_secret,
    ));

    let app = routes::build(pipeline);
    let listener = tokio::net::TcpListener::bind(&config.bind_address).await.unwrap();
    log::info!("listening on {}", config.bind_address);

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await.unwrap();
    log::info!("shut down");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.unwrap();
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .unwrap()
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }

    log::info!("shutdown signal received");
}
