use std::io::{ErrorKind, Result};

use actix_cors::Cors;
use actix_web::http::header::CONTENT_TYPE;
use actix_web::middleware::{Condition, Logger};
use actix_web::{App, HttpServer};
use clap::Parser;
use log::info;

use advisor_gateway::std_logger::StdLogger;
use advisor_gateway::{GatewayConfig, GatewayServiceFactory};

#[actix_web::main]
async fn main() -> Result<()> {
  let config = GatewayConfig::parse();
  StdLogger::install(config.log_filter()).map_err(|error| std::io::Error::new(ErrorKind::Other, error.to_string()))?;

  let bind = config.bind.clone();
  let port = config.port;
  let workers = config.workers;
  let cors_origins = config.cors_origins()?;
  let gateway = config.into_shared_gateway()?;

  info!("Listening on {}:{} with {} workers.", bind, port, workers);

  HttpServer::new(move || {
    let cors_enabled = !cors_origins.is_empty();
    let cors = cors_origins
      .iter()
      .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
      .allowed_methods(["GET", "POST", "OPTIONS"])
      .allowed_header(CONTENT_TYPE);

    App::new()
      .wrap(Condition::new(cors_enabled, cors))
      .wrap(Logger::new("%a \"%r\" %s %b %Dms"))
      .default_service(GatewayServiceFactory::create(gateway.clone()))
  })
  .workers(workers)
  .bind((bind, port))?
  .run()
  .await
}
