use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use actix_web::http::header::CONTENT_TYPE;
use actix_web::http::Method;
use actix_web::{web, HttpResponse};
use log::{debug, error};

use crate::error::GatewayError;

const INDEX_FILE: &str = "index.html";

/// Terminal branch for requests no route claims: files under a fixed root.
#[derive(Debug, Clone)]
pub struct StaticAssets {
  root: PathBuf,
}

impl StaticAssets {
  pub fn new(root: impl Into<PathBuf>) -> StaticAssets {
    StaticAssets { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Maps a request path onto the asset root. `None` when the path could
  /// escape the root or does not decode.
  pub fn resolve(&self, request_path: &str) -> Option<PathBuf> {
    let decoded = urlencoding::decode(request_path).ok()?;
    if decoded.contains('\0') || decoded.contains('\\') {
      return None;
    }

    let mut file = self.root.clone();
    for segment in decoded.split('/') {
      match segment {
        "" | "." => continue,
        ".." => return None,
        name => file.push(name),
      }
    }

    Some(file)
  }

  pub async fn serve(&self, method: &Method, request_path: &str) -> Result<HttpResponse, GatewayError> {
    let not_found = || GatewayError::RouteNotFound {
      path: String::from(request_path),
    };

    if *method != Method::GET && *method != Method::HEAD {
      return Err(not_found());
    }

    let file = self.resolve(request_path).ok_or_else(not_found)?;
    let asset = web::block(move || read_asset(file)).await;

    match asset {
      Ok(Ok(Some((file, content)))) => {
        let mut response = HttpResponse::Ok();
        response.insert_header((CONTENT_TYPE, content_type_for(&file)));
        if *method == Method::HEAD {
          Ok(response.finish())
        } else {
          Ok(response.body(content))
        }
      }
      Ok(Ok(None)) => {
        debug!("No asset for '{}'", request_path);
        Err(not_found())
      }
      Ok(Err(err)) => {
        error!("Reading asset for '{}' failed {}", request_path, err);
        Err(not_found())
      }
      Err(err) => {
        error!("Asset reader for '{}' did not finish {}", request_path, err);
        Err(not_found())
      }
    }
  }
}

fn read_asset(mut file: PathBuf) -> std::io::Result<Option<(PathBuf, Vec<u8>)>> {
  if file.is_dir() {
    file.push(INDEX_FILE);
  }

  if !file.is_file() {
    return Ok(None);
  }

  match std::fs::read(&file) {
    Ok(content) => Ok(Some((file, content))),
    Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
    Err(err) => Err(err),
  }
}

pub fn content_type_for(file: &Path) -> &'static str {
  let extension = file
    .extension()
    .and_then(|ext| ext.to_str())
    .map(|ext| ext.to_ascii_lowercase());

  match extension.as_deref() {
    Some("html") | Some("htm") => "text/html; charset=utf-8",
    Some("css") => "text/css; charset=utf-8",
    Some("js") | Some("mjs") => "text/javascript; charset=utf-8",
    Some("json") | Some("map") => "application/json",
    Some("txt") => "text/plain; charset=utf-8",
    Some("svg") => "image/svg+xml",
    Some("png") => "image/png",
    Some("jpg") | Some("jpeg") => "image/jpeg",
    Some("gif") => "image/gif",
    Some("ico") => "image/x-icon",
    Some("webp") => "image/webp",
    Some("woff") => "font/woff",
    Some("woff2") => "font/woff2",
    Some("wasm") => "application/wasm",
    _ => "application/octet-stream",
  }
}
