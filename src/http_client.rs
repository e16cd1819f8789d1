use std::time::Duration;

use reqwest::redirect::Policy;
use reqwest::Client;

pub struct HttpClientConfig {
  pub http_proxy: Option<String>,
  pub user: Option<String>,
  pub pass: Option<String>,
  pub connect_timeout: Option<Duration>,
}

impl HttpClientConfig {
  /// Client shared by every forward. Redirects are relayed, never followed.
  pub fn to_client(self) -> Result<Client, reqwest::Error> {
    let HttpClientConfig {
      http_proxy,
      user,
      pass,
      connect_timeout,
    } = self;
    let mut client_builder = reqwest::ClientBuilder::new();

    if let Some(proxy_url) = http_proxy {
      let mut proxy = reqwest::Proxy::all(proxy_url)?;

      if let (Some(user_name), Some(password)) = (user, pass) {
        proxy = proxy.basic_auth(&user_name, &password);
      }

      client_builder = client_builder.proxy(proxy);
    } else {
      client_builder = client_builder.no_proxy();
    }

    if let Some(timeout) = connect_timeout {
      client_builder = client_builder.connect_timeout(timeout);
    }

    let client = client_builder.redirect(Policy::none()).build()?;

    Ok(client)
  }
}
