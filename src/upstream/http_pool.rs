use rand::seq::SliceRandom;
use reqwest::{Client, ClientBuilder, Proxy};
use std::time::Duration;

use crate::config::AppConfig;
use crate::errors::Result;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:121.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15",
];

pub fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Shared reqwest client for every upstream host, built once per
/// `(proxy, country)` client and cloned cheaply afterwards.
#[derive(Clone)]
pub struct HttpPool {
    client: Client,
    proxy: Option<String>,
}

impl HttpPool {
    pub fn new(config: &AppConfig, proxy: Option<&str>) -> Result<Self> {
        let mut builder = ClientBuilder::new()
            .pool_max_idle_per_host(8)
            .pool_idle_timeout(Some(Duration::from_secs(30)))
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(random_user_agent())
            .gzip(true)
            .brotli(true)
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true);

        if let Some(proxy_url) = proxy {
            log::info!("🌐 [HTTP] Routing upstream traffic through proxy {}", proxy_url);
            builder = builder.proxy(Proxy::all(proxy_url)?);
        }

        Ok(Self {
            client: builder.build()?,
            proxy: proxy.map(str::to_string),
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }
}
