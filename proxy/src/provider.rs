use actix_web::http::header::HeaderMap;
use common::error_inject::Provider;
use std::collections::HashMap;

/// Paths that are always forwarded untouched: auth, discovery and management endpoints.
pub const ALWAYS_FORWARD_PATHS: &[&str] = &["/oidc/", "/.well-known/", "/oauth", "/api/2.0/"];

/// Path markers that only databricks uses. Checked before any header.
const DATABRICKS_PATH_MARKERS: &[&str] = &["/serving-endpoints/", "/api/2.0/", "/oidc/"];

/// Guess which provider a request is meant for from its path and headers.
///
/// Databricks path markers win over headers, since databricks auth endpoints
/// would otherwise look like plain bearer-token (openai) traffic.
pub fn detect_provider(path: &str, headers: &HeaderMap) -> Provider {
    let path = path.to_lowercase();

    if DATABRICKS_PATH_MARKERS.iter().any(|m| path.contains(m)) {
        return Provider::Databricks;
    }
    if headers.contains_key("x-api-key") {
        return Provider::Anthropic;
    }
    if headers.contains_key("x-goog-api-key") {
        return Provider::Google;
    }

    let bearer = headers
        .get(actix_web::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.to_lowercase().contains("bearer"))
        .unwrap_or(false);
    if bearer {
        return provider_from_path_hint(&path).unwrap_or(Provider::OpenAi);
    }

    Provider::OpenAi
}

fn provider_from_path_hint(path: &str) -> Option<Provider> {
    if path.contains("anthropic") || path.contains("messages") {
        Some(Provider::Anthropic)
    } else if path.contains("google") || path.contains("generativelanguage") {
        Some(Provider::Google)
    } else if path.contains("openrouter") {
        Some(Provider::OpenRouter)
    } else if path.contains("tetrate") {
        Some(Provider::Tetrate)
    } else if path.contains("databricks") {
        Some(Provider::Databricks)
    } else {
        None
    }
}

/// True if `path` must never receive an injected error.
pub fn is_always_forward(path: &str) -> bool {
    ALWAYS_FORWARD_PATHS.iter().any(|p| path.contains(p))
}

/// Real upstream hosts configured per provider, assembled once at startup.
#[derive(Debug, Clone, Default)]
pub struct UpstreamHosts {
    overrides: HashMap<Provider, String>,
}

impl UpstreamHosts {
    /// Merge the config file's `[real_hosts]` table with `<PROVIDER>_REAL_HOST`
    /// variables from the process environment. The environment wins.
    pub fn from_env(config_hosts: &HashMap<String, String>) -> Self {
        Self::from_sources(config_hosts, |key| std::env::var(key).ok())
    }

    pub fn from_sources(
        config_hosts: &HashMap<String, String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Self {
        let mut hosts = Self::default();
        for (name, host) in config_hosts {
            match Provider::from_name(name) {
                Some(provider) => hosts = hosts.with_override(provider, host),
                None => log::warn!("Ignoring real host for unknown provider '{}'", name),
            }
        }
        for provider in Provider::ALL {
            if let Some(host) = env(&provider.real_host_env()) {
                hosts = hosts.with_override(provider, &host);
            }
        }
        hosts
    }

    pub fn with_override(mut self, provider: Provider, host: &str) -> Self {
        let host = host.trim().trim_end_matches('/');
        if !host.is_empty() {
            self.overrides.insert(provider, host.to_string());
        }
        self
    }

    pub fn get(&self, provider: Provider) -> Option<&str> {
        self.overrides.get(&provider).map(String::as_str)
    }

    /// Base host to forward to.
    ///
    /// The provider's own override comes first. Always-forward paths without
    /// one borrow the first configured override of any provider, because auth
    /// endpoints are often shared and hard to attribute. Otherwise the
    /// provider's public host is used.
    pub fn resolve(&self, provider: Provider, always_forward: bool) -> &str {
        if let Some(host) = self.get(provider) {
            return host;
        }
        if always_forward {
            if let Some((p, host)) = Provider::ALL
                .into_iter()
                .find_map(|p| self.get(p).map(|h| (p, h)))
            {
                log::info!("Using {} for always-forward path", p.real_host_env());
                return host;
            }
        }
        provider.profile().default_host
    }
}
