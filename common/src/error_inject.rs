use std::fmt;

/// The synthetic failure a provider response can emulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorMode {
    #[default]
    NoError,
    ContextLength,
    RateLimit,
    ServerError,
}

impl ErrorMode {
    /// Title-cased name used in status lines (e.g. "Rate Limit").
    pub fn title(self) -> &'static str {
        match self {
            ErrorMode::NoError => "No Error",
            ErrorMode::ContextLength => "Context Length",
            ErrorMode::RateLimit => "Rate Limit",
            ErrorMode::ServerError => "Server Error",
        }
    }

    /// Longer label for the operator status panel.
    pub fn label(self) -> &'static str {
        match self {
            ErrorMode::NoError => "No error (pass through)",
            ErrorMode::ContextLength => "Context length exceeded",
            ErrorMode::RateLimit => "Rate limit exceeded",
            ErrorMode::ServerError => "Server error (500)",
        }
    }
}

impl fmt::Display for ErrorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorMode::NoError => "NO_ERROR",
            ErrorMode::ContextLength => "CONTEXT_LENGTH",
            ErrorMode::RateLimit => "RATE_LIMIT",
            ErrorMode::ServerError => "SERVER_ERROR",
        };
        f.write_str(name)
    }
}

/// An upstream LLM API vendor the proxy knows how to emulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    OpenAi,
    Anthropic,
    Google,
    OpenRouter,
    Tetrate,
    Databricks,
}

impl Provider {
    /// All providers, in the order host overrides are scanned.
    pub const ALL: [Provider; 6] = [
        Provider::OpenAi,
        Provider::Anthropic,
        Provider::Google,
        Provider::OpenRouter,
        Provider::Tetrate,
        Provider::Databricks,
    ];

    pub fn as_str(self) -> &'static str {
        self.profile().name
    }

    /// Look up a provider by its lowercase name.
    pub fn from_name(name: &str) -> Option<Provider> {
        Provider::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(name))
    }

    /// Environment variable holding the real upstream host, e.g. `OPENAI_REAL_HOST`.
    pub fn real_host_env(self) -> String {
        format!("{}_REAL_HOST", self.as_str().to_uppercase())
    }

    /// Environment variable a client sets to route through the proxy, e.g. `OPENAI_HOST`.
    pub fn client_host_env(self) -> String {
        format!("{}_HOST", self.as_str().to_uppercase())
    }

    pub fn profile(self) -> &'static ProviderProfile {
        match self {
            Provider::OpenAi => &PROFILES[0],
            Provider::Anthropic => &PROFILES[1],
            Provider::Google => &PROFILES[2],
            Provider::OpenRouter => &PROFILES[3],
            Provider::Tetrate => &PROFILES[4],
            Provider::Databricks => &PROFILES[5],
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A canned error response for one provider and one mode.
#[derive(Debug)]
pub struct ErrorTemplate {
    pub mode: ErrorMode,
    /// HTTP status code for this error.
    pub status: u16,
    /// The JSON error payload returned to the client, shaped like the provider's own.
    pub body_json: &'static str,
}

/// Static description of a provider: default public host and its error envelopes.
#[derive(Debug)]
pub struct ProviderProfile {
    pub name: &'static str,
    pub default_host: &'static str,
    pub templates: &'static [ErrorTemplate],
}

impl ProviderProfile {
    pub fn template(&self, mode: ErrorMode) -> Option<&'static ErrorTemplate> {
        self.templates.iter().find(|t| t.mode == mode)
    }
}

pub const PROFILES: &[ProviderProfile] = &[
    ProviderProfile {
        name: "openai",
        default_host: "https://api.openai.com",
        templates: &[
            ErrorTemplate {
                mode: ErrorMode::ContextLength,
                status: 400,
                body_json: r#"{"error":{"message":"This model's maximum context length is 128000 tokens. However, your messages resulted in 150000 tokens. Please reduce the length of the messages.","type":"invalid_request_error","code":"context_length_exceeded"}}"#,
            },
            ErrorTemplate {
                mode: ErrorMode::RateLimit,
                status: 429,
                body_json: r#"{"error":{"message":"Rate limit exceeded. Please try again later.","type":"rate_limit_error","code":"rate_limit_exceeded"}}"#,
            },
            ErrorTemplate {
                mode: ErrorMode::ServerError,
                status: 500,
                body_json: r#"{"error":{"message":"The server had an error while processing your request. Sorry about that!","type":"server_error","code":"internal_server_error"}}"#,
            },
        ],
    },
    ProviderProfile {
        name: "anthropic",
        default_host: "https://api.anthropic.com",
        templates: &[
            ErrorTemplate {
                mode: ErrorMode::ContextLength,
                status: 400,
                body_json: r#"{"type":"error","error":{"type":"invalid_request_error","message":"prompt is too long: 150000 tokens > 100000 maximum"}}"#,
            },
            ErrorTemplate {
                mode: ErrorMode::RateLimit,
                status: 429,
                body_json: r#"{"type":"error","error":{"type":"rate_limit_error","message":"Rate limit exceeded. Please try again later."}}"#,
            },
            ErrorTemplate {
                mode: ErrorMode::ServerError,
                status: 529,
                body_json: r#"{"type":"error","error":{"type":"overloaded_error","message":"The API is temporarily overloaded. Please try again shortly."}}"#,
            },
        ],
    },
    ProviderProfile {
        name: "google",
        default_host: "https://generativelanguage.googleapis.com",
        templates: &[
            ErrorTemplate {
                mode: ErrorMode::ContextLength,
                status: 400,
                body_json: r#"{"error":{"code":400,"message":"Request payload size exceeds the limit: 20000000 bytes.","status":"INVALID_ARGUMENT"}}"#,
            },
            ErrorTemplate {
                mode: ErrorMode::RateLimit,
                status: 429,
                body_json: r#"{"error":{"code":429,"message":"Resource has been exhausted (e.g. check quota).","status":"RESOURCE_EXHAUSTED"}}"#,
            },
            ErrorTemplate {
                mode: ErrorMode::ServerError,
                status: 503,
                body_json: r#"{"error":{"code":503,"message":"Service temporarily unavailable","status":"UNAVAILABLE"}}"#,
            },
        ],
    },
    ProviderProfile {
        name: "openrouter",
        default_host: "https://openrouter.ai",
        templates: &[
            ErrorTemplate {
                mode: ErrorMode::ContextLength,
                status: 400,
                body_json: r#"{"error":{"message":"This model maximum context length is 128000 tokens, however you requested 150000 tokens","code":400}}"#,
            },
            ErrorTemplate {
                mode: ErrorMode::RateLimit,
                status: 429,
                body_json: r#"{"error":{"message":"Rate limit exceeded","code":429}}"#,
            },
            ErrorTemplate {
                mode: ErrorMode::ServerError,
                status: 500,
                body_json: r#"{"error":{"message":"Internal server error","code":500}}"#,
            },
        ],
    },
    ProviderProfile {
        name: "tetrate",
        default_host: "https://api.tetrate.io",
        templates: &[
            ErrorTemplate {
                mode: ErrorMode::ContextLength,
                status: 400,
                body_json: r#"{"error":{"message":"Request exceeds maximum context length","code":"context_length_exceeded"}}"#,
            },
            ErrorTemplate {
                mode: ErrorMode::RateLimit,
                status: 429,
                body_json: r#"{"error":{"message":"Rate limit exceeded","code":"rate_limit_exceeded"}}"#,
            },
            ErrorTemplate {
                mode: ErrorMode::ServerError,
                status: 503,
                body_json: r#"{"error":{"message":"Service unavailable","code":"service_unavailable"}}"#,
            },
        ],
    },
    ProviderProfile {
        name: "databricks",
        default_host: "https://api.databricks.com",
        templates: &[
            ErrorTemplate {
                mode: ErrorMode::ContextLength,
                status: 400,
                body_json: r#"{"error_code":"INVALID_PARAMETER_VALUE","message":"The total number of tokens in the request exceeds the maximum allowed"}"#,
            },
            ErrorTemplate {
                mode: ErrorMode::RateLimit,
                status: 429,
                body_json: r#"{"error_code":"RATE_LIMIT_EXCEEDED","message":"Rate limit exceeded"}"#,
            },
            ErrorTemplate {
                mode: ErrorMode::ServerError,
                status: 500,
                body_json: r#"{"error_code":"INTERNAL_ERROR","message":"Internal server error"}"#,
            },
        ],
    },
];

/// Template to emit for `mode` on `provider`.
///
/// A mode the profile has no entry for (only `NoError`) falls back to the
/// openai server error.
pub fn error_template(provider: Provider, mode: ErrorMode) -> &'static ErrorTemplate {
    provider
        .profile()
        .template(mode)
        .unwrap_or(&PROFILES[0].templates[2])
}
