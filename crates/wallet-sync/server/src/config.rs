use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

/// Additional server options.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "clap", derive(clap::Parser), command(next_help_heading = "Server options"))]
pub struct ServerConfig {
    /// The cors `allow_origin` header
    #[cfg_attr(feature = "clap", arg(long, default_value = "*", env = "WALLET_SYNC_ALLOW_ORIGIN"))]
    pub allow_origin: String,

    /// Disable CORS.
    #[cfg_attr(feature = "clap", arg(long, conflicts_with = "allow_origin"))]
    pub no_cors: bool,
}

// === impl ServerConfig ===

impl ServerConfig {
    /// Sets the "allow origin" header for CORS.
    pub fn with_allow_origin(mut self, allow_origin: impl Into<String>) -> Self {
        self.allow_origin = allow_origin.into();
        self
    }

    /// Whether to enable CORS.
    pub fn set_cors(mut self, cors: bool) -> Self {
        self.no_cors = !cors;
        self
    }

    /// Builds the CORS layer, `None` if CORS is disabled.
    pub fn cors_layer(&self) -> Result<Option<CorsLayer>, header::InvalidHeaderValue> {
        if self.no_cors {
            return Ok(None)
        }
        let origin = if self.allow_origin.trim() == "*" {
            AllowOrigin::any()
        } else {
            AllowOrigin::exact(self.allow_origin.parse::<HeaderValue>()?)
        };
        Ok(Some(
            CorsLayer::new()
                .allow_methods([Method::GET, Method::POST])
                .allow_headers(Any)
                .allow_origin(origin),
        ))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { allow_origin: "*".to_string(), no_cors: false }
    }
}
