use url::Url;

use crate::error::Error;

const DEFAULT_API_URL: &str = "http://localhost:3001";
const DEFAULT_LOGIN_ROUTE: &str = "/login";

/// Console client configuration.
///
/// The API base URL is a constructor parameter; everything else has a default.
///
/// ```rust,ignore
/// use rialma_console::ClientConfig;
///
/// let config = ClientConfig::new("https://api.rialma.example".parse()?)
///     .with_login_route("/entrar");
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct ClientConfig {
    pub(crate) api_base_url: Url,
    pub(crate) login_route: String,
}

impl ClientConfig {
    #[must_use]
    pub fn new(api_base_url: Url) -> Self {
        Self {
            api_base_url,
            login_route: DEFAULT_LOGIN_ROUTE.into(),
        }
    }

    /// Create config from environment variables.
    ///
    /// # Optional env vars
    /// - `RIALMA_API_URL`: backend base URL (default `http://localhost:3001`)
    /// - `RIALMA_LOGIN_ROUTE`: route announced on logout (default `/login`)
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if `RIALMA_API_URL` is not a valid URL.
    pub fn from_env() -> Result<Self, Error> {
        let api_url =
            std::env::var("RIALMA_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_owned());
        let api_base_url: Url = api_url
            .parse()
            .map_err(|e| Error::Config(format!("RIALMA_API_URL: {e}")))?;

        let mut config = Self::new(api_base_url);
        if let Ok(route) = std::env::var("RIALMA_LOGIN_ROUTE") {
            config = config.with_login_route(route);
        }
        Ok(config)
    }

    /// Override the route announced in [`SessionEvent::LoggedOut`](crate::SessionEvent).
    #[must_use]
    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    #[must_use]
    pub fn api_base_url(&self) -> &Url {
        &self.api_base_url
    }

    #[must_use]
    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    /// Absolute URL for an endpoint path such as `/users/login`.
    ///
    /// The path is appended to the base URL, so a base of
    /// `https://host/api` yields `https://host/api/users/login`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the joined string is not a valid URL.
    pub fn endpoint_url(&self, endpoint: &str) -> Result<Url, Error> {
        let base = self.api_base_url.as_str().trim_end_matches('/');
        let joined = if endpoint.starts_with('/') {
            format!("{base}{endpoint}")
        } else {
            format!("{base}/{endpoint}")
        };
        joined
            .parse()
            .map_err(|e| Error::Config(format!("endpoint {endpoint}: {e}")))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_URL.parse().expect("valid default URL"))
    }
}
