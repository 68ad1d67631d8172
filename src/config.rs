use serde::Deserialize;

const DEFAULT_SERVER_NUMBER: u16 = 5;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Clone, Deserialize)]
pub struct Config {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    pub server_number: u16,
    pub base_url: Option<String>, // Overrides the pod-derived host when set
    pub timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            client_id: required_var("SILVERPOP_CLIENT_ID")?,
            client_secret: required_var("SILVERPOP_CLIENT_SECRET")?,
            refresh_token: required_var("SILVERPOP_REFRESH_TOKEN")?,
            server_number: server_number(|name| std::env::var(name).ok())?,
            base_url: std::env::var("SILVERPOP_BASE_URL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .map(|url| {
                    let parsed = url::Url::parse(&url).map_err(|e| {
                        anyhow::anyhow!("SILVERPOP_BASE_URL is not a valid URL: {}", e)
                    })?;
                    if parsed.scheme() != "http" && parsed.scheme() != "https" {
                        anyhow::bail!("SILVERPOP_BASE_URL must start with http:// or https://");
                    }
                    Ok(url.trim_end_matches('/').to_string())
                })
                .transpose()?,
            timeout_secs: std::env::var("SILVERPOP_TIMEOUT_SECS")
                .unwrap_or_else(|_| DEFAULT_TIMEOUT_SECS.to_string())
                .parse()
                .map_err(|_| {
                    anyhow::anyhow!("SILVERPOP_TIMEOUT_SECS must be a number of seconds")
                })?,
        };

        // Log successful configuration load (without sensitive values)
        tracing::info!("Configuration loaded successfully");
        tracing::debug!("XML API endpoint: {}", config.api_endpoint());
        tracing::debug!("OAuth endpoint: {}", config.oauth_endpoint());

        Ok(config)
    }

    /// Scheme and host every endpoint hangs off.
    pub fn base_url(&self) -> String {
        match &self.base_url {
            Some(url) => url.clone(),
            None => format!("https://api{}.ibmmarketingcloud.com", self.server_number),
        }
    }

    pub fn api_endpoint(&self) -> String {
        format!("{}/XMLAPI", self.base_url())
    }

    pub fn oauth_endpoint(&self) -> String {
        format!("{}/oauth/token", self.base_url())
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("server_number", &self.server_number)
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Pod number from `IBM_POD`, else `SILVERPOP_SERVER_NUMBER`, else the default.
/// Blank values count as unset.
fn server_number(read: impl Fn(&str) -> Option<String>) -> anyhow::Result<u16> {
    let found = ["IBM_POD", "SILVERPOP_SERVER_NUMBER"]
        .into_iter()
        .find_map(|name| {
            read(name)
                .filter(|value| !value.trim().is_empty())
                .map(|value| (name, value))
        });

    match found {
        Some((name, value)) => value
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a pod number, got '{}'", name, value)),
        None => Ok(DEFAULT_SERVER_NUMBER),
    }
}

fn required_var(name: &str) -> anyhow::Result<String> {
    let value = std::env::var(name)
        .map_err(|_| anyhow::anyhow!("{} environment variable required", name))?;
    if value.trim().is_empty() {
        anyhow::bail!("{} cannot be empty", name);
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(base_url: Option<&str>) -> Config {
        Config {
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: "refresh".to_string(),
            server_number: 3,
            base_url: base_url.map(str::to_string),
            timeout_secs: 30,
        }
    }

    #[test]
    fn test_endpoints_follow_pod_number() {
        let config = config(None);
        assert_eq!(config.api_endpoint(), "https://api3.ibmmarketingcloud.com/XMLAPI");
        assert_eq!(
            config.oauth_endpoint(),
            "https://api3.ibmmarketingcloud.com/oauth/token"
        );
    }

    #[test]
    fn test_base_url_override() {
        let config = config(Some("http://127.0.0.1:8080"));
        assert_eq!(config.api_endpoint(), "http://127.0.0.1:8080/XMLAPI");
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| {
            pairs
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone())
        }
    }

    #[test]
    fn test_server_number_defaults_to_five() {
        assert_eq!(server_number(vars(&[])).unwrap(), 5);
    }

    #[test]
    fn test_blank_pod_falls_back_to_server_number() {
        let read = vars(&[("IBM_POD", "  "), ("SILVERPOP_SERVER_NUMBER", "3")]);
        assert_eq!(server_number(read).unwrap(), 3);

        let read = vars(&[("IBM_POD", "7"), ("SILVERPOP_SERVER_NUMBER", "3")]);
        assert_eq!(server_number(read).unwrap(), 7);
    }

    #[test]
    fn test_server_number_error_names_the_variable_read() {
        let err = server_number(vars(&[("SILVERPOP_SERVER_NUMBER", "pod-x")])).unwrap_err();
        assert!(err.to_string().starts_with("SILVERPOP_SERVER_NUMBER"), "{}", err);

        let err = server_number(vars(&[("IBM_POD", "abc")])).unwrap_err();
        assert!(err.to_string().starts_with("IBM_POD"), "{}", err);
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let rendered = format!("{:?}", config(None));
        assert!(!rendered.contains("secret\""));
        assert!(!rendered.contains("\"refresh\""));
        assert!(rendered.contains("[REDACTED]"));
    }
}
