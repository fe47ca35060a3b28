#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub environment: Environment,
    /// Symmetric key for session JWTs.
    pub secret_key: String,
    pub session_minutes: i64,
    /// Dashboard frontend base URL, target of post-callback redirects.
    pub frontend_url: String,
    pub cors_origins: Vec<String>,
    /// Whether routes may serve the static mock payload when the real Ads
    /// integration fails or is forced off via `use_mock`.
    pub allow_mock_data: bool,
    pub oauth: OAuthSettings,
    pub ads: Option<AdsSettings>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub auth_uri: String,
    pub token_uri: String,
    pub userinfo_uri: String,
}

impl OAuthSettings {
    pub fn is_configured(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty()
    }
}

/// Google Ads API access. Present only when the integration is configured;
/// every field is then required — there is no silent fallback account id.
#[derive(Debug, Clone)]
pub struct AdsSettings {
    pub developer_token: String,
    pub customer_id: String,
    /// Long-lived refresh token used to mint access tokens for queries.
    pub refresh_token: String,
    pub api_base: String,
}

const DEFAULT_SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/adwords",
    "https://www.googleapis.com/auth/userinfo.profile",
    "https://www.googleapis.com/auth/userinfo.email",
    "openid",
];

const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_USERINFO_URI: &str = "https://www.googleapis.com/oauth2/v1/userinfo";
const GOOGLE_ADS_API_BASE: &str = "https://googleads.googleapis.com/v17";

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let environment = match std::env::var("ADLYTICS_ENV")
            .unwrap_or_else(|_| "development".to_string())
            .as_str()
        {
            "production" => Environment::Production,
            _ => Environment::Development,
        };

        let secret_key = match std::env::var("ADLYTICS_SECRET_KEY") {
            Ok(key) => key,
            Err(_) if environment.is_production() => {
                return Err("ADLYTICS_SECRET_KEY required in production".to_string())
            }
            Err(_) => "adlytics-dev-secret".to_string(),
        };

        let ads = match std::env::var("ADLYTICS_ADS_DEVELOPER_TOKEN") {
            Ok(developer_token) => Some(AdsSettings {
                developer_token,
                customer_id: std::env::var("ADLYTICS_ADS_CUSTOMER_ID").map_err(|_| {
                    "ADLYTICS_ADS_CUSTOMER_ID required when the Ads integration is configured"
                        .to_string()
                })?,
                refresh_token: std::env::var("ADLYTICS_ADS_REFRESH_TOKEN").map_err(|_| {
                    "ADLYTICS_ADS_REFRESH_TOKEN required when the Ads integration is configured"
                        .to_string()
                })?,
                api_base: std::env::var("ADLYTICS_ADS_API_BASE")
                    .unwrap_or_else(|_| GOOGLE_ADS_API_BASE.to_string()),
            }),
            Err(_) => None,
        };

        Ok(Self {
            port: std::env::var("ADLYTICS_PORT")
                .unwrap_or_else(|_| "5002".to_string())
                .parse()
                .map_err(|e| format!("invalid port: {e}"))?,
            secret_key,
            session_minutes: std::env::var("ADLYTICS_SESSION_MINUTES")
                .unwrap_or_else(|_| "1440".to_string())
                .parse()
                .unwrap_or(1440),
            frontend_url: std::env::var("ADLYTICS_FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            cors_origins: std::env::var("ADLYTICS_CORS_ORIGINS")
                .map(|v| v.split(',').map(str::to_string).collect())
                .unwrap_or_default(),
            allow_mock_data: std::env::var("ADLYTICS_ALLOW_MOCK_DATA")
                .map(|v| v == "true")
                .unwrap_or(!environment.is_production()),
            oauth: OAuthSettings {
                client_id: std::env::var("ADLYTICS_GOOGLE_CLIENT_ID").unwrap_or_default(),
                client_secret: std::env::var("ADLYTICS_GOOGLE_CLIENT_SECRET").unwrap_or_default(),
                redirect_uri: std::env::var("ADLYTICS_REDIRECT_URI")
                    .unwrap_or_else(|_| "http://localhost:5002/api/auth/callback".to_string()),
                scopes: std::env::var("ADLYTICS_OAUTH_SCOPES")
                    .map(|v| v.split_whitespace().map(str::to_string).collect())
                    .unwrap_or_else(|_| DEFAULT_SCOPES.iter().map(|s| s.to_string()).collect()),
                auth_uri: GOOGLE_AUTH_URI.to_string(),
                token_uri: GOOGLE_TOKEN_URI.to_string(),
                userinfo_uri: GOOGLE_USERINFO_URI.to_string(),
            },
            environment,
            ads,
        })
    }
}
