const DEFAULT_MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

pub const IMAGEKIT_UPLOAD_URL: &str = "https://upload.imagekit.io/api/v1";
pub const IMAGEKIT_API_URL: &str = "https://api.imagekit.io/v1";
pub const RESEND_API_URL: &str = "https://api.resend.com";

/// Variables the site needs for every feature to work. Reported by `/api/health`.
pub const REQUIRED_ENV: &[&str] = &[
    "IMAGEKIT_PUBLIC_KEY",
    "IMAGEKIT_PRIVATE_KEY",
    "IMAGEKIT_URL_ENDPOINT",
    "RESEND_API_KEY",
    "CONTACT_EMAIL",
];

#[derive(Debug, Clone)]
pub struct ImageKitConfig {
    pub public_key: String,
    pub private_key: String,
    pub url_endpoint: String,
    pub upload_url: String,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct ResendConfig {
    pub api_key: String,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub listen_addr: String,
    /// Comma-separated allowed CORS origins. If empty or "*", allows all origins.
    pub cors_origins: String,
    pub max_upload_bytes: usize,
    /// `None` unless all three ImageKit credentials are present.
    pub imagekit: Option<ImageKitConfig>,
    pub resend: Option<ResendConfig>,
    /// Recipient of contact form submissions.
    pub contact_email: Option<String>,
    pub contact_from: String,
    /// Names from [`REQUIRED_ENV`] that were unset or blank at startup.
    pub missing_env: Vec<&'static str>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let imagekit = match (
            get("IMAGEKIT_PUBLIC_KEY"),
            get("IMAGEKIT_PRIVATE_KEY"),
            get("IMAGEKIT_URL_ENDPOINT"),
        ) {
            (Some(public_key), Some(private_key), Some(url_endpoint)) => Some(ImageKitConfig {
                public_key,
                private_key,
                url_endpoint,
                upload_url: get("IMAGEKIT_UPLOAD_URL")
                    .unwrap_or_else(|| IMAGEKIT_UPLOAD_URL.to_string()),
                api_url: get("IMAGEKIT_API_URL").unwrap_or_else(|| IMAGEKIT_API_URL.to_string()),
            }),
            _ => None,
        };

        let resend = get("RESEND_API_KEY").map(|api_key| ResendConfig {
            api_key,
            api_url: get("RESEND_API_URL").unwrap_or_else(|| RESEND_API_URL.to_string()),
        });

        let missing_env = REQUIRED_ENV
            .iter()
            .copied()
            .filter(|key| get(key).is_none())
            .collect();

        Self {
            database_url: get("DATABASE_URL").unwrap_or_else(|| "sqlite://redux.db".to_string()),
            listen_addr: get("LISTEN_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            cors_origins: get("CORS_ORIGINS").unwrap_or_else(|| "*".to_string()),
            max_upload_bytes: get("MAX_UPLOAD_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
            imagekit,
            resend,
            contact_email: get("CONTACT_EMAIL"),
            contact_from: get("CONTACT_FROM_EMAIL")
                .unwrap_or_else(|| "REDUX <onboarding@resend.dev>".to_string()),
            missing_env,
        }
    }
}
