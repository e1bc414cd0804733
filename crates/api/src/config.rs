use radio_core::session::DEFAULT_COOKIE_NAME;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. In production,
/// override via environment variables (a `.env` file is honoured).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,

    /// Base URL of the BaaS.
    pub baas_url: String,
    pub baas_timeout_secs: u64,
    /// Stable id of the shared room. When unset the newest room is used.
    pub room_id: Option<String>,
    /// Reject sessions of users whose email is not verified.
    pub require_verified: bool,

    /// Name of the session cookie.
    pub session_cookie_name: String,
    /// Force the `Secure` cookie flag even for plain-HTTP base URLs.
    pub cookie_secure: bool,
    /// Public URL of this server; the generation webhook is derived from it.
    pub public_base_url: String,

    /// Generation API key. Generation is unavailable without it.
    pub suno_api_key: Option<String>,
    pub suno_base_url: String,
    pub suno_timeout_secs: u64,

    /// AI gateway key. Prompt enhancement is unavailable without it.
    pub gateway_api_key: Option<String>,
    pub gateway_base_url: String,
    pub gateway_model: String,
    pub gateway_timeout_secs: u64,

    /// Target of `/api/proxy/*`. The proxy is disabled when unset.
    pub proxy_base_url: Option<String>,
    /// Tag the home page uses to pick radio candidates.
    pub home_track_filter: Option<String>,
    /// Tag used to pick the follow-up track after a manual play.
    pub room_play_tag: String,
    /// Download generated media and attach it to track records.
    pub store_media: bool,
    /// Advance the room on a timer when set.
    pub room_advance_interval_secs: Option<u64>,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                         |
    /// |-----------------------------|---------------------------------|
    /// | `HOST`                      | `0.0.0.0`                       |
    /// | `PORT`                      | `3000`                          |
    /// | `CORS_ORIGINS`              | `http://localhost:5173`         |
    /// | `REQUEST_TIMEOUT_SECS`      | `30`                            |
    /// | `POCKETBASE_URL`            | `http://127.0.0.1:8090`         |
    /// | `BAAS_TIMEOUT_SECS`         | `10`                            |
    /// | `ROOM_ID`                   | unset (newest room)             |
    /// | `REQUIRE_VERIFIED`          | `true`                          |
    /// | `SESSION_COOKIE_NAME`       | `token`                         |
    /// | `COOKIE_SECURE`             | `false`                         |
    /// | `PUBLIC_BASE_URL`           | `http://localhost:3000`         |
    /// | `SUNO_API_KEY` / `API_KEY`  | unset                           |
    /// | `SUNO_BASE_URL`             | `https://api.sunoapi.org`       |
    /// | `SUNO_TIMEOUT_SECS`         | `30`                            |
    /// | `AI_GATEWAY_API_KEY`        | unset                           |
    /// | `AI_GATEWAY_BASE_URL`       | `https://ai-gateway.vercel.sh/v1` |
    /// | `AI_GATEWAY_MODEL`          | `openai/gpt-5.1-thinking`       |
    /// | `GATEWAY_TIMEOUT_SECS`      | `60`                            |
    /// | `PROXY_BASE_URL`            | unset (proxy disabled)          |
    /// | `HOME_TRACK_FILTER`         | unset (whole catalog)           |
    /// | `ROOM_PLAY_TAG`             | `lofi`                          |
    /// | `STORE_MEDIA`               | `false`                         |
    /// | `ROOM_ADVANCE_INTERVAL_SECS`| unset (no ticker)               |
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    ///
    /// Panics on malformed numeric or boolean values so misconfiguration
    /// fails at startup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let get_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());
        let number = |key: &str, default: u64| -> u64 {
            get(key).map_or(default, |v| {
                v.parse()
                    .unwrap_or_else(|_| panic!("{key} must be a valid u64"))
            })
        };
        let flag = |key: &str, default: bool| -> bool {
            get(key).map_or(default, |v| match v.to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => true,
                "0" | "false" | "no" | "off" => false,
                _ => panic!("{key} must be a boolean"),
            })
        };

        let port: u16 = get_or("PORT", "3000")
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = get_or("CORS_ORIGINS", "http://localhost:5173")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            host: get_or("HOST", "0.0.0.0"),
            port,
            cors_origins,
            request_timeout_secs: number("REQUEST_TIMEOUT_SECS", 30),
            baas_url: get_or("POCKETBASE_URL", "http://127.0.0.1:8090"),
            baas_timeout_secs: number("BAAS_TIMEOUT_SECS", 10),
            room_id: get("ROOM_ID"),
            require_verified: flag("REQUIRE_VERIFIED", true),
            session_cookie_name: get_or("SESSION_COOKIE_NAME", DEFAULT_COOKIE_NAME),
            cookie_secure: flag("COOKIE_SECURE", false),
            public_base_url: get_or("PUBLIC_BASE_URL", "http://localhost:3000")
                .trim_end_matches('/')
                .to_string(),
            suno_api_key: get("SUNO_API_KEY").or_else(|| get("API_KEY")),
            suno_base_url: get_or("SUNO_BASE_URL", radio_suno::api::DEFAULT_BASE_URL),
            suno_timeout_secs: number("SUNO_TIMEOUT_SECS", 30),
            gateway_api_key: get("AI_GATEWAY_API_KEY"),
            gateway_base_url: get_or("AI_GATEWAY_BASE_URL", radio_suno::gateway::DEFAULT_BASE_URL),
            gateway_model: get_or("AI_GATEWAY_MODEL", radio_suno::gateway::DEFAULT_MODEL),
            gateway_timeout_secs: number("GATEWAY_TIMEOUT_SECS", 60),
            proxy_base_url: get("PROXY_BASE_URL").map(|u| u.trim_end_matches('/').to_string()),
            home_track_filter: get("HOME_TRACK_FILTER"),
            room_play_tag: get_or("ROOM_PLAY_TAG", "lofi"),
            store_media: flag("STORE_MEDIA", false),
            room_advance_interval_secs: get("ROOM_ADVANCE_INTERVAL_SECS").map(|v| {
                v.parse()
                    .expect("ROOM_ADVANCE_INTERVAL_SECS must be a valid u64")
            }),
        }
    }

    /// Webhook URL handed to the generation API.
    pub fn callback_url(&self) -> String {
        format!("{}/api/music/callback", self.public_base_url)
    }

    /// Whether session cookies carry the `Secure` flag.
    pub fn secure_cookies(&self) -> bool {
        self.cookie_secure || self.public_base_url.starts_with("https://")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> ServerConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]);
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.session_cookie_name, "token");
        assert!(cfg.require_verified);
        assert!(!cfg.store_media);
        assert_eq!(cfg.baas_timeout_secs, 10);
        assert_eq!(cfg.room_play_tag, "lofi");
        assert!(cfg.room_id.is_none());
        assert!(cfg.suno_api_key.is_none());
        assert_eq!(cfg.callback_url(), "http://localhost:3000/api/music/callback");
        assert!(!cfg.secure_cookies());
    }

    #[test]
    fn https_base_url_forces_secure_cookies() {
        let cfg = config(&[("PUBLIC_BASE_URL", "https://radio.example.com/")]);
        assert!(cfg.secure_cookies());
        assert_eq!(cfg.callback_url(), "https://radio.example.com/api/music/callback");
    }

    #[test]
    fn legacy_api_key_name_is_accepted() {
        let cfg = config(&[("API_KEY", "k1"), ("ROOM_ADVANCE_INTERVAL_SECS", "180")]);
        assert_eq!(cfg.suno_api_key.as_deref(), Some("k1"));
        assert_eq!(cfg.room_advance_interval_secs, Some(180));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let cfg = config(&[("ROOM_ID", "  "), ("REQUIRE_VERIFIED", "false")]);
        assert!(cfg.room_id.is_none());
        assert!(!cfg.require_verified);
    }

    #[test]
    #[should_panic(expected = "STORE_MEDIA must be a boolean")]
    fn malformed_flag_panics() {
        config(&[("STORE_MEDIA", "sometimes")]);
    }
}
