pub mod domain;
pub mod llm;
pub mod session;
pub mod storage;

pub mod config {
    use anyhow::Context;

    const DEFAULT_SESSION_FILE: &str = ".risk_assessment_session_id";

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub database_url: Option<String>,
        pub ai_gateway_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
        pub session_file: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Ok(Self {
                database_url: std::env::var("DATABASE_URL").ok(),
                ai_gateway_api_key: std::env::var("AI_GATEWAY_API_KEY").ok(),
                sentry_dsn: std::env::var("SENTRY_DSN").ok(),
                session_file: std::env::var("SESSION_FILE").ok(),
            })
        }

        pub fn require_database_url(&self) -> anyhow::Result<&str> {
            self.database_url
                .as_deref()
                .context("DATABASE_URL is required")
        }

        pub fn require_ai_gateway_api_key(&self) -> anyhow::Result<&str> {
            self.ai_gateway_api_key
                .as_deref()
                .filter(|k| !k.trim().is_empty())
                .context("AI_GATEWAY_API_KEY is required")
        }

        pub fn session_file(&self) -> std::path::PathBuf {
            self.session_file
                .as_deref()
                .unwrap_or(DEFAULT_SESSION_FILE)
                .into()
        }
    }
}
