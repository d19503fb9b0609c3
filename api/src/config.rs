use clap::Parser;
use std::net::SocketAddr;

#[derive(Clone, Debug, Parser)]
pub struct MurmurApiConfig {
    #[clap(
        short,
        long,
        env = "MURMUR_API_BIND_ADDR",
        default_value = "0.0.0.0:4000"
    )]
    pub bind_addr: SocketAddr,

    #[clap(
        long,
        env = "MURMUR_API_PUBLIC_URL",
        default_value = "http://localhost:4000"
    )]
    pub public_url: String,

    #[clap(long, default_value_t = false)]
    pub dump_openapi: bool,

    /// Where users, posts and follow edges live. `memory://` keeps everything
    /// in process memory, which is only useful for local development.
    #[clap(
        long,
        env = "MURMUR_API_DATABASE_URL",
        default_value = "postgres://localhost:5432/murmur"
    )]
    pub database_url: String,

    /// Secret for signing session cookies, as 64 hex characters (32 bytes).
    ///
    /// Generate one using:
    /// ```bash
    /// openssl rand -hex 32
    /// ```
    ///
    /// When unset a random secret is generated at startup, so sessions do not
    /// survive a restart.
    #[clap(long, env = "MURMUR_API_SESSION_SECRET")]
    pub session_secret: Option<String>,

    /// How many posts a timeline or profile page holds.
    #[clap(
        long,
        env = "MURMUR_API_POSTS_PER_PAGE",
        default_value_t = 3,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub posts_per_page: u64,
}

impl MurmurApiConfig {
    /// Decode the configured session secret.
    ///
    /// Returns `Ok(None)` when no secret is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret is not valid hex or not exactly 32
    /// bytes long.
    pub fn session_secret_bytes(&self) -> anyhow::Result<Option<[u8; 32]>> {
        let Some(ref secret) = self.session_secret else {
            return Ok(None);
        };

        let bytes = hex::decode(secret.trim())
            .map_err(|e| anyhow::anyhow!("session secret is not valid hex: {}", e))?;

        let secret: [u8; 32] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            anyhow::anyhow!("session secret must be 32 bytes, got {}", bytes.len())
        })?;

        Ok(Some(secret))
    }

    /// Whether session cookies should carry the `Secure` flag.
    pub fn secure_cookies(&self) -> bool {
        self.public_url.starts_with("https://")
    }
}
