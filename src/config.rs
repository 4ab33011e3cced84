use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    /// Directory served read-only as the fallback for non-API paths, if it exists.
    pub static_dir: PathBuf,
    /// Upper bound on how long `stop` waits for the listener thread.
    pub stop_timeout_ms: u64,
    pub log_filter: String,
    pub window_width: f32,
    pub window_height: f32,
}

impl Config {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn stop_timeout(&self) -> Duration {
        Duration::from_millis(self.stop_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 8000,
            static_dir: PathBuf::from("static"),
            stop_timeout_ms: 1000,
            log_filter: "info,tower_http=debug".into(),
            window_width: 320.0,
            window_height: 220.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_listens_on_all_interfaces() {
        let config = Config::default();
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:8000");
        assert_eq!(config.stop_timeout(), Duration::from_secs(1));
    }
}
