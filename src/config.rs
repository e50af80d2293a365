#![cfg(feature = "web")]
use clap::Parser;
use std::net::{IpAddr, SocketAddr};

/// Server settings, read from the command line or the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "sheetplot", version, about = "Drop a spreadsheet, get a chart")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "SHEETPLOT_HOST", default_value = "127.0.0.1")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "SHEETPLOT_PORT", default_value_t = 3000)]
    pub port: u16,

    /// Largest accepted upload, in megabytes
    #[arg(long, env = "SHEETPLOT_MAX_UPLOAD_MB", default_value_t = 25)]
    pub max_upload_mb: usize,
}

impl Config {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_mb.saturating_mul(1024 * 1024)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 3000,
            max_upload_mb: 25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let config = Config::try_parse_from([
            "sheetplot",
            "--host",
            "0.0.0.0",
            "--port",
            "8080",
            "--max-upload-mb",
            "2",
        ])
        .unwrap();
        assert_eq!(config.addr().to_string(), "0.0.0.0:8080");
        assert_eq!(config.max_upload_bytes(), 2 * 1024 * 1024);
    }

    #[test]
    fn huge_upload_limit_saturates() {
        let max = usize::MAX.to_string();
        let config =
            Config::try_parse_from(["sheetplot", "--max-upload-mb", max.as_str()]).unwrap();
        assert_eq!(config.max_upload_bytes(), usize::MAX);
    }

    #[test]
    fn bad_port_is_rejected() {
        assert!(Config::try_parse_from(["sheetplot", "--port", "99999"]).is_err());
    }
}
