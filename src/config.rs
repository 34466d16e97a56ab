use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::reveal::{RevealConfig, DEFAULT_CHUNK, DEFAULT_TICK};

pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: String,
    /// Directory holding the wishlist slot file.
    pub data_dir: PathBuf,
    pub reveal: RevealConfig,
}

impl Config {
    pub fn from_env() -> Self {
        let backend_url =
            env::var("BACKEND_URL").unwrap_or_else(|_| DEFAULT_BACKEND_URL.to_string());

        let data_dir = env::var("ETALASE_DATA_DIR").map(PathBuf::from).unwrap_or_else(|_| {
            let home = env::var("HOME").unwrap_or_else(|_| ".".into());
            Path::new(&home).join(".etalase")
        });

        let reveal = RevealConfig {
            chunk: parse_chunk(env::var("REVEAL_CHUNK").ok()),
            tick: parse_tick(env::var("REVEAL_TICK_MS").ok()),
        };

        Self {
            backend_url,
            data_dir,
            reveal,
        }
    }
}

fn parse_chunk(raw: Option<String>) -> usize {
    raw.and_then(|v| v.parse::<usize>().ok())
        .filter(|&c| c >= 1)
        .unwrap_or(DEFAULT_CHUNK)
}

fn parse_tick(raw: Option<String>) -> Duration {
    raw.and_then(|v| v.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(DEFAULT_TICK)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_falls_back_on_garbage_and_zero() {
        assert_eq!(parse_chunk(None), DEFAULT_CHUNK);
        assert_eq!(parse_chunk(Some("abc".into())), DEFAULT_CHUNK);
        assert_eq!(parse_chunk(Some("0".into())), DEFAULT_CHUNK);
        assert_eq!(parse_chunk(Some("5".into())), 5);
    }

    #[test]
    fn tick_parses_milliseconds() {
        assert_eq!(parse_tick(None), DEFAULT_TICK);
        assert_eq!(parse_tick(Some("35".into())), Duration::from_millis(35));
        assert_eq!(parse_tick(Some("fast".into())), DEFAULT_TICK);
    }
}
