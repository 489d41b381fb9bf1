//! robots.txt crawler blocking.

use crate::config::schema::RobotsConfig;
use crate::routing::origin::HostMatcher;

pub const ROBOTS_PATH: &str = "/robots.txt";
pub const DISALLOW_ALL: &str = "User-agent: *\nDisallow: /\n";

#[derive(Debug, Clone, Default)]
pub struct RobotsBlock {
    block_all: bool,
    hosts: Vec<HostMatcher>,
}

impl RobotsBlock {
    pub fn from_config(config: &RobotsConfig) -> Self {
        Self {
            block_all: config.block_all,
            hosts: config.block_hosts.iter().map(HostMatcher::new).collect(),
        }
    }

    /// True when `path` is robots.txt on a blocked host.
    pub fn blocks(&self, host: Option<&str>, path: &str) -> bool {
        path == ROBOTS_PATH && (self.block_all || self.hosts.iter().any(|m| m.matches(host)))
    }
}
