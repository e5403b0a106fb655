/*!
 * Source locators: local paths versus paths inside the remote store
 */

use std::fmt;
use std::path::PathBuf;

use super::executor::IRODS_PREFIX;

/// WebDAV-over-TLS URLs name collections in the remote store
pub const DAVS_PREFIX: &str = "davs://";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Locator {
    /// Folder on the local filesystem
    Local(PathBuf),
    /// Collection path inside the remote store (without prefix)
    Remote(String),
}

impl Locator {
    /// Classify a command-line source.
    ///
    /// `i:/zone/path` and `davs://host/zone/path` are remote; anything else
    /// is a local path. For `davs://` URLs the host part is dropped and the
    /// URL path is taken as the collection path.
    pub fn parse(source: &str) -> Self {
        if let Some(path) = source.strip_prefix(IRODS_PREFIX) {
            return Locator::Remote(path.to_string());
        }
        if let Some(rest) = source.strip_prefix(DAVS_PREFIX) {
            let path = match rest.find('/') {
                Some(idx) => rest[idx..].to_string(),
                None => "/".to_string(),
            };
            return Locator::Remote(path);
        }
        Locator::Local(PathBuf::from(source))
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, Locator::Remote(_))
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Local(path) => write!(f, "{}", path.display()),
            Locator::Remote(path) => write!(f, "{}{}", IRODS_PREFIX, path),
        }
    }
}
