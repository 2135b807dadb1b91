//! Domain types shared across the crate.

use std::borrow::Borrow;

/// A market package identifier (e.g. `com.example.app`).
///
/// Names are kept exactly as given: the market treats package names as
/// case-exact identifiers, so no normalization is applied.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
pub struct PackageName(String);

impl PackageName {
    /// Create a new package name.
    pub fn new(name: &str) -> Self {
        Self(name.to_string())
    }

    /// Get the package name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PackageName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::ops::Deref for PackageName {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<str> for PackageName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for PackageName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for PackageName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PackageName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl PartialEq<str> for PackageName {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for PackageName {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// Metadata for a package as the remote store currently offers it.
///
/// Produced fresh on every details call; never cached beyond the call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteApk {
    pub name: PackageName,
    /// Monotonically increasing release identifier; the sole staleness signal.
    pub code: i32,
    pub version: String,
    /// Commerce classification of the acquisition (e.g. free vs. paid).
    pub offer: i32,
    pub size: u64,
}

/// A locally recorded package state, as persisted in the catalog store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApkRecord {
    pub name: PackageName,
    pub code: i32,
    pub version: String,
    pub offer: i32,
    pub size: u64,
    /// Unix seconds of the last upsert.
    pub updated: i64,
}

/// Everything needed to purchase one package artifact and name the output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTicket {
    pub name: PackageName,
    pub code: i32,
    pub version: String,
    pub offer: i32,
    pub size: u64,
}

impl DownloadTicket {
    /// Artifact file name: `{package}.{version}.apk`.
    pub fn artifact_name(&self) -> String {
        format!("{}.{}.apk", self.name, self.version)
    }
}

impl From<RemoteApk> for DownloadTicket {
    fn from(apk: RemoteApk) -> Self {
        Self {
            name: apk.name,
            code: apk.code,
            version: apk.version,
            offer: apk.offer,
            size: apk.size,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn package_name_is_case_exact() {
        let name = PackageName::new("com.Example.App");
        assert_eq!(name.as_str(), "com.Example.App");
        assert_ne!(name, PackageName::new("com.example.app"));
    }

    #[test]
    fn artifact_name_combines_name_and_version() {
        let ticket = DownloadTicket {
            name: PackageName::new("com.example.app"),
            code: 42,
            version: "1.2.3".to_string(),
            offer: 1,
            size: 1024,
        };
        assert_eq!(ticket.artifact_name(), "com.example.app.1.2.3.apk");
    }
}
