//! Endpoint configuration for the progression-scoped backend.

use soundwalk_core::Position;

use crate::error::CatalogError;

/// Location of the backend and the progression being walked.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    /// Scheme and authority, optionally with a path prefix.
    /// A trailing slash is tolerated.
    pub base_url: String,
    /// Progression (walk) whose spots are served.
    pub progression_id: u64,
}

impl ApiConfig {
    /// Create a configuration for `progression_id` on `base_url`.
    pub fn new(base_url: impl Into<String>, progression_id: u64) -> Self {
        Self {
            base_url: base_url.into(),
            progression_id,
        }
    }

    /// Check that the base URL is usable.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let base = self.base();
        if base.is_empty() {
            return Err(CatalogError::InvalidConfig {
                reason: "base_url is empty".to_string(),
            });
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(CatalogError::InvalidConfig {
                reason: format!("base_url must be http(s), got '{base}'"),
            });
        }
        Ok(())
    }

    /// URL of the spot catalog.
    pub fn spots_url(&self) -> String {
        format!("{}/progressions/{}/spots", self.base(), self.progression_id)
    }

    /// URL of the surroundings query for `position`.
    pub fn surroundings_url(&self, position: Position) -> String {
        format!(
            "{}/progressions/{}/surroundings?latitude={}&longitude={}",
            self.base(),
            self.progression_id,
            position.latitude,
            position.longitude,
        )
    }

    /// Resolve an asset path relative to the backend.
    ///
    /// Absolute `http(s)` URLs pass through unchanged.
    pub fn asset_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        if path.starts_with('/') {
            format!("{}{path}", self.base())
        } else {
            format!("{}/{path}", self.base())
        }
    }

    fn base(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn urls_are_progression_scoped() {
        let api = ApiConfig::new("https://walk.example.org/", 14);
        assert_eq!(
            api.spots_url(),
            "https://walk.example.org/progressions/14/spots"
        );
        assert_eq!(
            api.surroundings_url(Position::new(52.5, 13.25)),
            "https://walk.example.org/progressions/14/surroundings?latitude=52.5&longitude=13.25"
        );
    }

    #[test]
    fn asset_paths_resolve_against_base() {
        let api = ApiConfig::new("https://walk.example.org:5000", 1);
        assert_eq!(
            api.asset_url("/uploads/a.mp3"),
            "https://walk.example.org:5000/uploads/a.mp3"
        );
        assert_eq!(
            api.asset_url("uploads/a.mp3"),
            "https://walk.example.org:5000/uploads/a.mp3"
        );
        assert_eq!(
            api.asset_url("https://cdn.example.org/a.mp3"),
            "https://cdn.example.org/a.mp3"
        );
    }

    #[test]
    fn validate_rejects_bad_base() {
        assert!(ApiConfig::new("https://x", 1).validate().is_ok());
        assert!(matches!(
            ApiConfig::new("", 1).validate(),
            Err(CatalogError::InvalidConfig { .. })
        ));
        assert!(matches!(
            ApiConfig::new("ftp://x", 1).validate(),
            Err(CatalogError::InvalidConfig { .. })
        ));
    }

    proptest! {
        #[test]
        fn asset_url_joins_with_single_slash(
            host in "[a-z]{1,12}",
            trailing in 0usize..3,
            path in "/?[a-z0-9_]{1,10}(/[a-z0-9_]{1,10}){0,3}\\.mp3",
        ) {
            let base = format!("https://{host}.org{}", "/".repeat(trailing));
            let url = ApiConfig::new(base, 1).asset_url(&path);
            let rest = url.strip_prefix("https://").unwrap();
            prop_assert!(!rest.contains("//"));
            prop_assert!(url.ends_with(path.trim_start_matches('/')));
        }

        #[test]
        fn endpoints_share_progression_prefix(id in any::<u64>(), lat in -90.0f64..90.0, lon in -180.0f64..180.0) {
            let api = ApiConfig::new("https://walk.example.org", id);
            let prefix = format!("https://walk.example.org/progressions/{id}/");
            prop_assert!(api.spots_url().starts_with(&prefix));
            prop_assert!(api.surroundings_url(Position::new(lat, lon)).starts_with(&prefix));
        }
    }
}
