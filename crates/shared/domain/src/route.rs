use crate::constants::{FEATURE_ROUTE_PREFIX, HOME_ROUTE};
use crate::features::FeatureId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A navigation destination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "screen", content = "feature")]
pub enum Route {
    /// The landing screen; navigating here clears the back stack.
    Home,
    /// The screen hosting a single feature.
    Feature(FeatureId),
}

impl Route {
    /// The feature shown on this route, if any.
    #[must_use]
    pub const fn feature(&self) -> Option<&FeatureId> {
        match self {
            Self::Home => None,
            Self::Feature(id) => Some(id),
        }
    }

    #[must_use]
    pub const fn is_home(&self) -> bool {
        matches!(self, Self::Home)
    }

    /// Parses a route id produced by [`Route`]'s `Display`.
    #[must_use]
    pub fn parse(route_id: &str) -> Option<Self> {
        if route_id == HOME_ROUTE {
            return Some(Self::Home);
        }
        let feature = route_id.strip_prefix(FEATURE_ROUTE_PREFIX)?.strip_prefix('/')?;
        if feature.trim().is_empty() {
            return None;
        }
        Some(Self::Feature(FeatureId::new(feature)))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => f.write_str(HOME_ROUTE),
            Self::Feature(id) => write!(f, "{FEATURE_ROUTE_PREFIX}/{id}"),
        }
    }
}

impl From<FeatureId> for Route {
    fn from(feature: FeatureId) -> Self {
        Self::Feature(feature)
    }
}
