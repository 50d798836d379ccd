//! Wire types for the upstream control API and the local API

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Protection status as reported by `/control/status`
///
/// Serialized under the appliance's own key names. Fields beyond the three
/// the dashboard relies on are kept in `extra` and passed through unchanged.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ProtectionState {
    pub protection_enabled: bool,
    pub running: bool,
    #[serde(default)]
    pub version: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One blocklist subscription
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FilterDescriptor {
    pub id: i64,
    pub url: String,
    pub name: String,
    #[serde(rename = "rulesCount", alias = "rules_count", default)]
    pub rules_count: u64,
    /// Missing for lists that were never fetched
    #[serde(rename = "lastUpdated", alias = "last_updated", default)]
    pub last_updated: String,
    pub enabled: bool,
}

/// Response of `/control/filtering/status`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FilteringStatus {
    #[serde(default)]
    pub filters: Option<Vec<FilterDescriptor>>,
    #[serde(default)]
    pub user_rules: Option<Vec<String>>,
}

/// Local response of the filters operation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterListing {
    pub filters: Vec<FilterDescriptor>,
    #[serde(rename = "userRules")]
    pub user_rules: Vec<String>,
}

impl From<FilteringStatus> for FilterListing {
    fn from(status: FilteringStatus) -> Self {
        let user_rules = status
            .user_rules
            .unwrap_or_default()
            .into_iter()
            .filter(|rule| !rule.trim().is_empty())
            .collect();

        Self {
            filters: status.filters.unwrap_or_default(),
            user_rules,
        }
    }
}

/// Body of the toggle operation, locally and upstream
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct ProtectionToggle {
    pub enable: bool,
}

/// Body of the update-filter operation
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct FilterUpdate {
    pub url: String,
    pub name: String,
    pub enabled: bool,
}

/// Upstream body for `/control/filtering/set_url`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SetFilterUrl<'a> {
    /// Identifies which subscription to change
    pub url: &'a str,
    pub whitelist: bool,
    pub data: &'a FilterUpdate,
}

impl<'a> SetFilterUrl<'a> {
    /// Blocklist update keeping url and name, changing only `enabled`
    pub fn blocklist(update: &'a FilterUpdate) -> Self {
        Self {
            url: &update.url,
            whitelist: false,
            data: update,
        }
    }
}

/// `{ "message": ... }` success body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_protection_state_passthrough() {
        let upstream = json!({
            "protection_enabled": true,
            "running": true,
            "version": "v0.107.43",
            "language": "en"
        });
        let state: ProtectionState = serde_json::from_value(upstream).unwrap();
        assert!(state.protection_enabled);

        let local = serde_json::to_value(&state).unwrap();
        assert_eq!(
            local,
            json!({
                "protection_enabled": true,
                "running": true,
                "version": "v0.107.43",
                "language": "en"
            })
        );
    }

    #[test]
    fn test_filter_listing_drops_blank_rules() {
        let upstream = json!({
            "filters": [{
                "id": 1,
                "url": "https://example.org/list.txt",
                "name": "Example",
                "rules_count": 42,
                "last_updated": "2024-03-01T10:00:00Z",
                "enabled": true
            }],
            "whitelist_filters": null,
            "user_rules": ["||ads.example^", "", "   ", "@@||ok.example^"]
        });
        let status: FilteringStatus = serde_json::from_value(upstream).unwrap();
        let listing = FilterListing::from(status);

        assert_eq!(listing.filters.len(), 1);
        assert_eq!(listing.filters[0].rules_count, 42);
        assert_eq!(listing.user_rules, vec!["||ads.example^", "@@||ok.example^"]);

        let local = serde_json::to_value(&listing).unwrap();
        assert_eq!(local["filters"][0]["rulesCount"], json!(42));
        assert_eq!(local["filters"][0]["lastUpdated"], json!("2024-03-01T10:00:00Z"));
        assert_eq!(local["userRules"][1], json!("@@||ok.example^"));
    }

    #[test]
    fn test_filtering_status_nulls() {
        let status: FilteringStatus =
            serde_json::from_value(json!({ "filters": null, "user_rules": null })).unwrap();
        let listing = FilterListing::from(status);
        assert!(listing.filters.is_empty());
        assert!(listing.user_rules.is_empty());
    }

    #[test]
    fn test_toggle_rejects_non_boolean() {
        assert!(serde_json::from_value::<ProtectionToggle>(json!({ "enable": "yes" })).is_err());
        assert!(serde_json::from_value::<ProtectionToggle>(json!({})).is_err());
    }

    #[test]
    fn test_set_url_shape() {
        let update = FilterUpdate {
            url: "https://example.org/list.txt".into(),
            name: "Example".into(),
            enabled: false,
        };
        let body = serde_json::to_value(SetFilterUrl::blocklist(&update)).unwrap();
        assert_eq!(
            body,
            json!({
                "url": "https://example.org/list.txt",
                "whitelist": false,
                "data": {
                    "url": "https://example.org/list.txt",
                    "name": "Example",
                    "enabled": false
                }
            })
        );
    }
}
