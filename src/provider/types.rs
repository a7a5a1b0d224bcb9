//! Provider wire types and configuration.
//!
//! The provider wraps every payload in `{retcode, message, data}` and sends
//! numeric fields as strings.

use serde::{Deserialize, Serialize};

/// Response envelope shared by all provider endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse<T> {
    pub retcode: i32,
    #[serde(default)]
    pub message: String,
    pub data: Option<T>,
}

/// Payload of the gacha log endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GachaLogData {
    #[serde(default)]
    pub list: Vec<GachaLogEntry>,
}

/// One provider-native wish record.
#[derive(Debug, Clone, Deserialize)]
pub struct GachaLogEntry {
    pub id: String,
    pub uid: String,
    pub gacha_type: String,
    pub time: String,
    pub name: String,
    pub item_type: String,
    pub rank_type: String,
}

/// Payload of the account info endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct UserInfoData {
    pub user_id: String,
    pub nickname: Option<String>,
}

/// Provider settings stored in `~/.wishsync/config.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSettings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gacha_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identity_endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lang: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

/// wishsync local configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WishsyncConfig {
    pub provider: Option<ProviderSettings>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_gacha_log_response() {
        let body = r#"{
            "retcode": 0,
            "message": "OK",
            "data": {
                "page": "1",
                "size": "6",
                "total": "0",
                "list": [{
                    "uid": "700000001",
                    "gacha_type": "301",
                    "item_id": "",
                    "count": "1",
                    "time": "2020-10-01 12:00:00",
                    "name": "Venti",
                    "lang": "en-us",
                    "item_type": "Character",
                    "rank_type": "5",
                    "id": "1601553600000000001"
                }],
                "region": "os_euro"
            }
        }"#;

        let response: ApiResponse<GachaLogData> = serde_json::from_str(body).unwrap();
        assert_eq!(response.retcode, 0);
        let list = response.data.unwrap().list;
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name, "Venti");
        assert_eq!(list[0].id, "1601553600000000001");
    }

    #[test]
    fn test_parse_error_response_without_data() {
        let body = r#"{"retcode": -101, "message": "authkey timeout", "data": null}"#;
        let response: ApiResponse<GachaLogData> = serde_json::from_str(body).unwrap();
        assert_eq!(response.retcode, -101);
        assert!(response.data.is_none());
    }

    #[test]
    fn test_settings_skip_unset_fields() {
        let settings = ProviderSettings {
            lang: Some("fr-fr".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_string(&settings).unwrap();
        assert_eq!(json, r#"{"lang":"fr-fr"}"#);
    }
}
