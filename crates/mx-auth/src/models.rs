use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Windows Live token response (refresh_token grant)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LiveTokenResponse {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub expires_in: u64,
    pub token_type: String,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Xbox Live user.authenticate request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserAuthRequest {
    pub properties: UserAuthProperties,
    pub relying_party: String,
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserAuthProperties {
    pub auth_method: String,
    pub site_name: String,
    pub rps_ticket: String,
}

/// XSTS authorize request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct XstsAuthRequest {
    pub properties: XstsAuthProperties,
    pub relying_party: String,
    pub token_type: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct XstsAuthProperties {
    pub sandbox_id: String,
    pub user_tokens: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title_token: Option<String>,
}

/// Response shared by user.authenticate and xsts/authorize
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct XasResponse {
    pub token: String,
    pub display_claims: XasDisplayClaims,
    pub issue_instant: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct XasDisplayClaims {
    #[serde(default)]
    pub xui: Vec<XasUserInfo>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct XasUserInfo {
    pub uhs: String,
}

/// XSTS error response
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct XstsErrorResponse {
    #[serde(rename = "XErr")]
    pub xerr: u64,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_xsts_request_omits_absent_tokens() {
        let request = XstsAuthRequest {
            properties: XstsAuthProperties {
                sandbox_id: "RETAIL".to_string(),
                user_tokens: vec!["user".to_string()],
                device_token: None,
                title_token: Some("title".to_string()),
            },
            relying_party: "http://update.xboxlive.com".to_string(),
            token_type: "JWT".to_string(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["RelyingParty"], "http://update.xboxlive.com");
        assert_eq!(json["Properties"]["UserTokens"][0], "user");
        assert_eq!(json["Properties"]["TitleToken"], "title");
        assert!(json["Properties"].get("DeviceToken").is_none());
    }

    #[test]
    fn test_xas_response_parses_seven_digit_fractions() {
        let json = r#"{
            "IssueInstant": "2024-05-01T10:00:00.1234567Z",
            "NotAfter": "2024-05-02T02:00:00.1234567Z",
            "Token": "jwt",
            "DisplayClaims": { "xui": [ { "uhs": "1234" } ] }
        }"#;

        let response: XasResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.token, "jwt");
        assert_eq!(response.display_claims.xui[0].uhs, "1234");
        assert!(response.not_after > response.issue_instant);
    }
}
