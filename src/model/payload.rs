use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NamedRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountRef {
    #[serde(rename = "accountId")]
    pub account_id: String,
}

/// The fields a push may change on an issue. Anything `None` is left untouched remotely.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UpdatePayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<NamedRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<AccountRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl UpdatePayload {
    /// Request body for the edit endpoint.
    pub fn to_body(&self) -> serde_json::Value {
        serde_json::json!({ "fields": self })
    }
}

/// A user search hit.
#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    #[serde(rename = "accountId")]
    pub account_id: String,
    #[serde(rename = "displayName", default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub display_name: String,
    pub account_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_fields_are_not_sent() {
        let payload = UpdatePayload {
            assignee: Some(AccountRef {
                account_id: "abc123".into(),
            }),
            ..Default::default()
        };
        assert_eq!(
            payload.to_body(),
            json!({ "fields": { "assignee": { "accountId": "abc123" } } })
        );
    }

    #[test]
    fn account_display_name_is_optional() {
        let account: Account = serde_json::from_value(json!({ "accountId": "x1" })).unwrap();
        assert_eq!(account.account_id, "x1");
        assert!(account.display_name.is_none());
    }
}
