//! SCIM DTOs for the resources the consoles manage.
//!
//! # Design
//! These mirror the mock server's schema but are defined independently so
//! integration tests catch drift between the two crates. Only the
//! attributes the consoles read are modelled.

use serde::{Deserialize, Serialize};

pub const SCIM_USER_SCHEMA: &str = "urn:ietf:params:scim:schemas:core:2.0:User";
pub const SCIM_GROUP_SCHEMA: &str = "urn:ietf:params:scim:schemas:core:2.0:Group";
pub const SCIM_PATCH_SCHEMA: &str = "urn:ietf:params:scim:api:messages:2.0:PatchOp";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScimUser {
    pub id: String,
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<String>,
    #[serde(default)]
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScimGroup {
    pub id: String,
    pub display_name: String,
    #[serde(default)]
    pub members: Vec<GroupMember>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupMember {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

/// SCIM list envelope.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ListResponse<T> {
    pub total_results: u64,
    #[serde(rename = "Resources", default = "Vec::new")]
    pub resources: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUser {
    pub schemas: Vec<String>,
    pub user_name: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub emails: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl CreateUser {
    pub fn new(user_name: impl Into<String>) -> Self {
        Self {
            schemas: vec![SCIM_USER_SCHEMA.to_string()],
            user_name: user_name.into(),
            emails: Vec::new(),
            password: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroup {
    pub schemas: Vec<String>,
    pub display_name: String,
    #[serde(default)]
    pub members: Vec<GroupMember>,
}

impl CreateGroup {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            schemas: vec![SCIM_GROUP_SCHEMA.to_string()],
            display_name: display_name.into(),
            members: Vec::new(),
        }
    }
}

/// SCIM PATCH body. Applications and identity providers reuse the same
/// shape on the management API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PatchOp {
    #[serde(rename = "schemas")]
    pub schemas: Vec<String>,
    pub operations: Vec<PatchOperation>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchOperation {
    pub op: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    pub value: serde_json::Value,
}

impl PatchOp {
    pub fn replace(path: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            schemas: vec![SCIM_PATCH_SCHEMA.to_string()],
            operations: vec![PatchOperation {
                op: "replace".to_string(),
                path: Some(path.into()),
                value,
            }],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_response_uses_scim_field_names() {
        let raw = r#"{"totalResults":1,"Resources":[{"id":"u1","userName":"alice"}]}"#;
        let list: ListResponse<ScimUser> = serde_json::from_str(raw).unwrap();
        assert_eq!(list.total_results, 1);
        assert_eq!(list.resources[0].user_name, "alice");
        assert!(!list.resources[0].active);
    }

    #[test]
    fn empty_list_may_omit_resources() {
        let list: ListResponse<ScimGroup> = serde_json::from_str(r#"{"totalResults":0}"#).unwrap();
        assert!(list.resources.is_empty());
    }

    #[test]
    fn patch_op_shape() {
        let body = serde_json::to_value(PatchOp::replace("active", serde_json::json!(false))).unwrap();
        assert_eq!(body["schemas"][0], SCIM_PATCH_SCHEMA);
        assert_eq!(body["Operations"][0]["op"], "replace");
        assert_eq!(body["Operations"][0]["path"], "active");
    }

    #[test]
    fn create_user_omits_missing_password() {
        let body = serde_json::to_value(CreateUser::new("bob")).unwrap();
        assert_eq!(body["userName"], "bob");
        assert!(body.get("password").is_none());
    }
}
