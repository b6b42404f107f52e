use serde::{Deserialize, Serialize};

/// A user record as stored by the server. The status pipeline treats this
/// as an opaque payload; only the CLI and the validators look inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Server-assigned identifier. Cleared before a create is sent; the
    /// server is authoritative for identity assignment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    #[serde(default)]
    pub phone: String,
    pub email: String,
    /// Date of birth, mm/dd/yyyy.
    pub dob: String,
    pub ssn: String,
    #[serde(default)]
    pub picture: String,
}

/// Pagination metadata from the server's list envelope.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u32,
    pub number: u32,
}

/// One page of users plus its pagination metadata, the aggregate the list
/// channel hands to consumers.
#[derive(Debug, Clone, PartialEq)]
pub struct UserPage {
    pub users: Vec<User>,
    pub page: PageInfo,
}

/// The raw envelope the server wraps list responses in: the item collection
/// keyed under `_embedded`, metadata under `page`.
#[derive(Debug, Deserialize)]
pub(crate) struct UsersDocument {
    #[serde(rename = "_embedded")]
    pub embedded: EmbeddedUsers,
    pub page: PageInfo,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EmbeddedUsers {
    pub users: Vec<User>,
}

impl From<UsersDocument> for UserPage {
    fn from(doc: UsersDocument) -> Self {
        Self {
            users: doc.embedded.users,
            page: doc.page,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_user() -> User {
    User {
        id: None,
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        address: "1 Main St".to_string(),
        city: "Springfield".to_string(),
        state: "VA".to_string(),
        zip_code: "22150".to_string(),
        phone: "(703) 555-0100".to_string(),
        email: "jane.doe@example.com".to_string(),
        dob: "01/31/1990".to_string(),
        ssn: "123-45-6789".to_string(),
        picture: "https://example.com/jane.png".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_wire_names_are_camel_case() {
        let user = sample_user();
        let json = serde_json::to_string(&user).expect("should serialize");
        assert!(json.contains("\"firstName\":\"Jane\""));
        assert!(json.contains("\"zipCode\":\"22150\""));
        // No id: the field is skipped entirely when unset.
        assert!(!json.contains("\"id\""));
    }

    #[test]
    fn test_users_document_unwraps_envelope() {
        let body = r#"{
            "_embedded": {
                "users": [
                    {"id": 7, "firstName": "Jane", "lastName": "Doe",
                     "address": "1 Main St", "city": "Springfield",
                     "state": "VA", "zipCode": "22150", "phone": "",
                     "email": "jane.doe@example.com", "dob": "01/31/1990",
                     "ssn": "123-45-6789", "picture": ""}
                ]
            },
            "page": {"size": 10, "totalElements": 23, "totalPages": 3, "number": 0}
        }"#;
        let doc: UsersDocument = serde_json::from_str(body).expect("should parse envelope");
        let page = UserPage::from(doc);
        assert_eq!(page.users.len(), 1);
        assert_eq!(page.users[0].id, Some(7));
        assert_eq!(page.page.total_elements, 23);
        assert_eq!(page.page.total_pages, 3);
        assert_eq!(page.page.number, 0);
        assert_eq!(page.page.size, 10);
    }
}
