//! Saved shipping addresses.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{AddressId, UserId};

/// A customer's saved address.
///
/// When a user has any addresses, exactly one of them is the default.
#[derive(Debug, Clone, Serialize)]
pub struct Address {
    pub id: AddressId,
    pub user_id: UserId,
    /// Short name such as "Home" or "Office".
    pub label: Option<String>,
    pub recipient_name: String,
    pub phone: String,
    /// City or aimag.
    pub city: String,
    /// District or sum.
    pub district: String,
    pub khoroo: Option<String>,
    pub address_line: String,
    pub notes: Option<String>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Address fields accepted from clients, for both saved addresses and
/// checkout's inline shipping address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressInput {
    pub label: Option<String>,
    pub recipient_name: String,
    pub phone: String,
    pub city: String,
    pub district: String,
    pub khoroo: Option<String>,
    pub address_line: String,
    pub notes: Option<String>,
}

impl AddressInput {
    /// Names of required fields that are blank.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("recipient_name", &self.recipient_name),
            ("phone", &self.phone),
            ("city", &self.city),
            ("district", &self.district),
            ("address_line", &self.address_line),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }
}

impl From<&Address> for AddressInput {
    fn from(address: &Address) -> Self {
        Self {
            label: address.label.clone(),
            recipient_name: address.recipient_name.clone(),
            phone: address.phone.clone(),
            city: address.city.clone(),
            district: address.district.clone(),
            khoroo: address.khoroo.clone(),
            address_line: address.address_line.clone(),
            notes: address.notes.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields() {
        let input = AddressInput {
            label: None,
            recipient_name: "Bat".to_owned(),
            phone: " ".to_owned(),
            city: "Ulaanbaatar".to_owned(),
            district: String::new(),
            khoroo: None,
            address_line: "Peace Ave 12".to_owned(),
            notes: None,
        };
        assert_eq!(input.missing_fields(), vec!["phone", "district"]);
    }
}
