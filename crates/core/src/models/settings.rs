//! Store settings editable from the admin API.
//!
//! Stored as one JSON value per key in `shop.setting`. Keys that are absent
//! fall back to [`StoreSettings::default`].

use serde::{Deserialize, Serialize};

use crate::pricing::{
    ADVERTISED_FREE_SHIPPING_THRESHOLD, CHECKOUT_FREE_SHIPPING_THRESHOLD, FLAT_SHIPPING_FEE,
    ShippingPolicy,
};
use crate::types::Money;

/// Public store configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub store_name: String,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub shipping_fee: Money,
    /// Threshold used by cart and checkout totals.
    pub free_shipping_threshold: Money,
    /// Threshold shown in delivery and cart info copy.
    pub advertised_free_shipping_threshold: Money,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            store_name: "FuelStack".to_owned(),
            contact_email: None,
            contact_phone: None,
            address: None,
            shipping_fee: Money::from_units(FLAT_SHIPPING_FEE),
            free_shipping_threshold: Money::from_units(CHECKOUT_FREE_SHIPPING_THRESHOLD),
            advertised_free_shipping_threshold: Money::from_units(
                ADVERTISED_FREE_SHIPPING_THRESHOLD,
            ),
        }
    }
}

impl StoreSettings {
    /// Keys as stored in the settings table.
    pub const KEYS: [&'static str; 7] = [
        "store_name",
        "contact_email",
        "contact_phone",
        "address",
        "shipping_fee",
        "free_shipping_threshold",
        "advertised_free_shipping_threshold",
    ];

    /// Shipping rules derived from these settings.
    #[must_use]
    pub const fn shipping_policy(&self) -> ShippingPolicy {
        ShippingPolicy {
            free_shipping_threshold: self.free_shipping_threshold,
            advertised_free_shipping_threshold: self.advertised_free_shipping_threshold,
            flat_fee: self.shipping_fee,
        }
    }

    /// Build settings from stored key/value pairs, ignoring unknown keys and
    /// values that don't parse.
    #[must_use]
    pub fn from_entries<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        let mut merged = match serde_json::to_value(Self::default()) {
            Ok(serde_json::Value::Object(map)) => map,
            _ => serde_json::Map::new(),
        };

        for (key, value) in entries {
            if !Self::KEYS.contains(&key.as_str()) {
                continue;
            }
            let mut probe = merged.clone();
            probe.insert(key.clone(), value.clone());
            if serde_json::from_value::<Self>(serde_json::Value::Object(probe)).is_ok() {
                merged.insert(key, value);
            }
        }

        serde_json::from_value(serde_json::Value::Object(merged)).unwrap_or_default()
    }

    /// Apply a partial update.
    pub fn apply(&mut self, update: StoreSettingsUpdate) {
        if let Some(store_name) = update.store_name {
            self.store_name = store_name;
        }
        if let Some(contact_email) = update.contact_email {
            self.contact_email = Some(contact_email).filter(|v| !v.trim().is_empty());
        }
        if let Some(contact_phone) = update.contact_phone {
            self.contact_phone = Some(contact_phone).filter(|v| !v.trim().is_empty());
        }
        if let Some(address) = update.address {
            self.address = Some(address).filter(|v| !v.trim().is_empty());
        }
        if let Some(fee) = update.shipping_fee {
            self.shipping_fee = fee;
        }
        if let Some(threshold) = update.free_shipping_threshold {
            self.free_shipping_threshold = threshold;
        }
        if let Some(threshold) = update.advertised_free_shipping_threshold {
            self.advertised_free_shipping_threshold = threshold;
        }
    }

    /// Key/value pairs for persisting.
    #[must_use]
    pub fn to_entries(&self) -> Vec<(&'static str, serde_json::Value)> {
        let value = serde_json::to_value(self).unwrap_or_default();
        Self::KEYS
            .iter()
            .map(|key| (*key, value.get(*key).cloned().unwrap_or_default()))
            .collect()
    }
}

/// Partial update of [`StoreSettings`]. Amounts are [`Money`], so negative
/// values are rejected at deserialization.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoreSettingsUpdate {
    pub store_name: Option<String>,
    pub contact_email: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub shipping_fee: Option<Money>,
    pub free_shipping_threshold: Option<Money>,
    pub advertised_free_shipping_threshold: Option<Money>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_match_pricing_constants() {
        let settings = StoreSettings::default();
        assert_eq!(settings.shipping_policy(), ShippingPolicy::default());
    }

    #[test]
    fn test_from_entries_overrides_and_ignores_junk() {
        let settings = StoreSettings::from_entries([
            ("store_name".to_owned(), json!("FuelStack UB")),
            ("shipping_fee".to_owned(), json!("6000")),
            ("free_shipping_threshold".to_owned(), json!("-1")),
            ("unrelated".to_owned(), json!(true)),
        ]);
        assert_eq!(settings.store_name, "FuelStack UB");
        assert_eq!(settings.shipping_fee, Money::from_units(6_000));
        assert_eq!(
            settings.free_shipping_threshold,
            Money::from_units(CHECKOUT_FREE_SHIPPING_THRESHOLD)
        );
    }

    #[test]
    fn test_apply_partial_update() {
        let mut settings = StoreSettings::default();
        settings.apply(StoreSettingsUpdate {
            contact_phone: Some("77001122".to_owned()),
            free_shipping_threshold: Some(Money::from_units(60_000)),
            ..StoreSettingsUpdate::default()
        });
        assert_eq!(settings.contact_phone.as_deref(), Some("77001122"));
        assert_eq!(settings.free_shipping_threshold, Money::from_units(60_000));
        assert_eq!(settings.store_name, "FuelStack");
    }

    #[test]
    fn test_update_rejects_negative_amount() {
        let result = serde_json::from_value::<StoreSettingsUpdate>(json!({"shipping_fee": "-5"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_entries_roundtrip() {
        let mut settings = StoreSettings::default();
        settings.contact_email = Some("hello@fuelstack.mn".to_owned());
        let entries = settings
            .to_entries()
            .into_iter()
            .map(|(k, v)| (k.to_owned(), v));
        assert_eq!(StoreSettings::from_entries(entries), settings);
    }
}
