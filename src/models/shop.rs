//! Shop model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ShopId, ShopStatus, UserId};
use crate::error::{Result, WholesaleError};

/// A registered business account that may order once approved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shop {
    /// Unique identifier (UUID).
    pub id: ShopId,
    /// Owning business owner.
    pub owner_id: UserId,
    /// Display name.
    pub name: String,
    /// Free-text address.
    pub location: String,
    /// Latitude in decimal degrees.
    #[serde(default)]
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees.
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Review state.
    pub status: ShopStatus,
    /// Administrator who registered the shop, if any.
    #[serde(default)]
    pub registered_by: Option<UserId>,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

/// A shop an administrator registers on behalf of an existing user.
///
/// Stored as an approved shop attributed to the administrator; the owner
/// is then granted the business-owner role.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShopRegistration {
    /// Identity-service user that will own the shop.
    pub owner_id: UserId,
    /// Display name.
    pub name: String,
    /// Free-text address.
    pub location: String,
    /// Latitude in decimal degrees.
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees.
    pub longitude: Option<f64>,
}

impl ShopRegistration {
    /// Checks the registration before the procedure is called.
    ///
    /// # Errors
    ///
    /// Returns [`WholesaleError::InvalidRecord`] if the name or location is
    /// blank, or a coordinate is out of range.
    #[inline]
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() || self.location.trim().is_empty() {
            return Err(WholesaleError::InvalidRecord(
                "shop name and location must not be empty".to_owned(),
            ));
        }
        let latitude_ok = self
            .latitude
            .is_none_or(|latitude| (-90.0..=90.0).contains(&latitude));
        let longitude_ok = self
            .longitude
            .is_none_or(|longitude| (-180.0..=180.0).contains(&longitude));
        if !latitude_ok || !longitude_ok {
            return Err(WholesaleError::InvalidRecord(format!(
                "shop {} has coordinates out of range",
                self.name
            )));
        }
        Ok(())
    }

    /// Builds the insert payload of an approved shop registered by
    /// `admin`.
    #[inline]
    #[must_use]
    pub fn approved_by(&self, admin: &UserId) -> NewShop {
        NewShop {
            owner_id: self.owner_id.clone(),
            name: self.name.trim().to_owned(),
            location: self.location.trim().to_owned(),
            latitude: self.latitude,
            longitude: self.longitude,
            registered_by: Some(admin.clone()),
            status: ShopStatus::Approved,
        }
    }
}

/// Insert payload of the `shops` table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewShop {
    /// Owning user.
    pub owner_id: UserId,
    /// Display name.
    pub name: String,
    /// Free-text address.
    pub location: String,
    /// Latitude in decimal degrees.
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees.
    pub longitude: Option<f64>,
    /// Administrator who registered the shop.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registered_by: Option<UserId>,
    /// Initial review state.
    pub status: ShopStatus,
}

/// A signed-in user's request to open a shop for themselves.
///
/// Serialized as the arguments of the `create_new_shop` procedure, which
/// creates a pending shop owned by the caller and grants the caller the
/// business-owner role in one transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShopApplication {
    /// Display name.
    pub shop_name: String,
    /// Free-text address.
    pub shop_location: String,
}

impl ShopApplication {
    /// Creates an application with trimmed fields.
    #[inline]
    #[must_use]
    pub fn new(name: &str, location: &str) -> Self {
        Self {
            shop_name: name.trim().to_owned(),
            shop_location: location.trim().to_owned(),
        }
    }

    /// Checks the application before the procedure is called.
    ///
    /// # Errors
    ///
    /// Returns [`WholesaleError::InvalidRecord`] if the name or location is
    /// blank.
    #[inline]
    pub fn validate(&self) -> Result<()> {
        if self.shop_name.trim().is_empty() || self.shop_location.trim().is_empty() {
            return Err(WholesaleError::InvalidRecord(
                "shop name and location must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Public profile of a shop owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerProfile {
    /// Owning user.
    pub user_id: UserId,
    /// Full name.
    #[serde(default)]
    pub full_name: Option<String>,
    /// Contact phone.
    #[serde(default)]
    pub phone: Option<String>,
}

/// A shop together with its owner's profile, as listed to administrators.
#[derive(Debug, Clone, PartialEq)]
pub struct ShopWithOwner {
    /// The shop record.
    pub shop: Shop,
    /// Owner profile, when one exists.
    pub owner: Option<OwnerProfile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_shop() {
        let json = r#"{
            "id": "s-1",
            "owner_id": "u-1",
            "name": "Corner Market",
            "location": "12 High St",
            "latitude": 51.5,
            "longitude": -0.12,
            "status": "approved",
            "registered_by": "u-admin",
            "created_at": "2024-05-01T10:00:00.123456+00:00"
        }"#;
        let shop: Shop = serde_json::from_str(json).unwrap();
        assert_eq!(shop.status, ShopStatus::Approved);
        assert_eq!(shop.latitude, Some(51.5));
        assert!(shop.created_at.is_some());
    }

    #[test]
    fn deserialize_shop_without_coordinates() {
        let json = r#"{
            "id": "s-2",
            "owner_id": "u-2",
            "name": "Kiosk",
            "location": "Station",
            "latitude": null,
            "longitude": null,
            "status": "pending"
        }"#;
        let shop: Shop = serde_json::from_str(json).unwrap();
        assert!(shop.latitude.is_none());
        assert!(shop.registered_by.is_none());
    }

    #[test]
    fn registration_checks() {
        let mut registration = ShopRegistration {
            owner_id: UserId::from("u-9"),
            name: "Corner Market".to_owned(),
            location: "12 High St".to_owned(),
            latitude: Some(51.5),
            longitude: Some(-0.12),
        };
        registration.validate().unwrap();

        registration.latitude = Some(120.0);
        assert!(registration.validate().is_err());

        registration.latitude = None;
        registration.location = "  ".to_owned();
        assert!(registration.validate().is_err());
    }

    #[test]
    fn registration_payload_is_approved_and_attributed() {
        let registration = ShopRegistration {
            owner_id: UserId::from("u-9"),
            name: " Corner Market ".to_owned(),
            location: "12 High St".to_owned(),
            latitude: None,
            longitude: None,
        };
        let json = serde_json::to_value(registration.approved_by(&UserId::from("u-admin"))).unwrap();
        assert_eq!(json["owner_id"], "u-9");
        assert_eq!(json["name"], "Corner Market");
        assert_eq!(json["registered_by"], "u-admin");
        assert_eq!(json["status"], "approved");
        assert!(json["latitude"].is_null());
    }

    #[test]
    fn application_uses_procedure_argument_names() {
        let application = ShopApplication::new(" Kiosk ", "Station");
        application.validate().unwrap();
        let json = serde_json::to_value(&application).unwrap();
        assert_eq!(json, serde_json::json!({"shop_name": "Kiosk", "shop_location": "Station"}));
        assert!(ShopApplication::new("Kiosk", " ").validate().is_err());
    }

    #[test]
    fn unknown_status_is_rejected() {
        let json = r#"{
            "id": "s-3",
            "owner_id": "u-3",
            "name": "Kiosk",
            "location": "Station",
            "status": "closed"
        }"#;
        assert!(serde_json::from_str::<Shop>(json).is_err());
    }
}
