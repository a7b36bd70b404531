use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::discovery::{DiscoveryError, NearbyQuery};
use crate::models::domain::{Coordinates, NewBusiness, NewUser, Service};

/// Pair optional coordinates; a lone half is rejected
pub fn location_from_parts(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<Option<Coordinates>, DiscoveryError> {
    match (latitude, longitude) {
        (Some(lat), Some(lon)) => Ok(Some(Coordinates::new(lat, lon))),
        (None, None) => Ok(None),
        _ => Err(DiscoveryError::Validation(
            "latitude and longitude must be supplied together".to_string(),
        )),
    }
}

fn required(field: &str, value: &str) -> Result<String, DiscoveryError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(DiscoveryError::Validation(format!("{} must not be blank", field)));
    }
    Ok(trimmed.to_string())
}

/// Request to register an end user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterUserRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

impl RegisterUserRequest {
    pub fn into_new_user(self) -> Result<NewUser, DiscoveryError> {
        self.validate()?;
        Ok(NewUser {
            name: required("name", &self.name)?,
            email: self.email.trim().to_lowercase(),
            location: location_from_parts(self.latitude, self.longitude)?,
        })
    }
}

/// Login-time location refresh
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LocationRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
}

impl LocationRequest {
    pub fn into_coordinates(self) -> Result<Coordinates, DiscoveryError> {
        self.validate()?;
        Ok(Coordinates::new(self.latitude, self.longitude))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ServiceRequest {
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(range(min = 0.0))]
    pub price: f64,
}

/// Request to register a business
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterBusinessRequest {
    #[validate(length(min = 1, max = 200))]
    pub business_name: String,
    #[validate(length(min = 1, max = 200))]
    pub owner_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 50))]
    pub phone: String,
    #[validate(length(min = 1, max = 100))]
    pub business_type: String,
    #[validate(length(min = 1, max = 500))]
    pub address: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: f64,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    #[validate(nested)]
    pub services: Vec<ServiceRequest>,
}

impl RegisterBusinessRequest {
    pub fn into_new_business(self) -> Result<NewBusiness, DiscoveryError> {
        self.validate()?;

        let services = self
            .services
            .into_iter()
            .map(|s| {
                Ok(Service {
                    name: required("service name", &s.name)?,
                    price: s.price,
                })
            })
            .collect::<Result<Vec<_>, DiscoveryError>>()?;

        Ok(NewBusiness {
            business_name: required("business_name", &self.business_name)?,
            owner_name: required("owner_name", &self.owner_name)?,
            email: self.email.trim().to_lowercase(),
            phone: required("phone", &self.phone)?,
            business_type: required("business_type", &self.business_type)?,
            address: required("address", &self.address)?,
            location: Coordinates::new(self.latitude, self.longitude),
            website: self
                .website
                .map(|w| w.trim().to_string())
                .filter(|w| !w.is_empty()),
            services,
        })
    }
}

/// Nearby search; every field is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NearbyRequest {
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[validate(range(min = 0.0))]
    pub radius: Option<f64>,
    pub business_type: Option<String>,
}

impl NearbyRequest {
    pub fn into_query(self) -> Result<NearbyQuery, DiscoveryError> {
        self.validate()?;
        Ok(NearbyQuery {
            origin: location_from_parts(self.latitude, self.longitude)?,
            radius_km: self.radius,
            business_type: self.business_type,
        })
    }
}

/// Query string for text search
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Client-reported activity
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TrackActivityRequest {
    pub user_id: Option<i64>,
    #[serde(default)]
    pub user_type: Option<String>,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 100))]
    pub action: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn business_request() -> RegisterBusinessRequest {
        RegisterBusinessRequest {
            business_name: "  Toronto Glow ".to_string(),
            owner_name: "Sarah Johnson".to_string(),
            email: "Sarah@TOGLOW.com".to_string(),
            phone: "(416) 555-0101".to_string(),
            business_type: "Spa".to_string(),
            address: "123 Yonge St, Toronto, ON".to_string(),
            latitude: 43.6532,
            longitude: -79.3832,
            website: Some("  ".to_string()),
            services: vec![ServiceRequest {
                name: "Facial".to_string(),
                price: 90.0,
            }],
        }
    }

    #[test]
    fn test_business_request_normalizes() {
        let business = business_request().into_new_business().unwrap();
        assert_eq!(business.business_name, "Toronto Glow");
        assert_eq!(business.email, "sarah@toglow.com");
        assert_eq!(business.website, None);
        assert_eq!(business.services.len(), 1);
    }

    #[test]
    fn test_business_request_rejects_bad_latitude() {
        let mut request = business_request();
        request.latitude = 91.0;
        assert!(matches!(request.into_new_business(), Err(DiscoveryError::Validation(_))));
    }

    #[test]
    fn test_business_request_rejects_blank_name() {
        let mut request = business_request();
        request.business_name = "   ".to_string();
        assert!(matches!(request.into_new_business(), Err(DiscoveryError::Validation(_))));
    }

    #[test]
    fn test_business_request_rejects_negative_price() {
        let mut request = business_request();
        request.services[0].price = -1.0;
        assert!(request.into_new_business().is_err());
    }

    #[test]
    fn test_partial_location_rejected() {
        assert!(location_from_parts(Some(43.0), None).is_err());
        assert!(location_from_parts(None, Some(-79.0)).is_err());
        assert_eq!(location_from_parts(None, None).unwrap(), None);
    }

    #[test]
    fn test_nearby_request_defaults() {
        let query = NearbyRequest::default().into_query().unwrap();
        assert!(query.origin.is_none());
        assert!(query.radius_km.is_none());
    }

    #[test]
    fn test_nearby_request_negative_radius() {
        let request = NearbyRequest {
            radius: Some(-5.0),
            ..Default::default()
        };
        assert!(request.into_query().is_err());
    }
}
