use crate::core::discovery::{DiscoveryError, DiscoveryService};
use crate::models::{Coordinates, NewBusiness, Service};
use crate::services::store::{BusinessCatalog, BusinessWriter, DiscoveryStore, RegistrationTx};

struct SampleBusiness {
    name: &'static str,
    owner: &'static str,
    email: &'static str,
    phone: &'static str,
    business_type: &'static str,
    address: &'static str,
    latitude: f64,
    longitude: f64,
    services: [(&'static str, f64); 2],
}

const SAMPLE_BUSINESSES: &[SampleBusiness] = &[
    SampleBusiness {
        name: "Toronto Glow Spa",
        owner: "Sarah Johnson",
        email: "sarah@toglow.com",
        phone: "(416) 555-0101",
        business_type: "Spa",
        address: "123 Yonge St, Toronto, ON M5C 1W4",
        latitude: 43.6532,
        longitude: -79.3832,
        services: [("Full Body Massage", 120.0), ("Facial", 90.0)],
    },
    SampleBusiness {
        name: "Queen Street Salon",
        owner: "David Chen",
        email: "david@queensalon.com",
        phone: "(416) 555-0202",
        business_type: "Salon",
        address: "456 Queen St W, Toronto, ON M5V 2A8",
        latitude: 43.6487,
        longitude: -79.3962,
        services: [("Haircut", 60.0), ("Coloring", 150.0)],
    },
    SampleBusiness {
        name: "Yorkville Beauty",
        owner: "Emma Wilson",
        email: "emma@yorkvillebeauty.com",
        phone: "(416) 555-0303",
        business_type: "Makeup",
        address: "789 Bloor St, Toronto, ON M4W 1A9",
        latitude: 43.6708,
        longitude: -79.3899,
        services: [("Bridal Makeup", 200.0), ("Lash Extensions", 85.0)],
    },
    SampleBusiness {
        name: "Capital Skin Clinic",
        owner: "Dr. Robert Brown",
        email: "robert@capitalskin.com",
        phone: "(613) 555-0707",
        business_type: "Skin Care",
        address: "50 Rideau St, Ottawa, ON K1N 9J7",
        latitude: 45.4215,
        longitude: -75.6972,
        services: [("Dermatology Consult", 150.0), ("Laser Treatment", 200.0)],
    },
    SampleBusiness {
        name: "ByWard Nails",
        owner: "Sophie Martin",
        email: "sophie@bywardnails.com",
        phone: "(613) 555-0808",
        business_type: "Nails",
        address: "100 ByWard Market, Ottawa, ON K1N 7A1",
        latitude: 45.4267,
        longitude: -75.6927,
        services: [("Gel Manicure", 55.0), ("Pedicure", 65.0)],
    },
    SampleBusiness {
        name: "Pacific Wellness",
        owner: "Emily Wong",
        email: "emily@pacificwellness.com",
        phone: "(604) 555-0303",
        business_type: "Spa",
        address: "789 Granville St, Vancouver, BC V6Z 1K9",
        latitude: 49.2827,
        longitude: -123.1207,
        services: [("Hot Stone Massage", 140.0), ("Aromatherapy", 95.0)],
    },
    SampleBusiness {
        name: "Gastown Barbers",
        owner: "Mike Smith",
        email: "mike@gastownbarbers.com",
        phone: "(604) 555-0404",
        business_type: "Salon",
        address: "321 Water St, Vancouver, BC V6B 1B8",
        latitude: 49.2849,
        longitude: -123.1116,
        services: [("Men's Cut", 40.0), ("Beard Trim", 25.0)],
    },
    SampleBusiness {
        name: "Beauté Montréal",
        owner: "Isabelle Tremblay",
        email: "isabelle@beaute.com",
        phone: "(514) 555-0505",
        business_type: "Makeup",
        address: "100 Rue Sainte-Catherine O, Montréal, QC H2X 3V4",
        latitude: 45.5017,
        longitude: -73.5673,
        services: [("Bridal Makeup", 180.0), ("Evening Look", 95.0)],
    },
    SampleBusiness {
        name: "Plateau Salon",
        owner: "Jean-Pierre Dubois",
        email: "jp@plateausalon.com",
        phone: "(514) 555-0606",
        business_type: "Salon",
        address: "4500 Rue Saint-Denis, Montréal, QC H2J 2L3",
        latitude: 45.5234,
        longitude: -73.5800,
        services: [("Haircut", 70.0), ("Balayage", 190.0)],
    },
    SampleBusiness {
        name: "Stampede Nails",
        owner: "Jessica Lee",
        email: "jessica@stampedenails.com",
        phone: "(403) 555-0606",
        business_type: "Nails",
        address: "200 8 Ave SW, Calgary, AB T2P 1B5",
        latitude: 51.0447,
        longitude: -114.0719,
        services: [("Gel Nails", 65.0), ("Pedicure", 55.0)],
    },
    SampleBusiness {
        name: "Whyte Avenue Spa",
        owner: "Laura Mitchell",
        email: "laura@whytespa.com",
        phone: "(780) 555-0808",
        business_type: "Spa",
        address: "8208 104 St NW, Edmonton, AB T6E 4E6",
        latitude: 53.5190,
        longitude: -113.5110,
        services: [("Deep Tissue Massage", 125.0), ("Reflexology", 80.0)],
    },
    SampleBusiness {
        name: "Halifax Harbour Spa",
        owner: "Jennifer MacLeod",
        email: "jennifer@halifaxspa.com",
        phone: "(902) 555-1111",
        business_type: "Spa",
        address: "1869 Upper Water St, Halifax, NS B3J 1S9",
        latitude: 44.6488,
        longitude: -63.5752,
        services: [("Seaweed Wrap", 110.0), ("Massage", 100.0)],
    },
    SampleBusiness {
        name: "Water Street Wellness",
        owner: "Mary O'Brien",
        email: "mary@waterstreetwellness.com",
        phone: "(709) 555-1515",
        business_type: "Spa",
        address: "200 Water St, St. John's, NL A1C 1A9",
        latitude: 47.5615,
        longitude: -52.7126,
        services: [("Massage Therapy", 105.0), ("Hydrotherapy", 95.0)],
    },
];

impl SampleBusiness {
    fn to_new_business(&self) -> NewBusiness {
        NewBusiness {
            business_name: self.name.to_string(),
            owner_name: self.owner.to_string(),
            email: self.email.to_string(),
            phone: self.phone.to_string(),
            business_type: self.business_type.to_string(),
            address: self.address.to_string(),
            location: Coordinates::new(self.latitude, self.longitude),
            website: None,
            services: self
                .services
                .iter()
                .map(|(name, price)| Service {
                    name: name.to_string(),
                    price: *price,
                })
                .collect(),
        }
    }
}

/// Populate an empty catalog with verified sample businesses
///
/// Every sample is written verified in a single transaction and no users
/// are notified. Returns the number of businesses added; zero when the
/// catalog already has data.
pub async fn seed_sample_businesses(discovery: &DiscoveryService) -> Result<usize, DiscoveryError> {
    let store = discovery.store();
    if store.business_count().await? > 0 {
        tracing::info!("Catalog already populated, skipping sample data");
        return Ok(0);
    }

    let mut tx = store.begin().await?;
    for sample in SAMPLE_BUSINESSES {
        let business = sample.to_new_business();
        let business_id = tx.insert_business(&business).await?;
        for service in &business.services {
            tx.insert_service(business_id, service).await?;
        }
        tx.mark_verified(business_id).await?;
    }
    tx.commit().await?;

    discovery.clear_search_cache().await;

    tracing::info!("Seeded {} sample businesses", SAMPLE_BUSINESSES.len());
    Ok(SAMPLE_BUSINESSES.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::discovery::NearbyQuery;
    use crate::models::NewUser;
    use crate::services::memory::MemoryStore;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_seed_populates_once() {
        let discovery = DiscoveryService::with_default_options(Arc::new(MemoryStore::new()));

        let added = seed_sample_businesses(&discovery).await.unwrap();
        assert_eq!(added, SAMPLE_BUSINESSES.len());

        let again = seed_sample_businesses(&discovery).await.unwrap();
        assert_eq!(again, 0);
    }

    #[tokio::test]
    async fn test_seed_is_verified_and_silent() {
        let store = MemoryStore::new();
        let discovery = DiscoveryService::with_default_options(Arc::new(store.clone()));
        let user = discovery
            .register_user(NewUser {
                name: "Downtown Dana".to_string(),
                email: "dana@users.test".to_string(),
                location: Some(Coordinates::new(43.6532, -79.3832)),
            })
            .await
            .unwrap();

        seed_sample_businesses(&discovery).await.unwrap();

        assert_eq!(store.notification_count().await, 0);
        assert_eq!(discovery.unread_count(user.id).await.unwrap(), 0);
        for id in 1..=SAMPLE_BUSINESSES.len() as i64 {
            assert!(discovery.business(id).await.unwrap().business.verified);
        }
    }

    #[tokio::test]
    async fn test_seeded_businesses_are_discoverable() {
        let discovery = DiscoveryService::with_default_options(Arc::new(MemoryStore::new()));
        seed_sample_businesses(&discovery).await.unwrap();

        let results = discovery
            .find_nearby(NearbyQuery {
                origin: Some(Coordinates::new(43.6532, -79.3832)),
                radius_km: Some(10.0),
                business_type: None,
            })
            .await
            .unwrap();

        let names: Vec<&str> = results.iter().map(|r| r.business.business_name.as_str()).collect();
        assert_eq!(names, vec!["Toronto Glow Spa", "Queen Street Salon", "Yorkville Beauty"]);
        assert_eq!(results[0].services.len(), 2);
    }
}
