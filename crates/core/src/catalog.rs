//! Demo businesses backing the synthesized data source.

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DemoBusiness {
    pub id: &'static str,
    pub name: &'static str,
    pub address: &'static str,
    pub average_rating: f64,
    pub products: &'static [&'static str],
}

pub const DEMO_BUSINESSES: [DemoBusiness; 3] = [
    DemoBusiness {
        id: "b1",
        name: "Apex Coffee Roasters",
        address: "123 Market St, San Francisco, CA",
        average_rating: 4.8,
        products: &[
            "Pour-over Coffee",
            "Avocado Toast",
            "Oat Milk Latte",
            "Cold Brew",
            "Croissants",
            "Espresso Flight",
        ],
    },
    DemoBusiness {
        id: "b2",
        name: "Modern Dental Studio",
        address: "450 Sutter St, San Francisco, CA",
        average_rating: 4.9,
        products: &[
            "Invisalign",
            "Teeth Whitening",
            "Dental Implants",
            "Veneers",
            "Root Canal",
            "Emergency Exam",
        ],
    },
    DemoBusiness {
        id: "ChIJUQvj6h-vK4cRVPaPZQIQOl0",
        name: "Snow Family Dentistry",
        address: "4420 E Baseline Rd #111, Mesa, AZ 85206",
        average_rating: 5.0,
        products: &[
            "Dental Implants",
            "Cosmetic Dentistry",
            "Invisalign",
            "Crowns",
            "Veneers",
            "Emergency Dentistry",
        ],
    },
];

pub fn find(business_id: &str) -> Option<&'static DemoBusiness> {
    DEMO_BUSINESSES.iter().find(|business| business.id == business_id)
}

/// Catalog entry for `business_id`, or the first entry for unknown ids.
pub fn resolve(business_id: &str) -> &'static DemoBusiness {
    find(business_id).unwrap_or(&DEMO_BUSINESSES[0])
}

#[cfg(test)]
mod tests {
    use super::{find, resolve};

    #[test]
    fn unknown_ids_resolve_to_first_demo_business() {
        assert!(find("unknown").is_none());
        assert_eq!(resolve("unknown").name, "Apex Coffee Roasters");
        assert_eq!(resolve("b2").name, "Modern Dental Studio");
    }
}
