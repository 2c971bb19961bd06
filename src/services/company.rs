use crate::container::Container;
use crate::error::StoreError;
use crate::models::company::{CompanyInfo, StockLocation};

/// Storefront's flagship location.
pub const FLAGSHIP_LOCATION: &str = "The Burrow";

/// Flagship location if it exists, else the oldest one, else none.
pub fn pick_location(locations: Vec<StockLocation>) -> Option<StockLocation> {
    let flagship = locations.iter().position(|l| l.name == FLAGSHIP_LOCATION);
    let mut locations = locations;
    match flagship {
        Some(index) => Some(locations.swap_remove(index)),
        None => locations.into_iter().next(),
    }
}

pub async fn company_info(container: &Container) -> Result<CompanyInfo, StoreError> {
    let locations = container.db.list_stock_locations().await?;
    Ok(CompanyInfo {
        name: container.config.company_name.clone(),
        email: container.config.company_email.clone(),
        location: pick_location(locations),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::company::LocationAddress;

    fn location(name: &str) -> StockLocation {
        StockLocation {
            id: format!("sloc_{}", name.to_lowercase().replace(' ', "_")),
            name: name.to_string(),
            address: LocationAddress::default(),
        }
    }

    #[test]
    fn test_no_locations_means_none() {
        assert_eq!(pick_location(vec![]), None);
    }

    #[test]
    fn test_prefers_flagship_over_older_locations() {
        let picked = pick_location(vec![
            location("Bree Warehouse"),
            location("Rivendell Depot"),
            location(FLAGSHIP_LOCATION),
        ])
        .unwrap();
        assert_eq!(picked.name, FLAGSHIP_LOCATION);
    }

    #[test]
    fn test_falls_back_to_first_location() {
        let picked = pick_location(vec![location("Bree Warehouse"), location("Rivendell Depot")])
            .unwrap();
        assert_eq!(picked.name, "Bree Warehouse");
    }
}
