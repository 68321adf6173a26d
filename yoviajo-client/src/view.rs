use chrono::{DateTime, Utc};
use reqwest::Url;
use yoviajo_core::card::{CardSummary, DIRECTIONS_BASE_URL};
use yoviajo_core::{ActionButton, CardEntity, RouteLink, Viewer};

use crate::listing::{Listings, TripLists};

/// One rendered card: the entity plus everything computed for the viewer.
#[derive(Debug, Clone)]
pub struct CardView {
    pub entity: CardEntity,
    pub action: Option<ActionButton>,
    pub route_url: String,
    pub summary: CardSummary,
}

impl CardView {
    pub fn build(entity: CardEntity, viewer: &Viewer, now: DateTime<Utc>) -> Self {
        let action = entity.primary_action(viewer, now);
        let route_url = route_url(&entity.route_link());
        let summary = entity.summary(viewer, now);
        Self { entity, action, route_url, summary }
    }
}

/// Render a route link as a URL, encoding the place names.
pub fn route_url(link: &RouteLink) -> String {
    match link {
        RouteLink::Provided(url) => url.clone(),
        RouteLink::Directions { origin, destination } => {
            let params = RouteLink::directions_query(origin, destination);
            match Url::parse_with_params(DIRECTIONS_BASE_URL, params.iter()) {
                Ok(url) => url.to_string(),
                Err(_) => DIRECTIONS_BASE_URL.to_string(),
            }
        }
    }
}

pub fn marketplace_cards(listings: &Listings, viewer: &Viewer, now: DateTime<Utc>) -> Vec<CardView> {
    let offers = listings.rides.iter().cloned().map(CardEntity::Offer);
    let requests = listings.requests.iter().cloned().map(CardEntity::Request);
    let matches = listings.matches.iter().cloned().map(CardEntity::Match);

    matches.chain(offers).chain(requests).map(|e| CardView::build(e, viewer, now)).collect()
}

pub fn trip_cards(trips: &TripLists, viewer: &Viewer, now: DateTime<Utc>) -> Vec<CardView> {
    let rides = trips.rides.iter().cloned().map(CardEntity::Offer);
    let bookings = trips.bookings.iter().cloned().map(CardEntity::Booking);
    let requests = trips.requests.iter().cloned().map(CardEntity::Request);

    rides.chain(bookings).chain(requests).map(|e| CardView::build(e, viewer, now)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directions_url_is_encoded() {
        let url = route_url(&RouteLink::Directions {
            origin: "San Carlos de Bariloche".into(),
            destination: "El Bolsón & Lago Puelo".into(),
        });
        assert!(url.starts_with("https://www.google.com/maps/dir/?api=1&origin=San+Carlos+de+Bariloche"));
        assert!(url.contains("destination=El+Bols%C3%B3n+%26+Lago+Puelo"));
        assert!(url.ends_with("travelmode=driving"));
    }

    #[test]
    fn test_provided_url_is_kept() {
        let link = RouteLink::Provided("https://maps.example/r/9".into());
        assert_eq!(route_url(&link), "https://maps.example/r/9");
    }
}
