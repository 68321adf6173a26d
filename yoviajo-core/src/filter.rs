use serde::{Deserialize, Serialize};

use crate::models::{Ride, RideRequest};

/// Search box state on the dashboard. Empty fields match everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingFilter {
    #[serde(default)]
    pub origin: String,
    #[serde(default)]
    pub destination: String,
    /// `YYYY-MM-DD`, or any prefix of it.
    #[serde(default)]
    pub date: String,
}

impl ListingFilter {
    pub fn is_empty(&self) -> bool {
        self.origin.trim().is_empty() && self.destination.trim().is_empty() && self.date.trim().is_empty()
    }

    fn matches(&self, origin: &str, destination: &str, date: &str) -> bool {
        contains_ci(origin, &self.origin)
            && contains_ci(destination, &self.destination)
            && date.starts_with(self.date.trim())
    }

    pub fn matches_ride(&self, ride: &Ride) -> bool {
        let date = ride.departure_time.split('T').next().unwrap_or_default();
        self.matches(&ride.origin, &ride.destination, date)
    }

    pub fn matches_request(&self, request: &RideRequest) -> bool {
        self.matches(&request.origin, &request.destination, &request.date)
    }

    pub fn apply_rides<'a>(&self, rides: &'a [Ride]) -> Vec<&'a Ride> {
        rides.iter().filter(|r| self.matches_ride(r)).collect()
    }

    pub fn apply_requests<'a>(&self, requests: &'a [RideRequest]) -> Vec<&'a RideRequest> {
        requests.iter().filter(|r| self.matches_request(r)).collect()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    let needle = needle.trim();
    needle.is_empty() || haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ride(origin: &str, destination: &str, departure: &str) -> Ride {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "origin": origin,
            "destination": destination,
            "departure_time": departure,
            "price": 1000,
            "available_seats": 2,
            "driver_id": 3
        }))
        .unwrap()
    }

    fn request(origin: &str, destination: &str, date: &str) -> RideRequest {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "passenger_id": 4,
            "origin": origin,
            "destination": destination,
            "date": date
        }))
        .unwrap()
    }

    #[test]
    fn test_case_insensitive_substring() {
        let filter = ListingFilter { origin: "córd".into(), destination: "ROSA".into(), date: String::new() };
        assert!(filter.matches_ride(&ride("Córdoba Capital", "Rosario", "2025-05-01T08:30:00")));
        assert!(!filter.matches_ride(&ride("Mendoza", "Rosario", "2025-05-01T08:30:00")));
    }

    #[test]
    fn test_date_prefix_uses_departure_date_for_rides() {
        let filter = ListingFilter { date: "2025-05".into(), ..Default::default() };
        assert!(filter.matches_ride(&ride("A", "B", "2025-05-01T08:30:00")));
        assert!(!filter.matches_ride(&ride("A", "B", "2025-06-01T08:30:00")));
        assert!(filter.matches_request(&request("A", "B", "2025-05-20")));
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let filter = ListingFilter::default();
        assert!(filter.is_empty());
        let rides = vec![ride("A", "B", "2025-05-01T08:30:00"), ride("C", "D", "")];
        assert_eq!(filter.apply_rides(&rides).len(), 2);
    }
}
