use serde::{Deserialize, Serialize};

use crate::card::FUEL_PRICE_PER_LITRE;
use crate::models::Ride;
use crate::payloads::{MAX_SEATS_PER_BOOKING, MIN_SEATS_PER_BOOKING};
use crate::{CoreError, CoreResult};

/// Platform fee as a fraction of the fuel cost.
pub const PLATFORM_FEE_RATE: f64 = 0.10;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TripCost {
    pub seats: i32,
    pub liters_per_seat: f64,
    pub total_liters: f64,
    /// Paid to the driver on the day of the trip.
    pub fuel_cost: f64,
    /// Paid online when reserving.
    pub platform_fee: f64,
}

impl TripCost {
    pub fn for_ride(ride: &Ride, seats: i32) -> CoreResult<Self> {
        if !(MIN_SEATS_PER_BOOKING..=MAX_SEATS_PER_BOOKING).contains(&seats) {
            return Err(CoreError::ValidationError(format!(
                "seats must be between {} and {}",
                MIN_SEATS_PER_BOOKING, MAX_SEATS_PER_BOOKING
            )));
        }

        let liters_per_seat = match ride.price_per_seat_liters {
            Some(l) if l > 0.0 => l,
            _ => ride.price / FUEL_PRICE_PER_LITRE,
        };
        let total_liters = liters_per_seat * seats as f64;
        let fuel_cost = (total_liters * FUEL_PRICE_PER_LITRE).round();
        let platform_fee = (fuel_cost * PLATFORM_FEE_RATE).round();

        Ok(Self { seats, liters_per_seat, total_liters, fuel_cost, platform_fee })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ride(price: f64, liters: Option<f64>) -> Ride {
        let mut ride: Ride = serde_json::from_value(serde_json::json!({
            "id": 1, "origin": "A", "destination": "B",
            "departure_time": "2025-05-01T08:30:00",
            "price": price, "available_seats": 4, "driver_id": 2
        }))
        .unwrap();
        ride.price_per_seat_liters = liters;
        ride
    }

    #[test]
    fn test_cost_from_price() {
        let cost = TripCost::for_ride(&ride(17500.0, None), 2).unwrap();
        assert_eq!(cost.liters_per_seat, 10.0);
        assert_eq!(cost.fuel_cost, 35000.0);
        assert_eq!(cost.platform_fee, 3500.0);
    }

    #[test]
    fn test_cost_prefers_liters_field() {
        let cost = TripCost::for_ride(&ride(0.0, Some(4.0)), 1).unwrap();
        assert_eq!(cost.fuel_cost, 7000.0);
        assert_eq!(cost.platform_fee, 700.0);
    }

    #[test]
    fn test_seat_range() {
        assert!(TripCost::for_ride(&ride(1000.0, None), 0).is_err());
        assert!(TripCost::for_ride(&ride(1000.0, None), 11).is_err());
    }
}
