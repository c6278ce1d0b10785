use std::fmt;

use chrono::{DateTime, Utc};

use crate::domain::{
    CategoryTable, Registration, VehicleCategory, registration::InvalidRegistration,
};

/// Stays up to and including this long are free.
const GRACE_PERIOD_MS: u64 = 10 * 60 * 1000;

const HOUR_MS: u64 = 60 * 60 * 1000;

/// A vehicle parked in the garage.
///
/// The arrival time is stamped when the vehicle is placed in a spot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Vehicle {
    registration: Registration,
    category: VehicleCategory,
    arrival: DateTime<Utc>,
}

impl Vehicle {
    /// Creates a vehicle, validating the registration for its category.
    ///
    /// # Errors
    ///
    /// Returns an error if `registration` breaks the category's rule.
    pub fn new(
        category: VehicleCategory,
        registration: &str,
        arrival: DateTime<Utc>,
    ) -> Result<Self, InvalidRegistration> {
        let registration = Registration::parse(category, registration)?;
        Ok(Self::from_parts(registration, category, arrival))
    }

    pub(crate) const fn from_parts(
        registration: Registration,
        category: VehicleCategory,
        arrival: DateTime<Utc>,
    ) -> Self {
        Self {
            registration,
            category,
            arrival,
        }
    }

    /// The vehicle's registration.
    #[must_use]
    pub const fn registration(&self) -> &Registration {
        &self.registration
    }

    /// The vehicle's category.
    #[must_use]
    pub const fn category(&self) -> VehicleCategory {
        self.category
    }

    /// When the vehicle was placed in the garage.
    #[must_use]
    pub const fn arrival(&self) -> DateTime<Utc> {
        self.arrival
    }

    /// The fee owed if the vehicle left at `now`, using the rate configured
    /// for its category.
    #[must_use]
    pub fn fee(&self, rules: &CategoryTable, now: DateTime<Utc>) -> u64 {
        calculate_fee(rules.spec(self.category).hourly_rate, self.arrival, now)
    }

    /// How long the vehicle has been parked at `now`.
    #[must_use]
    pub fn parking_duration(&self, now: DateTime<Utc>) -> ParkingDuration {
        ParkingDuration::between(self.arrival, now)
    }
}

impl fmt::Display for Vehicle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.category.code(), self.registration)
    }
}

/// Computes the fee for a stay from `arrival` to `now`.
///
/// The first ten minutes are free. After that every started hour of the
/// remaining time is charged at `hourly_rate`, with a minimum of one hour.
/// A `now` earlier than `arrival` counts as no time at all.
#[must_use]
pub fn calculate_fee(hourly_rate: u32, arrival: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let elapsed = elapsed_ms(arrival, now);
    if elapsed <= GRACE_PERIOD_MS {
        return 0;
    }
    let hours = (elapsed - GRACE_PERIOD_MS).div_ceil(HOUR_MS).max(1);
    hours.saturating_mul(u64::from(hourly_rate))
}

fn elapsed_ms(arrival: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from((now - arrival).num_milliseconds()).unwrap_or(0)
}

/// Whole hours and leftover minutes of a stay, for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParkingDuration {
    /// Completed hours.
    pub hours: u64,
    /// Minutes past the last completed hour.
    pub minutes: u64,
}

impl ParkingDuration {
    /// The duration from `arrival` to `now`, clamped at zero.
    #[must_use]
    pub fn between(arrival: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let total_minutes = elapsed_ms(arrival, now) / 60_000;
        Self {
            hours: total_minutes / 60,
            minutes: total_minutes % 60,
        }
    }
}

impl fmt::Display for ParkingDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}h {}m", self.hours, self.minutes)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeDelta, TimeZone};

    use super::*;

    fn arrival() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn first_ten_minutes_are_free() {
        let rules = CategoryTable::default();
        for category in VehicleCategory::ALL {
            let rate = rules.spec(category).hourly_rate;
            for minutes in [0, 5, 10] {
                let now = arrival() + TimeDelta::minutes(minutes);
                assert_eq!(calculate_fee(rate, arrival(), now), 0, "{category} {minutes}m");
            }
        }
    }

    #[test]
    fn just_past_grace_period_charges_one_hour() {
        let now = arrival() + TimeDelta::minutes(10) + TimeDelta::seconds(1);
        assert_eq!(calculate_fee(20, arrival(), now), 20);
    }

    #[test]
    fn sixty_one_minutes_on_a_car_costs_one_hour() {
        let car = Vehicle::new(VehicleCategory::Car, "AB123", arrival()).unwrap();
        let now = arrival() + TimeDelta::minutes(61);

        assert_eq!(car.fee(&CategoryTable::default(), now), 20);
    }

    #[test]
    fn every_started_hour_after_grace_is_charged() {
        // 70 minutes charged after the grace period: two started hours.
        let now = arrival() + TimeDelta::minutes(80);
        assert_eq!(calculate_fee(50, arrival(), now), 100);

        // Exactly one hour after the grace period is still one hour.
        let now = arrival() + TimeDelta::minutes(70);
        assert_eq!(calculate_fee(50, arrival(), now), 50);
    }

    #[test]
    fn departure_before_arrival_is_free() {
        let now = arrival() - TimeDelta::hours(3);

        assert_eq!(calculate_fee(20, arrival(), now), 0);
        assert_eq!(
            ParkingDuration::between(arrival(), now),
            ParkingDuration {
                hours: 0,
                minutes: 0
            }
        );
    }

    #[test]
    fn fee_for_extreme_stay_saturates() {
        let fee = calculate_fee(u32::MAX, DateTime::<Utc>::MIN_UTC, DateTime::<Utc>::MAX_UTC);

        assert_eq!(fee, u64::MAX);
    }

    #[test]
    fn duration_splits_hours_and_minutes() {
        let now = arrival() + TimeDelta::minutes(125) + TimeDelta::seconds(59);
        let duration = ParkingDuration::between(arrival(), now);

        assert_eq!(duration.hours, 2);
        assert_eq!(duration.minutes, 5);
        assert_eq!(duration.to_string(), "2h 5m");
    }

    #[test]
    fn display_uses_code_and_registration() {
        let bike = Vehicle::new(VehicleCategory::Bicycle, "bk-7", arrival()).unwrap();
        assert_eq!(bike.to_string(), "BIKE#bk-7");
    }
}
