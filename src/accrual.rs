//! Pure accrual math for salary streams.
//!
//! Everything here is a deterministic function of the stream record and a
//! caller-supplied instant, so the live-balance display can poll it every
//! second without touching any state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::domain::{Money, Stream};

/// Seconds in a year; the fractional day absorbs leap years.
pub const SECONDS_PER_YEAR: u32 = 31_557_600; // 365.25 * 24 * 3600

pub fn rate_per_second(annual_salary: Money) -> Decimal {
    annual_salary.to_decimal() / Decimal::from(SECONDS_PER_YEAR)
}

/// Amount accrued between the stream's start and `now`, unrounded.
///
/// Clamped to zero before the start so a future-dated stream never
/// accrues negatively.
pub fn earned_to_date(stream: &Stream, now: DateTime<Utc>) -> Decimal {
    let elapsed_ms = (now - stream.start_date).num_milliseconds();
    if elapsed_ms <= 0 {
        return Decimal::ZERO;
    }
    let elapsed_secs = Decimal::from(elapsed_ms) / Decimal::ONE_THOUSAND;
    elapsed_secs * stream.rate_per_second
}

/// Earned minus already-withdrawn, floored at zero and rounded half-up at
/// the cent boundary.
pub fn available_to_withdraw(stream: &Stream, now: DateTime<Utc>) -> Money {
    let available = earned_to_date(stream, now) - stream.total_withdrawn.to_decimal();
    if available <= Decimal::ZERO {
        return Money::zero();
    }
    Money::from_decimal(available).unwrap_or(Money(i64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BusinessId, EmployeeId, StreamId, StreamStatus};
    use chrono::TimeZone;
    use rust_decimal_macros::dec;

    fn stream_with(annual_salary: Money, total_withdrawn: Money) -> Stream {
        let start = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        Stream {
            id: StreamId::generate(),
            business_id: BusinessId("biz".into()),
            employee_id: EmployeeId("emp".into()),
            annual_salary,
            rate_per_second: rate_per_second(annual_salary),
            start_date: start,
            status: StreamStatus::Active,
            total_withdrawn,
            last_withdrawal_at: None,
            created_at: start,
        }
    }

    #[test]
    fn salary_of_one_year_of_seconds_accrues_one_per_second() {
        let stream = stream_with(Money::from_decimal_str("31557600").unwrap(), Money::zero());
        assert_eq!(stream.rate_per_second, dec!(1));

        let now = stream.start_date + chrono::Duration::seconds(100);
        assert_eq!(earned_to_date(&stream, now), dec!(100));
        assert_eq!(available_to_withdraw(&stream, now).to_decimal(), dec!(100));
    }

    #[test]
    fn multiples_of_the_unit_rate_stay_exact() {
        for k in [2i64, 7, 40] {
            let salary = Money(31_557_600 * 100 * k);
            let stream = stream_with(salary, Money::zero());
            let now = stream.start_date + chrono::Duration::seconds(13);
            assert_eq!(earned_to_date(&stream, now), Decimal::from(13 * k));
        }
    }

    #[test]
    fn nothing_accrues_before_the_start_date() {
        let stream = stream_with(Money::from_decimal_str("50000").unwrap(), Money::zero());
        let before = stream.start_date - chrono::Duration::seconds(30);
        assert_eq!(earned_to_date(&stream, before), Decimal::ZERO);
        assert_eq!(available_to_withdraw(&stream, before), Money::zero());
    }

    #[test]
    fn available_floors_at_zero_after_withdrawals() {
        let stream = stream_with(
            Money::from_decimal_str("31557600").unwrap(),
            Money::from_decimal_str("100").unwrap(),
        );
        let now = stream.start_date + chrono::Duration::seconds(50);
        assert_eq!(available_to_withdraw(&stream, now), Money::zero());
    }

    #[test]
    fn available_rounds_half_up_at_the_cent() {
        // 50_000 / 31_557_600 per second; after 1000s earned = 1.58441...
        let stream = stream_with(Money::from_decimal_str("50000").unwrap(), Money::zero());
        let now = stream.start_date + chrono::Duration::seconds(1000);
        assert_eq!(available_to_withdraw(&stream, now).to_decimal(), dec!(1.58));

        // Half-millisecond precision still lands on whole cents.
        let now = stream.start_date + chrono::Duration::milliseconds(1000_500);
        let available = available_to_withdraw(&stream, now);
        assert_eq!(available.to_decimal(), dec!(1.59));
    }
}
