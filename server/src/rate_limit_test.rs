use super::*;

const LIMIT: usize = 3;
const WINDOW: Duration = Duration::from_secs(60);

#[test]
fn allows_up_to_limit() {
    let throttle = LoginThrottle::new(LIMIT, WINDOW);
    let now = Instant::now();

    for i in 0..LIMIT {
        assert!(throttle.check_and_record_at("a@example.com", now).is_ok(), "attempt {i} should succeed");
    }
    assert_eq!(
        throttle.check_and_record_at("a@example.com", now),
        Err(RateLimitError::TooManyAttempts { limit: LIMIT, window_secs: 60 })
    );
}

#[test]
fn keys_are_independent() {
    let throttle = LoginThrottle::new(LIMIT, WINDOW);
    let now = Instant::now();
    for _ in 0..LIMIT {
        throttle.check_and_record_at("a@example.com", now).unwrap();
    }
    assert!(throttle.check_and_record_at("b@example.com", now).is_ok());
}

#[test]
fn window_expiry_allows_again() {
    let throttle = LoginThrottle::new(LIMIT, WINDOW);
    let start = Instant::now();
    for _ in 0..LIMIT {
        throttle.check_and_record_at("a@example.com", start).unwrap();
    }
    assert!(throttle.check_and_record_at("a@example.com", start).is_err());

    let later = start + WINDOW + Duration::from_secs(1);
    assert!(throttle.check_and_record_at("a@example.com", later).is_ok());
}

#[test]
fn reset_clears_key() {
    let throttle = LoginThrottle::new(LIMIT, WINDOW);
    let now = Instant::now();
    for _ in 0..LIMIT {
        throttle.check_and_record_at("a@example.com", now).unwrap();
    }
    throttle.reset("a@example.com");
    assert!(throttle.check_and_record_at("a@example.com", now).is_ok());
}

#[test]
fn zero_limit_disables_throttle() {
    let throttle = LoginThrottle::new(0, WINDOW);
    let now = Instant::now();
    for _ in 0..100 {
        assert!(throttle.check_and_record_at("a@example.com", now).is_ok());
    }
    assert_eq!(throttle.tracked_keys(), 0);
}

#[test]
fn clones_share_counters() {
    let throttle = LoginThrottle::new(1, WINDOW);
    let clone = throttle.clone();
    let now = Instant::now();
    throttle.check_and_record_at("a@example.com", now).unwrap();
    assert!(clone.check_and_record_at("a@example.com", now).is_err());
}
