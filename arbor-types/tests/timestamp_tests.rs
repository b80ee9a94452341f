use arbor_types::{Expiration, Timestamp};

// ── Timestamp ────────────────────────────────────────────────────

#[test]
fn now_is_nonzero() {
    assert!(Timestamp::now().as_millis() > 0);
}

#[test]
fn from_millis_round_trips() {
    let ts = Timestamp::from_millis(12_345);
    assert_eq!(ts.as_millis(), 12_345);
}

#[test]
fn plus_millis_shifts_forward() {
    let ts = Timestamp::from_millis(100);
    assert_eq!(ts.plus_millis(50), Timestamp::from_millis(150));
}

#[test]
fn plus_millis_saturates() {
    let ts = Timestamp::from_millis(u64::MAX);
    assert_eq!(ts.plus_millis(1), Timestamp::from_millis(u64::MAX));
}

#[test]
fn ordering_follows_millis() {
    assert!(Timestamp::from_millis(1) < Timestamp::from_millis(2));
}

// ── Expiration::is_expired ───────────────────────────────────────

#[test]
fn never_is_never_expired() {
    assert!(!Expiration::Never.is_expired(Timestamp::from_millis(u64::MAX)));
}

#[test]
fn expired_exactly_at_deadline() {
    let exp = Expiration::At(Timestamp::from_millis(100));
    assert!(exp.is_expired(Timestamp::from_millis(100)));
}

#[test]
fn not_expired_before_deadline() {
    let exp = Expiration::At(Timestamp::from_millis(100));
    assert!(!exp.is_expired(Timestamp::from_millis(99)));
}

#[test]
fn expired_after_deadline() {
    let exp = Expiration::At(Timestamp::from_millis(100));
    assert!(exp.is_expired(Timestamp::from_millis(101)));
}

// ── Expiration::earliest ─────────────────────────────────────────

#[test]
fn earliest_of_two_deadlines_is_min() {
    let t1 = Expiration::At(Timestamp::from_millis(100));
    let t2 = Expiration::At(Timestamp::from_millis(50));
    assert_eq!(t1.earliest(t2), t2);
    assert_eq!(t2.earliest(t1), t2);
}

#[test]
fn never_acts_as_positive_infinity() {
    let deadline = Expiration::At(Timestamp::from_millis(100));
    assert_eq!(Expiration::Never.earliest(deadline), deadline);
    assert_eq!(deadline.earliest(Expiration::Never), deadline);
    assert_eq!(Expiration::Never.earliest(Expiration::Never), Expiration::Never);
}

// ── Ordering ─────────────────────────────────────────────────────

#[test]
fn deadlines_sort_before_never() {
    let deadline = Expiration::At(Timestamp::from_millis(u64::MAX));
    assert!(deadline < Expiration::Never);
}

#[test]
fn deadline_returns_instant() {
    assert_eq!(Expiration::Never.deadline(), None);
    assert_eq!(
        Expiration::At(Timestamp::from_millis(7)).deadline(),
        Some(Timestamp::from_millis(7))
    );
}

#[test]
fn default_is_never() {
    assert_eq!(Expiration::default(), Expiration::Never);
}
