use crate::{AdmissionDecision, CounterKey, HitpoolError, RemoteTimeoutMs, TtlSeconds};

#[test]
fn counter_key_try_from_validates_shape() {
    let k = CounterKey::try_from("user_123").unwrap();
    assert_eq!(&*k, "user_123");
    assert_eq!(k.to_string(), "user_123");

    assert_eq!(
        CounterKey::try_from("").unwrap_err().to_string(),
        "invalid counter key: counter key must not be empty"
    );
    assert_eq!(
        CounterKey::try_from("a:b").unwrap_err().to_string(),
        "invalid counter key: counter key must not contain colons"
    );
    assert!(matches!(
        CounterKey::try_from("x".repeat(256)),
        Err(HitpoolError::InvalidCounterKey(_))
    ));
    assert!(CounterKey::try_from("x".repeat(255)).is_ok());
}

#[test]
fn counter_key_qualifies_under_prefix() {
    let prefix = CounterKey::default_prefix();
    assert_eq!(prefix.qualify("search"), "hitpool:search");

    // Only the prefix is restricted; keys may carry their own separators.
    let prefix = CounterKey::try_from("myapp".to_string()).unwrap();
    assert_eq!(prefix.qualify("user:42"), "myapp:user:42");
}

#[test]
fn ttl_seconds_default_and_try_from_validate_positive() {
    let d = TtlSeconds::default();
    assert_eq!(*d, 3600);
    assert_eq!(d.as_duration().as_secs(), 3600);

    assert_eq!(*TtlSeconds::try_from(1).unwrap(), 1);
    assert!(matches!(
        TtlSeconds::try_from(0),
        Err(HitpoolError::InvalidTtlSeconds(_))
    ));
}

#[test]
fn remote_timeout_ms_try_from_validates_nonzero() {
    let t = RemoteTimeoutMs::try_from(250).unwrap();
    assert_eq!(*t, 250);
    assert_eq!(t.as_duration().as_millis(), 250);

    assert_eq!(
        RemoteTimeoutMs::try_from(0).unwrap_err().to_string(),
        "invalid remote timeout: remote timeout must be greater than 0"
    );
}

#[test]
fn admission_decision_is_allowed() {
    assert!(AdmissionDecision::Allowed.is_allowed());
    assert!(
        AdmissionDecision::AllowedUnsynced {
            error: HitpoolError::RemoteUnavailable("down".to_string()),
        }
        .is_allowed()
    );
    assert!(!AdmissionDecision::Rejected.is_allowed());
}
