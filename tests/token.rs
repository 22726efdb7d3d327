use bookstore_api::models::Role;
use bookstore_api::token::{Claims, TokenError, TokenIssuer};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};

#[test]
fn round_trip_preserves_integer_subject() {
    let issuer = TokenIssuer::new("test-secret");
    let token = issuer.issue(42, "alice", Role::Customer).expect("issue");

    let verified = issuer.verify(&token).expect("verify");
    assert_eq!(verified.user_id, 42);
    assert_eq!(verified.username, "alice");
    assert_eq!(verified.role, Role::Customer);

    // Re-issuing from the verified identity yields the same subject again.
    let token2 = issuer
        .issue(verified.user_id, &verified.username, verified.role)
        .expect("reissue");
    let verified2 = issuer.verify(&token2).expect("reverify");
    assert_eq!(verified2.user_id, 42);
}

#[test]
fn expired_token_is_rejected() {
    let issuer = TokenIssuer::new("test-secret");
    let token = issuer
        .issue_with_ttl(7, "bob", Role::Manager, Duration::hours(-1))
        .expect("issue");

    assert_eq!(issuer.verify(&token), Err(TokenError::Expired));
}

#[test]
fn token_signed_with_other_secret_is_rejected() {
    let issuer = TokenIssuer::new("test-secret");
    let other = TokenIssuer::new("other-secret");
    let token = other.issue(7, "bob", Role::Customer).expect("issue");

    assert_eq!(issuer.verify(&token), Err(TokenError::Invalid));
}

#[test]
fn garbage_token_is_rejected() {
    let issuer = TokenIssuer::new("test-secret");
    assert_eq!(issuer.verify("not-a-jwt"), Err(TokenError::Invalid));
}

#[test]
fn non_numeric_subject_is_rejected() {
    let secret = "test-secret";
    let claims = Claims {
        sub: "forty-two".into(),
        username: "alice".into(),
        role: Role::Customer,
        exp: (Utc::now() + Duration::hours(1)).timestamp() as usize,
    };
    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .expect("encode");

    let issuer = TokenIssuer::new(secret);
    assert_eq!(issuer.verify(&token), Err(TokenError::Invalid));
}
