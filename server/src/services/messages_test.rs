use super::*;
#[cfg(feature = "live-db-tests")]
use crate::state::test_helpers::{live_db, seed_company, seed_user};

fn message(user_id: Uuid, company_id: Uuid, sender: &str) -> Message {
    Message {
        id: Uuid::new_v4(),
        user_id,
        company_id,
        sender: sender.into(),
        body: "Hello".into(),
        read_at: None,
        created_at: OffsetDateTime::now_utc(),
    }
}

#[test]
fn pair_with_orders_ids_by_side() {
    let me = Uuid::new_v4();
    let other = Uuid::new_v4();
    assert_eq!(Party::User(me).pair_with(other), (me, other));
    assert_eq!(Party::Company(me).pair_with(other), (other, me));
}

#[test]
fn recipient_may_mark_read() {
    let user = Uuid::new_v4();
    let company = Uuid::new_v4();
    let msg = message(user, company, "user");
    assert!(check_recipient(Party::Company(company), &msg).is_ok());
}

#[test]
fn sender_may_not_mark_read() {
    let user = Uuid::new_v4();
    let company = Uuid::new_v4();
    let msg = message(user, company, "user");
    assert!(matches!(check_recipient(Party::User(user), &msg), Err(RecordError::Forbidden(_))));
}

#[test]
fn outsiders_get_not_found() {
    let msg = message(Uuid::new_v4(), Uuid::new_v4(), "company");
    assert!(matches!(
        check_recipient(Party::User(Uuid::new_v4()), &msg),
        Err(RecordError::NotFound("message"))
    ));
}

#[test]
fn body_is_required_and_bounded() {
    assert!(validate_body(Some("  ")).is_err());
    assert_eq!(validate_body(Some(" hi ")).unwrap(), "hi");

    let long = "x".repeat(MAX_BODY_CHARS + 1);
    assert!(matches!(validate_body(Some(&long)), Err(RecordError::Invalid(_))));
}

#[test]
fn read_at_serializes_as_null_until_set() {
    let msg = message(Uuid::new_v4(), Uuid::new_v4(), "user");
    let json = serde_json::to_value(&msg).unwrap();
    assert!(json["read_at"].is_null());
    assert_eq!(json["sender"], "user");
}

#[cfg(feature = "live-db-tests")]
#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL/live Postgres"]
async fn mark_read_keeps_first_timestamp() {
    let db = live_db().await;
    let pool = &db.pool;
    let user = seed_user(pool, "ada@linkup.test", &["Rust"], Some(3)).await;
    let company = seed_company(pool, "hr@acme.test").await;

    let sent = send(pool, Party::User(user.id), &NewMessage { to: company.id, body: Some("Hi".into()) })
        .await
        .expect("send");
    assert!(sent.read_at.is_none());

    let first = mark_read(pool, Party::Company(company.id), sent.id).await.expect("mark read");
    let read_at = first.read_at.expect("read_at set");
    let second = mark_read(pool, Party::Company(company.id), sent.id).await.expect("mark read again");
    assert_eq!(second.read_at, Some(read_at));

    assert!(matches!(
        mark_read(pool, Party::User(user.id), sent.id).await,
        Err(RecordError::Forbidden(_))
    ));

    let inbox = list(pool, Party::Company(company.id), &MessageQuery::default()).await.expect("list");
    assert_eq!(inbox.total, 1);
    assert_eq!(inbox.items[0].id, sent.id);
}
