//! Realistic fixture data for the school client tests.
//!
//! One admin (Alice) and one teacher (Bob), plus the select lists a small
//! primary school would serve.

use app_state::AuthStore;
use payloads::{
    SessionToken, UserId,
    responses::{Role, SelectOption, UserProfile},
};
use uuid::Uuid;

pub const ALICE_TOKEN: &str = "alice-session-token";
pub const BOB_TOKEN: &str = "bob-session-token";

pub fn option(value: &str, label: &str) -> SelectOption {
    SelectOption {
        value: value.into(),
        label: label.into(),
    }
}

pub fn alice_admin() -> UserProfile {
    UserProfile {
        id: UserId(Uuid::from_u128(0xa11ce)),
        name: "Alice Admin".into(),
        email: "alice@school.test".into(),
        role: Role::Admin,
    }
}

pub fn bob_teacher() -> UserProfile {
    UserProfile {
        id: UserId(Uuid::from_u128(0xb0b)),
        name: "Bob Teacher".into(),
        email: "bob@school.test".into(),
        role: Role::Teacher,
    }
}

pub fn student_options() -> Vec<SelectOption> {
    vec![option("1", "Ana"), option("2", "Ben")]
}

pub fn teacher_options() -> Vec<SelectOption> {
    vec![option("10", "Mr. Okafor"), option("11", "Ms. Lindqvist")]
}

pub fn parent_options() -> Vec<SelectOption> {
    vec![
        option("20", "Carla (Ana's mother)"),
        option("21", "David (Ben's father)"),
    ]
}

pub fn class_options() -> Vec<SelectOption> {
    vec![option("30", "Year 3 Blue"), option("31", "Year 4 Green")]
}

/// An auth store with Alice already signed in.
pub fn signed_in_store() -> AuthStore {
    let store = AuthStore::new();
    store.sign_in(alice_admin(), Some(SessionToken::new(ALICE_TOKEN)));
    store
}
