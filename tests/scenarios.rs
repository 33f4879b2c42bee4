//! Store-level scenario tests
//!
//! These exercise the aggregate stores against a live MongoDB instance
//! (MONGODB_URI, default mongodb://localhost:27017) and are ignored by
//! default. Each test runs in its own throwaway database, dropped at the
//! end.
//!
//! Run with: cargo test --test scenarios -- --ignored

use bson::oid::ObjectId;

use parlor::auth::hash_password;
use parlor::db::schemas::{PostDoc, ProfileFields, UserDoc};
use parlor::db::MongoClient;
use parlor::store::{self, PostStore, ProfileStore, UserStore};
use parlor::types::ApiError;

struct TestDb {
    client: MongoClient,
    users: UserStore,
    profiles: ProfileStore,
    posts: PostStore,
}

impl TestDb {
    async fn new() -> Self {
        let uri = std::env::var("MONGODB_URI")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let db_name = format!("parlor_test_{}", ObjectId::new().to_hex());

        let client = MongoClient::new(&uri, &db_name).await.expect("mongo");
        let users = UserStore::new(&client).await.expect("users");
        let profiles = ProfileStore::new(&client).await.expect("profiles");
        let posts = PostStore::new(&client).await.expect("posts");

        Self {
            client,
            users,
            profiles,
            posts,
        }
    }

    async fn register(&self, name: &str, email: &str) -> UserDoc {
        let hash = hash_password("hunter2-hunter2").expect("hash");
        self.users
            .register(UserDoc::new(name.into(), email.into(), hash))
            .await
            .expect("register")
    }

    async fn cleanup(self) {
        self.client
            .inner()
            .database(self.client.db_name())
            .drop()
            .await
            .expect("drop test db");
    }
}

#[tokio::test]
#[ignore = "requires a running MongoDB instance"]
async fn duplicate_email_registration_is_a_conflict() {
    let db = TestDb::new().await;

    let first = db.register("Jane", "jane@example.com").await;
    assert!(first._id.is_some());

    let hash = hash_password("another-password").unwrap();
    let err = db
        .users
        .register(UserDoc::new(
            "Impostor".into(),
            "jane@example.com".into(),
            hash,
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));

    // The rejected registration must not have created a second account
    let found = db.users.find_by_email("jane@example.com").await.unwrap();
    assert_eq!(found.unwrap()._id, first._id);

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB instance"]
async fn post_like_unlike_delete_lifecycle() {
    let db = TestDb::new().await;

    let alice = db.register("Alice", "alice@example.com").await;
    let bob = db.register("Bob", "bob@example.com").await;
    let alice_id = alice._id.unwrap();
    let bob_id = bob._id.unwrap();

    let post = db
        .posts
        .create(PostDoc::new(
            alice_id,
            alice.name.clone(),
            alice.avatar.clone(),
            "hello".into(),
        ))
        .await
        .unwrap();
    let post_id = post._id.unwrap();

    // Bob likes it
    let post = db.posts.like(post_id, bob_id).await.unwrap();
    assert_eq!(post.likes.len(), 1);
    assert_eq!(post.likes[0].user, bob_id);

    // A second like from Bob is rejected and changes nothing
    let err = db.posts.like(post_id, bob_id).await.unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
    let post = db.posts.get(post_id).await.unwrap();
    assert_eq!(post.likes.len(), 1);

    // Bob unlikes it
    let post = db.posts.unlike(post_id, bob_id).await.unwrap();
    assert!(post.likes.is_empty());

    // Unliking again is rejected
    let err = db.posts.unlike(post_id, bob_id).await.unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));

    // Only the author may delete
    let err = db.posts.delete(post_id, bob_id).await.unwrap_err();
    assert!(matches!(err, ApiError::Forbidden(_)));

    db.posts.delete(post_id, alice_id).await.unwrap();
    let err = db.posts.get(post_id).await.unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB instance"]
async fn profile_upsert_merges_partially() {
    let db = TestDb::new().await;

    let jane = db.register("Jane", "jane@example.com").await;
    let jane_id = jane._id.unwrap();

    let created = db
        .profiles
        .upsert(
            jane_id,
            &ProfileFields {
                handle: Some("jdoe".into()),
                status: Some("Developer".into()),
                skills: Some("rust,mongodb".into()),
                bio: Some("hello".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(created.handle, "jdoe");
    assert_eq!(created.skills, vec!["rust", "mongodb"]);

    // Updating one field must leave the others as they were
    let updated = db
        .profiles
        .upsert(
            jane_id,
            &ProfileFields {
                handle: Some("jdoe".into()),
                status: Some("Senior Developer".into()),
                skills: Some("rust,mongodb".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, "Senior Developer");
    assert_eq!(updated.bio.as_deref(), Some("hello"));
    assert_eq!(updated._id, created._id);

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB instance"]
async fn cascade_delete_removes_posts_profile_and_user() {
    let db = TestDb::new().await;

    let jane = db.register("Jane", "jane@example.com").await;
    let jane_id = jane._id.unwrap();

    for text in ["first post", "second post"] {
        db.posts
            .create(PostDoc::new(
                jane_id,
                jane.name.clone(),
                jane.avatar.clone(),
                text.into(),
            ))
            .await
            .unwrap();
    }
    db.profiles
        .upsert(
            jane_id,
            &ProfileFields {
                handle: Some("jdoe".into()),
                status: Some("Developer".into()),
                skills: Some("rust".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    store::delete_account(&db.users, &db.profiles, &db.posts, jane_id)
        .await
        .unwrap();

    assert!(db.posts.find_all().await.unwrap().is_empty());
    assert!(db.profiles.find_by_owner(jane_id).await.unwrap().is_none());
    assert!(db.users.find_by_id(jane_id).await.unwrap().is_none());

    db.cleanup().await;
}

#[tokio::test]
#[ignore = "requires a running MongoDB instance"]
async fn experience_entries_survive_a_round_trip_newest_first() {
    let db = TestDb::new().await;

    let jane = db.register("Jane", "jane@example.com").await;
    let jane_id = jane._id.unwrap();

    db.profiles
        .upsert(
            jane_id,
            &ProfileFields {
                handle: Some("jdoe".into()),
                status: Some("Developer".into()),
                skills: Some("rust".into()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    for title in ["first", "second", "third"] {
        db.profiles
            .add_experience(
                jane_id,
                parlor::db::schemas::ExperienceEntry {
                    title: title.into(),
                    company: "Acme".into(),
                    from: "2020-01-01".into(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    let profile = db.profiles.get_by_owner(jane_id).await.unwrap();
    let titles: Vec<&str> = profile.experience.iter().map(|e| e.title.as_str()).collect();
    assert_eq!(titles, ["third", "second", "first"]);

    // Removing an unknown id is reported and leaves the list alone
    let err = db
        .profiles
        .remove_experience(jane_id, "no-such-entry")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
    let profile = db.profiles.get_by_owner(jane_id).await.unwrap();
    assert_eq!(profile.experience.len(), 3);

    db.cleanup().await;
}
