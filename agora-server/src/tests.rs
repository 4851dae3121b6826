#![cfg(test)]

use std::{fmt::Debug, panic::AssertUnwindSafe, sync::Arc};

use agora_api::{
    Error as ApiError, EventCreated, EventId, EventSummary, Member, NewComment, NewEvent, NewOrg,
    NewPost, NewRating, NewUser, OrgCreated, OrgHeader, OrgId, OrgView, PostCreated, PostId,
    PostView, ReplyId, Session, User, UserId, UserPatch, Visibility,
};
use axum::{
    http::{self, request},
    Router,
};
use chrono::{Duration, Utc};
use tower::{Service, ServiceExt};

use crate::{
    notify::{MemoryMail, Notifier},
    store::Store,
};

fn test_app() -> (Router, Arc<Store>, Arc<MemoryMail>) {
    let store = Store::new();
    let mail = MemoryMail::new();
    let notifier = Notifier::new(mail.clone());
    (crate::app(store.clone(), notifier), store, mail)
}

async fn call<Req, Resp>(
    app: &mut Router,
    req: request::Request<axum::body::Body>,
    req_body: &Req,
) -> Result<Resp, ApiError>
where
    Req: Debug,
    Resp: 'static + for<'de> serde::Deserialize<'de>,
{
    app.ready().await.expect("waiting for app to be ready");
    let resp = app.call(req).await.expect("running request");
    let status = resp.status();
    let body = hyper::body::to_bytes(resp.into_body())
        .await
        .expect("recovering resp bytes");
    if status.is_success() {
        return Ok(serde_json::from_slice(&body).unwrap_or_else(|err| {
            panic!("failed parsing resp body {body:?}: {err}\nrequest was {req_body:?}")
        }));
    }
    Err(ApiError::parse(&body)
        .unwrap_or_else(|err| panic!("parsing error response body {err}, body is {body:?}")))
}

async fn run_on_app<Req, Resp>(
    app: &mut Router,
    method: &str,
    uri: &str,
    body: &Req,
) -> Result<Resp, ApiError>
where
    Req: Debug + serde::Serialize,
    Resp: 'static + for<'de> serde::Deserialize<'de>,
{
    let req = request::Builder::new()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(
            serde_json::to_vec(body).expect("serializing request body to json"),
        ))
        .expect("building request");
    call(app, req, body).await
}

async fn raw_status<Req>(app: &mut Router, method: &str, uri: &str, body: &Req) -> u16
where
    Req: serde::Serialize,
{
    let req = request::Builder::new()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(
            serde_json::to_vec(body).expect("serializing request body to json"),
        ))
        .expect("building request");
    app.ready().await.expect("waiting for app to be ready");
    app.call(req).await.expect("running request").status().as_u16()
}

fn new_user(name: &str) -> NewUser {
    NewUser {
        name: String::from(name),
        email: format!("{}@example.edu", name.to_lowercase()),
        password: String::from("hunter22"),
        age: 21,
    }
}

async fn register(app: &mut Router, name: &str) -> Session {
    run_on_app(app, "POST", "/users/register", &new_user(name))
        .await
        .expect("registering test user")
}

async fn create_org(app: &mut Router, name: &str, owner: UserId) -> OrgId {
    let created: OrgCreated = run_on_app(
        app,
        "POST",
        "/orgs/create",
        &NewOrg {
            name: String::from(name),
            shorthand: name.to_lowercase(),
            bio: String::new(),
            email: String::new(),
            owner,
        },
    )
    .await
    .expect("creating test org");
    created.org_id
}

async fn create_event(app: &mut Router, org: OrgId, creator: UserId) -> EventId {
    create_event_with(app, org, creator, Visibility::Public).await
}

async fn create_event_with(
    app: &mut Router,
    org: OrgId,
    creator: UserId,
    visibility: Visibility,
) -> EventId {
    let start = Utc::now() + Duration::days(7);
    let created: EventCreated = run_on_app(
        app,
        "POST",
        "/events/create",
        &NewEvent {
            title: String::from("Blitz night"),
            description: String::from("5+0 all evening"),
            category: String::from("games"),
            location: String::from("Student union"),
            event_start_datetime: start,
            event_end_datetime: start + Duration::hours(2),
            capacity: None,
            visibility,
            belongs_to_org: org,
            created_by: creator,
        },
    )
    .await
    .expect("creating test event");
    created.event_id
}

async fn create_post(app: &mut Router, author: UserId, event: EventId) -> PostId {
    let created: PostCreated = run_on_app(
        app,
        "POST",
        &format!("/posts/create/{author}"),
        &NewPost {
            title: String::from("Pairings are up"),
            content: String::from("Check the board by the door"),
            event_id: event,
        },
    )
    .await
    .expect("creating test post");
    created.post_id
}

async fn comment(app: &mut Router, post: PostId, author: UserId, content: &str) -> ReplyId {
    let created: agora_api::CommentCreated = run_on_app(
        app,
        "PATCH",
        &format!("/posts/comment/{post}/{author}"),
        &NewComment {
            content: String::from(content),
        },
    )
    .await
    .expect("adding test comment");
    created.reply_id
}

#[tokio::test]
async fn org_follow_round_trip() {
    let (mut app, store, _) = test_app();
    let owner = register(&mut app, "Owner").await;
    let fan = register(&mut app, "Fan").await;
    let org = create_org(&mut app, "Chess", owner.user_id).await;

    let ack: String = run_on_app(
        &mut app,
        "PATCH",
        &format!("/orgs/follow/{org}/{}", fan.user_id),
        &(),
    )
    .await
    .expect("following org");
    assert_eq!(ack, "User is now following the org.");

    let u = store.users.find_one(fan.user_id).await.unwrap();
    let o = store.orgs.find_one(org).await.unwrap();
    assert!(u.following_orgs.contains(&org));
    assert!(o.followers.contains(&fan.user_id));

    let orgs: Vec<OrgHeader> = run_on_app(
        &mut app,
        "GET",
        &format!("/users/user-orgs/{}", fan.user_id),
        &(),
    )
    .await
    .expect("listing followed orgs");
    assert_eq!(orgs.len(), 1);
    assert_eq!(orgs[0].org_id, org);
    assert_eq!(orgs[0].name, "Chess");

    let ack: String = run_on_app(
        &mut app,
        "PATCH",
        &format!("/orgs/unfollow/{org}/{}", fan.user_id),
        &(),
    )
    .await
    .expect("unfollowing org");
    assert_eq!(ack, "User is no longer following the org.");

    let u = store.users.find_one(fan.user_id).await.unwrap();
    let o = store.orgs.find_one(org).await.unwrap();
    assert!(!u.following_orgs.contains(&org));
    assert!(!o.followers.contains(&fan.user_id));
}

#[tokio::test]
async fn org_follow_conflicts_are_typed() {
    let (mut app, store, _) = test_app();
    let owner = register(&mut app, "Owner").await;
    let fan = register(&mut app, "Fan").await;
    let org = create_org(&mut app, "Chess", owner.user_id).await;
    let follow = format!("/orgs/follow/{org}/{}", fan.user_id);

    let _: String = run_on_app(&mut app, "PATCH", &follow, &()).await.unwrap();
    let again: Result<String, ApiError> = run_on_app(&mut app, "PATCH", &follow, &()).await;
    assert_eq!(again, Err(ApiError::AlreadyFollowingOrg));
    let o = store.orgs.find_one(org).await.unwrap();
    assert_eq!(o.followers.iter().filter(|f| **f == fan.user_id).count(), 1);

    let unfollow = format!("/orgs/unfollow/{org}/{}", owner.user_id);
    let _: String = run_on_app(&mut app, "PATCH", &unfollow, &()).await.unwrap();
    let again: Result<String, ApiError> = run_on_app(&mut app, "PATCH", &unfollow, &()).await;
    assert_eq!(again, Err(ApiError::NotFollowingOrg));
}

#[tokio::test]
async fn org_follow_against_missing_org_keeps_forward_edge() {
    let (mut app, store, _) = test_app();
    let fan = register(&mut app, "Fan").await;
    let ghost: OrgId = "ffffffffffffffffffffffff".parse().unwrap();

    let res: Result<String, ApiError> = run_on_app(
        &mut app,
        "PATCH",
        &format!("/orgs/follow/{ghost}/{}", fan.user_id),
        &(),
    )
    .await;
    assert_eq!(res, Err(ApiError::OrgNotFound(ghost)));
    let u = store.users.find_one(fan.user_id).await.unwrap();
    assert!(u.following_orgs.contains(&ghost));

    // running the inverse repairs the half-applied edge
    let res: Result<String, ApiError> = run_on_app(
        &mut app,
        "PATCH",
        &format!("/orgs/unfollow/{ghost}/{}", fan.user_id),
        &(),
    )
    .await;
    assert_eq!(res, Err(ApiError::OrgNotFound(ghost)));
    let u = store.users.find_one(fan.user_id).await.unwrap();
    assert!(!u.following_orgs.contains(&ghost));
}

#[tokio::test]
async fn malformed_ids_never_reach_the_store() {
    let (mut app, store, _) = test_app();
    let fan = register(&mut app, "Fan").await;

    let res: Result<String, ApiError> = run_on_app(
        &mut app,
        "PATCH",
        &format!("/orgs/follow/not-hex-at-all/{}", fan.user_id),
        &(),
    )
    .await;
    assert_eq!(
        res,
        Err(ApiError::InvalidObjectId(String::from("not-hex-at-all")))
    );
    let u = store.users.find_one(fan.user_id).await.unwrap();
    assert!(u.following_orgs.is_empty());

    // 23 hex chars, one short
    let res: Result<User, ApiError> = run_on_app(
        &mut app,
        "GET",
        "/users/user/abcdefabcdefabcdefabcde",
        &(),
    )
    .await;
    assert_eq!(
        res,
        Err(ApiError::InvalidObjectId(String::from(
            "abcdefabcdefabcdefabcde"
        )))
    );
}

#[tokio::test]
async fn rating_flow_updates_in_place() {
    let (mut app, _, _) = test_app();
    let owner = register(&mut app, "Owner").await;
    let raters = [
        register(&mut app, "Ada").await,
        register(&mut app, "Ben").await,
        register(&mut app, "Cas").await,
    ];
    let org = create_org(&mut app, "Chess", owner.user_id).await;

    for (rater, value) in raters.iter().zip([4.0, 5.0, 3.0]) {
        let ack: String = run_on_app(
            &mut app,
            "PATCH",
            &format!("/orgs/rate/{org}/{}", rater.user_id),
            &NewRating { value },
        )
        .await
        .expect("rating org");
        assert_eq!(ack, "Updated Rating");
    }
    let view: OrgView = run_on_app(&mut app, "GET", &format!("/orgs/{org}"), &())
        .await
        .expect("fetching org view");
    assert_eq!(view.ratings.len(), 3);
    assert_eq!(view.average_rating, 4.0);

    // re-rating the middle rater keeps three entries
    let _: String = run_on_app(
        &mut app,
        "PATCH",
        &format!("/orgs/rate/{org}/{}", raters[1].user_id),
        &NewRating { value: 2.0 },
    )
    .await
    .unwrap();
    let view: OrgView = run_on_app(&mut app, "GET", &format!("/orgs/{org}"), &())
        .await
        .unwrap();
    assert_eq!(view.ratings.len(), 3);
    assert_eq!(view.average_rating, 3.0);

    let ack: String = run_on_app(
        &mut app,
        "PATCH",
        &format!("/orgs/unrate/{org}/{}", raters[1].user_id),
        &(),
    )
    .await
    .expect("unrating org");
    assert_eq!(ack, "Removed Rating");
    let view: OrgView = run_on_app(&mut app, "GET", &format!("/orgs/{org}"), &())
        .await
        .unwrap();
    assert_eq!(view.ratings.len(), 2);
    assert_eq!(view.average_rating, 3.5);
}

#[tokio::test]
async fn rating_bounds_apply_to_the_rounded_value() {
    let (mut app, _, _) = test_app();
    let owner = register(&mut app, "Owner").await;
    let org = create_org(&mut app, "Chess", owner.user_id).await;
    let rate = format!("/orgs/rate/{org}/{}", owner.user_id);

    for value in [1.0, 5.0, 0.96, 5.04] {
        let res: Result<String, ApiError> =
            run_on_app(&mut app, "PATCH", &rate, &NewRating { value }).await;
        assert_eq!(res, Ok(String::from("Updated Rating")), "value {value}");
    }
    for value in [0.5, 5.1, 5.05, 0.0, -3.0] {
        let res: Result<String, ApiError> =
            run_on_app(&mut app, "PATCH", &rate, &NewRating { value }).await;
        assert_eq!(res, Err(ApiError::RatingOutOfBounds(value)), "value {value}");
    }

    // the rejected values left the single accepted entry alone
    let view: OrgView = run_on_app(&mut app, "GET", &format!("/orgs/{org}"), &())
        .await
        .unwrap();
    assert_eq!(view.ratings.len(), 1);
    assert_eq!(view.average_rating, 5.0);

    let dee = register(&mut app, "Dee").await;
    let res: Result<String, ApiError> = run_on_app(
        &mut app,
        "PATCH",
        &format!("/orgs/unrate/{org}/{}", dee.user_id),
        &(),
    )
    .await;
    assert_eq!(res, Err(ApiError::NoRatingFound));
}

#[tokio::test]
async fn comment_tree_resolves_names_live() {
    let (mut app, _, _) = test_app();
    let alice = register(&mut app, "Alice").await;
    let bob = register(&mut app, "Bob").await;
    let carol = register(&mut app, "Carol").await;
    let org = create_org(&mut app, "Chess", alice.user_id).await;
    let event = create_event(&mut app, org, alice.user_id).await;
    let post = create_post(&mut app, alice.user_id, event).await;

    let c1 = comment(&mut app, post, bob.user_id, "nice event").await;
    let r1: agora_api::ReplyCreated = run_on_app(
        &mut app,
        "PATCH",
        &format!("/posts/reply/{c1}/{}", carol.user_id),
        &NewComment {
            content: String::from("agreed"),
        },
    )
    .await
    .expect("adding reply");

    let view: PostView = run_on_app(&mut app, "GET", &format!("/posts/post/{post}"), &())
        .await
        .expect("fetching post view");
    assert_eq!(view.post.post_id, post);
    assert_eq!(view.post_author_name.as_deref(), Some("Alice"));
    assert_eq!(view.replies.len(), 1);
    assert_eq!(view.replies[0].reply_id, c1);
    assert_eq!(view.replies[0].author_name.as_deref(), Some("Bob"));
    assert_eq!(view.replies[0].replies.len(), 1);
    assert_eq!(
        view.replies[0].replies[0].comment_reply_id,
        r1.comment_reply_id
    );
    assert_eq!(
        view.replies[0].replies[0].author_name.as_deref(),
        Some("Carol")
    );

    // a rename shows up on the very next read
    let _: String = run_on_app(
        &mut app,
        "PATCH",
        &format!("/users/edit/{}", bob.user_id),
        &UserPatch {
            name: String::from("Robert"),
            age: 22,
        },
    )
    .await
    .expect("renaming commenter");
    let view: PostView = run_on_app(&mut app, "GET", &format!("/posts/post/{post}"), &())
        .await
        .unwrap();
    assert_eq!(view.replies[0].author_name.as_deref(), Some("Robert"));
}

#[tokio::test]
async fn comment_removal_stages_and_cascade() {
    let (mut app, _, _) = test_app();
    let alice = register(&mut app, "Alice").await;
    let bob = register(&mut app, "Bob").await;
    let org = create_org(&mut app, "Chess", alice.user_id).await;
    let event = create_event(&mut app, org, alice.user_id).await;
    let post = create_post(&mut app, alice.user_id, event).await;
    let c1 = comment(&mut app, post, bob.user_id, "first").await;
    let r1: agora_api::ReplyCreated = run_on_app(
        &mut app,
        "PATCH",
        &format!("/posts/reply/{c1}/{}", alice.user_id),
        &NewComment {
            content: String::from("thanks"),
        },
    )
    .await
    .unwrap();

    // container miss first: a fine comment id under the wrong post
    let ghost_post: PostId = "ffffffffffffffffffffffff".parse().unwrap();
    let res: Result<String, ApiError> = run_on_app(
        &mut app,
        "PATCH",
        &format!("/posts/uncomment/{ghost_post}/{c1}"),
        &(),
    )
    .await;
    assert_eq!(res, Err(ApiError::PostNotFound(ghost_post)));

    // then the item miss, under the right post
    let ghost_comment: ReplyId = "eeeeeeeeeeeeeeeeeeeeeeee".parse().unwrap();
    let res: Result<String, ApiError> = run_on_app(
        &mut app,
        "PATCH",
        &format!("/posts/uncomment/{post}/{ghost_comment}"),
        &(),
    )
    .await;
    assert_eq!(res, Err(ApiError::CommentNotFound(ghost_comment)));

    let ack: String = run_on_app(
        &mut app,
        "PATCH",
        &format!("/posts/uncomment/{post}/{c1}"),
        &(),
    )
    .await
    .expect("removing comment");
    assert_eq!(ack, "Comment removed successfully");

    let view: PostView = run_on_app(&mut app, "GET", &format!("/posts/post/{post}"), &())
        .await
        .unwrap();
    assert!(view.replies.is_empty());

    // the embedded reply went down with its comment
    let res: Result<String, ApiError> = run_on_app(
        &mut app,
        "PATCH",
        &format!(
            "/posts/delete-comment-reply/{c1}/{}",
            r1.comment_reply_id
        ),
        &(),
    )
    .await;
    assert_eq!(res, Err(ApiError::CommentNotFound(c1)));
}

#[tokio::test]
async fn replies_never_attach_to_replies() {
    let (mut app, _, _) = test_app();
    let alice = register(&mut app, "Alice").await;
    let org = create_org(&mut app, "Chess", alice.user_id).await;
    let event = create_event(&mut app, org, alice.user_id).await;
    let post = create_post(&mut app, alice.user_id, event).await;
    let c1 = comment(&mut app, post, alice.user_id, "root").await;
    let r1: agora_api::ReplyCreated = run_on_app(
        &mut app,
        "PATCH",
        &format!("/posts/reply/{c1}/{}", alice.user_id),
        &NewComment {
            content: String::from("leaf"),
        },
    )
    .await
    .unwrap();

    // aiming a second reply at the reply's own id only finds a missing
    // comment
    let as_comment: ReplyId = r1.comment_reply_id.to_string().parse().unwrap();
    let res: Result<agora_api::ReplyCreated, ApiError> = run_on_app(
        &mut app,
        "PATCH",
        &format!("/posts/reply/{as_comment}/{}", alice.user_id),
        &NewComment {
            content: String::from("deeper"),
        },
    )
    .await;
    assert_eq!(res, Err(ApiError::CommentNotFound(as_comment)));
}

#[tokio::test]
async fn post_deletion_is_author_scoped_and_cascades() {
    let (mut app, _, _) = test_app();
    let alice = register(&mut app, "Alice").await;
    let bob = register(&mut app, "Bob").await;
    let org = create_org(&mut app, "Chess", alice.user_id).await;
    let event = create_event(&mut app, org, alice.user_id).await;
    let post = create_post(&mut app, alice.user_id, event).await;
    comment(&mut app, post, bob.user_id, "hello").await;

    let res: Result<String, ApiError> = run_on_app(
        &mut app,
        "DELETE",
        &format!("/posts/delete/{}/{post}", bob.user_id),
        &(),
    )
    .await;
    assert_eq!(res, Err(ApiError::PostNotFound(post)));

    let ack: String = run_on_app(
        &mut app,
        "DELETE",
        &format!("/posts/delete/{}/{post}", alice.user_id),
        &(),
    )
    .await
    .expect("deleting own post");
    assert_eq!(ack, "Post deleted successfully.");

    let res: Result<PostView, ApiError> =
        run_on_app(&mut app, "GET", &format!("/posts/post/{post}"), &()).await;
    assert_eq!(res, Err(ApiError::PostNotFound(post)));
}

#[tokio::test]
async fn likes_toggle_and_report_the_list() {
    let (mut app, _, _) = test_app();
    let alice = register(&mut app, "Alice").await;
    let org = create_org(&mut app, "Chess", alice.user_id).await;
    let event = create_event(&mut app, org, alice.user_id).await;
    let post = create_post(&mut app, alice.user_id, event).await;
    let like = format!("/posts/like/{post}/{}", alice.user_id);

    let liked: Vec<UserId> = run_on_app(&mut app, "PATCH", &like, &()).await.unwrap();
    assert_eq!(liked, vec![alice.user_id]);
    let liked: Vec<UserId> = run_on_app(&mut app, "PATCH", &like, &()).await.unwrap();
    assert_eq!(liked, vec![]);
}

#[tokio::test]
async fn register_and_login_flow() {
    let (mut app, _, _) = test_app();
    let session = register(&mut app, "Ada").await;

    let dup: Result<Session, ApiError> =
        run_on_app(&mut app, "POST", "/users/register", &new_user("Ada")).await;
    assert_eq!(
        dup,
        Err(ApiError::EmailAlreadyRegistered(String::from(
            "ada@example.edu"
        )))
    );

    let back: Session = run_on_app(
        &mut app,
        "POST",
        "/users/login",
        &agora_api::Credentials {
            email: String::from("Ada@Example.edu"),
            password: String::from("hunter22"),
        },
    )
    .await
    .expect("logging in");
    assert_eq!(back, session);

    let wrong: Result<Session, ApiError> = run_on_app(
        &mut app,
        "POST",
        "/users/login",
        &agora_api::Credentials {
            email: String::from("ada@example.edu"),
            password: String::from("hunter23"),
        },
    )
    .await;
    assert_eq!(wrong, Err(ApiError::IncorrectPassword));

    let unknown: Result<Session, ApiError> = run_on_app(
        &mut app,
        "POST",
        "/users/login",
        &agora_api::Credentials {
            email: String::from("nobody@example.edu"),
            password: String::from("hunter22"),
        },
    )
    .await;
    assert_eq!(
        unknown,
        Err(ApiError::EmailNotFound(String::from("nobody@example.edu")))
    );

    let short: Result<Session, ApiError> = run_on_app(
        &mut app,
        "POST",
        "/users/register",
        &NewUser {
            password: String::from("abc"),
            ..new_user("Eve")
        },
    )
    .await;
    assert_eq!(short, Err(ApiError::PasswordTooShort));
}

#[tokio::test]
async fn event_join_leave_round_trip() {
    let (mut app, store, _) = test_app();
    let owner = register(&mut app, "Owner").await;
    let dana = register(&mut app, "Dana").await;
    let org = create_org(&mut app, "Chess", owner.user_id).await;
    let event = create_event(&mut app, org, owner.user_id).await;

    let ack: String = run_on_app(
        &mut app,
        "PATCH",
        &format!("/events/follow/{event}/{}", dana.user_id),
        &(),
    )
    .await
    .expect("joining event");
    assert_eq!(ack, "User is now following the event.");

    let e: agora_api::Event = run_on_app(&mut app, "GET", &format!("/events/{event}"), &())
        .await
        .unwrap();
    assert!(e
        .users_interested
        .iter()
        .any(|i| i.user_id == dana.user_id && i.name == "Dana"));

    let again: Result<String, ApiError> = run_on_app(
        &mut app,
        "PATCH",
        &format!("/events/follow/{event}/{}", dana.user_id),
        &(),
    )
    .await;
    assert_eq!(again, Err(ApiError::AlreadyJoinedEvent));

    let attended: Vec<EventSummary> = run_on_app(
        &mut app,
        "GET",
        &format!("/users/user-attended-events/{}", dana.user_id),
        &(),
    )
    .await
    .expect("listing attended events");
    assert_eq!(attended.len(), 1);
    assert_eq!(attended[0].event_id, event);

    let ack: String = run_on_app(
        &mut app,
        "PATCH",
        &format!("/events/unfollow/{event}/{}", dana.user_id),
        &(),
    )
    .await
    .expect("leaving event");
    assert_eq!(ack, "User is no longer following the event.");
    let u = store.users.find_one(dana.user_id).await.unwrap();
    assert!(!u.interested_event_history.contains(&event));

    let again: Result<String, ApiError> = run_on_app(
        &mut app,
        "PATCH",
        &format!("/events/unfollow/{event}/{}", dana.user_id),
        &(),
    )
    .await;
    assert_eq!(again, Err(ApiError::NotJoinedEvent));
}

#[tokio::test]
async fn event_creation_wires_creator_org_and_emails() {
    let (mut app, store, mail) = test_app();
    let owner = register(&mut app, "Owner").await;
    let fan = register(&mut app, "Fan").await;
    let org = create_org(&mut app, "Chess", owner.user_id).await;
    let _: String = run_on_app(
        &mut app,
        "PATCH",
        &format!("/orgs/follow/{org}/{}", fan.user_id),
        &(),
    )
    .await
    .unwrap();

    let event = create_event(&mut app, org, owner.user_id).await;

    let u = store.users.find_one(owner.user_id).await.unwrap();
    assert!(u.hosted_events.contains(&event));
    assert!(u.interested_event_history.contains(&event));
    let o = store.orgs.find_one(org).await.unwrap();
    assert!(o.events.contains(&event));

    // delivery is spawned off the request, poll for it
    let mut delivered = mail.sent();
    for _ in 0..50 {
        if delivered.len() >= 2 {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        delivered = mail.sent();
    }
    let mut to: Vec<String> = delivered.iter().map(|m| m.to.clone()).collect();
    to.sort();
    assert_eq!(to, vec!["fan@example.edu", "owner@example.edu"]);
    assert_eq!(delivered[0].subject, "Chess created a new event!");
}

#[tokio::test]
async fn event_listing_hides_private_events() {
    let (mut app, _, _) = test_app();
    let owner = register(&mut app, "Owner").await;
    let org = create_org(&mut app, "Chess", owner.user_id).await;
    let public = create_event(&mut app, org, owner.user_id).await;
    let private = create_event_with(&mut app, org, owner.user_id, Visibility::Private).await;

    let listed: Vec<agora_api::Event> = run_on_app(&mut app, "GET", "/events", &())
        .await
        .expect("listing events");
    let ids: Vec<EventId> = listed.iter().map(|e| e.event_id).collect();
    assert!(ids.contains(&public));
    assert!(!ids.contains(&private));

    // still reachable directly
    let e: agora_api::Event = run_on_app(&mut app, "GET", &format!("/events/{private}"), &())
        .await
        .expect("fetching private event by id");
    assert_eq!(e.event_id, private);
}

#[tokio::test]
async fn org_deletion_scrubs_membership_edges() {
    let (mut app, store, _) = test_app();
    let owner = register(&mut app, "Owner").await;
    let fan = register(&mut app, "Fan").await;
    let org = create_org(&mut app, "Chess", owner.user_id).await;
    let _: String = run_on_app(
        &mut app,
        "PATCH",
        &format!("/orgs/follow/{org}/{}", fan.user_id),
        &(),
    )
    .await
    .unwrap();

    let ack: String = run_on_app(&mut app, "DELETE", &format!("/orgs/delete/{org}"), &())
        .await
        .expect("deleting org");
    assert_eq!(ack, "Org deleted.");

    for user in [owner.user_id, fan.user_id] {
        let u = store.users.find_one(user).await.unwrap();
        assert!(!u.following_orgs.contains(&org));
    }
    let res: Result<OrgView, ApiError> =
        run_on_app(&mut app, "GET", &format!("/orgs/{org}"), &()).await;
    assert_eq!(res, Err(ApiError::OrgNotFound(org)));
}

#[tokio::test]
async fn member_listing_dedups_owner_first() {
    let (mut app, store, _) = test_app();
    let owner = register(&mut app, "Owner").await;
    let fan = register(&mut app, "Fan").await;
    let org = create_org(&mut app, "Chess", owner.user_id).await;
    let _: String = run_on_app(
        &mut app,
        "PATCH",
        &format!("/orgs/follow/{org}/{}", fan.user_id),
        &(),
    )
    .await
    .unwrap();
    // owner doubles as contributor, which must not duplicate them
    store
        .orgs
        .update_one(org, |o| {
            o.contributors.push(owner.user_id);
            true
        })
        .await;

    let members: Vec<Member> = run_on_app(&mut app, "GET", &format!("/orgs/members/{org}"), &())
        .await
        .expect("listing members");
    let names: Vec<&str> = members.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, vec!["Owner", "Fan"]);
}

#[tokio::test]
async fn wire_statuses_match_the_route_table() {
    let (mut app, _, _) = test_app();
    assert_eq!(
        raw_status(&mut app, "POST", "/users/register", &new_user("Ada")).await,
        201
    );
    let session: Session = run_on_app(
        &mut app,
        "POST",
        "/users/login",
        &agora_api::Credentials {
            email: String::from("ada@example.edu"),
            password: String::from("hunter22"),
        },
    )
    .await
    .unwrap();
    let org = create_org(&mut app, "Chess", session.user_id).await;

    let follow = format!("/orgs/follow/{org}/{}", session.user_id);
    // the owner already follows their own org, so this is the conflict path
    assert_eq!(raw_status(&mut app, "PATCH", &follow, &()).await, 500);
    assert_eq!(
        raw_status(
            &mut app,
            "PATCH",
            &format!("/orgs/follow/ffffffffffffffffffffffff/{}", session.user_id),
            &()
        )
        .await,
        404
    );
    assert_eq!(
        raw_status(&mut app, "PATCH", &format!("/orgs/follow/junk/{}", session.user_id), &())
            .await,
        400
    );
    assert_eq!(
        raw_status(
            &mut app,
            "POST",
            "/users/login",
            &agora_api::Credentials {
                email: String::from("ada@example.edu"),
                password: String::from("wrong-password"),
            }
        )
        .await,
        401
    );
    assert_eq!(
        raw_status(
            &mut app,
            "PATCH",
            &format!("/orgs/unrate/{org}/{}", session.user_id),
            &()
        )
        .await,
        500
    );
}

macro_rules! do_tokio_test {
    ( $name:ident, $typ:ty, $fn:expr ) => {
        #[test]
        fn $name() {
            let runtime = AssertUnwindSafe(
                tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                    .expect("failed initializing tokio runtime"),
            );
            bolero::check!()
                .with_type::<$typ>()
                .cloned()
                .for_each(move |v| {
                    let () = runtime.block_on($fn(v));
                })
        }
    };
}

do_tokio_test!(fuzz_user_id_path_parsing, String, |id: String| async move {
    let (mut app, _store, _mail) = test_app();
    if let Ok(req) = request::Builder::new()
        .method("GET")
        .uri(format!("/users/user/{id}"))
        .body(axum::body::Body::empty())
    {
        app.ready().await.expect("waiting for app to be ready");
        let resp = app.call(req).await.expect("running request");
        let status = resp.status().as_u16();
        let body = hyper::body::to_bytes(resp.into_body())
            .await
            .expect("recovering resp bytes");
        match status {
            400 => {
                let err = ApiError::parse(&body).expect("parsing error body");
                assert!(
                    matches!(err, ApiError::InvalidObjectId(_)),
                    "unexpected 400: {err:?}"
                );
            }
            // no route matched: the id segment was empty or contained a slash
            404 if body.is_empty() => (),
            404 => {
                let err = ApiError::parse(&body).expect("parsing error body");
                assert!(
                    matches!(err, ApiError::UserNotFound(_)),
                    "unexpected 404: {err:?}"
                );
            }
            s => panic!("unexpected status {s} for id {id:?}"),
        }
    }
});
