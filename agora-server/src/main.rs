use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    routing::{delete, get, patch, post},
    Router,
};
use structopt::StructOpt;
use tower_http::trace::TraceLayer;

mod comments;
mod error;
mod handlers;
mod notify;
mod ratings;
mod relations;
mod store;
mod tests;

pub use error::Error;

use notify::{LogMail, Notifier};
use store::Store;

#[derive(Clone, axum::extract::FromRef)]
pub struct AppState {
    pub store: Arc<Store>,
    pub notifier: Notifier,
}

pub fn app(store: Arc<Store>, notifier: Notifier) -> Router {
    Router::new()
        .route("/users/register", post(handlers::register))
        .route("/users/login", post(handlers::login))
        .route("/users/user/:userId", get(handlers::get_user))
        .route("/users/user-orgs/:userId", get(handlers::user_orgs))
        .route(
            "/users/user-attended-events/:userId",
            get(handlers::attended_events),
        )
        .route("/users/edit/:userId", patch(handlers::edit_user))
        .route(
            "/users/update-user-notif-prefs/:userId",
            patch(handlers::update_notifs),
        )
        .route("/orgs", get(handlers::list_orgs))
        .route("/orgs/create", post(handlers::create_org))
        .route("/orgs/members/:orgId", get(handlers::org_members))
        .route("/orgs/owner/:userId", get(handlers::orgs_owned_by))
        .route("/orgs/following/:userId", get(handlers::orgs_followed_by))
        .route("/orgs/update/:orgId", patch(handlers::update_org))
        .route("/orgs/delete/:orgId", delete(handlers::delete_org))
        .route("/orgs/follow/:orgId/:userId", patch(handlers::follow_org))
        .route("/orgs/unfollow/:orgId/:userId", patch(handlers::unfollow_org))
        .route("/orgs/rate/:orgId/:userId", patch(handlers::rate_org))
        .route("/orgs/unrate/:orgId/:userId", patch(handlers::unrate_org))
        .route("/orgs/:orgId", get(handlers::get_org))
        .route("/events", get(handlers::list_events))
        .route("/events/create", post(handlers::create_event))
        .route("/events/user-events/:userId", get(handlers::user_events))
        .route("/events/update/:eventId", patch(handlers::update_event))
        .route("/events/delete/:eventId", delete(handlers::delete_event))
        .route(
            "/events/follow/:eventId/:userId",
            patch(handlers::follow_event),
        )
        .route(
            "/events/unfollow/:eventId/:userId",
            patch(handlers::unfollow_event),
        )
        .route("/events/:eventId", get(handlers::get_event))
        .route("/posts", get(handlers::list_posts))
        .route("/posts/create/:userId", post(handlers::create_post))
        .route("/posts/post/:postId", get(handlers::get_post))
        .route("/posts/orgPosts/:orgId", get(handlers::org_posts))
        .route("/posts/delete/:userId/:postId", delete(handlers::delete_post))
        .route("/posts/like/:postId/:userId", patch(handlers::like_post))
        .route("/posts/comment/:postId/:userId", patch(handlers::comment_post))
        .route(
            "/posts/uncomment/:postId/:replyId",
            patch(handlers::uncomment_post),
        )
        .route("/posts/reply/:replyId/:userId", patch(handlers::reply_to_comment))
        .route(
            "/posts/delete-comment-reply/:replyId/:commentReplyId",
            patch(handlers::delete_comment_reply),
        )
        .route("/posts/:userId", get(handlers::user_posts))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState { store, notifier })
}

#[derive(Debug, StructOpt)]
#[structopt(
    name = "agora-server",
    about = "Backend for the campus org and event board"
)]
struct Opt {
    /// Address to listen on
    #[structopt(short, long, default_value = "127.0.0.1:8080")]
    listen: SocketAddr,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let opt = Opt::from_args();
    let store = Store::new();
    let notifier = Notifier::new(Arc::new(LogMail));
    notify::spawn_reminder_loop(notifier.clone(), store.clone());

    let app = app(store, notifier);
    tracing::info!("listening on {}", opt.listen);
    axum::Server::bind(&opt.listen)
        .serve(app.into_make_service())
        .await
        .context("serving axum webserver")
}
