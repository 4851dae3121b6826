mod events;
mod orgs;
mod posts;
mod users;

pub use events::{
    create_event, delete_event, follow_event, get_event, list_events, unfollow_event,
    update_event, user_events,
};
pub use orgs::{
    create_org, delete_org, follow_org, get_org, list_orgs, org_members, orgs_followed_by,
    orgs_owned_by, rate_org, unfollow_org, unrate_org, update_org,
};
pub use posts::{
    comment_post, create_post, delete_comment_reply, delete_post, get_post, like_post,
    list_posts, org_posts, reply_to_comment, uncomment_post, user_posts,
};
pub use users::{attended_events, edit_user, get_user, login, register, update_notifs, user_orgs};
