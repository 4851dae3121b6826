use agora_api::{
    CommentCreated, EventCreated, NewComment, NewEvent, NewOrg, NewPost, NewRating, NewUser,
    OrgCreated, PostCreated, ReplyCreated, Session, UserId, Visibility,
};
use anyhow::Context;
use chrono::{Duration, Utc};
use rand::Rng;

#[derive(structopt::StructOpt)]
struct Opt {
    #[structopt(short, long)]
    host: String,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(structopt::StructOpt)]
enum Command {
    /// Register a user
    RegisterUser {
        /// Display name
        name: String,

        /// Email address
        email: String,

        /// Initial password
        password: String,

        /// Age in years
        #[structopt(default_value = "21")]
        age: u32,
    },

    /// Create an org owned by an existing user
    CreateOrg {
        /// Org name
        name: String,

        /// Short tag shown in listings
        shorthand: String,

        /// The owner's user id
        owner: UserId,
    },

    /// Fill a fresh backend with lorem-ipsum demo data
    Seed {
        /// Number of users to register
        #[structopt(long, default_value = "8")]
        users: usize,

        /// Number of orgs to create
        #[structopt(long, default_value = "3")]
        orgs: usize,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let opt = <Opt as structopt::StructOpt>::from_args();

    let client = reqwest::Client::new();

    match opt.cmd {
        Command::RegisterUser {
            name,
            email,
            password,
            age,
        } => {
            let session = client
                .post(format!("{}/users/register", opt.host))
                .json(&NewUser {
                    name,
                    email,
                    password,
                    age,
                })
                .send()
                .await?
                .error_for_status()?
                .json::<Session>()
                .await?;
            println!("{}", session.user_id);
        }
        Command::CreateOrg {
            name,
            shorthand,
            owner,
        } => {
            let created = client
                .post(format!("{}/orgs/create", opt.host))
                .json(&NewOrg {
                    name,
                    shorthand,
                    bio: String::new(),
                    email: String::new(),
                    owner,
                })
                .send()
                .await?
                .error_for_status()?
                .json::<OrgCreated>()
                .await?;
            println!("{}", created.org_id);
        }
        Command::Seed { users, orgs } => seed(&client, &opt.host, users, orgs).await?,
    }

    Ok(())
}

const ORG_NAMES: &[(&str, &str)] = &[
    ("Chess Club", "chess"),
    ("Robotics Society", "robotics"),
    ("Hiking Collective", "hiking"),
    ("Debate Union", "debate"),
    ("Film Forum", "film"),
    ("Astronomy Circle", "astro"),
];

const CATEGORIES: &[&str] = &["social", "tech", "outdoors", "arts"];

async fn seed(
    client: &reqwest::Client,
    host: &str,
    users: usize,
    orgs: usize,
) -> anyhow::Result<()> {
    if users == 0 {
        anyhow::bail!("seeding needs at least one user");
    }
    let mut rng = rand::thread_rng();

    let mut sessions = Vec::new();
    for i in 0..users {
        let session = client
            .post(format!("{host}/users/register"))
            .json(&NewUser {
                name: lipsum::lipsum_title(),
                email: format!("seed-user-{i}@example.edu"),
                password: String::from("demo-password"),
                age: rng.gen_range(18..=30),
            })
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("registering seed user {i}"))?
            .json::<Session>()
            .await?;
        println!("user {} ({})", session.user_id, session.name);
        sessions.push(session);
    }

    let mut org_list = Vec::new();
    for i in 0..orgs {
        let (name, tag) = ORG_NAMES[i % ORG_NAMES.len()];
        let owner = &sessions[rng.gen_range(0..sessions.len())];
        let created = client
            .post(format!("{host}/orgs/create"))
            .json(&NewOrg {
                name: String::from(name),
                shorthand: format!("{tag}{i}"),
                bio: lipsum::lipsum(18),
                email: format!("{tag}{i}@example.edu"),
                owner: owner.user_id,
            })
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("creating seed org {name}"))?
            .json::<OrgCreated>()
            .await?;
        println!("org {} ({})", created.org_id, name);
        org_list.push((created.org_id, owner.user_id));
    }

    // owners already follow their own org, re-following would conflict
    for (org, owner) in &org_list {
        for session in &sessions {
            if session.user_id != *owner && rng.gen_bool(0.5) {
                client
                    .patch(format!("{host}/orgs/follow/{org}/{}", session.user_id))
                    .send()
                    .await?
                    .error_for_status()?;
            }
        }
    }

    let mut event_list = Vec::new();
    for (org, _) in &org_list {
        for _ in 0..rng.gen_range(1..=2) {
            let creator = &sessions[rng.gen_range(0..sessions.len())];
            let start = Utc::now()
                + Duration::days(rng.gen_range(1..30))
                + Duration::hours(rng.gen_range(8..20));
            let created = client
                .post(format!("{host}/events/create"))
                .json(&NewEvent {
                    title: lipsum::lipsum_title(),
                    description: lipsum::lipsum(24),
                    category: String::from(CATEGORIES[rng.gen_range(0..CATEGORIES.len())]),
                    location: format!("Room {}", rng.gen_range(100..400)),
                    event_start_datetime: start,
                    event_end_datetime: start + Duration::hours(rng.gen_range(1..4)),
                    capacity: if rng.gen_bool(0.3) {
                        Some(rng.gen_range(20..200))
                    } else {
                        None
                    },
                    visibility: if rng.gen_bool(0.85) {
                        Visibility::Public
                    } else {
                        Visibility::Private
                    },
                    belongs_to_org: *org,
                    created_by: creator.user_id,
                })
                .send()
                .await?
                .error_for_status()
                .context("creating seed event")?
                .json::<EventCreated>()
                .await?;
            event_list.push((created.event_id, creator.user_id));
        }
    }

    // creators are already interested in their own event
    for (event, creator) in &event_list {
        for session in &sessions {
            if session.user_id != *creator && rng.gen_bool(0.3) {
                client
                    .patch(format!("{host}/events/follow/{event}/{}", session.user_id))
                    .send()
                    .await?
                    .error_for_status()?;
            }
        }
    }

    for (org, _) in &org_list {
        for session in &sessions {
            if rng.gen_bool(0.4) {
                client
                    .patch(format!("{host}/orgs/rate/{org}/{}", session.user_id))
                    .json(&NewRating {
                        value: f64::from(rng.gen_range(2..=10)) / 2.0,
                    })
                    .send()
                    .await?
                    .error_for_status()?;
            }
        }
    }

    let mut posts = 0;
    for (event, _) in &event_list {
        for _ in 0..rng.gen_range(1..=2) {
            let author = &sessions[rng.gen_range(0..sessions.len())];
            let created = client
                .post(format!("{host}/posts/create/{}", author.user_id))
                .json(&NewPost {
                    title: lipsum::lipsum_title(),
                    content: lipsum::lipsum(40),
                    event_id: *event,
                })
                .send()
                .await?
                .error_for_status()
                .context("creating seed post")?
                .json::<PostCreated>()
                .await?;
            posts += 1;

            let commenter = &sessions[rng.gen_range(0..sessions.len())];
            let comment = client
                .patch(format!(
                    "{host}/posts/comment/{}/{}",
                    created.post_id, commenter.user_id
                ))
                .json(&NewComment {
                    content: lipsum::lipsum(12),
                })
                .send()
                .await?
                .error_for_status()?
                .json::<CommentCreated>()
                .await?;
            if rng.gen_bool(0.5) {
                let replier = &sessions[rng.gen_range(0..sessions.len())];
                client
                    .patch(format!(
                        "{host}/posts/reply/{}/{}",
                        comment.reply_id, replier.user_id
                    ))
                    .json(&NewComment {
                        content: lipsum::lipsum(8),
                    })
                    .send()
                    .await?
                    .error_for_status()?
                    .json::<ReplyCreated>()
                    .await?;
            }
        }
    }

    println!(
        "seeded {} users, {} orgs, {} events, {} posts",
        sessions.len(),
        org_list.len(),
        event_list.len(),
        posts
    );
    Ok(())
}
