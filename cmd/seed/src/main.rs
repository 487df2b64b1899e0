//! Development seeding: a handful of users, posts and follow edges, then a
//! bearer token per user printed to stdout. Run against an empty database.

use anyhow::Context;
use auth_adapters::JwtAuth;
use chrono::{Duration, Utc};
use configs::AppConfig;
use domains::{
    DomainError, NewPost, NewUser, Poll, PostRepository, SocialGraphRepository, UserId,
    UserRepository,
};
use storage_adapters::SqliteStore;
use tracing::{info, warn};

const USERS: [(&str, &str); 3] = [
    ("ada", "Compilers, type systems and tea."),
    ("grace", "Building things that ship."),
    ("linus", "Kernels and version control."),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let config = AppConfig::load().context("loading configuration")?;

    let store = SqliteStore::connect(&config.database.url, 1)
        .await
        .context("opening database")?;
    store.migrate().await.context("running migrations")?;

    let users = store.users();
    let mut ids: Vec<(String, UserId)> = Vec::new();
    for (name, bio) in USERS {
        let created = users
            .create(NewUser {
                username: name.into(),
                email: format!("{name}@innovate.dev"),
            })
            .await;
        let user = match created {
            Ok(user) => user,
            Err(DomainError::Conflict(_)) => {
                warn!(user = name, "already present, database looks seeded");
                return Ok(());
            }
            Err(err) => return Err(err).context("creating user"),
        };
        users
            .update_profile(
                user.id,
                domains::ProfileUpdate {
                    bio: bio.into(),
                    ..Default::default()
                },
            )
            .await?;
        ids.push((name.to_string(), user.id));
    }

    let posts = store.posts();
    let graph = store.graph();
    for (index, (name, id)) in ids.iter().enumerate() {
        posts
            .create(NewPost {
                owner: *id,
                content: format!("Hello from {name}!"),
                image_url: None,
                poll: (index == 0).then(|| Poll {
                    question: "Tabs or spaces?".into(),
                    options: vec!["tabs".into(), "spaces".into()],
                }),
                scheduled_at: None,
            })
            .await?;
        // Everyone follows the next user round the ring.
        let (_, next) = &ids[(index + 1) % ids.len()];
        graph.insert_follow(*id, *next).await?;
    }
    info!(users = ids.len(), "seeded");

    let auth = JwtAuth::new(&config.auth.jwt_secret);
    for (name, id) in &ids {
        let token = auth.issue(*id, Utc::now(), Duration::days(30))?;
        println!("{name} ({id}): {token}");
    }
    Ok(())
}
