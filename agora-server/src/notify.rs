use std::sync::Arc;

use agora_api::{Event, Post, Time};
use futures::{stream, StreamExt};

use crate::store::Store;

#[derive(Clone, Debug)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait::async_trait]
pub trait MailSink: Send + Sync {
    async fn deliver(&self, mail: OutboundEmail) -> anyhow::Result<()>;
}

/// Transport that only records sends in the log.
// TODO: replace with an SMTP relay once the campus relay account exists
pub struct LogMail;

#[async_trait::async_trait]
impl MailSink for LogMail {
    async fn deliver(&self, mail: OutboundEmail) -> anyhow::Result<()> {
        tracing::info!(to = %mail.to, subject = %mail.subject, "delivering email");
        Ok(())
    }
}

#[derive(Clone)]
pub struct Notifier(Arc<dyn MailSink>);

impl Notifier {
    pub fn new(sink: Arc<dyn MailSink>) -> Notifier {
        Notifier(sink)
    }

    /// Fire-and-forget variant for request handlers: the response never
    /// waits on email delivery.
    pub fn spawn_new_event(&self, store: &Arc<Store>, event: &Event) {
        let this = self.clone();
        let store = store.clone();
        let event = event.clone();
        tokio::spawn(async move {
            let sent = this.send_new_event(&store, &event).await;
            tracing::debug!(event = %event.event_id, emails = sent, "new event notifications done");
        });
    }

    pub fn spawn_new_post(&self, store: &Arc<Store>, post: &Post, author_name: String) {
        let this = self.clone();
        let store = store.clone();
        let post = post.clone();
        tokio::spawn(async move {
            let sent = this.send_new_post(&store, &post, &author_name).await;
            tracing::debug!(post = %post.post_id, emails = sent, "new post notifications done");
        });
    }

    /// Mails everyone who follows the hosting org and has the new-event
    /// preference on. Returns how many emails went to the sink.
    pub async fn send_new_event(&self, store: &Store, event: &Event) -> usize {
        let org = match store.orgs.find_one(event.belongs_to_org).await {
            Some(org) => org,
            None => {
                tracing::warn!(event = %event.event_id, org = %event.belongs_to_org,
                    "skipping new event emails, hosting org is gone");
                return 0;
            }
        };
        let recipients = store
            .users
            .read_with(|users| {
                users
                    .values()
                    .filter(|u| u.following_orgs.contains(&event.belongs_to_org))
                    .filter(|u| u.email_notifs.new_event_by_org)
                    .map(|u| u.login.email.clone())
                    .collect::<Vec<_>>()
            })
            .await;
        let mails = recipients
            .into_iter()
            .map(|to| OutboundEmail {
                to,
                subject: format!("{} created a new event!", org.name),
                body: format!(
                    "{} is hosting {}.\n{}\nWhere: {}\nWhen: {} to {}",
                    org.name,
                    event.title,
                    event.description,
                    event.location,
                    event.event_start_datetime,
                    event.event_end_datetime,
                ),
            })
            .collect();
        self.fan_out(mails).await
    }

    /// Mails everyone interested in the post's event who has the new-post
    /// preference on.
    pub async fn send_new_post(&self, store: &Store, post: &Post, author_name: &str) -> usize {
        let event = match store.events.find_one(post.event_id).await {
            Some(event) => event,
            None => {
                tracing::warn!(post = %post.post_id, event = %post.event_id,
                    "skipping new post emails, event is gone");
                return 0;
            }
        };
        let recipients = store
            .users
            .read_with(|users| {
                users
                    .values()
                    .filter(|u| u.interested_event_history.contains(&post.event_id))
                    .filter(|u| u.email_notifs.new_post_for_event)
                    .map(|u| u.login.email.clone())
                    .collect::<Vec<_>>()
            })
            .await;
        let mails = recipients
            .into_iter()
            .map(|to| OutboundEmail {
                to,
                subject: format!("{} had a new post!", author_name),
                body: format!(
                    "{} posted in {}: {}\n\n{}",
                    author_name, event.title, post.title, post.content,
                ),
            })
            .collect();
        self.fan_out(mails).await
    }

    /// Reminds interested users about events starting a day from `now`,
    /// give or take five minutes either side.
    pub async fn send_event_reminders(&self, store: &Store, now: Time) -> usize {
        let target = now + chrono::Duration::hours(24);
        let window = chrono::Duration::minutes(5);
        let due = store
            .events
            .find_all(|e| {
                e.event_start_datetime > target - window
                    && e.event_start_datetime <= target + window
            })
            .await;

        let mut mails = Vec::new();
        for event in &due {
            let recipients = store
                .users
                .read_with(|users| {
                    event
                        .users_interested
                        .iter()
                        .filter_map(|i| users.get(&i.user_id))
                        .filter(|u| u.email_notifs.upcoming_events)
                        .map(|u| (u.login.email.clone(), u.name.clone()))
                        .collect::<Vec<_>>()
                })
                .await;
            for (to, name) in recipients {
                mails.push(OutboundEmail {
                    to,
                    subject: format!("{} is coming up!", event.title),
                    body: format!(
                        "Hi {}, {} starts at {}.",
                        name, event.title, event.event_start_datetime,
                    ),
                });
            }
        }
        self.fan_out(mails).await
    }

    async fn fan_out(&self, mails: Vec<OutboundEmail>) -> usize {
        let sent = mails.len();
        stream::iter(mails)
            .for_each_concurrent(Some(16), |mail| {
                let sink = self.0.clone();
                async move {
                    let to = mail.to.clone();
                    if let Err(err) = sink.deliver(mail).await {
                        tracing::error!(?err, %to, "failed delivering email");
                    }
                }
            })
            .await;
        sent
    }
}

/// Background reminder sweep, every five minutes for the life of the
/// process.
pub fn spawn_reminder_loop(notifier: Notifier, store: Arc<Store>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(5 * 60));
        loop {
            interval.tick().await;
            let sent = notifier
                .send_event_reminders(&store, chrono::Utc::now())
                .await;
            if sent > 0 {
                tracing::info!(emails = sent, "sent event reminders");
            }
        }
    });
}

#[cfg(test)]
pub struct MemoryMail(std::sync::Mutex<Vec<OutboundEmail>>);

#[cfg(test)]
impl MemoryMail {
    pub fn new() -> Arc<MemoryMail> {
        Arc::new(MemoryMail(std::sync::Mutex::new(Vec::new())))
    }

    pub fn sent(&self) -> Vec<OutboundEmail> {
        self.0.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait::async_trait]
impl MailSink for MemoryMail {
    async fn deliver(&self, mail: OutboundEmail) -> anyhow::Result<()> {
        self.0.lock().unwrap().push(mail);
        Ok(())
    }
}
