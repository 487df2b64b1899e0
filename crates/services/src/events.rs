//! Events: creator-owned, with invitees tracked as attendees. Creating one
//! raises an `event_invite` notification per invitee.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use domains::{
    AttendanceStatus, Attendee, DomainError, DomainResult, Event, EventId, EventRepository,
    EventUpdate, EventView, NewEvent, NotificationTarget, UserId, UserRepository,
};
use tracing::{info, instrument};

use crate::notifications::NotificationService;
use crate::username_of;

pub struct EventService {
    users: Arc<dyn UserRepository>,
    events: Arc<dyn EventRepository>,
    notifications: Arc<NotificationService>,
}

impl EventService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        events: Arc<dyn EventRepository>,
        notifications: Arc<NotificationService>,
    ) -> Self {
        Self {
            users,
            events,
            notifications,
        }
    }

    /// Creates the event, adds invitees as pending and notifies each one.
    #[instrument(skip(self, description, invitees))]
    pub async fn create(
        &self,
        creator: UserId,
        title: String,
        description: String,
        date: DateTime<Utc>,
        invitees: Vec<UserId>,
    ) -> DomainResult<Event> {
        let title = required_title(title)?;
        let invitees: Vec<UserId> = invitees
            .into_iter()
            .filter(|id| *id != creator)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let event = self
            .events
            .create(
                NewEvent {
                    title,
                    description,
                    date,
                    creator_id: creator,
                },
                &invitees,
            )
            .await?;
        info!(event = %event.id, invited = invitees.len(), "event created");

        if let Some(name) = username_of(self.users.as_ref(), creator).await {
            for invitee in invitees {
                self.notifications
                    .notify(
                        invitee,
                        NotificationTarget::EventInvite(event.id),
                        format!("{name} invited you to \"{}\"", event.title),
                    )
                    .await;
            }
        }
        Ok(event)
    }

    pub async fn get(&self, id: EventId, viewer: UserId) -> DomainResult<EventView> {
        self.events
            .view(id, viewer)
            .await?
            .ok_or_else(|| DomainError::not_found("Event"))
    }

    /// Events the user created or was invited to, soonest first.
    pub async fn list(&self, user: UserId) -> DomainResult<Vec<EventView>> {
        self.events.for_user(user).await
    }

    /// Only the creator and invitees may see who else is coming.
    pub async fn attendees(&self, id: EventId, viewer: UserId) -> DomainResult<Vec<Attendee>> {
        let view = self.get(id, viewer).await?;
        if view.event.creator_id != viewer && view.status.is_none() {
            return Err(DomainError::NotAuthorized(
                "You do not have permission to view this event".into(),
            ));
        }
        self.events.attendees(id).await
    }

    #[instrument(skip(self, description))]
    pub async fn update(
        &self,
        id: EventId,
        user: UserId,
        title: String,
        description: String,
        date: DateTime<Utc>,
    ) -> DomainResult<()> {
        let title = required_title(title)?;
        self.owned(id, user, "update the event").await?;
        self.events
            .update(
                id,
                EventUpdate {
                    title,
                    description,
                    date,
                },
            )
            .await?;
        info!(event = %id, "event updated");
        Ok(())
    }

    /// Cancels the event; its attendee list goes with it.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: EventId, user: UserId) -> DomainResult<()> {
        self.owned(id, user, "cancel the event").await?;
        self.events.delete(id).await?;
        info!(event = %id, "event cancelled");
        Ok(())
    }

    async fn owned(&self, id: EventId, user: UserId, action: &str) -> DomainResult<Event> {
        let event = self
            .events
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Event"))?;
        if event.creator_id != user {
            return Err(DomainError::NotAuthorized(format!(
                "Only the event creator can {action}"
            )));
        }
        Ok(event)
    }

    #[instrument(skip(self))]
    pub async fn respond(
        &self,
        id: EventId,
        user: UserId,
        status: AttendanceStatus,
    ) -> DomainResult<()> {
        if status == AttendanceStatus::Pending {
            return Err(DomainError::Validation(
                "Valid status required: \"going\" or \"not-going\"".into(),
            ));
        }
        self.events
            .find(id)
            .await?
            .ok_or_else(|| DomainError::not_found("Event"))?;
        self.events.set_attendance(id, user, status).await
    }
}

fn required_title(title: String) -> DomainResult<String> {
    let title = title.trim().to_string();
    if title.is_empty() {
        return Err(DomainError::Validation("Title and date are required".into()));
    }
    Ok(title)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{clock, fixed_now, stored, user};
    use domains::{MockEventRepository, MockLiveDelivery, MockNotificationRepository, MockUserRepository};
    use mockall::predicate::eq;

    fn event(id: EventId, creator: i64) -> Event {
        Event {
            id,
            title: "Meetup".into(),
            description: String::new(),
            date: fixed_now(),
            creator_id: UserId(creator),
            created_at: fixed_now(),
        }
    }

    fn view(id: EventId, creator: i64, status: Option<AttendanceStatus>) -> EventView {
        EventView {
            event: event(id, creator),
            creator_name: "erin".into(),
            status,
        }
    }

    fn svc(events: MockEventRepository, notes: MockNotificationRepository) -> EventService {
        let mut users = MockUserRepository::new();
        users
            .expect_find()
            .returning(|id| Ok(Some(user(id.get(), "erin"))));
        let mut live = MockLiveDelivery::new();
        live.expect_push().return_const(false);
        let notifications = Arc::new(NotificationService::new(Arc::new(notes), Arc::new(live), clock()));
        EventService::new(Arc::new(users), Arc::new(events), notifications)
    }

    #[tokio::test]
    async fn invitees_are_deduplicated_and_each_notified() {
        let mut events = MockEventRepository::new();
        events
            .expect_create()
            .withf(|_, invitees| invitees.to_vec() == vec![UserId(2), UserId(3)])
            .times(1)
            .returning(|new, _| {
                Ok(Event {
                    id: EventId(6),
                    title: new.title,
                    description: new.description,
                    date: new.date,
                    creator_id: new.creator_id,
                    created_at: fixed_now(),
                })
            });
        let mut notes = MockNotificationRepository::new();
        notes
            .expect_insert()
            .withf(|n| {
                n.target == NotificationTarget::EventInvite(EventId(6))
                    && n.content == "erin invited you to \"Meetup\""
            })
            .times(2)
            .returning(|n| Ok(stored(n)));

        svc(events, notes)
            .create(
                UserId(1),
                "Meetup".into(),
                String::new(),
                fixed_now(),
                vec![UserId(3), UserId(2), UserId(1), UserId(3)],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn pending_is_not_a_valid_response() {
        let mut events = MockEventRepository::new();
        events.expect_set_attendance().never();

        let err = svc(events, MockNotificationRepository::new())
            .respond(EventId(1), UserId(2), AttendanceStatus::Pending)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[tokio::test]
    async fn attendees_are_hidden_from_uninvited_users() {
        let mut events = MockEventRepository::new();
        events.expect_view().returning(|id, viewer| {
            let status = (viewer == UserId(2)).then_some(AttendanceStatus::Pending);
            Ok(Some(view(id, 1, status)))
        });
        events
            .expect_attendees()
            .with(eq(EventId(6)))
            .times(2)
            .returning(|_| Ok(Vec::new()));
        let svc = svc(events, MockNotificationRepository::new());

        svc.attendees(EventId(6), UserId(1)).await.unwrap();
        svc.attendees(EventId(6), UserId(2)).await.unwrap();
        assert!(matches!(
            svc.attendees(EventId(6), UserId(3)).await,
            Err(DomainError::NotAuthorized(_))
        ));
    }

    #[tokio::test]
    async fn only_the_creator_edits_or_cancels() {
        let mut events = MockEventRepository::new();
        events.expect_find().returning(|id| Ok(Some(event(id, 1))));
        events.expect_update().never();
        events.expect_delete().with(eq(EventId(6))).times(1).returning(|_| Ok(()));
        let svc = svc(events, MockNotificationRepository::new());

        let err = svc
            .update(EventId(6), UserId(2), "Hijack".into(), String::new(), fixed_now())
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Only the event creator can update the event");
        let err = svc.delete(EventId(6), UserId(2)).await.unwrap_err();
        assert_eq!(err.message(), "Only the event creator can cancel the event");
        assert!(matches!(
            svc.update(EventId(6), UserId(1), "  ".into(), String::new(), fixed_now())
                .await,
            Err(DomainError::Validation(_))
        ));

        svc.delete(EventId(6), UserId(1)).await.unwrap();
    }

    #[tokio::test]
    async fn missing_event_is_not_found() {
        let mut events = MockEventRepository::new();
        events.expect_view().returning(|_, _| Ok(None));
        events.expect_find().returning(|_| Ok(None));
        events.expect_delete().never();
        let svc = svc(events, MockNotificationRepository::new());

        assert!(matches!(svc.get(EventId(9), UserId(1)).await, Err(DomainError::NotFound(_))));
        assert!(matches!(
            svc.delete(EventId(9), UserId(1)).await,
            Err(DomainError::NotFound(_))
        ));
    }
}
