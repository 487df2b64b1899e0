use axum::http::StatusCode;
use integration_tests::Harness;
use serde_json::{json, Value};

#[tokio::test]
async fn post_interest_and_notification_flow() {
    let h = Harness::new().await;
    let (alice, bob) = (h.user("alice").await, h.user("bob").await);

    let (status, body) = h
        .call("POST", "/api/posts", Some(bob), Some(json!({ "content": "Ship it" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let post_id = body["post_id"].as_i64().unwrap();

    let (status, body) = h.call("GET", "/api/posts?filter=all", Some(alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["posts"][0]["id"], post_id);
    assert_eq!(body["posts"][0]["username"], "bob");

    let (status, body) = h
        .call("POST", &format!("/api/posts/{post_id}/interest"), Some(alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["interested_count"], 1);

    let (_, body) = h.call("GET", "/api/notifications/unread-count", Some(bob), None).await;
    assert_eq!(body["count"], 1);
    let (_, body) = h.call("GET", "/api/notifications", Some(bob), None).await;
    assert_eq!(body["notifications"][0]["type"], "interest");
    assert_eq!(body["notifications"][0]["related_id"], post_id);

    let (status, body) = h.call("POST", "/api/notifications/mark-all-read", Some(bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn error_kinds_map_to_statuses() {
    let h = Harness::new().await;
    let (alice, bob) = (h.user("alice").await, h.user("bob").await);

    let (status, _) = h.call("GET", "/api/users/me", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = h
        .call("POST", &format!("/api/users/{}/follow", alice.get()), Some(alice), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "You cannot follow yourself");

    let (status, _) = h.call("POST", "/api/users/999/follow", Some(alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = h
        .call("POST", &format!("/api/users/{}/follow", bob.get()), Some(alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = h
        .call("POST", &format!("/api/users/{}/follow", bob.get()), Some(alice), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Already following this user");

    let (status, _) = h
        .call("POST", &format!("/api/users/{}/block", bob.get()), Some(alice), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = h
        .call("GET", &format!("/api/users/{}", alice.get()), Some(bob), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "This user has blocked you");
}

#[tokio::test]
async fn profile_update_and_graph_listings() {
    let h = Harness::new().await;
    let (alice, bob) = (h.user("alice").await, h.user("bob").await);
    h.services.graph.follow(bob, alice).await.unwrap();

    let (status, _) = h
        .call("PUT", "/api/users/me", Some(alice), Some(json!({ "bio": "Rustacean" })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = h.call("GET", "/api/users/me", Some(alice), None).await;
    assert_eq!(body["user"]["bio"], "Rustacean");
    assert_eq!(body["user"]["email"], "alice@example.com");

    let (_, body) = h
        .call("GET", &format!("/api/users/{}/followers", alice.get()), Some(alice), None)
        .await;
    assert_eq!(body["users"][0]["username"], "bob");
    assert_eq!(body["users"][0]["is_following"], false);
}

#[tokio::test]
async fn messaging_over_http() {
    let h = Harness::new().await;
    let (alice, bob) = (h.user("alice").await, h.user("bob").await);

    let (status, body) = h
        .call(
            "POST",
            "/api/messages",
            Some(alice),
            Some(json!({ "receiverId": bob.get(), "content": "hello" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["is_outgoing"], true);

    let (_, body) = h.call("GET", "/api/messages/unread-count", Some(bob), None).await;
    assert_eq!(body["count"], 1);

    let (status, body) = h
        .call("GET", &format!("/api/messages/conversation/{}", alice.get()), Some(bob), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["contact"]["username"], "alice");
    assert_eq!(body["messages"][0]["content"], "hello");
    assert_eq!(body["messages"][0]["is_outgoing"], false);

    let (_, body) = h.call("GET", "/api/messages/unread-count", Some(bob), None).await;
    assert_eq!(body["count"], 0);

    let (status, body) = h
        .call("POST", "/api/messages", Some(alice), Some(json!({ "receiver_id": bob.get() })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Message must have content or an attachment");
}

#[tokio::test]
async fn reminders_over_http() {
    let h = Harness::new().await;
    let alice = h.user("alice").await;
    let post = h.post(alice, "later").await;

    let (status, body) = h
        .call(
            "POST",
            "/api/reminders",
            Some(alice),
            Some(json!({ "postId": post.id.get(), "reminderTime": 2 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["reminder"]["id"].is_i64());
    assert!(body["reminder"]["scheduledTime"].is_string());

    let (_, body) = h.call("GET", "/api/reminders", Some(alice), None).await;
    let id = body["reminders"][0]["id"].as_i64().unwrap();

    let (status, _) = h.call("DELETE", &format!("/api/reminders/{id}"), Some(alice), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = h.call("DELETE", &format!("/api/reminders/{id}"), Some(alice), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn oversized_reminder_delay_is_a_bad_request() {
    let h = Harness::new().await;
    let alice = h.user("alice").await;
    let post = h.post(alice, "much later").await;

    let (status, body) = h
        .call(
            "POST",
            "/api/reminders",
            Some(alice),
            Some(json!({ "postId": post.id.get(), "reminderTime": 10_000_000_000_i64 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Reminder delay is too large");

    let (_, body) = h.call("GET", "/api/reminders", Some(alice), None).await;
    assert_eq!(body["reminders"], json!([]));
}

#[tokio::test]
async fn communities_and_events_over_http() {
    let h = Harness::new().await;
    let (alice, bob) = (h.user("alice").await, h.user("bob").await);

    let (status, body) = h
        .call("POST", "/api/communities", Some(alice), Some(json!({ "name": "Rust" })))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let community = body["community"]["id"].as_i64().unwrap();

    let join = format!("/api/communities/{community}/join");
    assert_eq!(h.call("POST", &join, Some(bob), None).await.0, StatusCode::OK);
    assert_eq!(h.call("POST", &join, Some(bob), None).await.0, StatusCode::BAD_REQUEST);
    let (_, body) = h
        .call("GET", &format!("/api/communities/{community}"), Some(bob), None)
        .await;
    assert_eq!(body["community"]["member_count"], 2);
    let (status, _) = h
        .call("POST", &format!("/api/communities/{community}/leave"), Some(alice), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = h
        .call(
            "POST",
            "/api/events",
            Some(alice),
            Some(json!({
                "title": "Meetup",
                "date": "2030-01-01T18:00:00Z",
                "attendees": [bob.get()],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let event = body["event"]["id"].as_i64().unwrap();

    let (_, body) = h.call("GET", "/api/notifications", Some(bob), None).await;
    let types: Vec<_> = body["notifications"]
        .as_array()
        .unwrap()
        .iter()
        .map(|n| n["type"].as_str().unwrap().to_string())
        .collect();
    assert!(types.contains(&"event_invite".to_string()));

    let status_url = format!("/api/events/{event}/status");
    let (status, _) = h
        .call("PUT", &status_url, Some(bob), Some(json!({ "status": "going" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = h
        .call("PUT", &status_url, Some(bob), Some(json!({ "status": "pending" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn community_and_event_listings_over_http() {
    let h = Harness::new().await;
    let (alice, bob, carol) = (h.user("alice").await, h.user("bob").await, h.user("carol").await);

    for name in ["Zig", "Rust"] {
        let (status, _) = h
            .call("POST", "/api/communities", Some(alice), Some(json!({ "name": name })))
            .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (_, body) = h.call("GET", "/api/communities", Some(bob), None).await;
    let rust = body["communities"]
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["name"] == "Rust")
        .unwrap()["id"]
        .as_i64()
        .unwrap();
    h.call("POST", &format!("/api/communities/{rust}/join"), Some(bob), None)
        .await;

    let (_, body) = h.call("GET", "/api/communities", Some(carol), None).await;
    assert_eq!(body["communities"][0]["name"], "Rust");
    assert_eq!(body["communities"][0]["member_count"], 2);
    let (status, body) = h
        .call("GET", "/api/communities/my-communities", Some(bob), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["communities"].as_array().unwrap().len(), 1);
    let (_, body) = h
        .call("GET", &format!("/api/communities/{rust}"), Some(bob), None)
        .await;
    assert_eq!(body["is_member"], true);
    assert_eq!(body["is_admin"], false);

    let (_, body) = h
        .call(
            "POST",
            "/api/events",
            Some(alice),
            Some(json!({
                "title": "Meetup",
                "date": "2030-01-01T18:00:00Z",
                "attendees": [bob.get()],
            })),
        )
        .await;
    let event = body["event"]["id"].as_i64().unwrap();
    let url = format!("/api/events/{event}");

    let (_, body) = h.call("GET", "/api/events", Some(bob), None).await;
    assert_eq!(body["events"][0]["id"], event);
    assert_eq!(body["events"][0]["creator_name"], "alice");
    assert_eq!(body["events"][0]["status"], "pending");
    let (_, body) = h.call("GET", "/api/events", Some(carol), None).await;
    assert_eq!(body["events"], json!([]));

    let (status, body) = h.call("GET", &url, Some(carol), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["event"]["status"], Value::Null);
    let attendees = format!("{url}/attendees");
    let (status, body) = h.call("GET", &attendees, Some(bob), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["attendees"][0]["username"], "bob");
    assert_eq!(h.call("GET", &attendees, Some(carol), None).await.0, StatusCode::FORBIDDEN);

    let edit = json!({ "title": "Moved", "date": "2030-02-01T18:00:00Z" });
    let (status, _) = h.call("PUT", &url, Some(bob), Some(edit.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = h.call("PUT", &url, Some(alice), Some(edit)).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = h.call("GET", &url, Some(alice), None).await;
    assert_eq!(body["event"]["title"], "Moved");

    assert_eq!(h.call("DELETE", &url, Some(bob), None).await.0, StatusCode::FORBIDDEN);
    let (status, body) = h.call("DELETE", &url, Some(alice), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Event cancelled successfully");
    assert_eq!(h.call("GET", &url, Some(alice), None).await.0, StatusCode::NOT_FOUND);
}
