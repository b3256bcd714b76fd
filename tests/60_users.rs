mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::TestServer;
use natours_api::types::Role;

#[tokio::test]
async fn me_returns_the_caller_without_secrets() -> Result<()> {
    let server = TestServer::start().await?;
    let (id, token) = server.user("Mia@Example.com", Role::Guide).await?;

    let res = server.client.get(server.url("/api/v1/users/me")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let user = res.json::<Value>().await?["data"]["user"].clone();
    assert_eq!(user["id"], json!(id));
    assert_eq!(user["email"], "mia@example.com");
    assert_eq!(user["role"], "guide");
    assert_eq!(user["photo"], "default.jpg");
    for hidden in ["password", "passwordChangedAt", "isActive", "__v"] {
        assert!(user.get(hidden).is_none(), "{} leaked", hidden);
    }
    Ok(())
}

#[tokio::test]
async fn update_my_data_only_touches_profile_fields() -> Result<()> {
    let server = TestServer::start().await?;
    let (_, token) = server.user("mia@example.com", Role::User).await?;

    let res = server
        .client
        .patch(server.url("/api/v1/users/update-my-data"))
        .bearer_auth(&token)
        .json(&json!({ "password": "sneaky123", "passwordConfirm": "sneaky123" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        res.json::<Value>().await?["message"],
        "This route is not for password updates. Please use /update-my-password."
    );

    let res = server
        .client
        .patch(server.url("/api/v1/users/update-my-data"))
        .bearer_auth(&token)
        .json(&json!({ "name": "Mia Tester", "role": "admin" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let user = res.json::<Value>().await?["data"]["user"].clone();
    assert_eq!(user["name"], "Mia Tester");
    assert_eq!(user["role"], "user");

    let res = server
        .client
        .patch(server.url("/api/v1/users/update-my-data"))
        .bearer_auth(&token)
        .json(&json!({ "email": "not-an-email" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn deactivated_accounts_disappear() -> Result<()> {
    let server = TestServer::start().await?;
    let (id, token) = server.user("mia@example.com", Role::User).await?;
    let (_, admin) = server.user("admin@example.com", Role::Admin).await?;

    let res = server
        .client
        .delete(server.url("/api/v1/users/deactivate-account"))
        .bearer_auth(&token)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = server
        .client
        .post(server.url("/api/v1/users/login"))
        .json(&json!({ "email": "mia@example.com", "password": "pass1234" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server.client.get(server.url("/api/v1/users/me")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = server
        .client
        .get(server.url(&format!("/api/v1/users/{}", id)))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    Ok(())
}

#[tokio::test]
async fn user_administration_is_admin_only() -> Result<()> {
    let server = TestServer::start().await?;
    let (id, token) = server.user("mia@example.com", Role::User).await?;
    let (_, admin) = server.user("admin@example.com", Role::Admin).await?;

    let res = server.client.get(server.url("/api/v1/users")).bearer_auth(&token).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server
        .client
        .get(server.url("/api/v1/users?sort=email"))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["results"], json!(2));
    assert_eq!(body["data"]["users"][0]["email"], "admin@example.com");

    let res = server
        .client
        .patch(server.url(&format!("/api/v1/users/{}", id)))
        .bearer_auth(&admin)
        .json(&json!({ "role": "lead-guide" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(res.json::<Value>().await?["data"]["user"]["role"], "lead-guide");

    let res = server
        .client
        .patch(server.url(&format!("/api/v1/users/{}", id)))
        .bearer_auth(&admin)
        .json(&json!({ "role": "emperor" }))
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    let res = server
        .client
        .delete(server.url(&format!("/api/v1/users/{}", id)))
        .bearer_auth(&admin)
        .send()
        .await?;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    Ok(())
}

#[tokio::test]
async fn bookings_for_the_caller() -> Result<()> {
    let server = TestServer::start().await?;
    let (mia_id, mia) = server.user("mia@example.com", Role::User).await?;
    let (leo_id, _) = server.user("leo@example.com", Role::User).await?;
    let (_, manager) = server.user("lead@example.com", Role::LeadGuide).await?;
    let tour = server.tour("The Forest Hiker", 397, json!({})).await?;

    for user in [&mia_id, &leo_id] {
        let res = server
            .client
            .post(server.url("/api/v1/bookings"))
            .bearer_auth(&manager)
            .json(&json!({ "tour": tour, "user": user, "price": 397 }))
            .send()
            .await?;
        assert_eq!(res.status(), StatusCode::CREATED);
        assert_eq!(res.json::<Value>().await?["data"]["booking"]["paid"], json!(true));
    }

    let res = server.client.get(server.url("/api/v1/bookings")).bearer_auth(&mia).send().await?;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = server.client.get(server.url("/api/v1/bookings/mine")).bearer_auth(&mia).send().await?;
    assert_eq!(res.status(), StatusCode::OK);
    let body = res.json::<Value>().await?;
    assert_eq!(body["results"], json!(1));
    let booking = &body["data"]["bookings"][0];
    assert_eq!(booking["tour"]["name"], "The Forest Hiker");
    assert_eq!(booking["user"]["email"], "mia@example.com");

    let res = server.client.get(server.url("/api/v1/bookings")).bearer_auth(&manager).send().await?;
    assert_eq!(res.json::<Value>().await?["results"], json!(2));
    Ok(())
}
