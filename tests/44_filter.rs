mod common;

use anyhow::Result;
use reqwest::StatusCode;
use serde_json::{json, Value};

use common::TestServer;

async fn seeded() -> Result<TestServer> {
    let server = TestServer::start().await?;
    for (name, price, difficulty, duration) in [
        ("The Forest Hiker", 397, "easy", 5),
        ("The Sea Explorer", 497, "medium", 7),
        ("The Snow Adventurer", 997, "difficult", 4),
        ("The City Wanderer", 1197, "easy", 9),
        ("The Park Camper", 1497, "medium", 10),
    ] {
        server
            .tour(name, price, json!({ "difficulty": difficulty, "duration": duration }))
            .await?;
    }
    Ok(server)
}

async fn tours(server: &TestServer, query: &str) -> Result<(StatusCode, Value)> {
    let res = server.client.get(server.url(&format!("/api/v1/tours?{}", query))).send().await?;
    Ok((res.status(), res.json::<Value>().await?))
}

fn names(body: &Value) -> Vec<String> {
    body["data"]["tours"]
        .as_array()
        .map(|tours| tours.iter().filter_map(|t| t["name"].as_str().map(str::to_string)).collect())
        .unwrap_or_default()
}

#[tokio::test]
async fn comparison_and_equality_filters() -> Result<()> {
    let server = seeded().await?;

    let (status, body) = tours(&server, "price[gte]=500&sort=price").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], json!(3));
    assert_eq!(names(&body), ["The Snow Adventurer", "The City Wanderer", "The Park Camper"]);
    assert!(body["requestedAt"].as_str().is_some());

    let (_, body) = tours(&server, "difficulty=easy&duration[lt]=6").await?;
    assert_eq!(names(&body), ["The Forest Hiker"]);
    Ok(())
}

#[tokio::test]
async fn sort_descending_with_tie_breaker() -> Result<()> {
    let server = seeded().await?;
    let (_, body) = tours(&server, "sort=difficulty,-price").await?;
    assert_eq!(
        names(&body),
        [
            "The Snow Adventurer",
            "The City Wanderer",
            "The Forest Hiker",
            "The Park Camper",
            "The Sea Explorer"
        ]
    );
    Ok(())
}

#[tokio::test]
async fn field_projection() -> Result<()> {
    let server = seeded().await?;

    let (_, body) = tours(&server, "fields=name,price&limit=1").await?;
    let tour = body["data"]["tours"][0].as_object().cloned().unwrap_or_default();
    assert!(tour.contains_key("name"));
    assert!(tour.contains_key("price"));
    assert!(tour.contains_key("id"));
    assert!(!tour.contains_key("summary"));

    let (_, body) = tours(&server, "fields=-summary,-description&limit=1").await?;
    let tour = body["data"]["tours"][0].as_object().cloned().unwrap_or_default();
    assert!(!tour.contains_key("summary"));
    assert!(!tour.contains_key("description"));
    assert!(tour.contains_key("price"));
    Ok(())
}

#[tokio::test]
async fn pagination() -> Result<()> {
    let server = seeded().await?;

    let (_, body) = tours(&server, "sort=price&limit=2&page=2").await?;
    assert_eq!(body["results"], json!(2));
    assert_eq!(names(&body), ["The Snow Adventurer", "The City Wanderer"]);

    let (_, body) = tours(&server, "sort=price&limit=2&page=9").await?;
    assert_eq!(body["results"], json!(0));

    // Garbage paging values fall back to the defaults
    let (status, body) = tours(&server, "page=zero&limit=-3").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], json!(5));

    let (status, body) = tours(&server, "page=18446744073709551615").await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"], json!(0));
    Ok(())
}

#[tokio::test]
async fn malformed_queries_are_rejected() -> Result<()> {
    let server = seeded().await?;

    let (status, body) = tours(&server, "price[regex]=5").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Unsupported operator 'regex' on field 'price'");

    let (status, body) = tours(&server, "fields=name,-price").await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["status"], "fail");
    Ok(())
}
