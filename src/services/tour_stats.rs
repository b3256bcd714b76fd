//! Aggregate reports over tours.

use chrono::Datelike;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::types::{parse_instant, Document};

const STATS_MIN_RATING: f64 = 4.5;

fn number(doc: &Document, field: &str) -> Option<f64> {
    doc.get(field).and_then(Value::as_f64)
}

#[derive(Default)]
struct DifficultyGroup {
    tours: usize,
    ratings: f64,
    rating_sum: f64,
    price_sum: f64,
    min_price: Option<f64>,
    max_price: Option<f64>,
}

/// Well-rated tours grouped by difficulty, cheapest average first
pub fn stats(tours: &[Document]) -> Vec<Value> {
    let mut groups: BTreeMap<String, DifficultyGroup> = BTreeMap::new();

    for tour in tours {
        let Some(rating) = number(tour, "ratingsAverage").filter(|r| *r >= STATS_MIN_RATING) else {
            continue;
        };
        let difficulty = tour
            .get("difficulty")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_uppercase();
        let price = number(tour, "price").unwrap_or(0.0);

        let group = groups.entry(difficulty).or_default();
        group.tours += 1;
        group.ratings += number(tour, "ratingsQuantity").unwrap_or(0.0);
        group.rating_sum += rating;
        group.price_sum += price;
        group.min_price = Some(group.min_price.map_or(price, |m| m.min(price)));
        group.max_price = Some(group.max_price.map_or(price, |m| m.max(price)));
    }

    let mut rows: Vec<(f64, Value)> = groups
        .into_iter()
        .map(|(difficulty, g)| {
            let avg_price = g.price_sum / g.tours as f64;
            let row = json!({
                "difficulty": difficulty,
                "numTours": g.tours,
                "numRatings": g.ratings,
                "avgRating": g.rating_sum / g.tours as f64,
                "avgPrice": avg_price,
                "minPrice": g.min_price,
                "maxPrice": g.max_price,
            });
            (avg_price, row)
        })
        .collect();
    rows.sort_by(|a, b| a.0.total_cmp(&b.0));
    rows.into_iter().map(|(_, row)| row).collect()
}

/// Tour starts per month of `year`
pub fn monthly_plan(tours: &[Document], year: i32) -> Vec<Value> {
    let mut months: BTreeMap<u32, Vec<Value>> = BTreeMap::new();

    for tour in tours {
        let name = tour.get("name").cloned().unwrap_or(Value::Null);
        let starts = tour.get("startDates").and_then(Value::as_array);
        for start in starts.into_iter().flatten() {
            let Some(at) = start.as_str().and_then(parse_instant) else { continue };
            if at.year() == year {
                months.entry(at.month()).or_default().push(name.clone());
            }
        }
    }

    months
        .into_iter()
        .take(12)
        .map(|(month, names)| {
            json!({
                "month": month,
                "numTours": names.len(),
                "tours": names,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tour(value: Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_stats_group_and_sort() {
        let tours = vec![
            tour(json!({ "difficulty": "easy", "ratingsAverage": 4.8, "ratingsQuantity": 10, "price": 400 })),
            tour(json!({ "difficulty": "easy", "ratingsAverage": 4.6, "ratingsQuantity": 5, "price": 600 })),
            tour(json!({ "difficulty": "difficult", "ratingsAverage": 4.9, "ratingsQuantity": 2, "price": 200 })),
            tour(json!({ "difficulty": "medium", "ratingsAverage": 3.9, "ratingsQuantity": 2, "price": 100 })),
        ];
        let stats = stats(&tours);
        assert_eq!(stats.len(), 2);
        assert_eq!(stats[0]["difficulty"], json!("DIFFICULT"));
        assert_eq!(stats[1]["difficulty"], json!("EASY"));
        assert_eq!(stats[1]["numTours"], json!(2));
        assert_eq!(stats[1]["avgPrice"], json!(500.0));
        assert_eq!(stats[1]["minPrice"], json!(400.0));
        assert_eq!(stats[1]["maxPrice"], json!(600.0));
    }

    #[test]
    fn test_monthly_plan() {
        let tours = vec![
            tour(json!({ "name": "A", "startDates": ["2021-04-25T09:00:00.000Z", "2021-07-20T09:00:00.000Z"] })),
            tour(json!({ "name": "B", "startDates": ["2021-07-05T09:00:00.000Z", "2022-01-01T09:00:00.000Z"] })),
        ];
        let plan = monthly_plan(&tours, 2021);
        assert_eq!(plan.len(), 2);
        assert_eq!(plan[0], json!({ "month": 4, "numTours": 1, "tours": ["A"] }));
        assert_eq!(plan[1]["numTours"], json!(2));
    }
}
