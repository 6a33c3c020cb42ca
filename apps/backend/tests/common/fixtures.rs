//! Test fixtures and factory functions for creating test data.

use serde_json::{json, Value};
use uuid::Uuid;

/// Title with a random suffix so parallel tests never share rows.
pub fn unique_title(prefix: &str) -> String {
    format!("{}-{}", prefix, Uuid::new_v4())
}

/// Minimal chapter document with a `chapterTitle`.
pub fn chapter_content(title: &str) -> Value {
    json!({ "chapterTitle": title, "sections": [] })
}

/// TOC entry as stored in `phases[].chapters`.
pub fn toc_entry(number: i32, json_file: &str, week: i64) -> Value {
    json!({
        "chapterNumber": number,
        "chapterTitle": format!("Old {}", number),
        "jsonFile": json_file,
        "type": "lesson",
        "week": week,
    })
}

/// TOC with one phase per group of chapter numbers.
pub fn toc_with_phases(groups: &[&[i32]]) -> Value {
    let phases: Vec<Value> = groups
        .iter()
        .enumerate()
        .map(|(i, numbers)| {
            json!({
                "phaseId": format!("phase_{}", i + 1),
                "phaseTitle": format!("Phase {}", i + 1),
                "phaseDescription": format!("Description {}", i + 1),
                "badgeEarned": format!("badge-{}", i + 1),
                "chapters": numbers
                    .iter()
                    .map(|&n| toc_entry(n, &format!("chapter_{}.json", n), i as i64 + 1))
                    .collect::<Vec<_>>(),
            })
        })
        .collect();

    json!({
        "ebookTitle": "Test Book",
        "totalChapters": groups.iter().map(|g| g.len()).sum::<usize>(),
        "phases": phases,
    })
}

/// Chapter numbers of each phase, in stored order.
pub fn phase_numbers(toc: &Value) -> Vec<Vec<i64>> {
    toc["phases"]
        .as_array()
        .expect("phases array")
        .iter()
        .map(|phase| {
            phase["chapters"]
                .as_array()
                .expect("chapters array")
                .iter()
                .map(|entry| entry["chapterNumber"].as_i64().expect("chapterNumber"))
                .collect()
        })
        .collect()
}
