//! Statistics aggregation over a user's full entry history.
//!
//! Everything is recomputed from scratch per call; there is no caching or
//! incremental state. Map-valued fields use `BTreeMap` so the JSON key
//! order is stable.

use std::collections::{BTreeMap, HashMap};

use chrono::{Days, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

use crate::models::entry::Entry;

#[derive(Debug, Clone, Serialize)]
pub struct StatsSummary {
    pub total_entries: i64,
    pub total_words: i64,
    pub avg_words: f64,
    /// "YYYY-MM" -> entry count; only months with at least one entry.
    pub monthly_stats: BTreeMap<String, i64>,
    /// mood label -> count; entries without a mood are excluded.
    pub mood_stats: BTreeMap<String, i64>,
    /// "YYYY-MM-DD" -> moods recorded that day (last 30 days only).
    pub mood_trends: BTreeMap<String, Vec<String>>,
    pub most_common_mood: Option<String>,
    /// Positive-mood count of the newer half minus the older half.
    /// `None` until the history reaches 10 entries.
    pub mood_improvement: Option<i64>,
    /// category name -> count; dangling category ids are skipped.
    pub category_stats: BTreeMap<String, i64>,
    /// Top tags, highest count first, at most 10.
    pub tag_stats: Vec<TagCount>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: i64,
}

/// Aggregate `entries` into a [`StatsSummary`].
///
/// `entries` must be sorted newest-first by `created_at`; the
/// mood-improvement split relies on that order. `categories` maps the
/// caller's category ids to names. `today` anchors the 30-day trend
/// window.
pub fn compute_stats(
    entries: &[Entry],
    categories: &HashMap<Uuid, String>,
    today: NaiveDate,
) -> StatsSummary {
    let total_entries = entries.len() as i64;
    let total_words: i64 = entries.iter().map(|e| e.word_count as i64).sum();
    let avg_words = if total_entries > 0 {
        ((total_words as f64 / total_entries as f64) * 10.0).round() / 10.0
    } else {
        0.0
    };

    let mut monthly_stats: BTreeMap<String, i64> = BTreeMap::new();
    for entry in entries {
        let key = entry.created_at.format("%Y-%m").to_string();
        *monthly_stats.entry(key).or_insert(0) += 1;
    }

    // Mood counts in first-encounter order; the order is what breaks ties
    // for the most common mood.
    let mut mood_counts: Vec<(&'static str, i64)> = Vec::new();
    for entry in entries {
        if let Some(mood) = entry.mood {
            let label = mood.as_str();
            match mood_counts.iter_mut().find(|(l, _)| *l == label) {
                Some((_, n)) => *n += 1,
                None => mood_counts.push((label, 1)),
            }
        }
    }

    let mut most_common_mood: Option<(&'static str, i64)> = None;
    for &(label, count) in &mood_counts {
        match most_common_mood {
            Some((_, best)) if count <= best => {}
            _ => most_common_mood = Some((label, count)),
        }
    }

    let mood_stats: BTreeMap<String, i64> = mood_counts
        .iter()
        .map(|&(label, n)| (label.to_string(), n))
        .collect();

    // Trend window: last 30 days inclusive. If the cutoff falls off the
    // calendar, the comparison is ambiguous and entries are kept.
    let cutoff = today.checked_sub_days(Days::new(30));
    let is_recent = |entry: &Entry| match cutoff {
        Some(cutoff) => entry.created_at.date_naive() >= cutoff,
        None => true,
    };

    let mut mood_trends: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for entry in entries.iter().filter(|e| is_recent(e)) {
        if let Some(mood) = entry.mood {
            let key = entry.created_at.format("%Y-%m-%d").to_string();
            mood_trends
                .entry(key)
                .or_default()
                .push(mood.as_str().to_string());
        }
    }

    let mood_improvement = if total_entries >= 10 {
        let midpoint = entries.len() / 2;
        let newer_half = &entries[..midpoint];
        let older_half = &entries[midpoint..];
        let positives = |half: &[Entry]| -> i64 {
            half.iter()
                .filter(|e| e.mood.map(|m| m.is_positive()).unwrap_or(false))
                .count() as i64
        };
        Some(positives(newer_half) - positives(older_half))
    } else {
        None
    };

    let mut category_stats: BTreeMap<String, i64> = BTreeMap::new();
    for entry in entries {
        if let Some(id) = entry.category_id {
            if let Some(name) = categories.get(&id) {
                *category_stats.entry(name.clone()).or_insert(0) += 1;
            }
        }
    }

    // Tag counts in first-encounter order, then a stable sort by count so
    // ties keep that order.
    let mut tag_counts: Vec<(String, i64)> = Vec::new();
    for entry in entries {
        for tag in &entry.tags {
            match tag_counts.iter_mut().find(|(t, _)| t == tag) {
                Some((_, n)) => *n += 1,
                None => tag_counts.push((tag.clone(), 1)),
            }
        }
    }
    tag_counts.sort_by(|a, b| b.1.cmp(&a.1));
    tag_counts.truncate(10);
    let tag_stats = tag_counts
        .into_iter()
        .map(|(tag, count)| TagCount { tag, count })
        .collect();

    StatsSummary {
        total_entries,
        total_words,
        avg_words,
        monthly_stats,
        mood_stats,
        mood_trends,
        most_common_mood: most_common_mood.map(|(label, _)| label.to_string()),
        mood_improvement,
        category_stats,
        tag_stats,
    }
}
