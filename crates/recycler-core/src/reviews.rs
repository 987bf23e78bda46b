//! Field reports: per-item review lists, seeded from the catalog and
//! extended locally. Nothing is persisted.

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::types::*;

/// Author name for locally posted reports
pub const ANONYMOUS_AUTHOR: &str = "Anonymous Mechanic";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewBoard {
    item_id: ItemId,
    /// Newest first
    reviews: Vec<Review>,
}

impl ReviewBoard {
    pub fn seeded(item: &CatalogItem) -> Self {
        Self {
            item_id: item.id.clone(),
            reviews: item.reviews.clone(),
        }
    }

    pub fn item_id(&self) -> &str {
        &self.item_id
    }

    pub fn reviews(&self) -> &[Review] {
        &self.reviews
    }

    /// Post a five-star report dated today. Blank comments are ignored.
    pub fn post(&mut self, comment: &str) -> Option<&Review> {
        self.post_dated(comment, Local::now().date_naive())
    }

    pub fn post_dated(&mut self, comment: &str, date: NaiveDate) -> Option<&Review> {
        if comment.trim().is_empty() {
            return None;
        }

        let review = Review {
            id: Uuid::new_v4().to_string(),
            user: ANONYMOUS_AUTHOR.to_string(),
            rating: 5,
            comment: comment.to_string(),
            date: date.format("%Y-%m-%d").to_string(),
        };
        debug!("New field report on {}", self.item_id);

        self.reviews.insert(0, review);
        self.reviews.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> CatalogItem {
        let mut item = CatalogItem::new("gpuX", "GPU X", Category::GraphicsCard, 500.0);
        item.reviews = vec![Review {
            id: "r1".into(),
            user: "Dewi".into(),
            rating: 4,
            comment: "Runs cool after the repaste.".into(),
            date: "2024-03-02".into(),
        }];
        item
    }

    #[test]
    fn test_seeded_from_item() {
        let board = ReviewBoard::seeded(&item());
        assert_eq!(board.item_id(), "gpuX");
        assert_eq!(board.reviews().len(), 1);
    }

    #[test]
    fn test_post_prepends_anonymous_five_star() {
        let mut board = ReviewBoard::seeded(&item());
        let date = NaiveDate::from_ymd_opt(2025, 1, 9).unwrap();

        let posted = board.post_dated("Solid salvage.", date).unwrap().clone();

        assert_eq!(posted.user, "Anonymous Mechanic");
        assert_eq!(posted.rating, 5);
        assert_eq!(posted.date, "2025-01-09");
        assert_eq!(board.reviews()[0], posted);
        assert_eq!(board.reviews()[1].id, "r1");
    }

    #[test]
    fn test_blank_comment_ignored() {
        let mut board = ReviewBoard::seeded(&item());
        assert!(board.post("  \n ").is_none());
        assert_eq!(board.reviews().len(), 1);
    }
}
