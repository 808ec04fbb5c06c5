use serde::{Deserialize, Serialize};
use uuid::Uuid;
use chrono::{DateTime, Utc};

pub const MIN_RATING: i32 = 1;
pub const MAX_RATING: i32 = 5;
pub const MAX_COMMENT_CHARS: usize = 2000;

/// A purchaser's rating of one product from one delivered order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub reviewer_id: Uuid,
    pub rating: u8,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Review {
    /// Build a review, checking rating range and comment length.
    pub fn new(
        order_id: Uuid,
        product_id: Uuid,
        reviewer_id: Uuid,
        rating: i32,
        comment: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, String> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(format!(
                "rating must be between {} and {}, got {}",
                MIN_RATING, MAX_RATING, rating
            ));
        }

        let comment = comment
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty());
        if let Some(c) = &comment {
            if c.chars().count() > MAX_COMMENT_CHARS {
                return Err(format!("comment longer than {} characters", MAX_COMMENT_CHARS));
            }
        }

        Ok(Self {
            id: Uuid::new_v4(),
            order_id,
            product_id,
            reviewer_id,
            rating: rating as u8,
            comment,
            created_at: now,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RatingSummary {
    pub count: usize,
    /// Mean rating rounded to one decimal, `None` without reviews
    pub average: Option<f64>,
}

impl RatingSummary {
    pub fn of(reviews: &[Review]) -> Self {
        if reviews.is_empty() {
            return Self { count: 0, average: None };
        }
        let sum: u32 = reviews.iter().map(|r| u32::from(r.rating)).sum();
        let mean = f64::from(sum) / reviews.len() as f64;
        Self {
            count: reviews.len(),
            average: Some((mean * 10.0).round() / 10.0),
        }
    }
}

/// Reviews of one product, newest first
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductReviews {
    pub product_id: Uuid,
    pub summary: RatingSummary,
    pub reviews: Vec<Review>,
}

impl ProductReviews {
    pub fn new(product_id: Uuid, mut reviews: Vec<Review>) -> Self {
        reviews.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Self {
            product_id,
            summary: RatingSummary::of(&reviews),
            reviews,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn review(rating: i32) -> Result<Review, String> {
        Review::new(Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), rating, None, Utc::now())
    }

    #[test]
    fn test_rating_bounds() {
        assert!(review(0).is_err());
        assert!(review(6).is_err());
        assert!(review(-3).is_err());
        assert_eq!(review(1).unwrap().rating, 1);
        assert_eq!(review(5).unwrap().rating, 5);
    }

    #[test]
    fn test_blank_comment_dropped() {
        let r = Review::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            Uuid::new_v4(),
            4,
            Some("   ".to_string()),
            Utc::now(),
        )
        .unwrap();
        assert!(r.comment.is_none());
    }

    #[test]
    fn test_summary_average() {
        let reviews: Vec<Review> = [5, 4, 4].iter().map(|r| review(*r).unwrap()).collect();
        let summary = RatingSummary::of(&reviews);
        assert_eq!(summary.count, 3);
        assert_eq!(summary.average, Some(4.3));
        assert_eq!(RatingSummary::of(&[]).average, None);
    }
}
