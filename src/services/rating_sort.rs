//! Person ordering by rating.
//!
//! All sorts are stable and take a closure that yields an item's rating, so
//! they work for rating records, people joined with ratings, or anything
//! else that carries a [`PersonRating`].

use crate::models::{PersonRating, RatingDimension};
use std::cmp::Ordering;

/// Unrated first (input order kept), then overall descending, then looks
/// descending.
pub fn sort_by_rating<T, F>(items: &mut [T], rating_of: F)
where
    F: Fn(&T) -> PersonRating,
{
    items.sort_by(|a, b| {
        let (ra, rb) = (rating_of(a), rating_of(b));
        match (ra.is_unrated(), rb.is_unrated()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => descending(&ra, &rb, RatingDimension::Overall)
                .then_with(|| descending(&ra, &rb, RatingDimension::Looks)),
        }
    });
}

/// `dimension` descending, then overall descending.
pub fn sort_by_dimension<T, F>(items: &mut [T], dimension: RatingDimension, rating_of: F)
where
    F: Fn(&T) -> PersonRating,
{
    items.sort_by(|a, b| {
        let (ra, rb) = (rating_of(a), rating_of(b));
        descending(&ra, &rb, dimension)
            .then_with(|| descending(&ra, &rb, RatingDimension::Overall))
    });
}

/// Overall descending, then looks descending.
pub fn sort_default<T, F>(items: &mut [T], rating_of: F)
where
    F: Fn(&T) -> PersonRating,
{
    items.sort_by(|a, b| {
        let (ra, rb) = (rating_of(a), rating_of(b));
        descending(&ra, &rb, RatingDimension::Overall)
            .then_with(|| descending(&ra, &rb, RatingDimension::Looks))
    });
}

fn descending(a: &PersonRating, b: &PersonRating, dimension: RatingDimension) -> Ordering {
    b.score(dimension).total_cmp(&a.score(dimension))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rated(name: &'static str, overall: Option<f32>, looks: Option<f32>) -> (&'static str, PersonRating) {
        (
            name,
            PersonRating {
                overall,
                looks,
                ..PersonRating::default()
            },
        )
    }

    fn names(items: &[(&'static str, PersonRating)]) -> Vec<&'static str> {
        items.iter().map(|(n, _)| *n).collect()
    }

    #[test]
    fn test_unrated_first_then_overall_then_looks() {
        let mut people = vec![
            rated("mid", Some(3.0), Some(1.0)),
            rated("new1", None, Some(5.0)),
            rated("top", Some(4.5), None),
            rated("mid_pretty", Some(3.0), Some(4.0)),
            rated("new2", Some(0.0), None),
        ];
        sort_by_rating(&mut people, |(_, r)| *r);
        assert_eq!(
            names(&people),
            vec!["new1", "new2", "top", "mid_pretty", "mid"]
        );
    }

    #[test]
    fn test_dimension_sort_breaks_ties_by_overall() {
        let mut people = vec![
            ("a", PersonRating { body: Some(2.0), overall: Some(1.0), ..PersonRating::default() }),
            ("b", PersonRating { body: Some(4.0), ..PersonRating::default() }),
            ("c", PersonRating { body: Some(2.0), overall: Some(3.0), ..PersonRating::default() }),
            ("d", PersonRating::default()),
        ];
        sort_by_dimension(&mut people, RatingDimension::Body, |(_, r)| *r);
        assert_eq!(names(&people), vec!["b", "c", "a", "d"]);
    }

    #[test]
    fn test_default_sort_is_stable() {
        let mut people = vec![
            rated("x", Some(2.0), None),
            rated("y", Some(5.0), Some(1.0)),
            rated("z", Some(2.0), None),
            rated("w", Some(5.0), Some(3.0)),
        ];
        sort_default(&mut people, |(_, r)| *r);
        assert_eq!(names(&people), vec!["w", "y", "x", "z"]);
    }
}
