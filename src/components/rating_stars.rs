use leptos::*;

use crate::models::review::MAX_RATING;

/// Filled and empty stars for a rating, rounded to the nearest whole star.
pub fn stars(rating: f64) -> String {
    let max = MAX_RATING as usize;
    let filled = (rating.round().max(0.0) as usize).min(max);
    format!("{}{}", "★".repeat(filled), "☆".repeat(max - filled))
}

#[component]
pub fn RatingStars(rating: f64) -> impl IntoView {
    view! {
        <span class="rating-stars" title=format!("{:.1} out of {}", rating, MAX_RATING)>
            { stars(rating) }
        </span>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stars() {
        assert_eq!(stars(4.0), "★★★★☆");
        assert_eq!(stars(4.6), "★★★★★");
        assert_eq!(stars(0.2), "☆☆☆☆☆");
        assert_eq!(stars(9.0), "★★★★★");
    }
}
