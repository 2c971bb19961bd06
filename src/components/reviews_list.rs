use leptos::*;

use crate::components::rating_stars::RatingStars;
use crate::models::review::Review;

#[component]
pub fn ReviewsList(reviews: Vec<Review>) -> impl IntoView {
    if reviews.is_empty() {
        return view! { <p class="reviews-empty">"No reviews yet."</p> }.into_view();
    }

    view! {
        <ul class="reviews">
            {
                reviews.into_iter().map(|review| {
                    let author = review.display_name();
                    view! {
                        <li class="review">
                            <RatingStars rating={review.rating as f64} />
                            { review.title.map(|title| view! { <h4>{ title }</h4> }) }
                            <p>{ review.content }</p>
                            <span class="review-author">{ author }</span>
                        </li>
                    }
                }).collect_view()
            }
        </ul>
    }
    .into_view()
}
