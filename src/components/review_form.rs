use leptos::*;
use leptos_router::ActionForm;

use crate::models::review::{MAX_RATING, MIN_RATING};
use crate::storefront::SubmitReview;

/// Review form for a product. Submissions land as pending until moderated.
#[component]
pub fn ReviewForm(product_id: String) -> impl IntoView {
    let submit = create_server_action::<SubmitReview>();
    let outcome = submit.value();

    view! {
        <div class="review-form">
            <h3>{ "Write a review" }</h3>
            <ActionForm action=submit>
                <input type="hidden" name="product_id" value=product_id />
                <input type="text" name="order_id" placeholder="Order number" required=true />
                <input type="text" name="first_name" placeholder="First name" required=true />
                <input type="text" name="last_name" placeholder="Last name" required=true />
                <input type="text" name="title" placeholder="Title (optional)" />
                <textarea name="content" placeholder="Write your review here" required=true></textarea>
                <select name="rating">
                    {
                        (MIN_RATING..=MAX_RATING).rev().map(|n| view! {
                            <option value=n.to_string()>{ n }</option>
                        }).collect_view()
                    }
                </select>
                <button type="submit">{ "Submit Review" }</button>
            </ActionForm>
            {move || outcome.get().map(|result| match result {
                Ok(_) => view! {
                    <p class="notice">"Thanks! Your review is awaiting moderation."</p>
                }.into_view(),
                Err(e) => view! { <p class="error">{ e.to_string() }</p> }.into_view(),
            })}
        </div>
    }
}
