use leptos::*;

use crate::components::reviews_list::ReviewsList;
use crate::storefront::get_review_showcase;

#[component]
pub fn ReviewShowcase() -> impl IntoView {
    let showcase = create_resource(|| (), |_| async move { get_review_showcase(None, None).await });

    view! {
        <section class="review-showcase">
            <h2>{ "What our customers say" }</h2>
            <Suspense fallback=move || view! { <p>"Loading reviews..."</p> }>
                {move || showcase.get().map(|result| match result {
                    Ok(page) => view! { <ReviewsList reviews=page.reviews /> }.into_view(),
                    Err(e) => view! {
                        <p class="error">{ format!("Could not load reviews: {}", e) }</p>
                    }.into_view(),
                })}
            </Suspense>
        </section>
    }
}
