/// Storefront application: home page with the review showcase, product review
/// pages and marketing pages from the content platform.
use leptos::*;
use leptos_meta::*;
use leptos_router::*;

use crate::components::{
    company_footer::CompanyFooter, review_form::ReviewForm, review_showcase::ReviewShowcase,
    reviews_list::ReviewsList,
};
use crate::models::content::MarketingPage;
use crate::models::review::ReviewPage;
use crate::storefront::{get_marketing_page, get_product_reviews};

const HOME_SLUG: &str = "home";

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    view! {
        <Stylesheet id="leptos" href="/pkg/burrowmart.css" />
        <Title text="Burrowmart" />
        <Router>
            <main>
                <Routes>
                    <Route path="/" view=HomePage />
                    <Route path="/products/:id" view=ProductReviewsPage />
                    <Route path="/pages/:slug" view=MarketingPageView />
                </Routes>
            </main>
            <CompanyFooter />
        </Router>
    }
}

/// "4.50 out of 5 from 2 reviews", or a placeholder when nothing is approved yet.
pub fn rating_summary(page: &ReviewPage) -> String {
    match page.average_rating {
        Some(average) if page.count > 0 => format!(
            "{:.2} out of 5 from {} review{}",
            average,
            page.count,
            if page.count == 1 { "" } else { "s" }
        ),
        _ => "No reviews yet".to_string(),
    }
}

#[component]
fn ContentBlocks(page: MarketingPage) -> impl IntoView {
    view! {
        <article class="marketing-page">
            <h1>{ page.title }</h1>
            {
                page.body.into_iter().map(|block| view! {
                    <section>
                        { block.heading.map(|heading| view! { <h2>{ heading }</h2> }) }
                        <p>{ block.text }</p>
                    </section>
                }).collect_view()
            }
        </article>
    }
}

#[component]
fn HomePage() -> impl IntoView {
    let hero = create_resource(
        || (),
        |_| async move { get_marketing_page(HOME_SLUG.to_string()).await },
    );

    view! {
        <Suspense fallback=|| ()>
            {move || hero.get().map(|result| match result {
                Ok(Some(page)) => view! { <ContentBlocks page=page /> }.into_view(),
                _ => view! {
                    <header class="hero">
                        <h1>{ "Burrowmart" }</h1>
                        <p>{ "Goods for comfortable holes in the ground." }</p>
                    </header>
                }.into_view(),
            })}
        </Suspense>
        <ReviewShowcase />
    }
}

#[component]
fn ProductReviewsPage() -> impl IntoView {
    let params = use_params_map();
    let product_id = move || params.with(|p| p.get("id").cloned().unwrap_or_default());
    let reviews = create_resource(product_id, |id| async move {
        get_product_reviews(id, None).await
    });

    view! {
        <section class="product-reviews">
            <h2>{ "Reviews" }</h2>
            <Suspense fallback=move || view! { <p>"Loading reviews..."</p> }>
                {move || reviews.get().map(|result| match result {
                    Ok(page) => {
                        let summary = rating_summary(&page);
                        view! {
                            <p class="review-summary">{ summary }</p>
                            <ReviewsList reviews=page.reviews />
                        }.into_view()
                    }
                    Err(e) => view! { <p class="error">{ e.to_string() }</p> }.into_view(),
                })}
            </Suspense>
            {move || view! { <ReviewForm product_id=product_id() /> }}
        </section>
    }
}

#[component]
fn MarketingPageView() -> impl IntoView {
    let params = use_params_map();
    let slug = move || params.with(|p| p.get("slug").cloned().unwrap_or_default());
    let page = create_resource(slug, |slug| async move { get_marketing_page(slug).await });

    view! {
        <Suspense fallback=move || view! { <p>"Loading..."</p> }>
            {move || page.get().map(|result| match result {
                Ok(Some(page)) => view! { <ContentBlocks page=page /> }.into_view(),
                Ok(None) => view! { <p class="not-found">"Page not found."</p> }.into_view(),
                Err(e) => view! { <p class="error">{ e.to_string() }</p> }.into_view(),
            })}
        </Suspense>
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(count: i64, average_rating: Option<f64>) -> ReviewPage {
        ReviewPage {
            reviews: vec![],
            count,
            average_rating,
            limit: 10,
            offset: 0,
        }
    }

    #[test]
    fn test_rating_summary() {
        assert_eq!(rating_summary(&page(0, None)), "No reviews yet");
        assert_eq!(rating_summary(&page(1, Some(5.0))), "5.00 out of 5 from 1 review");
        assert_eq!(rating_summary(&page(2, Some(4.5))), "4.50 out of 5 from 2 reviews");
    }
}
