use leptos::*;

use crate::models::company::{CompanyInfo, StockLocation};
use crate::storefront::get_company_info;

fn address_line(location: &StockLocation) -> String {
    let address = &location.address;
    [&address.address_1, &address.city]
        .into_iter()
        .flatten()
        .cloned()
        .chain(address.country_code.as_ref().map(|c| c.to_uppercase()))
        .collect::<Vec<_>>()
        .join(", ")
}

#[component]
pub fn CompanyFooter() -> impl IntoView {
    let company = create_resource(|| (), |_| async move { get_company_info().await });

    view! {
        <footer class="company-footer">
            <Suspense fallback=|| ()>
                {move || company.get().and_then(Result::ok).map(|CompanyInfo { name, email, location }| view! {
                    <strong>{ name }</strong>
                    <a href=format!("mailto:{}", email)>{ email.clone() }</a>
                    { location.map(|location| view! {
                        <address>{ location.name.clone() }" · "{ address_line(&location) }</address>
                    }) }
                })}
            </Suspense>
        </footer>
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::company::LocationAddress;

    #[test]
    fn test_address_line_skips_missing_parts() {
        let location = StockLocation {
            id: "sloc_1".into(),
            name: "The Burrow".into(),
            address: LocationAddress {
                address_1: None,
                city: Some("Hobbiton".into()),
                country_code: Some("nz".into()),
            },
        };
        assert_eq!(address_line(&location), "Hobbiton, NZ");
    }
}
