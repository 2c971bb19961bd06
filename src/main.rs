#[cfg(feature = "ssr")]
#[actix_web::main]
async fn main() -> std::io::Result<()> {
    use actix_files::Files;
    use actix_web::*;
    use burrowmart::api;
    use burrowmart::app::*;
    use burrowmart::config::StoreConfig;
    use burrowmart::container::Container;
    use leptos::logging::{error, log};
    use leptos::*;
    use leptos_actix::{generate_route_list, LeptosRoutes};
    use std::io::{Error, ErrorKind};

    let config = StoreConfig::from_env().map_err(|e| {
        error!("[CONFIG] {}", e);
        Error::new(ErrorKind::InvalidInput, e.to_string())
    })?;

    // Database, review migrations and providers
    let container = Container::bootstrap(config).await.map_err(|e| {
        error!("[SERVER] Startup failed: {}", e);
        Error::new(ErrorKind::Other, e.to_string())
    })?;
    let container = web::Data::new(container);

    // Load configuration
    let conf = get_configuration(None)
        .await
        .map_err(|e| Error::new(ErrorKind::InvalidInput, e.to_string()))?;
    let addr = match std::env::var("BIND_ADDR") {
        Ok(bind) => bind
            .parse()
            .map_err(|_| Error::new(ErrorKind::InvalidInput, format!("BIND_ADDR '{}' is not a socket address", bind)))?,
        Err(_) => conf.leptos_options.site_addr,
    };

    // Generate the list of routes in your Leptos App
    let routes = generate_route_list(App);
    log!("[SERVER] listening on http://{}", &addr);

    HttpServer::new(move || {
        let leptos_options = &conf.leptos_options;
        let site_root = &leptos_options.site_root;
        let store_config = container.config.clone();

        App::new()
            .app_data(container.clone())
            // JSON routes go in BEFORE the server functions
            .configure(|cfg| api::configure(cfg, &store_config))
            .route("/api/{tail:.*}", leptos_actix::handle_server_fns())
            // Serve JS/WASM/CSS from `pkg`
            .service(Files::new("/pkg", format!("{site_root}/pkg")))
            // Serve other assets from the `assets` directory
            .service(Files::new("/assets", site_root))
            .service(favicon)
            .leptos_routes(leptos_options.to_owned(), routes.to_owned(), App)
            .app_data(web::Data::new(leptos_options.to_owned()))
    })
    .bind(&addr)?
    .run()
    .await
}

#[cfg(feature = "ssr")]
#[actix_web::get("favicon.ico")]
async fn favicon(
    leptos_options: actix_web::web::Data<leptos::LeptosOptions>,
) -> actix_web::Result<actix_files::NamedFile> {
    let leptos_options = leptos_options.into_inner();
    let site_root = &leptos_options.site_root;
    Ok(actix_files::NamedFile::open(format!(
        "{site_root}/favicon.ico"
    ))?)
}

#[cfg(not(any(feature = "ssr", feature = "csr")))]
pub fn main() {
    // no client-side main function
    // see lib.rs for hydration function instead
}

#[cfg(all(not(feature = "ssr"), feature = "csr"))]
pub fn main() {
    // to run: `trunk serve --open --features csr`
    use burrowmart::app::*;

    console_error_panic_hook::set_once();

    leptos::mount_to_body(App);
}
