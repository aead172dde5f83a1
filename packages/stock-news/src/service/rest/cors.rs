use actix_cors::Cors;
use actix_web::http::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};

pub fn middleware_factory(allowed_origins: &[String]) -> Cors {
    let allowed_origins = allowed_origins.to_vec();

    Cors::default()
        .allowed_origin_fn(move |origin_value, _| {
            origin_value.to_str().is_ok_and(|origin| allowed_origins.iter().any(|allowed| allowed == origin))
        })
        .allowed_headers([CONTENT_TYPE, ACCEPT, ACCEPT_LANGUAGE])
        .allowed_methods(["GET", "HEAD", "POST"])
        .max_age(3600)
}
