//! OpenAPI documentation, served at `/openapi.json` and rendered at `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, SecurityScheme},
};

use crate::{Config, api};

/// Documents the `CookieAuth` scheme under the session cookie name the server actually uses.
struct SecurityAddon {
    cookie_name: String,
}

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "CookieAuth",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    self.cookie_name.as_str(),
                    "Signed session cookie set by `POST /users/login`.",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Contact Book API",
        description = "Register, log in, and manage a private list of contacts."
    ),
    paths(
        api::handlers::users::register,
        api::handlers::users::login,
        api::handlers::users::logout,
        api::handlers::users::get_current_user,
        api::handlers::contacts::list_contacts,
        api::handlers::contacts::create_contact,
        api::handlers::contacts::get_contact,
        api::handlers::contacts::update_contact,
        api::handlers::contacts::delete_contact,
    ),
    components(schemas(
        api::models::users::UserCreate,
        api::models::users::UserLogin,
        api::models::users::UserResponse,
        api::models::contacts::ContactCreate,
        api::models::contacts::ContactResponse,
    )),
    tags(
        (name = "users", description = "Accounts and sessions"),
        (name = "contacts", description = "The logged-in user's contacts"),
    )
)]
pub struct ApiDoc;

/// The API document for a running server, with its configured session cookie name.
pub fn api_doc(config: &Config) -> utoipa::openapi::OpenApi {
    let mut doc = ApiDoc::openapi();
    SecurityAddon {
        cookie_name: config.auth.session.cookie_name.clone(),
    }
    .modify(&mut doc);
    doc
}
