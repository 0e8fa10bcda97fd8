//! HTTP API: route [`handlers`] and the request/response [`models`] they exchange.
//!
//! | Route | Purpose |
//! |-------|---------|
//! | `POST /users` | Register |
//! | `POST /users/login`, `POST /users/logout` | Start or end a session |
//! | `GET /users/me` | The logged-in user |
//! | `GET, POST /contacts` | List or create own contacts |
//! | `GET, PUT, DELETE /contacts/{id}` | Read, replace or delete an owned contact |

pub mod handlers;
pub mod json;
pub mod models;
