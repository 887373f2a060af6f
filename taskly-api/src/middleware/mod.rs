/// Middleware modules for the API server
///
/// Authentication and the admin gate are route-group layers built in
/// `app`; this module holds the layers applied to every response.

pub mod security;
