/// Authentication cookies
///
/// - `access_token`: path `/`
/// - `refresh_token`: path restricted to the refresh endpoint
///
/// Both are HttpOnly, SameSite=Strict and Secure in production. Clearing
/// writes an empty value with a negative max-age.
use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";
pub const REFRESH_TOKEN_COOKIE: &str = "refresh_token";

#[derive(Debug, Clone)]
pub struct CookieSettings {
    pub secure: bool,
    pub refresh_path: String,
}

impl CookieSettings {
    pub fn new(secure: bool, api_prefix: &str) -> Self {
        Self {
            secure,
            refresh_path: format!("{}/refresh", api_prefix.trim_end_matches('/')),
        }
    }

    pub fn access(&self, token: String) -> Cookie<'static> {
        self.build(ACCESS_TOKEN_COOKIE, token, "/".to_string())
    }

    pub fn refresh(&self, token: String) -> Cookie<'static> {
        self.build(REFRESH_TOKEN_COOKIE, token, self.refresh_path.clone())
    }

    pub fn clear_access(&self) -> Cookie<'static> {
        let mut cookie = self.access(String::new());
        cookie.set_max_age(CookieDuration::seconds(-1));
        cookie
    }

    pub fn clear_refresh(&self) -> Cookie<'static> {
        let mut cookie = self.refresh(String::new());
        cookie.set_max_age(CookieDuration::seconds(-1));
        cookie
    }

    fn build(&self, name: &'static str, value: String, path: String) -> Cookie<'static> {
        Cookie::build(name, value)
            .path(path)
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .finish()
    }
}
