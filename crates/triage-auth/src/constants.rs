//! Fixed names shared by the client and the backend

/// Backend base URL used when nothing is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Storage key for the access token.
pub const ACCESS_TOKEN_KEY: &str = "tandarust_access_token";

/// Storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "tandarust_refresh_token";

pub const LOGIN_PATH: &str = "/auth/login";
pub const REGISTER_PATH: &str = "/auth/register";
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Endpoints whose 401 means "bad credentials", never "expired session".
pub const AUTH_PATHS: &[&str] = &[LOGIN_PATH, REGISTER_PATH, REFRESH_PATH];

/// Route the host navigates to when the session cannot be recovered.
pub const LOGIN_ROUTE: &str = "/login";

/// Routes that must not trigger a redirect to login (avoids redirect loops).
pub const PUBLIC_AUTH_ROUTES: &[&str] = &["/login", "/register"];

/// Whether a request path targets login, register or refresh.
pub fn is_auth_path(path: &str) -> bool {
    AUTH_PATHS.iter().any(|p| path.contains(p))
}

/// Whether the host is currently showing a public auth page.
pub fn is_public_auth_route(route: &str) -> bool {
    PUBLIC_AUTH_ROUTES.iter().any(|r| route.contains(r))
}
