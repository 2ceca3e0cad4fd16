//! Two-tier authentication: registered users get 24h JWTs, guests get
//! short-lived tokens with daily AI quotas enforced by the rate limiter.

mod jwt;
mod rate_limit;

pub use jwt::{AuthError, Claims, JwtIssuer, Role};
pub use rate_limit::{spawn_cleanup_task, RateLimiter};
