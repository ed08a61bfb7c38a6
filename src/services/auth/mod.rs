pub mod credentials;
pub mod events;
pub mod jwt;
pub mod login;
pub mod principal;
pub mod throttle;

pub use jwt::JwtCodec;
pub use login::LoginService;
pub use throttle::AttemptThrottle;
