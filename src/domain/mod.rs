mod credentials;
mod email_type;
mod subscriber;
mod subscription_options;
// allow external `use` statements to skip `subscriber` etc
pub use credentials::Credentials;
pub use email_type::EmailType;
pub use subscriber::ListId;
pub use subscriber::Subscriber;
pub use subscription_options::SubscriptionOptions;
