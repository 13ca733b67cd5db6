mod renew_magic_link;

pub use renew_magic_link::{MagicLinkRenewal, RequestMagicLinkRenewal};
