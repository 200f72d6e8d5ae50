//! Storage key constants.

/// Storage slots used by the session.
pub struct StorageKeys;

impl StorageKeys {
    /// Short-lived bearer credential
    pub const ACCESS_TOKEN: &'static str = "access_token";

    /// Long-lived credential used to mint a new access token
    pub const REFRESH_TOKEN: &'static str = "refresh_token";

    /// Display username
    pub const USER: &'static str = "user";

    /// All session slots, in write order.
    pub const SESSION: [&'static str; 3] = [Self::ACCESS_TOKEN, Self::REFRESH_TOKEN, Self::USER];
}
