use std::{
    fmt,
    fmt::{Debug, Display},
};

/// A wrapper for credentials that must never reach the logs.
///
/// The server carries two of these around for its whole lifetime: the access-token signing secret
/// and the Khalti merchant key. Both live inside config structs that derive `Debug` and get
/// printed at startup, so the redaction has to sit on the type itself rather than rely on call
/// sites remembering to skip a field. `Debug` and `Display` always render `****`; the only way at
/// the value is an explicit [`Secret::reveal`] call.
#[derive(Clone, Default)]
pub struct Secret<T>
where T: Clone + Default
{
    value: T,
}

impl<T: Clone + Default> Secret<T> {
    pub fn new(value: T) -> Self {
        Self { value }
    }

    /// Grants access to the wrapped credential. Callers should use the reference immediately (to
    /// sign a token, or build an `Authorization` header) rather than store it elsewhere.
    pub fn reveal(&self) -> &T {
        &self.value
    }
}

impl<T: Clone + Default> From<T> for Secret<T> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Clone + Default> Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

impl<T: Clone + Default> Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("****")
    }
}

#[cfg(test)]
mod test {
    use super::Secret;

    #[test]
    fn secrets_never_render() {
        let key = Secret::new("live_secret_key_068f31".to_string());
        assert_eq!(format!("{key}"), "****");
        assert_eq!(format!("{key:?}"), "****");
        assert_eq!(key.reveal(), "live_secret_key_068f31");
    }

    #[test]
    fn containing_structs_redact_via_derive() {
        #[derive(Debug)]
        struct GatewayConfig {
            merchant_id: String,
            api_key: Secret<String>,
        }
        let config = GatewayConfig {
            merchant_id: "shopfront-np".to_string(),
            api_key: Secret::from("khalti-test-key".to_string()),
        };
        let printed = format!("{config:?}");
        assert!(printed.contains("shopfront-np"));
        assert!(!printed.contains("khalti-test-key"));
        assert!(printed.contains("****"));
    }
}
