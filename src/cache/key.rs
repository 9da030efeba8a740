//! Cache Key Builder
//!
//! Turns a prefix and a call's arguments into a deterministic cache key.
//! Positional values keep their order; named values are sorted by name.
//! Parameter signatures longer than [`MAX_PARAMS_LEN`] characters collapse to
//! a [`HASH_LEN`]-character hex digest so keys stay bounded.

use std::collections::BTreeMap;
use std::fmt::Display;

use sha2::{Digest, Sha256};

/// Longest parameter signature kept verbatim in a key
pub const MAX_PARAMS_LEN: usize = 200;

/// Length of the hex digest that replaces an over-long signature
pub const HASH_LEN: usize = 32;

// == Key Arguments ==
/// Stringified arguments of one call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeyArgs {
    positional: Vec<String>,
    named: BTreeMap<String, String>,
}

impl KeyArgs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a positional argument.
    pub fn arg(mut self, value: impl Display) -> Self {
        self.positional.push(value.to_string());
        self
    }

    /// Sets a named argument. A repeated name overwrites the earlier value.
    pub fn named(mut self, name: impl Into<String>, value: impl Display) -> Self {
        self.named.insert(name.into(), value.to_string());
        self
    }

    /// Sets a named argument only when a value is present.
    pub fn named_opt<V: Display>(self, name: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.named(name, value),
            None => self,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }

    /// Canonical parameter signature, before any hashing.
    pub fn signature(&self) -> String {
        let positional = self.positional.join(":");
        let named = self
            .named
            .iter()
            .map(|(name, value)| format!("{}={}", name, value))
            .collect::<Vec<_>>()
            .join(":");

        match (positional.is_empty(), named.is_empty()) {
            (false, false) => format!("{}:{}", positional, named),
            (false, true) => positional,
            _ => named,
        }
    }
}

// == Build Key ==
/// Builds the cache key for `prefix` and `args`.
///
/// Returns `prefix` alone when there are no parameters, `prefix:params`
/// otherwise.
pub fn build_key(prefix: &str, args: &KeyArgs) -> String {
    let mut params = args.signature();

    if params.chars().count() > MAX_PARAMS_LEN {
        params = digest(&params);
    }

    if params.is_empty() {
        prefix.to_string()
    } else {
        format!("{}:{}", prefix, params)
    }
}

/// First 128 bits of SHA-256, hex encoded.
fn digest(params: &str) -> String {
    let hash = Sha256::digest(params.as_bytes());
    hex::encode(&hash[..HASH_LEN / 2])
}

// == Into Key Args ==
/// Converts a call's argument value into [`KeyArgs`].
pub trait IntoKeyArgs {
    fn key_args(&self) -> KeyArgs;
}

impl IntoKeyArgs for () {
    fn key_args(&self) -> KeyArgs {
        KeyArgs::new()
    }
}

impl IntoKeyArgs for KeyArgs {
    fn key_args(&self) -> KeyArgs {
        self.clone()
    }
}

macro_rules! scalar_key_args {
    ($($ty:ty),*) => {
        $(
            impl IntoKeyArgs for $ty {
                fn key_args(&self) -> KeyArgs {
                    KeyArgs::new().arg(self)
                }
            }
        )*
    };
}

scalar_key_args!(u32, u64, i32, i64, usize, bool, String, &str);

macro_rules! tuple_key_args {
    ($($name:ident),+) => {
        impl<$($name: Display),+> IntoKeyArgs for ($($name,)+) {
            #[allow(non_snake_case)]
            fn key_args(&self) -> KeyArgs {
                let ($($name,)+) = self;
                KeyArgs::new()$(.arg($name))+
            }
        }
    };
}

tuple_key_args!(A);
tuple_key_args!(A, B);
tuple_key_args!(A, B, C);
tuple_key_args!(A, B, C, D);

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_only_without_params() {
        assert_eq!(build_key("routes:list", &KeyArgs::new()), "routes:list");
        assert_eq!(build_key("stops", &().key_args()), "stops");
    }

    #[test]
    fn test_positional_args_joined_in_order() {
        let args = KeyArgs::new().arg(7).arg("T5");
        assert_eq!(build_key("route", &args), "route:7:T5");
    }

    #[test]
    fn test_named_args_sorted_by_name() {
        let args = KeyArgs::new()
            .named("transport_type", "tram")
            .named("is_active", true);
        assert_eq!(
            build_key("routes", &args),
            "routes:is_active=true:transport_type=tram"
        );
    }

    #[test]
    fn test_positional_then_named() {
        let args = KeyArgs::new().arg(3).named("page", 2);
        assert_eq!(build_key("stops", &args), "stops:3:page=2");
    }

    #[test]
    fn test_named_only() {
        let args = KeyArgs::new().named("lat", 56.8389);
        assert_eq!(build_key("nearby", &args), "nearby:lat=56.8389");
    }

    #[test]
    fn test_named_opt_skips_none() {
        let args = KeyArgs::new()
            .named_opt("transport_type", None::<&str>)
            .named_opt("is_active", Some(false));
        assert_eq!(build_key("routes", &args), "routes:is_active=false");
    }

    #[test]
    fn test_repeated_name_last_wins() {
        let args = KeyArgs::new().named("page", 1).named("page", 4);
        assert_eq!(args.signature(), "page=4");
    }

    #[test]
    fn test_long_signature_is_hashed() {
        let long = "x".repeat(MAX_PARAMS_LEN + 1);
        let key = build_key("routes", &KeyArgs::new().arg(&long));

        assert_eq!(key.len(), "routes".len() + 1 + HASH_LEN);
        assert!(key[7..].chars().all(|c| c.is_ascii_hexdigit()));
        assert!(!key.contains(&long));
    }

    #[test]
    fn test_signature_at_limit_is_kept() {
        let exact = "y".repeat(MAX_PARAMS_LEN);
        let key = build_key("p", &KeyArgs::new().arg(&exact));
        assert_eq!(key, format!("p:{}", exact));
    }

    #[test]
    fn test_tuple_args() {
        assert_eq!((1u64, "tram").key_args(), KeyArgs::new().arg(1).arg("tram"));
        assert_eq!(build_key("x", &(42u64,).key_args()), "x:42");
        assert_eq!(build_key("x", &42u64.key_args()), "x:42");
    }
}
