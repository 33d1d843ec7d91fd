//! Newtype codes for type-safe ERP references.
//!
//! ERP identifiers are strings (order numbers keep their leading zeros), so
//! the `define_code!` macro wraps `String` rather than an integer.

/// Macro to define a type-safe code wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `is_empty()`
/// - `From<&str>`, `From<String>` and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use inbound_core::define_code;
/// define_code!(WarehouseCode);
/// define_code!(LocationCode);
///
/// let warehouse = WarehouseCode::new("WH01");
/// let location = LocationCode::new("A-01-02");
///
/// // These are different types, so this won't compile:
/// // let _: WarehouseCode = location;
/// ```
#[macro_export]
macro_rules! define_code {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Default,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new code, trimming surrounding whitespace.
            #[must_use]
            pub fn new(code: impl AsRef<str>) -> Self {
                Self(code.as_ref().trim().to_string())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the code is blank.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(code: &str) -> Self {
                Self::new(code)
            }
        }

        impl From<String> for $name {
            fn from(code: String) -> Self {
                Self::new(code)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

// Define standard ERP codes
define_code!(OrderNumber);
define_code!(ItemCode);
define_code!(BusinessPartnerCode);
define_code!(ReceiptNumber);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_trims_input() {
        let order = OrderNumber::new("  200000066 ");
        assert_eq!(order.as_str(), "200000066");
        assert_eq!(order.to_string(), "200000066");
    }

    #[test]
    fn test_code_keeps_leading_zeros() {
        let item = ItemCode::from("000123");
        assert_eq!(item.as_str(), "000123");
    }

    #[test]
    fn test_code_is_empty() {
        assert!(BusinessPartnerCode::new("   ").is_empty());
        assert!(!BusinessPartnerCode::new("SUP001").is_empty());
    }
}
