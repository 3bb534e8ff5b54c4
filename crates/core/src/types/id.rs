//! Newtype IDs for type-safe entity references.
//!
//! Every catalog and backend identifier in Eazyy is a UUID. Use the
//! `define_id!` macro to create wrappers that prevent accidentally mixing IDs
//! from different entity types, and that only accept the canonical hyphenated
//! text form (`8-4-4-4-12` hex digits, case-insensitive).

/// Error returned when a string is not a hyphenated UUID.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid UUID: {0:?}")]
pub struct IdError(pub String);

/// Hex digit counts of the five hyphen-separated UUID groups.
const UUID_GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

/// Returns `true` if `s` is a hyphenated UUID in any letter case.
///
/// This is stricter than [`uuid::Uuid::parse_str`], which also accepts the
/// simple, braced and URN forms.
///
/// ```
/// use eazyy_core::is_valid_uuid;
///
/// assert!(is_valid_uuid("11111111-1111-1111-1111-111111111111"));
/// assert!(is_valid_uuid("A0EEBC99-9C0B-4EF8-BB6D-6BB9BD380A11"));
/// assert!(!is_valid_uuid("a0eebc999c0b4ef8bb6d6bb9bd380a11"));
/// assert!(!is_valid_uuid("shirt-01"));
/// ```
#[must_use]
pub fn is_valid_uuid(s: &str) -> bool {
    let mut groups = s.split('-');

    let all_groups_match = UUID_GROUPS.iter().all(|&len| {
        groups
            .next()
            .is_some_and(|group| group.len() == len && group.bytes().all(|b| b.is_ascii_hexdigit()))
    });

    all_groups_match && groups.next().is_none()
}

/// Macro to define a type-safe UUID wrapper.
///
/// Creates a newtype wrapper around [`uuid::Uuid`] with:
/// - `parse()` that only accepts the hyphenated form (see [`is_valid_uuid`])
/// - `Serialize`/`Deserialize` as the hyphenated string, rejecting other forms
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `Display`, `FromStr`, and conversions to and from `Uuid`
///
/// # Example
///
/// ```rust
/// # use eazyy_core::define_id;
/// define_id!(BasketId);
/// define_id!(VoucherId);
///
/// let basket = BasketId::parse("11111111-1111-1111-1111-111111111111").unwrap();
/// assert!(VoucherId::parse("not-a-uuid").is_err());
///
/// // These are different types, so this won't compile:
/// // let _: VoucherId = basket;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(::uuid::Uuid);

        impl $name {
            /// Parse an ID from its hyphenated text form.
            ///
            /// # Errors
            ///
            /// Returns [`IdError`](crate::IdError) if `s` is not a hyphenated UUID.
            pub fn parse(s: &str) -> ::core::result::Result<Self, $crate::IdError> {
                if !$crate::is_valid_uuid(s) {
                    return Err($crate::IdError(s.to_owned()));
                }

                ::uuid::Uuid::parse_str(s)
                    .map(Self)
                    .map_err(|_| $crate::IdError(s.to_owned()))
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: ::uuid::Uuid) -> Self {
                Self(uuid)
            }

            /// Generate a new random (v4) ID.
            #[must_use]
            pub fn new_v4() -> Self {
                Self(::uuid::Uuid::new_v4())
            }

            /// Get the underlying UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> &::uuid::Uuid {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                ::core::fmt::Display::fmt(&self.0.hyphenated(), f)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl From<::uuid::Uuid> for $name {
            fn from(uuid: ::uuid::Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for ::uuid::Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl ::serde::Serialize for $name {
            fn serialize<S: ::serde::Serializer>(
                &self,
                serializer: S,
            ) -> ::core::result::Result<S::Ok, S::Error> {
                serializer.collect_str(&self.0.hyphenated())
            }
        }

        impl<'de> ::serde::Deserialize<'de> for $name {
            fn deserialize<D: ::serde::Deserializer<'de>>(
                deserializer: D,
            ) -> ::core::result::Result<Self, D::Error> {
                let s = <::std::string::String as ::serde::Deserialize>::deserialize(deserializer)?;
                Self::parse(&s).map_err(::serde::de::Error::custom)
            }
        }
    };
}

// Catalog entities
define_id!(ServiceId);
define_id!(CategoryId);
define_id!(ItemId);

// Backend records
define_id!(UserId);
define_id!(OrderId);
define_id!(OrderItemId);
define_id!(QuoteId);
define_id!(DiscrepancyItemId);
