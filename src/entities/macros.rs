//! Macros for reducing boilerplate when defining entity enums
//!
//! Every enum attribute of the searched entities travels as a lowercase
//! string: in JSON requests, in YAML fixtures, and in SQL text columns.
//! `str_enum!` generates the enum with matching serde names, `as_str`,
//! `Display` and `FromStr`.

/// Define a fieldless enum with a fixed string representation per variant
///
/// # Example
/// ```rust,ignore
/// str_enum! {
///     /// Store lifecycle status
///     pub enum StoreStatus {
///         Active => "active",
///         Closed => "closed",
///     }
/// }
///
/// assert_eq!(StoreStatus::Active.as_str(), "active");
/// assert_eq!("closed".parse::<StoreStatus>().unwrap(), StoreStatus::Closed);
/// ```
#[macro_export]
macro_rules! str_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The wire representation of this variant
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = $crate::core::error::ValidationError;

            fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err($crate::core::error::ValidationError::FieldError {
                        field: stringify!($name).to_string(),
                        message: format!("unknown value '{}'", other),
                    }),
                }
            }
        }
    };
}
