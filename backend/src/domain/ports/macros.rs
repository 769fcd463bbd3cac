//! Declarative builder for port error enums.
//!
//! Every variant names the [`ErrorCode`](crate::domain::ErrorCode) it
//! surfaces as, so adapters report failures in port terms while services
//! convert them into the domain [`Error`](crate::domain::Error) with `?` or
//! `Error::from`. Variants that need extra context (conflict details, hidden
//! provider messages) are still matched by hand before falling back to the
//! generated conversion.
//!
//! ```ignore
//! define_port_error! {
//!     pub enum ExampleError {
//!         Connection { message: String } => ServiceUnavailable("down: {message}"),
//!         Gone => NotFound("already removed"),
//!     }
//! }
//! ```

macro_rules! define_port_error {
    (@ctor $variant:ident) => {
        ::paste::paste! {
            #[doc = "Build the `" $variant "` variant."]
            pub fn [<$variant:snake>]() -> Self {
                Self::$variant
            }
        }
    };

    (@ctor $variant:ident { $($field:ident : $ty:ty),* $(,)? }) => {
        ::paste::paste! {
            #[doc = "Build the `" $variant "` variant."]
            pub fn [<$variant:snake>]($($field: impl Into<$ty>),*) -> Self {
                Self::$variant { $($field: $field.into()),* }
            }
        }
    };

    (
        $(#[$outer:meta])*
        pub enum $name:ident {
            $(
                $(#[$variant_meta:meta])*
                $variant:ident $( { $($field:ident : $ty:ty),* $(,)? } )?
                    => $code:ident ( $message:literal )
            ),* $(,)?
        }
    ) => {
        $(#[$outer])*
        #[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
        pub enum $name {
            $(
                $(#[$variant_meta])*
                #[error($message)]
                $variant $( { $($field : $ty),* } )?,
            )*
        }

        impl $name {
            $(
                define_port_error!(@ctor $variant $( { $($field : $ty),* } )?);
            )*

            /// Client-facing classification of this failure.
            #[must_use]
            pub const fn code(&self) -> $crate::domain::ErrorCode {
                match self {
                    $( Self::$variant { .. } => $crate::domain::ErrorCode::$code, )*
                }
            }
        }

        impl From<$name> for $crate::domain::Error {
            fn from(error: $name) -> Self {
                Self::new(error.code(), error.to_string())
            }
        }
    };
}

pub(crate) use define_port_error;
