// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Declarative macros for reducing boilerplate.
//!
//! - [`display_names!`] — `as_str()` plus a delegating `Display` impl for
//!   closed name enums (artifact kinds, field kinds, severities)
//! - [`field_setters!`] — chainable setter methods for the config builder

/// Generate `as_str()` and a `Display` impl mapping enum variants to their
/// wire/log names.
///
/// The `&'static str` form is what log messages and mapping-table keys
/// want; `Display` just delegates to it. Unit variants match directly;
/// data-carrying variants use `(..)` to ignore fields.
///
/// ```ignore
/// crate::display_names! {
///     ArtifactKind {
///         Incident => "incident",
///         Task => "task",
///     }
/// }
/// assert_eq!(ArtifactKind::Incident.as_str(), "incident");
/// ```
#[macro_export]
macro_rules! display_names {
    ($enum:ty { $( $variant:ident $(( $($ignore:tt)* ))? => $str:expr ),+ $(,)? }) => {
        impl $enum {
            /// The fixed name for this variant.
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $( Self::$variant $(( $($ignore)* ))? => $str, )+
                }
            }
        }

        impl std::fmt::Display for $enum {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

/// Generate chainable `#[must_use]` setter methods inside an existing
/// `impl` block, as used by [`SyncConfigBuilder`](crate::SyncConfigBuilder).
///
/// Field groups:
/// - `into { field: Type }` — setter takes `impl Into<Type>`
/// - `set { field: Type }` — setter takes `Type` directly
/// - `option { field: Type }` — builder field is `Option<Type>`, setter
///   wraps the value in `Some(v.into())`
///
/// ```ignore
/// impl SyncConfigBuilder {
///     tb_core::field_setters! {
///         into { pms_base_url: String }
///         set { time_offset_hours: i32 }
///         option { artifact_id_field: String }
///     }
/// }
/// ```
#[macro_export]
macro_rules! field_setters {
    (
        $(into {
            $( $into_field:ident : $into_ty:ty ),* $(,)?
        })?
        $(set {
            $( $set_field:ident : $set_ty:ty ),* $(,)?
        })?
        $(option {
            $( $opt_field:ident : $opt_ty:ty ),* $(,)?
        })?
    ) => {
        $($(
            #[must_use]
            pub fn $into_field(mut self, v: impl Into<$into_ty>) -> Self {
                self.$into_field = v.into();
                self
            }
        )*)?

        $($(
            #[must_use]
            pub fn $set_field(mut self, v: $set_ty) -> Self {
                self.$set_field = v;
                self
            }
        )*)?

        $($(
            #[must_use]
            pub fn $opt_field(mut self, v: impl Into<$opt_ty>) -> Self {
                self.$opt_field = Some(v.into());
                self
            }
        )*)?
    };
}
