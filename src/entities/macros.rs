//! Macros for reducing boilerplate when defining records
//!
//! These macros generate the repetitive trait implementations needed
//! for each table mirrored by the dashboard.

/// Declare a closed set of backend labels as a Rust enum.
///
/// Generates serde (label form), `Display`, `FromStr` and
/// [`ClosedSet`](crate::core::entity::ClosedSet).
///
/// # Example
///
/// ```rust,ignore
/// closed_set!(
///     /// Lifecycle of a coupon
///     CouponStatus {
///         Valid => "valid",
///         Invalid => "invalid",
///     }
/// );
/// ```
#[macro_export]
macro_rules! closed_set {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $variant:ident => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $label)]
                $variant
            ),+
        }

        impl $crate::core::entity::ClosedSet for $name {
            fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }

            fn variants() -> &'static [Self] {
                &[ $( $name::$variant ),+ ]
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::core::entity::ClosedSet::as_str(self))
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = String;

            fn from_str(label: &str) -> Result<Self, Self::Err> {
                <Self as $crate::core::entity::ClosedSet>::parse(label)
                    .ok_or_else(|| format!("unknown {} '{}'", stringify!($name), label))
            }
        }
    };
}

/// Complete macro to create a record type with automatic trait implementations
///
/// The generated struct carries the base columns (`id`, `type`,
/// `created_at`, `updated_at`, `deleted_at`, `status`, `owner_id`, `name`)
/// followed by the specific ones.
///
/// # Example
///
/// ```rust,ignore
/// use opsboard::prelude::*;
///
/// impl_data_entity!(
///     Coupon,
///     "coupon",
///     "coupons",
///     CouponStatus,
///     ["name", "code"],
///     {
///         code: String,
///         value: f64,
///     }
/// );
///
/// let coupon = Coupon::new(
///     "Welcome".to_string(),
///     CouponStatus::Valid,
///     None,
///     "WELCOME10".to_string(),
///     10.0,
/// );
/// ```
#[macro_export]
macro_rules! impl_data_entity {
    (
        $type:ident,
        $type_name:expr,
        $plural:expr,
        $status:ty,
        [ $( $indexed_field:expr ),* $(,)? ],
        {
            $( $(#[$field_meta:meta])* $specific_field:ident : $specific_type:ty ),* $(,)?
        }
    ) => {
        #[derive(Debug, Clone, PartialEq, ::serde::Serialize, ::serde::Deserialize)]
        pub struct $type {
            /// Unique identifier for this record
            pub id: ::uuid::Uuid,

            /// Type of the record
            #[serde(rename = "type")]
            pub entity_type: String,

            /// When this record was created
            pub created_at: ::chrono::DateTime<::chrono::Utc>,

            /// When this record was last updated
            pub updated_at: ::chrono::DateTime<::chrono::Utc>,

            /// When this record was soft-deleted (if applicable)
            pub deleted_at: Option<::chrono::DateTime<::chrono::Utc>>,

            /// Current status of the record
            pub status: $status,

            /// Owning user, if the row is user-scoped
            pub owner_id: Option<::uuid::Uuid>,

            /// Display name of this record
            pub name: String,
            $( $(#[$field_meta])* pub $specific_field : $specific_type ),*
        }

        impl $crate::core::entity::Entity for $type {
            type Status = $status;

            fn resource_name() -> &'static str {
                $plural
            }

            fn resource_name_singular() -> &'static str {
                $type_name
            }

            fn id(&self) -> ::uuid::Uuid {
                self.id
            }

            fn entity_type(&self) -> &str {
                &self.entity_type
            }

            fn created_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.created_at
            }

            fn updated_at(&self) -> ::chrono::DateTime<::chrono::Utc> {
                self.updated_at
            }

            fn deleted_at(&self) -> Option<::chrono::DateTime<::chrono::Utc>> {
                self.deleted_at
            }

            fn status(&self) -> $status {
                self.status
            }

            fn owner_id(&self) -> Option<::uuid::Uuid> {
                self.owner_id
            }

            fn soft_delete(&mut self) {
                let now = ::chrono::Utc::now();
                self.deleted_at = Some(now);
                self.updated_at = now;
            }

            fn restore(&mut self) {
                self.deleted_at = None;
                self.updated_at = ::chrono::Utc::now();
            }

            fn touch(&mut self) {
                self.updated_at = ::chrono::Utc::now();
            }
        }

        impl $crate::core::entity::Data for $type {
            fn name(&self) -> &str {
                &self.name
            }

            fn indexed_fields() -> &'static [&'static str] {
                &[ $( $indexed_field ),* ]
            }

            fn field_value(&self, field: &str) -> Option<$crate::core::field::FieldValue> {
                use $crate::core::field::FieldValue;

                match field {
                    "id" => Some(FieldValue::Uuid(self.id)),
                    "type" => Some(FieldValue::String(self.entity_type.clone())),
                    "name" => Some(FieldValue::String(self.name.clone())),
                    "status" => Some(FieldValue::String(
                        $crate::core::entity::ClosedSet::as_str(&self.status).to_string(),
                    )),
                    "created_at" => Some(FieldValue::DateTime(self.created_at)),
                    "updated_at" => Some(FieldValue::DateTime(self.updated_at)),
                    "deleted_at" => Some(
                        self.deleted_at
                            .map(FieldValue::DateTime)
                            .unwrap_or(FieldValue::Null),
                    ),
                    "owner_id" => Some(
                        self.owner_id
                            .map(FieldValue::Uuid)
                            .unwrap_or(FieldValue::Null),
                    ),
                    $(
                        stringify!($specific_field) => ::serde_json::to_value(&self.$specific_field)
                            .ok()
                            .map(|value| FieldValue::from_json(&value)),
                    )*
                    _ => None,
                }
            }
        }

        impl $type {
            /// Create a new record stamped with fresh id and timestamps
            #[allow(clippy::too_many_arguments)]
            pub fn new(
                name: String,
                status: $status,
                owner_id: Option<::uuid::Uuid>,
                $( $specific_field: $specific_type ),*
            ) -> Self {
                let now = ::chrono::Utc::now();
                Self {
                    id: ::uuid::Uuid::new_v4(),
                    entity_type: $type_name.to_string(),
                    created_at: now,
                    updated_at: now,
                    deleted_at: None,
                    status,
                    owner_id,
                    name,
                    $( $specific_field ),*
                }
            }

            /// Change the record status
            pub fn set_status(&mut self, status: $status) {
                self.status = status;
                $crate::core::entity::Entity::touch(self);
            }
        }
    };
}
