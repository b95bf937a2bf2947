/// Declare a struct aggregate together with its partial companion.
///
/// The partial struct has one `Option` per field, derives `Clone` and
/// `Default`, offers a builder method per field and converts into an
/// [`Update`](crate::Update). Merging clones every field the partial leaves
/// unset, so all field types must be `Clone`.
///
/// # Examples
///
/// ```
/// use tincan_store::{aggregate, Store};
///
/// aggregate! {
///     #[derive(Clone, Debug, PartialEq)]
///     pub struct Session => SessionPatch {
///         pub user_name: String,
///         pub active: bool,
///     }
/// }
///
/// let store = Store::new(Session { user_name: String::new(), active: false });
/// store.set(SessionPatch::default().active(true)).unwrap();
///
/// assert_eq!(*store.get(), Session { user_name: String::new(), active: true });
/// ```
#[macro_export]
macro_rules! aggregate {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident => $partial:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ty
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $ty,
            )*
        }

        #[doc = concat!("Fields to overwrite on a [`", stringify!($name), "`].")]
        #[derive(Clone, Default)]
        $vis struct $partial {
            $(
                $fvis $field: ::core::option::Option<$ty>,
            )*
        }

        impl $partial {
            $(
                #[doc = concat!("Set `", stringify!($field), "`.")]
                #[must_use]
                #[allow(dead_code)]
                $vis fn $field(mut self, value: impl ::core::convert::Into<$ty>) -> Self {
                    self.$field = ::core::option::Option::Some(value.into());
                    self
                }
            )*
        }

        impl $crate::Aggregate for $name {
            type Partial = $partial;

            fn merge(&self, partial: $partial) -> $crate::Result<Self> {
                ::core::result::Result::Ok($name {
                    $(
                        $field: match partial.$field {
                            ::core::option::Option::Some(value) => value,
                            ::core::option::Option::None => {
                                ::core::clone::Clone::clone(&self.$field)
                            }
                        },
                    )*
                })
            }
        }

        impl ::core::convert::From<$partial> for $crate::Update<'_, $name> {
            fn from(partial: $partial) -> Self {
                $crate::Update::Partial(partial)
            }
        }
    };
}
