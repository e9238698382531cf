/// Generates a BACnet enumeration that is open to vendor extensions.
///
/// BACnet enumerations such as object types, property identifiers and
/// engineering units reserve a block of values for the standard and leave the
/// rest to vendors. The generated enum has one variant per standard value plus
/// two catch-all variants:
///
/// * `Custom(<Name>Value)` for values inside `$custom_range` that are not named.
/// * `Reserved(<Name>Value)` for values outside that range that are not named.
///
/// # Example
///
/// ```rust
/// use bacnet_objects::generate_custom_enum;
///
/// generate_custom_enum! {
///     /// Fan speeds
///     FanSpeed {
///         Low = 1,
///         Medium = 2,
///         High = 3,
///     },
///     u16,
///     64..=65535
/// }
///
/// assert_eq!(FanSpeed::from(2u16), FanSpeed::Medium);
/// assert!(FanSpeed::from(100u16).is_custom());
/// assert!(matches!(FanSpeed::from(10u16), FanSpeed::Reserved(_)));
/// assert_eq!(u16::from(FanSpeed::High), 3);
/// assert_eq!(FanSpeed::from(100u16).to_string(), "Custom(100)");
/// ```
///
/// Besides the enum, the macro implements `Display` and the `From` conversions
/// in both directions with the underlying integer type. With the `serde`
/// feature of the invoking crate enabled, the generated types also derive
/// `Serialize` and `Deserialize`.
#[macro_export]
macro_rules! generate_custom_enum {
    ($(#[$doc:meta])* $name:ident { $($variant:ident = $value:literal,)+ }, $unit:ident, $custom_range:expr) => {
        pastey::paste! {
            $(#[$doc])*
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
            pub enum $name {
                $($variant,)*
                Custom( [<$name Value>] ),
                Reserved( [<$name Value>] ),
            }

            /// Raw value carried by an unnamed variant
            #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
            #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
            pub struct [<$name Value>] { value: $unit }

            impl [<$name Value>] {
                pub fn value(&self) -> $unit {
                    self.value
                }
            }

            impl $name {
                /// True for a value in the vendor range that has no standard name
                pub fn is_custom(&self) -> bool {
                    matches!(self, $name::Custom(_))
                }
            }

            impl std::fmt::Display for $name {
                fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                    match self {
                        $($name::$variant => write!(f, "{}", stringify!($variant)),)*
                        $name::Custom( value ) => write!(f, "Custom({})", value.value()),
                        $name::Reserved( value ) => write!(f, "Reserved({})", value.value()),
                    }
                }
            }

            impl From<$name> for $unit {
                fn from(value: $name) -> Self {
                    match value {
                        $($name::$variant => $value,)*
                        $name::Custom( value ) | $name::Reserved( value ) => value.value(),
                    }
                }
            }

            impl From<$unit> for $name {
                fn from(value: $unit) -> Self {
                    match value {
                        $($value => $name::$variant,)*
                        v if ($custom_range).contains(&v) => $name::Custom( [<$name Value>] { value: v } ),
                        v => $name::Reserved( [<$name Value>] { value: v } ),
                    }
                }
            }
        }
    };
}
