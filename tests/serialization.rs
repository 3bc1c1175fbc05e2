//! Serialization round-trip properties.

use cascara::{parse_property_value, PropertyRegistry, ToCss, Unit, Value};
use proptest::prelude::*;

proptest! {
    #[test]
    fn pixel_lengths_round_trip(v in -1.0e6f32..1.0e6f32) {
        let registry = PropertyRegistry::svg();
        let value = Value::Number(Unit::Px, v);
        let css = value.to_css_string();
        let parsed = parse_property_value(&registry, "stroke-width", &css).unwrap();
        prop_assert_eq!(parsed, value);
    }

    #[test]
    fn rgb_colors_round_trip(r in 0u8..=255, g in 0u8..=255, b in 0u8..=255) {
        let registry = PropertyRegistry::svg();
        let value = Value::rgb(f32::from(r), f32::from(g), f32::from(b));
        let css = value.to_css_string();
        let parsed = parse_property_value(&registry, "fill", &css).unwrap();
        prop_assert_eq!(parsed, value);
    }
}
