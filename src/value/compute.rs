//! Unit conversion math used by value computation.
//!
//! Absolute units collapse to user-space pixels through the context's
//! pixel-per-millimeter factor; percentages resolve against a containing
//! block dimension selected by orientation.

use super::Unit;

/// Which containing-block dimension a percentage resolves against.
///
/// `Both` applies the SVG diagonal rule used for quantities such as
/// `stroke-width` percentages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    Horizontal,
    Vertical,
    Both,
}

/// Convert an absolute length to pixels, or `None` if the unit is not an
/// absolute length (relative units need cascade context to resolve).
pub fn absolute_to_pixels(unit: Unit, v: f32, px_per_mm: f32) -> Option<f32> {
    match unit {
        Unit::None | Unit::Px => Some(v),
        Unit::Mm => Some(v / px_per_mm),
        Unit::Cm => Some(v * 10.0 / px_per_mm),
        Unit::In => Some(v * 25.4 / px_per_mm),
        Unit::Pt => Some(v * 25.4 / (72.0 * px_per_mm)),
        Unit::Pc => Some(v * 25.4 / (6.0 * px_per_mm)),
        _ => None,
    }
}

/// The dimension a percentage of `orientation` resolves against, given the
/// containing block's width and height.
pub fn percentage_basis(orientation: Orientation, width: f32, height: f32) -> f32 {
    match orientation {
        Orientation::Horizontal => width,
        Orientation::Vertical => height,
        Orientation::Both => {
            let (w, h) = (f64::from(width), f64::from(height));
            ((w * w + h * h) / 2.0).sqrt() as f32
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 96 dpi, expressed as the px->mm factor the context reports.
    const PX_PER_MM: f32 = 0.26458332;

    #[test]
    fn test_absolute_passthrough() {
        assert_eq!(absolute_to_pixels(Unit::Px, 42.0, PX_PER_MM), Some(42.0));
        assert_eq!(absolute_to_pixels(Unit::None, 42.0, PX_PER_MM), Some(42.0));
    }

    #[test]
    fn test_millimeter_chain() {
        let mm = absolute_to_pixels(Unit::Mm, 1.0, PX_PER_MM).unwrap();
        let cm = absolute_to_pixels(Unit::Cm, 1.0, PX_PER_MM).unwrap();
        let inch = absolute_to_pixels(Unit::In, 1.0, PX_PER_MM).unwrap();
        assert!((cm - mm * 10.0).abs() < 1e-3);
        assert!((inch - mm * 25.4).abs() < 1e-3);
    }

    #[test]
    fn test_points_and_picas() {
        let inch = absolute_to_pixels(Unit::In, 1.0, PX_PER_MM).unwrap();
        let pt = absolute_to_pixels(Unit::Pt, 72.0, PX_PER_MM).unwrap();
        let pc = absolute_to_pixels(Unit::Pc, 6.0, PX_PER_MM).unwrap();
        assert!((pt - inch).abs() < 1e-3);
        assert!((pc - inch).abs() < 1e-3);
    }

    #[test]
    fn test_relative_units_need_context() {
        assert_eq!(absolute_to_pixels(Unit::Em, 1.0, PX_PER_MM), None);
        assert_eq!(absolute_to_pixels(Unit::Ex, 1.0, PX_PER_MM), None);
        assert_eq!(absolute_to_pixels(Unit::Percent, 50.0, PX_PER_MM), None);
    }

    #[test]
    fn test_percentage_basis() {
        assert_eq!(percentage_basis(Orientation::Horizontal, 200.0, 100.0), 200.0);
        assert_eq!(percentage_basis(Orientation::Vertical, 200.0, 100.0), 100.0);
        // sqrt((200^2 + 100^2) / 2) = sqrt(25000) ~ 158.11
        let diag = percentage_basis(Orientation::Both, 200.0, 100.0);
        assert!((diag - 158.113_88).abs() < 1e-2);
    }
}
