//! Click translation and hit testing.
//!
//! A single pointer click yields two independent positions: a normalized
//! position in image percent (used for judging guesses) and the raw page
//! position (used only to anchor the choice menu and the found markers).

/// Position on the scene image, in whole percent of the rendered image width.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScenePoint {
    pub x: i32,
    pub y: i32,
}

impl ScenePoint {
    pub const fn new(x: i32, y: i32) -> Self { Self { x, y } }
}

/// Absolute page position in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PagePoint {
    pub x: i32,
    pub y: i32,
}

impl PagePoint {
    pub const fn new(x: i32, y: i32) -> Self { Self { x, y } }
}

/// Raw measurements taken from a click on the scene image.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneClick {
    /// Offset from the image's left edge.
    pub offset_x: f64,
    /// Offset from the image's top edge.
    pub offset_y: f64,
    pub page: PagePoint,
    /// Rendered image size at click time.
    pub rendered_width: f64,
    pub rendered_height: f64,
}

impl SceneClick {
    /// Normalized image coordinates of the click.
    ///
    /// Both offsets are divided by the rendered *width* unless
    /// `scale_y_by_height` is set; the stored roster coordinates were
    /// measured that way. Returns `None` when the image has no rendered size.
    pub fn scene_point(&self, scale_y_by_height: bool) -> Option<ScenePoint> {
        let y_divisor = if scale_y_by_height { self.rendered_height } else { self.rendered_width };
        Some(ScenePoint {
            x: percent_of(self.offset_x, self.rendered_width)?,
            y: percent_of(self.offset_y, y_divisor)?,
        })
    }
}

fn percent_of(offset: f64, extent: f64) -> Option<i32> {
    if extent.is_nan() || extent <= 0.0 || !offset.is_finite() {
        return None;
    }
    Some((offset / extent * 100.0).floor() as i32)
}

/// Accept iff each axis is within `tolerance` (inclusive) of the target.
pub fn within_tolerance(click: ScenePoint, target: ScenePoint, tolerance: i32) -> bool {
    near(click.x, target.x, tolerance) && near(click.y, target.y, tolerance)
}

fn near(value: i32, center: i32, tolerance: i32) -> bool {
    tolerance >= 0 && value.abs_diff(center) <= tolerance.unsigned_abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn click(offset_x: f64, offset_y: f64, w: f64, h: f64) -> SceneClick {
        SceneClick {
            offset_x,
            offset_y,
            page: PagePoint::new(0, 0),
            rendered_width: w,
            rendered_height: h,
        }
    }

    #[test]
    fn normalizes_and_floors() {
        let c = click(199.0, 50.0, 400.0, 400.0);
        assert_eq!(c.scene_point(false), Some(ScenePoint::new(49, 12)));
    }

    // The Y axis is scaled by the image width, not its height. On a
    // non-square image this skews Y; it is kept because the stored roster
    // coordinates were captured with the same transform.
    #[test]
    fn y_axis_is_divided_by_width_by_default() {
        let c = click(100.0, 100.0, 400.0, 200.0);
        assert_eq!(c.scene_point(false), Some(ScenePoint::new(25, 25)));
        assert_eq!(c.scene_point(true), Some(ScenePoint::new(25, 50)));
    }

    #[test]
    fn zero_sized_image_yields_nothing() {
        assert_eq!(click(10.0, 10.0, 0.0, 0.0).scene_point(false), None);
        assert_eq!(click(10.0, 10.0, 100.0, 0.0).scene_point(true), None);
        assert_eq!(click(f64::NAN, 10.0, 100.0, 100.0).scene_point(false), None);
    }

    #[test]
    fn tolerance_boundary_is_inclusive() {
        let target = ScenePoint::new(50, 50);
        assert!(within_tolerance(ScenePoint::new(50, 50), target, 1));
        assert!(within_tolerance(ScenePoint::new(51, 49), target, 1));
        assert!(within_tolerance(ScenePoint::new(49, 51), target, 1));
        assert!(!within_tolerance(ScenePoint::new(52, 50), target, 1));
        assert!(!within_tolerance(ScenePoint::new(50, 48), target, 1));
    }

    #[test]
    fn extreme_values_do_not_overflow() {
        let edge = ScenePoint::new(i32::MAX, i32::MIN);
        assert!(within_tolerance(edge, edge, 1));
        assert!(within_tolerance(ScenePoint::new(0, 0), ScenePoint::new(50, 50), i32::MAX));
        assert!(!within_tolerance(ScenePoint::new(i32::MIN, 0), ScenePoint::new(i32::MAX, 0), i32::MAX));
        assert!(!within_tolerance(edge, edge, -1));
    }

    #[test]
    fn both_axes_must_pass() {
        let target = ScenePoint::new(10, 90);
        assert!(!within_tolerance(ScenePoint::new(10, 92), target, 1));
        assert!(!within_tolerance(ScenePoint::new(12, 90), target, 1));
    }
}
