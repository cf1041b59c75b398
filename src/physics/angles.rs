//! Joint angle geometry
//!
//! Angles are measured at a vertex joint between the rays towards its two
//! neighbours, e.g. shoulder→elbow→wrist for the elbow bend.

/// Fold any angle in degrees into [0, 180].
///
/// Values are first wrapped into [0, 360); anything past 180 is reflected
/// (`360 - angle`), so 200° and 160° describe the same joint opening.
pub fn normalize_to_180(angle: f32) -> f32 {
    let wrapped = angle.rem_euclid(360.0);
    if wrapped > 180.0 {
        360.0 - wrapped
    } else {
        wrapped
    }
}

/// Angle in degrees at vertex `b`, formed by rays `b→a` and `b→c`.
///
/// Uses the difference of the two `atan2` headings, so the result is
/// independent of image orientation:
/// - 180° = joint fully straight
/// - 90°  = right angle
/// - 0°   = fully folded
pub fn angle_at(a: (f32, f32), b: (f32, f32), c: (f32, f32)) -> f32 {
    let to_c = (c.1 - b.1).atan2(c.0 - b.0);
    let to_a = (a.1 - b.1).atan2(a.0 - b.0);

    normalize_to_180((to_c - to_a).to_degrees().abs())
}
