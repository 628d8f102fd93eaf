//! Point-in-polygon test on the unsigned integer grid used by the map
//! containment query.

/// Checks whether a point lies inside a polygon (ray casting, even-odd rule).
///
/// The polygon is treated as implicitly closed. Fewer than 3 vertices can
/// never contain anything.
pub(crate) fn point_in_polygon(polygon: &[(u32, u32)], x: u32, y: u32) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let (px, py) = (f64::from(x), f64::from(y));
    let mut inside = false;
    let mut previous = *polygon.last().expect("polygon has at least 3 points");

    for &current in polygon {
        let (cx, cy) = (f64::from(current.0), f64::from(current.1));
        let (qx, qy) = (f64::from(previous.0), f64::from(previous.1));

        let crosses = (cy > py) != (qy > py)
            && px < (qx - cx) * (py - cy) / (qy - cy) + cx;
        if crosses {
            inside = !inside;
        }

        previous = current;
    }

    inside
}
