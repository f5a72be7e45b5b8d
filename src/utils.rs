//! Name normalization and unit conversion helpers

use regex::Regex;
use std::sync::LazyLock;

static NON_SDF_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9_]+").expect("static pattern"));

/// Lowercases a CAD entity name and folds every run of characters outside
/// `[a-z0-9_]` into a single underscore. Leading and trailing underscores
/// are stripped, so the result is a valid SDF element name.
pub fn normalize_name(name: &str) -> String {
    let lower = name.to_lowercase();
    NON_SDF_CHARS
        .replace_all(&lower, "_")
        .trim_matches('_')
        .to_string()
}

/// Maps a flattened link name onto a mesh directory path, one directory level
/// per `__` separator.
pub fn name_to_path(name: &str) -> String {
    name.replace("__", "/")
}

/// CAD sources report lengths in centimeters, SDF wants meters.
pub fn cm_to_m(cm: f64) -> f64 {
    cm / 100.0
}

pub fn cm3_to_m(cm: [f64; 3]) -> [f64; 3] {
    cm.map(cm_to_m)
}

/// Moments of inertia arrive in kg·cm².
pub fn kg_cm2_to_kg_m2(value: f64) -> f64 {
    value / 10000.0
}

/// Parallel axis theorem: shifts an inertia tensor given about the model
/// origin to the center of mass. Both tensors are ordered
/// `(xx, yy, zz, xy, yz, xz)`.
pub fn origin_inertia_to_com_inertia(
    inertia: [f64; 6],
    center_of_mass: [f64; 3],
    mass: f64,
) -> [f64; 6] {
    let [x, y, z] = center_of_mass;
    let shift = [
        y * y + z * z,
        x * x + z * z,
        x * x + y * y,
        -x * y,
        -y * z,
        -x * z,
    ];
    std::array::from_fn(|i| inertia[i] - mass * shift[i])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("Wheel Left v3:1"), "wheel_left_v3_1");
        assert_eq!(normalize_name("  Base (rev B) "), "base_rev_b");
        assert_eq!(normalize_name("already_normal_1"), "already_normal_1");
        assert_eq!(normalize_name("___"), "");
    }

    #[test]
    fn test_name_to_path() {
        assert_eq!(
            name_to_path("arm__gripper__finger_visual"),
            "arm/gripper/finger_visual"
        );
        assert_eq!(name_to_path("base"), "base");
    }

    #[test]
    fn test_unit_conversions() {
        assert_eq!(cm_to_m(250.0), 2.5);
        assert_eq!(cm3_to_m([100.0, -50.0, 0.0]), [1.0, -0.5, 0.0]);
        assert_eq!(kg_cm2_to_kg_m2(10000.0), 1.0);
    }

    #[test]
    fn test_parallel_axis_shift() {
        // mass 2 at COM (1, 0, 0), unit diagonal inertia about the origin
        let shifted =
            origin_inertia_to_com_inertia([1.0, 1.0, 1.0, 0.0, 0.0, 0.0], [1.0, 0.0, 0.0], 2.0);
        assert_eq!(shifted, [1.0, -1.0, -1.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_parallel_axis_off_diagonal() {
        let shifted =
            origin_inertia_to_com_inertia([3.0, 3.0, 3.0, 0.5, 0.5, 0.5], [1.0, 2.0, 3.0], 1.0);
        assert_eq!(shifted[0], 3.0 - (4.0 + 9.0));
        assert_eq!(shifted[1], 3.0 - (1.0 + 9.0));
        assert_eq!(shifted[2], 3.0 - (1.0 + 4.0));
        assert_eq!(shifted[3], 0.5 + 2.0);
        assert_eq!(shifted[4], 0.5 + 6.0);
        assert_eq!(shifted[5], 0.5 + 3.0);
    }
}
