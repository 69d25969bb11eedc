//! Symmetric rules for triangles and tetrahedra.
//!
//! Triangle rules are the symmetric rules of
//! D. A. Dunavant, *High degree efficient symmetrical Gaussian quadrature rules for the
//! triangle*, IJNME 21(6), 1985, selected by index `1..=5` (strengths 1, 2, 4, 5 and 7).
//! Tetrahedron rules of strength 1, 2 and 3 are selected by index `1..=3`.
//!
//! The tables are stored as symmetry orbits and expanded on request.

use crate::{Error, TetrahedronRule, TriangleRule};

/// A symmetry orbit of barycentric points sharing a weight.
#[derive(Debug, Clone, Copy)]
enum Orbit {
    /// The centroid.
    Centroid(f64),
    /// All points with one coordinate equal to `a` and the remaining coordinates equal to `b`.
    OneDistinct { a: f64, b: f64, weight: f64 },
    /// All permutations of `(a, b, c)` (triangles only).
    AllDistinct { a: f64, b: f64, c: f64, weight: f64 },
}

const TRIANGLE_ORBITS: [&[Orbit]; 5] = [
    &[Orbit::Centroid(1.0)],
    &[Orbit::OneDistinct { a: 2.0 / 3.0, b: 1.0 / 6.0, weight: 1.0 / 3.0 }],
    &[
        Orbit::OneDistinct { a: 0.816847572980440, b: 0.091576213509780, weight: 0.109951743655333 },
        Orbit::OneDistinct { a: 0.108103018168071, b: 0.445948490915964, weight: 0.223381589678000 },
    ],
    &[
        Orbit::OneDistinct { a: 0.888871894660413, b: 0.055564052669793, weight: 0.041955512996649 },
        Orbit::AllDistinct {
            a: 0.295533711735893,
            b: 0.634210747745723,
            c: 0.070255540518384,
            weight: 0.112098412070887,
        },
        Orbit::Centroid(0.201542988584730),
    ],
    &[
        Orbit::OneDistinct { a: 0.928258244608533, b: 0.035870877695734, weight: 0.017915455012303 },
        Orbit::OneDistinct { a: 0.516541208464066, b: 0.241729395767967, weight: 0.127712195881265 },
        Orbit::OneDistinct { a: 0.051382424445843, b: 0.474308787777079, weight: 0.076206062385535 },
        Orbit::AllDistinct {
            a: 0.201503881881800,
            b: 0.751183631106484,
            c: 0.047312487011716,
            weight: 0.055749810027115,
        },
    ],
];

const TRIANGLE_STRENGTHS: [usize; 5] = [1, 2, 4, 5, 7];

const TETRAHEDRON_ORBITS: [&[Orbit]; 3] = [
    &[Orbit::Centroid(1.0)],
    &[Orbit::OneDistinct { a: 0.5854101966249685, b: 0.1381966011250105, weight: 0.25 }],
    &[
        Orbit::Centroid(-0.8),
        Orbit::OneDistinct { a: 0.5, b: 1.0 / 6.0, weight: 0.45 },
    ],
];

const TETRAHEDRON_STRENGTHS: [usize; 3] = [1, 2, 3];

/// The triangle rule with the given index (`1..=5`).
pub fn triangle(index: usize) -> Result<TriangleRule, Error> {
    let orbits = index
        .checked_sub(1)
        .and_then(|i| TRIANGLE_ORBITS.get(i))
        .ok_or(Error::NoRuleAvailable)?;
    Ok(expand(orbits))
}

/// The polynomial strength of the triangle rule with the given index.
pub fn triangle_strength(index: usize) -> Option<usize> {
    index
        .checked_sub(1)
        .and_then(|i| TRIANGLE_STRENGTHS.get(i).copied())
}

/// The tetrahedron rule with the given index (`1..=3`).
pub fn tetrahedron(index: usize) -> Result<TetrahedronRule, Error> {
    let orbits = index
        .checked_sub(1)
        .and_then(|i| TETRAHEDRON_ORBITS.get(i))
        .ok_or(Error::NoRuleAvailable)?;
    Ok(expand(orbits))
}

/// The polynomial strength of the tetrahedron rule with the given index.
pub fn tetrahedron_strength(index: usize) -> Option<usize> {
    index
        .checked_sub(1)
        .and_then(|i| TETRAHEDRON_STRENGTHS.get(i).copied())
}

fn expand<const N: usize>(orbits: &[Orbit]) -> (Vec<f64>, Vec<[f64; N]>) {
    let mut weights = Vec::new();
    let mut points = Vec::new();
    let mut push = |point: [f64; N], weight: f64| {
        // Permutations of repeated values produce the same point more than once
        if !points.contains(&point) {
            points.push(point);
            weights.push(weight);
        }
    };

    for orbit in orbits {
        match *orbit {
            Orbit::Centroid(weight) => push([1.0 / N as f64; N], weight),
            Orbit::OneDistinct { a, b, weight } => {
                for i in 0..N {
                    let mut point = [b; N];
                    point[i] = a;
                    push(point, weight);
                }
            }
            Orbit::AllDistinct { a, b, c, weight } => {
                assert_eq!(N, 3, "orbit only defined for triangles");
                let values = [a, b, c];
                for [i, j, k] in [[0, 1, 2], [0, 2, 1], [2, 0, 1], [1, 0, 2], [1, 2, 0], [2, 1, 0]] {
                    let mut point = [0.0; N];
                    point[0] = values[i];
                    point[1] = values[j];
                    point[2] = values[k];
                    push(point, weight);
                }
            }
        }
    }

    (weights, points)
}
