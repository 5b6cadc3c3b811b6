//! Blue-to-red color mapping of point data.

use rf_core::finite_range;
use serde::{Deserialize, Serialize};

use crate::error::{MeshError, MeshResult};
use crate::field::FieldArray;

pub const TABLE_SIZE: usize = 256;
const HUE_RANGE: [f64; 2] = [0.667, 0.0];
const NAN_COLOR: [f32; 4] = [0.5, 0.0, 0.0, 1.0];

/// Which value of each tuple is mapped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColorMode {
    Magnitude,
    Component(usize),
}

impl TryFrom<i32> for ColorMode {
    type Error = MeshError;

    /// `-1` selects the magnitude, `0..=2` a component.
    fn try_from(index: i32) -> MeshResult<Self> {
        match index {
            -1 => Ok(Self::Magnitude),
            0..=2 => Ok(Self::Component(index as usize)),
            _ => Err(MeshError::InvalidArgument {
                what: format!("color component index {index} is not one of -1, 0, 1, 2"),
            }),
        }
    }
}

/// Flat RGBA colors, one quadruple per tuple, and the range they span.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rendered {
    pub colors: Vec<f32>,
    pub range: [f64; 2],
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> [f64; 3] {
    let h6 = (h * 6.0).rem_euclid(6.0);
    let sector = h6.floor();
    let f = h6 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));
    match sector as u8 {
        0 => [v, t, p],
        1 => [q, v, p],
        2 => [p, v, t],
        3 => [p, q, v],
        4 => [t, p, v],
        _ => [v, p, q],
    }
}

/// 256-entry hue ramp from blue (low) to red (high), stored as bytes.
pub struct LookupTable {
    table: Vec<[u8; 4]>,
    range: [f64; 2],
}

impl LookupTable {
    pub fn new(range: [f64; 2]) -> Self {
        let table = (0..TABLE_SIZE)
            .map(|i| {
                let t = i as f64 / (TABLE_SIZE - 1) as f64;
                let hue = HUE_RANGE[0] + (HUE_RANGE[1] - HUE_RANGE[0]) * t;
                let [r, g, b] = hsv_to_rgb(hue, 1.0, 1.0);
                let byte = |c: f64| (c * 255.0 + 0.5) as u8;
                [byte(r), byte(g), byte(b), 255]
            })
            .collect();
        Self { table, range }
    }

    pub fn range(&self) -> [f64; 2] {
        self.range
    }

    fn index(&self, v: f64) -> usize {
        let [lo, hi] = self.range;
        if hi <= lo {
            return if v > lo { TABLE_SIZE - 1 } else { 0 };
        }
        let scaled = ((v - lo) * (TABLE_SIZE as f64 / (hi - lo))).floor();
        scaled.clamp(0.0, (TABLE_SIZE - 1) as f64) as usize
    }

    pub fn color(&self, v: f64) -> [f32; 4] {
        if v.is_nan() {
            return NAN_COLOR;
        }
        self.table[self.index(v)].map(|c| f32::from(c) / 255.0)
    }
}

/// Map every tuple of `field` to a color. Without `range` the finite extrema
/// of the mapped values are used and reported back.
pub fn render(field: &FieldArray, mode: ColorMode, range: Option<[f64; 2]>) -> MeshResult<Rendered> {
    if let ColorMode::Component(k) = mode
        && field.components > 1
        && k >= field.components
    {
        return Err(MeshError::InvalidArgument {
            what: format!("{} has no component {k}", field.name),
        });
    }
    let value = |i: usize| match (field.components, mode) {
        (1, _) => field.tuple(i)[0],
        (_, ColorMode::Magnitude) => field.magnitude(i),
        (_, ColorMode::Component(k)) => field.tuple(i)[k],
    };
    let values: Vec<f64> = (0..field.n_tuples()).map(value).collect();
    let range = match range {
        Some(r) => r,
        None => finite_range(values.iter().copied()).unwrap_or([0.0, 0.0]),
    };

    let table = LookupTable::new(range);
    let colors = values.iter().flat_map(|&v| table.color(v)).collect();
    Ok(Rendered { colors, range })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_range_spans_the_values() {
        let f = FieldArray::new("s", 1, (0..10).map(f64::from).collect()).unwrap();
        let r = render(&f, ColorMode::Magnitude, None).unwrap();
        assert_eq!(r.range, [0.0, 9.0]);
        assert_eq!(r.colors.len(), 40);
        // low end blue, high end red
        assert_eq!(&r.colors[0..4], &[1.0 / 255.0, 0.0, 1.0, 1.0]);
        assert_eq!(&r.colors[36..40], &[1.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn explicit_range_clamps() {
        let f = FieldArray::new("s", 1, vec![-5.0, 50.0]).unwrap();
        let r = render(&f, ColorMode::Component(0), Some([0.0, 1.0])).unwrap();
        assert_eq!(r.range, [0.0, 1.0]);
        assert_eq!(&r.colors[0..3], &[1.0 / 255.0, 0.0, 1.0]);
        assert_eq!(&r.colors[4..7], &[1.0, 0.0, 0.0]);
    }

    #[test]
    fn magnitude_mode_on_vectors() {
        let f = FieldArray::new("U", 3, vec![3.0, 4.0, 0.0, 0.0, 0.0, 1.0]).unwrap();
        let r = render(&f, ColorMode::Magnitude, None).unwrap();
        assert_eq!(r.range, [1.0, 5.0]);
        let r = render(&f, ColorMode::Component(1), None).unwrap();
        assert_eq!(r.range, [0.0, 4.0]);
    }

    #[test]
    fn nan_gets_the_nan_color() {
        let f = FieldArray::new("s", 1, vec![f64::NAN, 1.0, 2.0]).unwrap();
        let r = render(&f, ColorMode::Magnitude, None).unwrap();
        assert_eq!(r.range, [1.0, 2.0]);
        assert_eq!(&r.colors[0..4], &NAN_COLOR);
    }

    #[test]
    fn index_outside_minus_one_to_two_is_rejected() {
        assert_eq!(ColorMode::try_from(-1).unwrap(), ColorMode::Magnitude);
        assert_eq!(ColorMode::try_from(2).unwrap(), ColorMode::Component(2));
        assert!(ColorMode::try_from(3).is_err());
        assert!(ColorMode::try_from(-2).is_err());
    }
}
