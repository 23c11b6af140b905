//! Orientation classification from stream geometry
//!
//! A width/height pair is matched against a short, ordered table of canonical display ratios.
//! Anything that doesn't land within [`TOLERANCE`] of a canonical ratio keeps its literal
//! `width:height` label.


use std::fmt::Display;

const TOLERANCE: f64 = 0.01;

/// Canonical ratios in match order
const CANONICAL_RATIOS: &[(f64, AspectRatio)] = &[
    (16.0 / 9.0, AspectRatio::Widescreen),
    (9.0 / 16.0, AspectRatio::Vertical),
    (4.0 / 3.0, AspectRatio::Standard),
    (3.0 / 4.0, AspectRatio::StandardVertical),
    (1.0, AspectRatio::Square),
];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum AspectRatio {
    /// 16:9
    Widescreen,
    /// 9:16
    Vertical,
    /// 4:3
    Standard,
    /// 3:4
    StandardVertical,
    /// 1:1
    Square,
    Other { width: u32, height: u32 },
}

/// Storage key prefix derived from an [`AspectRatio`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) enum Orientation {
    Landscape,
    Portrait,
    Other,
}

/// Classify a width and height into an aspect ratio label
///
/// Among canonical ratios within tolerance the closest wins, and equal distances resolve to the
/// earlier table entry. Both dimensions must be non-zero.
pub(crate) fn classify(width: u32, height: u32) -> AspectRatio {
    let ratio = f64::from(width) / f64::from(height);

    let mut best: Option<(f64, AspectRatio)> = None;

    for (canonical, aspect) in CANONICAL_RATIOS {
        let difference = (ratio - canonical).abs();

        if difference >= TOLERANCE {
            continue;
        }

        match best {
            Some((closest, _)) if closest <= difference => {}
            _ => best = Some((difference, *aspect)),
        }
    }

    best.map(|(_, aspect)| aspect)
        .unwrap_or(AspectRatio::Other { width, height })
}

impl AspectRatio {
    pub(crate) const fn orientation(self) -> Orientation {
        match self {
            Self::Widescreen => Orientation::Landscape,
            Self::Vertical => Orientation::Portrait,
            _ => Orientation::Other,
        }
    }
}

impl Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Widescreen => f.write_str("16:9"),
            Self::Vertical => f.write_str("9:16"),
            Self::Standard => f.write_str("4:3"),
            Self::StandardVertical => f.write_str("3:4"),
            Self::Square => f.write_str("1:1"),
            Self::Other { width, height } => write!(f, "{width}:{height}"),
        }
    }
}

impl Orientation {
    /// Map a ratio label to its orientation
    ///
    /// Only the exact labels `16:9` and `9:16` are directional.
    pub(crate) fn from_label(label: &str) -> Self {
        match label {
            "16:9" => Self::Landscape,
            "9:16" => Self::Portrait,
            _ => Self::Other,
        }
    }

    pub(crate) const fn as_str(self) -> &'static str {
        match self {
            Self::Landscape => "landscape",
            Self::Portrait => "portrait",
            Self::Other => "other",
        }
    }
}

impl From<AspectRatio> for Orientation {
    fn from(value: AspectRatio) -> Self {
        value.orientation()
    }
}

impl Display for Orientation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
