//! Info channels probed from the field, and the index table that maps
//! each enabled channel to its slice of a particle's info vector.

use std::fmt;

/// One field quantity the probe backend can answer at a position.
///
/// Scalar channels (`Isovalue`, `Height`, `HeightLaplacian`) carry one
/// value; their spatial derivatives live in the companion gradient and
/// Hessian channels. Tangent channels carry unit 3-vectors framing the
/// crease geometry at the probe position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfoKind {
    Isovalue,
    IsovalueGradient,
    IsovalueHessian,
    Height,
    HeightGradient,
    HeightHessian,
    HeightLaplacian,
    Tangent1,
    Tangent2,
    NegativeTangent1,
    NegativeTangent2,
}

impl InfoKind {
    /// Every channel, in canonical order.
    pub const ALL: [InfoKind; 11] = [
        InfoKind::Isovalue,
        InfoKind::IsovalueGradient,
        InfoKind::IsovalueHessian,
        InfoKind::Height,
        InfoKind::HeightGradient,
        InfoKind::HeightHessian,
        InfoKind::HeightLaplacian,
        InfoKind::Tangent1,
        InfoKind::Tangent2,
        InfoKind::NegativeTangent1,
        InfoKind::NegativeTangent2,
    ];

    /// Number of doubles in this channel's answer.
    pub fn answer_len(self) -> usize {
        match self {
            InfoKind::Isovalue | InfoKind::Height | InfoKind::HeightLaplacian => 1,
            InfoKind::IsovalueGradient
            | InfoKind::HeightGradient
            | InfoKind::Tangent1
            | InfoKind::Tangent2
            | InfoKind::NegativeTangent1
            | InfoKind::NegativeTangent2 => 3,
            InfoKind::IsovalueHessian | InfoKind::HeightHessian => 9,
        }
    }

    /// Channel holding the spatial gradient of `self`, if it has one.
    pub(crate) fn gradient_kind(self) -> Option<InfoKind> {
        match self {
            InfoKind::Isovalue => Some(InfoKind::IsovalueGradient),
            InfoKind::Height => Some(InfoKind::HeightGradient),
            _ => None,
        }
    }

    /// Channel holding the spatial Hessian of `self`, if it has one.
    pub(crate) fn hessian_kind(self) -> Option<InfoKind> {
        match self {
            InfoKind::Isovalue => Some(InfoKind::IsovalueHessian),
            InfoKind::Height => Some(InfoKind::HeightHessian),
            _ => None,
        }
    }
}

impl fmt::Display for InfoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InfoKind::Isovalue => "isovalue",
            InfoKind::IsovalueGradient => "isovalue gradient",
            InfoKind::IsovalueHessian => "isovalue hessian",
            InfoKind::Height => "height",
            InfoKind::HeightGradient => "height gradient",
            InfoKind::HeightHessian => "height hessian",
            InfoKind::HeightLaplacian => "height laplacian",
            InfoKind::Tangent1 => "tangent1",
            InfoKind::Tangent2 => "tangent2",
            InfoKind::NegativeTangent1 => "negative tangent1",
            InfoKind::NegativeTangent2 => "negative tangent2",
        };
        f.write_str(name)
    }
}

/// Index table mapping enabled info channels to offsets into a
/// particle's info vector.
///
/// The enclosing engine builds one layout per run; the core only reads
/// it. A channel that is not enabled has no offset, and accessors treat
/// it as absent (zero value, zero derivatives).
#[derive(Debug, Clone, Default)]
pub struct InfoLayout {
    offsets: [Option<usize>; InfoKind::ALL.len()],
    total: usize,
}

impl InfoLayout {
    /// Build a layout with the given channels enabled, packed in the
    /// order given.
    pub fn new(kinds: &[InfoKind]) -> Self {
        let mut layout = Self::default();
        for &kind in kinds {
            debug_assert!(
                layout.offsets[kind as usize].is_none(),
                "duplicate info channel {kind}"
            );
            layout.offsets[kind as usize] = Some(layout.total);
            layout.total += kind.answer_len();
        }
        layout
    }

    /// Whether `kind` is enabled.
    pub fn has(&self, kind: InfoKind) -> bool {
        self.offsets[kind as usize].is_some()
    }

    /// Offset of `kind`'s answer in the info vector, if enabled.
    pub fn offset(&self, kind: InfoKind) -> Option<usize> {
        self.offsets[kind as usize]
    }

    /// Total length of the info vector this layout describes.
    pub fn total_len(&self) -> usize {
        self.total
    }
}
