//! Hand landmark data as delivered by the external detector.
//!
//! Models the 21-point hand taxonomy (wrist, four joints per finger) in
//! normalized image coordinates: x and y in `[0, 1]`, lower y is higher on
//! screen.

// ── Landmark definitions ───────────────────────────────────

/// The 21 hand landmarks, in detector order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandLandmark {
    Wrist,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

/// Total number of landmarks per hand.
pub const LANDMARK_COUNT: usize = 21;

impl HandLandmark {
    /// Base joints used for the raised/down predicates.
    pub const THUMB_BASE: Self = Self::ThumbMcp;
    pub const INDEX_BASE: Self = Self::IndexMcp;
    pub const MIDDLE_BASE: Self = Self::MiddleMcp;
    pub const RING_BASE: Self = Self::RingMcp;
    pub const PINKY_BASE: Self = Self::PinkyMcp;

    /// Convert landmark enum to array index (0-20).
    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wrist => "wrist",
            Self::ThumbCmc => "thumb-cmc",
            Self::ThumbMcp => "thumb-mcp",
            Self::ThumbIp => "thumb-ip",
            Self::ThumbTip => "thumb-tip",
            Self::IndexMcp => "index-mcp",
            Self::IndexPip => "index-pip",
            Self::IndexDip => "index-dip",
            Self::IndexTip => "index-tip",
            Self::MiddleMcp => "middle-mcp",
            Self::MiddlePip => "middle-pip",
            Self::MiddleDip => "middle-dip",
            Self::MiddleTip => "middle-tip",
            Self::RingMcp => "ring-mcp",
            Self::RingPip => "ring-pip",
            Self::RingDip => "ring-dip",
            Self::RingTip => "ring-tip",
            Self::PinkyMcp => "pinky-mcp",
            Self::PinkyPip => "pinky-pip",
            Self::PinkyDip => "pinky-dip",
            Self::PinkyTip => "pinky-tip",
        }
    }
}

// ── Points ─────────────────────────────────────────────────

/// One normalized landmark.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Landmark {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Landmark {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Projection onto the image plane.
    pub fn xy(&self) -> Point2 {
        Point2 {
            x: self.x,
            y: self.y,
        }
    }
}

/// A point on the normalized image plane.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point2 {
    pub x: f32,
    pub y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance in the (x, y) plane.
    pub fn distance(&self, other: &Point2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

// ── Observations ───────────────────────────────────────────

/// A named score, as produced by the detector's classifier heads.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    /// Score in `[0, 1]`.
    pub score: f32,
}

impl Category {
    pub fn new(name: impl Into<String>, score: f32) -> Self {
        Self {
            name: name.into(),
            score,
        }
    }
}

/// One detected hand for one frame.
#[derive(Debug, Clone)]
pub struct HandObservation {
    pub landmarks: [Landmark; LANDMARK_COUNT],
    /// Left/right classification.
    pub handedness: Category,
    /// Baseline gesture category from the detector's own classifier.
    pub gesture: Category,
}

impl HandObservation {
    pub fn landmark(&self, landmark: HandLandmark) -> Landmark {
        self.landmarks[landmark.index()]
    }

    /// Build from a detector-provided landmark list.
    ///
    /// Returns `None` unless exactly 21 landmarks are given.
    pub fn from_landmarks(
        landmarks: &[Landmark],
        handedness: Category,
        gesture: Category,
    ) -> Option<Self> {
        let landmarks: [Landmark; LANDMARK_COUNT] = landmarks.try_into().ok()?;
        Some(Self {
            landmarks,
            handedness,
            gesture,
        })
    }
}

/// The detector's answer for one frame: hands in detection order.
#[derive(Debug, Clone, Default)]
pub struct DetectorResult {
    pub hands: Vec<HandObservation>,
}

impl DetectorResult {
    /// The only hand the pipeline looks at.
    pub fn primary_hand(&self) -> Option<&HandObservation> {
        self.hands.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_landmark_count() {
        assert_eq!(HandLandmark::Wrist.index(), 0);
        assert_eq!(HandLandmark::PinkyTip.index(), LANDMARK_COUNT - 1);
    }

    #[test]
    fn test_fixed_indices() {
        assert_eq!(HandLandmark::THUMB_BASE.index(), 2);
        assert_eq!(HandLandmark::ThumbTip.index(), 4);
        assert_eq!(HandLandmark::INDEX_BASE.index(), 5);
        assert_eq!(HandLandmark::IndexTip.index(), 8);
        assert_eq!(HandLandmark::MIDDLE_BASE.index(), 9);
        assert_eq!(HandLandmark::MiddleTip.index(), 12);
        assert_eq!(HandLandmark::RING_BASE.index(), 13);
        assert_eq!(HandLandmark::RingTip.index(), 16);
        assert_eq!(HandLandmark::PINKY_BASE.index(), 17);
        assert_eq!(HandLandmark::PinkyTip.index(), 20);
    }

    #[test]
    fn test_landmark_as_str() {
        assert_eq!(HandLandmark::Wrist.as_str(), "wrist");
        assert_eq!(HandLandmark::IndexTip.as_str(), "index-tip");
        assert_eq!(HandLandmark::PinkyMcp.as_str(), "pinky-mcp");
    }

    #[test]
    fn test_distance_ignores_z() {
        let a = Landmark::new(0.0, 0.0, 5.0).xy();
        let b = Landmark::new(3.0, 4.0, -2.0).xy();
        assert!((a.distance(&b) - 5.0).abs() < 1e-6);
    }

    #[test]
    fn test_from_landmarks_rejects_wrong_count() {
        let short = vec![Landmark::default(); 10];
        let hand = HandObservation::from_landmarks(
            &short,
            Category::new("Right", 0.9),
            Category::new("None", 0.5),
        );
        assert!(hand.is_none());

        let full = vec![Landmark::default(); LANDMARK_COUNT];
        let hand = HandObservation::from_landmarks(
            &full,
            Category::new("Right", 0.9),
            Category::new("None", 0.5),
        );
        assert!(hand.is_some());
    }

    #[test]
    fn test_primary_hand_is_first() {
        let make = |name: &str| HandObservation {
            landmarks: [Landmark::default(); LANDMARK_COUNT],
            handedness: Category::new(name, 0.9),
            gesture: Category::new("None", 0.5),
        };
        let result = DetectorResult {
            hands: vec![make("Left"), make("Right")],
        };
        assert_eq!(
            result.primary_hand().map(|h| h.handedness.name.as_str()),
            Some("Left")
        );
        assert!(DetectorResult::default().primary_hand().is_none());
    }
}
