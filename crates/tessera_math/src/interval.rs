use std::ops::Sub;

/// Half-open range `[min, max)`.
///
/// Float intervals are used as ray hit-time windows, integer intervals as
/// pixel ranges of a bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval<T = f32> {
    pub min: T,
    pub max: T,
}

impl<T: Copy + PartialOrd> Interval<T> {
    /// Create a new interval given min and max values.
    pub fn new(min: T, max: T) -> Self {
        Self { min, max }
    }

    /// Returns true if x lies in `[min, max)`.
    pub fn contains(&self, x: T) -> bool {
        self.min <= x && x < self.max
    }

    /// Returns true if x is strictly within `(min, max)`.
    pub fn surrounds(&self, x: T) -> bool {
        self.min < x && x < self.max
    }

    /// Clamps x to `[min, max]`.
    pub fn clamp(&self, x: T) -> T {
        if x < self.min {
            self.min
        } else if x > self.max {
            self.max
        } else {
            x
        }
    }

    /// An interval is empty when it holds no value (this includes NaN bounds).
    pub fn is_empty(&self) -> bool {
        !(self.min < self.max)
    }

    /// Creates an interval that surrounds two other intervals.
    pub fn surrounding(a: &Interval<T>, b: &Interval<T>) -> Interval<T> {
        let min = if a.min < b.min { a.min } else { b.min };
        let max = if a.max > b.max { a.max } else { b.max };
        Interval::new(min, max)
    }
}

impl<T: Copy + Sub<Output = T>> Interval<T> {
    /// Returns the size of the interval (max - min).
    pub fn size(&self) -> T {
        self.max - self.min
    }
}

impl Interval<f32> {
    /// Expands the interval by delta/2 on each side.
    pub fn expand(&self, delta: f32) -> Interval {
        let padding = delta / 2.0;
        Interval::new(self.min - padding, self.max + padding)
    }

    /// An empty interval (min > max, contains nothing).
    pub const EMPTY: Interval = Interval {
        min: f32::INFINITY,
        max: f32::NEG_INFINITY,
    };

    /// A universe interval (contains every finite value).
    pub const UNIVERSE: Interval = Interval {
        min: f32::NEG_INFINITY,
        max: f32::INFINITY,
    };

    /// `(0, inf)`, the hit window of a freshly spawned ray.
    pub const POSITIVE: Interval = Interval {
        min: 0.0,
        max: f32::INFINITY,
    };
}
