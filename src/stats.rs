use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Severity bucket of a base stat value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ColorBucket {
    Low,
    MidLow,
    MidHigh,
    High,
}

impl ColorBucket {
    pub fn for_base(base: u32) -> Self {
        match base {
            0..=59 => ColorBucket::Low,
            60..=89 => ColorBucket::MidLow,
            90..=119 => ColorBucket::MidHigh,
            _ => ColorBucket::High,
        }
    }

    pub fn hex(self) -> &'static str {
        match self {
            ColorBucket::Low => "#ff4e4e",
            ColorBucket::MidLow => "#f0932b",
            ColorBucket::MidHigh => "#f1c40f",
            ColorBucket::High => "#6ab04c",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatRange {
    pub base: u32,
    pub min: u64,
    pub max: u64,
    pub color: ColorBucket,
}

/// Level 100 range for a single stat.
pub fn stat_range(stat: &str, base: u32) -> StatRange {
    let b = u64::from(base);
    let (min, max) = if stat == "hp" {
        (2 * b + 110, 2 * b + 204)
    } else {
        // Integer forms of floor(0.9 * x) and floor(1.1 * x).
        ((2 * b + 5) * 9 / 10, (2 * b + 99) * 11 / 10)
    };
    StatRange {
        base,
        min,
        max,
        color: ColorBucket::for_base(base),
    }
}

pub fn compute_stat_ranges(base_stats: &BTreeMap<String, u32>) -> BTreeMap<String, StatRange> {
    base_stats
        .iter()
        .map(|(stat, base)| (stat.clone(), stat_range(stat, *base)))
        .collect()
}
