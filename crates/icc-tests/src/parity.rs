//! Parity testing framework
//!
//! Runs an oxicc chain and a reference CMS over the same pixels and scores
//! the difference.

use std::fmt;

use oxicc_core::pipeline::{self, Cmm, CmmConfig};
use oxicc_core::{IccProfile, RenderingIntent};

use crate::accuracy::{DeltaEStats, compare_rgb_buffers, max_channel_diff};
use crate::fixtures::to_bytes;
use crate::reference;

/// Reference CMS implementation for comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceCms {
    Lcms2,
    Qcms,
}

impl fmt::Display for ReferenceCms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceCms::Lcms2 => write!(f, "lcms2"),
            ReferenceCms::Qcms => write!(f, "qcms"),
        }
    }
}

/// Result of a parity run
#[derive(Debug)]
pub struct ParityResult {
    pub test_name: String,
    pub reference: ReferenceCms,
    pub delta_e: DeltaEStats,
    /// Largest 8-bit channel difference
    pub max_diff: i64,
}

impl ParityResult {
    pub fn is_exact(&self) -> bool {
        self.max_diff == 0
    }

    pub fn is_acceptable(&self) -> bool {
        self.delta_e.is_acceptable()
    }
}

impl fmt::Display for ParityResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} vs {}: {}, max channel diff {}",
            self.test_name, self.reference, self.delta_e, self.max_diff
        )
    }
}

/// An RGB8 → RGB8 comparison between two profiles
pub struct ParityTest {
    pub name: String,
    pub reference: ReferenceCms,
    pub intent: RenderingIntent,
}

impl ParityTest {
    pub fn new(name: impl Into<String>, reference: ReferenceCms) -> Self {
        Self {
            name: name.into(),
            reference,
            intent: RenderingIntent::Perceptual,
        }
    }

    pub fn with_intent(mut self, intent: RenderingIntent) -> Self {
        self.intent = intent;
        self
    }

    /// Transform `pixels` with both CMMs
    pub fn run(
        &self,
        src: &mut IccProfile,
        dst: &mut IccProfile,
        pixels: &[u8],
    ) -> anyhow::Result<ParityResult> {
        let cmm = Cmm::from_profiles(&[&*src, &*dst], &[self.intent], &CmmConfig::default())?;
        let mut ours = vec![0u8; pixels.len()];
        pipeline::transform_u8(&cmm, pixels, &mut ours)?;

        let src_bytes = to_bytes(src)?;
        let dst_bytes = to_bytes(dst)?;
        let theirs = match self.reference {
            ReferenceCms::Lcms2 => reference::lcms2_rgb8(&src_bytes, &dst_bytes, self.intent, pixels)?,
            ReferenceCms::Qcms => reference::qcms_rgb8(&src_bytes, &dst_bytes, pixels)?,
        };

        Ok(ParityResult {
            test_name: self.name.clone(),
            reference: self.reference,
            delta_e: compare_rgb_buffers(&theirs, &ours),
            max_diff: max_channel_diff(&theirs, &ours),
        })
    }
}
