//! Progress reporting for texture conversion
//!
//! SPDX-FileCopyrightText: 2025 CyberDeco
//!
//! SPDX-License-Identifier: MIT

/// Progress callback for texture conversion.
pub type ImageProgressCallback<'a> = &'a (dyn Fn(&ImageProgress) + Sync + Send);

/// One progress update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageProgress {
    pub phase: ImagePhase,
    /// Current item (1-indexed).
    pub current: usize,
    pub total: usize,
    /// File being processed, if any.
    pub current_file: Option<String>,
}

impl ImageProgress {
    #[must_use]
    pub fn new(phase: ImagePhase, current: usize, total: usize) -> Self {
        Self {
            phase,
            current,
            total,
            current_file: None,
        }
    }

    #[must_use]
    pub fn with_file(
        phase: ImagePhase,
        current: usize,
        total: usize,
        file: impl Into<String>,
    ) -> Self {
        Self {
            phase,
            current,
            total,
            current_file: Some(file.into()),
        }
    }

    /// Fraction done, 0.0 to 1.0. An empty job counts as done.
    #[must_use]
    pub fn percentage(&self) -> f32 {
        if self.total == 0 {
            1.0
        } else {
            self.current as f32 / self.total as f32
        }
    }
}

/// Stage of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImagePhase {
    ReadingFile,
    Decoding,
    Encoding,
    WritingFile,
    Complete,
}

impl ImagePhase {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ReadingFile => "Reading file",
            Self::Decoding => "Decoding",
            Self::Encoding => "Encoding PNG",
            Self::WritingFile => "Writing file",
            Self::Complete => "Complete",
        }
    }
}
