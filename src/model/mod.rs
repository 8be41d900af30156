//! Decoded replay: immutable, fully owned, no parsing logic

mod diagnostic;
mod event;
mod frame;
mod participant;
mod session;
mod trailer;

use std::iter::FusedIterator;

pub use diagnostic::{Diagnostic, DiagnosticKind};
pub use event::{EventKind, PitLaneAction, ReplayEvent};
pub use frame::{Controls, DamageState, DetachablePart, FrameRecord, VehicleFlags, VehicleState};
pub use participant::Participant;
pub use session::{SessionInfo, SessionType};
pub use trailer::Trailer;

use crate::fingerprint::ReplayFingerprint;
use crate::header::FileHeader;

/// A decoded replay
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayModel {
    header: FileHeader,
    session: Option<SessionInfo>,
    roster: Vec<Participant>,
    frames: Vec<FrameRecord>,
    trailer: Option<Trailer>,
    diagnostics: Vec<Diagnostic>,
    fingerprint: ReplayFingerprint,
}

/// Parts the decoder hands over for assembly
pub(crate) struct ModelParts {
    pub header: FileHeader,
    pub session: Option<SessionInfo>,
    pub roster: Vec<Participant>,
    pub frames: Vec<FrameRecord>,
    pub trailer: Option<Trailer>,
    pub diagnostics: Vec<Diagnostic>,
    pub fingerprint: ReplayFingerprint,
}

impl ReplayModel {
    pub(crate) fn assemble(parts: ModelParts) -> Self {
        Self {
            header: parts.header,
            session: parts.session,
            roster: parts.roster,
            frames: parts.frames,
            trailer: parts.trailer,
            diagnostics: parts.diagnostics,
            fingerprint: parts.fingerprint,
        }
    }

    /// File header, kept for diagnostics
    #[must_use]
    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    /// Session metadata, `None` if the section was missing or dropped
    #[must_use]
    pub fn session_info(&self) -> Option<&SessionInfo> {
        self.session.as_ref()
    }

    /// Participants in slot order
    #[must_use]
    pub fn roster(&self) -> &[Participant] {
        &self.roster
    }

    /// Participant by slot
    #[must_use]
    pub fn participant(&self, slot: u8) -> Option<&Participant> {
        self.roster.get(usize::from(slot))
    }

    /// Frames in recording order
    ///
    /// Each call starts a fresh pass over the decoded frames.
    #[must_use]
    pub fn frames(&self) -> Frames<'_> {
        Frames {
            frames: &self.frames,
            front: 0,
            back: self.frames.len(),
        }
    }

    /// Number of decoded frames
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Every event with the timestamp of its frame
    pub fn events(&self) -> impl Iterator<Item = (f32, &ReplayEvent)> {
        self.frames
            .iter()
            .flat_map(|frame| frame.events().iter().map(move |e| (frame.timestamp, e)))
    }

    /// End-of-file summary, `None` before V2 or if dropped
    #[must_use]
    pub fn trailer(&self) -> Option<&Trailer> {
        self.trailer.as_ref()
    }

    /// Warnings for partial or degraded sections
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// True if decoding needed no fallback and lost nothing
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }

    /// Present when the replay was read with a layout other than the one
    /// its header declares
    ///
    /// Covers an unrecognized version as well as a section that only fit
    /// an older layout.
    #[must_use]
    pub fn compatibility_warning(&self) -> Option<String> {
        if let Some(warning) = self.header.compatibility_warning() {
            return Some(warning);
        }

        let fallbacks: Vec<String> = self
            .diagnostics
            .iter()
            .filter_map(|d| match (&d.kind, d.section) {
                (DiagnosticKind::LayoutFallback { declared, used }, Some(section)) => {
                    Some(format!(
                        "{section} section decoded with the {used} layout, \
                         not the declared {declared}"
                    ))
                }
                _ => None,
            })
            .collect();

        if fallbacks.is_empty() {
            None
        } else {
            Some(fallbacks.join("; "))
        }
    }

    /// SHA-256 of the input buffer
    #[must_use]
    pub fn fingerprint(&self) -> &ReplayFingerprint {
        &self.fingerprint
    }
}

/// Restartable iterator over a model's frames
#[derive(Debug, Clone)]
pub struct Frames<'a> {
    frames: &'a [FrameRecord],
    front: usize,
    back: usize,
}

impl<'a> Frames<'a> {
    /// Frames not yet yielded
    #[must_use]
    pub fn as_slice(&self) -> &'a [FrameRecord] {
        &self.frames[self.front..self.back]
    }
}

impl<'a> Iterator for Frames<'a> {
    type Item = &'a FrameRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        let frame = &self.frames[self.front];
        self.front += 1;
        Some(frame)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let len = self.back - self.front;
        (len, Some(len))
    }

    fn nth(&mut self, n: usize) -> Option<Self::Item> {
        self.front = self.front.saturating_add(n).min(self.back);
        self.next()
    }
}

impl DoubleEndedIterator for Frames<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.front == self.back {
            return None;
        }
        self.back -= 1;
        Some(&self.frames[self.back])
    }
}

impl ExactSizeIterator for Frames<'_> {}

impl FusedIterator for Frames<'_> {}
