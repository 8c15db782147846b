//! Match Replays
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    REPLAY SYSTEM                            │
//! ├─────────────────────────────────────────────────────────────┤
//! │  transcript.rs   - Transcript recording + bincode encoding  │
//! │  verify.rs       - Verification by replay                   │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod transcript;
pub mod verify;

// Re-export key types
pub use transcript::{
    MatchTranscript, MatchMetadata, MatchResult, PlayerInputRecord,
    StateCheckpoint, TranscriptEvent, TranscriptError, TranscriptRecorder,
    CHECKPOINT_INTERVAL, TRANSCRIPT_VERSION,
};
pub use verify::{verify_transcript, VerificationResult, VerificationError, CheckpointResult};
