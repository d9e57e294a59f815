use datalayr_primitives::{
    errors::{FrameError, HeaderError, KzgError},
    frame::Frame,
    header::DataStoreHeader,
};
use thiserror::Error;

use crate::verify::KzgVerifierGroup;

#[derive(Clone, Debug, PartialEq, Error)]
pub enum ValidationError {
    #[error("no frames received")]
    NoFrames,

    #[error("{frames} frames received with {positions} positions")]
    LengthMismatch { frames: usize, positions: usize },

    #[error("frame at position {position} has {got} coefficients, expected {expected}")]
    InconsistentFrameLengths {
        position: u64,
        expected: usize,
        got: usize,
    },

    #[error("frame error: {0}")]
    FrameError(#[from] FrameError),

    #[error("header error: {0}")]
    HeaderError(#[from] HeaderError),

    #[error("kzg error: {0}")]
    KzgError(#[from] KzgError),
}

/// Checks a batch of frames received for one data store.
///
/// Decodes the frames, checks that they share one length, validates the
/// header against the code rate derived from chain state, then verifies the
/// low-degree proof and every frame's multireveal proof. Returns the decoded
/// frames.
pub fn validate_frames<B: AsRef<[u8]>>(
    verifiers: &KzgVerifierGroup,
    header: &DataStoreHeader,
    expected_num_sys: u64,
    expected_num_par: u64,
    frames: &[B],
    positions: &[u64],
) -> Result<Vec<Frame>, ValidationError> {
    if frames.len() != positions.len() {
        return Err(ValidationError::LengthMismatch {
            frames: frames.len(),
            positions: positions.len(),
        });
    }
    let frames = frames
        .iter()
        .map(|bytes| Frame::decode(bytes.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;

    let frame_len = frames.first().map(Frame::len).ok_or(ValidationError::NoFrames)?;
    if let Some((frame, &position)) = frames
        .iter()
        .zip(positions)
        .find(|(frame, _)| frame.len() != frame_len)
    {
        return Err(ValidationError::InconsistentFrameLengths {
            position,
            expected: frame_len,
            got: frame.len(),
        });
    }

    header.validate(expected_num_sys, expected_num_par, frame_len as u32)?;

    let verifier = verifiers.get_kzg_verifier(
        header.num_sys as u64,
        header.num_par as u64,
        header.orig_data_size as u64,
    )?;
    verifier.verify_commit(&header.kzg_commit, &header.low_degree_proof)?;
    verifier.verify_frames(&header.kzg_commit, &frames, positions)?;

    Ok(frames)
}
