//! Silence detection for preprocessing.
//!
//! A signal is cut into overlapping frames; every frame whose mean-square
//! power is within `top_db` of the loudest frame is non-silent, and runs of
//! such frames become sample intervals. Batch extraction applies this to the
//! concatenation of many files and writes one mask per file.

mod extract;
mod split;


pub use extract::{
    concatenated_masks, extract_silence, mask_output_path, write_masks, FileMask, SilenceMask,
};
pub use split::{frame_power_db, silence_mask, split_nonsilent, SplitConfig};
