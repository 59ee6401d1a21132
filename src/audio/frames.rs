//! Cutting a sample stream into analyzer-sized frames.

use std::borrow::Cow;

/// Number of non-overlapping frames of `buffer_size` in `total` samples. A
/// trailing partial frame counts only when `pad_tail` is set.
pub fn frame_count(total: usize, buffer_size: usize, pad_tail: bool) -> usize {
    if buffer_size == 0 {
        return 0;
    }
    if pad_tail {
        total.div_ceil(buffer_size)
    } else {
        total / buffer_size
    }
}

/// Frame `index`, borrowed when it lies fully inside `samples`, zero-padded
/// otherwise.
pub fn frame(samples: &[f32], index: usize, buffer_size: usize) -> Cow<'_, [f32]> {
    let start = (index * buffer_size).min(samples.len());
    let end = start + buffer_size;
    if end <= samples.len() {
        Cow::Borrowed(&samples[start..end])
    } else {
        let mut padded = vec![0.0; buffer_size];
        let available = &samples[start..];
        padded[..available.len()].copy_from_slice(available);
        Cow::Owned(padded)
    }
}

pub fn frames(
    samples: &[f32],
    buffer_size: usize,
    pad_tail: bool,
) -> impl Iterator<Item = Cow<'_, [f32]>> + '_ {
    (0..frame_count(samples.len(), buffer_size, pad_tail))
        .map(move |i| frame(samples, i, buffer_size))
}

/// Start time of frame `index` in seconds.
pub fn frame_time(index: usize, buffer_size: usize, sample_rate: u32) -> f32 {
    (index * buffer_size) as f32 / sample_rate as f32
}
