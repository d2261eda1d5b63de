//! Helpers to address and manipulate flat mono sample buffers.

// -------------------------------------------------------------------------------------------------

/// Wrap a signed frame index into the range `0..len` of a buffer with `len` frames.
/// Negative indices wrap around from the buffer end.
#[inline]
pub fn wrap_buffer_index(index: isize, len: usize) -> usize {
    debug_assert!(len > 0, "Can't wrap indices into empty buffers");
    index.rem_euclid(len as isize) as usize
}

// -------------------------------------------------------------------------------------------------

/// Fill the given buffer with silence.
#[inline]
pub fn clear_buffer(buffer: &mut [f32]) {
    buffer.fill(0.0);
}

// -------------------------------------------------------------------------------------------------
