// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
Double-buffered shadow storage and the byte-range diff engine.

Coherent persistent maps are the one case where the application can write
GPU-visible memory with no API call for us to observe. There is no unmap, no
flush, nothing; the writes just appear. The portable way out (rather than
page-protection tricks) is a manual before/after compare: keep a private
baseline copy of the mapped region, and at every point where the content could
matter to the GPU, copy the live region once, diff it against the baseline,
emit whatever changed, and promote the copy to the new baseline.

[`ShadowPair`] owns the two buffers; buffer 0 is the baseline, buffer 1 the
scratch copy taken at each diff point. Both are allocated together, seeded
from the live region, and freed together. The live pointer is touched exactly
once per diff point, by the copy in step 1.
*/

use std::alloc::{self, Layout};
use std::ptr::NonNull;

/// Unchanged bytes between two changed ranges are coalesced into one emitted
/// range when the gap is below this. Larger gaps cost an extra range header
/// downstream; smaller gaps re-serialize bytes that did not change. Either
/// way the union still covers every changed byte.
const COALESCE_GAP: usize = 64;

/// One contiguous run of captured bytes, positioned within the tracked store.
///
/// This is the payload handed to the external serializer; the stream encoding
/// is its problem, not ours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureDelta<'a> {
    /// Byte offset of `bytes` within the tracked store.
    pub offset: usize,
    pub bytes: &'a [u8],
}

/// A pair of equal-size aligned shadow buffers.
///
/// Either both buffers exist or neither does; the pair is the unit of
/// allocation and release.
#[derive(Debug)]
pub struct ShadowPair {
    baseline: NonNull<u8>,
    scratch: NonNull<u8>,
    len: usize,
    layout: Layout,
}

// The buffers are exclusively owned and only touched through &mut self.
unsafe impl Send for ShadowPair {}

impl ShadowPair {
    /// Allocates both buffers and seeds them with the current content of
    /// `live`. Returns `None` on allocation failure (the caller downgrades to
    /// full-range capture; partial shadow tracking is never acceptable).
    ///
    /// # Safety
    ///
    /// `live` must be valid for reads of `len` bytes.
    pub(crate) unsafe fn alloc(live: *const u8, len: usize, align: usize) -> Option<Self> {
        if len == 0 {
            return None;
        }
        let layout = Layout::from_size_align(len, align.max(16)).ok()?;
        //safety: layout has non-zero size
        let baseline = NonNull::new(unsafe { alloc::alloc(layout) })?;
        let scratch = match NonNull::new(unsafe { alloc::alloc(layout) }) {
            Some(p) => p,
            None => {
                //never leave half a pair behind
                unsafe { alloc::dealloc(baseline.as_ptr(), layout) };
                return None;
            }
        };
        //safety: caller guarantees live is readable for len bytes; both
        //buffers were just allocated with size len
        unsafe {
            std::ptr::copy_nonoverlapping(live, baseline.as_ptr(), len);
            std::ptr::copy_nonoverlapping(live, scratch.as_ptr(), len);
        }
        Some(ShadowPair {
            baseline,
            scratch,
            len,
            layout,
        })
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Runs one diff point against the live region.
    ///
    /// Copies `live` into the scratch buffer, emits a [`CaptureDelta`] for
    /// every byte range that differs from the baseline (offsets are
    /// region-relative; the record rebases them onto the store), then
    /// promotes the scratch copy to the new baseline. Runs to completion
    /// before returning, so the pair swap is atomic with respect to the
    /// owning record.
    ///
    /// # Safety
    ///
    /// `live` must be valid for reads of `self.len()` bytes.
    pub(crate) unsafe fn diff_point(&mut self, live: *const u8, mut sink: impl FnMut(CaptureDelta)) {
        //safety: caller guarantees live is readable for len bytes
        unsafe {
            std::ptr::copy_nonoverlapping(live, self.scratch.as_ptr(), self.len);
        }
        //safety: distinct exclusively-owned allocations of self.len bytes
        let (base, cur) = unsafe {
            (
                std::slice::from_raw_parts(self.baseline.as_ptr(), self.len),
                std::slice::from_raw_parts(self.scratch.as_ptr(), self.len),
            )
        };

        let mut i = 0;
        while i < self.len {
            if base[i] == cur[i] {
                i += 1;
                continue;
            }
            let start = i;
            let mut last_changed = i;
            i += 1;
            while i < self.len && i - last_changed <= COALESCE_GAP {
                if base[i] != cur[i] {
                    last_changed = i;
                }
                i += 1;
            }
            sink(CaptureDelta {
                offset: start,
                bytes: &cur[start..=last_changed],
            });
        }

        //safety: same allocations as above; the emitted borrows ended with sink
        unsafe {
            std::ptr::copy_nonoverlapping(self.scratch.as_ptr(), self.baseline.as_ptr(), self.len);
        }
    }
}

impl Drop for ShadowPair {
    fn drop(&mut self) {
        //safety: both pointers came from alloc with self.layout
        unsafe {
            alloc::dealloc(self.baseline.as_ptr(), self.layout);
            alloc::dealloc(self.scratch.as_ptr(), self.layout);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair_over(live: &[u8]) -> ShadowPair {
        //safety: live is a valid slice
        unsafe { ShadowPair::alloc(live.as_ptr(), live.len(), 16).expect("alloc") }
    }

    fn collect(pair: &mut ShadowPair, live: &[u8]) -> Vec<(usize, Vec<u8>)> {
        let mut out = Vec::new();
        //safety: live is a valid slice of pair.len() bytes
        unsafe {
            pair.diff_point(live.as_ptr(), |d| out.push((d.offset, d.bytes.to_vec())));
        }
        out
    }

    #[test]
    fn clean_region_emits_nothing() {
        let live = vec![0xABu8; 512];
        let mut pair = pair_over(&live);
        assert!(collect(&mut pair, &live).is_empty());
    }

    #[test]
    fn zero_length_allocation_is_refused() {
        let live: [u8; 0] = [];
        //safety: zero-length read of a dangling-ok pointer never happens
        assert!(unsafe { ShadowPair::alloc(live.as_ptr(), 0, 16).is_none() });
    }

    #[test]
    fn reapplying_emitted_ranges_reproduces_the_write() {
        let baseline = vec![0u8; 1024];
        let mut pair = pair_over(&baseline);

        let mut live = baseline.clone();
        live[10..20].fill(0x11);
        live[500] = 0x22;
        live[1023] = 0x33;

        let deltas = collect(&mut pair, &live);
        assert!(!deltas.is_empty());

        let mut rebuilt = baseline.clone();
        for (offset, bytes) in &deltas {
            rebuilt[*offset..*offset + bytes.len()].copy_from_slice(bytes);
        }
        assert_eq!(rebuilt, live);
    }

    #[test]
    fn nearby_ranges_coalesce_distant_ranges_do_not() {
        let baseline = vec![0u8; 4096];
        let mut pair = pair_over(&baseline);

        let mut live = baseline.clone();
        // two writes 16 bytes apart: one range
        live[100] = 1;
        live[116] = 1;
        // and one far away: its own range
        live[3000] = 1;

        let deltas = collect(&mut pair, &live);
        assert_eq!(deltas.len(), 2);
        assert_eq!(deltas[0].0, 100);
        assert_eq!(deltas[0].1.len(), 17);
        assert_eq!(deltas[1].0, 3000);
        assert_eq!(deltas[1].1, vec![1]);
    }

    #[test]
    fn baseline_advances_after_each_diff_point() {
        let baseline = vec![0u8; 256];
        let mut pair = pair_over(&baseline);

        let mut live = baseline.clone();
        live[8] = 0xFF;
        assert_eq!(collect(&mut pair, &live).len(), 1);
        // unchanged since the last diff point: nothing to emit
        assert!(collect(&mut pair, &live).is_empty());

        live[8] = 0;
        let deltas = collect(&mut pair, &live);
        assert_eq!(deltas, vec![(8, vec![0])]);
    }

    #[test]
    fn edge_bytes_are_covered() {
        let baseline = vec![0u8; 128];
        let mut pair = pair_over(&baseline);
        let mut live = baseline.clone();
        live[0] = 9;
        live[127] = 9;
        let deltas = collect(&mut pair, &live);
        let mut rebuilt = baseline.clone();
        for (offset, bytes) in &deltas {
            rebuilt[*offset..*offset + bytes.len()].copy_from_slice(bytes);
        }
        assert_eq!(rebuilt, live);
        assert_eq!(deltas.first().map(|d| d.0), Some(0));
        assert_eq!(deltas.last().map(|d| d.0 + d.1.len()), Some(128));
    }
}
