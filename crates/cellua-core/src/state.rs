//! Cell states and the fixed-width [`StateCodec`].

/// The state of a single cell.
///
/// States are fixed-width unsigned integers of 1 to 64 bits. The width is
/// declared by the active rule and enforced by its [`StateCodec`].
pub type CellState = u64;

/// The universal default ("quiescent") state.
///
/// Absent grid entries read as `QUIESCENT`, and a cell whose own state and
/// whole neighborhood are quiescent stays quiescent.
pub const QUIESCENT: CellState = 0;

/// Describes how cell states of a given bit width are validated and
/// serialized.
///
/// # Examples
///
/// ```
/// use cellua_core::StateCodec;
///
/// let codec = StateCodec::new(6).unwrap();
/// assert_eq!(codec.max_state(), 63);
/// assert!(codec.contains(63));
/// assert!(!codec.contains(64));
///
/// let mut buf = Vec::new();
/// codec.encode(42, &mut buf);
/// assert_eq!(buf.len(), 1);
/// assert_eq!(codec.decode(&buf), Some(42));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StateCodec {
    bits: u8,
}

impl StateCodec {
    /// Widest supported state, in bits.
    pub const MAX_BITS: u8 = 64;

    /// Codec for two-state (dead/alive) automata.
    pub const BINARY: StateCodec = StateCodec { bits: 1 };

    /// Create a codec for `bits`-wide states.
    ///
    /// Returns `None` unless `1 <= bits <= 64`.
    pub fn new(bits: u8) -> Option<Self> {
        if (1..=Self::MAX_BITS).contains(&bits) {
            Some(Self { bits })
        } else {
            None
        }
    }

    /// State width in bits.
    pub fn bits(&self) -> u8 {
        self.bits
    }

    /// Largest representable state.
    pub fn max_state(&self) -> CellState {
        if self.bits == Self::MAX_BITS {
            CellState::MAX
        } else {
            (1u64 << self.bits) - 1
        }
    }

    /// Number of distinct states, saturating at `u64::MAX` for 64-bit codecs.
    pub fn state_count(&self) -> u64 {
        self.max_state().saturating_add(1)
    }

    /// Whether `state` lies in this codec's domain.
    pub fn contains(&self, state: CellState) -> bool {
        state <= self.max_state()
    }

    /// Number of bytes used per encoded state.
    pub fn byte_width(&self) -> usize {
        (self.bits as usize).div_ceil(8)
    }

    /// Append `state` to `out` as `byte_width()` little-endian bytes.
    ///
    /// Bits above the codec width are discarded; callers validate with
    /// [`contains`](Self::contains) first.
    pub fn encode(&self, state: CellState, out: &mut Vec<u8>) {
        out.extend_from_slice(&state.to_le_bytes()[..self.byte_width()]);
    }

    /// Decode a state from exactly `byte_width()` little-endian bytes.
    ///
    /// Returns `None` if the slice has the wrong length or the decoded
    /// value is outside the domain.
    pub fn decode(&self, bytes: &[u8]) -> Option<CellState> {
        if bytes.len() != self.byte_width() {
            return None;
        }
        let mut buf = [0u8; 8];
        buf[..bytes.len()].copy_from_slice(bytes);
        let state = CellState::from_le_bytes(buf);
        self.contains(state).then_some(state)
    }
}

impl Default for StateCodec {
    fn default() -> Self {
        Self::BINARY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rejects_out_of_range_widths() {
        assert!(StateCodec::new(0).is_none());
        assert!(StateCodec::new(65).is_none());
        assert!(StateCodec::new(1).is_some());
        assert!(StateCodec::new(64).is_some());
    }

    #[test]
    fn max_state_edges() {
        assert_eq!(StateCodec::BINARY.max_state(), 1);
        assert_eq!(StateCodec::new(8).unwrap().max_state(), 255);
        assert_eq!(StateCodec::new(64).unwrap().max_state(), u64::MAX);
        assert_eq!(StateCodec::new(64).unwrap().state_count(), u64::MAX);
        assert_eq!(StateCodec::new(2).unwrap().state_count(), 4);
    }

    #[test]
    fn byte_width_rounds_up() {
        assert_eq!(StateCodec::new(1).unwrap().byte_width(), 1);
        assert_eq!(StateCodec::new(8).unwrap().byte_width(), 1);
        assert_eq!(StateCodec::new(9).unwrap().byte_width(), 2);
        assert_eq!(StateCodec::new(64).unwrap().byte_width(), 8);
    }

    #[test]
    fn decode_rejects_wrong_length_and_out_of_domain() {
        let codec = StateCodec::new(4).unwrap();
        assert_eq!(codec.decode(&[]), None);
        assert_eq!(codec.decode(&[1, 2]), None);
        assert_eq!(codec.decode(&[0x10]), None);
        assert_eq!(codec.decode(&[0x0f]), Some(15));
    }

    proptest! {
        #[test]
        fn encode_decode_preserves_in_domain_states(bits in 1u8..=64, raw in any::<u64>()) {
            let codec = StateCodec::new(bits).unwrap();
            let state = raw & codec.max_state();
            let mut buf = Vec::new();
            codec.encode(state, &mut buf);
            prop_assert_eq!(buf.len(), codec.byte_width());
            prop_assert_eq!(codec.decode(&buf), Some(state));
        }
    }
}
