use core::fmt;

/// Result of a kernel operation that can fault.
pub type KernelResult<T> = Result<T, Fault>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter)]
#[repr(u8)]
#[non_exhaustive]
/// Fault representation for the numeric kernel and the memory system.
pub enum Fault {
    /// The byte can't be mapped to any known `Fault`.
    UnknownFault = 0x00,
    /// Engine width is not one of 8, 16, 32 or 64.
    InvalidWidth = 0x01,
    /// Arithmetic-mode width is outside 1..=32.
    InvalidArithWidth = 0x02,
    /// Bit or byte index out of range for the configured width.
    BitIndexOutOfRange = 0x03,
    /// Limb shift amount outside 0..=15.
    InvalidShiftCount = 0x04,
    /// Access past the end of the byte heap.
    HeapBounds = 0x05,
    /// Negative or unrepresentable address.
    InvalidAddress = 0x06,
    /// Element index out of range for a typed view.
    ViewBounds = 0x07,
    /// The stack pointer underflowed the stack region.
    StackOverflow = 0x08,
    /// Frame marker outside the stack region.
    InvalidFrameMarker = 0x09,
    /// Alignment is zero or not a power of two.
    InvalidAlignment = 0x0a,
    /// The backing store cannot satisfy the request.
    OutOfMemory = 0x0b,
    /// A DATA/BSS symbol with this name already exists.
    DuplicateSymbol = 0x0c,
    /// No DATA/BSS symbol with this name exists.
    SymbolNotFound = 0x0d,
    /// A facility was used before `init` or after `dispose`.
    Uninitialized = 0x0e,
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self:?}")
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Fault {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        None
    }
}

impl From<u8> for Fault {
    /// Converts the `u8` into a `Fault`.
    fn from(b: u8) -> Self {
        use Fault::*;
        match b {
            0x01 => InvalidWidth,
            0x02 => InvalidArithWidth,
            0x03 => BitIndexOutOfRange,
            0x04 => InvalidShiftCount,
            0x05 => HeapBounds,
            0x06 => InvalidAddress,
            0x07 => ViewBounds,
            0x08 => StackOverflow,
            0x09 => InvalidFrameMarker,
            0x0a => InvalidAlignment,
            0x0b => OutOfMemory,
            0x0c => DuplicateSymbol,
            0x0d => SymbolNotFound,
            0x0e => Uninitialized,
            _ => UnknownFault,
        }
    }
}

impl From<Fault> for u8 {
    fn from(f: Fault) -> u8 {
        f as u8
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn fault_u8_round_trip() {
        for fault in Fault::iter() {
            let byte = u8::from(fault);
            assert_eq!(Fault::from(byte), fault);
        }
    }

    #[test]
    fn unknown_bytes_map_to_unknown_fault() {
        assert_eq!(Fault::from(0xff), Fault::UnknownFault);
    }
}
