//! RAM layout assumed by the generated code:
//!
//! ```text
//! 0      SP
//! 1      LCL    base of local
//! 2      ARG    base of argument
//! 3      THIS   base of this     (pointer 0)
//! 4      THAT   base of that     (pointer 1)
//! 5-12   temp 0-7
//! 13-15  scratch registers used by the translator
//! 16-255 static variables, allocated by the assembler
//! 256-   stack
//! ```

use crate::ast::Segment;

pub const POINTER_BASE: u16 = 3;
pub const POINTER_SIZE: u16 = 2;
pub const TEMP_BASE: u16 = 5;
pub const TEMP_SIZE: u16 = 8;
/// Largest value an A-instruction can load.
pub const MAX_CONSTANT: u16 = 0x7fff;

/// How a segment cell is reached.
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Access {
    /// The index itself is the value (`constant`).
    Immediate(u16),
    /// `*base + offset`, where `base` names a register holding a pointer.
    Indirect { base: &'static str, offset: u16 },
    /// A fixed cell named by a symbol: `R3`..`R12` or `<file>.<index>`.
    Direct(String),
}

/// Index past the end of a fixed-size segment.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct OutOfRange {
    pub segment: &'static str,
    pub index: u16,
}

fn fixed(segment: Segment, base: u16, size: u16, index: u16) -> Result<Access, OutOfRange> {
    if index >= size {
        return Err(OutOfRange {
            segment: segment.name(),
            index,
        });
    }
    Ok(Access::Direct(format!("R{}", base + index)))
}

/// Resolves `segment index` inside the unit whose statics live under `namespace`.
pub fn resolve(segment: Segment, index: u16, namespace: &str) -> Result<Access, OutOfRange> {
    let base = match segment {
        Segment::Local => "LCL",
        Segment::Argument => "ARG",
        Segment::This => "THIS",
        Segment::That => "THAT",
        Segment::Constant if index > MAX_CONSTANT => {
            return Err(OutOfRange {
                segment: segment.name(),
                index,
            })
        }
        Segment::Constant => return Ok(Access::Immediate(index)),
        Segment::Pointer => return fixed(segment, POINTER_BASE, POINTER_SIZE, index),
        Segment::Temp => return fixed(segment, TEMP_BASE, TEMP_SIZE, index),
        Segment::Static => return Ok(Access::Direct(format!("{}.{}", namespace, index))),
    };
    Ok(Access::Indirect {
        base,
        offset: index,
    })
}
