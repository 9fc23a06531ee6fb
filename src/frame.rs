//! A call leaves the following frame on the stack, with `ARG` pointing at the
//! first argument and `LCL` at the first local of the callee:
//!
//! ```text
//! ARG ->  argument 0
//!         ...
//!         argument n-1
//!         return address
//!         saved LCL
//!         saved ARG
//!         saved THIS
//!         saved THAT
//! LCL ->  local 0
//!         ...
//! ```
//!
//! `return` uses R13 as FRAME and R14 as the saved return address.

use crate::translator::{at_c, at_s, pop_d, push_d};

/// Registers saved by `call`, in push order.
const SAVED: [&str; 4] = ["LCL", "ARG", "THIS", "THAT"];

/// Return address plus the saved registers.
const FRAME_SIZE: u32 = SAVED.len() as u32 + 1;

pub fn function(name: &str, locals: u16) -> Vec<String> {
    let mut out = svec![format!("({})", name)];
    if locals > 0 {
        out.extend(svec!["D=0"]);
        for _ in 0..locals {
            out.extend(push_d());
        }
    }
    out
}

pub fn call(callee: &str, args: u16, return_sym: &str) -> Vec<String> {
    let mut out = svec![at_s(return_sym), "D=A"];
    out.extend(push_d());

    for register in SAVED {
        out.extend(svec![at_s(register), "D=M"]);
        out.extend(push_d());
    }

    out.extend(svec![
        "@SP",
        "D=M",
        format!("@{}", u32::from(args) + FRAME_SIZE),
        "D=D-A",
        "@ARG",
        "M=D", // ARG = SP - n - 5
        "@SP",
        "D=M",
        "@LCL",
        "M=D", // LCL = SP
        at_s(callee),
        "0;JMP",
        format!("({})", return_sym)
    ]);
    out
}

pub fn ret() -> Vec<String> {
    let mut out = svec![
        "@LCL",
        "D=M",
        "@R13",
        "M=D", // FRAME = LCL
        format!("@{}", FRAME_SIZE),
        "A=D-A",
        "D=M",
        "@R14",
        "M=D" // RET = *(FRAME - 5)
    ];

    // The return value overwrites argument 0 and SP moves just past it. Both
    // need the callee's ARG, so they come before the registers are restored.
    out.extend(pop_d());
    out.extend(svec!["@ARG", "A=M", "M=D", "@ARG", "D=M+1", "@SP", "M=D"]);

    for (offset, register) in SAVED.iter().rev().enumerate() {
        let offset = (offset + 1) as u16;
        out.extend(svec![
            "@R13",
            "D=M",
            at_c(&offset),
            "A=D-A",
            "D=M",
            at_s(register),
            "M=D" // register = *(FRAME - offset)
        ]);
    }

    out.extend(svec!["@R14", "A=M", "0;JMP"]);
    out
}
