use std::collections::HashSet;

use tracing::trace;

use crate::ast::{Command::*, *};
use crate::error::{Result, TranslateError};
use crate::frame;
use crate::segment::{self, Access};

pub(crate) fn at_c(arg: &u16) -> String {
    format!("@{arg}", arg = arg)
}

pub(crate) fn at_s(arg: &str) -> String {
    format!("@{arg}", arg = arg)
}

/// Push D onto the stack
pub(crate) fn push_d() -> Vec<String> {
    svec![
        "@SP",
        "M=M+1",
        "A=M-1", // Don't need to refetch SP; this is safe
        "M=D"
    ]
}

/// Pop the stack into D
pub(crate) fn pop_d() -> Vec<String> {
    svec!["@SP", "AM=M-1", "D=M"]
}

fn push_constant(arg: &u16) -> Vec<String> {
    let mut out = svec![at_c(arg), "D=A"];
    out.extend(push_d());
    out
}

/// Push microcode for the four base segments
fn seg_push(seg: &str, arg: &u16) -> Vec<String> {
    let mut out = svec![
        at_s(seg),
        "D=M",
        at_c(arg),
        "A=D+A", // A = SEG+arg
        "D=M"    // D = value to push
    ];
    out.extend(push_d());
    out
}

fn seg_push_direct(label: &str) -> Vec<String> {
    let mut out = svec![at_s(label), "D=M"];
    out.extend(push_d());
    out
}

fn seg_pop(seg: &str, arg: &u16) -> Vec<String> {
    svec![
        at_s(seg),
        "D=M",
        at_c(arg),
        "D=D+A", // D = SEG+arg
        "@R13",
        "M=D", // Store target addr in R13
        "@SP",
        "AM=M-1", // SP--, A <- new SP (val to be popped)
        "D=M",
        "@R13",
        "A=M", // At the target address...
        "M=D"  // ... store the popped val
    ]
}

fn seg_pop_direct(label: &str) -> Vec<String> {
    let mut out = pop_d();
    out.extend(svec![at_s(label), "M=D"]);
    out
}

fn simple_un_op(op: char) -> Vec<String> {
    svec!["@SP", "A=M-1", format!("M={}M", op)]
}

// i.e. no conditions or jumps, just pop and run
fn simple_bin_op(comp: &str) -> Vec<String> {
    svec![
        "@SP",
        "AM=M-1",             // SP--, looking at top of stack now
        "D=M",                // Right arg in D
        "A=A-1",              // Looking at second arg of stack, will overwrite
        format!("M={}", comp) // Op and overwrite second element
    ]
}

/// Namespace for user-written `label`/`goto`/`if-goto` targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelScope {
    /// One flat namespace per source unit.
    #[default]
    File,
    /// Labels are prefixed with their enclosing function, `f$label`.
    /// Labels appearing before any `function` fall back to the unit namespace.
    Function,
}

/// Translates the commands of one source unit.
///
/// A translator owns the manufactured-label counter for its unit. The counter
/// is never reset, so calling [`Translator::translate`] repeatedly on the same
/// instance keeps producing fresh labels.
pub struct Translator<'a> {
    /// Name used in diagnostics.
    file: &'a str,
    /// Prefix for statics and manufactured labels; unique within a run.
    assembly: &'a str,
    gen_sym: usize,
    scope: LabelScope,
    comments: bool,
    function: Option<String>,
    labels: HashSet<String>,
}

impl<'a> Translator<'a> {
    pub fn new(assembly: &'a str) -> Self {
        Translator::with_options(assembly, assembly, LabelScope::default(), true)
    }

    pub fn with_options(
        file: &'a str,
        assembly: &'a str,
        scope: LabelScope,
        comments: bool,
    ) -> Self {
        Translator {
            file,
            assembly,
            gen_sym: 0,
            scope,
            comments,
            function: None,
            labels: HashSet::new(),
        }
    }

    /// Seeds the set of labels already declared elsewhere in the module.
    pub fn with_declared(mut self, labels: HashSet<String>) -> Self {
        self.labels = labels;
        self
    }

    /// Every user label and function entry declared so far.
    pub fn into_declared(self) -> HashSet<String> {
        self.labels
    }

    fn next_gen_sym(&mut self) -> usize {
        let tmp = self.gen_sym;
        self.gen_sym += 1;
        tmp
    }

    fn resolve(&self, cmd: &VmCommand, segment: Segment, arg: u16) -> Result<Access> {
        segment::resolve(segment, arg, self.assembly).map_err(|e| {
            TranslateError::IndexOutOfRange {
                file: self.file.to_string(),
                line: cmd.line,
                segment: e.segment,
                index: e.index,
                text: cmd.text.clone(),
            }
        })
    }

    fn push(&self, access: Access) -> Vec<String> {
        match access {
            Access::Immediate(arg) => push_constant(&arg),
            Access::Indirect { base, offset } => seg_push(base, &offset),
            Access::Direct(label) => seg_push_direct(&label),
        }
    }

    fn pop(&self, access: Access) -> Vec<String> {
        match access {
            Access::Immediate(_) => unreachable!("pop constant is rejected before resolution"),
            Access::Indirect { base, offset } => seg_pop(base, &offset),
            Access::Direct(label) => seg_pop_direct(&label),
        }
    }

    fn compare(&mut self, jump: &str) -> Vec<String> {
        let sym = self.next_gen_sym();
        let cmp_sym = format!("{}:CMP_{}", self.assembly, sym);
        let end_sym = format!("{}:ENDCMP_{}", self.assembly, sym);
        svec![
            "@SP",
            "AM=M-1", // SP--, looking at top of stack now
            "D=M",    // Right arg in D
            "A=A-1",  // Looking at second arg of stack, will overwrite
            "D=M-D",
            at_s(&cmp_sym),
            format!("D;J{}", jump),
            "D=0",
            at_s(&end_sym),
            "0;JMP",
            format!("({})", cmp_sym),
            "D=-1",
            format!("({})", end_sym),
            "@SP",
            "A=M-1",
            "M=D"
        ]
    }

    /// Convert VM label to Hack ASM symbol - for consistency across instructions
    fn label_to_sym(&self, label: &str) -> String {
        match (&self.scope, &self.function) {
            (LabelScope::Function, Some(function)) => format!("{}${}", function, label),
            _ => format!("{}:LABEL_{}", self.assembly, label),
        }
    }

    fn declare(&mut self, cmd: &VmCommand, label: &str, sym: &str) -> Result<()> {
        if !self.labels.insert(sym.to_string()) {
            return Err(TranslateError::DuplicateLabel {
                file: self.file.to_string(),
                line: cmd.line,
                label: label.to_string(),
                text: cmd.text.clone(),
            });
        }
        Ok(())
    }

    fn label(&mut self, cmd: &VmCommand, label: &str) -> Result<Vec<String>> {
        let sym = self.label_to_sym(label);
        self.declare(cmd, label, &sym)?;
        Ok(svec![format!("({})", sym)])
    }

    fn goto(&self, label: &str) -> Vec<String> {
        svec![
            at_s(&self.label_to_sym(label)),
            "0;JMP" // Unconditional jump
        ]
    }

    fn if_goto(&self, label: &str) -> Vec<String> {
        let mut out = pop_d(); // Popped before the test, whatever the outcome
        out.extend(svec![
            at_s(&self.label_to_sym(label)),
            "D;JNE" // False is 0
        ]);
        out
    }

    fn function(&mut self, cmd: &VmCommand, name: &str, locals: u16) -> Result<Vec<String>> {
        self.declare(cmd, name, name)?;
        self.function = Some(name.to_string());
        Ok(frame::function(name, locals))
    }

    fn call(&mut self, callee: &str, args: u16) -> Vec<String> {
        let sym = self.next_gen_sym();
        let return_sym = format!("{}:RET_{}_{}", self.assembly, callee, sym);
        frame::call(callee, args, &return_sym)
    }

    /// Lowers a single command, without its provenance comment.
    pub fn translate_command(&mut self, cmd: &VmCommand) -> Result<Vec<String>> {
        trace!(file = self.file, line = cmd.line, command = %cmd.text, "translating");
        let translated = match &cmd.command {
            Push(seg, arg) => {
                let access = self.resolve(cmd, *seg, *arg)?;
                self.push(access)
            }
            Pop(Segment::Constant, _) => {
                return Err(TranslateError::Malformed {
                    file: self.file.to_string(),
                    line: cmd.line,
                    text: cmd.text.clone(),
                })
            }
            Pop(seg, arg) => {
                let access = self.resolve(cmd, *seg, *arg)?;
                self.pop(access)
            }
            Not => simple_un_op('!'),
            Neg => simple_un_op('-'),
            Add => simple_bin_op("D+M"),
            Sub => simple_bin_op("M-D"),
            And => simple_bin_op("D&M"),
            Or => simple_bin_op("D|M"),
            Eq => self.compare("EQ"),
            Gt => self.compare("GT"),
            Lt => self.compare("LT"),
            Label(sym) => self.label(cmd, sym)?,
            Goto(sym) => self.goto(sym),
            IfGoto(sym) => self.if_goto(sym),
            Function(name, locals) => self.function(cmd, name, *locals)?,
            Call(name, args) => self.call(name, *args),
            Return => frame::ret(),
        };
        Ok(translated)
    }

    pub fn translate(&mut self, commands: &[VmCommand]) -> Result<Vec<String>> {
        let mut instructions: Vec<String> = vec![];

        for command in commands {
            if self.comments {
                instructions.push(format!("// {}", command.text));
            }
            instructions.extend(self.translate_command(command)?);
        }

        Ok(instructions)
    }
}
