use std::fmt;

#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash)]
pub enum Segment {
    Constant,
    Local,
    Static,
    Argument,
    This,
    That,
    Pointer,
    Temp,
}

const SEGMENT_NAMES: [(&str, Segment); 8] = [
    ("constant", Segment::Constant),
    ("local", Segment::Local),
    ("static", Segment::Static),
    ("argument", Segment::Argument),
    ("this", Segment::This),
    ("that", Segment::That),
    ("pointer", Segment::Pointer),
    ("temp", Segment::Temp),
];

impl Segment {
    /// Look up a segment by its VM spelling.
    pub fn from_name(name: &str) -> Option<Segment> {
        SEGMENT_NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, seg)| *seg)
    }

    pub fn name(&self) -> &'static str {
        SEGMENT_NAMES
            .iter()
            .find(|(_, seg)| seg == self)
            .map(|(n, _)| *n)
            .unwrap_or("?")
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, PartialEq, Eq, Clone)]
pub enum Command {
    // Stack Basics
    Push(Segment, u16),
    Pop(Segment, u16),
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,

    // Control
    Label(String),
    Goto(String),
    IfGoto(String),

    // Functions
    Function(String, u16),
    Call(String, u16),
    Return,
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Push(seg, arg) => write!(f, "push {} {}", seg, arg),
            Command::Pop(seg, arg) => write!(f, "pop {} {}", seg, arg),
            Command::Add => f.write_str("add"),
            Command::Sub => f.write_str("sub"),
            Command::Neg => f.write_str("neg"),
            Command::Eq => f.write_str("eq"),
            Command::Gt => f.write_str("gt"),
            Command::Lt => f.write_str("lt"),
            Command::And => f.write_str("and"),
            Command::Or => f.write_str("or"),
            Command::Not => f.write_str("not"),
            Command::Label(sym) => write!(f, "label {}", sym),
            Command::Goto(sym) => write!(f, "goto {}", sym),
            Command::IfGoto(sym) => write!(f, "if-goto {}", sym),
            Command::Function(name, locals) => write!(f, "function {} {}", name, locals),
            Command::Call(name, args) => write!(f, "call {} {}", name, args),
            Command::Return => f.write_str("return"),
        }
    }
}

/// A parsed command together with where it came from.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct VmCommand {
    /// 1-based source line.
    pub line: usize,
    /// Source text with the comment and surrounding whitespace removed.
    pub text: String,
    pub command: Command,
}

impl VmCommand {
    pub fn new(line: usize, text: impl Into<String>, command: Command) -> Self {
        VmCommand {
            line,
            text: text.into(),
            command,
        }
    }

    /// Builds a command with no real source position, rendering its own text.
    pub fn synthetic(command: Command) -> Self {
        VmCommand {
            line: 0,
            text: command.to_string(),
            command,
        }
    }
}
