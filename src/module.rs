use std::collections::HashSet;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::ast::{Command, VmCommand};
use crate::error::{Result, TranslateError};
use crate::parser;
use crate::translator::{LabelScope, Translator};

pub const SOURCE_EXTENSION: &str = "vm";
pub const TARGET_EXTENSION: &str = "asm";

/// Where the stack starts once the bootstrap has run.
pub const STACK_BASE: u16 = 256;

/// Namespace of the bootstrap's own return label. Never handed to a unit.
const BOOTSTRAP_NAMESPACE: &str = "$bootstrap";

/// One source file's worth of VM code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    /// Base name, without directory or extension. Used for statics and labels.
    pub name: String,
    pub source: String,
}

impl Unit {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Unit {
            name: name.into(),
            source: source.into(),
        }
    }

    pub fn read(path: &Path) -> Result<Unit> {
        let source = fs::read_to_string(path).map_err(|source| TranslateError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_stem()
            .and_then(OsStr::to_str)
            .unwrap_or_default()
            .to_string();
        Ok(Unit { name, source })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Entry function to call after setting `SP`. `None` emits no bootstrap,
    /// so the output only runs once wrapped with its own entry sequence.
    pub bootstrap: Option<String>,
    pub label_scope: LabelScope,
    /// Emit a `// <vm command>` line before each command's code.
    pub comments: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            bootstrap: None,
            label_scope: LabelScope::File,
            comments: true,
        }
    }
}

impl Options {
    pub fn with_bootstrap(mut self, entry: impl Into<String>) -> Self {
        self.bootstrap = Some(entry.into());
        self
    }
}

/// `SP = 256` followed by `call <entry> 0`.
pub fn bootstrap(entry: &str, comments: bool) -> Result<Vec<String>> {
    let mut out = vec![];
    if comments {
        out.push("// bootstrap".to_string());
    }
    out.extend(svec![format!("@{}", STACK_BASE), "D=A", "@SP", "M=D"]);

    let call = VmCommand::synthetic(Command::Call(entry.to_string(), 0));
    let mut translator =
        Translator::with_options(BOOTSTRAP_NAMESPACE, BOOTSTRAP_NAMESPACE, LabelScope::File, comments);
    out.extend(translator.translate(&[call])?);
    Ok(out)
}

/// Turns a unit name into an assembly symbol: characters outside
/// `[A-Za-z0-9_.$:]` become `_`, and a leading digit gets a `_` prefix.
fn symbol_name(name: &str) -> String {
    let mut sym: String = name
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '_' | '.' | '$' | ':' => c,
            _ => '_',
        })
        .collect();
    if sym.is_empty() || sym.starts_with(|c: char| c.is_ascii_digit()) {
        sym.insert(0, '_');
    }
    sym
}

/// Picks a namespace for `name` that no earlier unit in this run has used.
fn namespace_for(name: &str, used: &mut HashSet<String>) -> String {
    let base = symbol_name(name);
    let mut candidate = base.clone();
    let mut n = 2;
    while used.contains(&candidate) {
        candidate = format!("{}:{}", base, n);
        n += 1;
    }
    used.insert(candidate.clone());
    candidate
}

/// Translates `units` in order into a single module.
pub fn assemble(units: &[Unit], options: &Options) -> Result<Vec<String>> {
    let mut output = vec![];
    if let Some(entry) = &options.bootstrap {
        output.extend(bootstrap(entry, options.comments)?);
    }

    let mut namespaces = HashSet::from([BOOTSTRAP_NAMESPACE.to_string()]);
    let mut declared = HashSet::new();

    for unit in units {
        let namespace = namespace_for(&unit.name, &mut namespaces);
        let commands = parser::parse(&unit.name, &unit.source)?;
        let mut translator =
            Translator::with_options(&unit.name, &namespace, options.label_scope, options.comments)
                .with_declared(declared);
        let lines = translator.translate(&commands)?;
        declared = translator.into_declared();

        debug!(
            unit = %unit.name,
            namespace = %namespace,
            commands = commands.len(),
            lines = lines.len(),
            "translated unit"
        );
        output.extend(lines);
    }

    crate::asm::validate(&output).map_err(|e| TranslateError::InvalidOutput(e.to_string()))?;
    Ok(output)
}

/// The source units at `path`: the file itself, or a directory's `.vm` files
/// sorted by name.
pub fn discover_units(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(TranslateError::MissingInput(path.to_path_buf()));
    }
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let io_err = |source| TranslateError::Io {
        path: path.to_path_buf(),
        source,
    };
    let mut files = vec![];
    for entry in fs::read_dir(path).map_err(io_err)? {
        let entry_path = entry.map_err(io_err)?.path();
        if entry_path.is_file() && entry_path.extension() == Some(OsStr::new(SOURCE_EXTENSION)) {
            files.push(entry_path);
        }
    }
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// `Foo.vm` becomes `Foo.asm` next to it; directory `Dir` becomes `Dir/Dir.asm`.
pub fn output_path(path: &Path) -> PathBuf {
    if path.is_dir() {
        let name = path
            .canonicalize()
            .ok()
            .and_then(|p| p.file_name().map(OsStr::to_os_string))
            .or_else(|| path.file_name().map(OsStr::to_os_string))
            .unwrap_or_else(|| "out".into());
        let mut file = PathBuf::from(name);
        file.set_extension(TARGET_EXTENSION);
        path.join(file)
    } else {
        path.with_extension(TARGET_EXTENSION)
    }
}

/// Reads, translates and concatenates everything at `path`.
pub fn translate_path(path: &Path, options: &Options) -> Result<Vec<String>> {
    let units = discover_units(path)?
        .iter()
        .map(|p| Unit::read(p))
        .collect::<Result<Vec<_>>>()?;
    assemble(&units, options)
}
