//! Minimal Hack CPU for running translator output in tests.

use std::collections::HashMap;

use crate::asm::Line;

const RAM_SIZE: usize = 0x8000;
const FIRST_VARIABLE: u16 = 16;

#[derive(Debug, Clone)]
enum Instr {
    Address(u16),
    Compute {
        dest: String,
        comp: String,
        jump: Option<String>,
    },
}

#[derive(Debug, Default)]
pub struct Program {
    rom: Vec<Instr>,
    symbols: HashMap<String, u16>,
}

impl Program {
    pub fn symbol(&self, name: &str) -> Option<u16> {
        self.symbols.get(name).copied()
    }

    fn assemble<S: AsRef<str>>(lines: &[S]) -> Result<Program, String> {
        let mut symbols: HashMap<String, u16> = HashMap::new();
        for (name, address) in [("SP", 0), ("LCL", 1), ("ARG", 2), ("THIS", 3), ("THAT", 4)] {
            symbols.insert(name.to_string(), address);
        }
        for r in 0..16u16 {
            symbols.insert(format!("R{}", r), r);
        }
        symbols.insert("SCREEN".to_string(), 0x4000);
        symbols.insert("KBD".to_string(), 0x6000);

        let mut parsed = vec![];
        for line in lines {
            match Line::parse(line.as_ref()).map_err(|e| e.to_string())? {
                Line::Comment(_) => {}
                Line::Label(sym) => {
                    if symbols.insert(sym.to_string(), parsed.len() as u16).is_some() {
                        return Err(format!("label {} declared twice", sym));
                    }
                }
                other => parsed.push(other),
            }
        }

        let mut next_variable = FIRST_VARIABLE;
        let mut rom = Vec::with_capacity(parsed.len());
        for line in parsed {
            let instr = match line {
                Line::Address(value) => match value.parse::<u16>() {
                    Ok(literal) => Instr::Address(literal),
                    Err(_) => {
                        let address = *symbols.entry(value.to_string()).or_insert_with(|| {
                            next_variable += 1;
                            next_variable - 1
                        });
                        Instr::Address(address)
                    }
                },
                Line::Compute { dest, comp, jump } => Instr::Compute {
                    dest: dest.unwrap_or("").to_string(),
                    comp: comp.to_string(),
                    jump: jump.map(str::to_string),
                },
                Line::Comment(_) | Line::Label(_) => unreachable!(),
            };
            rom.push(instr);
        }

        Ok(Program { rom, symbols })
    }
}

pub struct Cpu {
    ram: Vec<i16>,
    a: i16,
    d: i16,
    pc: usize,
    program: Program,
}

impl Cpu {
    pub fn new() -> Self {
        Cpu {
            ram: vec![0; RAM_SIZE],
            a: 0,
            d: 0,
            pc: 0,
            program: Program::default(),
        }
    }

    pub fn with_stack(sp: u16) -> Self {
        let mut cpu = Cpu::new();
        cpu.set_sp(sp);
        cpu
    }

    pub fn peek(&self, address: u16) -> i16 {
        self.ram[address as usize]
    }

    pub fn poke(&mut self, address: u16, value: i16) {
        self.ram[address as usize] = value;
    }

    pub fn sp(&self) -> u16 {
        self.ram[0] as u16
    }

    pub fn set_sp(&mut self, sp: u16) {
        self.ram[0] = sp as i16;
    }

    /// Replaces the program and rewinds the PC. RAM is left alone.
    pub fn load<S: AsRef<str>>(&mut self, lines: &[S]) -> Result<&Program, String> {
        self.program = Program::assemble(lines)?;
        self.pc = 0;
        Ok(&self.program)
    }

    /// Runs until the PC falls off the end of the program.
    pub fn run(&mut self, max_steps: usize) -> Result<usize, String> {
        for step in 0..max_steps {
            if self.pc >= self.program.rom.len() {
                return Ok(step);
            }
            self.step();
        }
        Err(format!("still running after {} steps (pc={})", max_steps, self.pc))
    }

    pub fn run_lines<S: AsRef<str>>(&mut self, lines: &[S], max_steps: usize) -> Result<usize, String> {
        self.load(lines)?;
        self.run(max_steps)
    }

    fn m(&self) -> i16 {
        self.ram[(self.a as u16 as usize) % RAM_SIZE]
    }

    fn compute(&self, comp: &str) -> i16 {
        let (a, d) = (self.a, self.d);
        let m = || self.m();
        match comp {
            "0" => 0,
            "1" => 1,
            "-1" => -1,
            "D" => d,
            "A" => a,
            "M" => m(),
            "!D" => !d,
            "!A" => !a,
            "!M" => !m(),
            "-D" => d.wrapping_neg(),
            "-A" => a.wrapping_neg(),
            "-M" => m().wrapping_neg(),
            "D+1" => d.wrapping_add(1),
            "A+1" => a.wrapping_add(1),
            "M+1" => m().wrapping_add(1),
            "D-1" => d.wrapping_sub(1),
            "A-1" => a.wrapping_sub(1),
            "M-1" => m().wrapping_sub(1),
            "D+A" => d.wrapping_add(a),
            "D+M" => d.wrapping_add(m()),
            "D-A" => d.wrapping_sub(a),
            "D-M" => d.wrapping_sub(m()),
            "A-D" => a.wrapping_sub(d),
            "M-D" => m().wrapping_sub(d),
            "D&A" => d & a,
            "D&M" => d & m(),
            "D|A" => d | a,
            "D|M" => d | m(),
            other => panic!("unknown computation {}", other),
        }
    }

    fn step(&mut self) {
        match self.program.rom[self.pc].clone() {
            Instr::Address(value) => {
                self.a = value as i16;
                self.pc += 1;
            }
            Instr::Compute { dest, comp, jump } => {
                let out = self.compute(&comp);
                let address = self.a;
                if dest.contains('M') {
                    self.ram[(address as u16 as usize) % RAM_SIZE] = out;
                }
                if dest.contains('A') {
                    self.a = out;
                }
                if dest.contains('D') {
                    self.d = out;
                }
                let taken = match jump.as_deref() {
                    None => false,
                    Some("JGT") => out > 0,
                    Some("JEQ") => out == 0,
                    Some("JGE") => out >= 0,
                    Some("JLT") => out < 0,
                    Some("JNE") => out != 0,
                    Some("JLE") => out <= 0,
                    Some("JMP") => true,
                    Some(other) => panic!("unknown jump {}", other),
                };
                self.pc = if taken {
                    address as u16 as usize
                } else {
                    self.pc + 1
                };
            }
        }
    }
}

#[test]
fn test_cpu_runs_a_counting_loop() {
    let program = ["@3", "D=A", "(LOOP)", "@count", "M=M+1", "D=D-1", "@LOOP", "D;JGT"];
    let mut cpu = Cpu::new();
    cpu.run_lines(&program, 100).unwrap();
    assert_eq!(cpu.peek(16), 3);
    assert_eq!(cpu.program.symbol("LOOP"), Some(2));
}

#[test]
fn test_cpu_stops_runaway_programs() {
    let mut cpu = Cpu::new();
    assert!(cpu.run_lines(&["(HALT)", "@HALT", "0;JMP"], 50).is_err());
}
