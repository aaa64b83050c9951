//! Parses the on-disk module format: a big-endian binary layout that names
//! every function, global variable, and cross-module relocation a linked
//! program needs. The format is this crate's own — there is no upstream
//! assembler producing it — but the shape (functions-then-symbols-then-
//! relocations, one flat byte stream, network-order integers) follows the
//! module layout described for the original virtual machine.

use crate::error::{LoaderError, Result};
use byteorder::{BigEndian, ReadBytesExt};
use letin_vm::{Arg, Instr};
use std::io::{Cursor, Read};

pub const MAGIC: [u8; 4] = *b"LTIN";
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone)]
pub struct RawFunction {
    pub arg_count: u32,
    pub eval_strategy: u32,
    pub instrs: Vec<Instr>,
}

#[derive(Debug, Clone)]
pub enum RelocKind {
    /// A `GlobalVar` operand that must be shifted by this module's global
    /// variable offset once linked.
    GlobalVar,
    /// An `Imm` operand naming a function index local to this module
    /// (`ICALL`/`FCALL`/`RCALL`), shifted by this module's function offset.
    CallTarget,
    /// An `Imm` call target resolved against another module's exported
    /// function symbol, looked up by name at link time.
    SymFun(String),
    /// A `GlobalVar` operand resolved against another module's exported
    /// variable symbol, looked up by name at link time.
    SymVar(String),
    /// An `Imm` native-function index resolved against the host's native
    /// symbol table, looked up by name at link time.
    SymNativeFun(String),
}

#[derive(Debug, Clone, Copy)]
pub enum Slot {
    Arg1,
    Arg2,
}

#[derive(Debug, Clone, Copy)]
pub struct RawReloc {
    pub kind: RelocKind,
    pub fun_index: u32,
    pub instr_index: u32,
    pub slot: Slot,
}

#[derive(Debug, Clone)]
pub struct RawModule {
    pub functions: Vec<RawFunction>,
    /// Global variables' initial values, as raw bit patterns reinterpreted
    /// per the loader's own int/float tag byte.
    pub global_vars: Vec<letin_value::Value>,
    pub fun_syms: Vec<(String, u32)>,
    pub var_syms: Vec<(String, u32)>,
    pub relocs: Vec<RawReloc>,
    pub entry_fun_sym: Option<String>,
    /// Whether this module may carry relocations at all. Only the first
    /// module a program loads is exempt from needing one (§7); every other
    /// module lacking this must fail with `NO_RELOC`.
    pub relocatable: bool,
}

pub fn parse_module(bytes: &[u8]) -> Result<RawModule> {
    let mut cur = Cursor::new(bytes);

    let mut magic = [0u8; 4];
    cur.read_exact(&mut magic)?;
    if magic != MAGIC {
        return Err(LoaderError::Format("bad magic".into()));
    }
    let version = cur.read_u32::<BigEndian>()?;
    if version != FORMAT_VERSION {
        return Err(LoaderError::Format(format!("unsupported format version {version}")));
    }

    let fun_count = cur.read_u32::<BigEndian>()?;
    let mut functions = Vec::with_capacity(fun_count as usize);
    for _ in 0..fun_count {
        functions.push(parse_function(&mut cur)?);
    }

    let var_count = cur.read_u32::<BigEndian>()?;
    let mut global_vars = Vec::with_capacity(var_count as usize);
    for _ in 0..var_count {
        global_vars.push(parse_value(&mut cur)?);
    }

    let fun_sym_count = cur.read_u32::<BigEndian>()?;
    let fun_syms = (0..fun_sym_count).map(|_| parse_sym(&mut cur)).collect::<Result<Vec<_>>>()?;

    let var_sym_count = cur.read_u32::<BigEndian>()?;
    let var_syms = (0..var_sym_count).map(|_| parse_sym(&mut cur)).collect::<Result<Vec<_>>>()?;

    let reloc_count = cur.read_u32::<BigEndian>()?;
    let relocs = (0..reloc_count).map(|_| parse_reloc(&mut cur)).collect::<Result<Vec<_>>>()?;

    let has_entry = cur.read_u8()?;
    let entry_fun_sym = if has_entry != 0 { Some(parse_string(&mut cur)?) } else { None };

    let relocatable = cur.read_u8()? != 0;

    Ok(RawModule { functions, global_vars, fun_syms, var_syms, relocs, entry_fun_sym, relocatable })
}

fn parse_function(cur: &mut Cursor<&[u8]>) -> Result<RawFunction> {
    let arg_count = cur.read_u32::<BigEndian>()?;
    let eval_strategy = cur.read_u32::<BigEndian>()?;
    let instr_count = cur.read_u32::<BigEndian>()?;
    let mut instrs = Vec::with_capacity(instr_count as usize);
    for _ in 0..instr_count {
        let w0 = cur.read_u32::<BigEndian>()?;
        let w1 = cur.read_u32::<BigEndian>()?;
        let w2 = cur.read_u32::<BigEndian>()?;
        instrs.push(Instr::decode(w0, w1, w2).map_err(|e| LoaderError::Format(e.to_string()))?);
    }
    Ok(RawFunction { arg_count, eval_strategy, instrs })
}

fn parse_value(cur: &mut Cursor<&[u8]>) -> Result<letin_value::Value> {
    let tag = cur.read_u8()?;
    match tag {
        0 => Ok(letin_value::Value::Int(cur.read_i64::<BigEndian>()?)),
        1 => Ok(letin_value::Value::Float(cur.read_f64::<BigEndian>()?)),
        other => Err(LoaderError::Format(format!("unknown global var tag {other}"))),
    }
}

fn parse_string(cur: &mut Cursor<&[u8]>) -> Result<String> {
    let len = cur.read_u32::<BigEndian>()? as usize;
    let mut buf = vec![0u8; len];
    cur.read_exact(&mut buf)?;
    String::from_utf8(buf).map_err(|e| LoaderError::Format(e.to_string()))
}

fn parse_sym(cur: &mut Cursor<&[u8]>) -> Result<(String, u32)> {
    let name = parse_string(cur)?;
    let index = cur.read_u32::<BigEndian>()?;
    Ok((name, index))
}

fn parse_reloc(cur: &mut Cursor<&[u8]>) -> Result<RawReloc> {
    let kind_b = cur.read_u8()?;
    let kind = match kind_b {
        0 => RelocKind::GlobalVar,
        1 => RelocKind::CallTarget,
        2 => RelocKind::SymFun(parse_string(cur)?),
        3 => RelocKind::SymVar(parse_string(cur)?),
        4 => RelocKind::SymNativeFun(parse_string(cur)?),
        other => return Err(LoaderError::Format(format!("unknown reloc kind {other}"))),
    };
    let fun_index = cur.read_u32::<BigEndian>()?;
    let instr_index = cur.read_u32::<BigEndian>()?;
    let slot_b = cur.read_u8()?;
    let slot = match slot_b {
        0 => Slot::Arg1,
        1 => Slot::Arg2,
        other => return Err(LoaderError::Format(format!("unknown reloc slot {other}"))),
    };
    Ok(RawReloc { kind, fun_index, instr_index, slot })
}

/// The inverse of [`parse_module`]. Not needed by the loader itself (nothing
/// upstream of it produces this format at runtime), but its own round-trip
/// tests need it, and it is the natural place for a future assembler to
/// reuse it from.
pub fn write_module(m: &RawModule) -> Vec<u8> {
    use byteorder::WriteBytesExt;
    let mut out = Vec::new();
    out.extend_from_slice(&MAGIC);
    out.write_u32::<BigEndian>(FORMAT_VERSION).unwrap();

    out.write_u32::<BigEndian>(m.functions.len() as u32).unwrap();
    for f in &m.functions {
        out.write_u32::<BigEndian>(f.arg_count).unwrap();
        out.write_u32::<BigEndian>(f.eval_strategy).unwrap();
        out.write_u32::<BigEndian>(f.instrs.len() as u32).unwrap();
        for instr in &f.instrs {
            let (w0, w1, w2) = instr.encode();
            out.write_u32::<BigEndian>(w0).unwrap();
            out.write_u32::<BigEndian>(w1).unwrap();
            out.write_u32::<BigEndian>(w2).unwrap();
        }
    }

    out.write_u32::<BigEndian>(m.global_vars.len() as u32).unwrap();
    for v in &m.global_vars {
        match v {
            letin_value::Value::Int(i) => {
                out.write_u8(0).unwrap();
                out.write_i64::<BigEndian>(*i).unwrap();
            }
            letin_value::Value::Float(f) => {
                out.write_u8(1).unwrap();
                out.write_f64::<BigEndian>(*f).unwrap();
            }
            other => panic!("global vars may only be Int or Float, got {other:?}"),
        }
    }

    write_syms(&mut out, &m.fun_syms);
    write_syms(&mut out, &m.var_syms);

    out.write_u32::<BigEndian>(m.relocs.len() as u32).unwrap();
    for r in &m.relocs {
        match &r.kind {
            RelocKind::GlobalVar => out.write_u8(0).unwrap(),
            RelocKind::CallTarget => out.write_u8(1).unwrap(),
            RelocKind::SymFun(name) => {
                out.write_u8(2).unwrap();
                write_string(&mut out, name);
            }
            RelocKind::SymVar(name) => {
                out.write_u8(3).unwrap();
                write_string(&mut out, name);
            }
            RelocKind::SymNativeFun(name) => {
                out.write_u8(4).unwrap();
                write_string(&mut out, name);
            }
        }
        out.write_u32::<BigEndian>(r.fun_index).unwrap();
        out.write_u32::<BigEndian>(r.instr_index).unwrap();
        out.write_u8(match r.slot {
            Slot::Arg1 => 0,
            Slot::Arg2 => 1,
        })
        .unwrap();
    }

    match &m.entry_fun_sym {
        Some(name) => {
            out.write_u8(1).unwrap();
            write_string(&mut out, name);
        }
        None => out.write_u8(0).unwrap(),
    }

    out.write_u8(m.relocatable as u8).unwrap();

    out
}

fn write_string(out: &mut Vec<u8>, s: &str) {
    use byteorder::WriteBytesExt;
    out.write_u32::<BigEndian>(s.len() as u32).unwrap();
    out.extend_from_slice(s.as_bytes());
}

fn write_syms(out: &mut Vec<u8>, syms: &[(String, u32)]) {
    use byteorder::WriteBytesExt;
    out.write_u32::<BigEndian>(syms.len() as u32).unwrap();
    for (name, index) in syms {
        write_string(out, name);
        out.write_u32::<BigEndian>(*index).unwrap();
    }
}

pub(crate) fn reloc_shift_arg(arg: Arg, offset: u32) -> Arg {
    match arg {
        Arg::GlobalVar(i) => Arg::GlobalVar(i + offset),
        Arg::Imm(v) => Arg::Imm(v + offset as i64),
        other => other,
    }
}
