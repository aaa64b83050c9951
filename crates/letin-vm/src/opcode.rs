//! Instruction encoding: the bit-packed on-disk word plus the in-memory
//! [`Instr`] the interpreter actually dispatches on.
//!
//! A module file encodes each instruction as one 32-bit opcode word followed
//! by two 32-bit argument words:
//!
//! ```text
//! bit:   31........24 23........16 15....12 11.....8 7............0
//! field:   instr          op       arg1_ty  arg2_ty   local_var_count - 2
//! ```
//!
//! `local_var_count - 2` keeps the common case (0 or 1 extra local) cheap to
//! pack into a byte while still reaching the handful of instructions (mostly
//! `LETTUPLE`) that bind more than that.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("unknown instruction code 0x{0:02x}")]
    UnknownInstr(u8),
    #[error("unknown op code 0x{0:02x}")]
    UnknownOp(u8),
    #[error("unknown argument type code 0x{0:x}")]
    UnknownArgType(u8),
}

pub type Result<T> = std::result::Result<T, DecodeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum InstrKind {
    Let = 0,
    In = 1,
    Ret = 2,
    Jc = 3,
    Jump = 4,
    Arg = 5,
    Retry = 6,
    LetTuple = 7,
    Try = 8,
    Throw = 9,
}

impl InstrKind {
    pub fn from_u8(b: u8) -> Result<Self> {
        Ok(match b {
            0 => InstrKind::Let,
            1 => InstrKind::In,
            2 => InstrKind::Ret,
            3 => InstrKind::Jc,
            4 => InstrKind::Jump,
            5 => InstrKind::Arg,
            6 => InstrKind::Retry,
            7 => InstrKind::LetTuple,
            8 => InstrKind::Try,
            9 => InstrKind::Throw,
            other => return Err(DecodeError::UnknownInstr(other)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Op {
    ILoad = 0,
    FLoad = 1,
    RLoad = 2,
    IAdd = 3,
    ISub = 4,
    IMul = 5,
    IDiv = 6,
    IMod = 7,
    IAnd = 8,
    IOr = 9,
    IXor = 10,
    IShl = 11,
    IShr = 12,
    IEq = 13,
    INe = 14,
    ILt = 15,
    ILe = 16,
    IGt = 17,
    IGe = 18,
    FAdd = 19,
    FSub = 20,
    FMul = 21,
    FDiv = 22,
    FEq = 23,
    FNe = 24,
    FLt = 25,
    FLe = 26,
    FGt = 27,
    FGe = 28,
    REq = 29,
    RNe = 30,
    ItoF = 31,
    FtoI = 32,
    RIArray8 = 33,
    RIArray16 = 34,
    RIArray32 = 35,
    RIArray64 = 36,
    RSfArray = 37,
    RDfArray = 38,
    RRArray = 39,
    RTuple = 40,
    RI8Nth = 41,
    RI16Nth = 42,
    RI32Nth = 43,
    RI64Nth = 44,
    RSfNth = 45,
    RDfNth = 46,
    RRNth = 47,
    RTNth = 48,
    RLength = 49,
    RIACat8 = 50,
    ICall = 51,
    FCall = 52,
    RCall = 53,
    INCall = 54,
    FNCall = 55,
    RNCall = 56,
    RUiaFill8 = 57,
    RUtFillI = 58,
    RUtFillF = 59,
    RUtFillR = 60,
    IForce = 61,
    FForce = 62,
    RForce = 63,
}

impl Op {
    pub fn from_u8(b: u8) -> Result<Self> {
        use Op::*;
        Ok(match b {
            0 => ILoad,
            1 => FLoad,
            2 => RLoad,
            3 => IAdd,
            4 => ISub,
            5 => IMul,
            6 => IDiv,
            7 => IMod,
            8 => IAnd,
            9 => IOr,
            10 => IXor,
            11 => IShl,
            12 => IShr,
            13 => IEq,
            14 => INe,
            15 => ILt,
            16 => ILe,
            17 => IGt,
            18 => IGe,
            19 => FAdd,
            20 => FSub,
            21 => FMul,
            22 => FDiv,
            23 => FEq,
            24 => FNe,
            25 => FLt,
            26 => FLe,
            27 => FGt,
            28 => FGe,
            29 => REq,
            30 => RNe,
            31 => ItoF,
            32 => FtoI,
            33 => RIArray8,
            34 => RIArray16,
            35 => RIArray32,
            36 => RIArray64,
            37 => RSfArray,
            38 => RDfArray,
            39 => RRArray,
            40 => RTuple,
            41 => RI8Nth,
            42 => RI16Nth,
            43 => RI32Nth,
            44 => RI64Nth,
            45 => RSfNth,
            46 => RDfNth,
            47 => RRNth,
            48 => RTNth,
            49 => RLength,
            50 => RIACat8,
            51 => ICall,
            52 => FCall,
            53 => RCall,
            54 => INCall,
            55 => FNCall,
            56 => RNCall,
            57 => RUiaFill8,
            58 => RUtFillI,
            59 => RUtFillF,
            60 => RUtFillR,
            61 => IForce,
            62 => FForce,
            63 => RForce,
            other => return Err(DecodeError::UnknownOp(other)),
        })
    }

    /// Ops whose operands come from the accumulated `ARG` list rather than
    /// `arg1`/`arg2` directly: calls and the variable-arity constructors.
    pub fn is_variadic(self) -> bool {
        use Op::*;
        matches!(
            self,
            RIArray8
                | RIArray16
                | RIArray32
                | RIArray64
                | RSfArray
                | RDfArray
                | RRArray
                | RTuple
                | ICall
                | FCall
                | RCall
                | INCall
                | FNCall
                | RNCall
                | RUiaFill8
                | RUtFillI
                | RUtFillF
                | RUtFillR
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    LocalVar = 0,
    Arg = 1,
    Imm = 2,
    GlobalVar = 3,
}

impl ArgType {
    pub fn from_u8(b: u8) -> Result<Self> {
        Ok(match b {
            0 => ArgType::LocalVar,
            1 => ArgType::Arg,
            2 => ArgType::Imm,
            3 => ArgType::GlobalVar,
            other => return Err(DecodeError::UnknownArgType(other)),
        })
    }
}

/// An instruction operand: either a reference into the current frame/module,
/// or an immediate. Immediates carry raw bits so the same slot encodes an
/// `i64` or an `f64` (via `to_bits`/`from_bits`) depending on the op that
/// consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arg {
    LocalVar(u32),
    Arg(u32),
    Imm(i64),
    GlobalVar(u32),
}

impl Arg {
    pub fn arg_type(self) -> ArgType {
        match self {
            Arg::LocalVar(_) => ArgType::LocalVar,
            Arg::Arg(_) => ArgType::Arg,
            Arg::Imm(_) => ArgType::Imm,
            Arg::GlobalVar(_) => ArgType::GlobalVar,
        }
    }

    fn payload(self) -> u32 {
        match self {
            Arg::LocalVar(i) | Arg::Arg(i) | Arg::GlobalVar(i) => i,
            Arg::Imm(bits) => bits as u32,
        }
    }

    fn from_parts(ty: ArgType, word: u32) -> Arg {
        match ty {
            ArgType::LocalVar => Arg::LocalVar(word),
            ArgType::Arg => Arg::Arg(word),
            ArgType::Imm => Arg::Imm(word as i32 as i64),
            ArgType::GlobalVar => Arg::GlobalVar(word),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Instr {
    pub kind: InstrKind,
    pub op: Op,
    pub arg1: Arg,
    pub arg2: Arg,
    /// Number of locals this instruction binds (`LET`, `LETTUPLE`); 0 for
    /// instructions that bind nothing.
    pub local_var_count: u16,
}

impl Instr {
    /// Decode the 3-word on-disk form (opcode word, arg1 word, arg2 word)
    /// into an [`Instr`]. The loader is responsible for byte-swapping from
    /// the module's big-endian on-disk representation before calling this.
    pub fn decode(opcode_word: u32, arg1_word: u32, arg2_word: u32) -> Result<Instr> {
        let instr_b = (opcode_word >> 24) as u8;
        let op_b = (opcode_word >> 16) as u8;
        let arg1_ty_b = ((opcode_word >> 12) & 0xF) as u8;
        let arg2_ty_b = ((opcode_word >> 8) & 0xF) as u8;
        let count_b = (opcode_word & 0xFF) as u8;

        let kind = InstrKind::from_u8(instr_b)?;
        let op = Op::from_u8(op_b)?;
        let arg1 = Arg::from_parts(ArgType::from_u8(arg1_ty_b)?, arg1_word);
        let arg2 = Arg::from_parts(ArgType::from_u8(arg2_ty_b)?, arg2_word);
        Ok(Instr { kind, op, arg1, arg2, local_var_count: count_b as u16 + 2 })
    }

    pub fn encode(self) -> (u32, u32, u32) {
        let local_var_count_byte = self.local_var_count.saturating_sub(2).min(0xFF) as u32;
        let opcode_word = ((self.kind as u32) << 24)
            | ((self.op as u32) << 16)
            | ((self.arg1.arg_type() as u32) << 12)
            | ((self.arg2.arg_type() as u32) << 8)
            | local_var_count_byte;
        (opcode_word, self.arg1.payload(), self.arg2.payload())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_through_encode_decode() {
        let instr = Instr {
            kind: InstrKind::Let,
            op: Op::IAdd,
            arg1: Arg::LocalVar(3),
            arg2: Arg::Imm(7),
            local_var_count: 1,
        };
        let (w0, w1, w2) = instr.encode();
        let back = Instr::decode(w0, w1, w2).unwrap();
        assert_eq!(back.kind, InstrKind::Let);
        assert_eq!(back.op, Op::IAdd);
        assert_eq!(back.arg1, Arg::LocalVar(3));
        assert_eq!(back.arg2, Arg::Imm(7));
    }

    #[test]
    fn rejects_unknown_instr_code() {
        let err = Instr::decode(0xFF000000, 0, 0).unwrap_err();
        assert!(matches!(err, DecodeError::UnknownInstr(0xFF)));
    }
}
