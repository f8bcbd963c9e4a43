//! RV32I instruction decoder.
//!
//! Maps a raw 32-bit instruction word to a structured [`Instruction`] record
//! or rejects it with [`DecodeError`]. Only the RV32I base set decodes;
//! reserved funct fields and unknown major opcodes are failures, so nothing
//! outside [`Opcode`] ever reaches dispatch.

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]

use thiserror::Error;

/// The closed RV32I-base operation set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[allow(missing_docs)]
pub enum Opcode {
    // Upper immediate
    Lui,
    Auipc,
    // Jumps
    Jal,
    Jalr,
    // Conditional branches
    Beq,
    Bne,
    Blt,
    Bge,
    Bltu,
    Bgeu,
    // Loads
    Lb,
    Lh,
    Lw,
    Lbu,
    Lhu,
    // Stores
    Sb,
    Sh,
    Sw,
    // Register-immediate arithmetic/logical
    Addi,
    Slti,
    Sltiu,
    Xori,
    Ori,
    Andi,
    Slli,
    Srli,
    Srai,
    // Register-register arithmetic/logical
    Add,
    Sub,
    Sll,
    Slt,
    Sltu,
    Xor,
    Srl,
    Sra,
    Or,
    And,
    // Memory ordering and system
    Fence,
    Ecall,
    Ebreak,
}

impl Opcode {
    /// Assembly mnemonic, as printed by the instruction trace.
    #[must_use]
    pub const fn mnemonic(self) -> &'static str {
        match self {
            Self::Lui => "lui",
            Self::Auipc => "auipc",
            Self::Jal => "jal",
            Self::Jalr => "jalr",
            Self::Beq => "beq",
            Self::Bne => "bne",
            Self::Blt => "blt",
            Self::Bge => "bge",
            Self::Bltu => "bltu",
            Self::Bgeu => "bgeu",
            Self::Lb => "lb",
            Self::Lh => "lh",
            Self::Lw => "lw",
            Self::Lbu => "lbu",
            Self::Lhu => "lhu",
            Self::Sb => "sb",
            Self::Sh => "sh",
            Self::Sw => "sw",
            Self::Addi => "addi",
            Self::Slti => "slti",
            Self::Sltiu => "sltiu",
            Self::Xori => "xori",
            Self::Ori => "ori",
            Self::Andi => "andi",
            Self::Slli => "slli",
            Self::Srli => "srli",
            Self::Srai => "srai",
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Sll => "sll",
            Self::Slt => "slt",
            Self::Sltu => "sltu",
            Self::Xor => "xor",
            Self::Srl => "srl",
            Self::Sra => "sra",
            Self::Or => "or",
            Self::And => "and",
            Self::Fence => "fence",
            Self::Ecall => "ecall",
            Self::Ebreak => "ebreak",
        }
    }
}

/// A decoded instruction, constructed fresh each fetch and consumed
/// immediately by dispatch.
///
/// `imm` is already assembled and sign-extended per the instruction's format;
/// register indices are 5-bit values (`0..=31`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Instruction {
    /// Decoded operation.
    pub op: Opcode,
    /// Destination register index.
    pub rd: u8,
    /// First source register index.
    pub rs1: u8,
    /// Second source register index.
    pub rs2: u8,
    /// Sign-extended immediate (two's complement in a `u32`).
    pub imm: u32,
}

/// Decoder rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum DecodeError {
    /// The word matches no supported RV32I-base encoding.
    #[error("unrecognized instruction encoding {0:#010x}")]
    Unrecognized(u32),
}

/// I-format immediate: bits 31..20, sign-extended.
const fn imm_i(word: u32) -> u32 {
    ((word as i32) >> 20) as u32
}

/// S-format immediate: bits 31..25 and 11..7, sign-extended.
const fn imm_s(word: u32) -> u32 {
    ((((word & 0xFE00_0000) as i32) >> 20) as u32) | ((word >> 7) & 0x1F)
}

/// B-format immediate: branch offset in multiples of 2, sign-extended.
const fn imm_b(word: u32) -> u32 {
    let imm = ((word >> 31) << 12)
        | (((word >> 7) & 0x1) << 11)
        | (((word >> 25) & 0x3F) << 5)
        | (((word >> 8) & 0xF) << 1);
    (((imm as i32) << 19) >> 19) as u32
}

/// U-format immediate: bits 31..12, already in position.
const fn imm_u(word: u32) -> u32 {
    word & 0xFFFF_F000
}

/// J-format immediate: jump offset in multiples of 2, sign-extended.
const fn imm_j(word: u32) -> u32 {
    let imm = ((word >> 31) << 20)
        | (((word >> 12) & 0xFF) << 12)
        | (((word >> 20) & 0x1) << 11)
        | (((word >> 21) & 0x3FF) << 1);
    (((imm as i32) << 11) >> 11) as u32
}

/// Decodes one instruction word.
///
/// # Errors
///
/// Returns [`DecodeError::Unrecognized`] for any encoding outside the RV32I
/// base set, including reserved funct3/funct7 combinations within otherwise
/// valid major opcodes.
#[allow(clippy::too_many_lines)]
pub const fn decode(word: u32) -> Result<Instruction, DecodeError> {
    let rd = ((word >> 7) & 0x1F) as u8;
    let rs1 = ((word >> 15) & 0x1F) as u8;
    let rs2 = ((word >> 20) & 0x1F) as u8;
    let funct3 = (word >> 12) & 0x7;
    let funct7 = word >> 25;

    // Convenience constructor keeping the match arms single-line.
    macro_rules! inst {
        ($op:expr, $imm:expr) => {
            Ok(Instruction {
                op: $op,
                rd,
                rs1,
                rs2,
                imm: $imm,
            })
        };
    }

    match word & 0x7F {
        0b011_0111 => inst!(Opcode::Lui, imm_u(word)),
        0b001_0111 => inst!(Opcode::Auipc, imm_u(word)),
        0b110_1111 => inst!(Opcode::Jal, imm_j(word)),
        0b110_0111 if funct3 == 0 => inst!(Opcode::Jalr, imm_i(word)),
        0b110_0011 => {
            let op = match funct3 {
                0b000 => Opcode::Beq,
                0b001 => Opcode::Bne,
                0b100 => Opcode::Blt,
                0b101 => Opcode::Bge,
                0b110 => Opcode::Bltu,
                0b111 => Opcode::Bgeu,
                _ => return Err(DecodeError::Unrecognized(word)),
            };
            inst!(op, imm_b(word))
        }
        0b000_0011 => {
            let op = match funct3 {
                0b000 => Opcode::Lb,
                0b001 => Opcode::Lh,
                0b010 => Opcode::Lw,
                0b100 => Opcode::Lbu,
                0b101 => Opcode::Lhu,
                _ => return Err(DecodeError::Unrecognized(word)),
            };
            inst!(op, imm_i(word))
        }
        0b010_0011 => {
            let op = match funct3 {
                0b000 => Opcode::Sb,
                0b001 => Opcode::Sh,
                0b010 => Opcode::Sw,
                _ => return Err(DecodeError::Unrecognized(word)),
            };
            inst!(op, imm_s(word))
        }
        0b001_0011 => match funct3 {
            0b000 => inst!(Opcode::Addi, imm_i(word)),
            0b010 => inst!(Opcode::Slti, imm_i(word)),
            0b011 => inst!(Opcode::Sltiu, imm_i(word)),
            0b100 => inst!(Opcode::Xori, imm_i(word)),
            0b110 => inst!(Opcode::Ori, imm_i(word)),
            0b111 => inst!(Opcode::Andi, imm_i(word)),
            // Shift-by-immediate: the shift amount lives in the rs2 field and
            // funct7 selects the variant.
            0b001 if funct7 == 0 => inst!(Opcode::Slli, rs2 as u32),
            0b101 if funct7 == 0 => inst!(Opcode::Srli, rs2 as u32),
            0b101 if funct7 == 0b010_0000 => inst!(Opcode::Srai, rs2 as u32),
            _ => Err(DecodeError::Unrecognized(word)),
        },
        0b011_0011 => {
            let op = match (funct7, funct3) {
                (0b000_0000, 0b000) => Opcode::Add,
                (0b010_0000, 0b000) => Opcode::Sub,
                (0b000_0000, 0b001) => Opcode::Sll,
                (0b000_0000, 0b010) => Opcode::Slt,
                (0b000_0000, 0b011) => Opcode::Sltu,
                (0b000_0000, 0b100) => Opcode::Xor,
                (0b000_0000, 0b101) => Opcode::Srl,
                (0b010_0000, 0b101) => Opcode::Sra,
                (0b000_0000, 0b110) => Opcode::Or,
                (0b000_0000, 0b111) => Opcode::And,
                _ => return Err(DecodeError::Unrecognized(word)),
            };
            inst!(op, 0)
        }
        // fm/pred/succ are don't-care bits in this uncached single-issue
        // model; funct3 must still be zero (fence.i is not RV32I base).
        0b000_1111 if funct3 == 0 => inst!(Opcode::Fence, imm_i(word)),
        0b111_0011 => match word {
            0x0000_0073 => inst!(Opcode::Ecall, 0),
            0x0010_0073 => inst!(Opcode::Ebreak, 0),
            _ => Err(DecodeError::Unrecognized(word)),
        },
        _ => Err(DecodeError::Unrecognized(word)),
    }
}
