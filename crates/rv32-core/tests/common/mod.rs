//! Minimal RV32I instruction encoders for building test images.

fn i_type(opcode: u32, rd: u32, funct3: u32, rs1: u32, imm: i32) -> u32 {
    (((imm as u32) & 0xFFF) << 20) | (rs1 << 15) | (funct3 << 12) | (rd << 7) | opcode
}

fn r_type(funct7: u32, rs2: u32, rs1: u32, funct3: u32, rd: u32) -> u32 {
    (funct7 << 25) | (rs2 << 20) | (rs1 << 15) | (funct3 << 12) | (rd << 7) | 0b011_0011
}

fn s_type(funct3: u32, rs1: u32, rs2: u32, imm: i32) -> u32 {
    let imm = imm as u32;
    (((imm >> 5) & 0x7F) << 25)
        | (rs2 << 20)
        | (rs1 << 15)
        | (funct3 << 12)
        | ((imm & 0x1F) << 7)
        | 0b010_0011
}

fn b_type(funct3: u32, rs1: u32, rs2: u32, offset: i32) -> u32 {
    let imm = offset as u32;
    (((imm >> 12) & 0x1) << 31)
        | (((imm >> 5) & 0x3F) << 25)
        | (rs2 << 20)
        | (rs1 << 15)
        | (funct3 << 12)
        | (((imm >> 1) & 0xF) << 8)
        | (((imm >> 11) & 0x1) << 7)
        | 0b110_0011
}

pub fn addi(rd: u32, rs1: u32, imm: i32) -> u32 {
    i_type(0b001_0011, rd, 0b000, rs1, imm)
}

pub fn add(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(0, rs2, rs1, 0b000, rd)
}

pub fn sub(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(0b010_0000, rs2, rs1, 0b000, rd)
}

pub fn sll(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(0, rs2, rs1, 0b001, rd)
}

pub fn slt(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(0, rs2, rs1, 0b010, rd)
}

pub fn sltu(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(0, rs2, rs1, 0b011, rd)
}

pub fn xor(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(0, rs2, rs1, 0b100, rd)
}

pub fn srl(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(0, rs2, rs1, 0b101, rd)
}

pub fn sra(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(0b010_0000, rs2, rs1, 0b101, rd)
}

pub fn or(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(0, rs2, rs1, 0b110, rd)
}

pub fn and(rd: u32, rs1: u32, rs2: u32) -> u32 {
    r_type(0, rs2, rs1, 0b111, rd)
}

pub fn lui(rd: u32, imm20: u32) -> u32 {
    (imm20 << 12) | (rd << 7) | 0b011_0111
}

pub fn auipc(rd: u32, imm20: u32) -> u32 {
    (imm20 << 12) | (rd << 7) | 0b001_0111
}

pub fn jal(rd: u32, offset: i32) -> u32 {
    let imm = offset as u32;
    (((imm >> 20) & 0x1) << 31)
        | (((imm >> 1) & 0x3FF) << 21)
        | (((imm >> 11) & 0x1) << 20)
        | (((imm >> 12) & 0xFF) << 12)
        | (rd << 7)
        | 0b110_1111
}

pub fn jalr(rd: u32, rs1: u32, imm: i32) -> u32 {
    i_type(0b110_0111, rd, 0b000, rs1, imm)
}

pub fn beq(rs1: u32, rs2: u32, offset: i32) -> u32 {
    b_type(0b000, rs1, rs2, offset)
}

pub fn bne(rs1: u32, rs2: u32, offset: i32) -> u32 {
    b_type(0b001, rs1, rs2, offset)
}

pub fn blt(rs1: u32, rs2: u32, offset: i32) -> u32 {
    b_type(0b100, rs1, rs2, offset)
}

pub fn bgeu(rs1: u32, rs2: u32, offset: i32) -> u32 {
    b_type(0b111, rs1, rs2, offset)
}

pub fn lb(rd: u32, rs1: u32, imm: i32) -> u32 {
    i_type(0b000_0011, rd, 0b000, rs1, imm)
}

pub fn lh(rd: u32, rs1: u32, imm: i32) -> u32 {
    i_type(0b000_0011, rd, 0b001, rs1, imm)
}

pub fn lw(rd: u32, rs1: u32, imm: i32) -> u32 {
    i_type(0b000_0011, rd, 0b010, rs1, imm)
}

pub fn lbu(rd: u32, rs1: u32, imm: i32) -> u32 {
    i_type(0b000_0011, rd, 0b100, rs1, imm)
}

pub fn lhu(rd: u32, rs1: u32, imm: i32) -> u32 {
    i_type(0b000_0011, rd, 0b101, rs1, imm)
}

pub fn sb(rs1: u32, rs2: u32, imm: i32) -> u32 {
    s_type(0b000, rs1, rs2, imm)
}

pub fn sh(rs1: u32, rs2: u32, imm: i32) -> u32 {
    s_type(0b001, rs1, rs2, imm)
}

pub fn sw(rs1: u32, rs2: u32, imm: i32) -> u32 {
    s_type(0b010, rs1, rs2, imm)
}

pub fn ecall() -> u32 {
    0x0000_0073
}

pub fn ebreak() -> u32 {
    0x0010_0073
}

/// Flattens instruction words into a little-endian flat binary image.
pub fn image(words: &[u32]) -> Vec<u8> {
    words.iter().flat_map(|w| w.to_le_bytes()).collect()
}
