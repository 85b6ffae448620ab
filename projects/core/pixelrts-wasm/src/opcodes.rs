//! Static WASM MVP opcode tables.
//!
//! All lookups index compile-time arrays by opcode byte.

use derive_enum_all_values::AllValues;

/// Coarse category of a WASM opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, AllValues)]
pub enum OpcodeCategory {
    /// Blocks, branches, calls and returns.
    ControlFlow,
    /// Numeric comparisons, arithmetic and conversions.
    Arithmetic,
    /// Loads, stores and memory size/grow.
    Memory,
    /// `drop` and `select`.
    Parametric,
    /// Local and global accessors.
    Variable,
    /// `*.const`.
    Constant,
    /// Not an MVP opcode.
    Unknown,
}

impl OpcodeCategory {
    /// Dense index of the category, for per-category counters.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

static CATEGORIES: [OpcodeCategory; 256] = build_categories();
static COMPLEXITY: [u8; 256] = build_complexity();

const fn categorize(opcode: u8) -> OpcodeCategory {
    match opcode {
        0x00..=0x05 | 0x0B..=0x11 => OpcodeCategory::ControlFlow,
        0x1A..=0x1C => OpcodeCategory::Parametric,
        0x20..=0x24 => OpcodeCategory::Variable,
        0x28..=0x40 => OpcodeCategory::Memory,
        0x41..=0x44 => OpcodeCategory::Constant,
        0x45..=0xC4 => OpcodeCategory::Arithmetic,
        _ => OpcodeCategory::Unknown,
    }
}

const fn score(opcode: u8) -> u8 {
    match opcode {
        0x00 => 255,               // unreachable
        0x01 => 0,                 // nop
        0x02..=0x04 => 200,        // block, loop, if
        0x0C | 0x0D | 0x0F => 150, // br, br_if, return
        _ => match categorize(opcode) {
            OpcodeCategory::ControlFlow => 100,
            OpcodeCategory::Arithmetic => 80,
            OpcodeCategory::Memory | OpcodeCategory::Variable => 50,
            OpcodeCategory::Constant => 30,
            OpcodeCategory::Parametric | OpcodeCategory::Unknown => 0,
        },
    }
}

const fn build_categories() -> [OpcodeCategory; 256] {
    let mut table = [OpcodeCategory::Unknown; 256];
    let mut opcode = 0;
    while opcode < 256 {
        table[opcode] = categorize(opcode as u8);
        opcode += 1;
    }
    table
}

const fn build_complexity() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut opcode = 0;
    while opcode < 256 {
        table[opcode] = score(opcode as u8);
        opcode += 1;
    }
    table
}

/// Category of `opcode`.
#[inline]
pub fn category(opcode: u8) -> OpcodeCategory {
    CATEGORIES[opcode as usize]
}

/// Whether `opcode` is an MVP opcode.
#[inline]
pub fn is_recognized(opcode: u8) -> bool {
    category(opcode) != OpcodeCategory::Unknown
}

/// Visualization weight of `opcode` (0-255); branching-heavy opcodes score highest.
#[inline]
pub fn complexity_score(opcode: u8) -> u8 {
    COMPLEXITY[opcode as usize]
}

/// Text-format mnemonic of `opcode`.
pub fn opcode_name(opcode: u8) -> Option<&'static str> {
    let name = match opcode {
        0x00 => "unreachable",
        0x01 => "nop",
        0x02 => "block",
        0x03 => "loop",
        0x04 => "if",
        0x05 => "else",
        0x0B => "end",
        0x0C => "br",
        0x0D => "br_if",
        0x0E => "br_table",
        0x0F => "return",
        0x10 => "call",
        0x11 => "call_indirect",
        0x1A => "drop",
        0x1B => "select",
        0x1C => "select_t",
        0x20 => "local.get",
        0x21 => "local.set",
        0x22 => "local.tee",
        0x23 => "global.get",
        0x24 => "global.set",
        0x28..=0x40 => MEMORY_NAMES[(opcode - 0x28) as usize],
        0x41 => "i32.const",
        0x42 => "i64.const",
        0x43 => "f32.const",
        0x44 => "f64.const",
        0x45..=0xC4 => NUMERIC_NAMES[(opcode - 0x45) as usize],
        _ => return None,
    };
    Some(name)
}

const MEMORY_NAMES: [&str; 25] = [
    "i32.load", "i64.load", "f32.load", "f64.load",
    "i32.load8_s", "i32.load8_u", "i32.load16_s", "i32.load16_u",
    "i64.load8_s", "i64.load8_u", "i64.load16_s", "i64.load16_u", "i64.load32_s", "i64.load32_u",
    "i32.store", "i64.store", "f32.store", "f64.store",
    "i32.store8", "i32.store16", "i64.store8", "i64.store16", "i64.store32",
    "memory.size", "memory.grow",
];

const NUMERIC_NAMES: [&str; 128] = [
    // 0x45
    "i32.eqz", "i32.eq", "i32.ne", "i32.lt_s", "i32.lt_u", "i32.gt_s", "i32.gt_u",
    "i32.le_s", "i32.le_u", "i32.ge_s", "i32.ge_u",
    // 0x50
    "i64.eqz", "i64.eq", "i64.ne", "i64.lt_s", "i64.lt_u", "i64.gt_s", "i64.gt_u",
    "i64.le_s", "i64.le_u", "i64.ge_s", "i64.ge_u",
    // 0x5B
    "f32.eq", "f32.ne", "f32.lt", "f32.gt", "f32.le", "f32.ge",
    // 0x61
    "f64.eq", "f64.ne", "f64.lt", "f64.gt", "f64.le", "f64.ge",
    // 0x67
    "i32.clz", "i32.ctz", "i32.popcnt", "i32.add", "i32.sub", "i32.mul", "i32.div_s",
    "i32.div_u", "i32.rem_s", "i32.rem_u", "i32.and", "i32.or", "i32.xor", "i32.shl",
    "i32.shr_s", "i32.shr_u", "i32.rotl", "i32.rotr",
    // 0x79
    "i64.clz", "i64.ctz", "i64.popcnt", "i64.add", "i64.sub", "i64.mul", "i64.div_s",
    "i64.div_u", "i64.rem_s", "i64.rem_u", "i64.and", "i64.or", "i64.xor", "i64.shl",
    "i64.shr_s", "i64.shr_u", "i64.rotl", "i64.rotr",
    // 0x8B
    "f32.abs", "f32.neg", "f32.ceil", "f32.floor", "f32.trunc", "f32.nearest", "f32.sqrt",
    "f32.add", "f32.sub", "f32.mul", "f32.div", "f32.min", "f32.max", "f32.copysign",
    // 0x99
    "f64.abs", "f64.neg", "f64.ceil", "f64.floor", "f64.trunc", "f64.nearest", "f64.sqrt",
    "f64.add", "f64.sub", "f64.mul", "f64.div", "f64.min", "f64.max", "f64.copysign",
    // 0xA7
    "i32.wrap_i64", "i32.trunc_f32_s", "i32.trunc_f32_u", "i32.trunc_f64_s", "i32.trunc_f64_u",
    "i64.extend_i32_s", "i64.extend_i32_u", "i64.trunc_f32_s", "i64.trunc_f32_u",
    "i64.trunc_f64_s", "i64.trunc_f64_u", "f32.convert_i32_s", "f32.convert_i32_u",
    "f32.convert_i64_s", "f32.convert_i64_u", "f32.demote_f64", "f64.convert_i32_s",
    "f64.convert_i32_u", "f64.convert_i64_s", "f64.convert_i64_u", "f64.promote_f32",
    "i32.reinterpret_f32", "i64.reinterpret_f64", "f32.reinterpret_i32", "f64.reinterpret_i64",
    // 0xC0
    "i32.extend8_s", "i32.extend16_s", "i64.extend8_s", "i64.extend16_s", "i64.extend32_s",
];
