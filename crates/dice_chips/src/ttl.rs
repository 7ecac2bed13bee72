//! 7400-series gates and flip-flops.
//!
//! Delays are the typical data-book figures (rise = tPLH, fall = tPHL).

use dice_sim::{ChipDesc, PinRow, PropDelay};

fn nand(i: u32, n: u32) -> bool {
    i != (1 << n) - 1
}

fn nand2(i: u32) -> bool {
    nand(i, 2)
}

fn nand3(i: u32) -> bool {
    nand(i, 3)
}

fn nor2(i: u32) -> bool {
    i == 0
}

fn inv(i: u32) -> bool {
    i == 0
}

fn and2(i: u32) -> bool {
    i == 0b11
}

fn or2(i: u32) -> bool {
    i != 0
}

fn xor2(i: u32) -> bool {
    i == 0b01 || i == 0b10
}

/// Four 2-input gates in the 7400 pinout: (1,2)→3, (4,5)→6, (9,10)→8, (12,13)→11.
macro_rules! quad_gate {
    ($logic:expr, $delay:expr) => {
        &[
            PinRow::table(&[1, 2], 3, $logic, $delay),
            PinRow::table(&[4, 5], 6, $logic, $delay),
            PinRow::table(&[9, 10], 8, $logic, $delay),
            PinRow::table(&[12, 13], 11, $logic, $delay),
        ]
    };
}

/// Quad 2-input NAND.
pub static CHIP_7400: ChipDesc = ChipDesc {
    name: "7400",
    rows: quad_gate!(nand2, PropDelay::ns(11, 7)),
};

/// Quad 2-input NOR; outputs on pins 1, 4, 10 and 13.
pub static CHIP_7402: ChipDesc = ChipDesc {
    name: "7402",
    rows: &[
        PinRow::table(&[2, 3], 1, nor2, PropDelay::ns(12, 8)),
        PinRow::table(&[5, 6], 4, nor2, PropDelay::ns(12, 8)),
        PinRow::table(&[8, 9], 10, nor2, PropDelay::ns(12, 8)),
        PinRow::table(&[11, 12], 13, nor2, PropDelay::ns(12, 8)),
    ],
};

/// Hex inverter.
pub static CHIP_7404: ChipDesc = ChipDesc {
    name: "7404",
    rows: &[
        PinRow::table(&[1], 2, inv, PropDelay::ns(12, 8)),
        PinRow::table(&[3], 4, inv, PropDelay::ns(12, 8)),
        PinRow::table(&[5], 6, inv, PropDelay::ns(12, 8)),
        PinRow::table(&[9], 8, inv, PropDelay::ns(12, 8)),
        PinRow::table(&[11], 10, inv, PropDelay::ns(12, 8)),
        PinRow::table(&[13], 12, inv, PropDelay::ns(12, 8)),
    ],
};

/// Quad 2-input AND.
pub static CHIP_7408: ChipDesc = ChipDesc {
    name: "7408",
    rows: quad_gate!(and2, PropDelay::ns(18, 12)),
};

/// Triple 3-input NAND.
pub static CHIP_7410: ChipDesc = ChipDesc {
    name: "7410",
    rows: &[
        PinRow::table(&[1, 2, 13], 12, nand3, PropDelay::ns(11, 7)),
        PinRow::table(&[3, 4, 5], 6, nand3, PropDelay::ns(11, 7)),
        PinRow::table(&[9, 10, 11], 8, nand3, PropDelay::ns(11, 7)),
    ],
};

/// Quad 2-input OR.
pub static CHIP_7432: ChipDesc = ChipDesc {
    name: "7432",
    rows: quad_gate!(or2, PropDelay::ns(14, 14)),
};

/// Quad 2-input XOR.
pub static CHIP_7486: ChipDesc = ChipDesc {
    name: "7486",
    rows: quad_gate!(xor2, PropDelay::ns(15, 11)),
};

const FF_GATE: PropDelay = PropDelay::ns(12, 18);

/// Dual positive-edge D flip-flop with active-low preset and clear.
///
/// Each flip-flop is the data-book six-NAND circuit. Flip-flop 1: CLR 1,
/// D 2, CLK 3, PR 4, Q 5, /Q 6, internal nodes 20-23. Flip-flop 2: CLR 13,
/// D 12, CLK 11, PR 10, Q 9, /Q 8, internal nodes 24-27.
pub static CHIP_7474: ChipDesc = ChipDesc {
    name: "7474",
    rows: &[
        PinRow::table(&[4, 23, 21], 20, nand3, FF_GATE),
        PinRow::table(&[20, 1, 3], 21, nand3, FF_GATE),
        PinRow::table(&[21, 3, 23], 22, nand3, FF_GATE),
        PinRow::table(&[22, 1, 2], 23, nand3, FF_GATE),
        PinRow::table(&[4, 21, 6], 5, nand3, FF_GATE),
        PinRow::table(&[5, 22, 1], 6, nand3, FF_GATE),
        PinRow::table(&[10, 27, 25], 24, nand3, FF_GATE),
        PinRow::table(&[24, 13, 11], 25, nand3, FF_GATE),
        PinRow::table(&[25, 11, 27], 26, nand3, FF_GATE),
        PinRow::table(&[26, 13, 12], 27, nand3, FF_GATE),
        PinRow::table(&[10, 25, 8], 9, nand3, FF_GATE),
        PinRow::table(&[9, 26, 13], 8, nand3, FF_GATE),
    ],
};
